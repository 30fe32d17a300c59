mod import;
mod package;

pub use import::{ImportCommands, ImportRunArgs};
pub use package::{CompressionArg, PackageCommands};
