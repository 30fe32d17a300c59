//! Repository methods, implemented on `UnitOfWork` one table group per module.

pub mod academy;
pub mod content;
pub mod settings;
