//! Archive containers: gzip-compressed tar and zip.

use std::io::{self, Cursor, Read, Write};
use std::path::Path;

use chrono::Utc;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use tar::Header;
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use acx_core::enums::{Compression, PackageFormat};

use crate::error::PackageError;
use crate::manifest::{DATA_FILE, MANIFEST_FILE};

/// Largest decompressed entry accepted when reading an archive.
pub const MAX_ENTRY_BYTES: u64 = 256 * 1024 * 1024;

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

pub(crate) struct ArchiveEntries {
    pub manifest: Vec<u8>,
    pub data: Vec<u8>,
}

fn corrupt(context: &str) -> impl FnOnce(io::Error) -> PackageError + '_ {
    move |e| PackageError::Corrupt(format!("{context}: {e}"))
}

/// Container format of an archive: its extension when it has a known one,
/// otherwise sniffed from the leading bytes.
pub(crate) fn detect_format(path: &Path, bytes: &[u8]) -> PackageFormat {
    path.file_name()
        .and_then(|name| name.to_str())
        .and_then(PackageFormat::from_file_name)
        .unwrap_or(if bytes.starts_with(ZIP_MAGIC) {
            PackageFormat::Zip
        } else {
            PackageFormat::TarGz
        })
}

/// Archive of `(name, bytes)` entries, in order.
pub(crate) fn write_archive(
    entries: &[(&str, &[u8])],
    format: PackageFormat,
    compression: Compression,
) -> io::Result<Vec<u8>> {
    match format {
        PackageFormat::TarGz => write_tar_gz(entries, compression),
        PackageFormat::Zip => write_zip(entries, compression),
    }
}

fn write_tar_gz(entries: &[(&str, &[u8])], compression: Compression) -> io::Result<Vec<u8>> {
    let encoder = GzEncoder::new(Vec::new(), flate2::Compression::new(compression.level()));
    let mut builder = tar::Builder::new(encoder);
    let mtime = u64::try_from(Utc::now().timestamp()).unwrap_or_default();
    for (name, bytes) in entries {
        let mut header = Header::new_gnu();
        header.set_size(bytes.len() as u64);
        header.set_mode(0o644);
        header.set_mtime(mtime);
        builder.append_data(&mut header, name, *bytes)?;
    }
    builder.into_inner()?.finish()
}

fn write_zip(entries: &[(&str, &[u8])], compression: Compression) -> io::Result<Vec<u8>> {
    let mut archive = Vec::new();
    {
        let mut zip = ZipWriter::new(Cursor::new(&mut archive));
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(Some(i64::from(compression.level())))
            .unix_permissions(0o644);
        for (name, bytes) in entries {
            zip.start_file(*name, options).map_err(io::Error::other)?;
            zip.write_all(bytes)?;
        }
        zip.finish().map_err(io::Error::other)?;
    }
    Ok(archive)
}

/// Read `manifest.json` and `data.json` out of an archive held in memory.
/// Other entries are ignored and never touch the filesystem. Entries larger
/// than `limit` once decompressed make the archive corrupt.
pub(crate) fn read_entries(
    bytes: &[u8],
    format: PackageFormat,
    limit: u64,
) -> Result<ArchiveEntries, PackageError> {
    let mut entries = Slots::default();
    match format {
        PackageFormat::TarGz => read_tar_gz(bytes, limit, &mut entries)?,
        PackageFormat::Zip => read_zip(bytes, limit, &mut entries)?,
    }
    match (entries.manifest, entries.data) {
        (Some(manifest), Some(data)) => Ok(ArchiveEntries { manifest, data }),
        (None, _) => Err(PackageError::Corrupt(format!("missing {MANIFEST_FILE}"))),
        (_, None) => Err(PackageError::Corrupt(format!("missing {DATA_FILE}"))),
    }
}

#[derive(Default)]
struct Slots {
    manifest: Option<Vec<u8>>,
    data: Option<Vec<u8>>,
}

impl Slots {
    fn slot(&mut self, name: &str) -> Option<&mut Option<Vec<u8>>> {
        match name {
            MANIFEST_FILE => Some(&mut self.manifest),
            DATA_FILE => Some(&mut self.data),
            other => {
                debug!(entry = other, "skipping unexpected archive entry");
                None
            }
        }
    }
}

fn read_tar_gz(bytes: &[u8], limit: u64, slots: &mut Slots) -> Result<(), PackageError> {
    let mut archive = tar::Archive::new(GzDecoder::new(bytes));
    for entry in archive.entries().map_err(corrupt("unreadable archive"))? {
        let mut entry = entry.map_err(corrupt("unreadable archive entry"))?;
        let name = entry
            .path()
            .map_err(corrupt("unreadable entry name"))?
            .to_string_lossy()
            .into_owned();
        let Some(slot) = slots.slot(&name) else {
            continue;
        };
        check_declared_size(&name, entry.size(), limit)?;
        *slot = Some(read_capped(&mut entry, &name, limit)?);
    }
    Ok(())
}

fn read_zip(bytes: &[u8], limit: u64, slots: &mut Slots) -> Result<(), PackageError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| PackageError::Corrupt(format!("unreadable archive: {e}")))?;
    for index in 0..archive.len() {
        let mut file = archive
            .by_index(index)
            .map_err(|e| PackageError::Corrupt(format!("unreadable archive entry: {e}")))?;
        if file.is_dir() {
            continue;
        }
        let name = file.name().to_string();
        let Some(slot) = slots.slot(&name) else {
            continue;
        };
        check_declared_size(&name, file.size(), limit)?;
        *slot = Some(read_capped(&mut file, &name, limit)?);
    }
    Ok(())
}

fn check_declared_size(name: &str, size: u64, limit: u64) -> Result<(), PackageError> {
    if size > limit {
        return Err(too_large(name, limit));
    }
    Ok(())
}

/// Headers can lie, so the read itself stops one byte past the limit.
fn read_capped(reader: impl Read, name: &str, limit: u64) -> Result<Vec<u8>, PackageError> {
    let mut buf = Vec::new();
    reader
        .take(limit.saturating_add(1))
        .read_to_end(&mut buf)
        .map_err(corrupt("unreadable archive entry"))?;
    if buf.len() as u64 > limit {
        return Err(too_large(name, limit));
    }
    Ok(buf)
}

fn too_large(name: &str, limit: u64) -> PackageError {
    PackageError::Corrupt(format!("{name} exceeds {limit} bytes when decompressed"))
}
