use std::collections::BTreeMap;
use std::io::{Cursor, Read};
use std::path::Path;

use anyhow::{Context, Result};
use zip::ZipArchive;

/// Unpacks one export archive to a flat entry-name → bytes map.
///
/// Directory entries are skipped; an entry that fails to decompress is
/// warned about and skipped rather than failing the archive, since export
/// tools occasionally truncate trailing assets. A ZIP that cannot be opened
/// at all is an error, which the caller downgrades to skip-with-warning.
pub fn unpack_archive(path: &Path) -> Result<BTreeMap<String, Vec<u8>>> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read archive: {}", path.display()))?;
    let mut archive = ZipArchive::new(Cursor::new(bytes.as_slice()))
        .with_context(|| format!("Not a readable ZIP archive: {}", path.display()))?;

    let mut entries = BTreeMap::new();
    for i in 0..archive.len() {
        let mut entry = match archive.by_index(i) {
            Ok(entry) => entry,
            Err(e) => {
                eprintln!("Warning: Skipping unreadable entry {} in {}: {}", i, path.display(), e);
                continue;
            }
        };
        if entry.is_dir() {
            continue;
        }

        let name = entry.name().to_string();
        let mut data = Vec::with_capacity(entry.size() as usize);
        if let Err(e) = entry.read_to_end(&mut data) {
            eprintln!("Warning: Skipping corrupt entry {} in {}: {}", name, path.display(), e);
            continue;
        }
        entries.insert(name, data);
    }

    Ok(entries)
}
