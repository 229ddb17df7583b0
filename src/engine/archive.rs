// Zip packaging of every registered image, one deflated member per record.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::info;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::registry::CompressionRecord;
use crate::error::CompressError;

/// Write `records` into a zip at `archive_path`, replacing any previous
/// archive. Returns the archive size in bytes.
pub fn build_archive(records: &[CompressionRecord], archive_path: &Path) -> Result<u64, CompressError> {
    if let Some(parent) = archive_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut zip = ZipWriter::new(BufWriter::new(File::create(archive_path)?));
    let mut used = HashSet::new();

    for record in records {
        let data = fs::read(&record.output_path)?;
        let name = unique_member_name(&record.original_filename, &mut used);
        zip.start_file(name, options)?;
        zip.write_all(&data)?;
    }

    zip.finish()?.flush()?;

    let size = fs::metadata(archive_path)?.len();
    info!(
        "built archive {} with {} entries ({} bytes)",
        archive_path.display(),
        records.len(),
        size
    );
    Ok(size)
}

/// A zip cannot hold two members under one name, so repeats of a filename
/// become `name (2).ext`, `name (3).ext`, ...
fn unique_member_name(filename: &str, used: &mut HashSet<String>) -> String {
    if used.insert(filename.to_string()) {
        return filename.to_string();
    }

    let (stem, ext) = match filename.rfind('.') {
        Some(dot) if dot > 0 => (&filename[..dot], &filename[dot..]),
        _ => (filename, ""),
    };

    let mut n = 2;
    loop {
        let candidate = format!("{} ({}){}", stem, n, ext);
        if used.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}
