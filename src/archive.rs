//! Packaging converted files: a ZIP archive or a plain directory tree.
//!
//! Each [`ConvertedFile`] is written at its (normalised) `path`. When two results share a
//! path, the later one wins, matching how browser-side zip libraries overwrite entries.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Component, Path};

use polyglot_forge_core::contract::ConvertedFile;
use polyglot_forge_core::convert::UNKNOWN_PATH;
use tracing::{debug, info};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

pub const DEFAULT_ARCHIVE_NAME: &str = "polyglotforge-converted.zip";

/// Relative, `/`-separated entry name with no root, `.` or `..` components.
pub fn sanitize_entry_path(path: &str) -> String {
    let unified = path.replace('\\', "/");
    let parts: Vec<&str> = Path::new(&unified)
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => s.to_str(),
            _ => None,
        })
        .collect();
    if parts.is_empty() {
        UNKNOWN_PATH.to_owned()
    } else {
        parts.join("/")
    }
}

/// Last write wins per entry; first-seen order is kept.
fn dedupe(files: &[ConvertedFile]) -> Vec<(String, &ConvertedFile)> {
    let mut order: Vec<String> = Vec::new();
    let mut latest: HashMap<String, &ConvertedFile> = HashMap::new();
    for file in files {
        let name = sanitize_entry_path(&file.path);
        if latest.insert(name.clone(), file).is_none() {
            order.push(name);
        } else {
            debug!(entry = %name, "Duplicate entry, keeping the later file");
        }
    }
    order
        .into_iter()
        .filter_map(|name| latest.get(&name).map(|f| (name.clone(), *f)))
        .collect()
}

/// Build the archive in memory.
pub fn zip_bytes(files: &[ConvertedFile]) -> io::Result<Vec<u8>> {
    let mut zip_buffer = Vec::new();
    {
        let mut zip = ZipWriter::new(io::Cursor::new(&mut zip_buffer));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        for (name, file) in dedupe(files) {
            zip.start_file(name, options)?;
            zip.write_all(file.content.as_bytes())?;
        }
        zip.finish()?;
    }
    Ok(zip_buffer)
}

pub fn write_zip(files: &[ConvertedFile], dest: &Path) -> io::Result<()> {
    let bytes = zip_bytes(files)?;
    if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    File::create(dest)?.write_all(&bytes)?;
    info!(path = %dest.display(), entries = files.len(), size = bytes.len(), "Wrote ZIP archive");
    Ok(())
}

pub fn write_dir(files: &[ConvertedFile], out_dir: &Path) -> io::Result<()> {
    for (name, file) in dedupe(files) {
        let target = out_dir.join(&name);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&target, file.content.as_bytes())?;
        debug!(path = %target.display(), "Wrote converted file");
    }
    info!(dir = %out_dir.display(), entries = files.len(), "Wrote converted files");
    Ok(())
}
