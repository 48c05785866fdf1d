//! Gathers local files into [`InputFile`]s for the `convert` command.
//!
//! Directories are walked recursively in a stable (sorted) order; entry paths are relative to
//! the directory given on the command line. Hidden entries and non-UTF-8 files are skipped.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use polyglot_forge_core::contract::InputFile;
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .map(|s| s.starts_with('.'))
            .unwrap_or(false)
}

fn to_entry_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn read_input(full_path: &Path, relative: &Path) -> Result<Option<InputFile>> {
    let bytes = fs::read(full_path).with_context(|| format!("Failed to read {}", full_path.display()))?;
    match String::from_utf8(bytes) {
        Ok(content) => Ok(Some(InputFile::new(to_entry_path(relative), content))),
        Err(_) => {
            warn!(path = %full_path.display(), "Skipping non-UTF-8 file");
            Ok(None)
        }
    }
}

/// Collect every file under `paths`, preserving argument order.
pub fn collect_input_files(paths: &[PathBuf]) -> Result<Vec<InputFile>> {
    let mut files = Vec::new();

    for root in paths {
        let meta = fs::metadata(root).with_context(|| format!("Cannot access {}", root.display()))?;

        if meta.is_file() {
            let relative = root.file_name().map(Path::new).unwrap_or(root.as_path());
            if let Some(file) = read_input(root, relative)? {
                files.push(file);
            }
            continue;
        }

        let walker = WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !is_hidden(e));
        for entry in walker {
            let entry = entry.with_context(|| format!("Failed to walk {}", root.display()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
            debug!(path = %relative.display(), "Collected input file");
            if let Some(file) = read_input(entry.path(), relative)? {
                files.push(file);
            }
        }
    }

    info!(count = files.len(), "Collected input files");
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn walks_directories_in_sorted_order_with_relative_paths() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src/util")).unwrap();
        fs::create_dir_all(dir.path().join(".git")).unwrap();
        fs::write(dir.path().join("src/main.ts"), "main").unwrap();
        fs::write(dir.path().join("src/util/a.ts"), "a").unwrap();
        fs::write(dir.path().join("README.md"), "readme").unwrap();
        fs::write(dir.path().join(".git/config"), "hidden").unwrap();
        fs::write(dir.path().join("logo.bin"), [0xff, 0xfe, 0x00]).unwrap();

        let files = collect_input_files(&[dir.path().to_path_buf()]).unwrap();
        let paths: Vec<&str> = files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["README.md", "src/main.ts", "src/util/a.ts"]);
        assert_eq!(files[2].name, "a.ts");
        assert_eq!(files[2].content, "a");
    }

    #[test]
    fn single_file_uses_its_file_name() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("snippet.js");
        fs::write(&path, "console.log(1)").unwrap();

        let files = collect_input_files(&[path]).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, "snippet.js");
    }

    #[test]
    fn missing_path_is_an_error() {
        let dir = tempdir().unwrap();
        assert!(collect_input_files(&[dir.path().join("nope")]).is_err());
    }
}
