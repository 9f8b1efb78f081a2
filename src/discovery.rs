use crate::errors::{BookError, Result};
use crate::source_unavailable;
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

/// Whether `path` names a PGN file, plain or zstd-compressed
pub fn is_game_source(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    if name.starts_with('.') {
        return false;
    }
    let name = name.to_ascii_lowercase();
    name.ends_with(".pgn") || name.ends_with(".pgn.zst")
}

/// Find every game source under `dir`, sorted by path
pub fn discover_sources<P: AsRef<Path>>(dir: P, recursive: bool) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(source_unavailable!(dir, "not a directory"));
    }

    let mut files = Vec::new();
    scan_directory(dir, recursive, &mut files)?;
    files.sort();

    debug!("Found {} game sources in {}", files.len(), dir.display());
    Ok(files)
}

fn scan_directory(dir: &Path, recursive: bool, files: &mut Vec<PathBuf>) -> Result<()> {
    let entries = fs::read_dir(dir).map_err(|e| source_unavailable!(dir, e))?;

    for entry in entries {
        let path = entry?.path();
        let hidden = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with('.'));

        if path.is_dir() {
            if recursive && !hidden {
                scan_directory(&path, recursive, files)?;
            }
        } else if path.is_file() && is_game_source(&path) {
            files.push(path);
        }
    }

    Ok(())
}

/// Expand command-line inputs: directories are scanned, files kept as given
pub fn resolve_inputs<P: AsRef<Path>>(inputs: &[P], recursive: bool) -> Result<Vec<PathBuf>> {
    let mut sources = Vec::new();
    for input in inputs {
        let input = input.as_ref();
        if input.is_dir() {
            sources.extend(discover_sources(input, recursive)?);
        } else {
            sources.push(input.to_path_buf());
        }
    }

    if sources.is_empty() {
        return Err(BookError::ConfigurationError(
            "no game sources found".to_string(),
        ));
    }
    Ok(sources)
}
