//! Locating `.imh` headers and their `.pix` companions on disk.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

pub const HEADER_EXTENSION: &str = "imh";
pub const PIXEL_EXTENSION: &str = "pix";

/// All `.imh` files under `root`, recursively, in sorted order.
pub fn find_headers(root: &Path) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    walk_dir(root, &mut |path| {
        if has_extension(path, HEADER_EXTENSION) {
            out.push(path.to_path_buf());
        }
        false
    })?;
    out.sort();
    Ok(out)
}

/// The first `<root>.pix` at or below the directory holding `header_path`.
///
/// Files directly in the directory are checked before subdirectories.
pub fn find_companion(header_path: &Path) -> Result<PathBuf> {
    let stem = header_path
        .file_stem()
        .ok_or_else(|| Error::MissingCompanionFile(header_path.with_extension(PIXEL_EXTENSION)))?;
    let mut name = stem.to_os_string();
    name.push(".");
    name.push(PIXEL_EXTENSION);

    let dir = match header_path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut found = None;
    walk_dir(dir, &mut |path| {
        if path.file_name() == Some(name.as_os_str()) {
            found = Some(path.to_path_buf());
            true
        } else {
            false
        }
    })?;
    found.ok_or_else(|| Error::MissingCompanionFile(dir.join(&name)))
}

/// Visit every file below `dir`, files before subdirectories, each level in
/// name order. Stops early once `visit` returns `true`.
///
/// Symlinks are visited as files when they resolve to one. Symlinked
/// directories are not descended into, so link cycles terminate.
fn walk_dir(dir: &Path, visit: &mut dyn FnMut(&Path) -> bool) -> Result<bool> {
    let io_err = |e: std::io::Error| Error::from(e).in_file(dir);
    let mut entries = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        let file_type = entry.file_type().map_err(io_err)?;
        entries.push((entry.path(), file_type));
    }
    entries.sort_by(|a, b| a.0.cmp(&b.0));

    let mut dirs = Vec::new();
    for (path, file_type) in entries {
        if file_type.is_dir() {
            dirs.push(path);
        } else if file_type.is_symlink() && path.is_dir() {
            log::debug!("not following directory link {}", path.display());
        } else if visit(&path) {
            return Ok(true);
        }
    }
    for path in &dirs {
        if walk_dir(path, visit)? {
            return Ok(true);
        }
    }
    Ok(false)
}

pub(crate) fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|e| e.eq_ignore_ascii_case(ext))
        .unwrap_or(false)
}
