//! Loading of level documents and asset directories.
//!
//! The geometry document is the only required input. Every other document and
//! directory is optional: when it is absent or unreadable the loader records a
//! [`Fallback::MissingInput`] and the level assembles with less fidelity.

use std::{
    io,
    path::{Path, PathBuf},
};

use serde_json::Value;

use crate::error::{AssembleError, Diagnostics, Fallback, Result};

pub mod documents;
pub mod material;
pub mod mesh;
pub mod model;
pub mod nsa;
pub mod texture;

/// Read and parse the geometry document. Failure here aborts the load.
pub fn load_geometry_json(path: &Path) -> Result<Value> {
    let text = std::fs::read_to_string(path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            AssembleError::MissingGeometry(path.to_path_buf())
        } else {
            AssembleError::GeometryIo {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;
    serde_json::from_str(&text).map_err(|source| AssembleError::MalformedGeometry {
        path: path.to_path_buf(),
        source,
    })
}

/// Read an optional JSON document.
///
/// Returns `None` when no path is configured, when the file cannot be read, or
/// when it does not parse. The latter two are recorded in `diagnostics`.
pub fn load_optional_json(
    path: Option<&Path>,
    what: &str,
    diagnostics: &mut Diagnostics,
) -> Option<Value> {
    let path = path?;
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            diagnostics.record(
                Fallback::MissingInput,
                format!("{what} {} unavailable: {e}", path.display()),
            );
            return None;
        }
    };
    match serde_json::from_str(&text) {
        Ok(value) => Some(value),
        Err(e) => {
            diagnostics.record(
                Fallback::MalformedRecord,
                format!("{what} {} is not valid JSON: {e}", path.display()),
            );
            None
        }
    }
}

/// Files under `root` whose extension is in `extensions` (lowercase, no dot),
/// walked in file-name order.
///
/// Only an unreadable `root` is an error. Subdirectories and entries that cannot
/// be read are recorded as [`Fallback::MissingInput`] and skipped.
pub fn collect_files(
    root: &Path,
    extensions: &[String],
    recursive: bool,
    diagnostics: &mut Diagnostics,
) -> io::Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    let entries = sorted_entries(root)?;
    walk(entries, extensions, recursive, &mut out, diagnostics);
    Ok(out)
}

fn sorted_entries(dir: &Path) -> io::Result<Vec<std::fs::DirEntry>> {
    let mut entries: Vec<_> = std::fs::read_dir(dir)?.filter_map(|e| e.ok()).collect();
    entries.sort_by_key(|entry| entry.file_name());
    Ok(entries)
}

fn walk(
    entries: Vec<std::fs::DirEntry>,
    extensions: &[String],
    recursive: bool,
    out: &mut Vec<PathBuf>,
    diagnostics: &mut Diagnostics,
) {
    for entry in entries {
        let path = entry.path();
        let file_type = match entry.file_type() {
            Ok(file_type) => file_type,
            Err(e) => {
                diagnostics.record(Fallback::MissingInput, format!("{} unreadable: {e}", path.display()));
                continue;
            }
        };
        if file_type.is_dir() {
            if !recursive {
                continue;
            }
            match sorted_entries(&path) {
                Ok(children) => walk(children, extensions, recursive, out, diagnostics),
                Err(e) => diagnostics.record(
                    Fallback::MissingInput,
                    format!("directory {} skipped: {e}", path.display()),
                ),
            }
        } else if file_type.is_file() && has_extension(&path, extensions) {
            out.push(path);
        }
    }
}

pub(crate) fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| extensions.iter().any(|known| known.eq_ignore_ascii_case(e)))
        .unwrap_or(false)
}

/// Strip one trailing `.ext` when `ext` is in `extensions`, case-insensitively.
pub(crate) fn strip_known_extension<'a>(name: &'a str, extensions: &[String]) -> &'a str {
    match name.rsplit_once('.') {
        Some((stem, ext)) if extensions.iter().any(|known| known.eq_ignore_ascii_case(ext)) => stem,
        _ => name,
    }
}
