//! Parser for `.nsa` material definition files.
//!
//! A file holds a sequence of blocks:
//!
//! ```text
//! // comment
//! GE_floor_grate
//! {
//!     shader   masked
//!     texture  common/GE_grate_01.dds
//!     sound    metal
//! }
//! ```
//!
//! Only the `texture` parameter feeds resolution. Nested blocks are skipped and
//! `dflt` marks a material without a texture.

use std::{collections::HashSet, path::Path};

use crate::{
    error::{Diagnostics, Fallback},
    resources::collect_files,
};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct MaterialDefinition {
    pub name: String,
    /// Lowercased keys with their raw values, in file order.
    pub params: Vec<(String, String)>,
}

impl MaterialDefinition {
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// The primary texture name: path prefix, `.dds` and a trailing `volume`
    /// flag removed. `None` for `dflt` or when no texture is given.
    pub fn texture(&self) -> Option<String> {
        let raw = self.param("texture")?;
        let raw = raw.strip_suffix(" volume").unwrap_or(raw).trim();
        let base = raw.rsplit(['/', '\\']).next().unwrap_or(raw);
        let base = match base.len().checked_sub(4) {
            Some(cut) if base.is_char_boundary(cut) && base[cut..].eq_ignore_ascii_case(".dds") => &base[..cut],
            _ => base,
        };
        if base.is_empty() || base.eq_ignore_ascii_case("dflt") {
            None
        } else {
            Some(base.to_string())
        }
    }
}

fn strip_comment(line: &str) -> &str {
    let line = line.split("//").next().unwrap_or(line);
    line.split(';').next().unwrap_or(line).trim()
}

pub fn parse_nsa(text: &str) -> Vec<MaterialDefinition> {
    let lines: Vec<&str> = text
        .lines()
        .map(strip_comment)
        .filter(|l| !l.is_empty())
        .collect();

    let mut definitions = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        let line = lines[i];
        // `Name {` on one line is accepted as well
        let (name, opens_inline) = match line.strip_suffix('{') {
            Some(name) => (name.trim(), true),
            None => (line, false),
        };
        let body_start = if opens_inline {
            i + 1
        } else if lines.get(i + 1) == Some(&"{") {
            i + 2
        } else {
            i += 1;
            continue;
        };

        let mut definition = MaterialDefinition {
            name: name.to_string(),
            params: Vec::new(),
        };
        let mut depth = 1;
        let mut k = body_start;
        while k < lines.len() && depth > 0 {
            let body = lines[k];
            if body == "}" {
                depth -= 1;
            } else if body.ends_with('{') {
                depth += 1;
            } else if depth == 1 {
                let mut parts = body.splitn(2, char::is_whitespace);
                let key = parts.next().unwrap_or_default().to_ascii_lowercase();
                let value = parts.next().map(str::trim).unwrap_or_default().to_string();
                definition.params.push((key, value));
            }
            k += 1;
        }
        if !definition.name.is_empty() {
            definitions.push(definition);
        }
        i = k;
    }
    definitions
}

/// Parse every `.nsa` file in `dir`.
///
/// File names are de-duplicated case-insensitively (first in sorted order wins)
/// so mirrored copies of the same definitions are read once.
pub fn load_nsa_dir(dir: &Path, diagnostics: &mut Diagnostics) -> Vec<MaterialDefinition> {
    let files = match collect_files(dir, &["nsa".to_string()], true, diagnostics) {
        Ok(files) => files,
        Err(e) => {
            diagnostics.record(
                Fallback::MissingInput,
                format!("material definitions {} unavailable: {e}", dir.display()),
            );
            return Vec::new();
        }
    };

    let mut seen = HashSet::new();
    let mut definitions = Vec::new();
    for path in files {
        let key = path
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        if !seen.insert(key) {
            continue;
        }
        match std::fs::read(&path) {
            Ok(bytes) => definitions.extend(parse_nsa(&String::from_utf8_lossy(&bytes))),
            Err(e) => diagnostics.record(
                Fallback::MissingInput,
                format!("material definition {} unreadable: {e}", path.display()),
            ),
        }
    }
    log::info!("Parsed {} material definitions from {}", definitions.len(), dir.display());
    definitions
}
