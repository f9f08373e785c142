//! Load errors and recoverable fallbacks.
//!
//! Only a missing or unreadable geometry document stops a level load; it is
//! reported as an [`AssembleError`]. Everything else degrades locally and is
//! recorded as a [`Fallback`] event in [`Diagnostics`] so callers can inspect
//! what was skipped or substituted.

use std::{fmt, path::PathBuf};

use thiserror::Error;

/// Result type for level assembly.
pub type Result<T> = std::result::Result<T, AssembleError>;

/// Errors that abort a load or a standalone asset read.
#[derive(Error, Debug)]
pub enum AssembleError {
    #[error("Geometry document not found: {0}")]
    MissingGeometry(PathBuf),

    #[error("Geometry document {path} could not be read: {source}")]
    GeometryIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Geometry document {path} is not a well-formed level object: {source}")]
    MalformedGeometry {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Geometry document {0} is not a JSON object")]
    GeometryNotObject(PathBuf),

    #[error("Config file {path} is invalid: {message}")]
    Config { path: PathBuf, message: String },

    #[error("Image {path} could not be decoded: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Model {path} could not be imported: {source}")]
    Gltf {
        path: PathBuf,
        #[source]
        source: gltf::Error,
    },
}

/// The recoverable half of the error taxonomy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Fallback {
    /// An optional document or directory is absent or unreadable.
    MissingInput,
    /// A single group or entity record failed its shape checks and was skipped.
    MalformedRecord,
    /// A texture, material or model lookup missed every step of its chain.
    UnresolvedReference,
}

impl fmt::Display for Fallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Fallback::MissingInput => "missing input",
            Fallback::MalformedRecord => "malformed record",
            Fallback::UnresolvedReference => "unresolved reference",
        })
    }
}

/// A single recorded fallback.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FallbackEvent {
    pub kind: Fallback,
    pub detail: String,
}

/// Append-only log of every fallback taken during a load.
#[derive(Clone, Debug, Default)]
pub struct Diagnostics {
    events: Vec<FallbackEvent>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, kind: Fallback, detail: impl Into<String>) {
        let detail = detail.into();
        match kind {
            Fallback::MissingInput => log::info!("{kind}: {detail}"),
            Fallback::MalformedRecord => log::warn!("{kind}: {detail}"),
            Fallback::UnresolvedReference => log::debug!("{kind}: {detail}"),
        }
        self.events.push(FallbackEvent { kind, detail });
    }

    pub fn events(&self) -> &[FallbackEvent] {
        &self.events
    }

    pub fn count(&self, kind: Fallback) -> usize {
        self.events.iter().filter(|e| e.kind == kind).count()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_by_kind() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.record(Fallback::MissingInput, "entities.json");
        diagnostics.record(Fallback::UnresolvedReference, "texture rock_01");
        diagnostics.record(Fallback::UnresolvedReference, "model crate_big");

        assert_eq!(diagnostics.count(Fallback::MissingInput), 1);
        assert_eq!(diagnostics.count(Fallback::UnresolvedReference), 2);
        assert_eq!(diagnostics.count(Fallback::MalformedRecord), 0);
        assert_eq!(diagnostics.events()[1].detail, "texture rock_01");
    }
}
