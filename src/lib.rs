//! stage-ngin
//!
//! Assembles a render and collision scene from pre-extracted level data: flat
//! geometry arrays plus JSON catalogs for textures, material assignments and
//! entity placements. Loosely named external data is resolved through fixed
//! lookup chains with deterministic fallbacks, so a level always loads as long
//! as its geometry document does.
//!
//! High-level modules
//! - `config`: assembler settings and the per-level file layout
//! - `error`: fatal load errors and the recoverable fallback log
//! - `data_structures`: transforms, surfaces, collision faces, entities and GPU types
//! - `resources`: document parsing, texture/model indexes and resolution chains
//! - `scene`: the assembler, entity placement and the load summary
//!

pub mod config;
pub mod data_structures;
pub mod error;
pub mod resources;
pub mod scene;

// Re-exports commonly used types for convenience in downstream code.
pub use config::{AssemblerConfig, LevelPaths};
pub use error::{AssembleError, Diagnostics, Fallback};
pub use scene::{AssembledLevel, DisplayMode, SceneAssembler};
