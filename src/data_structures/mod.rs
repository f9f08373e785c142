//! Level data structures: transforms, surfaces, textures, instances and entities.
//!
//! - `transform` converts source axes to target axes and tracks bounds
//! - `model` contains surfaces, the combined scene mesh, collision faces and GPU buffers
//! - `texture` contains the GPU texture wrapper
//! - `instance` holds placement transforms
//! - `entity` holds entity records, categories and placement handles

pub mod entity;
pub mod instance;
pub mod model;
pub mod texture;
pub mod transform;
