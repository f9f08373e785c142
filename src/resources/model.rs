//! Model index, the model resolution chain and model asset loading.
//!
//! [`ModelIndex`] maps lowercased file stems to paths and is built once per
//! level. [`ModelResolver`] walks the resolution chain for an entity:
//!
//! 1. the explicit reference hint, extension stripped
//! 2. the override table, for names known to differ from their model file
//! 3. the cleaned entity name (source asset extensions stripped)
//! 4. the cleaned name with each variant suffix, first hit wins
//!
//! A miss is not an error; the placer substitutes a marker shape.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::{
    config::AssemblerConfig,
    data_structures::transform::Bounds,
    error::{AssembleError, Diagnostics, Fallback},
    resources::{collect_files, strip_known_extension},
};

#[derive(Clone, Debug, Default)]
pub struct ModelIndex {
    paths: HashMap<String, PathBuf>,
}

impl ModelIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index every model file under `dir`. Later files (in path order) replace
    /// earlier ones with the same lowercased stem.
    pub fn scan(dir: &Path, extensions: &[String], diagnostics: &mut Diagnostics) -> Self {
        let mut index = Self::new();
        match collect_files(dir, extensions, true, diagnostics) {
            Ok(files) => {
                for path in files {
                    index.insert(path);
                }
                log::info!("Indexed {} models under {}", index.len(), dir.display());
            }
            Err(e) => diagnostics.record(
                Fallback::MissingInput,
                format!("model directory {} unavailable: {e}", dir.display()),
            ),
        }
        index
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        let Some(stem) = path.file_stem().map(|s| s.to_string_lossy().to_lowercase()) else {
            return;
        };
        if let Some(previous) = self.paths.insert(stem, path.clone()) {
            log::debug!("Model {} replaces {}", path.display(), previous.display());
        }
    }

    /// Case-insensitive stem lookup.
    pub fn get(&self, name: &str) -> Option<&Path> {
        self.paths.get(&name.to_lowercase()).map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// Which step of the chain found the model.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ModelResolution {
    Hint(PathBuf),
    Override { target: String, path: PathBuf },
    Exact(PathBuf),
    Variant { suffix: String, path: PathBuf },
    Unresolved,
}

impl ModelResolution {
    pub fn path(&self) -> Option<&Path> {
        match self {
            ModelResolution::Hint(path)
            | ModelResolution::Override { path, .. }
            | ModelResolution::Exact(path)
            | ModelResolution::Variant { path, .. } => Some(path),
            ModelResolution::Unresolved => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        !matches!(self, ModelResolution::Unresolved)
    }
}

pub struct ModelResolver<'a> {
    config: &'a AssemblerConfig,
    index: &'a ModelIndex,
}

impl<'a> ModelResolver<'a> {
    pub fn new(config: &'a AssemblerConfig, index: &'a ModelIndex) -> Self {
        Self { config, index }
    }

    /// Entity name with a leaked source asset extension removed.
    pub fn clean_name<'n>(&self, name: &'n str) -> &'n str {
        strip_known_extension(name.trim(), &self.config.source_model_extensions)
    }

    pub fn resolve(&self, name: &str, hint: Option<&str>) -> ModelResolution {
        if let Some(hint) = hint {
            let stem = Path::new(hint.trim())
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            if let Some(path) = self.index.get(&stem) {
                return ModelResolution::Hint(path.to_path_buf());
            }
        }

        let cleaned = self.clean_name(name);
        let key = cleaned.to_lowercase();

        if let Some(target) = self.config.model_overrides.get(&key) {
            if let Some(path) = self.index.get(target) {
                return ModelResolution::Override {
                    target: target.clone(),
                    path: path.to_path_buf(),
                };
            }
        }

        if let Some(path) = self.index.get(&key) {
            return ModelResolution::Exact(path.to_path_buf());
        }

        for suffix in &self.config.variant_suffixes {
            if let Some(path) = self.index.get(&format!("{key}{suffix}")) {
                return ModelResolution::Variant {
                    suffix: suffix.clone(),
                    path: path.to_path_buf(),
                };
            }
        }

        ModelResolution::Unresolved
    }
}

/// One glTF primitive, CPU side. glTF is already Y-up so no conversion applies.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ModelMesh {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ModelAsset {
    pub path: PathBuf,
    pub meshes: Vec<ModelMesh>,
    pub bounds: Bounds,
}

impl ModelAsset {
    pub fn load(path: &Path) -> crate::error::Result<Self> {
        let (document, buffers, _images) =
            gltf::import(path).map_err(|source| AssembleError::Gltf {
                path: path.to_path_buf(),
                source,
            })?;

        let mut meshes = Vec::new();
        let mut bounds = Bounds::empty();
        for mesh in document.meshes() {
            for primitive in mesh.primitives() {
                let reader =
                    primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| data.0.as_slice()));
                let Some(positions) = reader.read_positions() else {
                    continue;
                };
                let positions: Vec<[f32; 3]> = positions.collect();
                let normals: Vec<[f32; 3]> = reader
                    .read_normals()
                    .map(|n| n.collect())
                    .unwrap_or_default();
                let uvs: Vec<[f32; 2]> = reader
                    .read_tex_coords(0)
                    .map(|t| t.into_f32().collect())
                    .unwrap_or_default();
                let indices = match reader.read_indices() {
                    Some(indices) => indices.into_u32().collect(),
                    None => (0..positions.len() as u32).collect(),
                };
                for p in &positions {
                    bounds.include(*p);
                }
                meshes.push(ModelMesh {
                    positions,
                    normals,
                    uvs,
                    indices,
                });
            }
        }

        Ok(Self {
            path: path.to_path_buf(),
            meshes,
            bounds,
        })
    }

    pub fn triangle_count(&self) -> usize {
        self.meshes.iter().map(|m| m.indices.len() / 3).sum()
    }
}

/// Parses each model file at most once.
#[derive(Debug, Default)]
pub struct ModelCache {
    assets: HashMap<PathBuf, Option<Arc<ModelAsset>>>,
}

impl ModelCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The parsed asset, or `None` when the file does not import. Failures are
    /// recorded the first time only.
    pub fn get_or_load(&mut self, path: &Path, diagnostics: &mut Diagnostics) -> Option<Arc<ModelAsset>> {
        if let Some(cached) = self.assets.get(path) {
            return cached.clone();
        }
        let asset = match ModelAsset::load(path) {
            Ok(asset) => Some(Arc::new(asset)),
            Err(e) => {
                diagnostics.record(Fallback::UnresolvedReference, e.to_string());
                None
            }
        };
        self.assets.insert(path.to_path_buf(), asset.clone());
        asset
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}
