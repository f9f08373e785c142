//! Level assembly.
//!
//! [`SceneAssembler`] runs one synchronous pass over a level:
//!
//! 1. read the geometry document (the only input whose absence is fatal)
//! 2. build the texture map, material assignment, texture index and model index
//! 3. convert every mesh group into one surface of a single [`SceneMesh`],
//!    collecting collision faces and bounds on the way
//! 4. classify and place entities
//!
//! Indexes are complete before any lookup runs and are never rebuilt. The
//! result is an [`AssembledLevel`] carrying the scene, the indexes it was
//! resolved against, a [`LoadSummary`] and the [`Diagnostics`] of every
//! fallback taken.

use cgmath::Vector3;

use crate::{
    config::{AssemblerConfig, LevelPaths},
    data_structures::{
        entity::{Entity, EntityHandle, SuppressedEntity},
        model::{CollisionFaceSet, CollisionShape, GpuLevel, SceneMesh, SurfaceMaterial},
        transform::Bounds,
    },
    error::{AssembleError, Diagnostics, Fallback, Result},
    resources::{
        documents::{GeometryDocument, MaterialAssignment, parse_entities},
        load_geometry_json, load_optional_json,
        material::{MaterialResolution, MaterialResolver, TextureMap},
        mesh::{MeshGroupBuilder, upload_scene_mesh},
        model::ModelIndex,
        nsa::load_nsa_dir,
        texture::TextureIndex,
    },
    scene::{entities::EntityPlacer, summary::LoadSummary},
};

pub mod entities;
pub mod palette;
pub mod summary;

/// Everything a level is assembled from, parsed and indexed.
#[derive(Clone, Debug, Default)]
pub struct LevelInputs {
    pub geometry: GeometryDocument,
    pub texture_map: TextureMap,
    pub assignment: MaterialAssignment,
    pub entities: Vec<Entity>,
    pub textures: TextureIndex,
    pub models: ModelIndex,
}

impl LevelInputs {
    pub fn load(paths: &LevelPaths, config: &AssemblerConfig, diagnostics: &mut Diagnostics) -> Result<Self> {
        let geometry_value = load_geometry_json(&paths.geometry).inspect_err(|e| log::error!("{e}"))?;
        let geometry = GeometryDocument::from_value(geometry_value, diagnostics).ok_or_else(|| {
            let e = AssembleError::GeometryNotObject(paths.geometry.clone());
            log::error!("{e}");
            e
        })?;
        log::info!(
            "Read {} mesh groups and {} header materials from {}",
            geometry.groups.len(),
            geometry.materials.len(),
            paths.geometry.display()
        );

        let mut texture_map = TextureMap::new();
        for (path, what) in [
            (&paths.level_texture_map, "level texture map"),
            (&paths.global_texture_map, "global texture map"),
        ] {
            if let Some(value) = load_optional_json(path.as_deref(), what, diagnostics) {
                let added = texture_map.merge(TextureMap::entries_from_value(value, what, diagnostics));
                log::info!("{added} entries from the {what}");
            }
        }
        if let Some(dir) = &paths.material_definitions {
            let definitions = load_nsa_dir(dir, diagnostics);
            texture_map.merge(TextureMap::entries_from_definitions(&definitions));
        }

        let assignment = load_optional_json(
            paths.material_assignment.as_deref(),
            "material assignment",
            diagnostics,
        )
        .map(|value| MaterialAssignment::from_value(value, diagnostics))
        .unwrap_or_default();

        let entities = match load_optional_json(paths.entities.as_deref(), "entity catalog", diagnostics) {
            Some(value) => parse_entities(value, diagnostics),
            None => {
                log::warn!("No entity catalog; the level will have no entities");
                Vec::new()
            }
        };

        let textures = match &paths.texture_dir {
            Some(dir) => TextureIndex::scan(dir, &config.texture_extensions, diagnostics),
            None => TextureIndex::new(),
        };
        let models = match &paths.model_dir {
            Some(dir) => ModelIndex::scan(dir, &config.model_extensions, diagnostics),
            None => ModelIndex::new(),
        };

        Ok(Self {
            geometry,
            texture_map,
            assignment,
            entities,
            textures,
            models,
        })
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DisplayMode {
    /// Resolved textures, fallback gray where resolution failed.
    #[default]
    Textured,
    /// One muted color per surface, picked from its group id.
    Flat,
    /// Normals as color.
    Normals,
}

/// An assembled level and the indexes it was resolved against.
#[derive(Debug)]
pub struct AssembledLevel {
    pub mesh: SceneMesh,
    pub collision: CollisionFaceSet,
    pub bounds: Bounds,
    pub entities: Vec<EntityHandle>,
    pub suppressed: Vec<SuppressedEntity>,
    pub summary: LoadSummary,
    pub diagnostics: Diagnostics,
    pub textures: TextureIndex,
    pub models: ModelIndex,
    texture_map: TextureMap,
    assignment: MaterialAssignment,
    config: AssemblerConfig,
    display_mode: DisplayMode,
}

impl AssembledLevel {
    pub fn display_mode(&self) -> DisplayMode {
        self.display_mode
    }

    /// Re-derive every surface material for `mode`, in surface order.
    ///
    /// Reads the stored indexes and never rebuilds them; applying the same mode
    /// twice leaves the level unchanged.
    pub fn apply_display_mode(&mut self, mode: DisplayMode) {
        let resolver = MaterialResolver::new(
            &self.config,
            &self.assignment,
            &self.texture_map,
            &self.textures,
        );
        for surface in &mut self.mesh.surfaces {
            surface.material = match mode {
                DisplayMode::Textured => resolver
                    .resolve(surface.group_id)
                    .to_surface_material(self.config.fallback_color),
                DisplayMode::Flat => SurfaceMaterial::Flat {
                    color: palette::lerp(palette::ENVIRONMENT, palette::mix_for_id(surface.group_id)),
                },
                DisplayMode::Normals => SurfaceMaterial::NormalDebug,
            };
        }
        self.display_mode = mode;
    }

    pub fn collision_shape(&self) -> CollisionShape {
        self.collision.to_shape()
    }

    /// Suggested camera position looking at the level center.
    pub fn camera_eye(&self) -> Vector3<f32> {
        self.bounds.framing_eye()
    }

    pub fn config(&self) -> &AssemblerConfig {
        &self.config
    }

    pub fn upload(&self, device: &wgpu::Device, queue: &wgpu::Queue) -> anyhow::Result<GpuLevel> {
        upload_scene_mesh(&self.mesh, &self.textures, device, queue)
    }
}

#[derive(Clone, Debug, Default)]
pub struct SceneAssembler {
    config: AssemblerConfig,
}

impl SceneAssembler {
    pub fn new(config: AssemblerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AssemblerConfig {
        &self.config
    }

    /// Load and assemble a level from disk. Fails only when the geometry
    /// document is missing or malformed.
    pub fn assemble(&self, paths: &LevelPaths) -> Result<AssembledLevel> {
        let mut diagnostics = Diagnostics::new();
        let inputs = LevelInputs::load(paths, &self.config, &mut diagnostics)?;
        Ok(self.assemble_inputs(inputs, diagnostics))
    }

    /// Assemble from inputs that are already parsed and indexed.
    pub fn assemble_inputs(&self, inputs: LevelInputs, mut diagnostics: Diagnostics) -> AssembledLevel {
        let LevelInputs {
            geometry,
            texture_map,
            assignment,
            entities,
            textures,
            models,
        } = inputs;

        let groups_total = geometry.groups.len();
        let groups: Vec<_> = match self.config.section_filter {
            Some(section) => {
                let kept: Vec<_> = geometry
                    .groups
                    .into_iter()
                    .filter(|g| g.section_id == Some(section))
                    .collect();
                log::info!("Section {section}: {} of {groups_total} groups", kept.len());
                kept
            }
            None => geometry.groups,
        };

        let mut summary = LoadSummary {
            groups_total: groups.len(),
            textures_loaded: textures.loaded_count(),
            models_indexed: models.len(),
            ..Default::default()
        };

        let resolver = MaterialResolver::new(&self.config, &assignment, &texture_map, &textures);
        let mut builder = MeshGroupBuilder::new(self.config.collision_min_tris);
        let mut mesh = SceneMesh::default();
        for group in &groups {
            let resolution = resolver.resolve(group.id);
            let material = resolution.to_surface_material(self.config.fallback_color);
            match builder.build(group, material) {
                Ok(surface) => {
                    resolution.record_miss(group.id, &mut diagnostics);
                    match resolution {
                        MaterialResolution::Unassigned => summary.unassigned_groups += 1,
                        MaterialResolution::UnresolvedTexture { .. } => summary.unresolved_textures += 1,
                        MaterialResolution::Textured { .. } => {}
                    }
                    mesh.surfaces.push(surface);
                }
                Err(skip) => {
                    summary.groups_skipped += 1;
                    diagnostics.record(Fallback::MalformedRecord, format!("group {} skipped: {skip}", group.id));
                }
            }
        }
        let (collision, bounds) = builder.finish();
        if mesh.surfaces.is_empty() {
            log::warn!("No usable mesh groups; the level mesh is empty");
        }
        summary.surfaces = mesh.surface_count();
        summary.collision_faces = collision.face_count();
        log::info!(
            "Built {} surfaces, {} collision faces",
            summary.surfaces,
            summary.collision_faces
        );

        let placement = EntityPlacer::new(&self.config, &models).place_all(&entities, &mut diagnostics);
        summary.entities_by_category = placement.counts;
        summary.entities_placed = placement.handles.len();
        summary.entities_suppressed = placement.suppressed.len();
        summary.models_resolved = placement.models_resolved;
        summary.models_unresolved = placement.models_unresolved;
        summary.log();

        AssembledLevel {
            mesh,
            collision,
            bounds,
            entities: placement.handles,
            suppressed: placement.suppressed,
            summary,
            diagnostics,
            textures,
            models,
            texture_map,
            assignment,
            config: self.config.clone(),
            display_mode: DisplayMode::Textured,
        }
    }
}
