//! Material resolution: group id to material name to texture.
//!
//! The chain is
//!
//! 1. group id -> material name through the [`MaterialAssignment`]
//! 2. material name -> texture name through the [`TextureMap`], or the material
//!    name itself when the map has no entry
//! 3. texture name -> loaded texture: the name as written, then with a format
//!    extension stripped, then the lowercase forms of both
//!
//! Misses at step 1 or 3 bind the fallback color.

use std::collections::HashMap;

use serde_json::Value;

use crate::{
    config::AssemblerConfig,
    data_structures::model::SurfaceMaterial,
    error::{Diagnostics, Fallback},
    resources::{
        documents::MaterialAssignment, nsa::MaterialDefinition, strip_known_extension,
        texture::TextureIndex,
    },
};

/// `material name -> texture name`, merged from several sources. The first
/// source to name a material keeps it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TextureMap {
    exact: HashMap<String, String>,
    folded: HashMap<String, String>,
}

impl TextureMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge entries. Materials that are already mapped are left alone.
    pub fn merge<I, K, V>(&mut self, entries: I) -> usize
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut added = 0;
        for (material, texture) in entries {
            let material = material.into();
            let texture = texture.into();
            self.folded
                .entry(material.to_lowercase())
                .or_insert_with(|| texture.clone());
            if let std::collections::hash_map::Entry::Vacant(slot) = self.exact.entry(material) {
                slot.insert(texture);
                added += 1;
            }
        }
        added
    }

    /// Entries of a flat `{material: texture}` document.
    pub fn entries_from_value(value: Value, what: &str, diagnostics: &mut Diagnostics) -> Vec<(String, String)> {
        let Value::Object(map) = value else {
            diagnostics.record(Fallback::MalformedRecord, format!("{what} is not an object"));
            return Vec::new();
        };
        let mut entries: Vec<(String, String)> = map
            .into_iter()
            .filter_map(|(material, texture)| match texture {
                Value::String(texture) => Some((material, texture)),
                _ => {
                    diagnostics.record(
                        Fallback::MalformedRecord,
                        format!("{what}: texture for {material} is not a string"),
                    );
                    None
                }
            })
            .collect();
        entries.sort();
        entries
    }

    /// Entries from parsed `.nsa` definitions that name a texture.
    pub fn entries_from_definitions(definitions: &[MaterialDefinition]) -> Vec<(String, String)> {
        definitions
            .iter()
            .filter_map(|d| d.texture().map(|t| (d.name.clone(), t)))
            .collect()
    }

    /// Exact material name, then case-insensitive.
    pub fn lookup(&self, material: &str) -> Option<&str> {
        self.exact
            .get(material)
            .or_else(|| self.folded.get(&material.to_lowercase()))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.exact.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exact.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum MaterialResolution {
    Textured {
        material: String,
        /// Key of the texture in the [`TextureIndex`].
        texture: String,
        alpha_blend: bool,
    },
    /// The group has no material assignment.
    Unassigned,
    /// The material is known but no loaded texture matches it.
    UnresolvedTexture { material: String, texture: String },
}

impl MaterialResolution {
    pub fn to_surface_material(&self, fallback_color: [f32; 4]) -> SurfaceMaterial {
        match self {
            MaterialResolution::Textured {
                texture,
                alpha_blend,
                ..
            } => SurfaceMaterial::Textured {
                texture: texture.clone(),
                alpha_blend: *alpha_blend,
            },
            _ => SurfaceMaterial::Flat {
                color: fallback_color,
            },
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, MaterialResolution::Textured { .. })
    }

    /// Record a miss for `group_id` in `diagnostics`. Hits record nothing.
    pub fn record_miss(&self, group_id: i64, diagnostics: &mut Diagnostics) {
        match self {
            MaterialResolution::Unassigned => diagnostics.record(
                Fallback::UnresolvedReference,
                format!("group {group_id} has no material assignment"),
            ),
            MaterialResolution::UnresolvedTexture { material, texture } => diagnostics.record(
                Fallback::UnresolvedReference,
                format!("group {group_id}: texture {texture} for material {material} not loaded"),
            ),
            MaterialResolution::Textured { .. } => {}
        }
    }
}

/// Read-only view over the indexes that resolves one group at a time.
pub struct MaterialResolver<'a> {
    config: &'a AssemblerConfig,
    assignment: &'a MaterialAssignment,
    texture_map: &'a TextureMap,
    textures: &'a TextureIndex,
}

impl<'a> MaterialResolver<'a> {
    pub fn new(
        config: &'a AssemblerConfig,
        assignment: &'a MaterialAssignment,
        texture_map: &'a TextureMap,
        textures: &'a TextureIndex,
    ) -> Self {
        Self {
            config,
            assignment,
            texture_map,
            textures,
        }
    }

    pub fn resolve(&self, group_id: i64) -> MaterialResolution {
        let Some(material) = self.assignment.material_for(group_id) else {
            return MaterialResolution::Unassigned;
        };
        let texture = self.texture_map.lookup(material).unwrap_or(material);
        match self.find_texture(texture) {
            Some(key) => MaterialResolution::Textured {
                material: material.to_string(),
                texture: key,
                alpha_blend: self.is_transparent(texture),
            },
            None => MaterialResolution::UnresolvedTexture {
                material: material.to_string(),
                texture: texture.to_string(),
            },
        }
    }

    fn find_texture(&self, name: &str) -> Option<String> {
        let stripped = strip_known_extension(name, &self.config.texture_strip_extensions);
        let exact = [name.to_string(), stripped.to_string()];
        let lowered = [name.to_lowercase(), stripped.to_lowercase()];
        exact
            .into_iter()
            .chain(lowered)
            .find(|candidate| self.textures.contains(candidate))
    }

    fn is_transparent(&self, texture: &str) -> bool {
        let token = &self.config.transparency_token;
        !token.is_empty() && texture.to_lowercase().contains(token.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::{documents::GroupKey, texture::LoadedTexture};
    use image::RgbaImage;
    use std::path::PathBuf;

    fn index(names: &[&str]) -> TextureIndex {
        let mut index = TextureIndex::new();
        for name in names {
            index.register(LoadedTexture {
                name: name.to_string(),
                path: PathBuf::from(format!("{name}.png")),
                image: RgbaImage::new(1, 1),
            });
        }
        index
    }

    fn assignment(rows: &[(i64, &str)]) -> MaterialAssignment {
        let mut assignment = MaterialAssignment::new();
        for (id, material) in rows {
            assignment.insert(GroupKey::Int(*id), material.to_string());
        }
        assignment
    }

    #[test]
    fn first_writer_wins_across_sources() {
        let mut map = TextureMap::new();
        assert_eq!(map.merge([("floor", "level_floor")]), 1);
        assert_eq!(map.merge([("floor", "global_floor"), ("wall", "global_wall")]), 1);
        assert_eq!(map.lookup("floor"), Some("level_floor"));
        assert_eq!(map.lookup("wall"), Some("global_wall"));
        assert_eq!(map.lookup("WALL"), Some("global_wall"));
    }

    #[test]
    fn chain_goes_through_map_and_strips_extension() {
        let config = AssemblerConfig::default();
        let textures = index(&["GE_grate_01"]);
        let mut map = TextureMap::new();
        map.merge([("floor", "GE_grate_01.dds")]);
        let assignment = assignment(&[(1, "floor")]);
        let resolver = MaterialResolver::new(&config, &assignment, &map, &textures);

        assert_eq!(
            resolver.resolve(1),
            MaterialResolution::Textured {
                material: "floor".into(),
                texture: "GE_grate_01".into(),
                alpha_blend: false,
            }
        );
    }

    #[test]
    fn material_name_doubles_as_texture_name() {
        let config = AssemblerConfig::default();
        let textures = index(&["rock_wall"]);
        let map = TextureMap::new();
        let assignment = assignment(&[(4, "Rock_Wall")]);
        let resolver = MaterialResolver::new(&config, &assignment, &map, &textures);
        assert!(matches!(
            resolver.resolve(4),
            MaterialResolution::Textured { texture, .. } if texture == "rock_wall"
        ));
    }

    #[test]
    fn transparency_token_marks_alpha_blend() {
        let config = AssemblerConfig::default();
        let textures = index(&["GE_glass_Trans"]);
        let mut map = TextureMap::new();
        map.merge([("window", "GE_glass_Trans")]);
        let assignment = assignment(&[(2, "window")]);
        let resolver = MaterialResolver::new(&config, &assignment, &map, &textures);
        let resolution = resolver.resolve(2);
        assert!(resolution.to_surface_material(config.fallback_color).is_transparent());
    }

    #[test]
    fn misses_fall_back_to_gray() {
        let config = AssemblerConfig::default();
        let textures = index(&[]);
        let map = TextureMap::new();
        let assignment = assignment(&[(1, "ghost_material")]);
        let resolver = MaterialResolver::new(&config, &assignment, &map, &textures);
        let mut diagnostics = Diagnostics::new();

        let unassigned = resolver.resolve(9);
        assert_eq!(unassigned, MaterialResolution::Unassigned);
        unassigned.record_miss(9, &mut diagnostics);
        let unresolved = resolver.resolve(1);
        unresolved.record_miss(1, &mut diagnostics);
        assert!(matches!(unresolved, MaterialResolution::UnresolvedTexture { .. }));
        assert_eq!(
            unresolved.to_surface_material(config.fallback_color),
            SurfaceMaterial::Flat {
                color: [0.5, 0.5, 0.5, 1.0]
            }
        );
        assert_eq!(diagnostics.count(Fallback::UnresolvedReference), 2);
    }

    #[test]
    fn definitions_feed_the_map() {
        let definitions = crate::resources::nsa::parse_nsa("Floor\n{\ntexture common/floor_01.dds\n}\nBare\n{\nshader alpha\n}\n");
        let entries = TextureMap::entries_from_definitions(&definitions);
        assert_eq!(entries, vec![("Floor".to_string(), "floor_01".to_string())]);
    }
}
