//! Assembler configuration and per-level file layout.
//!
//! [`AssemblerConfig`] carries every tunable of the assembly pass. All fields
//! have defaults, so a config file only needs to name what it changes:
//!
//! ```json
//! { "collision_min_tris": 16, "section_filter": 0 }
//! ```

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use serde::Deserialize;

use crate::error::{AssembleError, Result};

/// Groups with fewer triangles than this are treated as decoration and get no collision.
pub const COLLISION_MIN_TRIS: usize = 10;

/// Mid-gray used for surfaces whose material or texture cannot be resolved.
pub const FALLBACK_GRAY: [f32; 4] = [0.5, 0.5, 0.5, 1.0];

/// Name of the entity that always gets a visual, whatever its category.
pub const SPAWN_MARKER_NAME: &str = "PlayerStart";

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct AssemblerConfig {
    pub collision_min_tris: usize,
    /// Only groups from this section are assembled when set.
    pub section_filter: Option<i64>,
    pub texture_extensions: Vec<String>,
    pub model_extensions: Vec<String>,
    /// Format extensions stripped from texture names before lookup.
    pub texture_strip_extensions: Vec<String>,
    /// Extensions of the original binary assets that leak into entity names.
    pub source_model_extensions: Vec<String>,
    pub transparency_token: String,
    pub spawn_marker_name: String,
    pub fallback_color: [f32; 4],
    /// Entity name to canonical model basename, for known naming mismatches.
    pub model_overrides: HashMap<String, String>,
    pub variant_suffixes: Vec<String>,
    /// Parse resolved glTF models during placement.
    pub load_model_assets: bool,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        let strings = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        let model_overrides = [
            ("doormetal01", "1_2_1_BunkerDoor_01"),
            ("doormetal02", "1_2_1_BunkerDoor_02"),
            ("ladder01", "1_2_1_Ladder_01"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self {
            collision_min_tris: COLLISION_MIN_TRIS,
            section_filter: None,
            texture_extensions: strings(&["png", "jpg", "jpeg", "bmp", "tga"]),
            model_extensions: strings(&["glb", "gltf"]),
            texture_strip_extensions: strings(&["dds", "xpr"]),
            source_model_extensions: strings(&["nag", "nod", "noc", "nmb", "nnb", "nad", "npd", "xvu"]),
            transparency_token: "trans".to_string(),
            spawn_marker_name: SPAWN_MARKER_NAME.to_string(),
            fallback_color: FALLBACK_GRAY,
            model_overrides,
            variant_suffixes: strings(&[
                "_01", "_02", "_phys", "_physclip", "_col", "_collision", "_smash", "_lod0",
            ]),
            load_model_assets: true,
        }
    }
}

impl AssemblerConfig {
    /// Read a JSON config file. Missing fields keep their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| AssembleError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_json(&text).map_err(|message| AssembleError::Config {
            path: path.to_path_buf(),
            message,
        })
    }

    pub fn from_json(text: &str) -> std::result::Result<Self, String> {
        let mut config: Self = serde_json::from_str(text).map_err(|e| e.to_string())?;
        config.normalize();
        Ok(config)
    }

    /// Lowercase every key that is compared case-insensitively.
    fn normalize(&mut self) {
        let lower = |items: &mut Vec<String>| {
            items.iter_mut().for_each(|s| {
                *s = s.trim_start_matches('.').to_ascii_lowercase();
            })
        };
        lower(&mut self.texture_extensions);
        lower(&mut self.model_extensions);
        lower(&mut self.texture_strip_extensions);
        lower(&mut self.source_model_extensions);
        self.transparency_token = self.transparency_token.to_lowercase();
        self.model_overrides = std::mem::take(&mut self.model_overrides)
            .into_iter()
            .map(|(k, v)| (k.to_lowercase(), v))
            .collect();
    }
}

/// Where the documents and asset directories of one level live.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LevelPaths {
    pub geometry: PathBuf,
    pub level_texture_map: Option<PathBuf>,
    pub global_texture_map: Option<PathBuf>,
    pub material_assignment: Option<PathBuf>,
    pub entities: Option<PathBuf>,
    pub material_definitions: Option<PathBuf>,
    pub texture_dir: Option<PathBuf>,
    pub model_dir: Option<PathBuf>,
}

impl LevelPaths {
    /// Only the geometry document; every optional input is absent.
    pub fn geometry_only(geometry: impl Into<PathBuf>) -> Self {
        Self {
            geometry: geometry.into(),
            level_texture_map: None,
            global_texture_map: None,
            material_assignment: None,
            entities: None,
            material_definitions: None,
            texture_dir: None,
            model_dir: None,
        }
    }

    /// The conventional extraction layout:
    ///
    /// ```text
    /// <root>/levels/<level>.json
    /// <root>/levels/<level>_texture_map.json
    /// <root>/levels/<level>_materials.json
    /// <root>/levels/<level>_entities.json
    /// <root>/texture_map.json
    /// <root>/materials/*.nsa
    /// <root>/textures/
    /// <root>/models/
    /// ```
    pub fn from_root(root: impl AsRef<Path>, level: &str) -> Self {
        let root = root.as_ref();
        let levels = root.join("levels");
        Self {
            geometry: levels.join(format!("{level}.json")),
            level_texture_map: Some(levels.join(format!("{level}_texture_map.json"))),
            global_texture_map: Some(root.join("texture_map.json")),
            material_assignment: Some(levels.join(format!("{level}_materials.json"))),
            entities: Some(levels.join(format!("{level}_entities.json"))),
            material_definitions: Some(root.join("materials")),
            texture_dir: Some(root.join("textures")),
            model_dir: Some(root.join("models")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let config = AssemblerConfig::from_json(r#"{ "collision_min_tris": 4 }"#).unwrap();
        assert_eq!(config.collision_min_tris, 4);
        assert_eq!(config.fallback_color, FALLBACK_GRAY);
        assert_eq!(config.spawn_marker_name, SPAWN_MARKER_NAME);
        assert!(config.variant_suffixes.contains(&"_phys".to_string()));
    }

    #[test]
    fn normalizes_extensions_and_override_keys() {
        let config = AssemblerConfig::from_json(
            r#"{ "texture_extensions": [".PNG"], "model_overrides": { "DoorMetal01": "Bunker" } }"#,
        )
        .unwrap();
        assert_eq!(config.texture_extensions, vec!["png".to_string()]);
        assert_eq!(config.model_overrides.get("doormetal01").map(String::as_str), Some("Bunker"));
    }

    #[test]
    fn rejects_wrong_types() {
        assert!(AssemblerConfig::from_json(r#"{ "collision_min_tris": "many" }"#).is_err());
    }

    #[test]
    fn conventional_layout() {
        let paths = LevelPaths::from_root("/data", "level1");
        assert_eq!(paths.geometry, PathBuf::from("/data/levels/level1.json"));
        assert_eq!(paths.texture_dir, Some(PathBuf::from("/data/textures")));
        assert_eq!(
            paths.entities,
            Some(PathBuf::from("/data/levels/level1_entities.json"))
        );
    }
}
