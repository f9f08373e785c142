//! Typed views of the level JSON documents.
//!
//! Documents are parsed into [`serde_json::Value`] first and then record by
//! record, so one malformed group, assignment row or entity is skipped without
//! losing its siblings.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

use crate::{
    data_structures::{
        entity::{Entity, EntityCategory},
        transform::to_target_vec,
    },
    error::{Diagnostics, Fallback},
};

/// One flat-array geometry group as written by the upstream extractor.
///
/// Upstream also writes packed vertex colors; they are not display colors and
/// are never read.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct MeshGroup {
    pub id: i64,
    #[serde(default)]
    pub section_id: Option<i64>,
    pub vertex_count: usize,
    #[serde(default)]
    pub triangle_count: Option<usize>,
    pub positions: Vec<f32>,
    #[serde(default)]
    pub normals: Vec<f32>,
    #[serde(default)]
    pub uvs: Vec<f32>,
    #[serde(default)]
    pub indices: Vec<u32>,
}

impl MeshGroup {
    /// Declared triangle count, or the count implied by the index list.
    pub fn declared_triangles(&self) -> usize {
        self.triangle_count.unwrap_or(self.indices.len() / 3)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct GeometryDocument {
    /// Material names listed in the header, in header order.
    pub materials: Vec<String>,
    pub groups: Vec<MeshGroup>,
}

impl GeometryDocument {
    /// Build from the parsed document. `None` when the top level is not an object.
    pub fn from_value(value: Value, diagnostics: &mut Diagnostics) -> Option<Self> {
        let Value::Object(mut root) = value else {
            return None;
        };

        let materials = root
            .get("header")
            .and_then(|h| h.get("materials"))
            .and_then(Value::as_array)
            .map(|names| {
                names
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let raw_groups = match root.remove("mesh_groups") {
            Some(Value::Array(groups)) => groups,
            Some(_) => {
                diagnostics.record(Fallback::MalformedRecord, "mesh_groups is not an array");
                Vec::new()
            }
            None => {
                diagnostics.record(Fallback::MalformedRecord, "geometry document has no mesh_groups");
                Vec::new()
            }
        };

        let mut groups = Vec::with_capacity(raw_groups.len());
        for (position, raw) in raw_groups.into_iter().enumerate() {
            match serde_json::from_value::<MeshGroup>(raw) {
                Ok(group) => groups.push(group),
                Err(e) => diagnostics.record(
                    Fallback::MalformedRecord,
                    format!("mesh group #{position} skipped: {e}"),
                ),
            }
        }

        Some(Self { materials, groups })
    }
}

/// Group identifier as it appears in assignment rows: upstream writes both forms.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Hash)]
#[serde(untagged)]
pub enum GroupKey {
    Int(i64),
    Text(String),
}

#[derive(Clone, Debug, Deserialize)]
struct AssignmentRow {
    group_id: GroupKey,
    material_name: String,
}

/// `group_id -> material_name`, keeping integer and string keys apart.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MaterialAssignment {
    by_id: HashMap<i64, String>,
    by_text: HashMap<String, String>,
}

impl MaterialAssignment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accepts the row array `[{group_id, material_name}]` or a flat object
    /// `{"<group_id>": "<material_name>"}`.
    pub fn from_value(value: Value, diagnostics: &mut Diagnostics) -> Self {
        let mut assignment = Self::new();
        match value {
            Value::Array(rows) => {
                for (position, row) in rows.into_iter().enumerate() {
                    match serde_json::from_value::<AssignmentRow>(row) {
                        Ok(row) => assignment.insert(row.group_id, row.material_name),
                        Err(e) => diagnostics.record(
                            Fallback::MalformedRecord,
                            format!("material assignment row #{position} skipped: {e}"),
                        ),
                    }
                }
            }
            Value::Object(map) => {
                for (key, material) in map {
                    match material {
                        Value::String(material) => assignment.insert(GroupKey::Text(key), material),
                        _ => diagnostics.record(
                            Fallback::MalformedRecord,
                            format!("material assignment for group {key} is not a string"),
                        ),
                    }
                }
            }
            _ => diagnostics.record(
                Fallback::MalformedRecord,
                "material assignment document is neither an array nor an object",
            ),
        }
        assignment
    }

    pub fn insert(&mut self, key: GroupKey, material: String) {
        match key {
            GroupKey::Int(id) => {
                self.by_id.insert(id, material);
            }
            GroupKey::Text(text) => {
                self.by_text.insert(text, material);
            }
        }
    }

    /// Integer key first, then the same id as a string.
    pub fn material_for(&self, group_id: i64) -> Option<&str> {
        self.by_id
            .get(&group_id)
            .or_else(|| self.by_text.get(&group_id.to_string()))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_id.len() + self.by_text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Clone, Debug, Deserialize)]
struct EntityRecord {
    name: String,
    #[serde(default)]
    category: Option<String>,
    position: [f32; 3],
    #[serde(default)]
    model_ref: Option<String>,
}

/// Entities from `{entities: [...]}` or a bare array, with positions converted
/// to target space.
pub fn parse_entities(value: Value, diagnostics: &mut Diagnostics) -> Vec<Entity> {
    let records = match value {
        Value::Array(records) => records,
        Value::Object(mut root) => match root.remove("entities") {
            Some(Value::Array(records)) => records,
            _ => {
                diagnostics.record(Fallback::MalformedRecord, "entity document has no entities array");
                return Vec::new();
            }
        },
        _ => {
            diagnostics.record(Fallback::MalformedRecord, "entity document is not an object");
            return Vec::new();
        }
    };

    records
        .into_iter()
        .enumerate()
        .filter_map(|(position, raw)| match serde_json::from_value::<EntityRecord>(raw) {
            Ok(record) => Some(Entity {
                category: EntityCategory::from_upstream(record.category.as_deref()),
                position: to_target_vec(record.position.into()),
                model_ref: record.model_ref.filter(|r| !r.trim().is_empty()),
                name: record.name,
            }),
            Err(e) => {
                diagnostics.record(
                    Fallback::MalformedRecord,
                    format!("entity #{position} skipped: {e}"),
                );
                None
            }
        })
        .collect()
}
