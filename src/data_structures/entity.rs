//! Entity records and the handles the placer produces for them.
//!
//! An [`EntityHandle`] is a tagged descriptor: the [`EntityCategory`] plus a
//! category payload ([`EntityPayload`]) and the [`Visual`] chosen for it. Runtime
//! behavior is not modelled here; the handle only says what to spawn and where.

use std::{fmt, path::PathBuf, sync::Arc};

use cgmath::Vector3;

use crate::{data_structures::instance::Instance, resources::model::ModelAsset};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityCategory {
    Enemy,
    Door,
    Pickup,
    Prop,
    Trigger,
    Script,
    Geometry,
    Other,
}

impl EntityCategory {
    pub const ALL: [EntityCategory; 8] = [
        EntityCategory::Enemy,
        EntityCategory::Door,
        EntityCategory::Pickup,
        EntityCategory::Prop,
        EntityCategory::Trigger,
        EntityCategory::Script,
        EntityCategory::Geometry,
        EntityCategory::Other,
    ];

    /// Category from the upstream field. Absent or unknown values map to `Other`.
    pub fn from_upstream(value: Option<&str>) -> Self {
        let Some(value) = value else {
            return EntityCategory::Other;
        };
        match value.trim().to_ascii_lowercase().as_str() {
            "enemy" => EntityCategory::Enemy,
            "door" => EntityCategory::Door,
            "pickup" => EntityCategory::Pickup,
            "prop" => EntityCategory::Prop,
            "trigger" => EntityCategory::Trigger,
            "script" => EntityCategory::Script,
            "geometry" => EntityCategory::Geometry,
            _ => EntityCategory::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityCategory::Enemy => "enemy",
            EntityCategory::Door => "door",
            EntityCategory::Pickup => "pickup",
            EntityCategory::Prop => "prop",
            EntityCategory::Trigger => "trigger",
            EntityCategory::Script => "script",
            EntityCategory::Geometry => "geometry",
            EntityCategory::Other => "other",
        }
    }

    /// Categories that only get a visual when their model resolves.
    pub fn is_invisible(&self) -> bool {
        matches!(
            self,
            EntityCategory::Trigger
                | EntityCategory::Script
                | EntityCategory::Geometry
                | EntityCategory::Other
        )
    }
}

impl fmt::Display for EntityCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entity record after loading. `position` is already in target space.
#[derive(Clone, Debug, PartialEq)]
pub struct Entity {
    pub name: String,
    pub category: EntityCategory,
    pub position: Vector3<f32>,
    pub model_ref: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemyStats {
    pub health: f32,
    pub speed: f32,
    pub damage: f32,
    pub attack_range: f32,
    pub sight_range: f32,
}

impl Default for EnemyStats {
    fn default() -> Self {
        Self {
            health: 100.0,
            speed: 3.0,
            damage: 10.0,
            attack_range: 2.0,
            sight_range: 20.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct EnemyPayload {
    /// Lowercase type name the stats were looked up with.
    pub type_name: String,
    pub stats: EnemyStats,
    /// False when the type was not in the stat table and defaults were used.
    pub known_type: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DoorKind {
    Ladder,
    Console,
    Elevator,
    Door,
}

impl DoorKind {
    pub fn prompt(&self) -> &'static str {
        match self {
            DoorKind::Ladder => "Climb ladder",
            DoorKind::Console => "Use console",
            DoorKind::Elevator => "Call elevator",
            DoorKind::Door => "Open door",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct DoorPayload {
    pub subtype: DoorKind,
    pub prompt: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PickupKind {
    Health,
    Energy,
    Ammo,
    Grenade,
    Key,
    Generic,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PickupPayload {
    /// The keyword that matched, or `None` for the generic fallback.
    pub key: Option<String>,
    pub kind: PickupKind,
    pub amount: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub enum EntityPayload {
    Enemy(EnemyPayload),
    Door(DoorPayload),
    Pickup(PickupPayload),
    SpawnMarker,
    Passive,
}

/// Stand-in geometry for entities without a usable model.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MarkerShape {
    Box { size: [f32; 3] },
    Capsule { radius: f32, height: f32 },
    Cylinder { radius: f32, height: f32 },
}

#[derive(Clone, Debug)]
pub enum Visual {
    /// A resolved model file. `asset` is `None` when asset loading is disabled.
    Model {
        path: PathBuf,
        asset: Option<Arc<ModelAsset>>,
    },
    Marker { shape: MarkerShape, color: [f32; 4] },
}

impl Visual {
    pub fn model_path(&self) -> Option<&PathBuf> {
        match self {
            Visual::Model { path, .. } => Some(path),
            Visual::Marker { .. } => None,
        }
    }

    pub fn is_marker(&self) -> bool {
        matches!(self, Visual::Marker { .. })
    }
}

/// An entity that will be spawned.
#[derive(Clone, Debug)]
pub struct EntityHandle {
    pub name: String,
    pub category: EntityCategory,
    pub transform: Instance,
    pub payload: EntityPayload,
    pub visual: Visual,
}

/// An entity in the invisible set that got no visual.
#[derive(Clone, Debug, PartialEq)]
pub struct SuppressedEntity {
    pub name: String,
    pub category: EntityCategory,
    pub position: Vector3<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_category_is_case_insensitive() {
        assert_eq!(EntityCategory::from_upstream(Some("Enemy")), EntityCategory::Enemy);
        assert_eq!(EntityCategory::from_upstream(Some(" TRIGGER ")), EntityCategory::Trigger);
        assert_eq!(EntityCategory::from_upstream(Some("vehicle")), EntityCategory::Other);
        assert_eq!(EntityCategory::from_upstream(None), EntityCategory::Other);
    }

    #[test]
    fn invisible_set() {
        let invisible: Vec<_> = EntityCategory::ALL
            .iter()
            .filter(|c| c.is_invisible())
            .map(|c| c.as_str())
            .collect();
        assert_eq!(invisible, vec!["trigger", "script", "geometry", "other"]);
    }

    #[test]
    fn door_kinds_have_distinct_prompts() {
        let prompts = [
            DoorKind::Ladder.prompt(),
            DoorKind::Console.prompt(),
            DoorKind::Elevator.prompt(),
            DoorKind::Door.prompt(),
        ];
        for (i, a) in prompts.iter().enumerate() {
            for b in &prompts[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
