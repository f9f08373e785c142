//! Entity classification and placement.
//!
//! Each entity runs the model resolution chain once and then follows its
//! category's policy:
//!
//! - trigger, script, geometry and other records are suppressed unless their
//!   model resolves or they are the spawn marker
//! - enemies get stats from [`EnemyStatTable`], keyed by lowercase type name
//! - doors get a subtype from the first matching token of [`DOOR_TOKENS`]
//! - pickups get the longest matching keyword of the [`PickupTable`]
//! - everything else is a passive visual
//!
//! Entities whose model is missing or does not import get a marker shape.

use std::collections::{BTreeMap, HashMap};

use crate::{
    config::AssemblerConfig,
    data_structures::{
        entity::{
            DoorKind, DoorPayload, EnemyPayload, EnemyStats, Entity, EntityCategory,
            EntityHandle, EntityPayload, MarkerShape, PickupKind, PickupPayload,
            SuppressedEntity, Visual,
        },
        instance::Instance,
    },
    error::{Diagnostics, Fallback},
    resources::model::{ModelCache, ModelIndex, ModelResolver},
    scene::palette,
};

/// Door subtypes by name token, checked in order.
pub const DOOR_TOKENS: [(&str, DoorKind); 4] = [
    ("ladder", DoorKind::Ladder),
    ("console", DoorKind::Console),
    ("elevator", DoorKind::Elevator),
    ("door", DoorKind::Door),
];

const ENVIRONMENT_BOX: MarkerShape = MarkerShape::Box {
    size: [5.4, 2.8, 5.4],
};
const ACTOR_CAPSULE: MarkerShape = MarkerShape::Capsule {
    radius: 0.75,
    height: 2.5,
};
const PROP_CYLINDER: MarkerShape = MarkerShape::Cylinder {
    radius: 0.72,
    height: 1.8,
};

pub fn classify_door(name: &str) -> DoorKind {
    let lower = name.to_lowercase();
    DOOR_TOKENS
        .iter()
        .find(|(token, _)| lower.contains(token))
        .map(|(_, kind)| *kind)
        .unwrap_or(DoorKind::Door)
}

/// Lowercase name with trailing `_<digits>` instance counters removed:
/// `Marine_01` and `marine_2_03` both give `marine`.
pub fn enemy_type_name(name: &str) -> String {
    let mut lower = name.trim().to_lowercase();
    while let Some((head, tail)) = lower.rsplit_once('_') {
        if tail.is_empty() || !tail.bytes().all(|b| b.is_ascii_digit()) || head.is_empty() {
            break;
        }
        lower.truncate(head.len());
    }
    lower
}

#[derive(Clone, Debug)]
pub struct EnemyStatTable {
    stats: HashMap<String, EnemyStats>,
}

impl EnemyStatTable {
    pub fn new(entries: impl IntoIterator<Item = (String, EnemyStats)>) -> Self {
        Self {
            stats: entries
                .into_iter()
                .map(|(name, stats)| (name.to_lowercase(), stats))
                .collect(),
        }
    }

    pub fn get(&self, type_name: &str) -> Option<&EnemyStats> {
        self.stats.get(&type_name.to_lowercase())
    }

    pub fn payload(&self, entity_name: &str) -> EnemyPayload {
        let type_name = enemy_type_name(entity_name);
        match self.get(&type_name) {
            Some(stats) => EnemyPayload {
                type_name,
                stats: *stats,
                known_type: true,
            },
            None => EnemyPayload {
                type_name,
                stats: EnemyStats::default(),
                known_type: false,
            },
        }
    }
}

impl Default for EnemyStatTable {
    fn default() -> Self {
        let stats = |health, speed, damage, attack_range, sight_range| EnemyStats {
            health,
            speed,
            damage,
            attack_range,
            sight_range,
        };
        Self::new(
            [
                ("marine", stats(60.0, 3.5, 8.0, 18.0, 28.0)),
                ("firebat", stats(75.0, 3.2, 14.0, 4.0, 20.0)),
                ("ghost", stats(55.0, 4.0, 20.0, 30.0, 40.0)),
                ("goliath", stats(180.0, 2.4, 16.0, 24.0, 32.0)),
                ("zergling", stats(35.0, 6.0, 5.0, 1.5, 18.0)),
                ("hydralisk", stats(90.0, 3.0, 12.0, 16.0, 26.0)),
                ("dragoon", stats(160.0, 2.6, 20.0, 22.0, 30.0)),
                ("observer", stats(40.0, 4.5, 0.0, 0.0, 45.0)),
            ]
            .into_iter()
            .map(|(name, stats)| (name.to_string(), stats)),
        )
    }
}

#[derive(Clone, Debug, PartialEq)]
struct PickupEntry {
    key: String,
    kind: PickupKind,
    amount: u32,
}

/// Pickup keywords, kept longest first so `powhealth_large` wins over `powhealth`.
#[derive(Clone, Debug)]
pub struct PickupTable {
    entries: Vec<PickupEntry>,
}

impl PickupTable {
    pub fn new(entries: impl IntoIterator<Item = (String, PickupKind, u32)>) -> Self {
        let mut entries: Vec<PickupEntry> = entries
            .into_iter()
            .map(|(key, kind, amount)| PickupEntry {
                key: key.to_lowercase(),
                kind,
                amount,
            })
            .collect();
        entries.sort_by(|a, b| b.key.len().cmp(&a.key.len()).then_with(|| a.key.cmp(&b.key)));
        Self { entries }
    }

    /// Keys in match order.
    pub fn keys(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.key.as_str()).collect()
    }

    pub fn payload(&self, entity_name: &str) -> PickupPayload {
        let lower = entity_name.to_lowercase();
        match self.entries.iter().find(|e| lower.contains(&e.key)) {
            Some(entry) => PickupPayload {
                key: Some(entry.key.clone()),
                kind: entry.kind,
                amount: entry.amount,
            },
            None => PickupPayload {
                key: None,
                kind: PickupKind::Generic,
                amount: 1,
            },
        }
    }
}

impl Default for PickupTable {
    fn default() -> Self {
        Self::new(
            [
                ("powhealth", PickupKind::Health, 25),
                ("powhealth_large", PickupKind::Health, 100),
                ("powenergy", PickupKind::Energy, 25),
                ("powenergy_large", PickupKind::Energy, 100),
                ("powammo", PickupKind::Ammo, 30),
                ("powgrenade", PickupKind::Grenade, 2),
                ("powkey", PickupKind::Key, 1),
            ]
            .into_iter()
            .map(|(key, kind, amount)| (key.to_string(), kind, amount)),
        )
    }
}

/// Result of placing every entity of a level.
#[derive(Clone, Debug, Default)]
pub struct Placement {
    pub handles: Vec<EntityHandle>,
    pub suppressed: Vec<SuppressedEntity>,
    /// Records seen per category, placed or not.
    pub counts: BTreeMap<EntityCategory, usize>,
    /// Placed entities that got their model.
    pub models_resolved: usize,
    /// Placed entities that fell back to a marker.
    pub models_unresolved: usize,
}

pub struct EntityPlacer<'a> {
    config: &'a AssemblerConfig,
    resolver: ModelResolver<'a>,
    enemies: EnemyStatTable,
    pickups: PickupTable,
    cache: ModelCache,
}

impl<'a> EntityPlacer<'a> {
    pub fn new(config: &'a AssemblerConfig, models: &'a ModelIndex) -> Self {
        Self {
            config,
            resolver: ModelResolver::new(config, models),
            enemies: EnemyStatTable::default(),
            pickups: PickupTable::default(),
            cache: ModelCache::new(),
        }
    }

    pub fn with_tables(mut self, enemies: EnemyStatTable, pickups: PickupTable) -> Self {
        self.enemies = enemies;
        self.pickups = pickups;
        self
    }

    pub fn place_all(&mut self, entities: &[Entity], diagnostics: &mut Diagnostics) -> Placement {
        let mut placement = Placement::default();
        for entity in entities {
            self.place(entity, &mut placement, diagnostics);
        }
        log::info!(
            "Placed {} entities ({} suppressed, {} models resolved, {} unresolved)",
            placement.handles.len(),
            placement.suppressed.len(),
            placement.models_resolved,
            placement.models_unresolved
        );
        placement
    }

    fn place(&mut self, entity: &Entity, placement: &mut Placement, diagnostics: &mut Diagnostics) {
        *placement.counts.entry(entity.category).or_default() += 1;

        let resolution = self.resolver.resolve(&entity.name, entity.model_ref.as_deref());
        let is_spawn = self
            .resolver
            .clean_name(&entity.name)
            .eq_ignore_ascii_case(&self.config.spawn_marker_name);

        if entity.category.is_invisible() && !resolution.is_resolved() && !is_spawn {
            log::debug!("Suppressed {} {}", entity.category, entity.name);
            placement.suppressed.push(SuppressedEntity {
                name: entity.name.clone(),
                category: entity.category,
                position: entity.position,
            });
            return;
        }

        let payload = if is_spawn {
            EntityPayload::SpawnMarker
        } else {
            match entity.category {
                EntityCategory::Enemy => EntityPayload::Enemy(self.enemies.payload(&entity.name)),
                EntityCategory::Door => {
                    let subtype = classify_door(&entity.name);
                    EntityPayload::Door(DoorPayload {
                        subtype,
                        prompt: subtype.prompt().to_string(),
                    })
                }
                EntityCategory::Pickup => EntityPayload::Pickup(self.pickups.payload(&entity.name)),
                _ => EntityPayload::Passive,
            }
        };

        let model = resolution.path().and_then(|path| {
            if !self.config.load_model_assets {
                return Some(Visual::Model {
                    path: path.to_path_buf(),
                    asset: None,
                });
            }
            self.cache
                .get_or_load(path, diagnostics)
                .map(|asset| Visual::Model {
                    path: path.to_path_buf(),
                    asset: Some(asset),
                })
        });
        let visual = match model {
            Some(visual) => {
                placement.models_resolved += 1;
                visual
            }
            None => {
                placement.models_unresolved += 1;
                if !resolution.is_resolved() {
                    diagnostics.record(
                        Fallback::UnresolvedReference,
                        format!("no model for {} {}", entity.category, entity.name),
                    );
                }
                marker_for(entity, &payload)
            }
        };

        placement.handles.push(EntityHandle {
            name: entity.name.clone(),
            category: entity.category,
            transform: Instance::from(entity.position),
            payload,
            visual,
        });
    }
}

fn marker_for(entity: &Entity, payload: &EntityPayload) -> Visual {
    let (shape, colors) = match (payload, entity.category) {
        (EntityPayload::SpawnMarker, _) | (_, EntityCategory::Enemy) => {
            (ACTOR_CAPSULE, palette::ACTOR)
        }
        (_, EntityCategory::Pickup | EntityCategory::Prop) => (PROP_CYLINDER, palette::PROP),
        _ => (ENVIRONMENT_BOX, palette::ENVIRONMENT),
    };
    Visual::Marker {
        shape,
        color: palette::lerp(colors, palette::mix_for_name(&entity.name)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Vector3;

    fn entity(name: &str, category: EntityCategory, model_ref: Option<&str>) -> Entity {
        Entity {
            name: name.to_string(),
            category,
            position: Vector3::new(1.0, 2.0, 3.0),
            model_ref: model_ref.map(str::to_string),
        }
    }

    fn no_assets() -> AssemblerConfig {
        AssemblerConfig {
            load_model_assets: false,
            ..Default::default()
        }
    }

    #[test]
    fn longest_pickup_key_wins() {
        let table = PickupTable::new([
            ("powhealth".to_string(), PickupKind::Health, 25),
            ("powhealth_large".to_string(), PickupKind::Health, 100),
        ]);
        assert_eq!(table.keys(), vec!["powhealth_large", "powhealth"]);
        let payload = table.payload("PowHealth_Large_02");
        assert_eq!(payload.key.as_deref(), Some("powhealth_large"));
        assert_eq!(payload.amount, 100);

        let payload = table.payload("PowHealth_03");
        assert_eq!(payload.key.as_deref(), Some("powhealth"));
        assert_eq!(table.payload("Mystery").kind, PickupKind::Generic);
    }

    #[test]
    fn door_tokens_in_priority_order() {
        assert_eq!(classify_door("Ladder_Door_01"), DoorKind::Ladder);
        assert_eq!(classify_door("ConsoleDoor"), DoorKind::Console);
        assert_eq!(classify_door("Elevator_B"), DoorKind::Elevator);
        assert_eq!(classify_door("DoorMetal01"), DoorKind::Door);
        assert_eq!(classify_door("Hatch"), DoorKind::Door);
    }

    #[test]
    fn enemy_type_strips_instance_counters() {
        assert_eq!(enemy_type_name("Marine_01"), "marine");
        assert_eq!(enemy_type_name("Zergling_2_03"), "zergling");
        assert_eq!(enemy_type_name("Hydralisk"), "hydralisk");
        assert_eq!(enemy_type_name("_01"), "_01");

        let table = EnemyStatTable::default();
        let known = table.payload("Firebat_04");
        assert!(known.known_type);
        let unknown = table.payload("Ultralisk_01");
        assert!(!unknown.known_type);
        assert_eq!(unknown.stats, EnemyStats::default());
    }

    #[test]
    fn trigger_needs_a_model() {
        let config = no_assets();
        let mut models = ModelIndex::new();
        models.insert("models/alarm_box.glb");
        let mut placer = EntityPlacer::new(&config, &models);
        let mut diagnostics = Diagnostics::new();

        let placement = placer.place_all(
            &[
                entity("Trigger_07", EntityCategory::Trigger, None),
                entity("Trigger_08", EntityCategory::Trigger, Some("alarm_box.nod")),
            ],
            &mut diagnostics,
        );
        assert_eq!(placement.suppressed.len(), 1);
        assert_eq!(placement.suppressed[0].name, "Trigger_07");
        assert_eq!(placement.handles.len(), 1);
        assert_eq!(placement.handles[0].name, "Trigger_08");
        assert_eq!(placement.counts[&EntityCategory::Trigger], 2);
        assert_eq!(placement.models_resolved, 1);
        assert_eq!(placement.models_unresolved, 0);
    }

    #[test]
    fn spawn_marker_always_placed() {
        let config = no_assets();
        let models = ModelIndex::new();
        let mut placer = EntityPlacer::new(&config, &models);
        let placement = placer.place_all(
            &[entity("PlayerStart", EntityCategory::Script, None)],
            &mut Diagnostics::new(),
        );
        assert_eq!(placement.handles.len(), 1);
        let handle = &placement.handles[0];
        assert_eq!(handle.payload, EntityPayload::SpawnMarker);
        assert!(matches!(
            handle.visual,
            Visual::Marker {
                shape: MarkerShape::Capsule { .. },
                ..
            }
        ));
        assert_eq!(handle.transform.position, Vector3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn custom_tables_replace_defaults() {
        let config = no_assets();
        let models = ModelIndex::new();
        let brute = EnemyStats {
            health: 400.0,
            ..EnemyStats::default()
        };
        let mut placer = EntityPlacer::new(&config, &models).with_tables(
            EnemyStatTable::new([("Brute".to_string(), brute)]),
            PickupTable::new([("medkit".to_string(), PickupKind::Health, 50)]),
        );
        let placement = placer.place_all(
            &[
                entity("Brute_02", EntityCategory::Enemy, None),
                entity("Marine_01", EntityCategory::Enemy, None),
                entity("Medkit_Small", EntityCategory::Pickup, None),
                entity("PowHealth_01", EntityCategory::Pickup, None),
            ],
            &mut Diagnostics::new(),
        );
        let payloads: Vec<_> = placement.handles.iter().map(|h| &h.payload).collect();
        match payloads[0] {
            EntityPayload::Enemy(enemy) => {
                assert!(enemy.known_type);
                assert_eq!(enemy.stats.health, 400.0);
            }
            other => panic!("unexpected payload {other:?}"),
        }
        match payloads[1] {
            EntityPayload::Enemy(enemy) => assert!(!enemy.known_type),
            other => panic!("unexpected payload {other:?}"),
        }
        match payloads[2] {
            EntityPayload::Pickup(pickup) => {
                assert_eq!(pickup.key.as_deref(), Some("medkit"));
                assert_eq!(pickup.amount, 50);
            }
            other => panic!("unexpected payload {other:?}"),
        }
        match payloads[3] {
            EntityPayload::Pickup(pickup) => assert_eq!(pickup.kind, PickupKind::Generic),
            other => panic!("unexpected payload {other:?}"),
        }
    }

    #[test]
    fn visible_categories_fall_back_to_markers() {
        let config = no_assets();
        let models = ModelIndex::new();
        let mut placer = EntityPlacer::new(&config, &models);
        let mut diagnostics = Diagnostics::new();
        let placement = placer.place_all(
            &[
                entity("Marine_01", EntityCategory::Enemy, None),
                entity("Crate_Big", EntityCategory::Prop, None),
                entity("Elevator_A", EntityCategory::Door, None),
            ],
            &mut diagnostics,
        );
        assert_eq!(placement.handles.len(), 3);
        assert_eq!(placement.models_unresolved, 3);
        assert!(placement.handles.iter().all(|h| h.visual.is_marker()));
        assert_eq!(diagnostics.count(Fallback::UnresolvedReference), 3);

        match &placement.handles[2].payload {
            EntityPayload::Door(door) => {
                assert_eq!(door.subtype, DoorKind::Elevator);
                assert_eq!(door.prompt, DoorKind::Elevator.prompt());
            }
            other => panic!("unexpected payload {other:?}"),
        }
    }
}
