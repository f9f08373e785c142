//! The load summary reported after assembly.
//!
//! [`LoadSummary`] counts surfaces, skipped groups, collision faces, texture
//! misses and entities per category, and logs itself once the level is built.

use std::{collections::BTreeMap, fmt};

use crate::data_structures::entity::EntityCategory;

/// Counters reported after a level load.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub groups_total: usize,
    pub groups_skipped: usize,
    pub surfaces: usize,
    pub collision_faces: usize,
    pub unassigned_groups: usize,
    pub unresolved_textures: usize,
    pub textures_loaded: usize,
    pub models_indexed: usize,
    pub entities_by_category: BTreeMap<EntityCategory, usize>,
    pub entities_placed: usize,
    pub entities_suppressed: usize,
    pub models_resolved: usize,
    pub models_unresolved: usize,
}

impl LoadSummary {
    pub fn entity_count(&self, category: EntityCategory) -> usize {
        self.entities_by_category.get(&category).copied().unwrap_or(0)
    }

    pub fn log(&self) {
        log::info!("{self}");
        if self.unresolved_textures + self.unassigned_groups > 0 {
            log::warn!(
                "{} surfaces use the fallback color ({} unassigned, {} missing textures)",
                self.unresolved_textures + self.unassigned_groups,
                self.unassigned_groups,
                self.unresolved_textures
            );
        }
        if self.models_unresolved > 0 {
            log::warn!("{} entities use marker shapes", self.models_unresolved);
        }
    }
}

impl fmt::Display for LoadSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "surfaces: {} of {} groups ({} skipped), collision faces: {}",
            self.surfaces, self.groups_total, self.groups_skipped, self.collision_faces
        )?;
        writeln!(
            f,
            "textures loaded: {}, unassigned groups: {}, unresolved textures: {}",
            self.textures_loaded, self.unassigned_groups, self.unresolved_textures
        )?;
        write!(f, "entities:")?;
        for category in EntityCategory::ALL {
            write!(f, " {}={}", category, self.entity_count(category))?;
        }
        writeln!(f)?;
        write!(
            f,
            "placed: {}, suppressed: {}, models resolved: {}, unresolved: {} (indexed {})",
            self.entities_placed,
            self.entities_suppressed,
            self.models_resolved,
            self.models_unresolved,
            self.models_indexed
        )
    }
}
