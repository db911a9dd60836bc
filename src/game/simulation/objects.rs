/// Object registry and gameplay-facing movement API.
///
/// [`LevelObjects`] bundles the level, the tile index, the body query and the
/// contact buffer so that gameplay systems can add, move and query objects
/// with a single system parameter.

use bevy::ecs::system::SystemParam;
use bevy::prelude::*;

use crate::game::error::SimError;
use crate::game::geometry::Aabb;
use crate::game::level::Level;
use crate::game::simulation::bodies::{BodyData, BodyLookup, BodyStore, BodyView};
use crate::game::simulation::components::{Dead, Facing};
use crate::game::simulation::movement::MoveContext;
use crate::game::simulation::resources::{LiveObjects, SimConfig, SimStats, TickContacts};
use crate::game::spatial_hash::TileBucketIndex;

#[derive(SystemParam)]
pub struct LevelObjects<'w, 's> {
    level: Res<'w, Level>,
    index: ResMut<'w, TileBucketIndex>,
    config: Res<'w, SimConfig>,
    contacts: ResMut<'w, TickContacts>,
    live: ResMut<'w, LiveObjects>,
    stats: ResMut<'w, SimStats>,
    bodies: Query<'w, 's, BodyData>,
    facing: Query<'w, 's, &'static Facing>,
    commands: Commands<'w, 's>,
}

impl<'w, 's> LevelObjects<'w, 's> {
    // ========================================================================
    // Registry
    // ========================================================================

    /// Register `entity` at pixel `(x, y)` and place it in the tile index.
    ///
    /// Returns false when the object has no body, is already registered, or
    /// starts outside the level. In the last case it is marked [`Dead`].
    pub fn add_object(&mut self, entity: Entity, x: i32, y: i32) -> bool {
        self.sync_index();
        if self.live.contains(entity) {
            warn!("[LEVEL] {:?} is already registered", entity);
            return false;
        }
        let cell = self.level.cell_of(IVec2::new(x, y));
        if !self.level.is_valid(cell.x, cell.y) {
            warn!("[LEVEL] {:?} added outside the level at ({}, {}), marking dead", entity, x, y);
            self.commands.entity(entity).insert(Dead);
            return false;
        }
        if !self.bodies.set_position(entity, IVec2::new(x, y)) {
            warn!("[LEVEL] {:?} has no collision body, not added", entity);
            return false;
        }

        let Some(aabb) = self.bodies.bounding_box(entity) else {
            return false;
        };
        let cells = self.index.place(entity, &aabb);
        self.live.0.push(entity);
        self.stats.objects_added += 1;
        debug!("[LEVEL] Added {:?} at ({}, {}) covering {} cells", entity, x, y, cells);
        true
    }

    /// Drop `entity` from the live list and the tile index.
    pub fn remove_object(&mut self, entity: Entity) -> bool {
        let Some(pos) = self.live.0.iter().position(|&e| e == entity) else {
            return false;
        };
        self.live.0.remove(pos);
        if !self.index.evict(entity) {
            warn!("[LEVEL] {:?} was live but not in the tile index", entity);
        }
        self.stats.objects_removed += 1;
        debug!("[LEVEL] Removed {:?}", entity);
        true
    }

    /// Teleport a registered object. Returns `Ok(false)` for unknown objects
    /// and destinations outside the level.
    pub fn set_position(&mut self, entity: Entity, x: i32, y: i32) -> Result<bool, SimError> {
        if !self.live.contains(entity) {
            return Ok(false);
        }
        self.sync_index();
        let cell = self.level.cell_of(IVec2::new(x, y));
        if !self.level.is_valid(cell.x, cell.y) || !self.bodies.set_position(entity, IVec2::new(x, y)) {
            return Ok(false);
        }
        if let Some(aabb) = self.bodies.bounding_box(entity) {
            self.index.rebucket(entity, &aabb)?;
        }
        Ok(true)
    }

    /// Remove every registered object that is dead or has lost its body.
    /// Returns how many were removed.
    pub fn reap_dead(&mut self) -> usize {
        let doomed: Vec<Entity> = self
            .live
            .iter()
            .copied()
            .filter(|&e| self.bodies.body(e).is_none_or(|view| view.dead))
            .collect();
        for &entity in &doomed {
            self.remove_object(entity);
        }
        doomed.len()
    }

    /// Rebuild the tile index for a new or edited level and place every live
    /// object again. Objects now outside the level are marked dead.
    pub fn rebuild_index(&mut self) {
        let (width, height, shift) = (self.level.width(), self.level.height(), self.level.tile_shift());
        self.index.resize(width, height, shift);

        for entity in self.live.0.clone() {
            let Some(view) = self.bodies.body(entity) else {
                continue;
            };
            let cell = self.level.cell_of(view.position);
            if !self.level.is_valid(cell.x, cell.y) {
                warn!("[LEVEL] {:?} is outside the resized level, marking dead", entity);
                self.commands.entity(entity).insert(Dead);
            }
            self.index.place(entity, &view.bounding_box(entity));
        }
        info!(
            "[LEVEL] Tile index rebuilt for {}x{} level, {} objects placed",
            width,
            height,
            self.index.tracked_objects()
        );
    }

    /// Rebuild the tile index when the level's dimensions no longer match it.
    /// Returns true when a rebuild happened.
    pub fn sync_index(&mut self) -> bool {
        let level = &self.level;
        let index = &self.index;
        if index.width() == level.width()
            && index.height() == level.height()
            && index.tile_shift() == level.tile_shift()
        {
            return false;
        }
        self.rebuild_index();
        true
    }

    // ========================================================================
    // Movement
    // ========================================================================

    /// Move `entity` by up to `(dx, dy)` pixels, stopping at solid obstacles.
    /// See [`MoveContext::move_by`].
    pub fn move_by(&mut self, entity: Entity, dx: i32, dy: i32) -> Result<bool, SimError> {
        self.stats.moves_requested += 1;
        self.sync_index();
        let moved = MoveContext {
            level: &self.level,
            index: &mut self.index,
            bodies: &mut self.bodies,
            contacts: &mut *self.contacts,
            double_step_threshold: self.config.double_step_threshold,
        }
        .move_by(entity, dx, dy)?;
        if moved {
            self.stats.moves_committed += 1;
        }
        Ok(moved)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn body(&self, entity: Entity) -> Option<BodyView> {
        self.bodies.body(entity)
    }

    pub fn position(&self, entity: Entity) -> Option<IVec2> {
        self.body(entity).map(|view| view.position)
    }

    pub fn bounding_box(&self, entity: Entity) -> Option<Aabb> {
        self.bodies.bounding_box(entity)
    }

    /// Whether `this` blocks `other` when `other` moves into it.
    pub fn is_solid_to(&self, this: Entity, other: Entity) -> bool {
        match (self.body(this), self.body(other)) {
            (Some(a), Some(b)) => a.body.is_solid_to(&b.body),
            _ => false,
        }
    }

    pub fn entities_overlapping(&self, aabb: &Aabb) -> Vec<Entity> {
        self.index.entities_overlapping(&self.bodies, aabb)
    }

    pub fn entities_in_cell(&self, x: i32, y: i32) -> Vec<Entity> {
        self.index.entities_in_cell(x, y)
    }

    /// Objects within `reach` pixels in front of `entity`, excluding itself.
    pub fn interact_targets(&self, entity: Entity, reach: i32) -> Vec<Entity> {
        let (Some(aabb), Ok(facing)) = (self.bounding_box(entity), self.facing.get(entity)) else {
            return Vec::new();
        };
        let probe = aabb.expand_toward(facing.0, reach, self.config.interact_side_margin);
        self.entities_overlapping(&probe)
            .into_iter()
            .filter(|&e| e != entity)
            .collect()
    }

    /// Check that every live object is bucketed exactly where its box is.
    pub fn verify(&self) -> Result<(), SimError> {
        self.index.verify(&self.bodies, &self.live.0)
    }

    pub fn is_live(&self, entity: Entity) -> bool {
        self.live.contains(entity)
    }

    pub fn live_objects(&self) -> &[Entity] {
        &self.live.0
    }

    pub fn level(&self) -> &Level {
        &self.level
    }

    pub fn index(&self) -> &TileBucketIndex {
        &self.index
    }

    pub fn stats(&self) -> &SimStats {
        &self.stats
    }
}
