use bevy::prelude::*;
use rustc_hash::FxHashSet;

use crate::game::geometry::Aabb;
use crate::game::level::{Level, MoverClass};
use crate::game::simulation::bodies::BodyLookup;
use super::{CellSpan, TileBucketIndex};

impl TileBucketIndex {
    /// Cells covered by `aabb` plus one cell of margin on every side, clamped
    /// to the grid.
    fn search_span(&self, aabb: &Aabb) -> CellSpan {
        let (min, max) = aabb.cell_span(self.tile_shift());
        CellSpan {
            min: (min - IVec2::ONE).max(IVec2::ZERO),
            max: (max + IVec2::ONE).min(IVec2::new(self.width() - 1, self.height() - 1)),
        }
    }

    /// All objects whose current box intersects `aabb`.
    ///
    /// Each object appears once, in the order it is first met walking the
    /// search cells row by row.
    pub fn entities_overlapping<B: BodyLookup>(&self, bodies: &B, aabb: &Aabb) -> Vec<Entity> {
        let mut seen = FxHashSet::default();
        let mut out = Vec::new();

        for cell in self.search_span(aabb).cells() {
            for &entity in self.query(cell.x, cell.y) {
                if !seen.insert(entity) {
                    continue;
                }
                if bodies.bounding_box(entity).is_some_and(|b| b.intersects(aabb)) {
                    out.push(entity);
                }
            }
        }
        out
    }

    /// Candidate colliders for `mover` probing `probe`.
    ///
    /// Per search cell, every other object accepted by `consider` whose box
    /// intersects the probe (each object once), followed by the cell's tile
    /// box for `class` when it intersects the probe.
    pub fn colliders_for_object<B, F>(
        &self,
        level: &Level,
        bodies: &B,
        mover: Entity,
        class: MoverClass,
        probe: &Aabb,
        consider: F,
    ) -> Vec<Aabb>
    where
        B: BodyLookup,
        F: Fn(Entity) -> bool,
    {
        let mut seen = FxHashSet::default();
        let mut out = Vec::new();

        for cell in self.search_span(probe).cells() {
            for &entity in self.query(cell.x, cell.y) {
                if entity == mover || !seen.insert(entity) || !consider(entity) {
                    continue;
                }
                if let Some(b) = bodies.bounding_box(entity).filter(|b| b.intersects(probe)) {
                    out.push(b);
                }
            }
            if let Some(tile_box) = level.box_for(cell, class).filter(|b| b.intersects(probe)) {
                out.push(tile_box);
            }
        }
        out
    }

    /// Objects recorded in one cell, empty outside the grid.
    pub fn entities_in_cell(&self, x: i32, y: i32) -> Vec<Entity> {
        self.query(x, y).to_vec()
    }
}
