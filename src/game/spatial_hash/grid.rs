use bevy::prelude::*;
use rustc_hash::FxHashMap;

use crate::game::error::SimError;
use crate::game::geometry::Aabb;
use crate::game::simulation::bodies::BodyLookup;
use super::{CellSpan, TileBucketIndex};

impl TileBucketIndex {
    pub(crate) fn cell_idx(&self, x: i32, y: i32) -> Option<usize> {
        self.is_valid(x, y).then(|| (y * self.width() + x) as usize)
    }

    /// Cells covered by `aabb`, clamped to the grid.
    pub fn span_for(&self, aabb: &Aabb) -> CellSpan {
        let (min, max) = aabb.cell_span(self.tile_shift());
        CellSpan {
            min: min.max(IVec2::ZERO),
            max: max.min(IVec2::new(self.width() - 1, self.height() - 1)),
        }
    }

    /// Add an object to a single cell. Returns false outside the grid.
    /// Adding an object that is already in the cell is a no-op.
    pub fn insert(&mut self, entity: Entity, x: i32, y: i32) -> bool {
        let Some(idx) = self.cell_idx(x, y) else {
            return false;
        };
        let bucket = &mut self.buckets_mut()[idx];
        if !bucket.contains(&entity) {
            bucket.push(entity);
        }
        true
    }

    /// Remove an object from a single cell. Returns false outside the grid;
    /// removing an object the cell does not hold is tolerated.
    pub fn remove(&mut self, entity: Entity, x: i32, y: i32) -> bool {
        let Some(idx) = self.cell_idx(x, y) else {
            return false;
        };
        let bucket = &mut self.buckets_mut()[idx];
        if let Some(pos) = bucket.iter().position(|&e| e == entity) {
            bucket.remove(pos);
        }
        true
    }

    /// Objects recorded in a cell, empty outside the grid.
    pub fn query(&self, x: i32, y: i32) -> &[Entity] {
        match self.cell_idx(x, y) {
            Some(idx) => &self.buckets()[idx],
            None => &[],
        }
    }

    /// Insert an object into all cells its box overlaps and remember the span.
    /// Returns the number of cells the object was inserted into.
    ///
    /// Placing an object that is already tracked moves it.
    pub fn place(&mut self, entity: Entity, aabb: &Aabb) -> usize {
        if self.is_tracked(entity) {
            warn!("[TILE_INDEX] {:?} placed twice, evicting previous entry", entity);
            self.evict(entity);
        }
        let span = self.span_for(aabb);
        for cell in span.cells() {
            self.insert(entity, cell.x, cell.y);
        }
        self.spans_mut().insert(entity, span);
        span.len()
    }

    /// Move an object from its recorded cells into the cells `aabb` covers.
    ///
    /// Returns `Ok(false)` when the span is unchanged. An object missing from
    /// one of its recorded cells means the index was corrupted and is reported
    /// as [`SimError::BucketDesync`].
    pub fn rebucket(&mut self, entity: Entity, aabb: &Aabb) -> Result<bool, SimError> {
        let old = self.span_of(entity).ok_or(SimError::Untracked { entity })?;
        let new = self.span_for(aabb);
        if old == new {
            return Ok(false);
        }

        for cell in old.cells() {
            let idx = self
                .cell_idx(cell.x, cell.y)
                .ok_or(SimError::BucketDesync { entity, cell })?;
            let bucket = &mut self.buckets_mut()[idx];
            let pos = bucket
                .iter()
                .position(|&e| e == entity)
                .ok_or(SimError::BucketDesync { entity, cell })?;
            bucket.remove(pos);
        }
        for cell in new.cells() {
            self.insert(entity, cell.x, cell.y);
        }
        self.spans_mut().insert(entity, new);
        Ok(true)
    }

    /// Check that `aabb`, the object's current box, still maps to the cells
    /// the object was last bucketed into.
    ///
    /// A mismatch means the position changed without going through the
    /// registry or the resolver. The error names a recorded cell the box no
    /// longer covers, or a covered cell the object is missing from.
    pub fn check_span(&self, entity: Entity, aabb: &Aabb) -> Result<(), SimError> {
        let recorded = self.span_of(entity).ok_or(SimError::Untracked { entity })?;
        let current = self.span_for(aabb);
        if recorded == current {
            return Ok(());
        }
        let cell = recorded
            .cells()
            .find(|&c| !current.contains(c))
            .or_else(|| current.cells().find(|&c| !recorded.contains(c)))
            .unwrap_or(recorded.min);
        Err(SimError::BucketDesync { entity, cell })
    }

    /// Drop an object from every cell it was placed into.
    /// Returns false when the object was not tracked.
    pub fn evict(&mut self, entity: Entity) -> bool {
        let Some(span) = self.spans_mut().remove(&entity) else {
            return false;
        };
        for cell in span.cells() {
            self.remove(entity, cell.x, cell.y);
        }
        true
    }

    /// Check that every live object is recorded in exactly the cells its
    /// current box covers, and that no bucket holds anything else.
    pub fn verify<B: BodyLookup>(&self, bodies: &B, live: &[Entity]) -> Result<(), SimError> {
        let mut expected: FxHashMap<Entity, CellSpan> = FxHashMap::default();
        for &entity in live {
            let Some(aabb) = bodies.bounding_box(entity) else {
                // Bodiless objects are reaped next tick; keep their cells
                if let Some(span) = self.span_of(entity) {
                    expected.insert(entity, span);
                }
                continue;
            };
            if !self.is_tracked(entity) {
                return Err(SimError::Untracked { entity });
            }
            let span = self.span_for(&aabb);
            for cell in span.cells() {
                if !self.query(cell.x, cell.y).contains(&entity) {
                    return Err(SimError::BucketDesync { entity, cell });
                }
            }
            expected.insert(entity, span);
        }

        for (idx, bucket) in self.buckets().iter().enumerate() {
            let cell = IVec2::new(idx as i32 % self.width(), idx as i32 / self.width());
            for &entity in bucket {
                if !expected.get(&entity).is_some_and(|span| span.contains(cell)) {
                    return Err(SimError::StaleCell { entity, cell });
                }
            }
        }
        Ok(())
    }
}
