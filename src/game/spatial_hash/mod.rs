use bevy::prelude::*;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

mod grid;
mod query;

/// Bucket storage for one tile cell. Most cells hold a handful of objects.
pub type Bucket = SmallVec<[Entity; 4]>;

/// Per-tile buckets of movable objects for fast proximity queries.
///
/// The index mirrors the level grid: one bucket per tile cell. An object is
/// recorded in every cell its bounding box overlaps, so a query only has to
/// look at the cells around the rectangle it cares about.
///
/// The index owns membership. For each tracked object it remembers the cell
/// span it was last placed into; re-bucketing removes the object from exactly
/// those cells and inserts it into the new span.
///
/// # Example
///
/// ```rust
/// use bevy::prelude::{Entity, IVec2};
/// use lynk::game::geometry::Aabb;
/// use lynk::game::spatial_hash::TileBucketIndex;
///
/// let mut index = TileBucketIndex::new(8, 8, 6);
/// let entity = Entity::from_bits(1);
///
/// // A 64x64 box at (32, 0) straddles cells (0, 0) and (1, 0)
/// index.place(entity, &Aabb::new(32, 0, 95, 63));
/// assert_eq!(index.query(0, 0), &[entity]);
/// assert_eq!(index.query(1, 0), &[entity]);
/// assert!(index.query(2, 0).is_empty());
/// ```
///
/// # Performance
///
/// - **Insert / remove (single cell):** O(bucket size)
/// - **Rebucket:** O(cells in old span + cells in new span), skipped entirely
///   when the span did not change
/// - **Range query:** O(cells in range + candidates)
#[derive(Resource, Debug, Default)]
pub struct TileBucketIndex {
    width: i32,
    height: i32,
    tile_shift: u32,
    buckets: Vec<Bucket>,
    spans: FxHashMap<Entity, CellSpan>,
}

/// Inclusive rectangle of tile cells. Empty when `min` exceeds `max` on
/// either axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellSpan {
    pub min: IVec2,
    pub max: IVec2,
}

impl CellSpan {
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y
    }

    pub fn contains(&self, cell: IVec2) -> bool {
        cell.x >= self.min.x && cell.x <= self.max.x && cell.y >= self.min.y && cell.y <= self.max.y
    }

    /// Cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = IVec2> {
        let (min, max) = (self.min, self.max);
        (min.y..=max.y).flat_map(move |y| (min.x..=max.x).map(move |x| IVec2::new(x, y)))
    }

    pub fn len(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            ((self.max.x - self.min.x + 1) * (self.max.y - self.min.y + 1)) as usize
        }
    }
}

impl TileBucketIndex {
    pub fn new(width: i32, height: i32, tile_shift: u32) -> Self {
        let mut index = Self::default();
        index.resize(width, height, tile_shift);
        index
    }

    /// Rebuild an empty grid. Every tracked object is forgotten and has to be
    /// placed again.
    pub fn resize(&mut self, width: i32, height: i32, tile_shift: u32) {
        let width = width.max(0);
        let height = height.max(0);
        self.width = width;
        self.height = height;
        self.tile_shift = tile_shift;
        self.buckets = vec![Bucket::new(); (width * height) as usize];
        self.spans.clear();
        info!("[TILE_INDEX] Resized to {}x{} cells (tile size {})", width, height, 1 << tile_shift);
    }

    pub fn clear(&mut self) {
        for bucket in &mut self.buckets {
            bucket.clear();
        }
        self.spans.clear();
    }

    /// Count the total number of entity entries across all cells.
    /// Useful for debugging and diagnostics.
    pub fn total_entries(&self) -> usize {
        self.buckets.iter().map(|bucket| bucket.len()).sum()
    }

    /// Count the number of non-empty cells.
    /// Useful for debugging and diagnostics.
    pub fn non_empty_cells(&self) -> usize {
        self.buckets.iter().filter(|bucket| !bucket.is_empty()).count()
    }

    /// Number of objects placed through `place`.
    pub fn tracked_objects(&self) -> usize {
        self.spans.len()
    }

    pub fn is_tracked(&self, entity: Entity) -> bool {
        self.spans.contains_key(&entity)
    }

    /// Cells the object was last placed into.
    pub fn span_of(&self, entity: Entity) -> Option<CellSpan> {
        self.spans.get(&entity).copied()
    }

    // Getters for grid parameters
    pub fn width(&self) -> i32 { self.width }
    pub fn height(&self) -> i32 { self.height }
    pub fn tile_shift(&self) -> u32 { self.tile_shift }

    pub fn is_valid(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.width && y < self.height
    }

    // Internal accessors for submodules
    pub(crate) fn buckets(&self) -> &[Bucket] {
        &self.buckets
    }

    pub(crate) fn buckets_mut(&mut self) -> &mut [Bucket] {
        &mut self.buckets
    }

    pub(crate) fn spans(&self) -> &FxHashMap<Entity, CellSpan> {
        &self.spans
    }

    pub(crate) fn spans_mut(&mut self) -> &mut FxHashMap<Entity, CellSpan> {
        &mut self.spans
    }
}
