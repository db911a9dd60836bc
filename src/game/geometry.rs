use bevy::prelude::*;

use crate::game::direction::Direction;

/// What produced a bounding box.
///
/// Boxes are compared by owner, never by coordinates: two boxes with the same
/// edges but different owners are different colliders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoxOwner {
    /// A movable object registered with the level.
    Object(Entity),
    /// A static tile, addressed by its grid cell.
    Tile(IVec2),
}

impl BoxOwner {
    pub fn entity(self) -> Option<Entity> {
        match self {
            BoxOwner::Object(entity) => Some(entity),
            BoxOwner::Tile(_) => None,
        }
    }

    pub fn cell(self) -> Option<IVec2> {
        match self {
            BoxOwner::Object(_) => None,
            BoxOwner::Tile(cell) => Some(cell),
        }
    }
}

/// Axis-aligned bounding box in level pixel space.
///
/// All four edges are inclusive, so two boxes that only share an edge
/// intersect. A box with `left == right` or `top == bottom` is degenerate but
/// legal.
///
/// Boxes are values: every operation returns a new box and keeps the owner.
#[derive(Debug, Clone, Copy)]
pub struct Aabb {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
    pub owner: Option<BoxOwner>,
}

impl Aabb {
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        debug_assert!(left <= right && top <= bottom, "inverted box ({left}, {top}, {right}, {bottom})");
        Self { left, top, right, bottom, owner: None }
    }

    pub fn owned_by(mut self, owner: BoxOwner) -> Self {
        self.owner = Some(owner);
        self
    }

    /// Box covering a whole tile cell. The right and bottom edges stop one
    /// pixel short of the neighbouring cell so adjacent tiles never intersect.
    pub fn from_tile(cell: IVec2, tile_size: i32) -> Self {
        Self::new(
            cell.x * tile_size,
            cell.y * tile_size,
            (cell.x + 1) * tile_size - 1,
            (cell.y + 1) * tile_size - 1,
        )
        .owned_by(BoxOwner::Tile(cell))
    }

    pub fn intersects(&self, other: &Aabb) -> bool {
        !(self.right < other.left
            || self.bottom < other.top
            || self.left > other.right
            || self.top > other.bottom)
    }

    pub fn translate(&self, dx: i32, dy: i32) -> Aabb {
        Aabb {
            left: self.left + dx,
            top: self.top + dy,
            right: self.right + dx,
            bottom: self.bottom + dy,
            owner: self.owner,
        }
    }

    pub fn same_owner(&self, other: &Aabb) -> bool {
        self.owner.is_some() && self.owner == other.owner
    }

    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    pub fn center(&self) -> IVec2 {
        IVec2::new((self.left + self.right) / 2, (self.top + self.bottom) / 2)
    }

    /// Inclusive range of tile cells covered by this box, as `(min, max)`.
    ///
    /// Uses an arithmetic shift so negative coordinates land in negative
    /// cells instead of rounding towards zero.
    pub fn cell_span(&self, tile_shift: u32) -> (IVec2, IVec2) {
        (
            IVec2::new(self.left >> tile_shift, self.top >> tile_shift),
            IVec2::new(self.right >> tile_shift, self.bottom >> tile_shift),
        )
    }

    /// Strip of width `reach` directly in front of this box, widened by `side`
    /// pixels on both flanks. Used for interaction probes.
    pub fn expand_toward(&self, direction: Direction, reach: i32, side: i32) -> Aabb {
        let probe = match direction {
            Direction::Up => Aabb::new(self.left - side, self.top - reach, self.right + side, self.top),
            Direction::Down => Aabb::new(self.left - side, self.bottom, self.right + side, self.bottom + reach),
            Direction::Left => Aabb::new(self.left - reach, self.top - side, self.left, self.bottom + side),
            Direction::Right => Aabb::new(self.right, self.top - side, self.right + reach, self.bottom + side),
            Direction::None => Aabb::new(self.left, self.top, self.right, self.bottom),
        };
        Aabb { owner: self.owner, ..probe }
    }
}

impl std::fmt::Display for Aabb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Aabb{{{:?}}} (left: {} top: {} right: {} bottom: {})",
            self.owner, self.left, self.top, self.right, self.bottom
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_edge_counts_as_intersection() {
        let a = Aabb::new(0, 0, 10, 10);
        let b = Aabb::new(10, 0, 20, 10);
        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
    }

    #[test]
    fn test_separated_boxes_do_not_intersect() {
        let a = Aabb::new(0, 0, 10, 10);
        assert!(!a.intersects(&Aabb::new(11, 0, 20, 10)), "right of");
        assert!(!a.intersects(&Aabb::new(-20, 0, -1, 10)), "left of");
        assert!(!a.intersects(&Aabb::new(0, 11, 10, 20)), "below");
        assert!(!a.intersects(&Aabb::new(0, -20, 10, -1)), "above");
    }

    #[test]
    fn test_degenerate_box_intersects_when_on_edge() {
        let point = Aabb::new(5, 5, 5, 5);
        assert!(Aabb::new(0, 0, 5, 5).intersects(&point));
        assert!(!Aabb::new(0, 0, 4, 4).intersects(&point));
    }

    #[test]
    fn test_translate_keeps_owner_and_size() {
        let owner = BoxOwner::Tile(IVec2::new(3, 4));
        let b = Aabb::new(0, 0, 7, 9).owned_by(owner);
        let moved = b.translate(-3, 5);

        assert_eq!((moved.left, moved.top, moved.right, moved.bottom), (-3, 5, 4, 14));
        assert_eq!(moved.width(), b.width());
        assert_eq!(moved.height(), b.height());
        assert!(moved.same_owner(&b));
    }

    #[test]
    fn test_same_owner_ignores_coordinates() {
        let a = Aabb::new(0, 0, 1, 1).owned_by(BoxOwner::Tile(IVec2::new(0, 0)));
        let b = Aabb::new(0, 0, 1, 1).owned_by(BoxOwner::Tile(IVec2::new(1, 0)));
        let unowned = Aabb::new(0, 0, 1, 1);

        assert!(!a.same_owner(&b));
        assert!(!unowned.same_owner(&Aabb::new(0, 0, 1, 1)));
    }

    #[test]
    fn test_adjacent_tiles_do_not_touch() {
        let a = Aabb::from_tile(IVec2::new(0, 0), 64);
        let b = Aabb::from_tile(IVec2::new(1, 0), 64);
        assert_eq!(a.right, 63);
        assert_eq!(b.left, 64);
        assert!(!a.intersects(&b));
    }

    #[test]
    fn test_cell_span_floors_negative_coordinates() {
        let b = Aabb::new(-1, 0, 64, 127);
        let (min, max) = b.cell_span(6);
        assert_eq!(min, IVec2::new(-1, 0));
        assert_eq!(max, IVec2::new(1, 1));
    }

    #[test]
    fn test_expand_toward_builds_strip_in_front() {
        let b = Aabb::new(10, 10, 20, 20);
        let up = b.expand_toward(Direction::Up, 5, 2);
        assert_eq!((up.left, up.top, up.right, up.bottom), (8, 5, 22, 10));

        let right = b.expand_toward(Direction::Right, 5, 0);
        assert_eq!((right.left, right.top, right.right, right.bottom), (20, 10, 25, 20));
    }
}
