/// Movement resolution.
///
/// A requested displacement is clamped to the level, split into small
/// axis-aligned steps and resolved one step at a time against the tile index:
///
/// 1. Clamp each axis so the position stays inside the level's pixel rectangle.
/// 2. Plan the steps. Long requests use 2-pixel steps plus a 1-pixel
///    remainder; short ones use 1-pixel steps.
/// 3. Resolve all X steps, then all Y steps. For every step the translated box
///    is probed: every collider is touched, and any solid collider rejects the
///    step and ends that axis.
/// 4. After a committed move, re-bucket the object and report the tile it
///    landed on.
///
/// A step moves along one axis only and by at most two pixels. Boxes one
/// pixel thin always use 1-pixel steps, so consecutive probes leave no gap.

use bevy::prelude::*;

use crate::game::error::SimError;
use crate::game::geometry::{Aabb, BoxOwner};
use crate::game::level::{Level, MoverClass};
use crate::game::simulation::bodies::{BodyStore, BodyView};
use crate::game::simulation::events::Contact;
use crate::game::spatial_hash::TileBucketIndex;

// ============================================================================
// Contact Listener
// ============================================================================

/// Receives contact notifications while a move is resolved.
pub trait ContactListener {
    fn notify(&mut self, contact: Contact);
}

impl ContactListener for Vec<Contact> {
    fn notify(&mut self, contact: Contact) {
        self.push(contact);
    }
}

// ============================================================================
// Step Planning
// ============================================================================

/// Steps along one axis: `count` steps of `step` pixels, then an optional
/// 1-pixel `remainder` step. All values carry the sign of the motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AxisPlan {
    pub step: i32,
    pub count: i32,
    pub remainder: i32,
}

impl AxisPlan {
    fn new(delta: i32, doubled: bool) -> Self {
        let sign = delta.signum();
        let magnitude = delta.abs();
        if doubled {
            Self {
                step: 2 * sign,
                count: magnitude / 2,
                remainder: (magnitude % 2) * sign,
            }
        } else {
            Self { step: sign, count: magnitude, remainder: 0 }
        }
    }

    pub fn steps(&self) -> impl Iterator<Item = i32> {
        let remainder = (self.remainder != 0).then_some(self.remainder);
        std::iter::repeat(self.step)
            .take(self.count.max(0) as usize)
            .chain(remainder)
    }

    pub fn total(&self) -> i32 {
        self.step * self.count + self.remainder
    }
}

/// Step sequence for one `move_by` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StepPlan {
    pub x: AxisPlan,
    pub y: AxisPlan,
}

impl StepPlan {
    /// Both axes switch to 2-pixel steps when either magnitude exceeds
    /// `double_step_threshold`.
    pub fn new(dx: i32, dy: i32, double_step_threshold: i32) -> Self {
        let doubled = dx.abs() > double_step_threshold || dy.abs() > double_step_threshold;
        Self {
            x: AxisPlan::new(dx, doubled),
            y: AxisPlan::new(dy, doubled),
        }
    }

    pub fn step_count(&self) -> usize {
        self.x.steps().count() + self.y.steps().count()
    }
}

/// Shrink `delta` so that `position + delta` stays within `[0, limit)` on each
/// axis. Motion away from an edge is never altered.
pub fn clamp_to_border(position: IVec2, delta: IVec2, limit: IVec2) -> IVec2 {
    let axis = |pos: i32, d: i32, limit: i32| {
        if d > 0 {
            d.min((limit - 1 - pos).max(0))
        } else {
            d.max((-pos).min(0))
        }
    };
    IVec2::new(axis(position.x, delta.x, limit.x), axis(position.y, delta.y, limit.y))
}

// ============================================================================
// Resolver
// ============================================================================

/// Everything a move needs, borrowed for the duration of one request.
pub struct MoveContext<'a, B: BodyStore, L: ContactListener> {
    pub level: &'a Level,
    pub index: &'a mut TileBucketIndex,
    pub bodies: &'a mut B,
    pub contacts: &'a mut L,
    pub double_step_threshold: i32,
}

impl<'a, B: BodyStore, L: ContactListener> MoveContext<'a, B, L> {
    /// Move `entity` by up to `(dx, dy)` pixels.
    ///
    /// Returns `Ok(true)` when the object moved at all. Zero-length requests,
    /// dead objects and objects that were never added to the level do
    /// nothing. A corrupted index, or a position written behind the index's
    /// back, aborts with [`SimError::BucketDesync`].
    pub fn move_by(&mut self, entity: Entity, dx: i32, dy: i32) -> Result<bool, SimError> {
        if dx == 0 && dy == 0 {
            return Ok(false);
        }
        let Some(view) = self.bodies.body(entity) else {
            return Ok(false);
        };
        if view.dead || !self.index.is_tracked(entity) {
            return Ok(false);
        }
        let own = view.bounding_box(entity);
        self.index.check_span(entity, &own)?;

        let limit = IVec2::new(self.level.pixel_width(), self.level.pixel_height());
        let delta = clamp_to_border(view.position, IVec2::new(dx, dy), limit);
        if delta == IVec2::ZERO {
            return Ok(false);
        }

        // One-pixel boxes would skip a column with 2-pixel steps
        let threshold = if own.width() == 0 || own.height() == 0 {
            i32::MAX
        } else {
            self.double_step_threshold
        };
        let plan = StepPlan::new(delta.x, delta.y, threshold);
        let mut position = view.position;

        for step in plan.x.steps() {
            if !self.try_step(entity, &view, &mut position, IVec2::new(step, 0)) {
                break;
            }
        }
        for step in plan.y.steps() {
            if !self.try_step(entity, &view, &mut position, IVec2::new(0, step)) {
                break;
            }
        }

        if position == view.position {
            return Ok(false);
        }
        self.bodies.set_position(entity, position);
        self.index.rebucket(entity, &view.hit_box.bounding_box(position, entity))?;

        let landed = self.level.cell_of(view.hit_box.sprite_center(position));
        if let Some(tile) = self.level.tile_at(landed.x, landed.y) {
            self.contacts.notify(Contact::TileLanded { mover: entity, cell: landed, tile });
        }
        Ok(true)
    }

    /// Probe one step. Commits it into `position` and returns true unless a
    /// solid collider is in the way.
    fn try_step(&mut self, entity: Entity, view: &BodyView, position: &mut IVec2, step: IVec2) -> bool {
        let class = view.body.mover_class();
        let probe = view.hit_box.bounding_box(*position + step, entity);
        let bodies = &*self.bodies;
        let colliders = self.index.colliders_for_object(
            self.level,
            bodies,
            entity,
            class,
            &probe,
            |other| bodies.body(other).is_some_and(|o| !o.dead),
        );

        for collider in &colliders {
            self.touch(entity, collider);
        }

        let mut blocked = false;
        for collider in &colliders {
            let Some(obstacle) = collider.owner else {
                continue;
            };
            if self.blocks(obstacle, view, class) {
                blocked = true;
                self.contacts.notify(Contact::Blocked { mover: entity, obstacle });
                self.contacts.notify(Contact::Obstructed { obstacle, by: entity });
            }
        }

        if !blocked {
            *position += step;
        }
        !blocked
    }

    fn touch(&mut self, entity: Entity, collider: &Aabb) {
        match collider.owner {
            Some(BoxOwner::Object(other)) => {
                self.contacts.notify(Contact::Touched { mover: entity, other });
                self.contacts.notify(Contact::TouchedBy { target: other, by: entity });
            }
            Some(BoxOwner::Tile(cell)) => {
                if let Some(tile) = self.level.tile_at(cell.x, cell.y) {
                    self.contacts.notify(Contact::TileStepped { mover: entity, cell, tile });
                }
            }
            None => {}
        }
    }

    fn blocks(&self, obstacle: BoxOwner, mover: &BodyView, class: MoverClass) -> bool {
        match obstacle {
            BoxOwner::Object(other) => self
                .bodies
                .body(other)
                .is_some_and(|o| o.body.is_solid_to(&mover.body)),
            BoxOwner::Tile(cell) => self
                .level
                .tile_at(cell.x, cell.y)
                .is_some_and(|tile| tile.is_solid_to(class)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::level::TileKind;
    use crate::game::simulation::components::{layers, Body, HitBox};
    use rustc_hash::FxHashMap;

    struct Fixture {
        level: Level,
        index: TileBucketIndex,
        bodies: FxHashMap<Entity, BodyView>,
        contacts: Vec<Contact>,
    }

    impl Fixture {
        fn new(rows: &[&str]) -> Self {
            let level = Level::from_rows(rows, 6).unwrap();
            let index = TileBucketIndex::new(level.width(), level.height(), level.tile_shift());
            Self { level, index, bodies: FxHashMap::default(), contacts: Vec::new() }
        }

        fn add(&mut self, bits: u64, x: i32, y: i32, size: i32, body: Body) -> Entity {
            let entity = Entity::from_bits(bits);
            let view = BodyView::new(IVec2::new(x, y), HitBox::full(IVec2::splat(size)), body);
            self.index.place(entity, &view.bounding_box(entity));
            self.bodies.insert(entity, view);
            entity
        }

        fn move_by(&mut self, entity: Entity, dx: i32, dy: i32) -> Result<bool, SimError> {
            MoveContext {
                level: &self.level,
                index: &mut self.index,
                bodies: &mut self.bodies,
                contacts: &mut self.contacts,
                double_step_threshold: 2,
            }
            .move_by(entity, dx, dy)
        }

        fn position(&self, entity: Entity) -> IVec2 {
            self.bodies[&entity].position
        }

        fn count(&self, pred: impl Fn(&Contact) -> bool) -> usize {
            self.contacts.iter().filter(|c| pred(c)).count()
        }
    }

    const OPEN: [&str; 4] = ["........", "........", "........", "........"];

    #[test]
    fn test_plan_uses_single_steps_for_short_moves() {
        let plan = StepPlan::new(2, -1, 2);
        assert_eq!(plan.x.steps().collect::<Vec<_>>(), vec![1, 1]);
        assert_eq!(plan.y.steps().collect::<Vec<_>>(), vec![-1]);
    }

    #[test]
    fn test_plan_doubles_both_axes_with_remainder() {
        let plan = StepPlan::new(7, -3, 2);
        assert_eq!(plan.x.steps().collect::<Vec<_>>(), vec![2, 2, 2, 1]);
        assert_eq!(plan.y.steps().collect::<Vec<_>>(), vec![-2, -1]);
        assert_eq!(plan.x.total(), 7);
        assert_eq!(plan.y.total(), -3);
        assert_eq!(plan.step_count(), 6);
    }

    #[test]
    fn test_clamp_saturates_at_edges() {
        let limit = IVec2::new(512, 256);
        assert_eq!(clamp_to_border(IVec2::new(500, 0), IVec2::new(20, -5), limit), IVec2::new(11, 0));
        assert_eq!(clamp_to_border(IVec2::new(511, 255), IVec2::new(3, 3), limit), IVec2::ZERO);
        assert_eq!(clamp_to_border(IVec2::new(5, 5), IVec2::new(-10, 10), limit), IVec2::new(-5, 10));
    }

    #[test]
    fn test_zero_motion_is_noop() {
        let mut world = Fixture::new(&OPEN);
        let mover = world.add(1, 10, 10, 16, Body::default());

        assert_eq!(world.move_by(mover, 0, 0), Ok(false));
        assert_eq!(world.position(mover), IVec2::new(10, 10));
        assert!(world.contacts.is_empty());
    }

    #[test]
    fn test_open_move_reaches_destination() {
        let mut world = Fixture::new(&OPEN);
        let mover = world.add(1, 0, 0, 64, Body::default());

        assert_eq!(world.move_by(mover, 130, 0), Ok(true));
        assert_eq!(world.position(mover), IVec2::new(130, 0));
        assert_eq!(world.index.span_of(mover).map(|s| (s.min, s.max)), Some((IVec2::new(2, 0), IVec2::new(3, 0))));
    }

    #[test]
    fn test_solid_column_stops_at_boundary() {
        let mut world = Fixture::new(&["..#.....", "..#.....", "..#.....", "..#....."]);
        let mover = world.add(1, 0, 0, 64, Body::default());

        assert_eq!(world.move_by(mover, 130, 0), Ok(true));
        assert_eq!(world.position(mover), IVec2::new(64, 0));
        assert_eq!(world.count(|c| matches!(c, Contact::Blocked { .. })), 1);
        assert_eq!(world.count(|c| matches!(c, Contact::Obstructed { .. })), 1);
        assert!(world.contacts.contains(&Contact::Blocked {
            mover,
            obstacle: BoxOwner::Tile(IVec2::new(2, 0)),
        }));
    }

    #[test]
    fn test_blocked_first_step_returns_false() {
        let mut world = Fixture::new(&[".#......", "........", "........", "........"]);
        let mover = world.add(1, 0, 0, 64, Body::default());

        assert_eq!(world.move_by(mover, 10, 0), Ok(false));
        assert_eq!(world.position(mover), IVec2::ZERO);
    }

    #[test]
    fn test_diagonal_move_slides_along_wall() {
        let mut world = Fixture::new(&["..#.....", "..#.....", "..#.....", "..#....."]);
        let mover = world.add(1, 40, 0, 32, Body::default());

        assert_eq!(world.move_by(mover, 100, 50), Ok(true));
        // x stops against the wall at 128, y is unaffected
        assert_eq!(world.position(mover), IVec2::new(96, 50));
    }

    #[test]
    fn test_border_clamp_stops_at_edge() {
        let mut world = Fixture::new(&OPEN);
        let mover = world.add(1, 400, 100, 16, Body::default());

        assert_eq!(world.move_by(mover, 500, 0), Ok(true));
        assert_eq!(world.position(mover), IVec2::new(511, 100));
        assert_eq!(world.move_by(mover, 5, 0), Ok(false), "Already at the edge");
    }

    #[test]
    fn test_objects_block_by_solidity() {
        let mut world = Fixture::new(&OPEN);
        let mover = world.add(1, 0, 0, 16, Body::default());
        let wall = world.add(2, 40, 0, 16, Body::new(layers::CREATURE, layers::ALL));

        assert_eq!(world.move_by(mover, 50, 0), Ok(true));
        assert_eq!(world.position(mover), IVec2::new(24, 0));
        assert!(world.contacts.contains(&Contact::Touched { mover, other: wall }));
        assert!(world.contacts.contains(&Contact::TouchedBy { target: wall, by: mover }));
        assert!(world.contacts.contains(&Contact::Obstructed { obstacle: BoxOwner::Object(wall), by: mover }));
    }

    #[test]
    fn test_solid_to_nobody_touches_but_never_blocks() {
        let mut world = Fixture::new(&OPEN);
        let mover = world.add(1, 0, 0, 16, Body::default());
        let ghost = world.add(2, 40, 0, 16, Body::ghost(layers::CREATURE));

        assert_eq!(world.move_by(mover, 80, 0), Ok(true));
        assert_eq!(world.position(mover), IVec2::new(80, 0));
        assert!(world.count(|c| *c == Contact::TouchedBy { target: ghost, by: mover }) > 0);
        assert_eq!(world.count(|c| matches!(c, Contact::Blocked { .. })), 0);
    }

    #[test]
    fn test_water_blocks_walkers_but_not_flyers() {
        let rows = [".~......", "........", "........", "........"];
        let mut world = Fixture::new(&rows);
        let walker = world.add(1, 0, 0, 32, Body::default());
        let bird = world.add(2, 0, 100, 32, Body::new(layers::FLYING, layers::NONE));

        world.move_by(walker, 80, 0).unwrap();
        assert_eq!(world.position(walker), IVec2::new(32, 0));

        world.move_by(bird, 0, -100).unwrap();
        world.move_by(bird, 80, 0).unwrap();
        assert_eq!(world.position(bird), IVec2::new(80, 0));
    }

    #[test]
    fn test_landing_reports_tile_under_sprite_center() {
        let mut world = Fixture::new(&["..=.....", "........", "........", "........"]);
        let mover = world.add(1, 0, 0, 32, Body::default());

        world.move_by(mover, 128, 0).unwrap();
        assert_eq!(
            world.contacts.last(),
            Some(&Contact::TileLanded { mover, cell: IVec2::new(2, 0), tile: TileKind::Bridge })
        );
    }

    #[test]
    fn test_dead_and_unregistered_objects_do_not_move() {
        let mut world = Fixture::new(&OPEN);
        let mover = world.add(1, 0, 0, 16, Body::default());
        world.bodies.get_mut(&mover).unwrap().dead = true;
        assert_eq!(world.move_by(mover, 10, 0), Ok(false));

        let stranger = Entity::from_bits(99);
        world.bodies.insert(stranger, BodyView::new(IVec2::ZERO, HitBox::full(IVec2::splat(8)), Body::default()));
        assert_eq!(world.move_by(stranger, 10, 0), Ok(false));
    }

    #[test]
    fn test_fast_move_does_not_tunnel_through_thin_wall() {
        let mut world = Fixture::new(&OPEN);
        let mover = world.add(1, 0, 0, 8, Body::default());
        let thin = BodyView::new(IVec2::new(100, 0), HitBox::full(IVec2::new(1, 64)), Body::new(layers::CREATURE, layers::ALL));
        let wall = Entity::from_bits(2);
        world.index.place(wall, &thin.bounding_box(wall));
        world.bodies.insert(wall, thin);

        world.move_by(mover, 400, 0).unwrap();
        assert_eq!(world.position(mover), IVec2::new(92, 0));
    }

    #[test]
    fn test_position_written_behind_index_is_desync() {
        let mut world = Fixture::new(&OPEN);
        let mover = world.add(1, 0, 0, 16, Body::default());
        world.bodies.get_mut(&mover).unwrap().position = IVec2::new(300, 0);

        assert_eq!(
            world.move_by(mover, 1, 0),
            Err(SimError::BucketDesync { entity: mover, cell: IVec2::new(0, 0) })
        );
        assert_eq!(world.position(mover), IVec2::new(300, 0));
        assert!(world.contacts.is_empty());
    }

    #[test]
    fn test_move_rebuckets_consistently() {
        let mut world = Fixture::new(&OPEN);
        let live: Vec<Entity> = (1..=4).map(|i| world.add(i, (i as i32) * 70, 10, 24, Body::ghost(layers::CREATURE))).collect();

        for (i, &entity) in live.iter().enumerate() {
            world.move_by(entity, 37 * i as i32 - 40, 90).unwrap();
            assert_eq!(world.index.verify(&world.bodies, &live), Ok(()));
        }
    }
}
