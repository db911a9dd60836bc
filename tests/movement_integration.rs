use bevy::ecs::system::RunSystemOnce;
use bevy::prelude::*;
use lynk::game::geometry::BoxOwner;
use lynk::game::level::{Level, TileKind};
use lynk::game::simulation::{
    layers, Body, Contact, Facing, HitBox, LevelObjects, SimPosition, SimulationPlugin,
};
use lynk::game::direction::Direction;
use lynk::game::spatial_hash::TileBucketIndex;

fn sim_app(rows: &[&str]) -> App {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins);
    app.add_plugins(SimulationPlugin);
    app.insert_resource(Level::from_rows(rows, 6).unwrap());
    app.update();
    app
}

fn spawn_box(app: &mut App, x: i32, y: i32, size: i32, body: Body) -> Entity {
    app.world_mut()
        .spawn((SimPosition(IVec2::new(x, y)), HitBox::full(IVec2::splat(size)), body))
        .id()
}

fn move_by(app: &mut App, entity: Entity, dx: i32, dy: i32) -> bool {
    app.world_mut()
        .run_system_once(move |mut objects: LevelObjects| objects.move_by(entity, dx, dy))
        .unwrap()
        .unwrap()
}

fn position(app: &App, entity: Entity) -> IVec2 {
    app.world().get::<SimPosition>(entity).unwrap().0
}

fn published_contacts(app: &mut App) -> Vec<Contact> {
    app.world_mut()
        .run_system_once(|mut reader: MessageReader<Contact>| reader.read().copied().collect::<Vec<_>>())
        .unwrap()
}

const OPEN: [&str; 4] = ["........", "........", "........", "........"];
const COLUMN: [&str; 4] = ["..#.....", "..#.....", "..#.....", "..#....."];

#[test]
fn test_spawned_objects_are_registered_on_next_tick() {
    let mut app = sim_app(&OPEN);
    let mover = spawn_box(&mut app, 70, 10, 64, Body::default());

    app.world_mut().run_schedule(FixedUpdate);

    let index = app.world().resource::<TileBucketIndex>();
    assert!(index.is_tracked(mover));
    let span = index.span_of(mover).unwrap();
    assert_eq!((span.min, span.max), (IVec2::new(1, 0), IVec2::new(2, 1)));
    assert_eq!(index.total_entries(), 4, "64px box at (70, 10) covers four cells");
}

#[test]
fn test_move_through_open_level() {
    let mut app = sim_app(&OPEN);
    let mover = spawn_box(&mut app, 0, 0, 64, Body::default());
    app.world_mut().run_schedule(FixedUpdate);

    assert!(move_by(&mut app, mover, 130, 0));
    assert_eq!(position(&app, mover), IVec2::new(130, 0));

    let span = app.world().resource::<TileBucketIndex>().span_of(mover).unwrap();
    assert_eq!((span.min, span.max), (IVec2::new(2, 0), IVec2::new(3, 0)));
    assert_eq!(app.world().resource::<TileBucketIndex>().entities_in_cell(3, 0), vec![mover]);
    assert!(app.world().resource::<TileBucketIndex>().entities_in_cell(1, 0).is_empty());
}

#[test]
fn test_solid_column_blocks_and_publishes_contacts() {
    let mut app = sim_app(&COLUMN);
    let mover = spawn_box(&mut app, 0, 0, 64, Body::default());
    app.world_mut().run_schedule(FixedUpdate);

    assert!(move_by(&mut app, mover, 130, 0));
    assert_eq!(position(&app, mover), IVec2::new(64, 0));

    // Contacts are buffered until the end of the next tick
    assert!(published_contacts(&mut app).is_empty());
    app.world_mut().run_schedule(FixedUpdate);
    let contacts = published_contacts(&mut app);

    let wall = BoxOwner::Tile(IVec2::new(2, 0));
    assert!(contacts.contains(&Contact::Blocked { mover, obstacle: wall }));
    assert!(contacts.contains(&Contact::Obstructed { obstacle: wall, by: mover }));
    assert_eq!(contacts.iter().filter(|c| matches!(c, Contact::Blocked { .. })).count(), 1);
    assert!(contacts.iter().any(|c| matches!(
        c,
        Contact::TileLanded { mover: m, cell, tile: TileKind::Grass } if *m == mover && *cell == IVec2::new(1, 0)
    )));
}

#[test]
fn test_diagonal_move_slides_along_wall() {
    let mut app = sim_app(&COLUMN);
    let mover = spawn_box(&mut app, 40, 0, 32, Body::default());
    app.world_mut().run_schedule(FixedUpdate);

    assert!(move_by(&mut app, mover, 100, 50));
    assert_eq!(position(&app, mover), IVec2::new(96, 50));
}

#[test]
fn test_border_clamp_keeps_objects_inside() {
    let mut app = sim_app(&OPEN);
    let mover = spawn_box(&mut app, 20, 20, 16, Body::default());
    app.world_mut().run_schedule(FixedUpdate);

    assert!(move_by(&mut app, mover, -100, -100));
    assert_eq!(position(&app, mover), IVec2::ZERO);
    assert!(!move_by(&mut app, mover, -1, 0), "Already at the edge");
}

#[test]
fn test_objects_block_each_other_and_report_both_sides() {
    let mut app = sim_app(&OPEN);
    let mover = spawn_box(&mut app, 0, 0, 16, Body::default());
    let other = spawn_box(&mut app, 40, 0, 16, Body::default());
    app.world_mut().run_schedule(FixedUpdate);

    assert!(move_by(&mut app, mover, 50, 0));
    assert_eq!(position(&app, mover), IVec2::new(24, 0));
    assert_eq!(position(&app, other), IVec2::new(40, 0));

    app.world_mut().run_schedule(FixedUpdate);
    let contacts = published_contacts(&mut app);
    assert!(contacts.contains(&Contact::Touched { mover, other }));
    assert!(contacts.contains(&Contact::TouchedBy { target: other, by: mover }));
    assert!(contacts.contains(&Contact::Blocked { mover, obstacle: BoxOwner::Object(other) }));
    assert!(contacts.contains(&Contact::Obstructed { obstacle: BoxOwner::Object(other), by: mover }));
}

#[test]
fn test_object_solid_to_nobody_is_touched_not_blocking() {
    let mut app = sim_app(&OPEN);
    let mover = spawn_box(&mut app, 0, 0, 16, Body::default());
    let ghost = spawn_box(&mut app, 40, 0, 16, Body::ghost(layers::ITEM));
    app.world_mut().run_schedule(FixedUpdate);

    assert!(move_by(&mut app, mover, 50, 0));
    assert_eq!(position(&app, mover), IVec2::new(50, 0));

    app.world_mut().run_schedule(FixedUpdate);
    let contacts = published_contacts(&mut app);
    assert!(contacts.contains(&Contact::Touched { mover, other: ghost }));
    assert!(!contacts.iter().any(|c| matches!(c, Contact::Blocked { .. })));
}

#[test]
fn test_interact_targets_follow_facing() {
    let mut app = sim_app(&OPEN);
    let actor = spawn_box(&mut app, 0, 0, 32, Body::default());
    let target = spawn_box(&mut app, 40, 0, 16, Body::default());
    app.world_mut().entity_mut(actor).insert(Facing(Direction::Right));
    app.world_mut().run_schedule(FixedUpdate);

    let facing_right = app
        .world_mut()
        .run_system_once(move |objects: LevelObjects| objects.interact_targets(actor, 16))
        .unwrap();
    assert_eq!(facing_right, vec![target]);

    app.world_mut().entity_mut(actor).insert(Facing(Direction::Down));
    let facing_down = app
        .world_mut()
        .run_system_once(move |objects: LevelObjects| objects.interact_targets(actor, 16))
        .unwrap();
    assert!(facing_down.is_empty());
}
