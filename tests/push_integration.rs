use bevy::ecs::system::RunSystemOnce;
use bevy::prelude::*;
use lynk::game::direction::Direction;
use lynk::game::level::Level;
use lynk::game::simulation::{
    Body, Dead, HitBox, HitKind, HitObject, HitSource, LiveObjects, Push, SimPosition,
    SimulationPlugin,
};
use lynk::game::spatial_hash::TileBucketIndex;

fn sim_app(rows: &[&str]) -> App {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins);
    app.add_plugins(SimulationPlugin);
    app.insert_resource(Level::from_rows(rows, 6).unwrap());
    app.update();
    app
}

fn spawn_pushable(app: &mut App, x: i32, y: i32, push: Push) -> Entity {
    app.world_mut()
        .spawn((
            SimPosition(IVec2::new(x, y)),
            HitBox::full(IVec2::splat(16)),
            Body::default(),
            push,
        ))
        .id()
}

fn hit(app: &mut App, target: Entity, direction: Direction, power: i32) {
    app.world_mut()
        .run_system_once(move |mut writer: MessageWriter<HitObject>| {
            writer.write(HitObject {
                target,
                source: HitSource::new(direction, power, HitKind::Weapon),
            });
        })
        .unwrap();
}

fn position(app: &App, entity: Entity) -> IVec2 {
    app.world().get::<SimPosition>(entity).unwrap().0
}

const OPEN: [&str; 4] = ["........", "........", "........", "........"];

#[test]
fn test_hit_pushes_and_decays_to_rest() {
    let mut app = sim_app(&OPEN);
    let target = spawn_pushable(&mut app, 64, 64, Push::with_decay(2));
    app.world_mut().run_schedule(FixedUpdate);

    hit(&mut app, target, Direction::Right, 6);

    // 6, then 4, then 2 pixels
    let mut trail = Vec::new();
    for _ in 0..5 {
        app.world_mut().run_schedule(FixedUpdate);
        trail.push(position(&app, target).x);
    }
    assert_eq!(trail, vec![70, 74, 76, 76, 76]);

    let push = app.world().get::<Push>(target).unwrap();
    assert!(!push.is_active());
    assert_eq!(push.direction, Direction::None);
}

#[test]
fn test_push_stops_at_solid_tile() {
    let mut app = sim_app(&["..#.....", "..#.....", "..#.....", "..#....."]);
    let target = spawn_pushable(&mut app, 100, 0, Push::with_decay(1));
    app.world_mut().run_schedule(FixedUpdate);

    hit(&mut app, target, Direction::Right, 20);
    for _ in 0..30 {
        app.world_mut().run_schedule(FixedUpdate);
    }

    assert_eq!(position(&app, target), IVec2::new(112, 0), "Box ends flush with the wall at x = 128");
}

#[test]
fn test_immovable_object_ignores_hits() {
    let mut app = sim_app(&OPEN);
    let target = spawn_pushable(&mut app, 64, 64, Push::immovable());
    app.world_mut().run_schedule(FixedUpdate);

    hit(&mut app, target, Direction::Up, 10);
    for _ in 0..3 {
        app.world_mut().run_schedule(FixedUpdate);
    }

    assert_eq!(position(&app, target), IVec2::new(64, 64));
}

#[test]
fn test_dead_objects_are_reaped_next_tick() {
    let mut app = sim_app(&OPEN);
    let doomed = spawn_pushable(&mut app, 10, 10, Push::default());
    let survivor = spawn_pushable(&mut app, 200, 10, Push::default());
    app.world_mut().run_schedule(FixedUpdate);
    assert_eq!(app.world().resource::<LiveObjects>().len(), 2);

    app.world_mut().entity_mut(doomed).insert(Dead);
    hit(&mut app, doomed, Direction::Right, 8);
    app.world_mut().run_schedule(FixedUpdate);

    let live = app.world().resource::<LiveObjects>();
    assert_eq!(live.len(), 1);
    assert!(live.contains(survivor));
    let index = app.world().resource::<TileBucketIndex>();
    assert!(!index.is_tracked(doomed));
    assert!(index.entities_in_cell(0, 0).is_empty());
    assert_eq!(position(&app, doomed), IVec2::new(10, 10), "Dead objects are never pushed");
}

#[test]
fn test_object_spawned_outside_level_is_marked_dead() {
    let mut app = sim_app(&OPEN);
    let lost = spawn_pushable(&mut app, -100, 10, Push::default());
    app.world_mut().run_schedule(FixedUpdate);

    assert!(app.world().get::<Dead>(lost).is_some());
    assert!(!app.world().resource::<LiveObjects>().contains(lost));
    assert!(!app.world().resource::<TileBucketIndex>().is_tracked(lost));
}
