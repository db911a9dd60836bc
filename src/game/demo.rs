/// Headless demo: a generated walled level with walkers patrolling it.
///
/// Walkers move along their facing every tick and turn clockwise whenever
/// they are blocked. Walking into another walker shoves it.

use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::game::config::{ConfigLoadSet, InitialConfig};
use crate::game::direction::Direction;
use crate::game::level::{Level, TileKind};
use crate::game::simulation::systems_config::init_sim_config_from_initial;
use crate::game::simulation::{
    layers, Body, Contact, Facing, HitBox, HitKind, HitObject, HitSource, LevelObjects, Push,
    SimConfig, SimPosition, SimSet,
};

const OBSTACLES: [TileKind; 5] = [
    TileKind::Rock,
    TileKind::Tree,
    TileKind::Water,
    TileKind::Fence,
    TileKind::Brick,
];

/// Patrolling object driven by the demo.
#[derive(Component, Debug, Clone, Copy)]
pub struct Walker {
    pub speed: i32,
}

/// Counters reported when the demo ends.
#[derive(Resource, Default, Debug, Clone, Copy)]
pub struct DemoSummary {
    pub walkers: usize,
    pub turns: u64,
    pub shoves: u64,
    pub touches: u64,
    pub landings: u64,
}

pub struct DemoPlugin;

impl Plugin for DemoPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<DemoSummary>()
            .add_systems(
                Startup,
                setup_demo_level
                    .after(ConfigLoadSet)
                    .after(init_sim_config_from_initial),
            )
            .add_systems(FixedUpdate, (
                patrol_walkers.in_set(SimSet::Steering),
                react_to_contacts.after(SimSet::Publish),
            ));
    }
}

/// Generate a level bordered by brick with scattered obstacles.
pub fn generate_level(width: i32, height: i32, tile_shift: u32, density: f32, rng: &mut StdRng) -> Level {
    let mut level = Level::new(width, height, tile_shift, TileKind::Grass);
    for y in 0..height {
        for x in 0..width {
            let tile = if x == 0 || y == 0 || x == width - 1 || y == height - 1 {
                TileKind::Brick
            } else if rng.random_bool(density.clamp(0.0, 1.0) as f64) {
                OBSTACLES[rng.random_range(0..OBSTACLES.len())]
            } else if rng.random_bool(0.1) {
                TileKind::Dirt
            } else {
                TileKind::Grass
            };
            level.set_tile(x, y, tile);
        }
    }
    level
}

fn setup_demo_level(mut commands: Commands, initial: Option<Res<InitialConfig>>, sim_config: Res<SimConfig>) {
    let defaults = InitialConfig::default();
    let config = initial.as_deref().unwrap_or(&defaults);
    let mut rng = StdRng::seed_from_u64(config.demo_seed);

    let level = generate_level(
        config.demo_level_width.max(3),
        config.demo_level_height.max(3),
        sim_config.tile_shift,
        config.demo_wall_density,
        &mut rng,
    );

    let mut free: Vec<IVec2> = (0..level.height())
        .flat_map(|y| (0..level.width()).map(move |x| IVec2::new(x, y)))
        .filter(|c| level.tile_at(c.x, c.y) == Some(TileKind::Grass))
        .collect();

    let tile_size = level.tile_size();
    let sprite = IVec2::splat(tile_size / 2);
    let mut spawned = 0;
    for _ in 0..config.demo_walkers {
        if free.is_empty() {
            warn!("[DEMO] Ran out of free tiles after {} walkers", spawned);
            break;
        }
        let cell = free.swap_remove(rng.random_range(0..free.len()));
        let facing = Direction::ALL[rng.random_range(0..4)];
        commands.spawn((
            Walker { speed: config.demo_walker_speed },
            SimPosition(cell * tile_size + sprite / 2),
            HitBox::centered(sprite, sprite * 5 / 16),
            Body::new(layers::CREATURE, layers::CREATURE | layers::PLAYER),
            Facing(facing),
            Push::with_decay(sim_config.default_push_decay),
        ));
        spawned += 1;
    }

    info!(
        "[DEMO] Level {}x{} ({} solid tiles), {} walkers",
        level.width(),
        level.height(),
        OBSTACLES.iter().map(|&t| level.count(t)).sum::<usize>() + level.count(TileKind::Brick),
        spawned
    );
    commands.insert_resource(level);
    commands.insert_resource(DemoSummary { walkers: spawned, ..default() });
}

/// Move every walker along its facing, in live-object order.
pub fn patrol_walkers(mut objects: LevelObjects, walkers: Query<(&Walker, &Facing)>) -> Result {
    for entity in objects.live_objects().to_vec() {
        let Ok((walker, facing)) = walkers.get(entity) else {
            continue;
        };
        let step = facing.0.vector() * walker.speed;
        objects.move_by(entity, step.x, step.y)?;
    }
    Ok(())
}

/// Turn blocked walkers and shove walkers that were walked into.
pub fn react_to_contacts(
    mut contacts: MessageReader<Contact>,
    mut hits: MessageWriter<HitObject>,
    mut walkers: Query<&mut Facing, With<Walker>>,
    mut summary: ResMut<DemoSummary>,
) {
    for contact in contacts.read() {
        match *contact {
            Contact::Blocked { mover, obstacle } => {
                let Ok(mut facing) = walkers.get_mut(mover) else {
                    continue;
                };
                let heading = facing.0;
                facing.0 = heading.clockwise();
                debug!("[DEMO] {:?} blocked heading {}, now facing {}", mover, heading.name(), facing.0.name());
                summary.turns += 1;
                if let Some(target) = obstacle.entity().filter(|&t| walkers.contains(t)) {
                    hits.write(HitObject {
                        target,
                        source: HitSource::new(heading, 4, HitKind::Entity).created_by(mover),
                    });
                    summary.shoves += 1;
                }
            }
            Contact::Touched { .. } => summary.touches += 1,
            Contact::TileLanded { .. } => summary.landings += 1,
            _ => {}
        }
    }
}
