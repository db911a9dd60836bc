/// Simulation layer - tile-indexed collision and movement.
///
/// This module is organized into:
/// - **components**: Object components (position, hit box, body, push, etc.)
/// - **bodies**: Read/write access to object bodies behind a trait
/// - **resources**: Simulation resources (config, tick, live objects, contacts)
/// - **events**: Contact and hit messages
/// - **movement**: Step planning and the movement resolver
/// - **objects**: `LevelObjects`, the registry and gameplay-facing API
/// - **systems**: Per-tick systems (housekeeping, push, publishing)

use bevy::prelude::*;

use crate::game::config::ConfigLoadSet;
use crate::game::level::Level;
use crate::game::spatial_hash::TileBucketIndex;

// Module declarations
pub mod bodies;
pub mod components;
pub mod events;
pub mod movement;
pub mod objects;
pub mod resources;
pub mod systems;
pub mod systems_config;

// Re-export commonly used items
pub use bodies::{BodyLookup, BodyStore, BodyView};
pub use components::*;
pub use events::*;
pub use movement::{ContactListener, MoveContext, StepPlan};
pub use objects::LevelObjects;
pub use resources::*;

// System sets for organizing execution order
#[derive(SystemSet, Debug, Hash, PartialEq, Eq, Clone)]
pub enum SimSet {
    Housekeeping, // Tick counter, index sync, reaping, write checks, registration, hits
    Steering,     // Gameplay systems requesting moves
    Push,         // Push motion
    Publish,      // Contacts out, stats, consistency checks
}

/// Main simulation plugin
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        // Configure FixedUpdate timestep (overridden by InitialConfig at startup)
        app.insert_resource(Time::<Fixed>::from_hz(30.0));

        app.init_resource::<SimConfig>();
        app.init_resource::<SimTick>();
        app.init_resource::<SimStats>();
        app.init_resource::<LiveObjects>();
        app.init_resource::<TickContacts>();
        app.init_resource::<Level>();
        // Sized to the level on first use
        app.init_resource::<TileBucketIndex>();

        // Register messages
        app.add_message::<Contact>();
        app.add_message::<HitObject>();

        // Configure System Sets
        app.configure_sets(FixedUpdate, (
            SimSet::Housekeeping,
            SimSet::Steering,
            SimSet::Push,
            SimSet::Publish,
        ).chain());

        // Startup systems
        app.add_systems(Startup, systems_config::init_sim_config_from_initial.after(ConfigLoadSet));

        // Fixed update systems
        app.add_systems(FixedUpdate, (
            (
                systems::increment_sim_tick,
                systems::refresh_level_index,
                systems::reap_dead_objects,
                systems::check_moved_objects,
                systems::register_spawned_objects,
                systems::receive_hits,
            ).chain().in_set(SimSet::Housekeeping),
            systems::apply_push.in_set(SimSet::Push),
            (
                systems::publish_contacts,
                systems::log_sim_stats,
                systems::verify_tile_index,
            ).chain().in_set(SimSet::Publish),
        ));
    }
}
