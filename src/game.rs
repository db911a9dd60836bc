use bevy::prelude::*;

pub mod config;
pub mod demo;
pub mod direction;
pub mod error;
pub mod geometry;
pub mod level;
pub mod simulation;
pub mod spatial_hash;

use config::GameConfigPlugin;
use simulation::SimulationPlugin;

/// Configuration loading plus the simulation core. Gameplay (or the demo)
/// adds its own systems to `SimSet::Steering`.
pub struct GamePlugin;

impl Plugin for GamePlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins((GameConfigPlugin, SimulationPlugin))
            .add_systems(Startup, log_startup);
    }
}

fn log_startup() {
    info!("Simulation setup started");
}
