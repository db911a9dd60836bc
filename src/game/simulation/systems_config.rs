/// Configuration initialization systems
///
/// Copies the static `InitialConfig` (loaded at startup from
/// initial_config.ron) into the simulation's `SimConfig` and fixed timestep.

use bevy::prelude::*;
use crate::game::config::InitialConfig;
use crate::game::level::{MAX_TILE_SHIFT, MIN_TILE_SHIFT};

use crate::game::simulation::resources::*;

/// Initialize SimConfig from InitialConfig at startup
pub fn init_sim_config_from_initial(
    mut fixed_time: ResMut<Time<Fixed>>,
    mut sim_config: ResMut<SimConfig>,
    initial_config: Option<Res<InitialConfig>>,
) {
    info!("[CONFIG] Initializing SimConfig from InitialConfig");

    let config = match &initial_config {
        Some(cfg) => cfg.as_ref(),
        None => {
            warn!("[CONFIG] InitialConfig not found, using defaults");
            &InitialConfig::default()
        }
    };

    let tick_rate = if config.tick_rate > 0.0 {
        config.tick_rate
    } else {
        warn!("[CONFIG] Invalid tick rate {}, using 30", config.tick_rate);
        30.0
    };
    fixed_time.set_timestep_seconds(1.0 / tick_rate);

    sim_config.tick_rate = tick_rate;
    sim_config.tile_shift = config.tile_shift.clamp(MIN_TILE_SHIFT, MAX_TILE_SHIFT);
    sim_config.double_step_threshold = config.double_step_threshold.max(0);
    sim_config.default_push_decay = config.default_push_decay.max(1);
    sim_config.interact_side_margin = config.interact_side_margin.max(0);
    sim_config.stats_interval = config.stats_interval;
    sim_config.verify_index = config.verify_index;

    info!(
        "[CONFIG] SimConfig initialized: {} Hz, tile size {}, double step above {} px, verify index: {}",
        sim_config.tick_rate,
        1 << sim_config.tile_shift,
        sim_config.double_step_threshold,
        sim_config.verify_index
    );
}
