use bevy::prelude::*;
use bevy_common_assets::ron::RonAssetPlugin;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const INITIAL_CONFIG_PATH: &str = "assets/initial_config.ron";
pub const RUNTIME_CONFIG_PATH: &str = "sim.runtime.ron";
pub const RUNTIME_CONFIG_EXTENSION: &str = "runtime.ron";

/// Static configuration loaded once at startup. These values define the
/// simulation's fundamental parameters (tick rate, tile size, step policy)
/// and are copied into `SimConfig` before the first tick.
#[derive(Resource, Deserialize, Serialize, Clone, Debug)]
#[serde(default)]
pub struct InitialConfig {
    // Simulation
    pub tick_rate: f64,
    pub tile_shift: u32,
    pub double_step_threshold: i32,
    pub default_push_decay: i32,
    pub interact_side_margin: i32,

    // Diagnostics
    pub stats_interval: u64,
    pub verify_index: bool,

    // Headless demo
    pub demo_ticks: u64,
    pub demo_level_width: i32,
    pub demo_level_height: i32,
    pub demo_walkers: usize,
    pub demo_walker_speed: i32,
    pub demo_wall_density: f32,
    pub demo_seed: u64,
}

impl Default for InitialConfig {
    fn default() -> Self {
        Self {
            tick_rate: 30.0,
            tile_shift: 6,
            double_step_threshold: 2,
            default_push_decay: 1,
            interact_side_margin: 4,
            stats_interval: 300,
            verify_index: false,
            demo_ticks: 600,
            demo_level_width: 24,
            demo_level_height: 16,
            demo_walkers: 12,
            demo_walker_speed: 3,
            demo_wall_density: 0.08,
            demo_seed: 7,
        }
    }
}

/// Errors raised while reading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: ron::error::SpannedError,
    },
}

impl InitialConfig {
    pub fn from_ron(path: &str, contents: &str) -> Result<Self, ConfigError> {
        ron::from_str(contents).map_err(|source| ConfigError::Parse {
            path: path.to_string(),
            source,
        })
    }

    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;
        Self::from_ron(path, &contents)
    }
}

/// Runtime configuration that can be hot-reloaded while the simulation runs.
/// These settings only affect diagnostics, never simulation results.
#[derive(Deserialize, Serialize, Asset, TypePath, Clone, Debug)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Log every published contact at debug level.
    pub log_contacts: bool,
    /// Emit the periodic stats line.
    pub log_stats: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            log_contacts: false,
            log_stats: true,
        }
    }
}

#[derive(Resource)]
pub struct RuntimeConfigHandle(pub Handle<RuntimeConfig>);

/// Startup systems that load configuration. Anything reading `InitialConfig`
/// at startup runs after this set.
#[derive(SystemSet, Debug, Hash, PartialEq, Eq, Clone)]
pub struct ConfigLoadSet;

pub struct GameConfigPlugin;

impl Plugin for GameConfigPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(RonAssetPlugin::<RuntimeConfig>::new(&[RUNTIME_CONFIG_EXTENSION]))
            .add_systems(Startup, (load_initial_config, setup_runtime_config).chain().in_set(ConfigLoadSet));
    }
}

/// Load static initial configuration synchronously at startup.
/// An `InitialConfig` inserted before startup (tests, tools) is kept.
fn load_initial_config(mut commands: Commands, existing: Option<Res<InitialConfig>>) {
    if existing.is_some() {
        info!("[CONFIG] InitialConfig already present, skipping {}", INITIAL_CONFIG_PATH);
        return;
    }

    match InitialConfig::load(INITIAL_CONFIG_PATH) {
        Ok(config) => {
            info!("[CONFIG] Loaded initial config from {}", INITIAL_CONFIG_PATH);
            commands.insert_resource(config);
        }
        Err(e) => {
            error!("[CONFIG] {}", e);
            error!("[CONFIG] Using default InitialConfig");
            commands.insert_resource(InitialConfig::default());
        }
    }
}

/// Load runtime configuration asynchronously (can be hot-reloaded).
fn setup_runtime_config(mut commands: Commands, asset_server: Res<AssetServer>) {
    let handle = asset_server.load(RUNTIME_CONFIG_PATH);
    commands.insert_resource(RuntimeConfigHandle(handle));
}

/// Current runtime settings, or defaults while the asset is missing or loading.
pub fn current_runtime_config(
    handle: Option<&RuntimeConfigHandle>,
    assets: Option<&Assets<RuntimeConfig>>,
) -> RuntimeConfig {
    handle
        .zip(assets)
        .and_then(|(handle, assets)| assets.get(&handle.0))
        .cloned()
        .unwrap_or_default()
}
