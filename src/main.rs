use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;

use lynk::game::config::InitialConfig;
use lynk::game::demo::{DemoPlugin, DemoSummary};
use lynk::game::simulation::{LiveObjects, SimConfig, SimStats, SimTick};
use lynk::game::spatial_hash::TileBucketIndex;
use lynk::game::GamePlugin;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

fn setup_file_logging() -> Option<String> {
    // Create logs directory if it doesn't exist
    let log_dir = PathBuf::from("logs");
    if let Err(e) = fs::create_dir_all(&log_dir) {
        eprintln!("Failed to create logs directory: {e}");
        return None;
    }

    // Clean up old log files, keeping only the last 25
    cleanup_old_logs(&log_dir, 25);

    // Generate timestamped filename
    let now = chrono::Local::now();
    let log_filename = format!("lynk_{}.log", now.format("%Y%m%d_%H%M%S"));
    let log_file_path = log_dir.join(&log_filename);
    let log_path_str = log_file_path.to_string_lossy().to_string();

    // Create file appender with timestamped filename
    let file_appender = RollingFileAppender::new(
        Rotation::NEVER, // Don't rotate during a single run
        &log_dir,
        &log_filename
    );

    // Create a formatting layer for the file
    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false); // No ANSI colors in file

    // Create a formatting layer for stdout (minimal)
    let stdout_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(false);

    // Set up the subscriber with both layers
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("bevy_ecs=info,bevy_asset=warn,lynk=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stdout_layer)
        .init();

    Some(log_path_str)
}

fn cleanup_old_logs(log_dir: &Path, keep_count: usize) {
    if let Ok(entries) = fs::read_dir(log_dir) {
        let mut log_files: Vec<_> = entries
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.path()
                    .file_name()
                    .and_then(|n| n.to_str())
                    .map(|s| s.starts_with("lynk") && s.ends_with(".log"))
                    .unwrap_or(false)
            })
            .collect();

        // Sort by modified time (oldest first)
        log_files.sort_by_key(|e| e.metadata().ok().and_then(|m| m.modified().ok()));

        // Delete oldest files if we exceed keep_count
        if log_files.len() > keep_count {
            for file in log_files.iter().take(log_files.len() - keep_count) {
                let _ = fs::remove_file(file.path());
            }
        }
    }
}

fn main() {
    let log_file = setup_file_logging();
    if let Some(path) = &log_file {
        println!("lynk headless demo - logging to {path}");
    }

    let mut app = App::new();
    app.add_plugins((MinimalPlugins, AssetPlugin::default()))
        .add_plugins((GamePlugin, DemoPlugin));

    // Startup: config, level, walkers
    app.update();

    let (tick_rate, ticks) = {
        let world = app.world();
        let tick_rate = world.resource::<SimConfig>().tick_rate;
        let ticks = world
            .get_resource::<InitialConfig>()
            .map_or(InitialConfig::default().demo_ticks, |c| c.demo_ticks);
        (tick_rate, ticks)
    };

    // One fixed step per update, independent of wall-clock time
    let step = app.world().resource::<Time<Fixed>>().timestep();
    app.insert_resource(TimeUpdateStrategy::ManualDuration(step));
    info!("[DEMO] Running {} ticks at {} Hz", ticks, tick_rate);

    let max_updates = ticks.saturating_mul(2).saturating_add(10);
    let mut updates = 0;
    while app.world().resource::<SimTick>().get() < ticks && updates < max_updates {
        app.update();
        updates += 1;
    }

    let world = app.world();
    let tick = world.resource::<SimTick>().get();
    let stats = world.resource::<SimStats>();
    let summary = world.resource::<DemoSummary>();
    let index = world.resource::<TileBucketIndex>();
    info!(
        "[DEMO] Finished after {} ticks: {} live objects, {} walkers, {} turns, {} shoves, {} touches, {} landings",
        tick,
        world.resource::<LiveObjects>().len(),
        summary.walkers,
        summary.turns,
        summary.shoves,
        summary.touches,
        summary.landings,
    );
    info!(
        "[DEMO] Moves {}/{} committed, {} contacts, index {} entries in {} cells",
        stats.moves_committed,
        stats.moves_requested,
        stats.contacts,
        index.total_entries(),
        index.non_empty_cells(),
    );
}
