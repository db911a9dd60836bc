/// Core simulation systems.
///
/// This module contains systems for:
/// - Tick counting
/// - Keeping the tile index in step with the level
/// - Registering spawned objects, reaping dead ones and catching direct
///   position writes
/// - Hits and push motion
/// - Publishing contacts and periodic stats

use bevy::prelude::*;
use lynk_macros::profile;

use crate::game::config::{current_runtime_config, RuntimeConfig, RuntimeConfigHandle};
use crate::game::spatial_hash::TileBucketIndex;

use super::components::*;
use super::events::*;
use super::objects::LevelObjects;
use super::resources::*;

// ============================================================================
// Tick Management
// ============================================================================

/// Increment the global simulation tick counter.
///
/// This system runs first in the FixedUpdate schedule so that every later
/// system sees the current tick.
pub fn increment_sim_tick(mut tick: ResMut<SimTick>) {
    tick.increment();
}

// ============================================================================
// Housekeeping
// ============================================================================

/// Resize and refill the tile index when the level resource was replaced by
/// one of a different size.
pub fn refresh_level_index(mut objects: LevelObjects) {
    objects.sync_index();
}

/// Stop the tick when a registered object's position or hit box was written
/// directly instead of through `LevelObjects`. Its buckets would be stale and
/// other movers would pass through it.
pub fn check_moved_objects(
    index: Res<TileBucketIndex>,
    live: Res<LiveObjects>,
    moved: Query<(Entity, &SimPosition, &HitBox), Or<(Changed<SimPosition>, Changed<HitBox>)>>,
    tick: Res<SimTick>,
) -> Result {
    for (entity, position, hit_box) in moved.iter() {
        if !live.contains(entity) {
            continue;
        }
        if let Err(err) = index.check_span(entity, &hit_box.bounding_box(position.0, entity)) {
            error!("[TILE_INDEX] Tick {}: {:?} changed outside the resolver: {}", tick.get(), entity, err);
            return Err(err.into());
        }
    }
    Ok(())
}

/// Register objects spawned with a body since the last tick at their
/// current position.
pub fn register_spawned_objects(mut objects: LevelObjects, spawned: Query<Entity, Added<Body>>) {
    for entity in spawned.iter() {
        if objects.is_live(entity) {
            continue;
        }
        if let Some(position) = objects.position(entity) {
            objects.add_object(entity, position.x, position.y);
        }
    }
}

/// Remove objects killed during the previous tick.
pub fn reap_dead_objects(mut objects: LevelObjects, tick: Res<SimTick>) {
    let reaped = objects.reap_dead();
    if reaped > 0 {
        debug!("[LEVEL] Tick {}: reaped {} dead objects", tick.get(), reaped);
    }
}

/// Turn hit messages into push motion.
pub fn receive_hits(mut hits: MessageReader<HitObject>, mut pushes: Query<&mut Push, Without<Dead>>) {
    for hit in hits.read() {
        match pushes.get_mut(hit.target) {
            Ok(mut push) => {
                push.start(&hit.source);
            }
            Err(_) => debug!("[PUSH] {:?} hit but cannot be pushed", hit.target),
        }
    }
}

// ============================================================================
// Push Motion
// ============================================================================

/// Advance every active push by one tick, in live-object order.
#[profile]
pub fn apply_push(
    mut objects: LevelObjects,
    mut pushes: Query<&mut Push>,
    #[allow(unused_variables)] tick: Res<SimTick>,
) -> Result {
    for entity in objects.live_objects().to_vec() {
        let Ok(mut push) = pushes.get_mut(entity) else {
            continue;
        };
        if !push.is_active() {
            continue;
        }
        let step = push.step();
        objects.move_by(entity, step.x, step.y)?;
        push.decay();
    }
    crate::profile_log!(tick, "[PUSH] tick {} done", tick.get());
    Ok(())
}

// ============================================================================
// Publishing
// ============================================================================

/// Drain the contacts raised during this tick into `Contact` messages.
#[profile(250)]
pub fn publish_contacts(
    mut contacts: ResMut<TickContacts>,
    mut writer: MessageWriter<Contact>,
    mut stats: ResMut<SimStats>,
    handle: Option<Res<RuntimeConfigHandle>>,
    runtime: Option<Res<Assets<RuntimeConfig>>>,
) {
    if contacts.0.is_empty() {
        return;
    }
    let log_contacts = current_runtime_config(handle.as_deref(), runtime.as_deref()).log_contacts;
    if log_contacts {
        for contact in &contacts.0 {
            debug!("[CONTACT] {:?}", contact);
        }
    }
    stats.contacts += contacts.0.len() as u64;
    writer.write_batch(contacts.0.drain(..));
}

/// Periodic one-line summary of the simulation state.
pub fn log_sim_stats(
    objects: LevelObjects,
    tick: Res<SimTick>,
    config: Res<SimConfig>,
    handle: Option<Res<RuntimeConfigHandle>>,
    runtime: Option<Res<Assets<RuntimeConfig>>>,
) {
    if config.stats_interval == 0 || tick.get() % config.stats_interval != 0 {
        return;
    }
    if !current_runtime_config(handle.as_deref(), runtime.as_deref()).log_stats {
        return;
    }
    let index = objects.index();
    let stats = objects.stats();
    info!(
        "[SIM STATUS] Tick: {} | Objects: {} | Index: {} entries in {} cells | Moves: {}/{} committed | Contacts: {}",
        tick.get(),
        objects.live_objects().len(),
        index.total_entries(),
        index.non_empty_cells(),
        stats.moves_committed,
        stats.moves_requested,
        stats.contacts,
    );
}

/// Check index consistency when enabled. A failure stops the tick.
pub fn verify_tile_index(objects: LevelObjects, config: Res<SimConfig>, tick: Res<SimTick>) -> Result {
    if !config.verify_index {
        return Ok(());
    }
    if let Err(err) = objects.verify() {
        error!("[TILE_INDEX] Tick {}: {}", tick.get(), err);
        return Err(err.into());
    }
    Ok(())
}
