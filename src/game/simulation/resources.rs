/// Resource definitions for the simulation.
///
/// This module contains the simulation configuration, the tick counter, the
/// ordered list of live objects and the per-tick contact buffer.

use bevy::prelude::*;

use crate::game::simulation::events::Contact;
use crate::game::simulation::movement::ContactListener;

// ============================================================================
// Simulation Configuration
// ============================================================================

/// Runtime simulation configuration.
///
/// Copied from [`InitialConfig`](crate::game::config::InitialConfig) once at
/// startup. Changing it while objects are registered is allowed for the
/// movement tunables but not for `tile_shift`, which only applies to levels
/// built afterwards.
#[derive(Resource, Debug, Clone)]
pub struct SimConfig {
    pub tick_rate: f64,
    pub tile_shift: u32,
    /// Requests longer than this on either axis are resolved in 2-pixel steps.
    pub double_step_threshold: i32,
    pub default_push_decay: i32,
    /// Width added on both flanks of an interaction probe.
    pub interact_side_margin: i32,
    /// Ticks between stats reports; 0 disables them.
    pub stats_interval: u64,
    /// Check index consistency at the end of every tick.
    pub verify_index: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tick_rate: 30.0,
            tile_shift: 6,
            double_step_threshold: 2,
            default_push_decay: 1,
            interact_side_margin: 4,
            stats_interval: 300,
            verify_index: false,
        }
    }
}

// ============================================================================
// Tick State
// ============================================================================

/// Tracks the current simulation tick number.
#[derive(Resource, Default, Debug, Clone, Copy)]
pub struct SimTick(pub u64);

impl SimTick {
    pub fn increment(&mut self) {
        self.0 = self.0.wrapping_add(1);
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

/// Registered objects in tick order.
///
/// Pushes and any other per-object pass iterate this list, so the order of
/// registration decides who moves first.
#[derive(Resource, Default, Debug, Clone)]
pub struct LiveObjects(pub Vec<Entity>);

impl LiveObjects {
    pub fn contains(&self, entity: Entity) -> bool {
        self.0.contains(&entity)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.0.iter()
    }
}

/// Contacts raised during the current tick, drained into `Contact` messages
/// by the publish step.
#[derive(Resource, Default, Debug)]
pub struct TickContacts(pub Vec<Contact>);

impl ContactListener for TickContacts {
    fn notify(&mut self, contact: Contact) {
        self.0.push(contact);
    }
}

/// Running counters reported by the stats logger.
#[derive(Resource, Default, Debug, Clone, Copy)]
pub struct SimStats {
    pub moves_requested: u64,
    pub moves_committed: u64,
    pub contacts: u64,
    pub objects_added: u64,
    pub objects_removed: u64,
}
