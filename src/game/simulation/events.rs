/// Messages exchanged between the simulation and gameplay.
///
/// Contacts are produced by the movement resolver while a tick runs and are
/// published as `Contact` messages at the end of the tick. Hits flow the other
/// way: gameplay writes `HitObject` and the simulation starts a push.

use bevy::prelude::*;

use crate::game::direction::Direction;
use crate::game::geometry::BoxOwner;
use crate::game::level::TileKind;

// ============================================================================
// Contacts
// ============================================================================

/// Contact notification raised during movement resolution.
///
/// Every object-object contact produces a pair: one addressed to the mover,
/// one to the other party.
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Contact {
    /// The mover's probe overlapped another object.
    Touched { mover: Entity, other: Entity },
    /// `target` was overlapped by a moving object.
    TouchedBy { target: Entity, by: Entity },
    /// The mover's step was rejected by a solid obstacle.
    Blocked { mover: Entity, obstacle: BoxOwner },
    /// The obstacle stopped a moving object.
    Obstructed { obstacle: BoxOwner, by: Entity },
    /// The mover's probe overlapped a tile.
    TileStepped { mover: Entity, cell: IVec2, tile: TileKind },
    /// The mover finished a committed move with its sprite centre on this tile.
    TileLanded { mover: Entity, cell: IVec2, tile: TileKind },
}

impl Contact {
    /// The entity this notification is addressed to, if it is an object.
    pub fn recipient(&self) -> Option<Entity> {
        match *self {
            Contact::Touched { mover, .. }
            | Contact::Blocked { mover, .. }
            | Contact::TileStepped { mover, .. }
            | Contact::TileLanded { mover, .. } => Some(mover),
            Contact::TouchedBy { target, .. } => Some(target),
            Contact::Obstructed { obstacle, .. } => obstacle.entity(),
        }
    }
}

// ============================================================================
// Hits
// ============================================================================

/// What dealt a hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HitKind {
    Entity,
    Weapon,
    #[default]
    World,
    Projectile,
    Other,
}

/// Push/hit descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HitSource {
    pub direction: Direction,
    pub power: i32,
    pub creator: Option<Entity>,
    pub kind: HitKind,
}

impl HitSource {
    pub fn new(direction: Direction, power: i32, kind: HitKind) -> Self {
        Self { direction, power, creator: None, kind }
    }

    pub fn created_by(mut self, creator: Entity) -> Self {
        self.creator = Some(creator);
        self
    }
}

/// Request to hit (and possibly push) an object.
#[derive(Message, Debug, Clone, Copy)]
pub struct HitObject {
    pub target: Entity,
    pub source: HitSource,
}
