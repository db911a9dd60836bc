/// Component definitions for the simulation layer.
///
/// A movable object is an entity carrying a position, a hit box, a collision
/// body and optionally facing and push state. Bucket membership is not stored
/// here; the tile index owns it.

use bevy::prelude::*;

use crate::game::direction::Direction;
use crate::game::geometry::{Aabb, BoxOwner};
use crate::game::level::MoverClass;
use crate::game::simulation::events::HitSource;

// ============================================================================
// Position & Shape Components
// ============================================================================

/// Top-left pixel of the object's sprite in level space.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimPosition(pub IVec2);

/// How the collision box is derived from the sprite rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitShape {
    /// Sprite centre plus/minus `radius` on each axis.
    Centered { radius: IVec2 },
    /// Sprite rectangle shrunk by the given margins.
    Inset { left: i32, top: i32, right: i32, bottom: i32 },
}

/// Sprite size and collision shape of an object.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct HitBox {
    pub size: IVec2,
    pub shape: HitShape,
}

impl Default for HitBox {
    fn default() -> Self {
        Self::centered(IVec2::splat(32), IVec2::splat(8))
    }
}

impl HitBox {
    pub fn centered(size: IVec2, radius: IVec2) -> Self {
        Self { size, shape: HitShape::Centered { radius } }
    }

    /// Box covering the whole sprite rectangle.
    pub fn full(size: IVec2) -> Self {
        Self {
            size,
            shape: HitShape::Inset { left: 0, top: 0, right: 0, bottom: 0 },
        }
    }

    pub fn inset(size: IVec2, left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self { size, shape: HitShape::Inset { left, top, right, bottom } }
    }

    /// Sprite centre for an object whose top-left pixel is `position`.
    pub fn sprite_center(&self, position: IVec2) -> IVec2 {
        position + self.size / 2
    }

    /// Collision box at `position`, owned by `entity`.
    pub fn bounding_box(&self, position: IVec2, entity: Entity) -> Aabb {
        let aabb = match self.shape {
            HitShape::Centered { radius } => {
                let c = self.sprite_center(position);
                Aabb::new(c.x - radius.x, c.y - radius.y, c.x + radius.x, c.y + radius.y)
            }
            HitShape::Inset { left, top, right, bottom } => Aabb::new(
                position.x + left,
                position.y + top,
                position.x + self.size.x - 1 - right,
                position.y + self.size.y - 1 - bottom,
            ),
        };
        aabb.owned_by(BoxOwner::Object(entity))
    }
}

/// Direction the object is looking in. Interaction probes extend this way.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Facing(pub Direction);

// ============================================================================
// Collision Components
// ============================================================================

/// Collision layers for filtering
pub mod layers {
    pub const NONE: u32 = 0;
    pub const CREATURE: u32 = 1 << 0;
    pub const PLAYER: u32 = 1 << 1;
    pub const PROJECTILE: u32 = 1 << 2;
    pub const ITEM: u32 = 1 << 3;
    pub const FLYING: u32 = 1 << 4;
    pub const ALL: u32 = u32::MAX;
}

/// Collision identity of an object.
///
/// `layer` is what the object is; `solid_to` is the set of layers it blocks.
/// Blocking is decided by the obstacle: `other.is_solid_to(mover)`.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Body {
    pub layer: u32,
    pub solid_to: u32,
}

impl Default for Body {
    fn default() -> Self {
        Self {
            layer: layers::CREATURE,
            solid_to: layers::CREATURE | layers::PLAYER,
        }
    }
}

impl Body {
    pub fn new(layer: u32, solid_to: u32) -> Self {
        Self { layer, solid_to }
    }

    /// Body that is touched by everything and blocks nothing.
    pub fn ghost(layer: u32) -> Self {
        Self { layer, solid_to: layers::NONE }
    }

    pub fn is_solid_to(&self, mover: &Body) -> bool {
        self.solid_to & mover.layer != 0
    }

    /// How tiles treat this body.
    pub fn mover_class(&self) -> MoverClass {
        if self.layer & layers::PROJECTILE != 0 {
            MoverClass::Projectile
        } else if self.layer & layers::FLYING != 0 {
            MoverClass::Flying
        } else {
            MoverClass::Ground
        }
    }
}

/// Marker for objects gameplay has killed. They are removed from the level at
/// the start of the next tick and ignored by movement until then.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Dead;

// ============================================================================
// Push Components
// ============================================================================

/// Transient linear push, applied once per tick and decayed.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Push {
    pub can_be_pushed: bool,
    pub power: i32,
    pub direction: Direction,
    pub decay_per_tick: i32,
}

impl Default for Push {
    fn default() -> Self {
        Self::with_decay(1)
    }
}

impl Push {
    pub fn with_decay(decay_per_tick: i32) -> Self {
        Self {
            can_be_pushed: true,
            power: 0,
            direction: Direction::None,
            decay_per_tick,
        }
    }

    pub fn immovable() -> Self {
        Self { can_be_pushed: false, ..default() }
    }

    pub fn is_active(&self) -> bool {
        self.power > 0 && self.direction != Direction::None
    }

    /// Start pushing in the direction and with the power of `source`.
    /// Returns false when the object cannot be pushed.
    pub fn start(&mut self, source: &HitSource) -> bool {
        if !self.can_be_pushed {
            return false;
        }
        if source.power < 0 {
            warn!("[PUSH] Negative push power {} from {:?}", source.power, source.kind);
        }
        self.direction = source.direction;
        self.power = source.power;
        true
    }

    /// Displacement for this tick.
    pub fn step(&self) -> IVec2 {
        self.direction.vector() * self.power
    }

    /// Reduce power by the per-tick decay, resetting once it is spent.
    pub fn decay(&mut self) {
        self.power -= self.decay_per_tick;
        if self.power <= 0 {
            self.reset();
        }
    }

    pub fn reset(&mut self) {
        self.power = 0;
        self.direction = Direction::None;
    }
}
