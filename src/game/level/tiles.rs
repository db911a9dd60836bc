use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::game::geometry::Aabb;

/// How a moving object interacts with static tile geometry.
///
/// Tiles may present a different solidity and a different shape to each
/// class; an arrow flies over water that stops a walker, and sees more of a
/// fence than a walker's feet do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MoverClass {
    #[default]
    Ground,
    Flying,
    Projectile,
}

/// Static content of a tile cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TileKind {
    #[default]
    Grass,
    Dirt,
    Bridge,
    Void,
    Water,
    Rock,
    Brick,
    Door,
    Gate,
    Fence,
    Tree,
}

impl TileKind {
    pub fn symbol(self) -> char {
        match self {
            TileKind::Grass => '.',
            TileKind::Dirt => ',',
            TileKind::Bridge => '=',
            TileKind::Void => ' ',
            TileKind::Water => '~',
            TileKind::Rock => 'R',
            TileKind::Brick => '#',
            TileKind::Door => 'D',
            TileKind::Gate => 'G',
            TileKind::Fence => 'f',
            TileKind::Tree => 'T',
        }
    }

    pub fn from_symbol(symbol: char) -> Option<TileKind> {
        Some(match symbol {
            '.' => TileKind::Grass,
            ',' => TileKind::Dirt,
            '=' => TileKind::Bridge,
            ' ' => TileKind::Void,
            '~' => TileKind::Water,
            'R' => TileKind::Rock,
            '#' => TileKind::Brick,
            'D' => TileKind::Door,
            'G' => TileKind::Gate,
            'f' => TileKind::Fence,
            'T' => TileKind::Tree,
            _ => return None,
        })
    }

    pub fn is_solid_to(self, class: MoverClass) -> bool {
        match self {
            TileKind::Grass | TileKind::Dirt | TileKind::Bridge | TileKind::Void => false,
            TileKind::Water => class == MoverClass::Ground,
            TileKind::Rock
            | TileKind::Brick
            | TileKind::Door
            | TileKind::Gate
            | TileKind::Fence
            | TileKind::Tree => true,
        }
    }

    /// Collision shape of this tile at `cell` as seen by `class`.
    ///
    /// Insets are expressed in 64ths of a tile so the shapes scale with the
    /// level's tile size.
    pub fn box_for(self, cell: IVec2, tile_size: i32, class: MoverClass) -> Aabb {
        let projectile = class == MoverClass::Projectile;
        match self {
            // Ground movers collide with the post bases only; arrows are
            // stopped by the whole fence body.
            TileKind::Fence if projectile => inset(cell, tile_size, 0, 6, 0, 6),
            TileKind::Fence => inset(cell, tile_size, 0, 15, 0, 6),
            TileKind::Gate if projectile => inset(cell, tile_size, 0, 0, 0, 10),
            TileKind::Gate => inset(cell, tile_size, 0, 15, 0, 10),
            TileKind::Tree if projectile => inset(cell, tile_size, 8, 20, 10, 4),
            TileKind::Tree => inset(cell, tile_size, 8, 20, 10, 0),
            _ => Aabb::from_tile(cell, tile_size),
        }
    }
}

fn inset(cell: IVec2, tile_size: i32, left: i32, top: i32, right: i32, bottom: i32) -> Aabb {
    let full = Aabb::from_tile(cell, tile_size);
    let scale = |n: i32| n * tile_size / 64;
    Aabb {
        left: full.left + scale(left),
        top: full.top + scale(top),
        right: full.right - scale(right),
        bottom: full.bottom - scale(bottom),
        owner: full.owner,
    }
}
