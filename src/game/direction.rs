use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::f32::consts::{FRAC_PI_2, PI};

/// One of the four grid directions, or no direction at all.
///
/// Each direction carries a unit step vector in screen space (y grows
/// downwards) and a display angle in radians measured from "up".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    Up,
    Down,
    Left,
    Right,
    None,
}

impl Direction {
    /// All directions in id order, `None` last.
    pub const ALL: [Direction; 5] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
        Direction::None,
    ];

    pub fn id(self) -> i32 {
        match self {
            Direction::Up => 0,
            Direction::Down => 1,
            Direction::Left => 2,
            Direction::Right => 3,
            Direction::None => -1,
        }
    }

    pub fn vector(self) -> IVec2 {
        match self {
            Direction::Up => IVec2::new(0, -1),
            Direction::Down => IVec2::new(0, 1),
            Direction::Left => IVec2::new(-1, 0),
            Direction::Right => IVec2::new(1, 0),
            Direction::None => IVec2::ZERO,
        }
    }

    pub fn angle(self) -> f32 {
        match self {
            Direction::Up | Direction::None => 0.0,
            Direction::Down => PI,
            Direction::Left => FRAC_PI_2,
            Direction::Right => 3.0 * FRAC_PI_2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Direction::Up => "NORTH",
            Direction::Down => "SOUTH",
            Direction::Left => "WEST",
            Direction::Right => "EAST",
            Direction::None => "NONE",
        }
    }

    pub fn opposite(self) -> Direction {
        Direction::from_vector(-self.vector())
    }

    /// Next direction clockwise on screen; `None` stays `None`.
    pub fn clockwise(self) -> Direction {
        match self {
            Direction::Up => Direction::Right,
            Direction::Right => Direction::Down,
            Direction::Down => Direction::Left,
            Direction::Left => Direction::Up,
            Direction::None => Direction::None,
        }
    }

    /// Direction whose unit vector equals `vector`; anything else maps to `None`.
    pub fn from_vector(vector: IVec2) -> Direction {
        Direction::ALL
            .into_iter()
            .find(|dir| dir.vector() == vector)
            .unwrap_or(Direction::None)
    }
}
