use bevy::prelude::*;
use thiserror::Error;

/// Fatal simulation errors.
///
/// These are programming errors in the code around the engine (for example a
/// position changed without going through the registry). Systems propagate
/// them with `?` so the tick stops instead of running on a corrupt index.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SimError {
    #[error("bucket desync: {entity:?} is not recorded in tile cell ({}, {})", .cell.x, .cell.y)]
    BucketDesync { entity: Entity, cell: IVec2 },

    #[error("{entity:?} is live but missing from the tile index")]
    Untracked { entity: Entity },

    #[error("{entity:?} is recorded in tile cell ({}, {}) its box no longer covers", .cell.x, .cell.y)]
    StaleCell { entity: Entity, cell: IVec2 },
}

/// Errors raised while building a level layout.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LevelError {
    #[error("level layout has no rows")]
    Empty,

    #[error("row {row} is {found} tiles wide, expected {expected}")]
    RaggedRow { row: usize, expected: usize, found: usize },

    #[error("unknown tile symbol {symbol:?} at ({x}, {y})")]
    UnknownSymbol { symbol: char, x: usize, y: usize },

    #[error("tile shift {0} is out of range (1..=12)")]
    BadTileShift(u32),
}
