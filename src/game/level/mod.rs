use bevy::prelude::*;

use crate::game::error::LevelError;
use crate::game::geometry::Aabb;

mod tiles;

pub use tiles::{MoverClass, TileKind};

/// Smallest and largest supported tile shift (2 to 4096 pixel tiles).
pub const MIN_TILE_SHIFT: u32 = 1;
pub const MAX_TILE_SHIFT: u32 = 12;

/// Tile grid of the current level.
///
/// Tiles are square with a side of `1 << tile_shift` pixels. Every pixel to
/// tile conversion goes through the shift, so pixel `(x, y)` lives in cell
/// `(x >> shift, y >> shift)`.
#[derive(Resource, Debug, Clone)]
pub struct Level {
    width: i32,
    height: i32,
    tile_shift: u32,
    tiles: Vec<TileKind>,
}

impl Default for Level {
    fn default() -> Self {
        Self::new(16, 16, 6, TileKind::Grass)
    }
}

impl Level {
    /// Level of `width` x `height` tiles filled with `fill`. Sizes below one
    /// tile and tile shifts outside the supported range are clamped.
    pub fn new(width: i32, height: i32, tile_shift: u32, fill: TileKind) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let clamped = tile_shift.clamp(MIN_TILE_SHIFT, MAX_TILE_SHIFT);
        if clamped != tile_shift {
            warn!("[LEVEL] Tile shift {} out of range, using {}", tile_shift, clamped);
        }
        let tile_shift = clamped;
        Self {
            width,
            height,
            tile_shift,
            tiles: vec![fill; (width * height) as usize],
        }
    }

    /// Build a level from a text layout, one string per row.
    ///
    /// Symbols: `.` grass, `,` dirt, `=` bridge, ` ` void, `~` water,
    /// `R` rock, `#` brick, `D` door, `G` gate, `f` fence, `T` tree.
    pub fn from_rows(rows: &[&str], tile_shift: u32) -> Result<Level, LevelError> {
        if !(MIN_TILE_SHIFT..=MAX_TILE_SHIFT).contains(&tile_shift) {
            return Err(LevelError::BadTileShift(tile_shift));
        }
        let first = rows.first().ok_or(LevelError::Empty)?;
        let width = first.chars().count();
        if width == 0 {
            return Err(LevelError::Empty);
        }

        let mut tiles = Vec::with_capacity(width * rows.len());
        for (y, row) in rows.iter().enumerate() {
            let found = row.chars().count();
            if found != width {
                return Err(LevelError::RaggedRow { row: y, expected: width, found });
            }
            for (x, symbol) in row.chars().enumerate() {
                let tile = TileKind::from_symbol(symbol)
                    .ok_or(LevelError::UnknownSymbol { symbol, x, y })?;
                tiles.push(tile);
            }
        }

        Ok(Level {
            width: width as i32,
            height: rows.len() as i32,
            tile_shift,
            tiles,
        })
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn tile_shift(&self) -> u32 {
        self.tile_shift
    }

    pub fn tile_size(&self) -> i32 {
        1 << self.tile_shift
    }

    pub fn pixel_width(&self) -> i32 {
        self.width << self.tile_shift
    }

    pub fn pixel_height(&self) -> i32 {
        self.height << self.tile_shift
    }

    pub fn is_valid(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.width && y < self.height
    }

    /// Tile at `(x, y)`; `None` outside the grid.
    pub fn tile_at(&self, x: i32, y: i32) -> Option<TileKind> {
        self.is_valid(x, y)
            .then(|| self.tiles[(y * self.width + x) as usize])
    }

    /// Replace a tile. Returns false outside the grid.
    pub fn set_tile(&mut self, x: i32, y: i32, tile: TileKind) -> bool {
        if !self.is_valid(x, y) {
            return false;
        }
        let idx = (y * self.width + x) as usize;
        self.tiles[idx] = tile;
        true
    }

    /// Cell containing pixel `point`.
    pub fn cell_of(&self, point: IVec2) -> IVec2 {
        IVec2::new(point.x >> self.tile_shift, point.y >> self.tile_shift)
    }

    /// Collision box of the tile at `cell` as seen by `class`.
    pub fn box_for(&self, cell: IVec2, class: MoverClass) -> Option<Aabb> {
        self.tile_at(cell.x, cell.y)
            .map(|tile| tile.box_for(cell, self.tile_size(), class))
    }

    /// Number of tiles of each kind, for the startup summary.
    pub fn count(&self, kind: TileKind) -> usize {
        self.tiles.iter().filter(|&&t| t == kind).count()
    }
}
