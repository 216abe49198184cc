use glam::Vec2;

use crate::error::CollisionError;
use crate::types::{Rect, TileId};

/// Live tile index array of the current level.
#[derive(Clone, Debug, Default)]
pub struct WorldGrid {
    tiles: Vec<TileId>,
    width: usize,
    height: usize,
    tile_width: f32,
    tile_height: f32,
}

impl WorldGrid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the grid wholesale. The grid is unchanged on error.
    pub fn set_tiles(
        &mut self,
        tiles: Vec<TileId>,
        width: usize,
        height: usize,
        tile_width: f32,
        tile_height: f32,
    ) -> Result<(), CollisionError> {
        if !(tile_width > 0.0 && tile_height > 0.0 && tile_width.is_finite() && tile_height.is_finite()) {
            return Err(CollisionError::InvalidTileSize { width: tile_width, height: tile_height });
        }
        let expected = width * height;
        if tiles.len() != expected {
            return Err(CollisionError::InvalidGrid { expected, actual: tiles.len() });
        }
        self.tiles = tiles;
        self.width = width;
        self.height = height;
        self.tile_width = tile_width;
        self.tile_height = tile_height;
        log::info!("Tile grid set: {width}x{height} tiles of {tile_width}x{tile_height}");
        Ok(())
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn tile_size(&self) -> Vec2 {
        Vec2::new(self.tile_width, self.tile_height)
    }

    pub fn cell_count(&self) -> usize {
        self.tiles.len()
    }

    /// Tile id at a tile coordinate; `None` when out of range ("no tile").
    pub fn tile_at(&self, tx: i32, ty: i32) -> Option<TileId> {
        if tx < 0 || ty < 0 || tx as usize >= self.width || ty as usize >= self.height {
            return None;
        }
        self.tiles.get(ty as usize * self.width + tx as usize).copied()
    }

    /// Unclamped column containing world `x`.
    #[inline]
    pub fn column_of(&self, x: f32) -> i32 {
        (x / self.tile_width).floor() as i32
    }

    /// Unclamped row containing world `y`.
    #[inline]
    pub fn row_of(&self, y: f32) -> i32 {
        (y / self.tile_height).floor() as i32
    }

    /// Column containing world `x`, clamped into the grid.
    pub fn world_to_tile_column(&self, x: f32) -> i32 {
        clamp_index(self.column_of(x), self.width)
    }

    /// Row containing world `y`, clamped into the grid.
    pub fn world_to_tile_row(&self, y: f32) -> i32 {
        clamp_index(self.row_of(y), self.height)
    }

    /// Clamp a tile coordinate into the grid.
    pub fn clamp_tile(&self, tx: i32, ty: i32) -> (i32, i32) {
        (clamp_index(tx, self.width), clamp_index(ty, self.height))
    }

    /// World-space origin (top-left) of a tile.
    #[inline]
    pub fn tile_origin(&self, tx: i32, ty: i32) -> Vec2 {
        Vec2::new(tx as f32 * self.tile_width, ty as f32 * self.tile_height)
    }

    pub fn tile_bounds(&self, tx: i32, ty: i32) -> Rect {
        let o = self.tile_origin(tx, ty);
        Rect::new(o.x, o.y, self.tile_width, self.tile_height)
    }

    /// World-space extent of the whole grid.
    pub fn world_bounds(&self) -> Rect {
        Rect::new(
            0.0,
            0.0,
            self.width as f32 * self.tile_width,
            self.height as f32 * self.tile_height,
        )
    }

    /// Inclusive clamped tile range `(x0, y0, x1, y1)` covered by a box.
    pub fn tile_range_for_box(&self, bounds: Rect) -> (i32, i32, i32, i32) {
        (
            self.world_to_tile_column(bounds.x),
            self.world_to_tile_row(bounds.y),
            self.world_to_tile_column(bounds.right()),
            self.world_to_tile_row(bounds.bottom()),
        )
    }
}

fn clamp_index(i: i32, len: usize) -> i32 {
    if len == 0 {
        return 0;
    }
    i.clamp(0, len as i32 - 1)
}
