use thiserror::Error;

use crate::types::TileId;

/// Errors surfaced by loading and bookkeeping operations.
///
/// Geometry queries never fail: degenerate segments and out-of-range tiles are
/// simply "no hit".
#[derive(Error, Debug)]
pub enum CollisionError {
    /// Reading collision data failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed JSON or a schema mismatch.
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Segment data that cannot be used (non-finite coordinates, zero normal).
    #[error("Invalid segment in tile {tile}: {reason}")]
    InvalidSegment { tile: TileId, reason: &'static str },

    /// Tile array length does not match `width * height`.
    #[error("Invalid grid: expected {expected} tiles, got {actual}")]
    InvalidGrid { expected: usize, actual: usize },

    /// Tile dimensions must be positive and finite.
    #[error("Invalid tile size: {width}x{height}")]
    InvalidTileSize { width: f32, height: f32 },

    /// Collider list is full.
    #[error("Collider capacity of {0} reached")]
    ColliderCapacity(usize),
}
