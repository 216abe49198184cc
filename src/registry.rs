use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use glam::Vec2;
use serde::Deserialize;

use crate::error::CollisionError;
use crate::types::{CollisionTile, LineSegment, TileId};

/// File versions this loader understands.
pub const SUPPORTED_VERSION: u32 = 1;

// --- File format -------------------------------------------------------------

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CollisionFile {
    version: u32,
    tile_count: usize,
    tiles: BTreeMap<String, TileRecord>,
}

#[derive(Deserialize)]
struct TileRecord {
    index: TileId,
    segments: Vec<SegmentRecord>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SegmentRecord {
    start_x: f32,
    start_y: f32,
    end_x: f32,
    end_y: f32,
    normal_x: f32,
    normal_y: f32,
}

impl SegmentRecord {
    fn into_segment(self, tile: TileId) -> Result<LineSegment, CollisionError> {
        let start = Vec2::new(self.start_x, self.start_y);
        let end = Vec2::new(self.end_x, self.end_y);
        let raw_normal = Vec2::new(self.normal_x, self.normal_y);
        if !(start.is_finite() && end.is_finite() && raw_normal.is_finite()) {
            return Err(CollisionError::InvalidSegment { tile, reason: "non-finite value" });
        }
        let len = raw_normal.length();
        if len < 1e-6 {
            return Err(CollisionError::InvalidSegment { tile, reason: "zero normal" });
        }
        if (len - 1.0).abs() > 1e-3 {
            log::warn!("Tile {tile}: normalizing non-unit normal ({}, {})", raw_normal.x, raw_normal.y);
        }
        Ok(LineSegment::new(start, end, raw_normal / len))
    }
}

// --- Registry ----------------------------------------------------------------

/// Tile-type index to segment geometry. Built once per data file, read-only after.
#[derive(Clone, Debug, Default)]
pub struct TileCollisionRegistry {
    tiles: HashMap<TileId, CollisionTile>,
    segment_count: usize,
}

impl TileCollisionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// True once segment data has been loaded; false means AABB mode.
    pub fn is_loaded(&self) -> bool {
        !self.tiles.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn segment_count(&self) -> usize {
        self.segment_count
    }

    pub fn tile(&self, index: TileId) -> Option<&CollisionTile> {
        self.tiles.get(&index)
    }

    pub fn contains(&self, index: TileId) -> bool {
        self.tiles.contains_key(&index)
    }

    /// Segments for a tile type, empty when unknown.
    pub fn segments(&self, index: TileId) -> &[LineSegment] {
        self.tiles.get(&index).map(|t| t.segments.as_slice()).unwrap_or(&[])
    }

    pub fn clear(&mut self) {
        self.tiles.clear();
        self.segment_count = 0;
    }

    /// Add or replace one tile type.
    pub fn insert(&mut self, tile: CollisionTile) {
        self.segment_count += tile.segments.len();
        if let Some(old) = self.tiles.insert(tile.index, tile) {
            self.segment_count -= old.segments.len();
        }
    }

    /// Parse collision data and replace the registry contents. The registry is
    /// untouched on error. Returns the number of tile types loaded.
    pub fn load_from_str(&mut self, json: &str) -> Result<usize, CollisionError> {
        let file: CollisionFile = serde_json::from_str(json)?;
        self.install(file)
    }

    pub fn load_from_reader<R: Read>(&mut self, reader: R) -> Result<usize, CollisionError> {
        let file: CollisionFile = serde_json::from_reader(reader)?;
        self.install(file)
    }

    pub fn load_from_path(&mut self, path: impl AsRef<Path>) -> Result<usize, CollisionError> {
        let file = File::open(path.as_ref())?;
        self.load_from_reader(BufReader::new(file))
    }

    fn install(&mut self, file: CollisionFile) -> Result<usize, CollisionError> {
        if file.version != SUPPORTED_VERSION {
            log::warn!("Collision data version {} (expected {SUPPORTED_VERSION}); loading anyway", file.version);
        }
        if file.tile_count != file.tiles.len() {
            log::warn!("Collision data declares {} tiles but contains {}", file.tile_count, file.tiles.len());
        }

        // Build fully before swapping in so a bad segment leaves us unchanged.
        let mut next = TileCollisionRegistry::new();
        for (key, record) in file.tiles {
            if key.parse::<TileId>().ok() != Some(record.index) {
                log::warn!("Tile key {key:?} does not match index {}; using index", record.index);
            }
            let index = record.index;
            let segments = record
                .segments
                .into_iter()
                .map(|s| s.into_segment(index))
                .collect::<Result<Vec<_>, _>>()?;
            next.insert(CollisionTile { index, segments });
        }

        *self = next;
        log::info!("Loaded collision data: {} tile types, {} segments", self.len(), self.segment_count);
        Ok(self.len())
    }
}
