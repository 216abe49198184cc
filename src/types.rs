use glam::Vec2;
use serde::Deserialize;

use crate::error::CollisionError;
use crate::narrowphase::INTERSECT_EPSILON;

/// Tile-type index shared with the tilemap. `0` and negative ids are empty.
pub type TileId = i32;

/// Opaque owner handle for temporary surfaces (e.g. a moving platform's entity id).
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OwnerId(pub u64);

/// A directed line with an outward normal, the atomic unit of collidable geometry.
///
/// Stored tile-local (0..tile size) in the registry, world-space when it lives in
/// the temporary surface buffer.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LineSegment {
    pub start: Vec2,
    pub end: Vec2,
    /// Unit vector pointing away from the solid side.
    pub normal: Vec2,
    pub owner: Option<OwnerId>,
}

impl LineSegment {
    pub fn new(start: Vec2, end: Vec2, normal: Vec2) -> Self {
        Self { start, end, normal, owner: None }
    }

    /// Back-face rule: a ray moving along `dir` is only stopped by a surface facing it.
    #[inline]
    pub fn faces(&self, dir: Vec2) -> bool {
        self.normal.dot(dir) < 0.0
    }

    /// Same segment shifted by `offset` (tile-local to world).
    #[inline]
    pub fn translated(&self, offset: Vec2) -> Self {
        Self { start: self.start + offset, end: self.end + offset, ..*self }
    }
}

/// Collision geometry of one tile type. Immutable once loaded.
#[derive(Clone, Debug, Default)]
pub struct CollisionTile {
    pub index: TileId,
    pub segments: Vec<LineSegment>,
}

impl CollisionTile {
    /// Solid `w` x `h` box: four outward-facing edges, top edge first.
    pub fn full_square(index: TileId, w: f32, h: f32) -> Self {
        let seg = |sx, sy, ex, ey, nx, ny| LineSegment::new(Vec2::new(sx, sy), Vec2::new(ex, ey), Vec2::new(nx, ny));
        Self {
            index,
            segments: vec![
                seg(0.0, 0.0, w, 0.0, 0.0, -1.0),
                seg(w, 0.0, w, h, 1.0, 0.0),
                seg(w, h, 0.0, h, 0.0, 1.0),
                seg(0.0, h, 0.0, 0.0, -1.0, 0.0),
            ],
        }
    }
}

/// Closest hit reported by a ray cast.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RayHit {
    /// World-space contact point.
    pub point: Vec2,
    pub normal: Vec2,
    /// Tile that produced the hit, `None` for temporary surfaces.
    pub tile: Option<(i32, i32)>,
    /// Owner of the temporary surface that produced the hit.
    pub owner: Option<OwnerId>,
}

/// Axis-aligned box in world units, `(x, y)` is the top-left corner (y grows down).
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    #[inline]
    pub fn min(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    #[inline]
    pub fn max(&self) -> Vec2 {
        Vec2::new(self.x + self.w, self.y + self.h)
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.w * 0.5, self.y + self.h * 0.5)
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    /// Grow on every side by `amount`.
    pub fn expand(&self, amount: f32) -> Self {
        Self {
            x: self.x - amount,
            y: self.y - amount,
            w: self.w + amount * 2.0,
            h: self.h + amount * 2.0,
        }
    }
}

/// Per-query classification returned by `check_tile_collision`. Not persisted.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct TileCollisionResult {
    pub grounded: bool,
    pub ceiling: bool,
    pub left_wall: bool,
    pub right_wall: bool,
    /// First normal found, in ground, ceiling, left, right order.
    pub normal: Option<Vec2>,
    pub ground_contact: Option<Vec2>,
    pub ceiling_contact: Option<Vec2>,
    pub left_contact: Option<Vec2>,
    pub right_contact: Option<Vec2>,
}

impl TileCollisionResult {
    pub fn any(&self) -> bool {
        self.grounded || self.ceiling || self.left_wall || self.right_wall
    }

    /// Record `normal` unless an earlier probe already did.
    pub(crate) fn offer_normal(&mut self, normal: Vec2) {
        if self.normal.is_none() {
            self.normal = Some(normal);
        }
    }
}

/// Tunables for probes, classification thresholds and the fallback path.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct CollisionConfig {
    /// How far probes reach past the box edge.
    pub probe_length: f32,
    /// Ground when `normal.y` is below this.
    pub ground_normal_threshold: f32,
    /// Ceiling when `normal.y` is above this.
    pub ceiling_normal_threshold: f32,
    /// Wall when `|normal.x|` exceeds this.
    pub wall_normal_threshold: f32,
    /// Distance of the side ground/ceiling probes from each box edge.
    pub edge_probe_inset: f32,
    /// Height of the secondary wall probe above the foot line.
    pub wall_probe_raise: f32,
    /// Overlap difference under which the AABB fallback defers to velocity.
    pub fallback_tie_threshold: f32,
    /// Step size of the fallback step search.
    pub fallback_step_increment: f32,
    /// Minimum `|normal.x|` for a surface to count as a slope.
    pub slope_normal_x_min: f32,
    /// Near-floor threshold used by the diagonal slope probe.
    pub slope_floor_threshold: f32,
    /// Determinant epsilon for segment intersection.
    pub intersect_epsilon: f32,
    pub max_colliders: usize,
}

impl Default for CollisionConfig {
    fn default() -> Self {
        Self {
            probe_length: 2.0,
            ground_normal_threshold: -0.3,
            ceiling_normal_threshold: 0.3,
            wall_normal_threshold: 0.7,
            edge_probe_inset: 4.0,
            wall_probe_raise: 8.0,
            fallback_tie_threshold: 2.0,
            fallback_step_increment: 1.0,
            slope_normal_x_min: 0.1,
            slope_floor_threshold: -0.5,
            intersect_epsilon: INTERSECT_EPSILON,
            max_colliders: 256,
        }
    }
}

impl CollisionConfig {
    /// Parse a (possibly partial) JSON object; missing fields keep their defaults.
    pub fn from_json_str(s: &str) -> Result<Self, CollisionError> {
        Ok(serde_json::from_str(s)?)
    }
}

/// Debug statistics for the current collision world.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct WorldStats {
    pub tile_types: usize,
    pub segments: usize,
    pub grid_cells: usize,
    pub active_surfaces: usize,
    pub pending_surfaces: usize,
    pub colliders: usize,
}
