use std::path::Path;

use glam::Vec2;

use crate::colliders::{ColliderDesc, ColliderId};
use crate::error::CollisionError;
use crate::types::*;

/// Public API contract for a tile/segment collision world.
///
/// One world per loaded level. Call order per fixed tick: producers register
/// temporary surfaces, `update_temporary_surfaces` runs once, then any number of
/// queries.
pub trait CollisionWorldApi {
    /// Construct an empty world (no segment data, empty grid).
    fn new(cfg: CollisionConfig) -> Self
    where
        Self: Sized;

    // --- Level lifecycle ---------------------------------------------------

    /// Load per-tile segment data from a JSON file. On failure the error is
    /// logged, the registry is left unchanged and `false` is returned; queries
    /// keep working in AABB mode.
    fn load_collision_data(&mut self, path: impl AsRef<Path>) -> bool;

    /// Replace the live tile grid wholesale (row-major `tiles`).
    fn set_tile_collision(
        &mut self,
        tiles: Vec<TileId>,
        width: usize,
        height: usize,
        tile_width: f32,
        tile_height: f32,
    ) -> Result<(), CollisionError>;

    /// Clear grid, colliders and temporary surfaces (level teardown).
    /// Segment data is kept.
    fn reset(&mut self);

    // --- Temporary surfaces -------------------------------------------------

    /// Queue a world-space surface for the next tick.
    fn add_temporary_surface(&mut self, segment: LineSegment, owner: OwnerId);

    /// Publish queued surfaces to ray casts and start an empty queue.
    fn update_temporary_surfaces(&mut self);

    // --- Queries -------------------------------------------------------------

    /// Closest surface along `start..end`. With `direction`, only surfaces facing
    /// it are considered; `exclude_owner` skips that owner's temporary surfaces.
    fn cast_ray(
        &self,
        start: Vec2,
        end: Vec2,
        direction: Option<Vec2>,
        exclude_owner: Option<OwnerId>,
    ) -> Option<RayHit>;

    /// Classify ground/ceiling/wall contact for a moving box. Vertical probes
    /// span the body, so a contact may lie well inside it (deep landing, or a
    /// platform crossing the torso).
    fn check_tile_collision(&self, bounds: Rect, velocity: Vec2) -> TileCollisionResult;

    /// New `y` if the box can step or climb onto the surface ahead.
    fn check_slope_climb(&self, bounds: Rect, velocity_x: f32, max_step_height: f32) -> Option<f32>;

    // --- Objects -----------------------------------------------------------

    fn register_collider(&mut self, desc: ColliderDesc) -> Result<ColliderId, CollisionError>;

    fn unregister_collider(&mut self, id: ColliderId) -> bool;

    /// Other active colliders overlapping `id`.
    fn check_object_collision(&self, id: ColliderId) -> Vec<ColliderId>;
}

/// Primitive intersection signatures.
pub trait NarrowphaseApi {
    /// Intersection point of two finite segments; `None` when parallel or
    /// degenerate (`|det| < eps`) or when they miss within their extents.
    fn segment_intersect(a0: Vec2, a1: Vec2, b0: Vec2, b1: Vec2, eps: f32) -> Option<Vec2>;

    /// Per-axis penetration depth of two boxes, `None` unless strictly overlapping.
    fn overlap_rect_rect(a: Rect, b: Rect) -> Option<Vec2>;

    fn rects_intersect(a: Rect, b: Rect) -> bool;
}
