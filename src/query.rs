use glam::Vec2;

use crate::api::NarrowphaseApi;
use crate::grid::WorldGrid;
use crate::narrowphase::Narrowphase;
use crate::raycast::RayCaster;
use crate::registry::TileCollisionRegistry;
use crate::types::*;

/// Probe-based queries over one tick's collision state.
pub struct TileQuery<'a> {
    pub caster: RayCaster<'a>,
    pub cfg: &'a CollisionConfig,
}

impl<'a> TileQuery<'a> {
    pub fn new(
        cfg: &'a CollisionConfig,
        registry: &'a TileCollisionRegistry,
        grid: &'a WorldGrid,
        surfaces: &'a [LineSegment],
    ) -> Self {
        Self { caster: RayCaster { registry, grid, surfaces, eps: cfg.intersect_epsilon }, cfg }
    }

    #[inline]
    pub(crate) fn registry(&self) -> &'a TileCollisionRegistry {
        self.caster.registry
    }

    #[inline]
    pub(crate) fn grid(&self) -> &'a WorldGrid {
        self.caster.grid
    }

    /// Solid for the AABB paths: known to the registry, or any positive id when
    /// no segment data is loaded.
    pub fn is_solid(&self, id: TileId) -> bool {
        if self.registry().is_loaded() { self.registry().contains(id) } else { id > 0 }
    }

    /// Ground/ceiling/wall classification for a box moving with `velocity`.
    ///
    /// Ground and ceiling probes run through the whole body, starting
    /// `probe_length` inside the opposite edge, so a box that sank into a floor
    /// still finds its top. The flip side: a surface crossing the torso (a
    /// platform passing a standing body) also reports contact, possibly far from
    /// the feet. Callers that snap to `ground_contact` should cap the snap
    /// distance if that matters.
    pub fn check_tile_collision(&self, bounds: Rect, velocity: Vec2) -> TileCollisionResult {
        if !self.registry().is_loaded() {
            return self.check_aabb_fallback(bounds, velocity);
        }

        let cfg = self.cfg;
        let p = cfg.probe_length;
        let mut out = TileCollisionResult::default();

        // Vertical probes span the body so a deep landing still finds the surface.
        let reach = p.min(bounds.h * 0.5);
        let inset = cfg.edge_probe_inset.min(bounds.w * 0.5);
        let columns = [bounds.center().x, bounds.x + inset, bounds.right() - inset];

        if velocity.y >= 0.0 {
            for x in columns {
                let hit = self.probe(Vec2::new(x, bounds.y + reach), Vec2::new(x, bounds.bottom() + p), Vec2::Y);
                if let Some(hit) = hit.filter(|h| h.normal.y < cfg.ground_normal_threshold) {
                    out.grounded = true;
                    out.ground_contact = Some(hit.point);
                    out.offer_normal(hit.normal);
                    break;
                }
            }
        }

        if velocity.y <= 0.0 {
            for x in columns {
                let hit = self.probe(Vec2::new(x, bounds.bottom() - reach), Vec2::new(x, bounds.y - p), -Vec2::Y);
                if let Some(hit) = hit.filter(|h| h.normal.y > cfg.ceiling_normal_threshold) {
                    out.ceiling = true;
                    out.ceiling_contact = Some(hit.point);
                    out.offer_normal(hit.normal);
                    break;
                }
            }
        }

        if velocity.x <= 0.0 {
            if let Some(hit) = self.wall_probe(bounds, -1.0) {
                out.left_wall = true;
                out.left_contact = Some(hit.point);
                out.offer_normal(hit.normal);
            }
        }

        if velocity.x >= 0.0 {
            if let Some(hit) = self.wall_probe(bounds, 1.0) {
                out.right_wall = true;
                out.right_contact = Some(hit.point);
                out.offer_normal(hit.normal);
            }
        }

        out
    }

    /// Horizontal probes on one side (`side` = -1 left, +1 right): body centre
    /// line first, then just above the foot line.
    pub(crate) fn wall_probe(&self, bounds: Rect, side: f32) -> Option<RayHit> {
        let cfg = self.cfg;
        let cx = bounds.center().x;
        let edge = if side > 0.0 { bounds.right() } else { bounds.x };
        let tip = edge + side * cfg.probe_length;
        let rows = [bounds.center().y, bounds.bottom() - cfg.wall_probe_raise];
        rows.into_iter().find_map(|y| {
            self.probe(Vec2::new(cx, y), Vec2::new(tip, y), Vec2::new(side, 0.0))
                .filter(|h| -side * h.normal.x > cfg.wall_normal_threshold)
        })
    }

    #[inline]
    fn probe(&self, start: Vec2, end: Vec2, direction: Vec2) -> Option<RayHit> {
        self.caster.cast(start, end, Some(direction), None)
    }

    /// Box-vs-solid-tile classification used when no segment data is loaded.
    pub fn check_aabb_fallback(&self, bounds: Rect, velocity: Vec2) -> TileCollisionResult {
        let mut out = TileCollisionResult::default();
        let grid = self.grid();
        if grid.is_empty() {
            return out;
        }

        // Same reach as the probes: touching within `probe_length` counts.
        let probe = bounds.expand(self.cfg.probe_length);
        let c = bounds.center();
        let (x0, y0, x1, y1) = grid.tile_range_for_box(probe);
        for ty in y0..=y1 {
            for tx in x0..=x1 {
                let Some(id) = grid.tile_at(tx, ty) else { continue };
                if !self.is_solid(id) {
                    continue;
                }
                let tile = grid.tile_bounds(tx, ty);
                let Some(depth) = Narrowphase::overlap_rect_rect(probe, tile) else { continue };
                let tc = tile.center();

                // Faces shared with a solid neighbour are internal seams, not walls or floors.
                let side_x = if c.x < tc.x { -1 } else { 1 };
                let side_y = if c.y < tc.y { -1 } else { 1 };
                let x_internal = grid.tile_at(tx + side_x, ty).is_some_and(|n| self.is_solid(n));
                let y_internal = grid.tile_at(tx, ty + side_y).is_some_and(|n| self.is_solid(n));
                let resolve_y = match (x_internal, y_internal) {
                    (true, true) => continue,
                    (true, false) => true,
                    (false, true) => false,
                    (false, false) if (depth.x - depth.y).abs() < self.cfg.fallback_tie_threshold => {
                        velocity.y.abs() >= velocity.x.abs()
                    }
                    (false, false) => depth.y < depth.x,
                };
                if resolve_y {
                    if c.y < tc.y {
                        if velocity.y >= 0.0 && !out.grounded {
                            out.grounded = true;
                            out.ground_contact = Some(Vec2::new(c.x, tile.y));
                        }
                    } else if velocity.y <= 0.0 && !out.ceiling {
                        out.ceiling = true;
                        out.ceiling_contact = Some(Vec2::new(c.x, tile.bottom()));
                    }
                } else if c.x < tc.x {
                    if velocity.x >= 0.0 && !out.right_wall {
                        out.right_wall = true;
                        out.right_contact = Some(Vec2::new(tile.x, c.y));
                    }
                } else if velocity.x <= 0.0 && !out.left_wall {
                    out.left_wall = true;
                    out.left_contact = Some(Vec2::new(tile.right(), c.y));
                }
            }
        }

        let normals = [
            (out.grounded, Vec2::new(0.0, -1.0)),
            (out.ceiling, Vec2::new(0.0, 1.0)),
            (out.left_wall, Vec2::new(1.0, 0.0)),
            (out.right_wall, Vec2::new(-1.0, 0.0)),
        ];
        out.normal = normals.into_iter().find(|(set, _)| *set).map(|(_, n)| n);
        out
    }

    /// Any solid tile strictly overlapping `bounds`. Valid with or without
    /// segment data; solidity follows `is_solid`.
    pub fn overlaps_solid(&self, bounds: Rect) -> bool {
        let grid = self.grid();
        if grid.is_empty() {
            return false;
        }
        let (x0, y0, x1, y1) = grid.tile_range_for_box(bounds);
        (y0..=y1).any(|ty| {
            (x0..=x1).any(|tx| {
                grid.tile_at(tx, ty).is_some_and(|id| self.is_solid(id))
                    && Narrowphase::rects_intersect(bounds, grid.tile_bounds(tx, ty))
            })
        })
    }
}
