use glam::Vec2;

use crate::api::NarrowphaseApi;
use crate::grid::WorldGrid;
use crate::narrowphase::Narrowphase;
use crate::registry::TileCollisionRegistry;
use crate::types::{LineSegment, OwnerId, RayHit};

/// Ordered walk over every tile a segment crosses, start tile first.
///
/// Steps exactly one axis per tile, so both tiles around a diagonal corner are
/// visited. Rays that stay in one row or column take a straight walk.
pub struct TileWalk {
    cell: (i32, i32),
    end: (i32, i32),
    step: (i32, i32),
    t_max: Vec2,
    t_delta: Vec2,
    straight: bool,
    done: bool,
}

impl TileWalk {
    /// Walk from `start` to `end`, both expected inside the grid's world bounds.
    pub fn new(grid: &WorldGrid, start: Vec2, end: Vec2) -> Self {
        let cell = (grid.world_to_tile_column(start.x), grid.world_to_tile_row(start.y));
        let end_cell = (grid.world_to_tile_column(end.x), grid.world_to_tile_row(end.y));
        let step = ((end_cell.0 - cell.0).signum(), (end_cell.1 - cell.1).signum());
        let straight = step.0 == 0 || step.1 == 0;

        let size = grid.tile_size();
        let d = end - start;
        let axis = |c: i32, step: i32, p: f32, d: f32, size: f32| -> (f32, f32) {
            if step == 0 || d == 0.0 {
                return (f32::INFINITY, f32::INFINITY);
            }
            let boundary = if step > 0 { (c + 1) as f32 * size } else { c as f32 * size };
            ((boundary - p) / d, size / d.abs())
        };
        let (tx, dx) = axis(cell.0, step.0, start.x, d.x, size.x);
        let (ty, dy) = axis(cell.1, step.1, start.y, d.y, size.y);

        Self {
            cell,
            end: end_cell,
            step,
            t_max: Vec2::new(tx, ty),
            t_delta: Vec2::new(dx, dy),
            straight,
            done: false,
        }
    }

    fn advance(&mut self) {
        let x_left = self.cell.0 != self.end.0;
        let y_left = self.cell.1 != self.end.1;
        // Never overshoot an axis that already reached the end tile.
        let step_x = if self.straight || !(x_left && y_left) {
            x_left
        } else {
            self.t_max.x <= self.t_max.y
        };
        if step_x {
            self.cell.0 += self.step.0;
            self.t_max.x += self.t_delta.x;
        } else {
            self.cell.1 += self.step.1;
            self.t_max.y += self.t_delta.y;
        }
    }
}

impl Iterator for TileWalk {
    type Item = (i32, i32);

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let current = self.cell;
        if current == self.end {
            self.done = true;
        } else {
            self.advance();
        }
        Some(current)
    }
}

/// Clip `start..end` to `[min, max]` (slab method). `None` when it misses.
fn clip_segment(start: Vec2, end: Vec2, min: Vec2, max: Vec2) -> Option<(Vec2, Vec2)> {
    let d = end - start;
    let mut t0 = 0.0f32;
    let mut t1 = 1.0f32;
    for (p, dp, lo, hi) in [(start.x, d.x, min.x, max.x), (start.y, d.y, min.y, max.y)] {
        if dp.abs() < f32::EPSILON {
            if p < lo || p > hi {
                return None;
            }
            continue;
        }
        let mut ta = (lo - p) / dp;
        let mut tb = (hi - p) / dp;
        if ta > tb {
            core::mem::swap(&mut ta, &mut tb);
        }
        t0 = t0.max(ta);
        t1 = t1.min(tb);
        if t0 > t1 {
            return None;
        }
    }
    Some((start + d * t0, start + d * t1))
}

/// A straight ray lying exactly on an interior tile boundary touches the tiles on
/// both sides, but the walk only visits the higher-index one. Offset to the other.
fn boundary_twin(grid: &WorldGrid, a: Vec2, b: Vec2) -> Option<(i32, i32)> {
    let size = grid.tile_size();
    let max = grid.world_bounds().max();
    let on_line = |v: f32, size: f32, max: f32| v > 0.0 && v < max && (v / size).fract() == 0.0;
    if a.x == b.x && on_line(a.x, size.x, max.x) {
        Some((-1, 0))
    } else if a.y == b.y && on_line(a.y, size.y, max.y) {
        Some((0, -1))
    } else {
        None
    }
}

/// Nearest valid hit among `segments` for the ray `start..end` (same space).
/// Exact distance ties keep the earlier segment.
pub(crate) fn nearest_segment_hit<'s>(
    segments: &'s [LineSegment],
    start: Vec2,
    end: Vec2,
    direction: Option<Vec2>,
    exclude_owner: Option<OwnerId>,
    eps: f32,
) -> Option<(Vec2, &'s LineSegment)> {
    let mut best: Option<(f32, Vec2, &LineSegment)> = None;
    for seg in segments {
        if exclude_owner.is_some() && seg.owner == exclude_owner {
            continue;
        }
        if let Some(dir) = direction {
            if !seg.faces(dir) {
                continue;
            }
        }
        let Some(p) = Narrowphase::segment_intersect(start, end, seg.start, seg.end, eps) else {
            continue;
        };
        let d2 = (p - start).length_squared();
        match best {
            Some((bd, _, _)) if d2 >= bd => {}
            _ => best = Some((d2, p, seg)),
        }
    }
    best.map(|(_, p, seg)| (p, seg))
}

/// Borrowed view over everything a ray can hit this tick.
///
/// Holds no scratch state, so casts may nest freely.
pub struct RayCaster<'a> {
    pub registry: &'a TileCollisionRegistry,
    pub grid: &'a WorldGrid,
    pub surfaces: &'a [LineSegment],
    pub eps: f32,
}

impl<'a> RayCaster<'a> {
    /// Closest hit from the tile grid and the temporary surfaces. On an exact
    /// distance tie the tile hit wins.
    pub fn cast(
        &self,
        start: Vec2,
        end: Vec2,
        direction: Option<Vec2>,
        exclude_owner: Option<OwnerId>,
    ) -> Option<RayHit> {
        let tile_hit = self.cast_tiles(start, end, direction);
        let surface_hit = self.cast_surfaces(start, end, direction, exclude_owner);
        match (tile_hit, surface_hit) {
            (Some(t), Some(s)) => {
                let dt = (t.point - start).length_squared();
                let ds = (s.point - start).length_squared();
                Some(if ds < dt { s } else { t })
            }
            (t, s) => t.or(s),
        }
    }

    /// Walk the grid and stop at the first tile that yields a hit.
    pub fn cast_tiles(&self, start: Vec2, end: Vec2, direction: Option<Vec2>) -> Option<RayHit> {
        if !self.registry.is_loaded() || self.grid.is_empty() {
            return None;
        }
        // Every tile segment lies inside the world, so clipping loses no hits.
        let bounds = self.grid.world_bounds();
        let (a, b) = clip_segment(start, end, bounds.min(), bounds.max())?;

        let twin = boundary_twin(self.grid, a, b);
        for (tx, ty) in TileWalk::new(self.grid, a, b) {
            let here = self.hit_in_tile(tx, ty, start, end, direction);
            let beside = twin.and_then(|(dx, dy)| self.hit_in_tile(tx + dx, ty + dy, start, end, direction));
            let hit = match (here, beside) {
                (Some(h), Some(o)) => {
                    let dh = (h.point - start).length_squared();
                    let d_o = (o.point - start).length_squared();
                    Some(if d_o < dh { o } else { h })
                }
                (h, o) => h.or(o),
            };
            if hit.is_some() {
                return hit;
            }
        }
        None
    }

    fn hit_in_tile(&self, tx: i32, ty: i32, start: Vec2, end: Vec2, direction: Option<Vec2>) -> Option<RayHit> {
        let id = self.grid.tile_at(tx, ty)?;
        let segments = self.registry.segments(id);
        if segments.is_empty() {
            return None;
        }
        let origin = self.grid.tile_origin(tx, ty);
        let (p, seg) = nearest_segment_hit(segments, start - origin, end - origin, direction, None, self.eps)?;
        Some(RayHit { point: p + origin, normal: seg.normal, tile: Some((tx, ty)), owner: None })
    }

    /// Flat scan of the active temporary surfaces (world space).
    pub fn cast_surfaces(
        &self,
        start: Vec2,
        end: Vec2,
        direction: Option<Vec2>,
        exclude_owner: Option<OwnerId>,
    ) -> Option<RayHit> {
        let (p, seg) = nearest_segment_hit(self.surfaces, start, end, direction, exclude_owner, self.eps)?;
        Some(RayHit { point: p, normal: seg.normal, tile: None, owner: seg.owner })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::narrowphase::INTERSECT_EPSILON;
    use crate::types::CollisionTile;
    use approx::assert_abs_diff_eq;

    const FLOOR: i32 = 1;
    const WALL: i32 = 2;

    fn registry() -> TileCollisionRegistry {
        let mut reg = TileCollisionRegistry::new();
        reg.insert(CollisionTile::full_square(FLOOR, 32.0, 32.0));
        // Only a left face
        reg.insert(CollisionTile {
            index: WALL,
            segments: vec![LineSegment::new(Vec2::new(0.0, 0.0), Vec2::new(0.0, 32.0), Vec2::new(-1.0, 0.0))],
        });
        reg
    }

    fn grid(tiles: Vec<i32>, w: usize, h: usize) -> WorldGrid {
        let mut g = WorldGrid::new();
        g.set_tiles(tiles, w, h, 32.0, 32.0).unwrap();
        g
    }

    fn caster<'a>(reg: &'a TileCollisionRegistry, grid: &'a WorldGrid, surfaces: &'a [LineSegment]) -> RayCaster<'a> {
        RayCaster { registry: reg, grid, surfaces, eps: INTERSECT_EPSILON }
    }

    #[test]
    fn test_walk_horizontal_visits_every_tile() {
        let g = grid(vec![0; 8], 8, 1);
        let cells: Vec<_> = TileWalk::new(&g, Vec2::new(5.0, 10.0), Vec2::new(250.0, 10.0)).collect();
        assert_eq!(cells, (0..8).map(|x| (x, 0)).collect::<Vec<_>>());
        let back: Vec<_> = TileWalk::new(&g, Vec2::new(250.0, 10.0), Vec2::new(5.0, 10.0)).collect();
        assert_eq!(back.first(), Some(&(7, 0)));
        assert_eq!(back.last(), Some(&(0, 0)));
    }

    #[test]
    fn test_walk_diagonal_is_four_connected() {
        let g = grid(vec![0; 64], 8, 8);
        let cells: Vec<_> = TileWalk::new(&g, Vec2::new(3.0, 5.0), Vec2::new(200.0, 130.0)).collect();
        assert_eq!(cells.first(), Some(&(0, 0)));
        assert_eq!(cells.last(), Some(&(6, 4)));
        assert_eq!(cells.len(), 6 + 4 + 1);
        for pair in cells.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            assert_eq!((a.0 - b.0).abs() + (a.1 - b.1).abs(), 1, "{a:?} -> {b:?}");
        }
    }

    #[test]
    fn test_walk_through_exact_corner_terminates() {
        let g = grid(vec![0; 16], 4, 4);
        let cells: Vec<_> = TileWalk::new(&g, Vec2::new(16.0, 16.0), Vec2::new(112.0, 112.0)).collect();
        assert_eq!(cells.first(), Some(&(0, 0)));
        assert_eq!(cells.last(), Some(&(3, 3)));
        assert_eq!(cells.len(), 7);
    }

    #[test]
    fn test_hit_in_last_tile() {
        let reg = registry();
        let g = grid(vec![0, 0, 0, 0, WALL], 5, 1);
        let c = caster(&reg, &g, &[]);
        let hit = c.cast(Vec2::new(4.0, 16.0), Vec2::new(150.0, 16.0), Some(Vec2::X), None).unwrap();
        assert_abs_diff_eq!(hit.point.x, 128.0, epsilon = 1e-4);
        assert_abs_diff_eq!(hit.point.y, 16.0, epsilon = 1e-4);
        assert_eq!(hit.tile, Some((4, 0)));
        assert_eq!(hit.normal, Vec2::new(-1.0, 0.0));
    }

    #[test]
    fn test_ray_along_boundary_sees_both_sides() {
        let reg = registry();
        // Floor only in the left column; the ray runs down its right edge.
        let g = grid(vec![0, 0, FLOOR, 0], 2, 2);
        let c = caster(&reg, &g, &[]);
        let hit = c.cast(Vec2::new(32.0, 10.0), Vec2::new(32.0, 60.0), Some(Vec2::Y), None).unwrap();
        assert_abs_diff_eq!(hit.point.y, 32.0, epsilon = 1e-4);
        assert_eq!(hit.tile, Some((0, 1)));

        // Horizontal ray along the bottom of the top row still meets the wall above it.
        let g = grid(vec![0, WALL, 0, 0], 2, 2);
        let c = caster(&reg, &g, &[]);
        let hit = c.cast(Vec2::new(4.0, 32.0), Vec2::new(60.0, 32.0), Some(Vec2::X), None).unwrap();
        assert_abs_diff_eq!(hit.point.x, 32.0, epsilon = 1e-4);
        assert_eq!(hit.tile, Some((1, 0)));
    }

    #[test]
    fn test_back_face_filtering() {
        let reg = registry();
        let g = grid(vec![0, FLOOR], 1, 2);
        let c = caster(&reg, &g, &[]);
        let down = c.cast(Vec2::new(16.0, 20.0), Vec2::new(16.0, 40.0), Some(Vec2::Y), None).unwrap();
        assert_abs_diff_eq!(down.point.y, 32.0, epsilon = 1e-4);
        assert_eq!(down.normal, Vec2::new(0.0, -1.0));
        // Moving up through the same floor edge: culled.
        assert!(c.cast(Vec2::new(16.0, 40.0), Vec2::new(16.0, 20.0), Some(-Vec2::Y), None).is_none());
        // Without a direction every segment counts.
        assert!(c.cast(Vec2::new(16.0, 40.0), Vec2::new(16.0, 20.0), None, None).is_some());
    }

    #[test]
    fn test_first_tile_wins_and_nearest_within_tile() {
        let reg = registry();
        let g = grid(vec![FLOOR, FLOOR, 0], 3, 1);
        let c = caster(&reg, &g, &[]);
        // Omnidirectional ray from inside tile 0 crosses its own right edge first.
        let hit = c.cast(Vec2::new(16.0, 16.0), Vec2::new(90.0, 16.0), None, None).unwrap();
        assert_eq!(hit.tile, Some((0, 0)));
        assert_abs_diff_eq!(hit.point.x, 32.0, epsilon = 1e-4);
        assert_eq!(hit.normal, Vec2::new(1.0, 0.0));
    }

    #[test]
    fn test_rays_outside_world_are_clipped() {
        let reg = registry();
        let g = grid(vec![0, WALL], 2, 1);
        let c = caster(&reg, &g, &[]);
        let hit = c.cast(Vec2::new(-500.0, 16.0), Vec2::new(60.0, 16.0), Some(Vec2::X), None).unwrap();
        assert_abs_diff_eq!(hit.point.x, 32.0, epsilon = 1e-4);
        assert!(c.cast(Vec2::new(-500.0, -50.0), Vec2::new(500.0, -50.0), None, None).is_none());
    }

    #[test]
    fn test_surface_merge_and_exclusion() {
        let reg = registry();
        let g = grid(vec![0, 0, 0, FLOOR], 1, 4);
        let mut platform = LineSegment::new(Vec2::new(0.0, 50.0), Vec2::new(32.0, 50.0), Vec2::new(0.0, -1.0));
        platform.owner = Some(OwnerId(3));
        let surfaces = [platform];
        let c = caster(&reg, &g, &surfaces);

        let hit = c.cast(Vec2::new(16.0, 0.0), Vec2::new(16.0, 120.0), Some(Vec2::Y), None).unwrap();
        assert_abs_diff_eq!(hit.point.y, 50.0, epsilon = 1e-4);
        assert_eq!(hit.owner, Some(OwnerId(3)));
        assert_eq!(hit.tile, None);

        let hit = c.cast(Vec2::new(16.0, 0.0), Vec2::new(16.0, 120.0), Some(Vec2::Y), Some(OwnerId(3))).unwrap();
        assert_abs_diff_eq!(hit.point.y, 96.0, epsilon = 1e-4);
        assert_eq!(hit.tile, Some((0, 3)));
    }

    #[test]
    fn test_tie_prefers_tile_hit() {
        let reg = registry();
        let g = grid(vec![0, FLOOR], 1, 2);
        let mut flush = LineSegment::new(Vec2::new(0.0, 32.0), Vec2::new(32.0, 32.0), Vec2::new(0.0, -1.0));
        flush.owner = Some(OwnerId(1));
        let surfaces = [flush];
        let c = caster(&reg, &g, &surfaces);
        let hit = c.cast(Vec2::new(16.0, 10.0), Vec2::new(16.0, 40.0), Some(Vec2::Y), None).unwrap();
        assert_eq!(hit.tile, Some((0, 1)));
        assert_eq!(hit.owner, None);
    }

    #[test]
    fn test_repeated_casts_are_identical() {
        let reg = registry();
        let g = grid(vec![FLOOR, 0, WALL, FLOOR, 0, FLOOR, 0, WALL, FLOOR], 3, 3);
        let c = caster(&reg, &g, &[]);
        let first = c.cast(Vec2::new(40.0, 40.0), Vec2::new(5.0, 90.0), None, None);
        for _ in 0..16 {
            assert_eq!(c.cast(Vec2::new(40.0, 40.0), Vec2::new(5.0, 90.0), None, None), first);
        }
    }

    #[test]
    fn test_no_data_no_tile_hits() {
        let reg = TileCollisionRegistry::new();
        let g = grid(vec![FLOOR; 4], 2, 2);
        let c = caster(&reg, &g, &[]);
        assert!(c.cast(Vec2::new(0.0, 0.0), Vec2::new(60.0, 60.0), None, None).is_none());
    }
}
