use glam::Vec2;

use crate::query::TileQuery;
use crate::types::Rect;

/// Steps smaller than this are float noise from standing on flat ground.
const MIN_STEP: f32 = 0.01;

impl<'a> TileQuery<'a> {
    /// New `y` for a box at `bounds` moving horizontally with `velocity_x` if it
    /// can ride up a slope or step no taller than `max_step_height`.
    pub fn check_slope_climb(&self, bounds: Rect, velocity_x: f32, max_step_height: f32) -> Option<f32> {
        if velocity_x == 0.0 || max_step_height <= 0.0 {
            return None;
        }
        if !self.registry().is_loaded() {
            return self.step_search(bounds, max_step_height);
        }
        let side = velocity_x.signum();
        self.climb_leading_edge(bounds, side, max_step_height)
            .or_else(|| self.climb_diagonal(bounds, side, max_step_height))
    }

    fn accept_step(bounds: Rect, new_y: f32, max_step_height: f32) -> Option<f32> {
        let step = bounds.y - new_y;
        (step > MIN_STEP && step <= max_step_height).then_some(new_y)
    }

    /// Vertical probe at the leading edge from `max_step_height` above the foot
    /// line down to just below it.
    fn climb_leading_edge(&self, bounds: Rect, side: f32, max_step_height: f32) -> Option<f32> {
        let cfg = self.cfg;
        let x = if side > 0.0 { bounds.right() } else { bounds.x };
        let foot = bounds.bottom();
        let hit = self.caster.cast(
            Vec2::new(x, foot - max_step_height),
            Vec2::new(x, foot + cfg.probe_length),
            Some(Vec2::Y),
            None,
        )?;
        if hit.normal.y >= cfg.ground_normal_threshold {
            return None;
        }
        let new_y = Self::accept_step(bounds, hit.point.y - bounds.h, max_step_height)?;
        self.clear_ahead(bounds, new_y, side)
    }

    /// A floor-like corner in front of a wall is not a step.
    fn clear_ahead(&self, bounds: Rect, new_y: f32, side: f32) -> Option<f32> {
        let raised = Rect { y: new_y, ..bounds };
        self.wall_probe(raised, side).is_none().then_some(new_y)
    }

    /// Forward-and-down probe from step height above the foot centre to
    /// `max_step_height` past the leading edge, for shallow slopes that start
    /// just ahead of it. Flat ground is met beyond the edge at step zero.
    fn climb_diagonal(&self, bounds: Rect, side: f32, max_step_height: f32) -> Option<f32> {
        let cfg = self.cfg;
        let foot = bounds.bottom();
        let cx = bounds.center().x;
        let start = Vec2::new(cx, foot - max_step_height);
        let end = Vec2::new(cx + side * (bounds.w * 0.5 + max_step_height), foot + cfg.probe_length);
        let hit = self.caster.cast(start, end, Some((end - start).normalize_or_zero()), None)?;

        let n = hit.normal;
        let slope_like = n.x.abs() > cfg.slope_normal_x_min && n.y.abs() > cfg.ground_normal_threshold.abs();
        let near_floor = n.y < cfg.slope_floor_threshold;
        if !(slope_like || near_floor) {
            return None;
        }
        let new_y = Self::accept_step(bounds, hit.point.y - bounds.h, max_step_height)?;
        self.clear_ahead(bounds, new_y, side)
    }

    /// No segment data: raise the box in fixed increments until it is clear of
    /// solid tiles with ground right beneath it.
    fn step_search(&self, bounds: Rect, max_step_height: f32) -> Option<f32> {
        if !self.overlaps_solid(bounds) {
            return None;
        }
        let inc = self.cfg.fallback_step_increment.max(0.1);
        // Never search higher than the world is tall.
        let reach = max_step_height.min(self.grid().world_bounds().h);
        let steps = (reach / inc).floor() as u32;
        (1..=steps).find_map(|i| {
            let raised = Rect { y: bounds.y - i as f32 * inc, ..bounds };
            let below = Rect::new(raised.x, raised.bottom(), raised.w, self.cfg.probe_length);
            (!self.overlaps_solid(raised) && self.overlaps_solid(below)).then_some(raised.y)
        })
    }
}
