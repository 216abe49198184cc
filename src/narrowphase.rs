use glam::Vec2;

use crate::api::NarrowphaseApi;
use crate::types::Rect;

/// Default determinant epsilon for `segment_intersect`.
pub const INTERSECT_EPSILON: f32 = 1e-6;

/// Primitive tests used by the ray caster and the AABB fallback.
pub struct Narrowphase;

/// 2D cross product (z of the 3D cross).
#[inline]
fn cross(a: Vec2, b: Vec2) -> f32 {
    a.x * b.y - a.y * b.x
}

impl NarrowphaseApi for Narrowphase {
    fn segment_intersect(a0: Vec2, a1: Vec2, b0: Vec2, b1: Vec2, eps: f32) -> Option<Vec2> {
        // Solve a0 + t*da = b0 + u*db for t, u in [0,1]
        let da = a1 - a0;
        let db = b1 - b0;
        let det = cross(da, db);
        if det.abs() < eps {
            // Parallel, collinear or zero-length
            return None;
        }
        let diff = b0 - a0;
        let t = cross(diff, db) / det;
        let u = cross(diff, da) / det;
        if !(0.0..=1.0).contains(&t) || !(0.0..=1.0).contains(&u) {
            return None;
        }
        Some(a0 + da * t)
    }

    fn overlap_rect_rect(a: Rect, b: Rect) -> Option<Vec2> {
        let ox = a.right().min(b.right()) - a.x.max(b.x);
        let oy = a.bottom().min(b.bottom()) - a.y.max(b.y);
        if ox <= 0.0 || oy <= 0.0 {
            return None;
        }
        Some(Vec2::new(ox, oy))
    }

    fn rects_intersect(a: Rect, b: Rect) -> bool {
        a.x < b.right() && a.right() > b.x && a.y < b.bottom() && a.bottom() > b.y
    }
}
