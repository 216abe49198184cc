use crate::types::{LineSegment, OwnerId};

/// Double-buffered, owner-tagged world-space surfaces (moving platforms).
///
/// Producers write to `pending`; ray casts only read `active`. `swap` is the one
/// point where next frame's surfaces become visible.
#[derive(Clone, Debug, Default)]
pub struct TemporarySurfaces {
    pending: Vec<LineSegment>,
    active: Vec<LineSegment>,
}

impl TemporarySurfaces {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a surface for the next tick, tagged with `owner`.
    pub fn add(&mut self, mut segment: LineSegment, owner: OwnerId) {
        segment.owner = Some(owner);
        self.pending.push(segment);
    }

    /// Pending becomes active; the new pending list starts empty.
    pub fn swap(&mut self) {
        std::mem::swap(&mut self.active, &mut self.pending);
        self.pending.clear();
        if !self.active.is_empty() {
            log::debug!("Temporary surfaces active: {}", self.active.len());
        }
    }

    pub fn active(&self) -> &[LineSegment] {
        &self.active
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
        self.active.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    fn seg() -> LineSegment {
        LineSegment::new(Vec2::new(0.0, 100.0), Vec2::new(64.0, 100.0), Vec2::new(0.0, -1.0))
    }

    #[test]
    fn test_pending_not_visible_until_swap() {
        let mut s = TemporarySurfaces::new();
        s.add(seg(), OwnerId(9));
        assert!(s.active().is_empty());
        assert_eq!(s.pending_len(), 1);
        s.swap();
        assert_eq!(s.active().len(), 1);
        assert_eq!(s.active()[0].owner, Some(OwnerId(9)));
        assert_eq!(s.pending_len(), 0);
    }

    #[test]
    fn test_missed_registration_empties_active() {
        let mut s = TemporarySurfaces::new();
        s.add(seg(), OwnerId(1));
        s.swap();
        // Nobody re-registered this tick.
        s.swap();
        assert!(s.active().is_empty());
    }
}
