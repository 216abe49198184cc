use slotmap::{SlotMap, new_key_type};

use crate::api::NarrowphaseApi;
use crate::error::CollisionError;
use crate::narrowphase::Narrowphase;
use crate::types::Rect;

new_key_type! {
    /// Generational handle to a registered object collider.
    pub struct ColliderId;
}

/// User-defined opaque key carried through queries (e.g. an entity id).
pub type ColKey = u64;

/// One object collider.
#[derive(Copy, Clone, Debug)]
pub struct ColliderDesc {
    pub bounds: Rect,
    /// Inactive colliders are skipped by queries but keep their slot.
    pub active: bool,
    pub user_key: Option<ColKey>,
}

impl ColliderDesc {
    pub fn new(bounds: Rect, user_key: Option<ColKey>) -> Self {
        Self { bounds, active: true, user_key }
    }
}

/// Bounded flat list of object colliders with a linear overlap scan.
#[derive(Debug)]
pub struct ColliderSet {
    slots: SlotMap<ColliderId, ColliderDesc>,
    capacity: usize,
}

impl ColliderSet {
    pub fn with_capacity(capacity: usize) -> Self {
        Self { slots: SlotMap::with_capacity_and_key(capacity), capacity }
    }

    pub fn register(&mut self, desc: ColliderDesc) -> Result<ColliderId, CollisionError> {
        if self.slots.len() >= self.capacity {
            return Err(CollisionError::ColliderCapacity(self.capacity));
        }
        Ok(self.slots.insert(desc))
    }

    /// False if `id` was already gone.
    pub fn unregister(&mut self, id: ColliderId) -> bool {
        self.slots.remove(id).is_some()
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, id: ColliderId) -> Option<&ColliderDesc> {
        self.slots.get(id)
    }

    pub fn get_mut(&mut self, id: ColliderId) -> Option<&mut ColliderDesc> {
        self.slots.get_mut(id)
    }

    /// Active colliders other than `id` whose bounds overlap it. Empty when `id`
    /// is unknown or inactive.
    pub fn overlapping(&self, id: ColliderId) -> Vec<ColliderId> {
        let Some(me) = self.slots.get(id).filter(|c| c.active) else {
            return Vec::new();
        };
        self.slots
            .iter()
            .filter(|(other, c)| *other != id && c.active && Narrowphase::rects_intersect(me.bounds, c.bounds))
            .map(|(other, _)| other)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boxed(x: f32, y: f32) -> ColliderDesc {
        ColliderDesc::new(Rect::new(x, y, 10.0, 10.0), None)
    }

    #[test]
    fn test_overlap_scan_skips_self_and_inactive() {
        let mut set = ColliderSet::with_capacity(8);
        let a = set.register(boxed(0.0, 0.0)).unwrap();
        let b = set.register(boxed(5.0, 5.0)).unwrap();
        let c = set.register(boxed(50.0, 50.0)).unwrap();
        let d = set.register(boxed(2.0, 2.0)).unwrap();

        let hits = set.overlapping(a);
        assert_eq!(hits.len(), 2);
        assert!(hits.contains(&b) && hits.contains(&d));
        assert!(set.overlapping(c).is_empty());

        set.get_mut(d).unwrap().active = false;
        assert_eq!(set.overlapping(a), vec![b]);
        assert!(set.overlapping(d).is_empty());
    }

    #[test]
    fn test_capacity_and_stale_handles() {
        let mut set = ColliderSet::with_capacity(2);
        let a = set.register(boxed(0.0, 0.0)).unwrap();
        set.register(boxed(0.0, 0.0)).unwrap();
        assert!(matches!(set.register(boxed(0.0, 0.0)), Err(CollisionError::ColliderCapacity(2))));

        assert!(set.unregister(a));
        assert!(!set.unregister(a));
        let reused = set.register(boxed(0.0, 0.0)).unwrap();
        // Slot is reused but the old handle stays dead.
        assert_ne!(reused, a);
        assert!(set.get(a).is_none());
        assert_eq!(set.len(), 2);
    }
}
