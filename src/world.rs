use std::path::Path;

use glam::Vec2;

use crate::api::CollisionWorldApi;
use crate::colliders::{ColliderDesc, ColliderId, ColliderSet};
use crate::error::CollisionError;
use crate::grid::WorldGrid;
use crate::query::TileQuery;
use crate::registry::TileCollisionRegistry;
use crate::surfaces::TemporarySurfaces;
use crate::types::*;

/// One level's collision state: segment data, tile grid, moving-platform
/// surfaces and object colliders.
///
/// Queries borrow the world immutably; everything that mutates (loading, grid
/// replacement, surface publishing) happens between ticks.
pub struct CollisionWorld {
    pub cfg: CollisionConfig,
    registry: TileCollisionRegistry,
    grid: WorldGrid,
    surfaces: TemporarySurfaces,
    colliders: ColliderSet,
}

impl CollisionWorldApi for CollisionWorld {
    fn new(cfg: CollisionConfig) -> Self {
        let colliders = ColliderSet::with_capacity(cfg.max_colliders);
        Self {
            cfg,
            registry: TileCollisionRegistry::new(),
            grid: WorldGrid::new(),
            surfaces: TemporarySurfaces::new(),
            colliders,
        }
    }

    fn load_collision_data(&mut self, path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();
        match self.try_load_collision_data(path) {
            Ok(_) => true,
            Err(e) => {
                log::warn!("Failed to load collision data from {}: {e}; using AABB fallback", path.display());
                false
            }
        }
    }

    fn set_tile_collision(
        &mut self,
        tiles: Vec<TileId>,
        width: usize,
        height: usize,
        tile_width: f32,
        tile_height: f32,
    ) -> Result<(), CollisionError> {
        self.grid.set_tiles(tiles, width, height, tile_width, tile_height)
    }

    fn reset(&mut self) {
        self.grid.clear();
        self.colliders.clear();
        self.surfaces.clear();
        log::debug!("Collision world reset ({} tile types kept)", self.registry.len());
    }

    fn add_temporary_surface(&mut self, segment: LineSegment, owner: OwnerId) {
        self.surfaces.add(segment, owner);
    }

    fn update_temporary_surfaces(&mut self) {
        self.surfaces.swap();
    }

    fn cast_ray(
        &self,
        start: Vec2,
        end: Vec2,
        direction: Option<Vec2>,
        exclude_owner: Option<OwnerId>,
    ) -> Option<RayHit> {
        self.query().caster.cast(start, end, direction, exclude_owner)
    }

    fn check_tile_collision(&self, bounds: Rect, velocity: Vec2) -> TileCollisionResult {
        self.query().check_tile_collision(bounds, velocity)
    }

    fn check_slope_climb(&self, bounds: Rect, velocity_x: f32, max_step_height: f32) -> Option<f32> {
        self.query().check_slope_climb(bounds, velocity_x, max_step_height)
    }

    fn register_collider(&mut self, desc: ColliderDesc) -> Result<ColliderId, CollisionError> {
        self.colliders.register(desc)
    }

    fn unregister_collider(&mut self, id: ColliderId) -> bool {
        self.colliders.unregister(id)
    }

    fn check_object_collision(&self, id: ColliderId) -> Vec<ColliderId> {
        self.colliders.overlapping(id)
    }
}

impl CollisionWorld {
    /// Fallible form of `load_collision_data`. Returns the number of tile types.
    pub fn try_load_collision_data(&mut self, path: impl AsRef<Path>) -> Result<usize, CollisionError> {
        self.registry.load_from_path(path)
    }

    pub fn load_collision_data_from_str(&mut self, json: &str) -> Result<usize, CollisionError> {
        self.registry.load_from_str(json)
    }

    /// Borrowed view used by every query for the current tick.
    pub fn query(&self) -> TileQuery<'_> {
        TileQuery::new(&self.cfg, &self.registry, &self.grid, self.surfaces.active())
    }

    pub fn registry(&self) -> &TileCollisionRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut TileCollisionRegistry {
        &mut self.registry
    }

    pub fn grid(&self) -> &WorldGrid {
        &self.grid
    }

    pub fn collider(&self, id: ColliderId) -> Option<&ColliderDesc> {
        self.colliders.get(id)
    }

    /// Move and (de)activate a collider. False for a stale id.
    pub fn update_collider(&mut self, id: ColliderId, bounds: Rect, active: bool) -> bool {
        match self.colliders.get_mut(id) {
            Some(c) => {
                c.bounds = bounds;
                c.active = active;
                true
            }
            None => false,
        }
    }

    /// Return debug stats for the current world.
    pub fn debug_stats(&self) -> WorldStats {
        WorldStats {
            tile_types: self.registry.len(),
            segments: self.registry.segment_count(),
            grid_cells: self.grid.cell_count(),
            active_surfaces: self.surfaces.active().len(),
            pending_surfaces: self.surfaces.pending_len(),
            colliders: self.colliders.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const SOLID_JSON: &str = r#"{
        "version": 1,
        "tileCount": 1,
        "tiles": {
            "1": { "index": 1, "segments": [
                { "startX": 0,  "startY": 0,  "endX": 32, "endY": 0,  "normalX": 0,  "normalY": -1 },
                { "startX": 32, "startY": 0,  "endX": 32, "endY": 32, "normalX": 1,  "normalY": 0 },
                { "startX": 32, "startY": 32, "endX": 0,  "endY": 32, "normalX": 0,  "normalY": 1 },
                { "startX": 0,  "startY": 32, "endX": 0,  "endY": 0,  "normalX": -1, "normalY": 0 }
            ] }
        }
    }"#;

    /// 20x12 level of 32px tiles, solid floor on row 10 (top at y=320).
    fn floor_world(with_segments: bool) -> CollisionWorld {
        let mut world = CollisionWorld::new(CollisionConfig::default());
        if with_segments {
            world.load_collision_data_from_str(SOLID_JSON).unwrap();
        }
        let (w, h) = (20, 12);
        let mut tiles = vec![0; w * h];
        for x in 0..w {
            tiles[10 * w + x] = 1;
        }
        world.set_tile_collision(tiles, w, h, 32.0, 32.0).unwrap();
        world
    }

    fn platform(y: f32) -> LineSegment {
        LineSegment::new(Vec2::new(64.0, y), Vec2::new(160.0, y), Vec2::new(0.0, -1.0))
    }

    #[test]
    fn test_falling_box_lands_on_floor() {
        let world = floor_world(true);
        let bounds = Rect::new(100.0, 300.0, 32.0, 48.0);
        let res = world.check_tile_collision(bounds, Vec2::new(0.0, 100.0));
        assert!(res.grounded);
        assert_eq!(res.normal, Some(Vec2::new(0.0, -1.0)));
        let contact = res.ground_contact.unwrap();
        assert_abs_diff_eq!(contact.y - bounds.h, 272.0, epsilon = 1e-4);

        // Corrected position rests flush and stays grounded.
        let rested = Rect { y: contact.y - bounds.h, ..bounds };
        let res = world.check_tile_collision(rested, Vec2::new(0.0, 1.0));
        assert!(res.grounded && !res.left_wall && !res.right_wall);
    }

    #[test]
    fn test_bad_collision_file_falls_back_to_aabb() {
        let mut world = floor_world(false);
        assert!(!world.load_collision_data("/definitely/not/here/collision.json"));

        let path = std::env::temp_dir().join(format!("tilecast-malformed-{}.json", std::process::id()));
        std::fs::write(&path, "{ \"version\": 1, \"tiles\": ").unwrap();
        assert!(!world.load_collision_data(&path));
        let _ = std::fs::remove_file(&path);
        assert!(!world.registry().is_loaded());

        let res = world.check_tile_collision(Rect::new(100.0, 300.0, 32.0, 48.0), Vec2::new(0.0, 100.0));
        assert!(res.grounded);
        assert_eq!(res.normal, Some(Vec2::new(0.0, -1.0)));
    }

    #[test]
    fn test_load_from_file() {
        let mut world = floor_world(false);
        let path = std::env::temp_dir().join(format!("tilecast-solid-{}.json", std::process::id()));
        std::fs::write(&path, SOLID_JSON).unwrap();
        assert!(world.load_collision_data(&path));
        let _ = std::fs::remove_file(&path);
        assert_eq!(world.debug_stats().segments, 4);
    }

    #[test]
    fn test_temporary_surface_needs_update() {
        let mut world = floor_world(true);
        let (start, end) = (Vec2::new(100.0, 150.0), Vec2::new(100.0, 250.0));

        world.add_temporary_surface(platform(200.0), OwnerId(7));
        assert!(world.cast_ray(start, end, Some(Vec2::Y), None).is_none());
        assert_eq!(world.debug_stats().pending_surfaces, 1);

        world.update_temporary_surfaces();
        let hit = world.cast_ray(start, end, Some(Vec2::Y), None).unwrap();
        assert_abs_diff_eq!(hit.point.y, 200.0, epsilon = 1e-4);
        assert_eq!(hit.owner, Some(OwnerId(7)));
        assert_eq!(hit.tile, None);

        // The platform does not see itself.
        assert!(world.cast_ray(start, end, Some(Vec2::Y), Some(OwnerId(7))).is_none());

        // Not re-submitted: gone after the next swap.
        world.update_temporary_surfaces();
        assert!(world.cast_ray(start, end, Some(Vec2::Y), None).is_none());
    }

    #[test]
    fn test_box_rides_platform() {
        let mut world = floor_world(true);
        world.add_temporary_surface(platform(200.0), OwnerId(1));
        world.update_temporary_surfaces();

        let res = world.check_tile_collision(Rect::new(90.0, 160.0, 32.0, 40.0), Vec2::new(0.0, 5.0));
        assert!(res.grounded);
        assert_abs_diff_eq!(res.ground_contact.unwrap().y, 200.0, epsilon = 1e-4);
    }

    #[test]
    fn test_platform_flush_with_floor_prefers_tile() {
        let mut world = floor_world(true);
        world.add_temporary_surface(platform(320.0), OwnerId(3));
        world.update_temporary_surfaces();
        let hit = world.cast_ray(Vec2::new(100.0, 300.0), Vec2::new(100.0, 340.0), Some(Vec2::Y), None).unwrap();
        assert_eq!(hit.tile, Some((3, 10)));
        assert_eq!(hit.owner, None);
    }

    #[test]
    fn test_reset_keeps_segment_data() {
        let mut world = floor_world(true);
        world.register_collider(ColliderDesc::new(Rect::new(0.0, 0.0, 8.0, 8.0), None)).unwrap();
        world.add_temporary_surface(platform(200.0), OwnerId(1));
        world.update_temporary_surfaces();

        world.reset();
        let stats = world.debug_stats();
        assert_eq!(
            stats,
            WorldStats { tile_types: 1, segments: 4, grid_cells: 0, active_surfaces: 0, pending_surfaces: 0, colliders: 0 }
        );
        assert!(world.cast_ray(Vec2::new(100.0, 300.0), Vec2::new(100.0, 340.0), Some(Vec2::Y), None).is_none());
        assert!(!world.check_tile_collision(Rect::new(100.0, 272.0, 32.0, 48.0), Vec2::Y).any());
    }

    #[test]
    fn test_object_colliders() {
        let cfg = CollisionConfig { max_colliders: 3, ..CollisionConfig::default() };
        let mut world = CollisionWorld::new(cfg);
        let a = world.register_collider(ColliderDesc::new(Rect::new(0.0, 0.0, 16.0, 16.0), Some(1))).unwrap();
        let b = world.register_collider(ColliderDesc::new(Rect::new(40.0, 0.0, 16.0, 16.0), Some(2))).unwrap();
        let c = world.register_collider(ColliderDesc::new(Rect::new(8.0, 8.0, 16.0, 16.0), Some(3))).unwrap();
        assert!(world.register_collider(ColliderDesc::new(Rect::default(), None)).is_err());

        assert_eq!(world.check_object_collision(a), vec![c]);
        assert!(world.check_object_collision(b).is_empty());

        assert!(world.update_collider(b, Rect::new(10.0, 0.0, 16.0, 16.0), true));
        assert_eq!(world.check_object_collision(a), vec![b, c]);
        assert_eq!(world.collider(b).and_then(|d| d.user_key), Some(2));

        assert!(world.update_collider(c, Rect::new(8.0, 8.0, 16.0, 16.0), false));
        assert_eq!(world.check_object_collision(a), vec![b]);

        assert!(world.unregister_collider(b));
        assert!(!world.update_collider(b, Rect::default(), true));
        assert!(world.check_object_collision(a).is_empty());
    }

    #[test]
    fn test_step_up_without_segment_data() {
        let mut world = CollisionWorld::new(CollisionConfig::default());
        let (w, h) = (10, 12);
        let mut tiles = vec![0; w * h];
        for x in 0..w {
            tiles[10 * w + x] = 1;
        }
        tiles[9 * w + 4] = 1;
        world.set_tile_collision(tiles, w, h, 16.0, 16.0).unwrap();
        // Box pushed into the one-tile step at x=64.
        let y = world.check_slope_climb(Rect::new(50.0, 128.0, 16.0, 32.0), 30.0, 16.0).unwrap();
        assert_abs_diff_eq!(y, 112.0, epsilon = 1e-4);
    }

    #[test]
    fn test_invalid_grid_keeps_previous() {
        let mut world = floor_world(true);
        let err = world.set_tile_collision(vec![1; 5], 3, 3, 32.0, 32.0).unwrap_err();
        assert!(matches!(err, CollisionError::InvalidGrid { expected: 9, actual: 5 }));
        assert_eq!(world.grid().cell_count(), 240);
    }
}
