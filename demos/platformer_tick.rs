use glam::Vec2;
use tilecast::*;

const TILE: f32 = 32.0;
const GRAVITY: f32 = 900.0;
const DT: f32 = 1.0 / 60.0;
const PLATFORM: OwnerId = OwnerId(100);

/// Minimal fixed-tick loop: a player walks right along the floor, then a
/// moving platform publishes its top edge each tick.
fn main() {
    env_logger::init();

    let mut world = CollisionWorld::new(CollisionConfig::default());
    world.registry_mut().insert(CollisionTile::full_square(1, TILE, TILE));

    let (w, h) = (24, 12);
    let mut tiles = vec![0; w * h];
    for x in 0..w {
        tiles[10 * w + x] = 1;
    }
    if let Err(e) = world.set_tile_collision(tiles, w, h, TILE, TILE) {
        log::error!("grid rejected: {e}");
        return;
    }

    let player_key = world.register_collider(ColliderDesc::new(Rect::new(100.0, 200.0, 24.0, 40.0), Some(1)));
    let coin_key = world.register_collider(ColliderDesc::new(Rect::new(300.0, 280.0, 16.0, 16.0), Some(2)));
    let (Ok(player_id), Ok(coin_id)) = (player_key, coin_key) else {
        log::error!("collider list full");
        return;
    };

    // Platform top edge in platform-local space.
    let platform_top = LineSegment::new(Vec2::ZERO, Vec2::new(96.0, 0.0), Vec2::new(0.0, -1.0));

    let mut pos = Vec2::new(100.0, 200.0);
    let mut vel = Vec2::new(120.0, 0.0);
    let size = Vec2::new(24.0, 40.0);

    for tick in 0..240 {
        let t = tick as f32 * DT;
        let platform_at = Vec2::new(400.0 + 80.0 * t.sin(), 240.0);
        world.add_temporary_surface(platform_top.translated(platform_at), PLATFORM);
        world.update_temporary_surfaces();

        vel.y += GRAVITY * DT;
        pos += vel * DT;
        let mut bounds = Rect::new(pos.x, pos.y, size.x, size.y);

        if vel.x != 0.0 {
            if let Some(y) = world.check_slope_climb(bounds, vel.x, 16.0) {
                pos.y = y;
                bounds.y = y;
            }
        }

        let res = world.check_tile_collision(bounds, vel);
        if let (true, Some(contact)) = (res.grounded, res.ground_contact) {
            pos.y = contact.y - size.y;
            vel.y = 0.0;
        }
        if let (true, Some(contact)) = (res.right_wall, res.right_contact) {
            pos.x = contact.x - size.x;
            vel.x = -vel.x;
        } else if let (true, Some(contact)) = (res.left_wall, res.left_contact) {
            pos.x = contact.x;
            vel.x = -vel.x;
        }

        world.update_collider(player_id, Rect::new(pos.x, pos.y, size.x, size.y), true);
        if world.check_object_collision(player_id).contains(&coin_id) {
            println!("tick {tick}: picked up coin");
            world.unregister_collider(coin_id);
        }

        if tick % 30 == 0 {
            println!(
                "tick {tick:3}: pos=({:7.2},{:7.2}) grounded={} walls=({},{})",
                pos.x, pos.y, res.grounded, res.left_wall, res.right_wall
            );
        }
    }

    println!("{:?}", world.debug_stats());
}
