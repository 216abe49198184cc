use glam::Vec2;
use std::time::Instant;
use tilecast::*;

fn main() {
    let mut world = CollisionWorld::new(CollisionConfig::default());
    world.registry_mut().insert(CollisionTile::full_square(1, 16.0, 16.0));

    // 256x256 map with ~25% solids in a checkerboard-ish pattern
    let (w, h) = (256usize, 256usize);
    let mut tiles = vec![0; w * h];
    for y in 0..h { for x in 0..w { if (x ^ y) & 0x3 == 0 { tiles[y * w + x] = 1; } } }
    if let Err(e) = world.set_tile_collision(tiles, w, h, 16.0, 16.0) {
        eprintln!("grid rejected: {e}");
        return;
    }

    // Ray throughput
    let origin = Vec2::new(-10.0, 1600.5);
    let n_rays = 200_000;
    let t0 = Instant::now();
    let mut acc = 0.0f32;
    for i in 0..n_rays {
        let a = (i % 360) as f32 * std::f32::consts::PI / 180.0;
        let dir = Vec2::new(a.cos(), a.sin());
        let end = origin + dir * (400.0 + (i % 10) as f32);
        if let Some(hit) = world.cast_ray(origin, end, Some(dir), None) { acc += (hit.point - origin).length(); }
    }
    let dt = t0.elapsed().as_secs_f64();
    println!("tile_raycast: rays={} secs={:.3} throughput={:.0} rays/s checksum={:.3}", n_rays, dt, (n_rays as f64 / dt), acc);

    // Box query throughput
    let n_queries = 100_000;
    let t1 = Instant::now();
    let mut grounded = 0usize;
    for i in 0..n_queries {
        let x = 16.0 + (i % 3900) as f32;
        let y = 16.0 + ((i / 3900) % 200) as f32 * 19.0;
        let res = world.check_tile_collision(Rect::new(x, y, 12.0, 24.0), Vec2::new(60.0, 200.0));
        if res.grounded { grounded += 1; }
    }
    let dt1 = t1.elapsed().as_secs_f64();
    println!("tile_query: queries={} secs={:.3} throughput={:.0} queries/s grounded={}", n_queries, dt1, (n_queries as f64 / dt1), grounded);
}
