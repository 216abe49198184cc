use glam::Vec2;
use tilecast::*;

const LEVEL_JSON: &str = r#"{
    "version": 1,
    "tileCount": 2,
    "tiles": {
        "1": { "index": 1, "segments": [
            { "startX": 0,  "startY": 0,  "endX": 16, "endY": 0,  "normalX": 0,  "normalY": -1 },
            { "startX": 16, "startY": 0,  "endX": 16, "endY": 16, "normalX": 1,  "normalY": 0 },
            { "startX": 16, "startY": 16, "endX": 0,  "endY": 16, "normalX": 0,  "normalY": 1 },
            { "startX": 0,  "startY": 16, "endX": 0,  "endY": 0,  "normalX": -1, "normalY": 0 }
        ] },
        "2": { "index": 2, "segments": [
            { "startX": 0,  "startY": 16, "endX": 16, "endY": 0,  "normalX": -1, "normalY": -1 },
            { "startX": 16, "startY": 0,  "endX": 16, "endY": 16, "normalX": 1,  "normalY": 0 }
        ] }
    }
}"#;

fn main() {
    let mut world = CollisionWorld::new(CollisionConfig::default());
    if let Err(e) = world.load_collision_data_from_str(LEVEL_JSON) {
        eprintln!("bad level data: {e}");
        return;
    }

    // 8x6, floor on the bottom row, a slope and a pillar above it.
    #[rustfmt::skip]
    let tiles = vec![
        0, 0, 0, 0, 0, 0, 0, 0,
        0, 0, 0, 0, 0, 0, 0, 0,
        0, 0, 0, 0, 0, 1, 0, 0,
        0, 0, 0, 0, 0, 1, 0, 0,
        0, 0, 0, 2, 1, 1, 0, 0,
        1, 1, 1, 1, 1, 1, 1, 1,
    ];
    if let Err(e) = world.set_tile_collision(tiles, 8, 6, 16.0, 16.0) {
        eprintln!("bad grid: {e}");
        return;
    }

    let rays = [
        ("down onto floor", Vec2::new(8.0, 0.0), Vec2::new(8.0, 120.0)),
        ("down onto slope", Vec2::new(56.0, 0.0), Vec2::new(56.0, 120.0)),
        ("right into pillar", Vec2::new(0.0, 40.0), Vec2::new(127.0, 40.0)),
        ("up through floor", Vec2::new(8.0, 95.0), Vec2::new(8.0, 0.0)),
        ("diagonal", Vec2::new(0.0, 0.0), Vec2::new(127.0, 95.0)),
    ];

    for (label, start, end) in rays {
        let dir = (end - start).normalize_or_zero();
        match world.cast_ray(start, end, Some(dir), None) {
            Some(hit) => println!(
                "{label:>18}: hit ({:.2},{:.2}) n=({:.2},{:.2}) tile={:?}",
                hit.point.x, hit.point.y, hit.normal.x, hit.normal.y, hit.tile
            ),
            None => println!("{label:>18}: no hit"),
        }
    }

    println!("{:?}", world.debug_stats());
}
