//! Basic example demonstrating fogview library usage.
//!
//! Run with: cargo run --example basic -- /path/to/hgt/files N39W075

use fogview::{viewshed, FogError, Observer, Overlay, Rendering, TileStore, ViewshedOptions};
use std::env;

fn main() -> Result<(), FogError> {
    let mut args = env::args().skip(1);
    let (data_dir, tile_name) = match (args.next(), args.next()) {
        (Some(dir), Some(name)) => (dir, name),
        _ => {
            eprintln!("Usage: cargo run --example basic -- /path/to/hgt/files N39W075");
            std::process::exit(1);
        }
    };

    let store = TileStore::new(&data_dir);
    let tile = store.load_by_name(&tile_name)?;

    println!("Tile {} ({:?})", tile.id(), tile.resolution());
    println!("  Footprint: {}", tile.footprint());
    println!("  Centre: {}", tile.center());

    // Two observers 30m above the terrain; 0,0 is the north-west corner
    let observers = [
        ("Observer One", Observer::new(600, 200, 30.0, 200)),
        ("Observer Two", Observer::new(1000, 1000, 30.0, 200)),
    ];

    for (name, observer) in &observers {
        let result = viewshed::compute(tile.grid(), observer, ViewshedOptions::default())?;
        let counts = result.counts();

        println!("\n{} at {}:", name, tile.cell_coordinate(observer.x, observer.y));
        println!("  Window: {}x{}", result.width(), result.height());
        println!("  Visible: {}", counts.visible);
        println!("  Occluded: {}", counts.occluded);
        println!("  Void: {}", counts.void);

        if let Rendering::Image { corners, .. } = Overlay::viewshed(&tile, &result).render() {
            println!("  Overlay corners: {:?}", corners);
        }
    }

    Ok(())
}
