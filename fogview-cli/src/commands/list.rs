use anyhow::{bail, Context, Result};
use fogview::{BoundingBox, Coordinate};
use std::path::PathBuf;

use super::{info::coverage, open_store};

pub fn run(data_dir: Option<PathBuf>, bbox: Option<&str>) -> Result<()> {
    let store = open_store(data_dir)?;

    let tiles = match bbox {
        Some(value) => {
            let region = parse_bbox(value)?;
            tracing::debug!(%region, "Filtering tiles by region");
            store.tiles_covering(&region)
        }
        None => store.scan_tiles(),
    };

    if tiles.is_empty() {
        println!("No tiles found in: {}", store.data_dir().display());
        return Ok(());
    }

    println!("{:<12} {:>24}", "TILE", "COVERAGE");
    println!("{}", "-".repeat(37));

    for id in &tiles {
        println!("{:<12} {:>24}", id.to_string(), coverage(*id));
    }

    println!();
    println!("Summary:");
    println!("  Total tiles: {}", tiles.len());
    println!("  Data directory: {}", store.data_dir().display());

    Ok(())
}

/// Parse `min_lat,min_lon,max_lat,max_lon` into a validated bounding box.
fn parse_bbox(value: &str) -> Result<BoundingBox> {
    let values = value
        .split(',')
        .map(|part| {
            part.trim()
                .parse::<f64>()
                .with_context(|| format!("Invalid bbox value '{}'", part.trim()))
        })
        .collect::<Result<Vec<_>>>()?;

    let [min_lat, min_lon, max_lat, max_lon] = values[..] else {
        bail!("Expected bbox as min_lat,min_lon,max_lat,max_lon, got '{}'", value);
    };

    BoundingBox::new(
        Coordinate::new(min_lat, min_lon),
        Coordinate::new(max_lat, max_lon),
    )
    .context("Invalid bbox")
}
