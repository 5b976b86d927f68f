use anyhow::Result;
use fogview::{SrtmResolution, TileId};
use std::path::PathBuf;

use super::load_tile;

pub fn run(data_dir: Option<PathBuf>, tile: &str) -> Result<()> {
    let tile = load_tile(data_dir, tile)?;
    let grid = tile.grid();
    let size = grid.size();
    let stats = grid.stats();

    let resolution_str = resolution_label(tile.resolution());
    let center = tile.center();

    println!("Tile: {}", tile.id());
    println!();
    println!("Resolution: {} ({}x{} samples)", resolution_str, size, size);
    println!("Coverage: {}", coverage(tile.id()));
    println!("Footprint: {}", tile.footprint());
    println!("Center: {:.4}, {:.4}", center.lat, center.lon);
    println!();

    if let (Some(min), Some(max)) = (stats.min, stats.max) {
        println!("Min elevation: {}m", min);
        println!("Max elevation: {}m", max);
    }

    if stats.void_count > 0 {
        let void_pct = (stats.void_count as f64 / (size * size) as f64) * 100.0;
        println!("Void samples: {} ({:.1}%)", stats.void_count, void_pct);
    }

    Ok(())
}

/// e.g. `SRTM3 (~90m)`.
fn resolution_label(resolution: SrtmResolution) -> String {
    let name = match resolution {
        SrtmResolution::Srtm1 => "SRTM1",
        SrtmResolution::Srtm3 => "SRTM3",
    };
    format!("{} (~{}m)", name, resolution.meters())
}

/// Human-readable degree span, e.g. `N35-N36, E138-E139`.
pub fn coverage(id: TileId) -> String {
    let (lat, lon) = (id.lat(), id.lon());
    format!(
        "{}{:02}-{}{:02}, {}{:03}-{}{:03}",
        hemisphere(lat, 'N', 'S'),
        lat.abs(),
        hemisphere(lat + 1, 'N', 'S'),
        (lat + 1).abs(),
        hemisphere(lon, 'E', 'W'),
        lon.abs(),
        hemisphere(lon + 1, 'E', 'W'),
        (lon + 1).abs()
    )
}

fn hemisphere(value: i32, positive: char, negative: char) -> char {
    if value >= 0 {
        positive
    } else {
        negative
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_label() {
        assert_eq!(resolution_label(SrtmResolution::Srtm1), "SRTM1 (~30m)");
        assert_eq!(resolution_label(SrtmResolution::Srtm3), "SRTM3 (~90m)");
    }

    #[test]
    fn test_coverage_northern_eastern() {
        assert_eq!(coverage(TileId::new(35, 138)), "N35-N36, E138-E139");
    }

    #[test]
    fn test_coverage_crosses_equator() {
        assert_eq!(coverage(TileId::new(-1, -1)), "S01-N00, W001-E000");
    }
}
