pub mod batch;
pub mod info;
pub mod list;
pub mod viewshed;

use anyhow::{Context, Result};
use fogview::{ElevationTile, Strategy, TileStore, TileStoreBuilder, ViewshedOptions};
use std::path::{Path, PathBuf};

/// Open the tile store for `--data-dir`, falling back to `FOGVIEW_DATA_DIR`.
pub fn open_store(data_dir: Option<PathBuf>) -> Result<TileStore> {
    let builder = match data_dir {
        Some(dir) => TileStoreBuilder::new(dir),
        None => TileStoreBuilder::from_env().context(
            "FOGVIEW_DATA_DIR environment variable not set. Use --data-dir or set FOGVIEW_DATA_DIR",
        )?,
    };

    let store = builder.build();
    if !store.data_dir().is_dir() {
        anyhow::bail!(
            "Data directory does not exist: {}",
            store.data_dir().display()
        );
    }
    Ok(store)
}

/// Load a tile given either a path to an `.hgt` file or a bare tile name.
pub fn load_tile(data_dir: Option<PathBuf>, tile: &str) -> Result<ElevationTile> {
    if looks_like_path(tile) {
        return ElevationTile::from_file(tile)
            .with_context(|| format!("Failed to load tile from {}", tile));
    }

    let store = open_store(data_dir)?;
    store
        .load_by_name(tile)
        .with_context(|| format!("Failed to load tile {}", tile))
}

pub fn options(parallel: bool) -> ViewshedOptions {
    ViewshedOptions::with_strategy(if parallel {
        Strategy::Parallel
    } else {
        Strategy::Sequential
    })
}

fn looks_like_path(tile: &str) -> bool {
    let lower = tile.to_ascii_lowercase();
    lower.ends_with(".hgt")
        || lower.ends_with(".hgt.zip")
        || Path::new(tile).components().count() > 1
}
