use anyhow::{bail, Context, Result};
use fogview::geojson::{bbox_to_geometry, viewshed_to_feature};
use fogview::tile_id::is_valid_srtm_coord;
use fogview::{viewshed, Coordinate, ElevationTile, Observer, ViewshedResult};
use geojson::{Feature, FeatureCollection, GeoJson, JsonObject, JsonValue};
use serde::Serialize;
use std::path::PathBuf;

use super::{load_tile, options};

/// Where the observer stands.
#[derive(Debug, Clone, Copy)]
pub enum Position {
    Cell { x: usize, y: usize },
    Geo { lat: f64, lon: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Text,
    Json,
    GeoJson,
}

#[derive(Serialize)]
struct ViewshedOutput {
    tile: String,
    observer: ObserverOutput,
    origin_x: usize,
    origin_y: usize,
    width: usize,
    height: usize,
    visible: usize,
    occluded: usize,
    void: usize,
    /// `[lat, lon]` pairs: lower-left, upper-left, upper-right, lower-right.
    corners: Vec<[f64; 2]>,
    /// Row-major cell codes: 1 visible, 0 occluded, -1 void.
    cells: Vec<i8>,
}

#[derive(Serialize)]
struct ObserverOutput {
    x: usize,
    y: usize,
    lat: f64,
    lon: f64,
    height: f64,
    radius: usize,
}

pub fn run(
    data_dir: Option<PathBuf>,
    tile: &str,
    position: Position,
    height: f64,
    radius: usize,
    parallel: bool,
    format: Format,
) -> Result<()> {
    let tile = load_tile(data_dir, tile)?;
    let (x, y) = resolve(&tile, position)?;

    let observer = Observer::new(x, y, height, radius);
    let result = viewshed::compute(tile.grid(), &observer, options(parallel))
        .context("Failed to compute viewshed")?;

    match format {
        Format::Json => {
            let output = to_output(&tile, &result);
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Format::GeoJson => {
            println!("{}", to_geojson(&tile, &result));
        }
        Format::Text => print_summary(&tile, &result),
    }

    Ok(())
}

fn resolve(tile: &ElevationTile, position: Position) -> Result<(usize, usize)> {
    match position {
        Position::Cell { x, y } => Ok((x, y)),
        Position::Geo { lat, lon } => {
            if !is_valid_srtm_coord(lat, lon) {
                bail!("({}, {}) is outside SRTM coverage (±60° latitude)", lat, lon);
            }
            tile.cell_at(Coordinate::new(lat, lon))
                .with_context(|| format!("({}, {}) is outside tile {}", lat, lon, tile.id()))
        }
    }
}

fn to_output(tile: &ElevationTile, result: &ViewshedResult) -> ViewshedOutput {
    let observer = result.observer();
    let position = tile.cell_coordinate(observer.x, observer.y);
    let (origin_x, origin_y) = result.origin();
    let counts = result.counts();

    ViewshedOutput {
        tile: tile.id().to_string(),
        observer: ObserverOutput {
            x: observer.x,
            y: observer.y,
            lat: position.lat,
            lon: position.lon,
            height: observer.height,
            radius: observer.radius,
        },
        origin_x,
        origin_y,
        width: result.width(),
        height: result.height(),
        visible: counts.visible,
        occluded: counts.occluded,
        void: counts.void,
        corners: result
            .footprint(tile)
            .corners()
            .iter()
            .map(|c| [c.lat, c.lon])
            .collect(),
        cells: result.codes(),
    }
}

fn to_geojson(tile: &ElevationTile, result: &ViewshedResult) -> GeoJson {
    let mut properties = JsonObject::new();
    properties.insert("tile".to_string(), JsonValue::from(tile.id().to_string()));
    properties.insert("kind".to_string(), JsonValue::from("footprint"));

    let footprint = Feature {
        bbox: None,
        geometry: Some(bbox_to_geometry(&tile.footprint())),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    };

    let mut window = viewshed_to_feature(result, tile);
    if let Some(props) = window.properties.as_mut() {
        props.insert("kind".to_string(), JsonValue::from("viewshed"));
    }

    GeoJson::FeatureCollection(FeatureCollection {
        bbox: None,
        features: vec![footprint, window],
        foreign_members: None,
    })
}

fn print_summary(tile: &ElevationTile, result: &ViewshedResult) {
    let observer = result.observer();
    let position = tile.cell_coordinate(observer.x, observer.y);
    let (origin_x, origin_y) = result.origin();
    let counts = result.counts();
    let total = (result.width() * result.height()) as f64;

    println!("Tile: {}", tile.id());
    println!(
        "Observer: cell ({}, {}) at {}, {}m above terrain",
        observer.x, observer.y, position, observer.height
    );
    println!(
        "Window: {}x{} cells from ({}, {})",
        result.width(),
        result.height(),
        origin_x,
        origin_y
    );
    println!("Footprint: {}", result.footprint(tile));
    println!();
    println!(
        "Visible:  {:>9} ({:.1}%)",
        counts.visible,
        counts.visible as f64 / total * 100.0
    );
    println!(
        "Occluded: {:>9} ({:.1}%)",
        counts.occluded,
        counts.occluded as f64 / total * 100.0
    );
    println!(
        "Void:     {:>9} ({:.1}%)",
        counts.void,
        counts.void as f64 / total * 100.0
    );
}
