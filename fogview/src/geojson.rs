//! GeoJSON export of footprints and viewsheds.
//!
//! Enable the `geojson` feature to use this module.
//!
//! # Example
//!
//! ```ignore
//! use fogview::geojson::bbox_to_geometry;
//!
//! let geometry = bbox_to_geometry(&tile.footprint());
//! println!("{}", geometry);
//! // {"type":"Polygon","coordinates":[[[-75.0,39.0],[-75.0,40.0],...]]}
//! ```

use geojson::{Feature, Geometry, JsonObject, JsonValue, Value as GeoJsonValue};

use crate::bbox::BoundingBox;
use crate::tile::ElevationTile;
use crate::viewshed::ViewshedResult;

/// Polygon geometry of a bounding box.
///
/// The ring follows the corner order lower-left, upper-left, upper-right,
/// lower-right and is closed by repeating the first corner. Positions are in
/// GeoJSON order: `[longitude, latitude]`.
pub fn bbox_to_geometry(bbox: &BoundingBox) -> Geometry {
    let mut ring: Vec<Vec<f64>> = bbox
        .corners()
        .iter()
        .map(|c| vec![c.lon, c.lat])
        .collect();
    ring.push(ring[0].clone());

    Geometry::new(GeoJsonValue::Polygon(vec![ring]))
}

/// Feature describing a viewshed: the window outline plus summary properties.
///
/// Properties: `tile`, `observer_x`, `observer_y`, `observer_lat`,
/// `observer_lon`, `height`, `radius`, `width`, `rows`, `visible`,
/// `occluded`, `void`.
pub fn viewshed_to_feature(result: &ViewshedResult, tile: &ElevationTile) -> Feature {
    let observer = result.observer();
    let position = tile.cell_coordinate(observer.x, observer.y);
    let counts = result.counts();

    let mut properties = JsonObject::new();
    properties.insert("tile".to_string(), JsonValue::from(tile.id().to_string()));
    properties.insert("observer_x".to_string(), JsonValue::from(observer.x));
    properties.insert("observer_y".to_string(), JsonValue::from(observer.y));
    properties.insert("observer_lat".to_string(), JsonValue::from(position.lat));
    properties.insert("observer_lon".to_string(), JsonValue::from(position.lon));
    properties.insert("height".to_string(), JsonValue::from(observer.height));
    properties.insert("radius".to_string(), JsonValue::from(observer.radius));
    properties.insert("width".to_string(), JsonValue::from(result.width()));
    properties.insert("rows".to_string(), JsonValue::from(result.height()));
    properties.insert("visible".to_string(), JsonValue::from(counts.visible));
    properties.insert("occluded".to_string(), JsonValue::from(counts.occluded));
    properties.insert("void".to_string(), JsonValue::from(counts.void));

    Feature {
        bbox: None,
        geometry: Some(bbox_to_geometry(&result.footprint(tile))),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}
