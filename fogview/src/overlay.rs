//! Map overlays handed to a renderer.
//!
//! The library never draws anything itself. It describes what to draw: either
//! the outline of a tile footprint or a viewshed image pinned to four corners.
//! A renderer matches on [`Rendering`] and projects the corners into its own
//! screen or map coordinates.

use crate::bbox::{BoundingBox, Coordinate};
use crate::tile::ElevationTile;
use crate::tile_id::TileId;
use crate::viewshed::{ViewshedResult, Visibility};

/// 8-bit RGBA colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

/// Alpha shared by all viewshed classes so terrain stays readable underneath.
const VIEWSHED_ALPHA: u8 = 75;

pub const OCCLUDED_COLOR: Rgba = Rgba::new(0, 0, 0, VIEWSHED_ALPHA);
pub const VOID_COLOR: Rgba = Rgba::new(126, 0, 126, VIEWSHED_ALPHA);
pub const VISIBLE_COLOR: Rgba = Rgba::new(0, 255, 0, VIEWSHED_ALPHA);

const FOOTPRINT_STROKE: Rgba = Rgba::new(128, 128, 128, 255);
const FOOTPRINT_FILL: Rgba = Rgba::new(128, 128, 128, 77);
const FOOTPRINT_LINE_WIDTH: f64 = 0.1;

/// Colour of a viewshed class.
pub fn color_of(visibility: Visibility) -> Rgba {
    match visibility {
        Visibility::Occluded => OCCLUDED_COLOR,
        Visibility::Void => VOID_COLOR,
        Visibility::Visible => VISIBLE_COLOR,
    }
}

/// A viewshed rasterised to one pixel per cell, row-major from the north edge.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewshedImage {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<Rgba>,
}

impl ViewshedImage {
    pub fn from_result(result: &ViewshedResult) -> Self {
        Self {
            width: result.width(),
            height: result.height(),
            pixels: result.cells().iter().copied().map(color_of).collect(),
        }
    }
}

/// Something to draw on the map.
#[derive(Debug, Clone, PartialEq)]
pub enum Overlay {
    /// Outline of the area covered by a tile.
    TileFootprint { id: TileId, footprint: BoundingBox },
    /// A viewshed image stretched over `footprint`.
    Viewshed {
        footprint: BoundingBox,
        image: ViewshedImage,
    },
}

/// Draw instructions for one overlay.
///
/// Corners are always in the order lower-left, upper-left, upper-right,
/// lower-right.
#[derive(Debug, Clone, PartialEq)]
pub enum Rendering {
    Polygon {
        corners: [Coordinate; 4],
        stroke: Rgba,
        fill: Rgba,
        line_width: f64,
    },
    Image {
        corners: [Coordinate; 4],
        width: usize,
        height: usize,
        pixels: Vec<Rgba>,
    },
}

impl Overlay {
    /// Footprint overlay for a loaded tile.
    pub fn tile(tile: &ElevationTile) -> Self {
        Overlay::TileFootprint {
            id: tile.id(),
            footprint: tile.footprint(),
        }
    }

    /// Viewshed overlay placed over the query window of `result` in `tile`.
    pub fn viewshed(tile: &ElevationTile, result: &ViewshedResult) -> Self {
        Overlay::Viewshed {
            footprint: result.footprint(tile),
            image: ViewshedImage::from_result(result),
        }
    }

    /// Area the overlay covers.
    pub fn footprint(&self) -> BoundingBox {
        match self {
            Overlay::TileFootprint { footprint, .. } | Overlay::Viewshed { footprint, .. } => {
                *footprint
            }
        }
    }

    pub fn render(&self) -> Rendering {
        match self {
            Overlay::TileFootprint { footprint, .. } => Rendering::Polygon {
                corners: footprint.corners(),
                stroke: FOOTPRINT_STROKE,
                fill: FOOTPRINT_FILL,
                line_width: FOOTPRINT_LINE_WIDTH,
            },
            Overlay::Viewshed { footprint, image } => Rendering::Image {
                corners: footprint.corners(),
                width: image.width,
                height: image.height,
                pixels: image.pixels.clone(),
            },
        }
    }
}
