//! Error types for the fogview library.

use std::path::PathBuf;
use thiserror::Error;

use crate::bbox::BoundingBox;

/// Broad failure category, used by callers that only care about the class of
/// error (e.g. to pick an HTTP status code).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The backing resource could not be read.
    Io,
    /// Malformed tile identifier, tile bytes or encoded value.
    Format,
    /// The caller violated a precondition of the operation.
    Precondition,
}

/// Errors that can occur when loading tiles or computing viewsheds.
#[derive(Error, Debug)]
pub enum FogError {
    /// IO error when reading files.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// No `.hgt` or `.hgt.zip` file exists for the tile.
    #[error("Tile {id} not found in {}", dir.display())]
    TileNotFound { id: String, dir: PathBuf },

    /// A `.hgt.zip` archive could not be read or holds no `.hgt` entry.
    #[error("Archive error: {0}")]
    Archive(String),

    /// Tile name does not match `<N|S>dd<E|W>ddd`.
    #[error("Invalid tile identifier: {name:?} (expected e.g. N35E138)")]
    InvalidTileId { name: String },

    /// Not enough bytes to hold a full sample grid.
    #[error("Invalid tile size: {size} bytes (need at least {expected})")]
    InvalidTileSize { size: usize, expected: usize },

    /// Sample count does not form a `size` × `size` grid.
    #[error("Invalid grid shape: {samples} samples for a {size}x{size} grid")]
    InvalidGridShape { size: usize, samples: usize },

    /// Observer cell lies outside the elevation grid.
    #[error("Observer ({x}, {y}) is outside the {size}x{size} grid")]
    ObserverOutOfBounds { x: usize, y: usize, size: usize },

    /// Intersection requested for boxes that do not overlap.
    #[error("Bounding boxes do not intersect: [{a}] and [{b}]")]
    NoIntersection { a: BoundingBox, b: BoundingBox },

    /// Lower-left corner is not south-west of the upper-right corner.
    #[error(
        "Invalid bounding box: lower-left ({ll_lat}, {ll_lon}) must be south-west of upper-right ({ur_lat}, {ur_lon})"
    )]
    InvalidBoundingBox {
        ll_lat: f64,
        ll_lon: f64,
        ur_lat: f64,
        ur_lon: f64,
    },

    /// Encoded bounding box has the wrong length.
    #[error("Invalid encoding: {reason}")]
    InvalidEncoding { reason: String },

    /// Encoded bounding box uses a version this build cannot read.
    #[error("Unsupported encoding version: {version}")]
    UnsupportedEncodingVersion { version: u8 },
}

impl FogError {
    /// Returns the failure category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            FogError::Io(_) | FogError::TileNotFound { .. } | FogError::Archive(_) => {
                ErrorKind::Io
            }
            FogError::InvalidTileId { .. }
            | FogError::InvalidTileSize { .. }
            | FogError::InvalidGridShape { .. }
            | FogError::InvalidEncoding { .. }
            | FogError::UnsupportedEncodingVersion { .. } => ErrorKind::Format,
            FogError::ObserverOutOfBounds { .. }
            | FogError::NoIntersection { .. }
            | FogError::InvalidBoundingBox { .. } => ErrorKind::Precondition,
        }
    }
}

impl From<zip::result::ZipError> for FogError {
    fn from(e: zip::result::ZipError) -> Self {
        FogError::Archive(e.to_string())
    }
}

/// Result type alias using [`FogError`].
pub type Result<T> = std::result::Result<T, FogError>;
