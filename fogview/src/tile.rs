//! SRTM tile decoding.
//!
//! This module provides [`ElevationTile`], a decoded `.hgt` file: the tile's
//! identifier plus an immutable [`ElevationGrid`] of its samples.
//!
//! # File Format
//!
//! A `.hgt` file is a headerless run of big-endian signed 16-bit samples in
//! row-major order, starting at the north-west corner. The value `-32768`
//! marks a void sample and is kept as-is.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use memmap2::Mmap;

use crate::bbox::{BoundingBox, Coordinate};
use crate::error::{FogError, Result};
use crate::grid::ElevationGrid;
use crate::tile_id::TileId;

/// File size for SRTM1 (1 arc-second, ~30m resolution): 3601 × 3601 × 2 bytes
const SRTM1_SIZE: usize = 3601 * 3601 * 2; // 25,934,402 bytes

/// File size for SRTM3 (3 arc-second, ~90m resolution): 1201 × 1201 × 2 bytes
const SRTM3_SIZE: usize = 1201 * 1201 * 2; // 2,884,802 bytes

/// Number of samples per row/column for SRTM1
const SRTM1_SAMPLES: usize = 3601;

/// Number of samples per row/column for SRTM3
const SRTM3_SAMPLES: usize = 1201;

/// Trailing bytes tolerated after an SRTM3 grid: less than one row.
const MAX_SRTM3_TRAILER: usize = SRTM3_SAMPLES * 2;

/// Value indicating no data (void) in SRTM files
pub const VOID_VALUE: i16 = -32768;

/// Resolution type of an SRTM tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SrtmResolution {
    /// SRTM1: 1 arc-second (~30m) resolution
    Srtm1,
    /// SRTM3: 3 arc-second (~90m) resolution
    Srtm3,
}

impl SrtmResolution {
    /// Returns the number of samples per row/column for this resolution.
    pub fn samples(&self) -> usize {
        match self {
            SrtmResolution::Srtm1 => SRTM1_SAMPLES,
            SrtmResolution::Srtm3 => SRTM3_SAMPLES,
        }
    }

    /// Returns the approximate resolution in meters.
    pub fn meters(&self) -> f64 {
        match self {
            SrtmResolution::Srtm1 => 30.0,
            SrtmResolution::Srtm3 => 90.0,
        }
    }

    /// Number of bytes holding a full grid at this resolution.
    pub fn byte_len(&self) -> usize {
        match self {
            SrtmResolution::Srtm1 => SRTM1_SIZE,
            SrtmResolution::Srtm3 => SRTM3_SIZE,
        }
    }

    /// Pick the resolution for a buffer of `len` bytes.
    ///
    /// A buffer holding at least a full SRTM1 grid is SRTM1. Anything else is
    /// SRTM3, the reference format, as long as it carries less than one SRTM3
    /// row of trailing bytes. A longer buffer is a truncated SRTM1 tile.
    ///
    /// # Errors
    ///
    /// Returns [`FogError::InvalidTileSize`] for a truncated SRTM1 buffer.
    /// Buffers too short for SRTM3 are rejected later by [`decode`].
    pub fn detect(len: usize) -> Result<Self> {
        if len >= SRTM1_SIZE {
            Ok(SrtmResolution::Srtm1)
        } else if len < SRTM3_SIZE + MAX_SRTM3_TRAILER {
            Ok(SrtmResolution::Srtm3)
        } else {
            Err(FogError::InvalidTileSize {
                size: len,
                expected: SRTM1_SIZE,
            })
        }
    }
}

/// Decode raw `.hgt` bytes into an N×N grid.
///
/// Exactly `N * N` samples are read; trailing bytes are ignored.
///
/// # Errors
///
/// Returns [`FogError::InvalidTileSize`] if `bytes` holds fewer than `N * N`
/// samples.
pub fn decode(bytes: &[u8], resolution: SrtmResolution) -> Result<ElevationGrid> {
    let n = resolution.samples();
    let needed = resolution.byte_len();

    let body = bytes.get(..needed).ok_or(FogError::InvalidTileSize {
        size: bytes.len(),
        expected: needed,
    })?;

    // Each 2-byte chunk is one sample; the flat index maps to (row, col) as
    // (i / n, i % n), which is exactly the row-major layout of the grid.
    let samples: Vec<f64> = body
        .chunks_exact(2)
        .map(|pair| f64::from(i16::from_be_bytes([pair[0], pair[1]])))
        .collect();

    ElevationGrid::from_samples(n, samples)
}

/// Read the `.hgt` entry of a zip archive into memory.
pub(crate) fn read_hgt_from_zip(zip_path: &Path, filename: &str) -> Result<Vec<u8>> {
    let file = File::open(zip_path)?;
    let mut archive = zip::ZipArchive::new(file)?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let entry_name = entry.name().to_string();
        if entry_name.to_ascii_lowercase().ends_with(".hgt") || entry_name == filename {
            // The declared size is untrusted; never reserve more than a full SRTM1 grid
            let capacity = entry.size().min(SRTM1_SIZE as u64) as usize;
            let mut bytes = Vec::with_capacity(capacity);
            entry.read_to_end(&mut bytes)?;
            return Ok(bytes);
        }
    }

    Err(FogError::Archive(format!(
        "No .hgt file found in {}",
        zip_path.display()
    )))
}

/// A decoded SRTM tile.
///
/// # Example
///
/// ```ignore
/// use fogview::ElevationTile;
///
/// let tile = ElevationTile::from_file("N39W075.hgt")?;
/// println!("{} centred on {}", tile.id(), tile.center());
/// ```
#[derive(Debug, Clone)]
pub struct ElevationTile {
    id: TileId,
    resolution: SrtmResolution,
    grid: ElevationGrid,
}

impl ElevationTile {
    /// Decode a tile from its raw bytes.
    ///
    /// The resolution is detected from the byte length.
    pub fn from_bytes(id: TileId, bytes: &[u8]) -> Result<Self> {
        let resolution = SrtmResolution::detect(bytes.len())?;
        let grid = decode(bytes, resolution)?;
        Ok(Self {
            id,
            resolution,
            grid,
        })
    }

    /// Wrap an existing grid, e.g. a synthetic one.
    pub fn from_grid(id: TileId, grid: ElevationGrid) -> Self {
        let resolution = if grid.size() == SRTM1_SAMPLES {
            SrtmResolution::Srtm1
        } else {
            SrtmResolution::Srtm3
        };
        Self {
            id,
            resolution,
            grid,
        }
    }

    /// Load a tile from a `.hgt` file or a `.hgt.zip` archive.
    ///
    /// The tile identifier is parsed from the file name. Archives are read
    /// through [`ElevationTile::from_zip_with_id`].
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file name is not a valid tile identifier
    /// - The file cannot be opened or memory-mapped
    /// - The archive holds no `.hgt` entry
    /// - The file is too short to hold a full grid
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let name = path.to_string_lossy();
        let id = TileId::from_filename(&name)?;

        if name.to_ascii_lowercase().ends_with(".zip") {
            Self::from_zip_with_id(path, id)
        } else {
            Self::from_file_with_id(path, id)
        }
    }

    /// Decode the `.hgt` entry of a zip archive in memory.
    pub fn from_zip_with_id<P: AsRef<Path>>(path: P, id: TileId) -> Result<Self> {
        let bytes = read_hgt_from_zip(path.as_ref(), &id.filename())?;
        Self::from_bytes(id, &bytes)
    }

    /// Load a tile from a file whose name does not follow the naming convention.
    pub fn from_file_with_id<P: AsRef<Path>>(path: P, id: TileId) -> Result<Self> {
        let file = File::open(&path)?;

        // SAFETY: Memory mapping is safe as long as the file is not modified
        // while mapped. We open the file read-only and drop the mapping once
        // the samples have been copied out.
        let mmap = unsafe { Mmap::map(&file)? };

        Self::from_bytes(id, &mmap)
    }

    pub fn id(&self) -> TileId {
        self.id
    }

    pub fn resolution(&self) -> SrtmResolution {
        self.resolution
    }

    pub fn grid(&self) -> &ElevationGrid {
        &self.grid
    }

    /// Lower-left corner of the tile.
    pub fn geocode(&self) -> Coordinate {
        self.id.geocode()
    }

    /// Centre of the tile.
    pub fn center(&self) -> Coordinate {
        self.id.center()
    }

    /// Area covered by the tile.
    pub fn footprint(&self) -> BoundingBox {
        self.id.footprint()
    }

    /// Geographic position of the sample at column `x`, row `y`.
    ///
    /// Row 0 lies on the north edge of the tile and the last row on the south
    /// edge; likewise for columns west to east.
    pub fn cell_coordinate(&self, x: usize, y: usize) -> Coordinate {
        let last = self.last_index();
        Coordinate::new(
            self.id.lat() as f64 + 1.0 - y as f64 / last,
            self.id.lon() as f64 + x as f64 / last,
        )
    }

    /// Nearest sample to `coord`, or `None` if it lies outside the tile.
    pub fn cell_at(&self, coord: Coordinate) -> Option<(usize, usize)> {
        let lat_frac = coord.lat - self.id.lat() as f64;
        let lon_frac = coord.lon - self.id.lon() as f64;

        if !(0.0..=1.0).contains(&lat_frac) || !(0.0..=1.0).contains(&lon_frac) {
            return None;
        }

        // Rows are inverted: row 0 is the north edge
        let last = self.last_index();
        let max_index = self.grid.size().saturating_sub(1);
        let y = (((1.0 - lat_frac) * last).round() as usize).min(max_index);
        let x = ((lon_frac * last).round() as usize).min(max_index);

        Some((x, y))
    }

    /// Index of the last row/column as a float, never below 1.
    fn last_index(&self) -> f64 {
        (self.grid.size().max(2) - 1) as f64
    }
}
