//! In-memory elevation grids.
//!
//! An [`ElevationGrid`] is a square, immutable matrix of elevation samples in
//! meters. Row 0 is the northern edge and column 0 the western edge. Cells are
//! addressed as `(x, y)` = `(column, row)`.

/// Sentinel marking a sample with no elevation data.
pub const VOID_ELEVATION: f64 = -32768.0;

/// Square matrix of elevation samples, row-major from the north-west corner.
#[derive(Debug, Clone, PartialEq)]
pub struct ElevationGrid {
    size: usize,
    samples: Vec<f64>,
}

/// Summary of the samples in a grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridStats {
    /// Lowest non-void sample, if any.
    pub min: Option<f64>,
    /// Highest non-void sample, if any.
    pub max: Option<f64>,
    /// Number of void samples.
    pub void_count: usize,
}

impl ElevationGrid {
    /// Build a grid from row-major samples.
    ///
    /// # Errors
    ///
    /// Returns [`FogError::InvalidGridShape`](crate::FogError::InvalidGridShape)
    /// if `samples.len()` is not `size * size`.
    pub fn from_samples(size: usize, samples: Vec<f64>) -> crate::Result<Self> {
        if size.checked_mul(size) != Some(samples.len()) {
            return Err(crate::FogError::InvalidGridShape {
                size,
                samples: samples.len(),
            });
        }
        Ok(Self { size, samples })
    }

    /// Number of samples per row and column.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Whether `(x, y)` addresses a cell of this grid.
    pub fn contains(&self, x: usize, y: usize) -> bool {
        x < self.size && y < self.size
    }

    /// Sample at column `x`, row `y`, or `None` outside the grid.
    ///
    /// Void samples are returned as [`VOID_ELEVATION`].
    pub fn get(&self, x: usize, y: usize) -> Option<f64> {
        if self.contains(x, y) {
            Some(self.samples[y * self.size + x])
        } else {
            None
        }
    }

    /// Whether the sample at `(x, y)` is the void sentinel.
    ///
    /// Cells outside the grid are not void; they simply do not exist.
    pub fn is_void(&self, x: usize, y: usize) -> bool {
        self.get(x, y).is_some_and(is_void)
    }

    /// Iterate over rows from north to south.
    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        self.samples.chunks_exact(self.size.max(1))
    }

    /// All samples, row-major.
    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    /// Minimum, maximum and void count over the whole grid.
    pub fn stats(&self) -> GridStats {
        let mut stats = GridStats {
            min: None,
            max: None,
            void_count: 0,
        };

        for &v in &self.samples {
            if is_void(v) {
                stats.void_count += 1;
            } else {
                stats.min = Some(stats.min.map_or(v, |m: f64| m.min(v)));
                stats.max = Some(stats.max.map_or(v, |m: f64| m.max(v)));
            }
        }

        stats
    }
}

/// Whether `value` is the void sentinel.
pub fn is_void(value: f64) -> bool {
    value == VOID_ELEVATION
}
