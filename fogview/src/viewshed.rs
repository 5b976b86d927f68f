//! Line-of-sight viewshed analysis.
//!
//! Given an [`ElevationGrid`] and an [`Observer`], [`compute`] classifies every
//! cell of the square window of half-width `radius` around the observer as
//! [`Visibility::Visible`], [`Visibility::Occluded`] or [`Visibility::Void`].
//! The window is clipped to the grid; cells beyond the grid edge are not part
//! of the result.
//!
//! For each target cell the straight line from the observer is stepped along
//! its dominant axis, one cell per step. At step `s` of `steps` the sight line
//! sits at `eye + (target - eye) * s / steps`. The target is occluded when an
//! intermediate cell's terrain rises strictly above the sight line; terrain
//! exactly on the line (grazing contact) does not occlude.
//!
//! The computation is pure and holds no state between calls, so independent
//! queries may run concurrently over a shared grid (see [`compute_many`]).

use rayon::prelude::*;

use crate::bbox::BoundingBox;
use crate::error::{FogError, Result};
use crate::grid::{is_void, ElevationGrid};
use crate::tile::ElevationTile;

/// Classification of a single cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Visibility {
    /// Terrain between the observer and the cell blocks the line of sight.
    Occluded,
    /// The cell or the observer has no elevation data.
    Void,
    /// The cell can be seen from the observer.
    Visible,
}

impl Visibility {
    /// Numeric code used by the JSON surfaces: occluded `0`, void `-1`,
    /// visible `1`.
    pub fn code(&self) -> i8 {
        match self {
            Visibility::Occluded => 0,
            Visibility::Void => -1,
            Visibility::Visible => 1,
        }
    }
}

/// A viewshed query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observer {
    /// Column of the observer cell.
    pub x: usize,
    /// Row of the observer cell (0 = north edge).
    pub y: usize,
    /// Eye height above the terrain, in meters.
    pub height: f64,
    /// Half-width of the square query window, in cells.
    pub radius: usize,
}

impl Observer {
    /// Observer at column `x`, row `y`, `height` meters above the terrain.
    pub fn new(x: usize, y: usize, height: f64, radius: usize) -> Self {
        Self {
            x,
            y,
            height,
            radius,
        }
    }
}

/// How the cells of one query are evaluated.
///
/// Both strategies run the same per-cell test and produce identical results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strategy {
    /// Evaluate the window row by row on the calling thread.
    #[default]
    Sequential,
    /// Spread the rows of the window over the rayon thread pool.
    Parallel,
}

/// Per-call viewshed configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ViewshedOptions {
    pub strategy: Strategy,
}

impl ViewshedOptions {
    /// Options using `strategy`.
    pub fn with_strategy(strategy: Strategy) -> Self {
        Self { strategy }
    }
}

/// Number of cells in each class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VisibilityCounts {
    pub visible: usize,
    pub occluded: usize,
    pub void: usize,
}

/// Classified query window.
///
/// Cells are stored row-major starting at grid cell
/// `(origin_x, origin_y)`, the north-west corner of the clipped window.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewshedResult {
    observer: Observer,
    origin_x: usize,
    origin_y: usize,
    width: usize,
    height: usize,
    cells: Vec<Visibility>,
}

impl ViewshedResult {
    /// The query that produced this result.
    pub fn observer(&self) -> Observer {
        self.observer
    }

    /// Grid cell of the window's north-west corner, as `(x, y)`.
    pub fn origin(&self) -> (usize, usize) {
        (self.origin_x, self.origin_y)
    }

    /// Number of window columns, after clipping to the grid.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of window rows, after clipping to the grid.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Classification of grid cell `(x, y)`, or `None` outside the window.
    pub fn get(&self, x: usize, y: usize) -> Option<Visibility> {
        let col = x.checked_sub(self.origin_x)?;
        let row = y.checked_sub(self.origin_y)?;
        self.get_local(col, row)
    }

    /// Classification at window-relative column and row.
    pub fn get_local(&self, col: usize, row: usize) -> Option<Visibility> {
        if col < self.width && row < self.height {
            Some(self.cells[row * self.width + col])
        } else {
            None
        }
    }

    /// All cells, row-major from the window's north-west corner.
    pub fn cells(&self) -> &[Visibility] {
        &self.cells
    }

    /// Iterate over window rows from north to south.
    pub fn rows(&self) -> impl Iterator<Item = &[Visibility]> {
        self.cells.chunks_exact(self.width)
    }

    /// Row-major numeric codes (see [`Visibility::code`]).
    pub fn codes(&self) -> Vec<i8> {
        self.cells.iter().map(Visibility::code).collect()
    }

    /// Number of cells in each class.
    pub fn counts(&self) -> VisibilityCounts {
        let mut counts = VisibilityCounts::default();
        for cell in &self.cells {
            match cell {
                Visibility::Visible => counts.visible += 1,
                Visibility::Occluded => counts.occluded += 1,
                Visibility::Void => counts.void += 1,
            }
        }
        counts
    }

    /// Geographic extent of the window's cell centres within `tile`.
    ///
    /// `tile` must be the tile whose grid produced this result.
    pub fn footprint(&self, tile: &ElevationTile) -> BoundingBox {
        let east = self.origin_x + self.width - 1;
        let south = self.origin_y + self.height - 1;
        BoundingBox::from_ordered(
            tile.cell_coordinate(self.origin_x, south),
            tile.cell_coordinate(east, self.origin_y),
        )
    }
}

/// Compute the viewshed of `observer` over `grid`.
///
/// # Errors
///
/// Returns [`FogError::ObserverOutOfBounds`] if the observer cell is not in
/// the grid. This is the only failure.
///
/// # Example
///
/// ```
/// use fogview::{viewshed, ElevationGrid, Observer, ViewshedOptions, Visibility};
///
/// let grid = ElevationGrid::from_samples(5, vec![0.0; 25])?;
/// let result = viewshed::compute(&grid, &Observer::new(2, 2, 1.7, 1), ViewshedOptions::default())?;
///
/// assert_eq!((result.width(), result.height()), (3, 3));
/// assert!(result.cells().iter().all(|c| *c == Visibility::Visible));
/// # Ok::<(), fogview::FogError>(())
/// ```
pub fn compute(
    grid: &ElevationGrid,
    observer: &Observer,
    options: ViewshedOptions,
) -> Result<ViewshedResult> {
    let size = grid.size();
    let ground = grid
        .get(observer.x, observer.y)
        .ok_or(FogError::ObserverOutOfBounds {
            x: observer.x,
            y: observer.y,
            size,
        })?;

    let x0 = observer.x.saturating_sub(observer.radius);
    let y0 = observer.y.saturating_sub(observer.radius);
    let x1 = observer.x.saturating_add(observer.radius).min(size - 1);
    let y1 = observer.y.saturating_add(observer.radius).min(size - 1);
    let width = x1 - x0 + 1;
    let height = y1 - y0 + 1;

    let sight = LineOfSight {
        grid,
        x: observer.x as isize,
        y: observer.y as isize,
        eye: ground + observer.height,
        observer_void: is_void(ground),
    };

    let mut cells = vec![Visibility::Occluded; width * height];
    let fill_row = |(row, out): (usize, &mut [Visibility])| {
        let ty = (y0 + row) as isize;
        for (col, cell) in out.iter_mut().enumerate() {
            *cell = sight.classify((x0 + col) as isize, ty);
        }
    };

    match options.strategy {
        Strategy::Sequential => cells.chunks_mut(width).enumerate().for_each(fill_row),
        Strategy::Parallel => cells.par_chunks_mut(width).enumerate().for_each(fill_row),
    }

    let result = ViewshedResult {
        observer: *observer,
        origin_x: x0,
        origin_y: y0,
        width,
        height,
        cells,
    };

    let counts = result.counts();
    tracing::debug!(
        x = observer.x,
        y = observer.y,
        height = observer.height,
        radius = observer.radius,
        strategy = ?options.strategy,
        visible = counts.visible,
        occluded = counts.occluded,
        void = counts.void,
        "Viewshed computed"
    );

    Ok(result)
}

/// Compute several independent viewsheds over the same grid in parallel.
///
/// Results are returned in the order of `observers`. A failing query does not
/// affect the others.
pub fn compute_many(
    grid: &ElevationGrid,
    observers: &[Observer],
    options: ViewshedOptions,
) -> Vec<Result<ViewshedResult>> {
    observers
        .par_iter()
        .map(|observer| compute(grid, observer, options))
        .collect()
}

/// Per-query state shared by every target cell.
struct LineOfSight<'a> {
    grid: &'a ElevationGrid,
    x: isize,
    y: isize,
    eye: f64,
    observer_void: bool,
}

impl LineOfSight<'_> {
    fn classify(&self, tx: isize, ty: isize) -> Visibility {
        if tx == self.x && ty == self.y {
            return Visibility::Visible;
        }

        let target = match self.sample(tx, ty) {
            Some(v) if !self.observer_void && !is_void(v) => v,
            _ => return Visibility::Void,
        };

        let dx = tx - self.x;
        let dy = ty - self.y;
        let steps = dx.abs().max(dy.abs());
        let steps_f = steps as f64;

        for s in 1..steps {
            let cx = self.x + step_offset(dx, s, steps);
            let cy = self.y + step_offset(dy, s, steps);

            let terrain = match self.sample(cx, cy) {
                Some(v) if !is_void(v) => v,
                // Unknown terrain cannot block the view
                _ => continue,
            };

            // terrain > eye + (target - eye) * s / steps, scaled by `steps`
            // so the comparison involves no division.
            let line = self.eye * (steps - s) as f64 + target * s as f64;
            if terrain * steps_f > line {
                return Visibility::Occluded;
            }
        }

        Visibility::Visible
    }

    fn sample(&self, x: isize, y: isize) -> Option<f64> {
        if x < 0 || y < 0 {
            return None;
        }
        self.grid.get(x as usize, y as usize)
    }
}

/// Offset along one axis after `s` of `steps` steps towards `delta`,
/// rounded half away from zero.
///
/// On the dominant axis (`|delta| == steps`) this is exactly `±s`, so every
/// intermediate row or column is visited once.
fn step_offset(delta: isize, s: isize, steps: isize) -> isize {
    delta.signum() * ((2 * delta.abs() * s + steps) / (2 * steps))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::VOID_ELEVATION;

    fn flat(size: usize, elevation: f64) -> ElevationGrid {
        ElevationGrid::from_samples(size, vec![elevation; size * size]).unwrap()
    }

    fn with_cells(size: usize, base: f64, cells: &[(usize, usize, f64)]) -> ElevationGrid {
        let mut samples = vec![base; size * size];
        for &(x, y, v) in cells {
            samples[y * size + x] = v;
        }
        ElevationGrid::from_samples(size, samples).unwrap()
    }

    fn run(grid: &ElevationGrid, observer: Observer) -> ViewshedResult {
        compute(grid, &observer, ViewshedOptions::default()).unwrap()
    }

    #[test]
    fn test_flat_grid_fully_visible() {
        let grid = flat(21, 100.0);
        for height in [0.0, 1.7, 30.0] {
            for radius in [1, 4, 10, 50] {
                let result = run(&grid, Observer::new(10, 7, height, radius));
                let counts = result.counts();
                assert_eq!(counts.occluded, 0, "height {height} radius {radius}");
                assert_eq!(counts.void, 0);
                assert_eq!(counts.visible, result.width() * result.height());
            }
        }
    }

    #[test]
    fn test_observer_cell_always_visible() {
        let grid = with_cells(5, 0.0, &[(2, 2, VOID_ELEVATION)]);
        let result = run(&grid, Observer::new(2, 2, 10.0, 2));
        assert_eq!(result.get(2, 2), Some(Visibility::Visible));
    }

    #[test]
    fn test_spike_occludes_farther_cell() {
        let grid = with_cells(11, 0.0, &[(5, 5, 10.0)]);
        let result = run(&grid, Observer::new(0, 5, 1.0, 10));

        // Sight line at the spike sits at 0.5m, the spike is 10m
        assert_eq!(result.get(10, 5), Some(Visibility::Occluded));
        assert_eq!(result.get(8, 5), Some(Visibility::Occluded));
        // The spike itself and the cells in front of it are visible
        assert_eq!(result.get(5, 5), Some(Visibility::Visible));
        assert_eq!(result.get(3, 5), Some(Visibility::Visible));
    }

    #[test]
    fn test_grazing_contact_does_not_occlude() {
        // Eye at 10m, target at 0m four cells away: the line is at 5m halfway
        let grazing = with_cells(5, 0.0, &[(2, 0, 5.0)]);
        let result = run(&grazing, Observer::new(0, 0, 10.0, 4));
        assert_eq!(result.get(4, 0), Some(Visibility::Visible));

        let blocking = with_cells(5, 0.0, &[(2, 0, 5.5)]);
        let result = run(&blocking, Observer::new(0, 0, 10.0, 4));
        assert_eq!(result.get(4, 0), Some(Visibility::Occluded));
    }

    #[test]
    fn test_grazing_with_fractional_steps() {
        // Eye 9m, target 0m, three steps: line at 6m then 3m
        let grid = with_cells(4, 0.0, &[(1, 0, 6.0), (2, 0, 3.0)]);
        let result = run(&grid, Observer::new(0, 0, 9.0, 3));
        assert_eq!(result.get(3, 0), Some(Visibility::Visible));
    }

    #[test]
    fn test_diagonal_stepping_path() {
        // From (0,0) to (3,1) the path visits (1,0) then (2,1)
        let on_path = with_cells(4, 0.0, &[(2, 1, 50.0)]);
        let result = run(&on_path, Observer::new(0, 0, 2.0, 3));
        assert_eq!(result.get(3, 1), Some(Visibility::Occluded));

        let off_path = with_cells(4, 0.0, &[(2, 0, 50.0)]);
        let result = run(&off_path, Observer::new(0, 0, 2.0, 3));
        assert_eq!(result.get(3, 1), Some(Visibility::Visible));
        assert_eq!(result.get(3, 0), Some(Visibility::Occluded));
    }

    #[test]
    fn test_stepping_is_symmetric() {
        assert_eq!(step_offset(3, 1, 3), 1);
        assert_eq!(step_offset(-3, 1, 3), -1);
        assert_eq!(step_offset(1, 1, 3), 0);
        assert_eq!(step_offset(1, 2, 3), 1);
        assert_eq!(step_offset(-1, 2, 3), -1);
        // Halfway rounds away from zero
        assert_eq!(step_offset(1, 1, 2), 1);
        assert_eq!(step_offset(-1, 1, 2), -1);
    }

    #[test]
    fn test_void_target_is_void() {
        let grid = with_cells(7, 0.0, &[(5, 3, VOID_ELEVATION), (1, 1, 200.0)]);
        let result = run(&grid, Observer::new(3, 3, 2.0, 3));
        assert_eq!(result.get(5, 3), Some(Visibility::Void));
        assert_eq!(result.counts().void, 1);
    }

    #[test]
    fn test_void_observer_voids_everything_else() {
        let grid = with_cells(5, 0.0, &[(2, 2, VOID_ELEVATION)]);
        let result = run(&grid, Observer::new(2, 2, 2.0, 2));
        let counts = result.counts();
        assert_eq!(counts.visible, 1);
        assert_eq!(counts.void, 24);
    }

    #[test]
    fn test_void_on_path_does_not_occlude() {
        let grid = with_cells(5, 0.0, &[(2, 0, VOID_ELEVATION)]);
        let result = run(&grid, Observer::new(0, 0, 0.0, 4));
        assert_eq!(result.get(4, 0), Some(Visibility::Visible));
        assert_eq!(result.get(2, 0), Some(Visibility::Void));
    }

    #[test]
    fn test_window_clipped_to_grid() {
        let grid = flat(10, 0.0);
        let result = run(&grid, Observer::new(1, 8, 1.0, 3));

        assert_eq!(result.origin(), (0, 5));
        assert_eq!((result.width(), result.height()), (5, 5));
        assert_eq!(result.cells().len(), 25);
        assert_eq!(result.get(4, 9), Some(Visibility::Visible));
        assert_eq!(result.get(5, 9), None);
        assert_eq!(result.get(0, 4), None);
    }

    #[test]
    fn test_radius_larger_than_grid() {
        let grid = flat(6, 0.0);
        let result = run(&grid, Observer::new(3, 3, 1.0, 1000));
        assert_eq!(result.origin(), (0, 0));
        assert_eq!((result.width(), result.height()), (6, 6));
    }

    #[test]
    fn test_zero_radius() {
        let grid = flat(3, 0.0);
        let result = run(&grid, Observer::new(1, 1, 0.0, 0));
        assert_eq!(result.cells(), &[Visibility::Visible]);
    }

    #[test]
    fn test_observer_out_of_bounds() {
        let grid = flat(4, 0.0);
        let err = compute(&grid, &Observer::new(4, 0, 1.0, 2), ViewshedOptions::default())
            .unwrap_err();
        assert!(matches!(
            err,
            FogError::ObserverOutOfBounds { x: 4, y: 0, size: 4 }
        ));
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let size = 40;
        let samples = (0..size * size)
            .map(|i| {
                let (x, y) = (i % size, i / size);
                if (x * 7 + y * 3) % 97 == 0 {
                    VOID_ELEVATION
                } else {
                    ((x * 37 + y * 91) % 53) as f64
                }
            })
            .collect();
        let grid = ElevationGrid::from_samples(size, samples).unwrap();
        let observer = Observer::new(17, 22, 12.5, 15);

        let sequential =
            compute(&grid, &observer, ViewshedOptions::with_strategy(Strategy::Sequential))
                .unwrap();
        let parallel =
            compute(&grid, &observer, ViewshedOptions::with_strategy(Strategy::Parallel)).unwrap();

        assert_eq!(sequential, parallel);
        assert!(sequential.counts().occluded > 0);
    }

    #[test]
    fn test_compute_many_independent() {
        let grid = flat(8, 0.0);
        let observers = [
            Observer::new(1, 1, 2.0, 2),
            Observer::new(99, 1, 2.0, 2),
            Observer::new(6, 6, 2.0, 1),
        ];

        let results = compute_many(&grid, &observers, ViewshedOptions::default());
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().width(), 4);
        assert!(matches!(
            results[1],
            Err(FogError::ObserverOutOfBounds { .. })
        ));
        assert_eq!(results[2].as_ref().unwrap().observer(), observers[2]);
    }

    #[test]
    fn test_codes_and_rows() {
        let grid = with_cells(3, 0.0, &[(0, 2, VOID_ELEVATION)]);
        let result = run(&grid, Observer::new(1, 1, 1.0, 1));
        assert_eq!(result.codes(), vec![1, 1, 1, 1, 1, 1, -1, 1, 1]);
        assert_eq!(result.rows().count(), 3);
    }

    #[test]
    fn test_footprint_of_window() {
        let tile = ElevationTile::from_grid(crate::TileId::new(35, 138), flat(11, 0.0));
        let result = run(tile.grid(), Observer::new(5, 5, 1.0, 5));
        let fp = result.footprint(&tile);
        assert_eq!(fp, tile.footprint());

        let result = run(tile.grid(), Observer::new(0, 0, 1.0, 5));
        let fp = result.footprint(&tile);
        assert_eq!(fp.upper_left(), tile.footprint().upper_left());
        assert_eq!(fp.lower_right().lat, 35.5);
        assert_eq!(fp.lower_right().lon, 138.5);
    }
}
