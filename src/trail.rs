use crate::{
    errors::SlimeError,
    kernel::Kernel,
    settings::{Settings, FIELD_DIMENSION_MAXIMUM},
    Point2, Swapper,
};
use grid::Grid;
use log::{debug, warn};
use rayon::prelude::*;
use serde::Deserialize;
use std::{convert::TryFrom, str::FromStr};

/// How the diffusion convolution is executed. Both strategies produce the same field.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(try_from = "String")]
pub enum DiffusionStrategy {
    Serial,
    Parallel,
}

impl Default for DiffusionStrategy {
    fn default() -> Self {
        DiffusionStrategy::Parallel
    }
}

impl FromStr for DiffusionStrategy {
    type Err = SlimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "serial" => Ok(DiffusionStrategy::Serial),
            "parallel" => Ok(DiffusionStrategy::Parallel),
            other => Err(SlimeError::InvalidSetting {
                name: "diffusion_strategy",
                reason: format!("expected 'serial' or 'parallel', got '{}'", other),
            }),
        }
    }
}

// config hands every value over as a loosely typed scalar, so go through a string
impl TryFrom<String> for DiffusionStrategy {
    type Error = SlimeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// The shared grid of trail concentration that agents deposit onto and sense from.
///
/// Cells are addressed as `(x, y)` with `x` the column and `y` the row. Every
/// operation keeps every cell finite and non-negative, and no larger than the
/// configured maximum if there is one.
#[derive(Clone)]
pub struct TrailField {
    grid: Swapper<Grid<f64>>,
    kernel: Kernel,
    maximum: Option<f64>,
    strategy: DiffusionStrategy,
    width: usize,
    height: usize,
}

impl TrailField {
    /// An all-zero field using the reference blur kernel and no saturation ceiling.
    pub fn new(width: u32, height: u32) -> Result<Self, SlimeError> {
        if width == 0
            || height == 0
            || width > FIELD_DIMENSION_MAXIMUM
            || height > FIELD_DIMENSION_MAXIMUM
        {
            return Err(SlimeError::InvalidDimensions { width, height });
        }

        let (width, height) = (width as usize, height as usize);
        let grid = Grid::from_vec(vec![0.0; width * height], width);

        debug!(
            "Created new trail grid with {} rows and {} columns",
            grid.rows(),
            grid.cols()
        );

        Ok(Self {
            grid: Swapper::new(grid.clone(), grid),
            kernel: Kernel::default(),
            maximum: None,
            strategy: DiffusionStrategy::default(),
            width,
            height,
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, SlimeError> {
        let kernel = Kernel::box_blur(settings.diffusion_radius, settings.diffusion_divisor)?;

        Ok(Self::new(settings.field_width, settings.field_height)?
            .with_kernel(kernel)
            .with_maximum(settings.trail_maximum)
            .with_diffusion_strategy(settings.diffusion_strategy))
    }

    pub fn with_kernel(mut self, kernel: Kernel) -> Self {
        self.kernel = kernel;
        self
    }

    /// Sets the saturation ceiling. Ceilings that aren't positive are ignored.
    pub fn with_maximum(mut self, maximum: Option<f64>) -> Self {
        self.maximum = maximum.filter(|m| *m > 0.0);
        self
    }

    pub fn with_diffusion_strategy(mut self, strategy: DiffusionStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Sets every cell to `value`, saturated into the valid range.
    pub fn fill(&mut self, value: f64) {
        let value = self.saturate(value);
        self.grid.mut_a().iter_mut().for_each(|cell| *cell = value);
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn len(&self) -> usize {
        self.width * self.height
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn maximum(&self) -> Option<f64> {
        self.maximum
    }

    pub fn kernel(&self) -> &Kernel {
        &self.kernel
    }

    /// Multiplies every cell by `factor`.
    ///
    /// `factor` is expected in `(0, 1]`. Values outside that range are clamped
    /// into it (a non-positive factor empties the field) and a NaN factor
    /// leaves the field untouched. Both cases log a warning.
    pub fn decay(&mut self, factor: f64) {
        if factor.is_nan() {
            warn!("ignoring NaN decay factor");
            return;
        }

        let factor = if factor <= 0.0 || factor > 1.0 {
            let clamped = factor.clamp(0.0, 1.0);
            warn!("decay factor {} clamped to {}", factor, clamped);
            clamped
        } else {
            factor
        };

        self.grid
            .mut_a()
            .iter_mut()
            .for_each(|concentration| *concentration *= factor);
    }

    /// Convolves the field with the kernel. Cells outside the grid count as zero,
    /// so concentration bleeds away at the edges.
    pub fn diffuse(&mut self) {
        let (rows, cols) = (self.height, self.width);
        let kernel = &self.kernel;
        let (grid_a, grid_b) = self.grid.read_a_write_b();

        match self.strategy {
            DiffusionStrategy::Serial => {
                for row in 0..rows {
                    for col in 0..cols {
                        if let Some(cell) = grid_b.get_mut(row, col) {
                            *cell = convolve_cell(grid_a, kernel, row, col);
                        }
                    }
                }
            }
            DiffusionStrategy::Parallel => {
                let values: Vec<f64> = (0..rows * cols)
                    .into_par_iter()
                    .map(|index| convolve_cell(grid_a, kernel, index / cols, index % cols))
                    .collect();

                *grid_b = Grid::from_vec(values, cols);
            }
        }

        self.grid.swap()
    }

    /// Adds `amount` to cell `(x, y)`. Out-of-range coordinates are clamped onto
    /// the nearest edge cell.
    pub fn deposit(&mut self, x: i64, y: i64, amount: f64) {
        let (col, row) = self.clamp_coordinates(x, y);
        self.add_to_cell(row, col, amount);
    }

    /// Adds `amount` to every cell of a `side`×`side` square centred on `center`.
    ///
    /// The centre is rounded to the nearest cell and clamped into the grid; the
    /// parts of the square hanging off the grid are dropped.
    pub fn deposit_square(&mut self, center: Point2<f64>, side: u32, amount: f64) {
        let (center_col, center_row) =
            self.clamp_coordinates(round_to_cell(center.x()), round_to_cell(center.y()));
        let side = side as i64;
        let left = center_col as i64 - side / 2;
        let top = center_row as i64 - side / 2;

        for row in top.max(0)..(top + side).min(self.height as i64) {
            for col in left.max(0)..(left + side).min(self.width as i64) {
                self.add_to_cell(row as usize, col as usize, amount);
            }
        }
    }

    /// The concentration at `(x, y)` with both coordinates clamped into the grid.
    pub fn sample(&self, x: i64, y: i64) -> f64 {
        let (col, row) = self.clamp_coordinates(x, y);
        self.grid.a().get(row, col).copied().unwrap_or(0.0)
    }

    /// The concentration at `(x, y)`, or `None` outside the grid.
    pub fn get(&self, x: usize, y: usize) -> Option<f64> {
        self.grid.a().get(y, x).copied()
    }

    /// Row-major iteration over all cells.
    pub fn iter(&self) -> impl Iterator<Item = &f64> {
        self.grid.a().iter()
    }

    pub fn total_mass(&self) -> f64 {
        self.iter().sum()
    }

    fn add_to_cell(&mut self, row: usize, col: usize, amount: f64) {
        if !amount.is_finite() {
            warn!("ignoring non-finite deposit of {}", amount);
            return;
        }

        let maximum = self.maximum;
        if let Some(cell) = self.grid.mut_a().get_mut(row, col) {
            *cell = saturate(*cell + amount, maximum);
        }
    }

    fn saturate(&self, value: f64) -> f64 {
        saturate(value, self.maximum)
    }

    fn clamp_coordinates(&self, x: i64, y: i64) -> (usize, usize) {
        let col = x.max(0).min(self.width as i64 - 1) as usize;
        let row = y.max(0).min(self.height as i64 - 1) as usize;
        (col, row)
    }
}

fn saturate(value: f64, maximum: Option<f64>) -> f64 {
    // f64::max discards NaN, so a NaN collapses to zero here
    let value = value.max(0.0);
    match maximum {
        Some(maximum) => value.min(maximum),
        None if value.is_finite() => value,
        None => f64::MAX,
    }
}

fn round_to_cell(coordinate: f64) -> i64 {
    coordinate.round() as i64
}

/// A true convolution (the kernel is flipped) of the cell at `row`, `col`.
fn convolve_cell(grid: &Grid<f64>, kernel: &Kernel, row: usize, col: usize) -> f64 {
    let radius = kernel.radius();
    let side = kernel.side();
    let mut sum = 0.0;

    for ky in 0..side {
        let src_row = match (row + radius).checked_sub(ky) {
            Some(src_row) => src_row,
            None => continue,
        };

        for kx in 0..side {
            let src_col = match (col + radius).checked_sub(kx) {
                Some(src_col) => src_col,
                None => continue,
            };

            // cells past the far edges are simply missing from the grid
            if let Some(value) = grid.get(src_row, src_col) {
                sum += kernel.weight(ky, kx) * value;
            }
        }
    }

    sum
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::prelude::*;
    use rand::rngs::SmallRng;

    const EPSILON: f64 = 1e-12;

    fn normalized_field(width: u32, height: u32) -> TrailField {
        TrailField::new(width, height)
            .unwrap()
            .with_kernel(Kernel::normalized_box(1))
    }

    #[test]
    fn diffusion_strategy_parses_case_insensitively() {
        assert_eq!("Serial".parse::<DiffusionStrategy>().unwrap(), DiffusionStrategy::Serial);
        assert_eq!(
            DiffusionStrategy::try_from(" parallel ".to_string()).unwrap(),
            DiffusionStrategy::Parallel
        );
        assert!("gpu".parse::<DiffusionStrategy>().is_err());
    }

    #[test]
    fn new_field_rejects_oversized_dimensions() {
        assert!(matches!(
            TrailField::new(u32::MAX, u32::MAX),
            Err(SlimeError::InvalidDimensions { .. })
        ));
        assert!(TrailField::new(FIELD_DIMENSION_MAXIMUM + 1, 1).is_err());
        assert!(TrailField::new(FIELD_DIMENSION_MAXIMUM, 1).is_ok());
    }

    #[test]
    fn from_settings_applies_kernel_ceiling_and_strategy() {
        let settings = Settings {
            field_width: 12,
            field_height: 8,
            diffusion_radius: 2,
            diffusion_divisor: 26.0,
            trail_maximum: Some(100.0),
            diffusion_strategy: DiffusionStrategy::Serial,
            ..Settings::default()
        };

        let mut field = TrailField::from_settings(&settings).unwrap();

        assert_eq!((field.width(), field.height()), (12, 8));
        assert_eq!(field.maximum(), Some(100.0));
        assert_eq!(field.kernel(), &Kernel::box_blur(2, 26.0).unwrap());
        field.deposit(3, 3, 250.0);
        assert_eq!(field.sample(3, 3), 100.0);
    }

    #[test]
    fn new_field_rejects_zero_dimensions() {
        assert!(matches!(
            TrailField::new(0, 10),
            Err(SlimeError::InvalidDimensions { width: 0, height: 10 })
        ));
        assert!(TrailField::new(10, 0).is_err());
    }

    #[test]
    fn diffuse_does_nothing_when_trail_is_zero() {
        let mut field = TrailField::new(3, 3).unwrap();

        field.diffuse();

        field.iter().for_each(|value| assert_eq!(*value, 0.0));
    }

    #[test]
    fn diffuse_does_nothing_to_cell_when_value_is_same_as_in_all_neighboring_cells() {
        let mut field = normalized_field(3, 3);
        field.fill(1.0);

        field.diffuse();

        assert!((field.sample(1, 1) - 1.0).abs() < EPSILON);
    }

    // (0,0) (1,0) (2,0)
    // (0,1) (1,1) (2,1)
    // (0,2) (1,2) (2,2)

    #[test]
    fn diffuse_correctly_handles_corners() {
        let mut field = normalized_field(3, 3);
        field.fill(1.0);

        field.diffuse();

        for (x, y) in &[(0, 0), (2, 0), (2, 2), (0, 2)] {
            assert!(
                (field.sample(*x, *y) - 4.0 / 9.0).abs() < EPSILON,
                "corner ({}, {}) was {}",
                x,
                y,
                field.sample(*x, *y)
            );
        }
    }

    #[test]
    fn diffuse_correctly_handles_edges() {
        let mut field = normalized_field(3, 3);
        field.fill(1.0);

        field.diffuse();

        for (x, y) in &[(1, 0), (2, 1), (1, 2), (0, 1)] {
            assert!(
                (field.sample(*x, *y) - 6.0 / 9.0).abs() < EPSILON,
                "edge ({}, {}) was {}",
                x,
                y,
                field.sample(*x, *y)
            );
        }
    }

    #[test]
    fn diffuse_bleeds_more_at_a_corner_than_at_the_center() {
        let mut corner = TrailField::new(9, 9).unwrap();
        let mut center = TrailField::new(9, 9).unwrap();
        corner.deposit(0, 0, 100.0);
        center.deposit(4, 4, 100.0);

        corner.diffuse();
        center.diffuse();

        assert!(corner.total_mass() < center.total_mass());
        // a wrap-around boundary would have moved mass to the opposite corner
        assert_eq!(corner.sample(8, 8), 0.0);
        assert_eq!(corner.sample(8, 0), 0.0);
        assert!((corner.total_mass() - 400.0 / 9.5).abs() < 1e-9);
        assert!((center.total_mass() - 900.0 / 9.5).abs() < 1e-9);

        corner.diffuse();
        center.diffuse();

        assert!(corner.sample(0, 0) < center.sample(4, 4));
    }

    #[test]
    fn diffuse_flips_the_kernel_like_a_convolution() {
        let mut weights = vec![0.0; 9];
        weights[8] = 1.0;
        let mut field = TrailField::new(3, 3)
            .unwrap()
            .with_kernel(Kernel::new(1, weights).unwrap());
        field.deposit(1, 1, 5.0);

        field.diffuse();

        assert_eq!(field.sample(2, 2), 5.0);
        assert_eq!(field.sample(1, 1), 0.0);
        assert_eq!(field.sample(0, 0), 0.0);
    }

    #[test]
    fn serial_and_parallel_diffusion_agree() {
        let mut rng = SmallRng::seed_from_u64(7);
        let mut serial = TrailField::new(17, 11)
            .unwrap()
            .with_diffusion_strategy(DiffusionStrategy::Serial);
        let mut parallel = TrailField::new(17, 11)
            .unwrap()
            .with_diffusion_strategy(DiffusionStrategy::Parallel);

        for _ in 0..40 {
            let (x, y, amount) = (rng.gen_range(0..17), rng.gen_range(0..11), rng.gen::<f64>());
            serial.deposit(x, y, amount);
            parallel.deposit(x, y, amount);
        }

        for _ in 0..3 {
            serial.diffuse();
            parallel.diffuse();
        }

        serial
            .iter()
            .zip(parallel.iter())
            .for_each(|(s, p)| assert_eq!(s, p));
    }

    #[test]
    fn decay_never_increases_mass_and_strictly_decreases_it_below_one() {
        let mut field = TrailField::new(10, 10).unwrap();
        field.deposit(3, 3, 10.0);
        field.deposit(7, 2, 4.0);
        let before = field.total_mass();

        field.decay(1.0);
        assert_eq!(field.total_mass(), before);

        field.decay(230.0 / 255.0);
        assert!(field.total_mass() < before);
        assert!((field.sample(3, 3) - 10.0 * 230.0 / 255.0).abs() < EPSILON);
    }

    #[test]
    fn decay_clamps_out_of_range_factors() {
        let mut field = TrailField::new(4, 4).unwrap();
        field.deposit(1, 1, 2.0);

        field.decay(3.0);
        assert_eq!(field.sample(1, 1), 2.0);

        field.decay(f64::NAN);
        assert_eq!(field.sample(1, 1), 2.0);

        field.decay(-1.0);
        assert_eq!(field.total_mass(), 0.0);
    }

    #[test]
    fn deposit_is_visible_to_an_immediate_sample() {
        let mut field = TrailField::new(10, 10).unwrap();

        field.deposit(4, 6, 12.5);

        assert_eq!(field.sample(4, 6), 12.5);
        assert_eq!(field.get(4, 6), Some(12.5));
        assert_eq!(field.total_mass(), 12.5);
    }

    #[test]
    fn deposit_saturates_at_the_maximum() {
        let mut field = TrailField::new(4, 4).unwrap().with_maximum(Some(255.0));

        field.deposit(0, 0, 200.0);
        field.deposit(0, 0, 200.0);

        assert_eq!(field.sample(0, 0), 255.0);
    }

    #[test]
    fn deposit_clamps_out_of_range_coordinates() {
        let mut field = TrailField::new(5, 5).unwrap();

        field.deposit(-3, 100, 1.0);

        assert_eq!(field.sample(0, 4), 1.0);
        assert_eq!(field.total_mass(), 1.0);
    }

    #[test]
    fn deposit_square_covers_side_by_side_cells_around_the_center() {
        let mut field = TrailField::new(10, 10).unwrap();

        field.deposit_square(Point2::new(5.2, 4.8), 4, 1.0);

        assert_eq!(field.total_mass(), 16.0);
        for y in 3..7 {
            for x in 3..7 {
                assert_eq!(field.sample(x, y), 1.0);
            }
        }
    }

    #[test]
    fn deposit_square_is_clipped_at_the_edges() {
        let mut field = TrailField::new(10, 10).unwrap();

        field.deposit_square(Point2::new(0.0, 0.0), 4, 1.0);

        // columns/rows -2..2 minus the ones off the grid
        assert_eq!(field.total_mass(), 4.0);
        assert_eq!(field.sample(1, 1), 1.0);
    }

    #[test]
    fn sample_clamps_coordinates_into_the_grid() {
        let mut field = TrailField::new(5, 5).unwrap();
        field.deposit(4, 0, 3.0);

        assert_eq!(field.sample(50, -50), 3.0);
        assert_eq!(field.sample(i64::MAX, i64::MIN), 3.0);
        assert_eq!(field.get(5, 0), None);
    }

    #[test]
    fn cells_stay_non_negative_and_finite_through_a_mix_of_operations() {
        let mut rng = SmallRng::seed_from_u64(42);
        let mut field = TrailField::new(32, 24).unwrap().with_maximum(Some(255.0));

        for _ in 0..25 {
            field.decay(0.9);
            field.diffuse();
            for _ in 0..20 {
                let center = Point2::new(rng.gen_range(-5.0..40.0), rng.gen_range(-5.0..30.0));
                field.deposit_square(center, 3, rng.gen_range(0.0..255.0));
            }

            assert!(field
                .iter()
                .all(|value| value.is_finite() && *value >= 0.0 && *value <= 255.0));
        }
    }
}
