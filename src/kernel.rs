use crate::errors::SlimeError;

/// Tolerance for rounding in user-supplied weights that are meant to sum to exactly one.
const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

/// A square convolution kernel with an odd side length.
///
/// Weights are stored row-major. They must be finite and non-negative and may
/// not sum to more than one, so a diffusion pass can never create mass or
/// produce negative concentrations.
#[derive(Clone, Debug, PartialEq)]
pub struct Kernel {
    radius: usize,
    weights: Vec<f64>,
}

impl Kernel {
    pub fn new(radius: usize, weights: Vec<f64>) -> Result<Self, SlimeError> {
        let area = area(radius)?;
        if weights.len() != area {
            return Err(SlimeError::InvalidKernel(format!(
                "a kernel of radius {} needs {} weights, got {}",
                radius,
                area,
                weights.len()
            )));
        }

        if let Some(weight) = weights.iter().find(|w| !w.is_finite() || **w < 0.0) {
            return Err(SlimeError::InvalidKernel(format!(
                "weights must be finite and non-negative, found {}",
                weight
            )));
        }

        let sum: f64 = weights.iter().sum();
        if sum > 1.0 + WEIGHT_SUM_TOLERANCE {
            return Err(SlimeError::InvalidKernel(format!(
                "weights sum to {}, which would add mass to the field",
                sum
            )));
        }

        Ok(Self { radius, weights })
    }

    /// Every weight is `1 / divisor`. The reference blur is `box_blur(1, 9.5)`.
    pub fn box_blur(radius: usize, divisor: f64) -> Result<Self, SlimeError> {
        if !divisor.is_finite() || divisor <= 0.0 {
            return Err(SlimeError::InvalidKernel(format!(
                "divisor must be positive, got {}",
                divisor
            )));
        }

        Self::new(radius, vec![1.0 / divisor; area(radius)?])
    }

    /// A box blur whose weights sum to exactly one.
    pub fn normalized_box(radius: usize) -> Self {
        let side = 2 * radius + 1;
        let area = (side * side) as f64;

        Self {
            radius,
            weights: vec![1.0 / area; side * side],
        }
    }

    pub fn radius(&self) -> usize {
        self.radius
    }

    pub fn side(&self) -> usize {
        2 * self.radius + 1
    }

    pub fn sum(&self) -> f64 {
        self.weights.iter().sum()
    }

    /// Weight at kernel row `ky`, column `kx`.
    pub fn weight(&self, ky: usize, kx: usize) -> f64 {
        self.weights[ky * self.side() + kx]
    }
}

impl Default for Kernel {
    fn default() -> Self {
        let side = 3;
        Self {
            radius: 1,
            weights: vec![1.0 / 9.5; side * side],
        }
    }
}

/// Number of weights in a kernel of `radius`, if it fits in memory at all.
fn area(radius: usize) -> Result<usize, SlimeError> {
    radius
        .checked_mul(2)
        .and_then(|diameter| diameter.checked_add(1))
        .and_then(|side| side.checked_mul(side))
        .ok_or_else(|| SlimeError::InvalidKernel(format!("radius {} is too large", radius)))
}
