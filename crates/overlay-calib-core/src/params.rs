use serde::{Deserialize, Serialize};

/// Smallest image-space triangle area (normalized units, i.e. a fraction of
/// the image area) that still counts as a stable correspondence set.
///
/// The solver's determinant gate uses the same quantity: for three points the
/// Cramer determinant equals twice the signed triangle area.
pub const DEFAULT_MIN_TRIANGLE_AREA: f64 = 1e-3;

/// Soft cap on correspondences in multi-point calibration.
pub const DEFAULT_MAX_POINTS: usize = 20;

/// Numeric settings shared by the solver and the degeneracy detector.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverParams {
    /// Degeneracy threshold, see [`DEFAULT_MIN_TRIANGLE_AREA`].
    pub min_triangle_area: f64,
    /// Upper bound on the number of multi-point correspondences.
    pub max_points: usize,
}

impl Default for SolverParams {
    fn default() -> Self {
        Self {
            min_triangle_area: DEFAULT_MIN_TRIANGLE_AREA,
            max_points: DEFAULT_MAX_POINTS,
        }
    }
}

impl SolverParams {
    /// Determinant cutoff used by the exact three-point solve.
    #[inline]
    pub fn min_determinant(&self) -> f64 {
        2.0 * self.min_triangle_area
    }
}
