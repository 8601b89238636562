//! Rejection of correspondence sets that cannot pin down an affine transform.
//!
//! An affine map from the image plane is determined only when the image-side
//! points span a 2D region. The measure used throughout is the signed area of
//! a triangle in normalized image units, compared against a single threshold
//! ([`SolverParams::min_triangle_area`](crate::SolverParams)).

use log::warn;

use crate::{GeoError, ImagePoint};

/// Signed area of the triangle `(p0, p1, p2)`.
///
/// Positive for counter-clockwise order in a y-up frame (clockwise on screen,
/// since image `y` grows downwards).
#[inline]
pub fn signed_area(p0: ImagePoint, p1: ImagePoint, p2: ImagePoint) -> f64 {
    0.5 * ((p1.x - p0.x) * (p2.y - p0.y) - (p2.x - p0.x) * (p1.y - p0.y))
}

/// Fail with [`GeoError::Collinear`] when the triangle is thinner than `min_area`.
pub fn check_triangle(
    p0: ImagePoint,
    p1: ImagePoint,
    p2: ImagePoint,
    min_area: f64,
) -> Result<(), GeoError> {
    let area = signed_area(p0, p1, p2).abs();
    if area < min_area {
        warn!("degenerate triangle: area {area:.3e} < {min_area:.3e}");
        return Err(GeoError::Collinear { area });
    }
    Ok(())
}

/// Largest absolute triangle area spanned by any three of `points`.
///
/// Returns 0 for fewer than three points. Cubic in the point count, which is
/// capped at a few dozen by the calibration modes.
pub fn max_triangle_area(points: &[ImagePoint]) -> f64 {
    let n = points.len();
    let mut best = 0.0_f64;
    for i in 0..n {
        for j in (i + 1)..n {
            for k in (j + 1)..n {
                best = best.max(signed_area(points[i], points[j], points[k]).abs());
            }
        }
    }
    best
}

/// Check that a point set spans enough area to determine an affine transform.
pub fn check_point_set(points: &[ImagePoint], min_area: f64) -> Result<(), GeoError> {
    if points.len() < 3 {
        return Err(GeoError::InsufficientPoints {
            needed: 3,
            have: points.len(),
        });
    }
    let area = max_triangle_area(points);
    if area < min_area {
        warn!(
            "degenerate point set ({} points): widest triangle {area:.3e} < {min_area:.3e}",
            points.len()
        );
        return Err(GeoError::Collinear { area });
    }
    Ok(())
}
