//! Planar affine transform from normalized image space to geo space.
//!
//! ```text
//! lng = a*x + b*y + c
//! lat = d*x + e*y + f
//! ```
//!
//! Latitude and longitude are treated as flat Cartesian axes, which is accurate
//! enough over the few-kilometre extents of a property map.

use log::warn;
use nalgebra::{Matrix3, Matrix3x2};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::degeneracy::{check_point_set, max_triangle_area};
use crate::{GeoBounds, GeoError, GeoPoint, ImagePoint, SolverParams};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AffineMatrix {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl AffineMatrix {
    pub fn from_array(v: [f64; 6]) -> Self {
        Self {
            a: v[0],
            b: v[1],
            c: v[2],
            d: v[3],
            e: v[4],
            f: v[5],
        }
    }

    pub fn to_array(&self) -> [f64; 6] {
        [self.a, self.b, self.c, self.d, self.e, self.f]
    }

    /// Transform mapping the unit square onto `bounds`, north-west at `(0, 0)`.
    pub fn from_bounds(bounds: &GeoBounds) -> Self {
        Self {
            a: bounds.east - bounds.west,
            b: 0.0,
            c: bounds.west,
            d: 0.0,
            e: bounds.south - bounds.north,
            f: bounds.north,
        }
    }

    /// Transform sending image corners `(0,0)`, `(1,0)`, `(0,1)` to the given
    /// geo points. The fourth corner lands on the parallelogram completion.
    pub fn from_corners(top_left: GeoPoint, top_right: GeoPoint, bottom_left: GeoPoint) -> Self {
        Self {
            a: top_right.lng - top_left.lng,
            b: bottom_left.lng - top_left.lng,
            c: top_left.lng,
            d: top_right.lat - top_left.lat,
            e: bottom_left.lat - top_left.lat,
            f: top_left.lat,
        }
    }

    /// Exact solve through three correspondences (Cramer's rule).
    pub fn from_three_points(
        image: &[ImagePoint; 3],
        geo: &[GeoPoint; 3],
        params: &SolverParams,
    ) -> Result<Self, GeoError> {
        let x = image.map(|p| p.x);
        let y = image.map(|p| p.y);
        let det = x[0] * (y[1] - y[2]) - y[0] * (x[1] - x[2]) + (x[1] * y[2] - x[2] * y[1]);
        if det.abs() < params.min_determinant() {
            warn!("three-point solve rejected: |det| = {:.3e}", det.abs());
            return Err(GeoError::Collinear {
                area: 0.5 * det.abs(),
            });
        }

        let (a, b, c) = cramer_row(&x, &y, &geo.map(|g| g.lng), det);
        let (d, e, f) = cramer_row(&x, &y, &geo.map(|g| g.lat), det);
        Ok(Self { a, b, c, d, e, f })
    }

    /// Least-squares fit over all correspondences (normal equations).
    ///
    /// Points are shifted to their centroids before building `AᵀA`, which keeps
    /// the system well conditioned when geo values are large and close together.
    pub fn fit_least_squares(
        image: &[ImagePoint],
        geo: &[GeoPoint],
        params: &SolverParams,
    ) -> Result<Self, GeoError> {
        check_lengths(image, geo)?;
        check_point_set(image, params.min_triangle_area)?;

        let n = image.len() as f64;
        let (cx, cy) = mean(image.iter().map(|p| (p.x, p.y)), n);
        let (clng, clat) = mean(geo.iter().map(|g| (g.lng, g.lat)), n);

        let mut ata = Matrix3::<f64>::zeros();
        let mut atb = Matrix3x2::<f64>::zeros();
        for (p, g) in image.iter().zip(geo) {
            let row = [p.x - cx, p.y - cy, 1.0];
            let rhs = [g.lng - clng, g.lat - clat];
            for r in 0..3 {
                for s in 0..3 {
                    ata[(r, s)] += row[r] * row[s];
                }
                atb[(r, 0)] += row[r] * rhs[0];
                atb[(r, 1)] += row[r] * rhs[1];
            }
        }

        let sol = ata
            .lu()
            .solve(&atb)
            .ok_or_else(|| GeoError::Collinear {
                area: max_triangle_area(image),
            })?;

        let (a, b) = (sol[(0, 0)], sol[(1, 0)]);
        let (d, e) = (sol[(0, 1)], sol[(1, 1)]);
        Ok(Self {
            a,
            b,
            c: clng + sol[(2, 0)] - a * cx - b * cy,
            d,
            e,
            f: clat + sol[(2, 1)] - d * cx - e * cy,
        })
    }

    /// Map an image point to geo space.
    #[inline]
    pub fn apply(&self, p: ImagePoint) -> GeoPoint {
        GeoPoint {
            lng: self.a * p.x + self.b * p.y + self.c,
            lat: self.d * p.x + self.e * p.y + self.f,
        }
    }

    /// Determinant of the linear part.
    #[inline]
    pub fn determinant(&self) -> f64 {
        self.a * self.e - self.b * self.d
    }

    /// True when the linear part collapses the image onto a line or a point,
    /// relative to the size of its coefficients.
    pub fn is_singular(&self) -> bool {
        self.determinant().abs() <= f64::EPSILON * self.scale()
    }

    /// Map a geo point back onto the image plane.
    ///
    /// `None` when the linear part is singular. The result may fall outside the
    /// unit square for geo points beyond the overlay.
    pub fn unproject(&self, g: GeoPoint) -> Option<ImagePoint> {
        if self.is_singular() {
            return None;
        }
        let det = self.determinant();
        let du = g.lng - self.c;
        let dv = g.lat - self.f;
        Some(ImagePoint {
            x: (self.e * du - self.b * dv) / det,
            y: (self.a * dv - self.d * du) / det,
        })
    }

    /// Geo positions of the four image corners, TL, TR, BR, BL.
    pub fn project_corners(&self) -> [GeoPoint; 4] {
        ImagePoint::CORNERS.map(|p| self.apply(p))
    }

    /// Axis-aligned envelope of the projected image.
    pub fn image_bounds(&self) -> GeoBounds {
        let corners = self.project_corners();
        GeoBounds {
            north: corners.iter().map(|g| g.lat).fold(f64::NEG_INFINITY, f64::max),
            south: corners.iter().map(|g| g.lat).fold(f64::INFINITY, f64::min),
            east: corners.iter().map(|g| g.lng).fold(f64::NEG_INFINITY, f64::max),
            west: corners.iter().map(|g| g.lng).fold(f64::INFINITY, f64::min),
        }
    }

    /// Per-correspondence distance (degrees) between the projected image point
    /// and its recorded geo point.
    pub fn residuals(&self, image: &[ImagePoint], geo: &[GeoPoint]) -> Vec<f64> {
        image
            .iter()
            .zip(geo)
            .map(|(&p, g)| self.apply(p).distance_deg(g))
            .collect()
    }

    /// Root-mean-square of [`residuals`](Self::residuals); 0 for empty input.
    pub fn rms_residual(&self, image: &[ImagePoint], geo: &[GeoPoint]) -> f64 {
        let r = self.residuals(image, geo);
        if r.is_empty() {
            return 0.0;
        }
        (r.iter().map(|v| v * v).sum::<f64>() / r.len() as f64).sqrt()
    }

    fn scale(&self) -> f64 {
        self.a.abs().max(self.b.abs()) * self.d.abs().max(self.e.abs())
    }
}

/// Estimate the image→geo transform from `image[i] ↔ geo[i]` correspondences.
///
/// Three points are solved exactly; four or more are fitted by least squares
/// across every point.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip_all, fields(points = image.len()))
)]
pub fn estimate_affine(
    image: &[ImagePoint],
    geo: &[GeoPoint],
    params: &SolverParams,
) -> Result<AffineMatrix, GeoError> {
    check_lengths(image, geo)?;
    match (image, geo) {
        ([p0, p1, p2], [g0, g1, g2]) => {
            AffineMatrix::from_three_points(&[*p0, *p1, *p2], &[*g0, *g1, *g2], params)
        }
        _ => AffineMatrix::fit_least_squares(image, geo, params),
    }
}

fn check_lengths(image: &[ImagePoint], geo: &[GeoPoint]) -> Result<(), GeoError> {
    if image.len() != geo.len() {
        return Err(GeoError::MismatchedLengths {
            image: image.len(),
            geo: geo.len(),
        });
    }
    if image.len() < 3 {
        return Err(GeoError::InsufficientPoints {
            needed: 3,
            have: image.len(),
        });
    }
    Ok(())
}

fn mean(values: impl Iterator<Item = (f64, f64)>, n: f64) -> (f64, f64) {
    let (sx, sy) = values.fold((0.0, 0.0), |(ax, ay), (x, y)| (ax + x, ay + y));
    (sx / n, sy / n)
}

/// Solve `[x y 1] · (p, q, r)ᵀ = w` for three rows; `det` is the system determinant.
fn cramer_row(x: &[f64; 3], y: &[f64; 3], w: &[f64; 3], det: f64) -> (f64, f64, f64) {
    let p = w[0] * (y[1] - y[2]) + w[1] * (y[2] - y[0]) + w[2] * (y[0] - y[1]);
    let q = x[0] * (w[1] - w[2]) - w[0] * (x[1] - x[2]) + (x[1] * w[2] - x[2] * w[1]);
    let r = x[0] * (y[1] * w[2] - y[2] * w[1]) - y[0] * (x[1] * w[2] - x[2] * w[1])
        + w[0] * (x[1] * y[2] - x[2] * y[1]);
    (p / det, q / det, r / det)
}
