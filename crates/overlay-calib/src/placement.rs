//! Placement derivation: where the overlay image lands on the map.
//!
//! Each mode has its own rule:
//! - two-corner: axis-aligned box spanned by the two geo points;
//! - three-corner: parallelogram through top-left, top-right and bottom-left,
//!   bottom-right implied;
//! - multi-point: affine fit over all points, image corners projected through
//!   it and enclosed in an axis-aligned box.
//!
//! Every rule also yields the image→geo [`AffineMatrix`] it implies, so callers
//! can project arbitrary image positions. A placement whose transform is
//! singular (the overlay would collapse onto a line or a point on the map) is
//! rejected as [`CalibrationError::Collinear`] in every mode.
//!
//! The corner modes find each corner by its label, not by list position.

use log::debug;
use overlay_calib_core::{
    check_triangle, estimate_affine, AffineMatrix, GeoBounds, GeoPoint, ImagePoint, SolverParams,
};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::gcp::split;
use crate::{CalibrationError, CalibrationMode, GroundControlPoint};

/// Parallelogram placement; the bottom-right corner is implied.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RotatedQuad {
    pub top_left: GeoPoint,
    pub top_right: GeoPoint,
    pub bottom_left: GeoPoint,
}

impl RotatedQuad {
    /// Parallelogram completion `top_right - top_left + bottom_left`, per axis.
    #[inline]
    pub fn bottom_right(&self) -> GeoPoint {
        GeoPoint {
            lat: self.top_right.lat - self.top_left.lat + self.bottom_left.lat,
            lng: self.top_right.lng - self.top_left.lng + self.bottom_left.lng,
        }
    }

    /// TL, TR, BR, BL.
    pub fn corners(&self) -> [GeoPoint; 4] {
        [
            self.top_left,
            self.top_right,
            self.bottom_right(),
            self.bottom_left,
        ]
    }

    /// Axis-aligned envelope over all four corners.
    pub fn bounds(&self) -> GeoBounds {
        let corners = self.corners();
        GeoBounds {
            north: corners.iter().map(|p| p.lat).fold(f64::NEG_INFINITY, f64::max),
            south: corners.iter().map(|p| p.lat).fold(f64::INFINITY, f64::min),
            east: corners.iter().map(|p| p.lng).fold(f64::NEG_INFINITY, f64::max),
            west: corners.iter().map(|p| p.lng).fold(f64::INFINITY, f64::min),
        }
    }
}

/// Renderer-facing description of the overlay's position.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Placement {
    AxisAligned(GeoBounds),
    Rotated(RotatedQuad),
}

impl Placement {
    /// Bounding rectangle, for consumers that cannot draw a skewed image.
    pub fn bounds(&self) -> GeoBounds {
        match self {
            Placement::AxisAligned(b) => *b,
            Placement::Rotated(q) => q.bounds(),
        }
    }

    /// Geo corners in TL, TR, BR, BL order.
    pub fn corners(&self) -> [GeoPoint; 4] {
        match self {
            Placement::AxisAligned(b) => b.corners(),
            Placement::Rotated(q) => q.corners(),
        }
    }
}

/// A derived placement together with the image→geo transform behind it.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlacementSolution {
    pub placement: Placement,
    pub transform: AffineMatrix,
}

/// Two-corner rule: the box spanned by two geo points, whatever order they
/// were clicked in.
///
/// A box with zero height or width is rejected as degenerate.
pub fn derive_two_corner(p1: GeoPoint, p2: GeoPoint) -> Result<PlacementSolution, CalibrationError> {
    let bounds = GeoBounds {
        north: p1.lat.max(p2.lat),
        south: p1.lat.min(p2.lat),
        east: p1.lng.max(p2.lng),
        west: p1.lng.min(p2.lng),
    };
    non_degenerate(PlacementSolution {
        placement: Placement::AxisAligned(bounds),
        transform: AffineMatrix::from_bounds(&bounds),
    })
}

/// Three-corner rule. `image` holds where the three corners were clicked on
/// the image; they must span a proper triangle.
pub fn derive_three_corner(
    image: [ImagePoint; 3],
    geo: [GeoPoint; 3],
    params: &SolverParams,
) -> Result<PlacementSolution, CalibrationError> {
    check_triangle(image[0], image[1], image[2], params.min_triangle_area)?;
    let [top_left, top_right, bottom_left] = geo;
    non_degenerate(PlacementSolution {
        placement: Placement::Rotated(RotatedQuad {
            top_left,
            top_right,
            bottom_left,
        }),
        transform: AffineMatrix::from_corners(top_left, top_right, bottom_left),
    })
}

/// Multi-point rule: fit, project the unit-square corners, take the envelope.
pub fn derive_multi_point(
    image: &[ImagePoint],
    geo: &[GeoPoint],
    params: &SolverParams,
) -> Result<PlacementSolution, CalibrationError> {
    let transform = estimate_affine(image, geo, params)?;
    non_degenerate(PlacementSolution {
        placement: Placement::AxisAligned(transform.image_bounds()),
        transform,
    })
}

fn non_degenerate(solution: PlacementSolution) -> Result<PlacementSolution, CalibrationError> {
    if solution.transform.is_singular() {
        debug!("placement collapses on the map: {:?}", solution.placement);
        return Err(CalibrationError::Collinear);
    }
    Ok(solution)
}

/// Points of a corner mode in corner order, looked up by label.
fn corners_by_label(
    labels: &[&'static str],
    gcps: &[GroundControlPoint],
) -> Result<(Vec<ImagePoint>, Vec<GeoPoint>), CalibrationError> {
    labels
        .iter()
        .map(|&label| {
            gcps.iter()
                .find(|g| g.label() == Some(label))
                .map(|g| (g.image(), g.geo()))
                .ok_or(CalibrationError::MissingCorner(label))
        })
        .collect::<Result<Vec<_>, _>>()
        .map(|pairs| pairs.into_iter().unzip())
}

/// Derive the placement for `mode` from points in capture order.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(gcps, params), fields(points = gcps.len()))
)]
pub fn derive_placement(
    mode: CalibrationMode,
    gcps: &[GroundControlPoint],
    params: &SolverParams,
) -> Result<PlacementSolution, CalibrationError> {
    let needed = mode.min_points();
    if gcps.len() < needed {
        return Err(CalibrationError::InsufficientPoints {
            needed,
            have: gcps.len(),
        });
    }
    let max = mode.point_limit(params);
    if gcps.len() > max {
        return Err(CalibrationError::TooManyPoints { max });
    }

    let (image, geo) = match mode.corner_labels() {
        [] => split(gcps),
        labels => corners_by_label(labels, gcps)?,
    };
    match mode {
        CalibrationMode::TwoCorner => derive_two_corner(geo[0], geo[1]),
        CalibrationMode::ThreeCorner => derive_three_corner(
            [image[0], image[1], image[2]],
            [geo[0], geo[1], geo[2]],
            params,
        ),
        CalibrationMode::MultiPoint => derive_multi_point(&image, &geo, params),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn gp(lat: f64, lng: f64) -> GeoPoint {
        GeoPoint::new(lat, lng)
    }

    #[test]
    fn two_corner_bounds_from_reference_points() {
        let sol = derive_two_corner(gp(51.10, -2.53), gp(51.08, -2.50)).expect("placement");
        assert_eq!(
            sol.placement,
            Placement::AxisAligned(GeoBounds {
                north: 51.10,
                south: 51.08,
                east: -2.50,
                west: -2.53,
            })
        );
    }

    #[test]
    fn two_corner_ignores_click_order() {
        let a = derive_two_corner(gp(51.08, -2.50), gp(51.10, -2.53)).expect("placement");
        let b = derive_two_corner(gp(51.10, -2.53), gp(51.08, -2.50)).expect("placement");
        assert_eq!(a, b);
    }

    #[test]
    fn two_corner_zero_extent_is_degenerate() {
        assert_eq!(
            derive_two_corner(gp(51.10, -2.53), gp(51.10, -2.50)),
            Err(CalibrationError::Collinear)
        );
    }

    #[test]
    fn three_corner_completes_parallelogram() {
        let image = [
            ImagePoint::TOP_LEFT,
            ImagePoint::TOP_RIGHT,
            ImagePoint::BOTTOM_LEFT,
        ];
        let sol = derive_three_corner(
            image,
            [gp(10.0, 0.0), gp(10.0, 2.0), gp(8.0, 0.0)],
            &SolverParams::default(),
        )
        .expect("placement");

        let Placement::Rotated(quad) = sol.placement else {
            panic!("expected rotated quad, got {:?}", sol.placement);
        };
        assert_eq!(quad.bottom_right(), gp(8.0, 2.0));
        assert_eq!(
            quad.bounds(),
            GeoBounds {
                north: 10.0,
                south: 8.0,
                east: 2.0,
                west: 0.0,
            }
        );
        assert_eq!(sol.transform.apply(ImagePoint::BOTTOM_RIGHT), gp(8.0, 2.0));
    }

    #[test]
    fn rotated_quad_bounds_cover_derived_corner() {
        // 45° rotated square: the derived corner is the southernmost point.
        let quad = RotatedQuad {
            top_left: gp(1.0, 0.0),
            top_right: gp(2.0, 1.0),
            bottom_left: gp(0.0, 1.0),
        };
        assert_eq!(quad.bottom_right(), gp(1.0, 2.0));
        let b = quad.bounds();
        assert_eq!((b.north, b.south, b.east, b.west), (2.0, 0.0, 2.0, 0.0));
    }

    #[test]
    fn three_corner_rejects_collinear_clicks() {
        let image = [
            ImagePoint::new(0.0, 0.0),
            ImagePoint::new(0.5, 0.5),
            ImagePoint::new(1.0, 1.0),
        ];
        let res = derive_three_corner(
            image,
            [gp(10.0, 0.0), gp(10.0, 2.0), gp(8.0, 0.0)],
            &SolverParams::default(),
        );
        assert_eq!(res, Err(CalibrationError::Collinear));
    }

    #[test]
    fn three_corner_rejects_collapsed_geo_corners() {
        let image = [
            ImagePoint::TOP_LEFT,
            ImagePoint::TOP_RIGHT,
            ImagePoint::BOTTOM_LEFT,
        ];
        let res = derive_three_corner(
            image,
            [gp(10.0, 0.0), gp(9.0, 1.0), gp(8.0, 2.0)],
            &SolverParams::default(),
        );
        assert_eq!(res, Err(CalibrationError::Collinear));
    }

    #[test]
    fn multi_point_rejects_single_geo_location() {
        let image = [
            ImagePoint::new(0.1, 0.1),
            ImagePoint::new(0.9, 0.2),
            ImagePoint::new(0.8, 0.9),
            ImagePoint::new(0.2, 0.7),
        ];
        let geo = [gp(51.0, -2.5); 4];
        assert_eq!(
            derive_multi_point(&image, &geo, &SolverParams::default()),
            Err(CalibrationError::Collinear)
        );
    }

    #[test]
    fn corner_points_are_matched_by_label() {
        let gcp = |id, x, y, lat, lng, label: &str| {
            GroundControlPoint::new(
                crate::GcpId(id),
                ImagePoint::new(x, y),
                gp(lat, lng),
                Some(label.to_string()),
            )
        };
        let shuffled = [
            gcp(3, 0.0, 0.0, 10.0, 0.0, "Top-Left"),
            gcp(1, 1.0, 0.0, 10.0, 2.0, "Top-Right"),
            gcp(2, 0.0, 1.0, 8.0, 0.0, "Bottom-Left"),
        ];
        let mut order = shuffled.clone();
        order.rotate_left(1);

        let params = SolverParams::default();
        let a = derive_placement(CalibrationMode::ThreeCorner, &shuffled, &params).expect("a");
        let b = derive_placement(CalibrationMode::ThreeCorner, &order, &params).expect("b");
        assert_eq!(a, b);
        assert_eq!(a.placement.corners()[2], gp(8.0, 2.0));

        let mut unlabeled = shuffled.clone();
        unlabeled[0] = gcp(3, 0.0, 0.0, 10.0, 0.0, "Point 1");
        assert_eq!(
            derive_placement(CalibrationMode::ThreeCorner, &unlabeled, &params),
            Err(CalibrationError::MissingCorner("Top-Left"))
        );
    }

    #[test]
    fn multi_point_projects_image_corners() {
        let truth = AffineMatrix::from_corners(gp(51.10, -2.53), gp(51.101, -2.50), gp(51.08, -2.531));
        let image = vec![
            ImagePoint::new(0.2, 0.1),
            ImagePoint::new(0.8, 0.3),
            ImagePoint::new(0.5, 0.9),
            ImagePoint::new(0.1, 0.6),
        ];
        let geo: Vec<GeoPoint> = image.iter().map(|&p| truth.apply(p)).collect();

        let sol = derive_multi_point(&image, &geo, &SolverParams::default()).expect("placement");
        let b = sol.placement.bounds();
        assert_abs_diff_eq!(b.north, 51.101, epsilon = 1e-9);
        assert_abs_diff_eq!(b.south, 51.08, epsilon = 1e-9);
        assert_abs_diff_eq!(b.east, -2.50, epsilon = 1e-9);
        assert_abs_diff_eq!(b.west, -2.531, epsilon = 1e-9);
        assert!(matches!(sol.placement, Placement::AxisAligned(_)));
    }
}
