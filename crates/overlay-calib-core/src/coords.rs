use serde::{Deserialize, Serialize};

use crate::GeoError;

/// A position on the overlay image, as a fraction of its width/height.
///
/// Origin is the top-left corner; `x` grows to the right, `y` grows down.
/// Valid points lie in `[0, 1] x [0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImagePoint {
    pub x: f64,
    pub y: f64,
}

impl ImagePoint {
    pub const TOP_LEFT: ImagePoint = ImagePoint { x: 0.0, y: 0.0 };
    pub const TOP_RIGHT: ImagePoint = ImagePoint { x: 1.0, y: 0.0 };
    pub const BOTTOM_RIGHT: ImagePoint = ImagePoint { x: 1.0, y: 1.0 };
    pub const BOTTOM_LEFT: ImagePoint = ImagePoint { x: 0.0, y: 1.0 };

    /// The four logical image corners in TL, TR, BR, BL order.
    pub const CORNERS: [ImagePoint; 4] = [
        Self::TOP_LEFT,
        Self::TOP_RIGHT,
        Self::BOTTOM_RIGHT,
        Self::BOTTOM_LEFT,
    ];

    #[inline]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Build a point, rejecting anything outside the unit square.
    pub fn checked(x: f64, y: f64) -> Result<Self, GeoError> {
        let p = Self::new(x, y);
        p.validate()?;
        Ok(p)
    }

    pub fn validate(&self) -> Result<(), GeoError> {
        let in_unit = |v: f64| v.is_finite() && (0.0..=1.0).contains(&v);
        if in_unit(self.x) && in_unit(self.y) {
            Ok(())
        } else {
            Err(GeoError::InvalidImageCoordinate {
                x: self.x,
                y: self.y,
            })
        }
    }
}

/// A WGS84 position in degrees.
///
/// Over property-scale extents the engine treats `(lng, lat)` as a flat
/// Cartesian plane; no projection correction is applied.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    #[inline]
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Build a point, rejecting latitudes outside `[-90, 90]` and longitudes
    /// outside `[-180, 180]`.
    pub fn checked(lat: f64, lng: f64) -> Result<Self, GeoError> {
        let p = Self::new(lat, lng);
        p.validate()?;
        Ok(p)
    }

    pub fn validate(&self) -> Result<(), GeoError> {
        let lat_ok = self.lat.is_finite() && (-90.0..=90.0).contains(&self.lat);
        let lng_ok = self.lng.is_finite() && (-180.0..=180.0).contains(&self.lng);
        if lat_ok && lng_ok {
            Ok(())
        } else {
            Err(GeoError::InvalidGeoCoordinate {
                lat: self.lat,
                lng: self.lng,
            })
        }
    }

    /// Planar distance in degrees.
    #[inline]
    pub fn distance_deg(&self, other: &GeoPoint) -> f64 {
        (self.lat - other.lat).hypot(self.lng - other.lng)
    }
}

/// Axis-aligned geographic rectangle.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl GeoBounds {
    /// Smallest rectangle enclosing every point, or `None` for an empty slice.
    pub fn from_points(points: &[GeoPoint]) -> Option<Self> {
        let first = points.first()?;
        let mut b = GeoBounds {
            north: first.lat,
            south: first.lat,
            east: first.lng,
            west: first.lng,
        };
        for p in &points[1..] {
            b.north = b.north.max(p.lat);
            b.south = b.south.min(p.lat);
            b.east = b.east.max(p.lng);
            b.west = b.west.min(p.lng);
        }
        Some(b)
    }

    #[inline]
    pub fn center(&self) -> GeoPoint {
        GeoPoint::new(
            0.5 * (self.north + self.south),
            0.5 * (self.east + self.west),
        )
    }

    #[inline]
    pub fn contains(&self, p: GeoPoint) -> bool {
        (self.south..=self.north).contains(&p.lat) && (self.west..=self.east).contains(&p.lng)
    }

    /// Corners in TL, TR, BR, BL order (north-west first).
    pub fn corners(&self) -> [GeoPoint; 4] {
        [
            GeoPoint::new(self.north, self.west),
            GeoPoint::new(self.north, self.east),
            GeoPoint::new(self.south, self.east),
            GeoPoint::new(self.south, self.west),
        ]
    }
}
