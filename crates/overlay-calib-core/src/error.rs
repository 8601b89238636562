/// Errors produced by the core geometry routines.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum GeoError {
    #[error("image coordinate ({x}, {y}) outside the unit square")]
    InvalidImageCoordinate { x: f64, y: f64 },
    #[error("geo coordinate (lat={lat}, lng={lng}) out of range")]
    InvalidGeoCoordinate { lat: f64, lng: f64 },
    #[error("need at least {needed} correspondences, got {have}")]
    InsufficientPoints { needed: usize, have: usize },
    #[error("image and geo point lists differ in length ({image} vs {geo})")]
    MismatchedLengths { image: usize, geo: usize },
    #[error("points are collinear or too close together (area {area:.3e})")]
    Collinear { area: f64 },
}
