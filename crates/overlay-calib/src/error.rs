use overlay_calib_core::GeoError;

use crate::GcpId;

/// Recoverable calibration failures.
///
/// `InsufficientPoints` and `Collinear` explain why a session cannot be
/// finalized; the rest reject a single edit and leave the session unchanged.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum CalibrationError {
    #[error("need {} more point(s) ({have} of {needed} placed)", missing(.needed, .have))]
    InsufficientPoints { needed: usize, have: usize },
    #[error("points are collinear or too close together; reposition them")]
    Collinear,
    #[error("invalid coordinate: {0}")]
    InvalidCoordinate(GeoError),
    #[error("no control point {0}")]
    UnknownGcp(GcpId),
    #[error("control point {0} appears more than once")]
    DuplicateGcp(GcpId),
    #[error("control point {0} does not name a free corner of this mode")]
    InvalidLabel(GcpId),
    #[error("corner {0} has no control point")]
    MissingCorner(&'static str),
    #[error("{image} image points but {geo} geo points")]
    MismatchedLengths { image: usize, geo: usize },
    #[error("mode accepts at most {max} points")]
    TooManyPoints { max: usize },
    #[error("no pending image point; click the image first")]
    NoPendingImagePoint,
    #[error("editing is disabled while previewing")]
    PreviewActive,
    #[error("opacity {0} outside [0, 1]")]
    InvalidOpacity(f64),
}

fn missing(needed: &usize, have: &usize) -> usize {
    needed.saturating_sub(*have)
}

impl From<GeoError> for CalibrationError {
    fn from(err: GeoError) -> Self {
        match err {
            GeoError::InsufficientPoints { needed, have } => {
                CalibrationError::InsufficientPoints { needed, have }
            }
            GeoError::Collinear { .. } => CalibrationError::Collinear,
            GeoError::MismatchedLengths { image, geo } => {
                CalibrationError::MismatchedLengths { image, geo }
            }
            GeoError::InvalidImageCoordinate { .. } | GeoError::InvalidGeoCoordinate { .. } => {
                CalibrationError::InvalidCoordinate(err)
            }
        }
    }
}
