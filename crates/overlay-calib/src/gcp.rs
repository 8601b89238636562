use overlay_calib_core::{GeoPoint, ImagePoint};
use serde::{Deserialize, Serialize};

/// Session-unique identifier of a ground control point.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GcpId(pub u64);

impl std::fmt::Display for GcpId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One image ↔ map correspondence.
///
/// The image half and the geo half are edited independently; moving one
/// never touches the other. Id and label are fixed at creation. Only
/// [`Session`](crate::Session) mutates points.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GroundControlPoint {
    id: GcpId,
    image: ImagePoint,
    geo: GeoPoint,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    label: Option<String>,
}

impl GroundControlPoint {
    pub(crate) fn new(id: GcpId, image: ImagePoint, geo: GeoPoint, label: Option<String>) -> Self {
        Self {
            id,
            image,
            geo,
            label,
        }
    }

    #[inline]
    pub fn id(&self) -> GcpId {
        self.id
    }

    /// Normalized image position.
    #[inline]
    pub fn image(&self) -> ImagePoint {
        self.image
    }

    #[inline]
    pub fn geo(&self) -> GeoPoint {
        self.geo
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub(crate) fn set_image(&mut self, image: ImagePoint) {
        self.image = image;
    }

    pub(crate) fn set_geo(&mut self, geo: GeoPoint) {
        self.geo = geo;
    }
}

/// Split points into parallel image/geo vectors for the solver.
pub(crate) fn split(gcps: &[GroundControlPoint]) -> (Vec<ImagePoint>, Vec<GeoPoint>) {
    gcps.iter().map(|g| (g.image, g.geo)).unzip()
}
