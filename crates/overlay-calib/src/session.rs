//! Interactive calibration session.
//!
//! Point capture alternates between the image and the map: an image click
//! stores a pending image position, the following map click completes it into
//! a [`GroundControlPoint`]. Every mutation recomputes the placement inline.
//!
//! ```text
//! AwaitingImagePoint --click_image--> AwaitingMapPoint --click_map--> AwaitingImagePoint
//!          \______________ begin_preview / end_preview ______________/  Previewing
//! ```

use std::collections::HashSet;

use log::{debug, info};
use overlay_calib_core::{AffineMatrix, GeoPoint, ImagePoint, SolverParams};

use crate::placement::{derive_placement, Placement, PlacementSolution};
use crate::record::CalibrationRecord;
use crate::{CalibrationError, CalibrationMode, GcpId, GroundControlPoint};

/// Opacity a fresh session renders the overlay with.
pub const DEFAULT_OPACITY: f64 = 0.6;

/// Where the session is in the capture cycle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CaptureState {
    AwaitingImagePoint,
    AwaitingMapPoint { pending: ImagePoint },
    Previewing,
}

/// State of one calibration, owned by the caller.
#[derive(Clone, Debug)]
pub struct Session {
    mode: CalibrationMode,
    params: SolverParams,
    gcps: Vec<GroundControlPoint>,
    pending: Option<ImagePoint>,
    previewing: bool,
    opacity: f64,
    next_id: u64,
    outcome: Result<PlacementSolution, CalibrationError>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(CalibrationMode::default())
    }
}

impl Session {
    pub fn new(mode: CalibrationMode) -> Self {
        Self::with_params(mode, SolverParams::default())
    }

    pub fn with_params(mode: CalibrationMode, params: SolverParams) -> Self {
        let mut session = Self {
            mode,
            params,
            gcps: Vec::new(),
            pending: None,
            previewing: false,
            opacity: DEFAULT_OPACITY,
            next_id: 0,
            outcome: Err(CalibrationError::InsufficientPoints {
                needed: mode.min_points(),
                have: 0,
            }),
        };
        session.recompute();
        session
    }

    /// Resume editing a persisted calibration.
    ///
    /// Stored ids are kept; new points get ids above the largest stored one.
    /// In the corner modes every point must name a distinct corner. The
    /// placement is recomputed rather than trusted.
    pub fn from_record(
        record: &CalibrationRecord,
        params: SolverParams,
    ) -> Result<Self, CalibrationError> {
        let max = record.mode.point_limit(&params);
        if record.gcps.len() > max {
            return Err(CalibrationError::TooManyPoints { max });
        }
        let corners = record.mode.corner_labels();
        let mut seen = HashSet::new();
        let mut filled = HashSet::new();
        for gcp in &record.gcps {
            gcp.image().validate()?;
            gcp.geo().validate()?;
            if !seen.insert(gcp.id()) {
                return Err(CalibrationError::DuplicateGcp(gcp.id()));
            }
            if !corners.is_empty() {
                match gcp.label() {
                    Some(label) if corners.iter().any(|&c| c == label) && filled.insert(label) => {}
                    _ => return Err(CalibrationError::InvalidLabel(gcp.id())),
                }
            }
        }
        if !(0.0..=1.0).contains(&record.opacity) {
            return Err(CalibrationError::InvalidOpacity(record.opacity));
        }

        let mut session = Self::with_params(record.mode, params);
        session.gcps = record.gcps.clone();
        session.opacity = record.opacity;
        session.next_id = record
            .gcps
            .iter()
            .map(|g| g.id().0 + 1)
            .max()
            .unwrap_or(0);
        session.recompute();
        Ok(session)
    }

    #[inline]
    pub fn mode(&self) -> CalibrationMode {
        self.mode
    }

    #[inline]
    pub fn params(&self) -> &SolverParams {
        &self.params
    }

    /// Switch strategy. Always discards every point and any pending click,
    /// even when `mode` equals the current one.
    pub fn set_mode(&mut self, mode: CalibrationMode) {
        debug!(
            "mode {} -> {mode}, dropping {} points",
            self.mode,
            self.gcps.len()
        );
        self.mode = mode;
        self.reset();
    }

    pub fn capture_state(&self) -> CaptureState {
        match (self.previewing, self.pending) {
            (true, _) => CaptureState::Previewing,
            (false, Some(pending)) => CaptureState::AwaitingMapPoint { pending },
            (false, None) => CaptureState::AwaitingImagePoint,
        }
    }

    /// Record an image click. A second image click before the map click
    /// replaces the pending position.
    pub fn click_image(&mut self, x: f64, y: f64) -> Result<(), CalibrationError> {
        self.ensure_editable()?;
        self.ensure_capacity()?;
        self.pending = Some(ImagePoint::checked(x, y)?);
        Ok(())
    }

    /// Complete the pending image click with a map position.
    pub fn click_map(
        &mut self,
        lat: f64,
        lng: f64,
    ) -> Result<GroundControlPoint, CalibrationError> {
        self.ensure_editable()?;
        let image = self.pending.ok_or(CalibrationError::NoPendingImagePoint)?;
        let geo = GeoPoint::checked(lat, lng)?;
        let gcp = self.push(image, geo)?;
        self.pending = None;
        Ok(gcp)
    }

    /// Forget a pending image click.
    pub fn cancel_pending(&mut self) {
        self.pending = None;
    }

    /// Append a complete correspondence in one step.
    pub fn add_point_pair(
        &mut self,
        image_x: f64,
        image_y: f64,
        lat: f64,
        lng: f64,
    ) -> Result<GroundControlPoint, CalibrationError> {
        self.ensure_editable()?;
        let image = ImagePoint::checked(image_x, image_y)?;
        let geo = GeoPoint::checked(lat, lng)?;
        self.push(image, geo)
    }

    /// Move the image half of a point. Its geo half, id and label are kept.
    pub fn move_gcp_image(&mut self, id: GcpId, x: f64, y: f64) -> Result<(), CalibrationError> {
        self.ensure_editable()?;
        let image = ImagePoint::checked(x, y)?;
        self.gcp_mut(id)?.set_image(image);
        self.recompute();
        Ok(())
    }

    /// Move the geo half of a point. Its image half, id and label are kept.
    pub fn move_gcp_geo(&mut self, id: GcpId, lat: f64, lng: f64) -> Result<(), CalibrationError> {
        self.ensure_editable()?;
        let geo = GeoPoint::checked(lat, lng)?;
        self.gcp_mut(id)?.set_geo(geo);
        self.recompute();
        Ok(())
    }

    /// Delete a point. The others keep their labels; in the corner modes the
    /// next point added fills the corner this one leaves open.
    pub fn remove_gcp(&mut self, id: GcpId) -> Result<GroundControlPoint, CalibrationError> {
        self.ensure_editable()?;
        let idx = self.index_of(id)?;
        let removed = self.gcps.remove(idx);
        self.recompute();
        Ok(removed)
    }

    /// Drop every point and return to awaiting an image click.
    pub fn clear_all(&mut self) {
        self.reset();
    }

    pub fn list_gcps(&self) -> &[GroundControlPoint] {
        &self.gcps
    }

    pub fn gcp(&self, id: GcpId) -> Option<&GroundControlPoint> {
        self.gcps.iter().find(|g| g.id() == id)
    }

    /// Current placement, absent while points are missing or degenerate.
    pub fn current_placement(&self) -> Option<&Placement> {
        self.outcome.as_ref().ok().map(|s| &s.placement)
    }

    /// Image→geo transform behind the current placement.
    pub fn current_transform(&self) -> Option<&AffineMatrix> {
        self.outcome.as_ref().ok().map(|s| &s.transform)
    }

    pub fn solution(&self) -> Result<&PlacementSolution, &CalibrationError> {
        self.outcome.as_ref()
    }

    #[inline]
    pub fn can_finalize(&self) -> bool {
        self.outcome.is_ok()
    }

    /// Why the session cannot be finalized, if it cannot.
    pub fn finalize_blocker(&self) -> Option<&CalibrationError> {
        self.outcome.as_ref().err()
    }

    /// Project an image position through the current calibration.
    pub fn project(&self, p: ImagePoint) -> Option<GeoPoint> {
        self.current_transform().map(|m| m.apply(p))
    }

    /// Per-point distance (degrees) between where the calibration puts each
    /// point's image position and where it was placed on the map.
    pub fn residuals(&self) -> Option<Vec<(GcpId, f64)>> {
        let m = self.current_transform()?;
        Some(
            self.gcps
                .iter()
                .map(|g| (g.id(), m.apply(g.image()).distance_deg(&g.geo())))
                .collect(),
        )
    }

    pub fn begin_preview(&mut self) -> Result<(), CalibrationError> {
        if let Err(err) = &self.outcome {
            return Err(err.clone());
        }
        self.pending = None;
        self.previewing = true;
        Ok(())
    }

    pub fn end_preview(&mut self) {
        self.previewing = false;
    }

    #[inline]
    pub fn is_previewing(&self) -> bool {
        self.previewing
    }

    #[inline]
    pub fn opacity(&self) -> f64 {
        self.opacity
    }

    /// Render-time blending factor; passed through to the record untouched.
    pub fn set_opacity(&mut self, opacity: f64) -> Result<(), CalibrationError> {
        if !(0.0..=1.0).contains(&opacity) {
            return Err(CalibrationError::InvalidOpacity(opacity));
        }
        self.opacity = opacity;
        Ok(())
    }

    /// Produce the record handed to storage and, later, to the renderer.
    pub fn finalize(
        &self,
        image_ref: impl Into<String>,
    ) -> Result<CalibrationRecord, CalibrationError> {
        let solution = self.outcome.as_ref().map_err(Clone::clone)?;
        let record = CalibrationRecord {
            image_ref: image_ref.into(),
            mode: self.mode,
            gcps: self.gcps.clone(),
            placement: solution.placement,
            opacity: self.opacity,
        };
        info!(
            "finalized {} calibration of {} with {} points",
            self.mode,
            record.image_ref,
            record.gcps.len()
        );
        Ok(record)
    }

    fn push(
        &mut self,
        image: ImagePoint,
        geo: GeoPoint,
    ) -> Result<GroundControlPoint, CalibrationError> {
        self.ensure_capacity()?;
        let id = GcpId(self.next_id);
        self.next_id += 1;
        let taken: Vec<Option<&str>> = self.gcps.iter().map(|g| g.label()).collect();
        let label = self.mode.first_free_label(&taken);
        let gcp = GroundControlPoint::new(id, image, geo, Some(label));
        self.gcps.push(gcp.clone());
        self.recompute();
        Ok(gcp)
    }

    fn reset(&mut self) {
        self.gcps.clear();
        self.pending = None;
        self.previewing = false;
        self.recompute();
    }

    fn recompute(&mut self) {
        self.outcome = derive_placement(self.mode, &self.gcps, &self.params);
        match &self.outcome {
            Ok(sol) => debug!(
                "{} placement from {} points: {:?}",
                self.mode,
                self.gcps.len(),
                sol.placement
            ),
            Err(err) => {
                debug!("{} placement unavailable: {err}", self.mode);
                self.previewing = false;
            }
        }
    }

    fn ensure_editable(&self) -> Result<(), CalibrationError> {
        if self.previewing {
            return Err(CalibrationError::PreviewActive);
        }
        Ok(())
    }

    fn ensure_capacity(&self) -> Result<(), CalibrationError> {
        let max = self.mode.point_limit(&self.params);
        if self.gcps.len() >= max {
            return Err(CalibrationError::TooManyPoints { max });
        }
        Ok(())
    }

    fn index_of(&self, id: GcpId) -> Result<usize, CalibrationError> {
        self.gcps
            .iter()
            .position(|g| g.id() == id)
            .ok_or(CalibrationError::UnknownGcp(id))
    }

    fn gcp_mut(&mut self, id: GcpId) -> Result<&mut GroundControlPoint, CalibrationError> {
        let idx = self.index_of(id)?;
        Ok(&mut self.gcps[idx])
    }
}
