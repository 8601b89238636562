//! Persisted calibration record and its JSON helpers.

use std::{fs, path::Path};

use overlay_calib_core::SolverParams;
use serde::{Deserialize, Serialize};

use crate::placement::{derive_placement, Placement, PlacementSolution};
use crate::{CalibrationError, CalibrationMode, GroundControlPoint};

#[derive(thiserror::Error, Debug)]
pub enum RecordIoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// What a finalized session hands to storage and the renderer.
///
/// `image_ref` and `opacity` belong to other collaborators (upload and
/// rendering); they are carried through unchanged.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalibrationRecord {
    pub image_ref: String,
    pub mode: CalibrationMode,
    pub gcps: Vec<GroundControlPoint>,
    pub placement: Placement,
    #[serde(default = "default_opacity")]
    pub opacity: f64,
}

fn default_opacity() -> f64 {
    crate::session::DEFAULT_OPACITY
}

impl CalibrationRecord {
    /// Re-derive the placement from the stored points.
    pub fn recompute(&self, params: &SolverParams) -> Result<PlacementSolution, CalibrationError> {
        derive_placement(self.mode, &self.gcps, params)
    }

    /// True when the stored placement matches a fresh derivation.
    pub fn is_consistent(&self, params: &SolverParams) -> bool {
        self.recompute(params)
            .is_ok_and(|sol| sol.placement == self.placement)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, RecordIoError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn to_json_string(&self) -> Result<String, RecordIoError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load a record from JSON on disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, RecordIoError> {
        let raw = fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Write this record to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), RecordIoError> {
        fs::write(path, self.to_json_string()?)?;
        Ok(())
    }
}
