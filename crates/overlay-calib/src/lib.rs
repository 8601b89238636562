//! Georeferencing for custom map overlays.
//!
//! A hand-drawn or scanned property map is placed on a real map by matching a
//! few image positions to known GPS coordinates. This crate turns those ground
//! control points into a placement a map renderer can draw.
//!
//! ## Quickstart
//!
//! ```
//! use overlay_calib::{CalibrationMode, Placement, Session};
//!
//! # fn main() -> Result<(), overlay_calib::CalibrationError> {
//! let mut session = Session::new(CalibrationMode::TwoCorner);
//! session.click_image(0.0, 0.0)?;
//! session.click_map(51.10, -2.53)?;
//! session.click_image(1.0, 1.0)?;
//! session.click_map(51.08, -2.50)?;
//!
//! assert!(session.can_finalize());
//! let Some(Placement::AxisAligned(bounds)) = session.current_placement() else {
//!     unreachable!()
//! };
//! assert_eq!(bounds.north, 51.10);
//!
//! let record = session.finalize("uploads/farm-map.png")?;
//! assert_eq!(record.gcps.len(), 2);
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - [`CalibrationMode`]: point-count and labeling rules per strategy.
//! - [`Session`]: capture, edit and preview state for one calibration.
//! - [`placement`]: per-mode placement derivation, usable without a session.
//! - [`CalibrationRecord`]: the persisted result, with JSON helpers.
//! - `overlay_calib::core`: coordinates, the affine solver and degeneracy checks.

mod error;
mod gcp;
mod mode;
pub mod placement;
mod record;
mod session;

pub use overlay_calib_core as core;

pub use error::CalibrationError;
pub use gcp::{GcpId, GroundControlPoint};
pub use mode::CalibrationMode;
pub use placement::{Placement, PlacementSolution, RotatedQuad};
pub use record::{CalibrationRecord, RecordIoError};
pub use session::{CaptureState, Session, DEFAULT_OPACITY};

pub use overlay_calib_core::{AffineMatrix, GeoBounds, GeoPoint, ImagePoint, SolverParams};
