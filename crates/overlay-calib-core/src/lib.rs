//! Core geometry for placing a non-georeferenced image on a map.
//!
//! This crate is small and purely numeric: normalized image coordinates,
//! geo coordinates, the image→geo affine solver and the degeneracy checks that
//! guard it. Calibration modes, sessions and persistence live in
//! `overlay-calib`.
//!
//! ```
//! use overlay_calib_core::{estimate_affine, GeoPoint, ImagePoint, SolverParams};
//!
//! let image = [
//!     ImagePoint::new(0.0, 0.0),
//!     ImagePoint::new(1.0, 0.0),
//!     ImagePoint::new(0.0, 1.0),
//! ];
//! let geo = [
//!     GeoPoint::new(51.10, -2.53),
//!     GeoPoint::new(51.10, -2.50),
//!     GeoPoint::new(51.08, -2.53),
//! ];
//! let m = estimate_affine(&image, &geo, &SolverParams::default()).unwrap();
//! let br = m.apply(ImagePoint::BOTTOM_RIGHT);
//! assert!((br.lat - 51.08).abs() < 1e-9 && (br.lng + 2.50).abs() < 1e-9);
//! ```

mod affine;
mod coords;
pub mod degeneracy;
mod error;
mod logger;
mod params;

pub use affine::{estimate_affine, AffineMatrix};
pub use coords::{GeoBounds, GeoPoint, ImagePoint};
pub use degeneracy::{check_point_set, check_triangle, signed_area};
pub use error::GeoError;
pub use params::{SolverParams, DEFAULT_MAX_POINTS, DEFAULT_MIN_TRIANGLE_AREA};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::init_with_level;
