//! Calibration strategies and their point-count and labeling rules.

use overlay_calib_core::{SolverParams, DEFAULT_MAX_POINTS};
use serde::{Deserialize, Serialize};

/// How correspondences are turned into a placement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CalibrationMode {
    /// Two points, top-left and bottom-right. The image is assumed unrotated.
    #[default]
    TwoCorner,
    /// Top-left, top-right and bottom-left; the fourth corner is derived.
    /// Allows rotation and shear.
    ThreeCorner,
    /// Three or more free points, least-squares affine fit.
    MultiPoint,
}

const TWO_CORNER_LABELS: [&str; 2] = ["Top-Left", "Bottom-Right"];
const THREE_CORNER_LABELS: [&str; 3] = ["Top-Left", "Top-Right", "Bottom-Left"];

impl CalibrationMode {
    pub const ALL: [CalibrationMode; 3] = [
        CalibrationMode::TwoCorner,
        CalibrationMode::ThreeCorner,
        CalibrationMode::MultiPoint,
    ];

    #[inline]
    pub fn min_points(self) -> usize {
        match self {
            CalibrationMode::TwoCorner => 2,
            CalibrationMode::ThreeCorner | CalibrationMode::MultiPoint => 3,
        }
    }

    #[inline]
    pub fn max_points(self) -> usize {
        match self {
            CalibrationMode::TwoCorner => 2,
            CalibrationMode::ThreeCorner => 3,
            CalibrationMode::MultiPoint => DEFAULT_MAX_POINTS,
        }
    }

    /// Maximum point count once `params` is taken into account. Only the
    /// multi-point cap is configurable, and never below the mode minimum.
    pub fn point_limit(self, params: &SolverParams) -> usize {
        match self {
            CalibrationMode::MultiPoint => params.max_points.max(self.min_points()),
            _ => self.max_points(),
        }
    }

    /// Fixed corner labels, in capture order. Empty for multi-point mode.
    pub fn corner_labels(self) -> &'static [&'static str] {
        match self {
            CalibrationMode::TwoCorner => &TWO_CORNER_LABELS,
            CalibrationMode::ThreeCorner => &THREE_CORNER_LABELS,
            CalibrationMode::MultiPoint => &[],
        }
    }

    /// Label for the point at zero-based position `ordinal`.
    pub fn label_for(self, ordinal: usize) -> String {
        match self.corner_labels().get(ordinal) {
            Some(label) => (*label).to_string(),
            None => format!("Point {}", ordinal + 1),
        }
    }

    /// Label for a new point, given the labels already in use: the first
    /// missing corner, or the lowest free `Point N` in multi-point mode.
    pub fn first_free_label(self, taken: &[Option<&str>]) -> String {
        let mut ordinal = 0;
        loop {
            let label = self.label_for(ordinal);
            if !taken.contains(&Some(label.as_str())) {
                return label;
            }
            ordinal += 1;
        }
    }
}

impl std::fmt::Display for CalibrationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            CalibrationMode::TwoCorner => "two-corner",
            CalibrationMode::ThreeCorner => "three-corner",
            CalibrationMode::MultiPoint => "multi-point",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_counts_per_mode() {
        let counts: Vec<(usize, usize)> = CalibrationMode::ALL
            .iter()
            .map(|m| (m.min_points(), m.max_points()))
            .collect();
        assert_eq!(counts, vec![(2, 2), (3, 3), (3, 20)]);
    }

    #[test]
    fn labels_follow_ordinal() {
        assert_eq!(CalibrationMode::TwoCorner.label_for(0), "Top-Left");
        assert_eq!(CalibrationMode::TwoCorner.label_for(1), "Bottom-Right");
        assert_eq!(CalibrationMode::ThreeCorner.label_for(2), "Bottom-Left");
        assert_eq!(CalibrationMode::MultiPoint.label_for(0), "Point 1");
        assert_eq!(CalibrationMode::MultiPoint.label_for(6), "Point 7");
    }

    #[test]
    fn free_label_fills_the_first_gap() {
        let mode = CalibrationMode::ThreeCorner;
        assert_eq!(mode.first_free_label(&[]), "Top-Left");
        assert_eq!(
            mode.first_free_label(&[Some("Top-Right"), Some("Bottom-Left")]),
            "Top-Left"
        );
        assert_eq!(
            mode.first_free_label(&[Some("Top-Left"), Some("Bottom-Left")]),
            "Top-Right"
        );
        assert_eq!(
            CalibrationMode::MultiPoint.first_free_label(&[Some("Point 1"), None, Some("Point 3")]),
            "Point 2"
        );
    }

    #[test]
    fn multi_point_cap_is_configurable() {
        let params = SolverParams {
            max_points: 8,
            ..SolverParams::default()
        };
        assert_eq!(CalibrationMode::MultiPoint.point_limit(&params), 8);
        assert_eq!(CalibrationMode::ThreeCorner.point_limit(&params), 3);

        let tiny = SolverParams {
            max_points: 1,
            ..SolverParams::default()
        };
        assert_eq!(CalibrationMode::MultiPoint.point_limit(&tiny), 3);
    }

    #[test]
    fn serializes_as_snake_case() {
        let json = serde_json::to_string(&CalibrationMode::ThreeCorner).expect("json");
        assert_eq!(json, "\"three_corner\"");
    }
}
