//! Scoring thresholds and pluggable scoring policies.
//!
//! Every threshold the engine uses is an explicit input here. Where several
//! incompatible policies exist for the same metric, they are modelled as
//! tagged enums and the caller picks one; nothing is blended.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Complete scoring configuration for one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Eye aspect ratio below which an eye counts as closed.
    pub ear_threshold: f64,

    /// Consecutive closed frames required before a blink is counted.
    pub consecutive_frames_threshold: u32,

    /// History length for pupil and gaze smoothing.
    pub smoothing_window_size: usize,

    /// Posture scoring policy.
    pub posture: PostureStrategy,

    /// Eye-contact scoring policy.
    pub eye_contact: EyeContactStrategy,

    /// Session-level aggregation and labelling.
    pub aggregation: AggregationConfig,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            ear_threshold: 0.23,
            consecutive_frames_threshold: 3,
            smoothing_window_size: 10,
            posture: PostureStrategy::default(),
            eye_contact: EyeContactStrategy::default(),
            aggregation: AggregationConfig::default(),
        }
    }
}

impl ScoringConfig {
    /// Reject configurations the engine cannot score with.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.ear_threshold.is_nan() || self.ear_threshold <= 0.0 {
            return Err(ModelError::invalid(
                "scoring config",
                format!("ear_threshold must be positive, got {}", self.ear_threshold),
            ));
        }
        if self.consecutive_frames_threshold == 0 {
            return Err(ModelError::invalid(
                "scoring config",
                "consecutive_frames_threshold must be at least 1",
            ));
        }
        if self.smoothing_window_size == 0 {
            return Err(ModelError::invalid(
                "scoring config",
                "smoothing_window_size must be at least 1",
            ));
        }
        if let PostureStrategy::AngleBand { min_deg, max_deg } = self.posture {
            if min_deg.is_nan() || max_deg.is_nan() || min_deg > max_deg {
                return Err(ModelError::invalid(
                    "scoring config",
                    format!("posture band is inverted: {min_deg}..{max_deg}"),
                ));
            }
        }
        if let EyeContactStrategy::GazeStability(weights) = self.eye_contact {
            if !(weights.gaze_variance_weight >= 0.0 && weights.blink_rate_penalty >= 0.0) {
                return Err(ModelError::invalid(
                    "scoring config",
                    "eye contact weights must be non-negative",
                ));
            }
        }
        Ok(())
    }
}

/// How a posture observation is scored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PostureStrategy {
    /// Shoulder-line angle against horizontal; 5 inside the band, 1 outside.
    ///
    /// A segment scores `good / total * 5`, truncated to an integer.
    AngleBand { min_deg: f64, max_deg: f64 },

    /// Angle between the shoulder vector and a reference vector, mapped to
    /// `5 - angle / 10` and clamped to `[0, 5]`.
    ///
    /// A segment scores the mean of its observations.
    ContinuousAngle { reference: PostureReference },
}

impl Default for PostureStrategy {
    fn default() -> Self {
        PostureStrategy::AngleBand {
            min_deg: 68.0,
            max_deg: 117.0,
        }
    }
}

/// Reference vector for [`PostureStrategy::ContinuousAngle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostureReference {
    /// Left hip to right hip.
    Hips,
    /// Shoulder midpoint to nose.
    Head,
}

/// How a segment's eye contact is scored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EyeContactStrategy {
    /// Penalize gaze wander and blinking over the whole segment, rounded to
    /// an integer score.
    GazeStability(EyeContactWeights),

    /// Per frame, `(1 - (|left - centre| + |right - centre|)) * 5` clamped to
    /// `[0, 5]`, where the eye centres are the contour corner midpoints and the
    /// face centre is the forehead/chin midpoint, in normalized coordinates.
    ///
    /// A segment scores the mean of its observations, 0 without any.
    FaceCentreDistance,
}

impl Default for EyeContactStrategy {
    fn default() -> Self {
        EyeContactStrategy::GazeStability(EyeContactWeights::default())
    }
}

/// Eye-contact formula: `5 - (gaze_variance * w + blink_rate * penalty)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EyeContactWeights {
    pub gaze_variance_weight: f64,
    pub blink_rate_penalty: f64,
}

impl Default for EyeContactWeights {
    fn default() -> Self {
        Self {
            gaze_variance_weight: 0.60,
            blink_rate_penalty: 10.0,
        }
    }
}

/// Session aggregation policy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationConfig {
    /// When a session has more segments than this, the lowest this-many
    /// values of each metric are dropped before averaging.
    pub trim_lowest: usize,

    /// Mapping from mean score to label.
    pub rating_scale: RatingScale,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            trim_lowest: 10,
            rating_scale: RatingScale::default(),
        }
    }
}

/// Discrete rating attached to a session score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RatingLabel {
    #[serde(rename = "Needs Improvement")]
    NeedsImprovement,
    Poor,
    Satisfactory,
    Good,
    Excellent,
}

impl RatingLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RatingLabel::NeedsImprovement => "Needs Improvement",
            RatingLabel::Poor => "Poor",
            RatingLabel::Satisfactory => "Satisfactory",
            RatingLabel::Good => "Good",
            RatingLabel::Excellent => "Excellent",
        }
    }
}

impl fmt::Display for RatingLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Threshold sets for turning a mean score into a [`RatingLabel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatingScale {
    /// `>= 4.7` Excellent, `> 4.2` Good, `> 3` Satisfactory, `> 2.5` Poor.
    #[default]
    Graded,
    /// Truncate to an integer, then 1..=5 maps to Needs Improvement..Excellent.
    IntegerBucket,
    /// `> 4` Excellent, `> 3` Good, `> 2` Satisfactory, otherwise Poor.
    Lenient,
}

impl RatingScale {
    pub fn label(&self, score: f64) -> RatingLabel {
        match self {
            RatingScale::Graded => {
                if score >= 4.7 {
                    RatingLabel::Excellent
                } else if score > 4.2 {
                    RatingLabel::Good
                } else if score > 3.0 {
                    RatingLabel::Satisfactory
                } else if score > 2.5 {
                    RatingLabel::Poor
                } else {
                    RatingLabel::NeedsImprovement
                }
            }
            RatingScale::IntegerBucket => match score.trunc() as i64 {
                i64::MIN..=1 => RatingLabel::NeedsImprovement,
                2 => RatingLabel::Poor,
                3 => RatingLabel::Satisfactory,
                4 => RatingLabel::Good,
                _ => RatingLabel::Excellent,
            },
            RatingScale::Lenient => {
                if score > 4.0 {
                    RatingLabel::Excellent
                } else if score > 3.0 {
                    RatingLabel::Good
                } else if score > 2.0 {
                    RatingLabel::Satisfactory
                } else {
                    RatingLabel::Poor
                }
            }
        }
    }
}
