//! Time segments and their per-segment scores.

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// A sub-interval of the source video, scored independently.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start_secs: f64,
    pub end_secs: f64,
}

impl Segment {
    /// Create a segment, rejecting negative, empty, or inverted intervals.
    pub fn new(start_secs: f64, end_secs: f64) -> Result<Self, ModelError> {
        let segment = Self {
            start_secs,
            end_secs,
        };
        segment.validate()?;
        Ok(segment)
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        if !self.start_secs.is_finite() || !self.end_secs.is_finite() {
            return Err(ModelError::invalid(
                "segment",
                format!("non-finite bounds {}..{}", self.start_secs, self.end_secs),
            ));
        }
        if self.start_secs < 0.0 {
            return Err(ModelError::invalid(
                "segment",
                format!("start {} is negative", self.start_secs),
            ));
        }
        if self.start_secs >= self.end_secs {
            return Err(ModelError::invalid(
                "segment",
                format!(
                    "start {} is not before end {}",
                    self.start_secs, self.end_secs
                ),
            ));
        }
        Ok(())
    }

    pub fn duration_secs(&self) -> f64 {
        self.end_secs - self.start_secs
    }

    /// Whether a frame timestamp falls inside the segment (inclusive).
    pub fn contains(&self, timestamp_secs: f64) -> bool {
        timestamp_secs >= self.start_secs && timestamp_secs <= self.end_secs
    }

    /// Split `[0, duration)` into consecutive segments of `segment_secs`.
    ///
    /// The final segment is shortened to end at `duration_secs`.
    pub fn uniform(duration_secs: f64, segment_secs: f64) -> Vec<Segment> {
        if !(duration_secs > 0.0 && segment_secs > 0.0) {
            return vec![];
        }

        let mut segments = vec![];
        let mut start = 0.0;
        while start < duration_secs {
            let end = (start + segment_secs).min(duration_secs);
            segments.push(Segment {
                start_secs: start,
                end_secs: end,
            });
            start = end;
        }
        segments
    }
}

/// Scores for one processed segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentResult {
    pub segment: Segment,

    /// Posture score in `[0, 5]`.
    pub posture_score: f64,

    /// Eye-contact score in `[0, 5]`, rounded to an integer value.
    pub eye_contact_score: f64,

    /// Blinks per second of segment time.
    pub blink_rate: f64,

    /// Spread of smoothed gaze points around their centroid.
    pub gaze_variance: f64,

    /// Frames read from the source inside the segment.
    #[serde(default)]
    pub frames_analyzed: usize,

    /// Frames with a usable face detection.
    #[serde(default)]
    pub face_frames: usize,

    /// Frames with a usable pose detection.
    #[serde(default)]
    pub pose_frames: usize,

    #[serde(default)]
    pub blink_count: u32,
}

impl SegmentResult {
    /// Whether any frame of the segment carried a usable detection.
    pub fn has_signal(&self) -> bool {
        self.face_frames > 0 || self.pose_frames > 0
    }
}
