//! Session plans: which segments to score, and with which configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::scoring::ScoringConfig;
use crate::segment::Segment;

/// Everything the engine needs to know about a session besides the video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionPlan {
    /// Human-readable session name.
    pub name: String,

    /// Ordered segments to score.
    pub segments: Vec<Segment>,

    /// Thresholds and policies.
    #[serde(default)]
    pub scoring: ScoringConfig,
}

impl SessionPlan {
    pub fn new(name: impl Into<String>, segments: Vec<Segment>) -> Self {
        Self {
            name: name.into(),
            segments,
            scoring: ScoringConfig::default(),
        }
    }

    /// A plan that splits `duration_secs` into fixed-length segments.
    pub fn uniform(name: impl Into<String>, duration_secs: f64, segment_secs: f64) -> Self {
        Self::new(name, Segment::uniform(duration_secs, segment_secs))
    }

    /// Check segment bounds, ordering, and scoring thresholds.
    ///
    /// Segments must be individually valid and sorted by start time.
    /// Overlap is allowed.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.segments.is_empty() {
            return Err(ModelError::invalid("session plan", "no segments"));
        }
        for (i, segment) in self.segments.iter().enumerate() {
            segment.validate().map_err(|e| {
                ModelError::invalid("session plan", format!("segment {i}: {e}"))
            })?;
        }
        if let Some(i) = self
            .segments
            .windows(2)
            .position(|w| w[1].start_secs < w[0].start_secs)
        {
            return Err(ModelError::invalid(
                "session plan",
                format!("segment {} starts before segment {}", i + 1, i),
            ));
        }
        self.scoring.validate()
    }

    /// Total time covered from the first segment start to the last segment end.
    pub fn span_secs(&self) -> f64 {
        match (self.segments.first(), self.segments.last()) {
            (Some(first), Some(last)) => last.end_secs - first.start_secs,
            _ => 0.0,
        }
    }

    /// Load a plan from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| ModelError::IoError {
            path: path.to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&json).map_err(|e| ModelError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Save the plan as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ModelError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ModelError::IoError {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|e| ModelError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;
        std::fs::write(path, json).map_err(|e| ModelError::IoError {
            path: path.to_path_buf(),
            source: e,
        })
    }
}
