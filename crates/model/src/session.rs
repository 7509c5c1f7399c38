//! Session-level scores and the report handed to downstream renderers.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::scoring::RatingLabel;
use crate::segment::SegmentResult;

/// Report key for the posture label.
pub const POSTURE_LABEL_KEY: &str = "Posture";

/// Report key for the eye-contact label.
pub const EYE_CONTACT_LABEL_KEY: &str = "Eye Contact";

/// Aggregated scores for a whole session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionScore {
    pub trimmed_mean_posture: f64,
    pub trimmed_mean_eye_contact: f64,
    pub posture_label: RatingLabel,
    pub eye_contact_label: RatingLabel,

    /// Segments that went into the session.
    pub segment_count: usize,

    /// Segments kept per metric after trimming.
    pub segments_averaged: usize,
}

impl SessionScore {
    /// Named labels in the shape reporting collaborators expect.
    pub fn labels(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            (
                POSTURE_LABEL_KEY.to_string(),
                self.posture_label.to_string(),
            ),
            (
                EYE_CONTACT_LABEL_KEY.to_string(),
                self.eye_contact_label.to_string(),
            ),
        ])
    }
}

/// Terminal artifact of a scoring run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionReport {
    pub name: String,

    /// Generation timestamp (RFC 3339).
    pub generated_at: String,

    pub segments: Vec<SegmentResult>,
    pub score: SessionScore,
    pub labels: BTreeMap<String, String>,
}

impl SessionReport {
    pub fn new(name: impl Into<String>, segments: Vec<SegmentResult>, score: SessionScore) -> Self {
        let labels = score.labels();
        Self {
            name: name.into(),
            generated_at: chrono::Utc::now().to_rfc3339(),
            segments,
            score,
            labels,
        }
    }

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
