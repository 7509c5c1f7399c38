//! Recorded landmark tracks.
//!
//! A track is the landmark detector's output for a whole video, stored as
//! JSONL: an optional `# {header}` comment line followed by one
//! [`LandmarkFrame`] per line, in timestamp order.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::landmarks::LandmarkFrame;

/// Current track schema version.
pub const TRACK_SCHEMA_VERSION: &str = "1.0";

/// Metadata written as the first line of a track file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackHeader {
    pub schema_version: String,

    /// Source frame size in pixels.
    pub width: u32,
    pub height: u32,

    /// Nominal frame rate of the source video.
    pub fps: f64,

    /// Name of the video or detector that produced the track.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl TrackHeader {
    pub fn new(width: u32, height: u32, fps: f64) -> Self {
        Self {
            schema_version: TRACK_SCHEMA_VERSION.to_string(),
            width,
            height,
            fps,
            source: None,
        }
    }
}

/// An in-memory landmark track.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LandmarkTrack {
    pub header: Option<TrackHeader>,
    pub frames: Vec<LandmarkFrame>,
}

impl LandmarkTrack {
    pub fn new(header: Option<TrackHeader>, frames: Vec<LandmarkFrame>) -> Self {
        Self { header, frames }
    }

    /// Read and parse a track file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ModelError::IoError {
            path: path.to_path_buf(),
            source: e,
        })?;
        parse_track(&content).map_err(|e| ModelError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Write the track as JSONL.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ModelError> {
        let path = path.as_ref();
        let jsonl = serialize_track(self).map_err(|e| ModelError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;
        std::fs::write(path, jsonl).map_err(|e| ModelError::IoError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Timestamp of the last frame, or 0 for an empty track.
    pub fn duration_secs(&self) -> f64 {
        self.frames.last().map(|f| f.timestamp_secs).unwrap_or(0.0)
    }

    /// Fraction of frames with a face detection.
    pub fn face_coverage(&self) -> f64 {
        self.coverage(|f| f.face.is_some())
    }

    /// Fraction of frames with a pose detection.
    pub fn pose_coverage(&self) -> f64 {
        self.coverage(|f| f.pose.is_some())
    }

    /// Whether frame timestamps never decrease.
    pub fn is_monotonic(&self) -> bool {
        self.frames
            .windows(2)
            .all(|w| w[1].timestamp_secs >= w[0].timestamp_secs)
    }

    fn coverage(&self, has: impl Fn(&LandmarkFrame) -> bool) -> f64 {
        if self.frames.is_empty() {
            return 0.0;
        }
        self.frames.iter().filter(|f| has(f)).count() as f64 / self.frames.len() as f64
    }
}

/// Parse a track from JSONL content.
///
/// The first `#` line, if it holds a JSON object, is taken as the header.
/// Other `#` lines and blank lines are ignored.
pub fn parse_track(jsonl: &str) -> Result<LandmarkTrack, serde_json::Error> {
    let mut header = None;
    let mut frames = vec![];

    for line in jsonl.lines().map(str::trim) {
        if line.is_empty() {
            continue;
        }
        if let Some(comment) = line.strip_prefix('#') {
            if header.is_none() && frames.is_empty() {
                header = serde_json::from_str::<TrackHeader>(comment.trim()).ok();
            }
            continue;
        }
        frames.push(serde_json::from_str(line)?);
    }

    Ok(LandmarkTrack { header, frames })
}

/// Serialize a track to JSONL format.
pub fn serialize_track(track: &LandmarkTrack) -> Result<String, serde_json::Error> {
    let mut output = String::new();
    if let Some(header) = &track.header {
        output.push_str("# ");
        output.push_str(&serde_json::to_string(header)?);
        output.push('\n');
    }
    for frame in &track.frames {
        output.push_str(&serde_json::to_string(frame)?);
        output.push('\n');
    }
    Ok(output)
}
