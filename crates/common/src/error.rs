//! Error types shared across Poise crates.

/// Top-level error type for Poise operations.
///
/// Only `FrameSourceUnavailable`, `Config`, `InvalidSegment` and `Cancelled`
/// ever reach a session caller. `MissingLandmarks` and `EmptySegment` are
/// raised inside segment processing and absorbed there.
#[derive(Debug, thiserror::Error)]
pub enum PoiseError {
    #[error("Missing landmarks: {landmark}")]
    MissingLandmarks { landmark: String },

    #[error("Empty segment: no decodable frames between {start_secs}s and {end_secs}s")]
    EmptySegment { start_secs: f64, end_secs: f64 },

    #[error("Frame source unavailable: {message}")]
    FrameSourceUnavailable { message: String },

    #[error("Invalid segment: {message}")]
    InvalidSegment { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Session cancelled after {completed} segment(s)")]
    Cancelled { completed: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using PoiseError.
pub type PoiseResult<T> = Result<T, PoiseError>;

impl PoiseError {
    pub fn missing_landmarks(landmark: impl Into<String>) -> Self {
        Self::MissingLandmarks {
            landmark: landmark.into(),
        }
    }

    pub fn frame_source(msg: impl Into<String>) -> Self {
        Self::FrameSourceUnavailable {
            message: msg.into(),
        }
    }

    pub fn invalid_segment(msg: impl Into<String>) -> Self {
        Self::InvalidSegment {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Whether the error aborts a whole session rather than one frame or segment.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Self::MissingLandmarks { .. } | Self::EmptySegment { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_errors_are_not_fatal() {
        assert!(!PoiseError::missing_landmarks("left_eye").is_fatal());
        assert!(!PoiseError::EmptySegment {
            start_secs: 0.0,
            end_secs: 4.0
        }
        .is_fatal());
        assert!(PoiseError::frame_source("cannot open").is_fatal());
        assert!(PoiseError::Cancelled { completed: 2 }.is_fatal());
    }

    #[test]
    fn test_error_messages() {
        let err = PoiseError::missing_landmarks("nose");
        assert_eq!(err.to_string(), "Missing landmarks: nose");

        let err = PoiseError::frame_source("track.jsonl: no such file");
        assert_eq!(
            err.to_string(),
            "Frame source unavailable: track.jsonl: no such file"
        );
    }
}
