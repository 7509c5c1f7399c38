//! Poise Engine: segment-based engagement scoring
//!
//! Consumes per-frame landmark detections and produces posture and
//! eye-contact scores per time segment, then aggregates them per session:
//! - **Geometry:** Posture angles and eye aspect ratio from landmark points
//! - **Smoothing:** Bounded-window filters for pupil and gaze estimates
//! - **Blink:** Debounced open/closed state machine counting blinks
//! - **Gaze:** Spread of smoothed gaze points as an attention proxy
//! - **Segments:** Per-segment driver over a frame source and detector
//! - **Aggregation:** Trimmed session means mapped to rating labels
//!
//! Frame decoding and landmark detection are external; they plug in through
//! the [`source::FrameSource`], [`source::LandmarkDetector`] and
//! [`pupil::PupilLocator`] traits.

pub mod aggregate;
pub mod blink;
pub mod gaze;
pub mod geometry;
pub mod pupil;
pub mod segment;
pub mod session;
pub mod smoothing;
pub mod source;

pub use aggregate::SegmentAggregator;
pub use blink::BlinkDetector;
pub use gaze::GazeVarianceTracker;
pub use geometry::PostureScorer;
pub use segment::SegmentProcessor;
pub use session::{CancellationToken, SessionOutcome, SessionRunner};
pub use smoothing::TemporalSmoother;
