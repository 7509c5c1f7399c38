//! Poise Data Model
//!
//! Defines the data contracts shared by the scoring engine and its callers:
//! - **Landmarks:** Per-frame pose and face landmark detections
//! - **Tracks:** Recorded landmark streams in JSONL form
//! - **Segments:** Time windows scored independently, and their results
//! - **Scoring:** Thresholds and pluggable scoring/rating policies
//! - **Sessions:** Plans, aggregated scores, and reports
//!
//! Landmark coordinates are normalized to `[0.0, 1.0]` relative to the
//! frame; consumers scale them by the frame's pixel dimensions.

pub mod error;
pub mod landmarks;
pub mod plan;
pub mod point;
pub mod scoring;
pub mod segment;
pub mod session;
pub mod track;

pub use error::*;
pub use landmarks::*;
pub use plan::*;
pub use point::*;
pub use scoring::*;
pub use segment::*;
pub use session::*;
pub use track::*;
