//! Frame source and landmark detector seams.
//!
//! Decoding video and running landmark models are external capabilities.
//! The engine only needs to seek a source, pull timestamped frames in order,
//! and ask a detector for pose and face landmarks on each frame.

use std::path::Path;

use image::GrayImage;

use poise_common::error::{PoiseError, PoiseResult};
use poise_model::landmarks::{FaceLandmarks, LandmarkFrame, PoseLandmarks};
use poise_model::track::{LandmarkTrack, TrackHeader};

/// Anything with a pixel size. Landmark coordinates are scaled by it.
pub trait PixelFrame {
    /// `(width, height)` in pixels.
    fn dimensions(&self) -> (u32, u32);
}

impl PixelFrame for LandmarkFrame {
    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// A decoded video frame reduced to its luma plane.
#[derive(Debug, Clone)]
pub struct VideoFrame {
    pub luma: GrayImage,
}

impl VideoFrame {
    pub fn new(luma: GrayImage) -> Self {
        Self { luma }
    }
}

impl PixelFrame for VideoFrame {
    fn dimensions(&self) -> (u32, u32) {
        self.luma.dimensions()
    }
}

/// Seekable, ordered stream of timestamped frames.
///
/// Opened once per session by the caller, released through [`close`](Self::close).
pub trait FrameSource: Send {
    type Frame: PixelFrame;

    /// Position the source so the next frame is the first one at or after
    /// `timestamp_secs`.
    fn seek(&mut self, timestamp_secs: f64) -> PoiseResult<()>;

    /// Next `(timestamp_secs, frame)`, or `None` when exhausted.
    fn next_frame(&mut self) -> PoiseResult<Option<(f64, Self::Frame)>>;

    /// Source name for logging.
    fn name(&self) -> &str;

    /// Release the underlying resource.
    fn close(&mut self) -> PoiseResult<()> {
        Ok(())
    }
}

/// Pose and face landmark detection on one frame.
///
/// Returned points are normalized to `[0, 1]` of the frame size.
pub trait LandmarkDetector<F>: Send {
    fn detect_pose(&mut self, frame: &F) -> Option<PoseLandmarks>;

    fn detect_face(&mut self, frame: &F) -> Option<FaceLandmarks>;

    /// Detector name for logging.
    fn name(&self) -> &str;

    /// Release model resources.
    fn close(&mut self) -> PoiseResult<()> {
        Ok(())
    }
}

/// Frame source replaying a recorded landmark track.
///
/// Each frame is the recorded [`LandmarkFrame`] itself, so it pairs with
/// [`RecordedLandmarks`] as the detector.
#[derive(Debug, Clone)]
pub struct RecordedTrack {
    name: String,
    track: LandmarkTrack,
    cursor: usize,
}

impl RecordedTrack {
    /// Open and parse a JSONL track file.
    pub fn open(path: impl AsRef<Path>) -> PoiseResult<Self> {
        let path = path.as_ref();
        let track = LandmarkTrack::load(path).map_err(|e| PoiseError::frame_source(e.to_string()))?;
        if !track.is_monotonic() {
            return Err(PoiseError::frame_source(format!(
                "{}: frame timestamps are not monotonic",
                path.display()
            )));
        }
        tracing::info!(
            path = %path.display(),
            frames = track.frames.len(),
            duration_secs = track.duration_secs(),
            "Opened landmark track"
        );
        Ok(Self {
            name: path.display().to_string(),
            track,
            cursor: 0,
        })
    }

    /// Wrap an in-memory track.
    pub fn from_track(name: impl Into<String>, track: LandmarkTrack) -> Self {
        Self {
            name: name.into(),
            track,
            cursor: 0,
        }
    }

    pub fn header(&self) -> Option<&TrackHeader> {
        self.track.header.as_ref()
    }

    pub fn duration_secs(&self) -> f64 {
        self.track.duration_secs()
    }

    pub fn frame_count(&self) -> usize {
        self.track.frames.len()
    }
}

impl FrameSource for RecordedTrack {
    type Frame = LandmarkFrame;

    fn seek(&mut self, timestamp_secs: f64) -> PoiseResult<()> {
        if !timestamp_secs.is_finite() {
            return Err(PoiseError::frame_source(format!(
                "cannot seek to {timestamp_secs}"
            )));
        }
        self.cursor = self
            .track
            .frames
            .partition_point(|f| f.timestamp_secs < timestamp_secs);
        Ok(())
    }

    fn next_frame(&mut self) -> PoiseResult<Option<(f64, LandmarkFrame)>> {
        let Some(frame) = self.track.frames.get(self.cursor) else {
            return Ok(None);
        };
        self.cursor += 1;
        Ok(Some((frame.timestamp_secs, frame.clone())))
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn close(&mut self) -> PoiseResult<()> {
        self.cursor = self.track.frames.len();
        Ok(())
    }
}

/// Detector that returns the landmarks already recorded on the frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordedLandmarks;

impl LandmarkDetector<LandmarkFrame> for RecordedLandmarks {
    fn detect_pose(&mut self, frame: &LandmarkFrame) -> Option<PoseLandmarks> {
        frame.pose
    }

    fn detect_face(&mut self, frame: &LandmarkFrame) -> Option<FaceLandmarks> {
        frame.face.clone()
    }

    fn name(&self) -> &str {
        "recorded"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use poise_model::point::Point2D;

    fn track(timestamps: &[f64]) -> LandmarkTrack {
        LandmarkTrack::new(
            Some(TrackHeader::new(640, 480, 30.0)),
            timestamps
                .iter()
                .map(|&t| LandmarkFrame::empty(t, 640, 480))
                .collect(),
        )
    }

    #[test]
    fn test_seek_lands_on_first_frame_at_or_after() {
        let mut source = RecordedTrack::from_track("test", track(&[0.0, 0.5, 1.0, 1.5]));
        source.seek(0.7).unwrap();
        let (t, _) = source.next_frame().unwrap().unwrap();
        assert_eq!(t, 1.0);

        source.seek(1.0).unwrap();
        let (t, _) = source.next_frame().unwrap().unwrap();
        assert_eq!(t, 1.0);
    }

    #[test]
    fn test_seek_backwards_replays() {
        let mut source = RecordedTrack::from_track("test", track(&[0.0, 0.5, 1.0]));
        while source.next_frame().unwrap().is_some() {}
        source.seek(0.0).unwrap();
        assert_eq!(source.next_frame().unwrap().unwrap().0, 0.0);
    }

    #[test]
    fn test_seek_past_end_exhausts() {
        let mut source = RecordedTrack::from_track("test", track(&[0.0, 0.5]));
        source.seek(10.0).unwrap();
        assert!(source.next_frame().unwrap().is_none());
    }

    #[test]
    fn test_seek_rejects_nan() {
        let mut source = RecordedTrack::from_track("test", track(&[0.0]));
        assert!(matches!(
            source.seek(f64::NAN),
            Err(PoiseError::FrameSourceUnavailable { .. })
        ));
    }

    #[test]
    fn test_open_missing_file_is_unavailable() {
        let path = std::env::temp_dir().join("poise_missing_track_does_not_exist.jsonl");
        let err = RecordedTrack::open(&path).unwrap_err();
        assert!(matches!(err, PoiseError::FrameSourceUnavailable { .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_recorded_landmarks_pass_through() {
        let pose = PoseLandmarks {
            nose: Some(Point2D::new(0.5, 0.2)),
            ..Default::default()
        };
        let frame = LandmarkFrame::empty(0.0, 10, 10).with_pose(pose);
        let mut detector = RecordedLandmarks;
        assert_eq!(detector.detect_pose(&frame), Some(pose));
        assert!(detector.detect_face(&frame).is_none());
        assert_eq!(frame.dimensions(), (10, 10));
    }
}
