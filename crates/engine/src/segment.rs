//! Per-segment driver.
//!
//! Seeks the frame source to the segment start, pulls frames until the
//! reported timestamp passes the segment end, and folds every frame into
//! fresh blink, smoothing, gaze and posture state. Nothing carries over
//! between segments.

use poise_common::error::{PoiseError, PoiseResult};
use poise_model::landmarks::{Eye, LandmarkFrame};
use poise_model::point::Point2D;
use poise_model::scoring::{EyeContactStrategy, PostureStrategy, ScoringConfig};
use poise_model::segment::{Segment, SegmentResult};

use crate::blink::BlinkDetector;
use crate::gaze::GazeVarianceTracker;
use crate::geometry::{
    eye_openness_ratio, face_centre_eye_contact, gaze_stability_score, PostureScorer,
    GOOD_POSTURE_SCORE, MAX_SCORE, POOR_POSTURE_SCORE,
};
use crate::pupil::PupilLocator;
use crate::smoothing::TemporalSmoother;
use crate::source::{FrameSource, LandmarkDetector, PixelFrame};

/// Scores single segments against one scoring configuration.
#[derive(Debug, Clone, Copy)]
pub struct SegmentProcessor<'a> {
    config: &'a ScoringConfig,
    posture: PostureScorer,
}

impl<'a> SegmentProcessor<'a> {
    pub fn new(config: &'a ScoringConfig) -> Self {
        Self {
            config,
            posture: PostureScorer::new(config.posture),
        }
    }

    pub fn config(&self) -> &ScoringConfig {
        self.config
    }

    /// Process one segment.
    ///
    /// Per-frame failures (missing landmarks, no pupil) only drop that
    /// frame's contribution. A segment without any frame is still scored,
    /// from empty statistics. Errors returned here are an invalid segment or a
    /// source that cannot seek.
    pub fn process<S, D, L>(
        &self,
        segment: &Segment,
        source: &mut S,
        detector: &mut D,
        locator: &mut L,
    ) -> PoiseResult<SegmentResult>
    where
        S: FrameSource,
        D: LandmarkDetector<S::Frame>,
        L: PupilLocator<S::Frame>,
    {
        segment
            .validate()
            .map_err(|e| PoiseError::invalid_segment(e.to_string()))?;

        let span = tracing::info_span!(
            "segment",
            start = segment.start_secs,
            end = segment.end_secs
        );
        let _enter = span.enter();

        source.seek(segment.start_secs)?;

        let mut state = SegmentState::new(self.config, self.posture);
        loop {
            let (timestamp_secs, frame) = match source.next_frame() {
                Ok(Some(next)) => next,
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!(error = %e, "Frame read failed; closing segment early");
                    break;
                }
            };
            if timestamp_secs < segment.start_secs {
                continue;
            }
            if timestamp_secs > segment.end_secs {
                break;
            }

            let (width, height) = frame.dimensions();
            let landmarks = LandmarkFrame {
                timestamp_secs,
                width,
                height,
                pose: detector.detect_pose(&frame),
                face: detector.detect_face(&frame),
            };
            let pupils = if landmarks.face.is_some() {
                Eye::BOTH.map(|eye| locator.locate(&frame, &landmarks, eye))
            } else {
                [None, None]
            };
            state.observe(&landmarks, pupils);
        }

        if state.frames_analyzed == 0 {
            let empty = PoiseError::EmptySegment {
                start_secs: segment.start_secs,
                end_secs: segment.end_secs,
            };
            tracing::warn!(error = %empty, "Scoring segment with no-signal defaults");
        }

        let result = state.finish(*segment);
        tracing::info!(
            posture = result.posture_score,
            eye_contact = result.eye_contact_score,
            blink_rate = result.blink_rate,
            gaze_variance = result.gaze_variance,
            frames = result.frames_analyzed,
            "Segment scored"
        );
        Ok(result)
    }
}

/// Running posture statistics for one segment.
#[derive(Debug, Clone, Copy)]
enum PostureTally {
    Band { good: usize, total: usize },
    Continuous { sum: f64, count: usize },
}

impl PostureTally {
    fn new(strategy: PostureStrategy) -> Self {
        match strategy {
            PostureStrategy::AngleBand { .. } => PostureTally::Band { good: 0, total: 0 },
            PostureStrategy::ContinuousAngle { .. } => {
                PostureTally::Continuous { sum: 0.0, count: 0 }
            }
        }
    }

    fn record(&mut self, score: f64) {
        match self {
            PostureTally::Band { good, total } => {
                *total += 1;
                if score >= GOOD_POSTURE_SCORE {
                    *good += 1;
                }
            }
            PostureTally::Continuous { sum, count } => {
                *sum += score;
                *count += 1;
            }
        }
    }

    /// Segment posture score. No observations scores as poor.
    fn score(&self) -> f64 {
        match *self {
            PostureTally::Band { total: 0, .. } | PostureTally::Continuous { count: 0, .. } => {
                POOR_POSTURE_SCORE
            }
            // Integer arithmetic keeps the truncation exact.
            PostureTally::Band { good, total } => (good * MAX_SCORE as usize / total) as f64,
            PostureTally::Continuous { sum, count } => sum / count as f64,
        }
    }
}

/// Mutable state of one segment in progress.
struct SegmentState<'a> {
    config: &'a ScoringConfig,
    posture: PostureScorer,
    tally: PostureTally,
    blink: BlinkDetector,
    pupil_smoothers: [TemporalSmoother; 2],
    gaze_smoother: TemporalSmoother,
    gaze: GazeVarianceTracker,
    frames_analyzed: usize,
    face_frames: usize,
    pose_frames: usize,
    centre_sum: f64,
    centre_frames: usize,
}

impl<'a> SegmentState<'a> {
    fn new(config: &'a ScoringConfig, posture: PostureScorer) -> Self {
        let window = config.smoothing_window_size;
        Self {
            config,
            posture,
            tally: PostureTally::new(posture.strategy()),
            blink: BlinkDetector::new(config.ear_threshold, config.consecutive_frames_threshold),
            pupil_smoothers: [
                TemporalSmoother::weighted(window),
                TemporalSmoother::weighted(window),
            ],
            gaze_smoother: TemporalSmoother::mean(window),
            gaze: GazeVarianceTracker::new(),
            frames_analyzed: 0,
            face_frames: 0,
            pose_frames: 0,
            centre_sum: 0.0,
            centre_frames: 0,
        }
    }

    /// Fold one frame's detections in. `pupils` is indexed like [`Eye::BOTH`].
    fn observe(&mut self, landmarks: &LandmarkFrame, pupils: [Option<Point2D>; 2]) {
        self.frames_analyzed += 1;

        if let Some(face) = landmarks.face_pixels() {
            let ratios = (
                eye_openness_ratio(face.eye(Eye::Left)),
                eye_openness_ratio(face.eye(Eye::Right)),
            );
            match ratios {
                (Ok(left), Ok(right)) => {
                    self.face_frames += 1;
                    self.blink.update((left + right) / 2.0);
                }
                (Err(e), _) | (_, Err(e)) => {
                    tracing::debug!(t = landmarks.timestamp_secs, error = %e, "Skipping blink sample");
                }
            }

            let [left, right] = pupils;
            let smoothed_left = self.pupil_smoothers[0].push_optional(left);
            let smoothed_right = self.pupil_smoothers[1].push_optional(right);
            if let (Some(l), Some(r)) = (smoothed_left, smoothed_right) {
                let gaze_point = self
                    .gaze_smoother
                    .push_and_smooth(Point2D::midpoint(&l, &r));
                self.gaze.push(gaze_point);
            }
        }

        if let (EyeContactStrategy::FaceCentreDistance, Some(face)) =
            (self.config.eye_contact, &landmarks.face)
        {
            match face_centre_eye_contact(face) {
                Ok(score) => {
                    self.centre_sum += score;
                    self.centre_frames += 1;
                }
                Err(e) => {
                    tracing::debug!(t = landmarks.timestamp_secs, error = %e, "Skipping face-centre sample");
                }
            }
        }

        if let Some(pose) = landmarks.pose_pixels() {
            match self.posture.score(&pose) {
                Ok(score) => {
                    self.pose_frames += 1;
                    self.tally.record(score);
                }
                Err(e) => {
                    tracing::debug!(t = landmarks.timestamp_secs, error = %e, "Skipping posture sample");
                }
            }
        }
    }

    fn finish(self, segment: Segment) -> SegmentResult {
        let blink_count = self.blink.blink_count();
        let blink_rate = blink_count as f64 / segment.duration_secs();
        let gaze_variance = self.gaze.variance();

        let eye_contact_score = match self.config.eye_contact {
            EyeContactStrategy::GazeStability(weights) => {
                gaze_stability_score(gaze_variance, blink_rate, weights)
            }
            EyeContactStrategy::FaceCentreDistance if self.centre_frames == 0 => 0.0,
            EyeContactStrategy::FaceCentreDistance => {
                (self.centre_sum / self.centre_frames as f64).min(MAX_SCORE)
            }
        };

        SegmentResult {
            segment,
            posture_score: self.tally.score(),
            eye_contact_score,
            blink_rate,
            gaze_variance,
            frames_analyzed: self.frames_analyzed,
            face_frames: self.face_frames,
            pose_frames: self.pose_frames,
            blink_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pupil::IrisPupilLocator;
    use crate::source::{RecordedLandmarks, RecordedTrack};
    use poise_model::landmarks::{FaceLandmarks, PoseLandmarks};
    use poise_model::scoring::PostureReference;
    use poise_model::track::LandmarkTrack;

    const W: u32 = 1000;
    const H: u32 = 1000;

    /// Normalized six-point eye contour with the given eyelid opening.
    fn eye(x0: f64, opening: f64) -> Vec<Point2D> {
        let y = 0.4;
        vec![
            Point2D::new(x0, y),
            Point2D::new(x0 + 0.01, y - opening),
            Point2D::new(x0 + 0.02, y - opening),
            Point2D::new(x0 + 0.03, y),
            Point2D::new(x0 + 0.02, y + opening),
            Point2D::new(x0 + 0.01, y + opening),
        ]
    }

    fn face(opening: f64) -> FaceLandmarks {
        FaceLandmarks {
            left_eye: eye(0.40, opening),
            right_eye: eye(0.55, opening),
            left_iris: Some(Point2D::new(0.415, 0.4)),
            right_iris: Some(Point2D::new(0.565, 0.4)),
            ..Default::default()
        }
    }

    fn upright() -> PoseLandmarks {
        PoseLandmarks {
            left_shoulder: Some(Point2D::new(0.5, 0.4)),
            right_shoulder: Some(Point2D::new(0.5, 0.6)),
            ..Default::default()
        }
    }

    fn slouched() -> PoseLandmarks {
        PoseLandmarks {
            left_shoulder: Some(Point2D::new(0.4, 0.5)),
            right_shoulder: Some(Point2D::new(0.6, 0.5)),
            ..Default::default()
        }
    }

    fn run(config: &ScoringConfig, frames: Vec<LandmarkFrame>, segment: Segment) -> SegmentResult {
        let mut source = RecordedTrack::from_track("test", LandmarkTrack::new(None, frames));
        SegmentProcessor::new(config)
            .process(&segment, &mut source, &mut RecordedLandmarks, &mut IrisPupilLocator)
            .unwrap()
    }

    fn frames(count: usize, build: impl Fn(usize) -> LandmarkFrame) -> Vec<LandmarkFrame> {
        (0..count).map(build).collect()
    }

    #[test]
    fn test_band_posture_truncates_fraction() {
        let config = ScoringConfig::default();
        // 2 of 3 upright: 2 * 5 / 3 = 3.33 -> 3.
        let poses = [upright(), upright(), slouched()];
        let frames = frames(3, |i| {
            LandmarkFrame::empty(i as f64, W, H).with_pose(poses[i])
        });
        let result = run(&config, frames, Segment::new(0.0, 3.0).unwrap());
        assert_eq!(result.posture_score, 3.0);
        assert_eq!(result.pose_frames, 3);
    }

    #[test]
    fn test_no_pose_scores_poor() {
        let config = ScoringConfig::default();
        let frames = frames(5, |i| LandmarkFrame::empty(i as f64 * 0.1, W, H));
        let result = run(&config, frames, Segment::new(0.0, 1.0).unwrap());
        assert_eq!(result.posture_score, POOR_POSTURE_SCORE);
        // Nothing to penalize without a face.
        assert_eq!(result.eye_contact_score, 5.0);
        assert_eq!(result.frames_analyzed, 5);
        assert!(!result.has_signal());
    }

    #[test]
    fn test_partial_pose_is_skipped_not_counted() {
        let config = ScoringConfig::default();
        let broken = PoseLandmarks {
            left_shoulder: Some(Point2D::new(0.5, 0.5)),
            ..Default::default()
        };
        let frames = vec![
            LandmarkFrame::empty(0.0, W, H).with_pose(upright()),
            LandmarkFrame::empty(0.5, W, H).with_pose(broken),
        ];
        let result = run(&config, frames, Segment::new(0.0, 1.0).unwrap());
        assert_eq!(result.pose_frames, 1);
        assert_eq!(result.posture_score, 5.0);
    }

    #[test]
    fn test_continuous_posture_averages() {
        let config = ScoringConfig {
            posture: PostureStrategy::ContinuousAngle {
                reference: PostureReference::Hips,
            },
            ..Default::default()
        };
        let aligned = PoseLandmarks {
            left_shoulder: Some(Point2D::new(0.4, 0.3)),
            right_shoulder: Some(Point2D::new(0.6, 0.3)),
            left_hip: Some(Point2D::new(0.42, 0.6)),
            right_hip: Some(Point2D::new(0.58, 0.6)),
            ..Default::default()
        };
        let frames = vec![
            LandmarkFrame::empty(0.0, W, H).with_pose(aligned),
            LandmarkFrame::empty(1.0, W, H).with_pose(aligned),
        ];
        let result = run(&config, frames, Segment::new(0.0, 2.0).unwrap());
        assert!((result.posture_score - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_steady_open_eyes_score_full_eye_contact() {
        let config = ScoringConfig::default();
        let frames = frames(30, |i| {
            LandmarkFrame::empty(i as f64 / 10.0, W, H).with_face(face(0.01))
        });
        let result = run(&config, frames, Segment::new(0.0, 3.0).unwrap());
        assert_eq!(result.blink_count, 0);
        assert!(result.gaze_variance < 1e-9);
        assert_eq!(result.eye_contact_score, 5.0);
        assert_eq!(result.face_frames, 30);
    }

    #[test]
    fn test_blink_rate_uses_segment_duration() {
        let config = ScoringConfig::default();
        // One sustained closure over frames 10..15; irises are lost while closed.
        let frames = frames(50, |i| {
            let closed = (10..15).contains(&i);
            let mut f = face(if closed { 0.001 } else { 0.01 });
            if closed {
                f.left_iris = None;
                f.right_iris = None;
            }
            LandmarkFrame::empty(i as f64 / 10.0, W, H).with_face(f)
        });
        let result = run(&config, frames, Segment::new(0.0, 5.0).unwrap());
        assert_eq!(result.blink_count, 1);
        assert!((result.blink_rate - 0.2).abs() < 1e-12);
        // 5 - 0.2 * 10 = 3.
        assert_eq!(result.eye_contact_score, 3.0);
    }

    /// Frames at 10 fps; eyes closed (and irises lost) for indices in `closed`.
    fn blinking(count: usize, closed: std::ops::Range<usize>) -> Vec<LandmarkFrame> {
        frames(count, |i| {
            let shut = closed.contains(&i);
            let mut f = face(if shut { 0.001 } else { 0.01 });
            if shut {
                f.left_iris = None;
                f.right_iris = None;
            }
            LandmarkFrame::empty(i as f64 / 10.0 + 0.05, W, H).with_face(f)
        })
    }

    #[test]
    fn test_half_point_eye_contact_rounds_to_even() {
        let config = ScoringConfig::default();
        let result = run(&config, blinking(40, 10..14), Segment::new(0.0, 4.0).unwrap());
        assert_eq!(result.blink_count, 1);
        assert!((result.blink_rate - 0.25).abs() < 1e-12);
        assert!(result.gaze_variance < 1e-9);
        // 5 - 0.25 * 10 = 2.5 rounds down to the even 2.
        assert_eq!(result.eye_contact_score, 2.0);
    }

    #[test]
    fn test_blink_state_does_not_cross_segment_boundary() {
        let config = ScoringConfig::default();
        // Closed for 3.85, 3.95 and 4.05: three frames, but split 2 + 1.
        let track = LandmarkTrack::new(None, blinking(80, 38..41));
        let processor = SegmentProcessor::new(&config);
        let mut source = RecordedTrack::from_track("test", track.clone());

        let first = Segment::new(0.0, 4.0).unwrap();
        let second = Segment::new(4.0, 8.0).unwrap();
        let mut counts = vec![];
        for segment in [first, second] {
            let result = processor
                .process(&segment, &mut source, &mut RecordedLandmarks, &mut IrisPupilLocator)
                .unwrap();
            counts.push(result.blink_count);
        }
        assert_eq!(counts, vec![0, 0]);

        // The same closure inside one segment is a blink.
        let mut source = RecordedTrack::from_track("test", track);
        let whole = processor
            .process(
                &Segment::new(0.0, 8.0).unwrap(),
                &mut source,
                &mut RecordedLandmarks,
                &mut IrisPupilLocator,
            )
            .unwrap();
        assert_eq!(whole.blink_count, 1);
    }

    #[test]
    fn test_face_centre_strategy_averages_frames() {
        let config = ScoringConfig {
            eye_contact: EyeContactStrategy::FaceCentreDistance,
            ..Default::default()
        };
        let frames = frames(10, |i| {
            // Eye centres at x 0.415 and 0.565; the face centre sits between them
            // for even frames and 0.1 lower for odd frames.
            let centre_y = if i % 2 == 0 { 0.4 } else { 0.5 };
            let f = FaceLandmarks {
                forehead: Some(Point2D::new(0.49, centre_y - 0.2)),
                chin: Some(Point2D::new(0.49, centre_y + 0.2)),
                ..face(0.01)
            };
            LandmarkFrame::empty(i as f64 / 10.0, W, H).with_face(f)
        });
        let result = run(&config, frames, Segment::new(0.0, 1.0).unwrap());

        let even = (1.0 - 2.0 * 0.075) * 5.0;
        let odd = (1.0 - 2.0 * (0.075f64.powi(2) + 0.01).sqrt()) * 5.0;
        let expected = (even + odd) / 2.0;
        assert!(
            (result.eye_contact_score - expected).abs() < 1e-9,
            "score = {}",
            result.eye_contact_score
        );
    }

    #[test]
    fn test_face_centre_strategy_without_face_scores_zero() {
        let config = ScoringConfig {
            eye_contact: EyeContactStrategy::FaceCentreDistance,
            ..Default::default()
        };
        // Faces without forehead and chin never produce a sample.
        let frames = frames(5, |i| {
            LandmarkFrame::empty(i as f64 / 10.0, W, H).with_face(face(0.01))
        });
        let result = run(&config, frames, Segment::new(0.0, 1.0).unwrap());
        assert_eq!(result.face_frames, 5);
        assert_eq!(result.eye_contact_score, 0.0);
    }

    #[test]
    fn test_frames_outside_segment_are_ignored() {
        let config = ScoringConfig::default();
        let frames = frames(10, |i| {
            LandmarkFrame::empty(i as f64, W, H).with_pose(upright())
        });
        let result = run(&config, frames, Segment::new(2.0, 4.0).unwrap());
        // Timestamps 2, 3 and 4 (inclusive end).
        assert_eq!(result.frames_analyzed, 3);
    }

    #[test]
    fn test_empty_segment_uses_defaults() {
        let config = ScoringConfig::default();
        let frames = frames(3, |i| {
            LandmarkFrame::empty(i as f64, W, H).with_pose(upright())
        });
        let result = run(&config, frames, Segment::new(10.0, 20.0).unwrap());
        assert_eq!(result.frames_analyzed, 0);
        assert_eq!(result.posture_score, POOR_POSTURE_SCORE);
        assert_eq!(result.eye_contact_score, 5.0);
        assert_eq!(result.blink_rate, 0.0);
    }

    #[test]
    fn test_invalid_segment_is_rejected() {
        let config = ScoringConfig::default();
        let mut source = RecordedTrack::from_track("test", LandmarkTrack::default());
        let segment = Segment {
            start_secs: 5.0,
            end_secs: 1.0,
        };
        let err = SegmentProcessor::new(&config)
            .process(&segment, &mut source, &mut RecordedLandmarks, &mut IrisPupilLocator)
            .unwrap_err();
        assert!(matches!(err, PoiseError::InvalidSegment { .. }));
    }

    #[test]
    fn test_band_tally_exact_fractions() {
        let mut tally = PostureTally::new(PostureStrategy::default());
        for score in [5.0, 5.0, 5.0, 1.0, 1.0] {
            tally.record(score);
        }
        assert_eq!(tally.score(), 3.0);
    }
}
