//! Geometric scoring from landmark points.
//!
//! Functions expect pixel-space points unless noted otherwise. Degenerate
//! geometry (coincident points, zero-width eyes) is absorbed with an epsilon
//! guard and never surfaces as an error.

use poise_common::error::{PoiseError, PoiseResult};
use poise_model::landmarks::{
    Eye, FaceLandmarks, PoseLandmark, PoseLandmarks, EYE_CONTOUR_POINTS,
};
use poise_model::point::Point2D;
use poise_model::scoring::{EyeContactWeights, PostureReference, PostureStrategy};

const EPSILON: f64 = 1e-6;

/// Score for an observation inside the good-posture band.
pub const GOOD_POSTURE_SCORE: f64 = 5.0;

/// Score for an observation outside the good-posture band.
pub const POOR_POSTURE_SCORE: f64 = 1.0;

/// Upper bound of every posture and eye-contact score.
pub const MAX_SCORE: f64 = 5.0;

/// Shoulder-line angle against horizontal, in degrees within `(-90, 90]`.
///
/// The x difference carries an epsilon so vertically aligned shoulders
/// produce a near-90° angle instead of a division by zero.
pub fn shoulder_angle_deg(left_shoulder: Point2D, right_shoulder: Point2D) -> f64 {
    let slope =
        (left_shoulder.y - right_shoulder.y) / (left_shoulder.x - right_shoulder.x + EPSILON);
    slope.atan().to_degrees()
}

/// Binary band score: [`GOOD_POSTURE_SCORE`] when `|angle|` lies in
/// `[min_deg, max_deg]`, otherwise [`POOR_POSTURE_SCORE`].
pub fn band_posture_score(
    left_shoulder: Point2D,
    right_shoulder: Point2D,
    min_deg: f64,
    max_deg: f64,
) -> f64 {
    let angle = shoulder_angle_deg(left_shoulder, right_shoulder).abs();
    if (min_deg..=max_deg).contains(&angle) {
        GOOD_POSTURE_SCORE
    } else {
        POOR_POSTURE_SCORE
    }
}

/// Unsigned angle between two vectors in degrees, or `None` if either is
/// (near) zero length.
pub fn vector_angle_deg(a: Point2D, b: Point2D) -> Option<f64> {
    let norm_product = a.norm() * b.norm();
    if norm_product < EPSILON {
        return None;
    }
    let cos_angle = (a.dot(&b) / norm_product).clamp(-1.0, 1.0);
    Some(cos_angle.acos().to_degrees())
}

/// Continuous score `5 - angle / 10`, clamped to `[0, 5]`.
///
/// Zero-length vectors score 0.
pub fn continuous_posture_score(shoulder_vector: Point2D, reference_vector: Point2D) -> f64 {
    match vector_angle_deg(shoulder_vector, reference_vector) {
        Some(angle) => (MAX_SCORE - angle / 10.0).clamp(0.0, MAX_SCORE),
        None => 0.0,
    }
}

/// Eye aspect ratio of a six-point eye contour.
///
/// `(|p1 - p5| + |p2 - p4|) / (2 * |p0 - p3|)`. Lower means more closed.
pub fn eye_openness_ratio(contour: &[Point2D]) -> PoiseResult<f64> {
    if contour.len() < EYE_CONTOUR_POINTS {
        return Err(PoiseError::missing_landmarks(format!(
            "eye contour needs {EYE_CONTOUR_POINTS} points, got {}",
            contour.len()
        )));
    }
    let vertical_1 = contour[1].distance_to(&contour[5]);
    let vertical_2 = contour[2].distance_to(&contour[4]);
    let horizontal = contour[0].distance_to(&contour[3]);
    Ok((vertical_1 + vertical_2) / (2.0 * horizontal).max(EPSILON))
}

/// Segment eye-contact score `5 - (gaze_variance * w + blink_rate * penalty)`,
/// clamped to `[0, 5]` and rounded to an integer with ties going to even.
pub fn gaze_stability_score(
    gaze_variance: f64,
    blink_rate: f64,
    weights: EyeContactWeights,
) -> f64 {
    let penalty =
        gaze_variance * weights.gaze_variance_weight + blink_rate * weights.blink_rate_penalty;
    (MAX_SCORE - penalty).clamp(0.0, MAX_SCORE).round_ties_even()
}

/// Midpoint of an eye contour's two corners.
pub fn eye_centre(contour: &[Point2D]) -> PoiseResult<Point2D> {
    if contour.len() < EYE_CONTOUR_POINTS {
        return Err(PoiseError::missing_landmarks(format!(
            "eye contour needs {EYE_CONTOUR_POINTS} points, got {}",
            contour.len()
        )));
    }
    Ok(Point2D::midpoint(&contour[0], &contour[3]))
}

/// Per-frame eye-contact score from how far both eye centres sit from the
/// face centre: `(1 - (|left - centre| + |right - centre|)) * 5`, clamped to
/// `[0, 5]`.
///
/// Expects normalized coordinates, so distances are fractions of the frame.
pub fn face_centre_eye_contact(face: &FaceLandmarks) -> PoiseResult<f64> {
    let forehead = face
        .forehead
        .ok_or_else(|| PoiseError::missing_landmarks("forehead"))?;
    let chin = face.chin.ok_or_else(|| PoiseError::missing_landmarks("chin"))?;
    let centre = Point2D::midpoint(&forehead, &chin);

    let mut spread = 0.0;
    for eye in Eye::BOTH {
        spread += eye_centre(face.eye(eye))?.distance_to(&centre);
    }
    Ok((1.0 - spread).clamp(0.0, 1.0) * MAX_SCORE)
}

/// Posture scoring under a configured [`PostureStrategy`].
#[derive(Debug, Clone, Copy)]
pub struct PostureScorer {
    strategy: PostureStrategy,
}

impl PostureScorer {
    pub fn new(strategy: PostureStrategy) -> Self {
        Self { strategy }
    }

    pub fn strategy(&self) -> PostureStrategy {
        self.strategy
    }

    /// Score one pose observation. Fails when a landmark the strategy needs
    /// is missing.
    pub fn score(&self, pose: &PoseLandmarks) -> PoiseResult<f64> {
        let left_shoulder = require(pose, PoseLandmark::LeftShoulder)?;
        let right_shoulder = require(pose, PoseLandmark::RightShoulder)?;

        match self.strategy {
            PostureStrategy::AngleBand { min_deg, max_deg } => Ok(band_posture_score(
                left_shoulder,
                right_shoulder,
                min_deg,
                max_deg,
            )),
            PostureStrategy::ContinuousAngle { reference } => {
                let shoulder_vector = right_shoulder - left_shoulder;
                let reference_vector = match reference {
                    PostureReference::Hips => {
                        require(pose, PoseLandmark::RightHip)?
                            - require(pose, PoseLandmark::LeftHip)?
                    }
                    PostureReference::Head => {
                        require(pose, PoseLandmark::Nose)?
                            - Point2D::midpoint(&left_shoulder, &right_shoulder)
                    }
                };
                Ok(continuous_posture_score(shoulder_vector, reference_vector))
            }
        }
    }
}

fn require(pose: &PoseLandmarks, landmark: PoseLandmark) -> PoiseResult<Point2D> {
    pose.get(landmark)
        .ok_or_else(|| PoiseError::missing_landmarks(landmark.name()))
}
