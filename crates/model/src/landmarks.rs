//! Per-frame landmark detections.
//!
//! A [`LandmarkFrame`] is what the external landmark detector produces for a
//! single decoded video frame. Points are normalized to `[0.0, 1.0]` relative
//! to the frame; [`LandmarkFrame::to_pixels`] converts them to pixel space.

use serde::{Deserialize, Serialize};

use crate::point::Point2D;

/// Number of points in an eye contour.
///
/// Order: outer corner, two upper-lid points, inner corner, two lower-lid points.
pub const EYE_CONTOUR_POINTS: usize = 6;

/// Face-mesh indices of the first eye contour, in contour order.
pub const LEFT_EYE_MESH_INDICES: [usize; EYE_CONTOUR_POINTS] = [33, 160, 158, 133, 153, 144];

/// Face-mesh indices of the second eye contour, in contour order.
pub const RIGHT_EYE_MESH_INDICES: [usize; EYE_CONTOUR_POINTS] = [362, 385, 387, 263, 373, 380];

const FOREHEAD_MESH_INDEX: usize = 10;
const CHIN_MESH_INDEX: usize = 152;
const LEFT_IRIS_MESH_INDEX: usize = 468;
const RIGHT_IRIS_MESH_INDEX: usize = 473;

/// Which eye a contour or pupil belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Eye {
    Left,
    Right,
}

impl Eye {
    pub const BOTH: [Eye; 2] = [Eye::Left, Eye::Right];

    pub fn name(&self) -> &'static str {
        match self {
            Eye::Left => "left_eye",
            Eye::Right => "right_eye",
        }
    }
}

/// Named pose landmarks consumed by posture scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PoseLandmark {
    Nose,
    LeftShoulder,
    RightShoulder,
    LeftHip,
    RightHip,
}

impl PoseLandmark {
    /// Index in a 33-point body pose model.
    pub fn body_index(&self) -> usize {
        match self {
            PoseLandmark::Nose => 0,
            PoseLandmark::LeftShoulder => 11,
            PoseLandmark::RightShoulder => 12,
            PoseLandmark::LeftHip => 23,
            PoseLandmark::RightHip => 24,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PoseLandmark::Nose => "nose",
            PoseLandmark::LeftShoulder => "left_shoulder",
            PoseLandmark::RightShoulder => "right_shoulder",
            PoseLandmark::LeftHip => "left_hip",
            PoseLandmark::RightHip => "right_hip",
        }
    }
}

/// Body pose landmarks. Any point the detector could not place is `None`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PoseLandmarks {
    pub nose: Option<Point2D>,
    pub left_shoulder: Option<Point2D>,
    pub right_shoulder: Option<Point2D>,
    pub left_hip: Option<Point2D>,
    pub right_hip: Option<Point2D>,
}

impl PoseLandmarks {
    /// Pick the named landmarks out of a full body-pose point list.
    pub fn from_body_points(points: &[Point2D]) -> Self {
        let at = |lm: PoseLandmark| points.get(lm.body_index()).copied();
        Self {
            nose: at(PoseLandmark::Nose),
            left_shoulder: at(PoseLandmark::LeftShoulder),
            right_shoulder: at(PoseLandmark::RightShoulder),
            left_hip: at(PoseLandmark::LeftHip),
            right_hip: at(PoseLandmark::RightHip),
        }
    }

    pub fn get(&self, landmark: PoseLandmark) -> Option<Point2D> {
        match landmark {
            PoseLandmark::Nose => self.nose,
            PoseLandmark::LeftShoulder => self.left_shoulder,
            PoseLandmark::RightShoulder => self.right_shoulder,
            PoseLandmark::LeftHip => self.left_hip,
            PoseLandmark::RightHip => self.right_hip,
        }
    }

    fn map(&self, f: impl Fn(Point2D) -> Point2D) -> Self {
        Self {
            nose: self.nose.map(&f),
            left_shoulder: self.left_shoulder.map(&f),
            right_shoulder: self.right_shoulder.map(&f),
            left_hip: self.left_hip.map(&f),
            right_hip: self.right_hip.map(&f),
        }
    }
}

/// Face landmarks used for blink and gaze estimation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FaceLandmarks {
    /// Six-point contour of the left eye (see [`EYE_CONTOUR_POINTS`]).
    pub left_eye: Vec<Point2D>,
    /// Six-point contour of the right eye.
    pub right_eye: Vec<Point2D>,
    /// Top of the face bounding line.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forehead: Option<Point2D>,
    /// Bottom of the face bounding line.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chin: Option<Point2D>,
    /// Iris centre, when the detector refines irises.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left_iris: Option<Point2D>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub right_iris: Option<Point2D>,
}

impl FaceLandmarks {
    /// Build from a dense face mesh (468 points, 478 with refined irises).
    ///
    /// Returns `None` when the mesh is too small to contain both eye contours.
    pub fn from_mesh(mesh: &[Point2D]) -> Option<Self> {
        let pick = |indices: &[usize]| -> Option<Vec<Point2D>> {
            indices.iter().map(|&i| mesh.get(i).copied()).collect()
        };
        Some(Self {
            left_eye: pick(&LEFT_EYE_MESH_INDICES)?,
            right_eye: pick(&RIGHT_EYE_MESH_INDICES)?,
            forehead: mesh.get(FOREHEAD_MESH_INDEX).copied(),
            chin: mesh.get(CHIN_MESH_INDEX).copied(),
            left_iris: mesh.get(LEFT_IRIS_MESH_INDEX).copied(),
            right_iris: mesh.get(RIGHT_IRIS_MESH_INDEX).copied(),
        })
    }

    pub fn eye(&self, eye: Eye) -> &[Point2D] {
        match eye {
            Eye::Left => &self.left_eye,
            Eye::Right => &self.right_eye,
        }
    }

    pub fn iris(&self, eye: Eye) -> Option<Point2D> {
        match eye {
            Eye::Left => self.left_iris,
            Eye::Right => self.right_iris,
        }
    }

    fn map(&self, f: impl Fn(Point2D) -> Point2D) -> Self {
        Self {
            left_eye: self.left_eye.iter().copied().map(&f).collect(),
            right_eye: self.right_eye.iter().copied().map(&f).collect(),
            forehead: self.forehead.map(&f),
            chin: self.chin.map(&f),
            left_iris: self.left_iris.map(&f),
            right_iris: self.right_iris.map(&f),
        }
    }
}

/// All landmark detections for one decoded frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandmarkFrame {
    /// Seconds since the start of the video.
    #[serde(rename = "t")]
    pub timestamp_secs: f64,

    /// Frame size in pixels.
    pub width: u32,
    pub height: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pose: Option<PoseLandmarks>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub face: Option<FaceLandmarks>,
}

impl LandmarkFrame {
    /// A frame with no detections.
    pub fn empty(timestamp_secs: f64, width: u32, height: u32) -> Self {
        Self {
            timestamp_secs,
            width,
            height,
            pose: None,
            face: None,
        }
    }

    pub fn with_pose(mut self, pose: PoseLandmarks) -> Self {
        self.pose = Some(pose);
        self
    }

    pub fn with_face(mut self, face: FaceLandmarks) -> Self {
        self.face = Some(face);
        self
    }

    /// Scale a normalized point to this frame's pixel space.
    pub fn to_pixels(&self, p: Point2D) -> Point2D {
        p.scale(self.width as f64, self.height as f64)
    }

    /// Pose landmarks in pixel space.
    pub fn pose_pixels(&self) -> Option<PoseLandmarks> {
        self.pose.as_ref().map(|pose| pose.map(|p| self.to_pixels(p)))
    }

    /// Face landmarks in pixel space.
    pub fn face_pixels(&self) -> Option<FaceLandmarks> {
        self.face.as_ref().map(|face| face.map(|p| self.to_pixels(p)))
    }
}
