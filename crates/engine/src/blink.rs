//! Blink counting over a noisy eye-openness signal.
//!
//! Two formal states, open and closed. A frame below the EAR threshold bumps
//! a consecutive-closed counter; the state only flips to closed (and a blink
//! is counted) once the counter reaches the frame threshold while the state
//! is still open. Any frame at or above the threshold reopens the eye and
//! clears the counter. Counting is edge-triggered: a sustained closure is one
//! blink.

use serde::{Deserialize, Serialize};

/// Snapshot of the detector's state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BlinkState {
    pub is_eye_closed: bool,
    pub consecutive_closed_frames: u32,
    pub blink_count: u32,
}

/// Debounced blink detector. One instance per segment.
#[derive(Debug, Clone)]
pub struct BlinkDetector {
    ear_threshold: f64,
    consecutive_frames_threshold: u32,
    state: BlinkState,
}

impl BlinkDetector {
    pub fn new(ear_threshold: f64, consecutive_frames_threshold: u32) -> Self {
        Self {
            ear_threshold,
            consecutive_frames_threshold: consecutive_frames_threshold.max(1),
            state: BlinkState::default(),
        }
    }

    /// Feed one frame's eye aspect ratio. Returns `true` on the frame a
    /// blink is counted.
    pub fn update(&mut self, eye_openness_ratio: f64) -> bool {
        if eye_openness_ratio < self.ear_threshold {
            self.state.consecutive_closed_frames += 1;
            if self.state.consecutive_closed_frames >= self.consecutive_frames_threshold
                && !self.state.is_eye_closed
            {
                self.state.is_eye_closed = true;
                self.state.blink_count += 1;
                return true;
            }
        } else {
            self.state.consecutive_closed_frames = 0;
            self.state.is_eye_closed = false;
        }
        false
    }

    pub fn state(&self) -> BlinkState {
        self.state
    }

    pub fn blink_count(&self) -> u32 {
        self.state.blink_count
    }
}
