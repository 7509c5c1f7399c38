//! Bounded-window smoothing for noisy point estimates.
//!
//! Pupil positions use a linearly weighted average that favours recent
//! samples; the combined gaze point uses a plain mean. The two policies have
//! different lag, so each signal keeps its own policy.

use std::collections::VecDeque;

use poise_model::point::Point2D;

/// Averaging policy over the history window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmoothingPolicy {
    /// Weights fall linearly from `n` (newest) to 1 (oldest), normalized.
    LinearWeighted,

    /// Unweighted arithmetic mean.
    Mean,
}

/// FIFO history of points with a fixed capacity.
#[derive(Debug, Clone)]
pub struct TemporalSmoother {
    policy: SmoothingPolicy,
    window: usize,
    history: VecDeque<Point2D>,
}

impl TemporalSmoother {
    /// Create a smoother. A window of 0 behaves as 1.
    pub fn new(policy: SmoothingPolicy, window: usize) -> Self {
        let window = window.max(1);
        Self {
            policy,
            window,
            history: VecDeque::with_capacity(window),
        }
    }

    /// Linearly weighted smoother (pupil positions).
    pub fn weighted(window: usize) -> Self {
        Self::new(SmoothingPolicy::LinearWeighted, window)
    }

    /// Plain-mean smoother (gaze points).
    pub fn mean(window: usize) -> Self {
        Self::new(SmoothingPolicy::Mean, window)
    }

    /// Append a point, evict the oldest beyond capacity, and return the
    /// smoothed value over what remains.
    pub fn push_and_smooth(&mut self, point: Point2D) -> Point2D {
        self.history.push_back(point);
        while self.history.len() > self.window {
            self.history.pop_front();
        }

        match self.policy {
            SmoothingPolicy::LinearWeighted => self.weighted_average(),
            SmoothingPolicy::Mean => self.mean_point(),
        }
    }

    /// Like [`push_and_smooth`](Self::push_and_smooth), but a missing
    /// detection leaves the history untouched and emits nothing.
    pub fn push_optional(&mut self, point: Option<Point2D>) -> Option<Point2D> {
        point.map(|p| self.push_and_smooth(p))
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn window_size(&self) -> usize {
        self.window
    }

    pub fn policy(&self) -> SmoothingPolicy {
        self.policy
    }

    fn weighted_average(&self) -> Point2D {
        // Oldest sample sits at index 0 and gets weight 1.
        let mut sum_x = 0.0;
        let mut sum_y = 0.0;
        let mut total_weight = 0.0;
        for (i, p) in self.history.iter().enumerate() {
            let w = (i + 1) as f64;
            sum_x += p.x * w;
            sum_y += p.y * w;
            total_weight += w;
        }
        Point2D::new(sum_x / total_weight, sum_y / total_weight)
    }

    fn mean_point(&self) -> Point2D {
        let n = self.history.len() as f64;
        let sum_x: f64 = self.history.iter().map(|p| p.x).sum();
        let sum_y: f64 = self.history.iter().map(|p| p.y).sum();
        Point2D::new(sum_x / n, sum_y / n)
    }
}
