//! Gaze spread as an inverse attention proxy.

use poise_model::point::Point2D;

/// Accumulates smoothed gaze points for one segment.
#[derive(Debug, Clone, Default)]
pub struct GazeVarianceTracker {
    points: Vec<Point2D>,
}

impl GazeVarianceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, point: Point2D) {
        self.points.push(point);
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Mean of all accumulated points.
    pub fn centroid(&self) -> Option<Point2D> {
        if self.points.is_empty() {
            return None;
        }
        let n = self.points.len() as f64;
        let sum_x: f64 = self.points.iter().map(|p| p.x).sum();
        let sum_y: f64 = self.points.iter().map(|p| p.y).sum();
        Some(Point2D::new(sum_x / n, sum_y / n))
    }

    /// Mean squared distance from the centroid. 0 for fewer than 2 samples.
    pub fn variance(&self) -> f64 {
        if self.points.len() < 2 {
            return 0.0;
        }
        let Some(centroid) = self.centroid() else {
            return 0.0;
        };
        let sum: f64 = self.points.iter().map(|p| p.distance_sq(&centroid)).sum();
        sum / self.points.len() as f64
    }
}
