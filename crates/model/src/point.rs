//! Planar point type used for landmarks, pupils, and gaze estimates.

use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

/// A 2D point. Normalized or pixel-space depending on context.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub const ORIGIN: Point2D = Point2D { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance_to(&self, other: &Point2D) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    /// Squared Euclidean distance to another point.
    pub fn distance_sq(&self, other: &Point2D) -> f64 {
        (self.x - other.x).powi(2) + (self.y - other.y).powi(2)
    }

    /// Midpoint between two points.
    pub fn midpoint(a: &Point2D, b: &Point2D) -> Point2D {
        Point2D {
            x: (a.x + b.x) / 2.0,
            y: (a.y + b.y) / 2.0,
        }
    }

    /// Dot product, treating both points as vectors from the origin.
    pub fn dot(&self, other: &Point2D) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// Vector length.
    pub fn norm(&self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Scale each axis independently.
    pub fn scale(&self, sx: f64, sy: f64) -> Point2D {
        Point2D {
            x: self.x * sx,
            y: self.y * sy,
        }
    }
}

impl Add for Point2D {
    type Output = Point2D;

    fn add(self, rhs: Point2D) -> Point2D {
        Point2D::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point2D {
    type Output = Point2D;

    fn sub(self, rhs: Point2D) -> Point2D {
        Point2D::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// Axis-aligned bounding box of a point set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Point2D,
    pub max: Point2D,
}

impl Bounds {
    /// Bounding box of `points`, or `None` when empty.
    pub fn of(points: &[Point2D]) -> Option<Bounds> {
        let first = points.first()?;
        let mut bounds = Bounds {
            min: *first,
            max: *first,
        };
        for p in &points[1..] {
            bounds.min.x = bounds.min.x.min(p.x);
            bounds.min.y = bounds.min.y.min(p.y);
            bounds.max.x = bounds.max.x.max(p.x);
            bounds.max.y = bounds.max.y.max(p.y);
        }
        Some(bounds)
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    /// Convert an absolute point to coordinates relative to the top-left corner.
    pub fn to_local(&self, p: Point2D) -> Point2D {
        p - self.min
    }
}
