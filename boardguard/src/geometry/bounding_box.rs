use serde::Serialize;

use super::primitives::Point;

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self {
            min_x: f64::MAX,
            min_y: f64::MAX,
            max_x: f64::MIN,
            max_y: f64::MIN,
        }
    }
}

impl BoundingBox {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Only a box equal to `BoundingBox::default()` is empty; a zero-area box
    /// around a single point is not.
    pub fn is_empty(&self) -> bool {
        self.eq(&BoundingBox::default())
    }

    pub fn from_points(points: &[Point]) -> Self {
        let mut bbox = Self::default();
        for p in points {
            bbox.include(p);
        }
        bbox
    }

    pub fn include(&mut self, p: &Point) {
        self.min_x = self.min_x.min(p.x());
        self.min_y = self.min_y.min(p.y());
        self.max_x = self.max_x.max(p.x());
        self.max_y = self.max_y.max(p.y());
    }

    pub fn expand(&mut self, other: &BoundingBox) {
        if other.is_empty() {
            return;
        }
        self.min_x = self.min_x.min(other.min_x);
        self.min_y = self.min_y.min(other.min_y);
        self.max_x = self.max_x.max(other.max_x);
        self.max_y = self.max_y.max(other.max_y);
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Grow by `fraction` of the width on the left and right and by
    /// `fraction` of the height on the top and bottom.
    pub fn padded(&self, fraction: f64) -> Self {
        if self.is_empty() {
            return *self;
        }
        let dx = self.width() * fraction;
        let dy = self.height() * fraction;
        Self {
            min_x: self.min_x - dx,
            min_y: self.min_y - dy,
            max_x: self.max_x + dx,
            max_y: self.max_y + dy,
        }
    }
}
