//! Point, polyline, polygon and circle value types.

use std::ops::Neg;

use serde::Serialize;

use super::bounding_box::BoundingBox;
use super::intersect;
use super::{GeometryError, EPSILON};

/// A 2D point in canonical millimeters. Both coordinates are always finite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    x: f64,
    y: f64,
}

impl Point {
    /// Create a point, rejecting NaN and infinite coordinates.
    pub fn new(x: f64, y: f64) -> Result<Self, GeometryError> {
        if !x.is_finite() || !y.is_finite() {
            return Err(GeometryError::NonFiniteCoordinate { x, y });
        }
        Ok(Self { x, y })
    }

    pub const fn origin() -> Self {
        Self { x: 0.0, y: 0.0 }
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    /// Euclidean distance to another point.
    pub fn distance_to(&self, other: &Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Counter-clockwise rotation by `angle_deg` degrees about `pivot`.
    /// Fails when the result overflows or the angle is not finite.
    pub fn rotate_about(&self, angle_deg: f64, pivot: &Point) -> Result<Point, GeometryError> {
        let (sin_a, cos_a) = angle_deg.to_radians().sin_cos();
        let px = self.x - pivot.x;
        let py = self.y - pivot.y;
        Point::new(
            px * cos_a - py * sin_a + pivot.x,
            px * sin_a + py * cos_a + pivot.y,
        )
    }

    /// Counter-clockwise rotation about the local origin.
    pub fn rotate(&self, angle_deg: f64) -> Result<Point, GeometryError> {
        self.rotate_about(angle_deg, &Point::origin())
    }

    /// Negate the X coordinate (left/right flip about the local Y axis).
    pub fn mirror_x(&self) -> Point {
        Self { x: -self.x, y: self.y }
    }

    pub fn scale(&self, factor: f64) -> Result<Point, GeometryError> {
        Point::new(self.x * factor, self.y * factor)
    }

    /// Shift by `offset`. Fails on overflow.
    pub fn translate(&self, offset: &Point) -> Result<Point, GeometryError> {
        Point::new(self.x + offset.x, self.y + offset.y)
    }

    /// True when both coordinates agree within [`EPSILON`].
    pub fn approx_eq(&self, other: &Point) -> bool {
        (self.x - other.x).abs() <= EPSILON && (self.y - other.y).abs() <= EPSILON
    }
}

impl Neg for Point {
    type Output = Point;

    fn neg(self) -> Point {
        Self { x: -self.x, y: -self.y }
    }
}

/// An open path of at least two points (a trace centerline).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Polyline {
    points: Vec<Point>,
}

impl Polyline {
    pub fn new(points: Vec<Point>) -> Result<Self, GeometryError> {
        if points.len() < 2 {
            return Err(GeometryError::TooFewPoints {
                kind: "polyline",
                required: 2,
                actual: points.len(),
            });
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn first(&self) -> Point {
        self.points[0]
    }

    pub fn last(&self) -> Point {
        self.points[self.points.len() - 1]
    }

    /// Consecutive point pairs.
    pub fn segments(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        self.points.windows(2).map(|w| (w[0], w[1]))
    }

    /// Total path length.
    pub fn length(&self) -> f64 {
        self.segments().map(|(a, b)| a.distance_to(&b)).sum()
    }

    /// Shortest distance from `point` to any segment of the path.
    pub fn distance_to_point(&self, point: &Point) -> f64 {
        self.segments()
            .map(|(a, b)| intersect::point_segment_distance(point, &a, &b))
            .fold(f64::INFINITY, f64::min)
    }

    pub fn bbox(&self) -> BoundingBox {
        BoundingBox::from_points(&self.points)
    }

    /// Apply `f` to every point, failing if any point fails.
    pub fn try_map(
        &self,
        f: impl Fn(&Point) -> Result<Point, GeometryError>,
    ) -> Result<Polyline, GeometryError> {
        Ok(Polyline {
            points: self.points.iter().map(f).collect::<Result<_, _>>()?,
        })
    }
}

/// A closed polygon with at least three vertices.
///
/// Input need not repeat the first point at the end. If it does (within
/// [`EPSILON`]), the duplicate closing point is dropped on construction so
/// `vertices()` always holds each corner exactly once and `edges()` yields
/// the implicit closing edge.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Polygon {
    vertices: Vec<Point>,
}

impl Polygon {
    pub fn new(mut points: Vec<Point>) -> Result<Self, GeometryError> {
        let supplied = points.len();
        if points.len() > 1 && points[0].approx_eq(&points[points.len() - 1]) {
            points.pop();
        }
        if points.len() < 3 {
            return Err(GeometryError::TooFewPoints {
                kind: "polygon",
                required: 3,
                actual: supplied,
            });
        }
        Ok(Self { vertices: points })
    }

    /// Axis-aligned rectangle centred on the origin.
    pub fn rectangle(width: f64, height: f64) -> Result<Self, GeometryError> {
        let hw = width / 2.0;
        let hh = height / 2.0;
        Self::new(vec![
            Point::new(-hw, -hh)?,
            Point::new(hw, -hh)?,
            Point::new(hw, hh)?,
            Point::new(-hw, hh)?,
        ])
    }

    /// Distinct vertices in order, without a repeated closing point.
    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    /// Vertices followed by the first vertex again.
    pub fn closed_points(&self) -> Vec<Point> {
        let mut pts = self.vertices.clone();
        pts.push(self.vertices[0]);
        pts
    }

    /// All edges including the closing edge back to the first vertex.
    pub fn edges(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        let n = self.vertices.len();
        (0..n).map(move |i| (self.vertices[i], self.vertices[(i + 1) % n]))
    }

    pub fn bbox(&self) -> BoundingBox {
        BoundingBox::from_points(&self.vertices)
    }

    /// Crossing-number containment test.
    ///
    /// Uses the half-open rule `(y1 > y) != (y2 > y)`: a point lying exactly on
    /// a bottom or left edge of an axis-aligned rectangle is reported inside,
    /// on a top or right edge outside.
    pub fn contains_point(&self, point: &Point) -> bool {
        let (x, y) = (point.x(), point.y());
        let mut inside = false;
        for (a, b) in self.edges() {
            if (a.y() > y) != (b.y() > y) {
                let x_cross = (b.x() - a.x()) * (y - a.y()) / (b.y() - a.y()) + a.x();
                if x < x_cross {
                    inside = !inside;
                }
            }
        }
        inside
    }

    pub fn is_self_intersecting(&self) -> bool {
        intersect::is_self_intersecting(self)
    }

    /// Shoelace area (always non-negative).
    pub fn area(&self) -> f64 {
        let twice: f64 = self
            .edges()
            .map(|(a, b)| a.x() * b.y() - b.x() * a.y())
            .sum();
        twice.abs() / 2.0
    }

    pub fn try_map(
        &self,
        f: impl Fn(&Point) -> Result<Point, GeometryError>,
    ) -> Result<Polygon, GeometryError> {
        Ok(Polygon {
            vertices: self.vertices.iter().map(f).collect::<Result<_, _>>()?,
        })
    }
}

/// Circle used for round keepouts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Circle {
    center: Point,
    radius: f64,
}

impl Circle {
    pub fn new(center: Point, radius: f64) -> Result<Self, GeometryError> {
        if !radius.is_finite() || radius <= 0.0 {
            return Err(GeometryError::InvalidRadius(radius));
        }
        Ok(Self { center, radius })
    }

    pub fn center(&self) -> Point {
        self.center
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Same radius, center moved by `f`.
    pub fn try_map_center(
        &self,
        f: impl Fn(&Point) -> Result<Point, GeometryError>,
    ) -> Result<Circle, GeometryError> {
        Ok(Circle {
            center: f(&self.center)?,
            radius: self.radius,
        })
    }

    /// Inside or on the circumference.
    pub fn contains_point(&self, point: &Point) -> bool {
        self.center.distance_to(point) <= self.radius
    }

    pub fn bbox(&self) -> BoundingBox {
        BoundingBox::new(
            self.center.x() - self.radius,
            self.center.y() - self.radius,
            self.center.x() + self.radius,
            self.center.y() + self.radius,
        )
    }
}
