//! Geometry Primitives
//!
//! Value types used by every other module: points, open paths, closed
//! polygons, circles and axis-aligned bounding boxes. All coordinates are in
//! canonical millimeters once the unit normalizer has run.
//!
//! Construction is checked: a point never holds NaN or an infinity, a
//! polyline always has at least two points and a polygon at least three
//! vertices. Code that needs to represent data which *failed* those checks
//! (so the validator can report it) uses [`crate::parser::CoordinateField`]
//! instead of weakening these types.

pub mod bounding_box;
pub mod intersect;
pub mod primitives;

pub use bounding_box::BoundingBox;
pub use intersect::{is_self_intersecting, orientation, point_segment_distance, segments_intersect};
pub use primitives::{Circle, Point, Polygon, Polyline};

use thiserror::Error;

/// Absolute tolerance, in canonical linear units, used for closure tests and
/// every floating-point comparison in the transform layer.
pub const EPSILON: f64 = 1e-6;

/// Errors raised when a primitive's local invariants are violated.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    #[error("coordinate must be finite, got ({x}, {y})")]
    NonFiniteCoordinate { x: f64, y: f64 },

    #[error("{kind} requires at least {required} points, got {actual}")]
    TooFewPoints {
        kind: &'static str,
        required: usize,
        actual: usize,
    },

    #[error("radius must be positive and finite, got {0}")]
    InvalidRadius(f64),
}

/// Compare two scalars within [`EPSILON`].
pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= EPSILON
}
