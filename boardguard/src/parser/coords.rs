//! Coordinate list decoding.
//!
//! Spatial fields arrive in one of two shapes:
//! 1. flat: `[x1, y1, x2, y2, ...]` (even length)
//! 2. pairs: `[[x1, y1], [x2, y2], ...]` (also `{"x": .., "y": ..}` objects)
//!
//! Both decode to `Vec<Point>`. Decoding never panics and never drops data:
//! a field that cannot become a valid primitive is kept as a
//! [`CoordinateField`] variant that the validator reports on.

use serde::{Serialize, Serializer};
use serde_json::Value;
use thiserror::Error;

use crate::geometry::{GeometryError, Point, Polygon, Polyline};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordinateError {
    #[error("expected a coordinate array, found {0}")]
    NotAnArray(&'static str),
    #[error("flat coordinate list must have even length, got {0}")]
    OddLength(usize),
    #[error("coordinate entry {0} is not a number")]
    NonNumeric(usize),
    #[error("coordinate pair {0} must have exactly two numeric entries")]
    BadPair(usize),
    #[error("unrecognized coordinate format")]
    Unrecognized,
    #[error(transparent)]
    Geometry(#[from] GeometryError),
}

/// A spatial field after lenient decoding.
#[derive(Debug, Clone, PartialEq)]
pub enum CoordinateField<T> {
    /// Decoded into a primitive satisfying all of its invariants.
    Valid(T),
    /// Every point is finite but there are fewer than the primitive needs.
    TooFew { points: Vec<Point>, required: usize },
    /// The raw value could not be read as a list of finite points.
    Malformed { reason: String },
}

impl<T> CoordinateField<T> {
    pub fn valid(&self) -> Option<&T> {
        match self {
            CoordinateField::Valid(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, CoordinateField::Valid(_))
    }
}

impl<T: Serialize> Serialize for CoordinateField<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CoordinateField::Valid(v) => v.serialize(serializer),
            CoordinateField::TooFew { points, .. } => points.serialize(serializer),
            CoordinateField::Malformed { .. } => serializer.serialize_none(),
        }
    }
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Decode a single point from `[x, y]` or `{"x": x, "y": y}`.
pub fn parse_point(raw: &Value) -> Result<Point, CoordinateError> {
    pair_to_point(raw, 0)
}

fn pair_to_point(raw: &Value, index: usize) -> Result<Point, CoordinateError> {
    let (x, y) = match raw {
        Value::Array(pair) if pair.len() == 2 => (pair[0].as_f64(), pair[1].as_f64()),
        Value::Object(obj) => (
            obj.get("x").and_then(Value::as_f64),
            obj.get("y").and_then(Value::as_f64),
        ),
        _ => return Err(CoordinateError::BadPair(index)),
    };
    match (x, y) {
        (Some(x), Some(y)) => Ok(Point::new(x, y)?),
        _ => Err(CoordinateError::BadPair(index)),
    }
}

/// Decode a coordinate list in either the flat or the paired shape.
///
/// An empty array decodes to zero points; cardinality is the caller's
/// concern.
pub fn parse_points(raw: &Value) -> Result<Vec<Point>, CoordinateError> {
    let items = raw.as_array().ok_or(CoordinateError::NotAnArray(kind_name(raw)))?;
    if items.is_empty() {
        return Ok(Vec::new());
    }

    if items.iter().all(Value::is_number) {
        if items.len() % 2 != 0 {
            return Err(CoordinateError::OddLength(items.len()));
        }
        return items
            .chunks(2)
            .map(|c| {
                // all entries are numbers, so as_f64 cannot fail here
                let x = c[0].as_f64().unwrap_or(f64::NAN);
                let y = c[1].as_f64().unwrap_or(f64::NAN);
                Point::new(x, y).map_err(CoordinateError::from)
            })
            .collect();
    }

    if items.iter().all(|v| v.is_array() || v.is_object()) {
        return items
            .iter()
            .enumerate()
            .map(|(i, v)| pair_to_point(v, i))
            .collect();
    }

    match items.iter().position(|v| !v.is_number()) {
        Some(i) if items.iter().any(Value::is_number) => Err(CoordinateError::NonNumeric(i)),
        _ => Err(CoordinateError::Unrecognized),
    }
}

/// Pull the coordinate list out of a spatial field, which may be the list
/// itself or an object holding it under `coordinates`.
pub fn coordinates_of(raw: &Value) -> Option<&Value> {
    match raw {
        Value::Object(obj) => obj.get("coordinates").filter(|v| !v.is_null()),
        Value::Null => None,
        other => Some(other),
    }
}

pub fn polygon_field(raw: &Value) -> CoordinateField<Polygon> {
    match parse_points(raw) {
        Ok(points) if points.len() < 3 => CoordinateField::TooFew { points, required: 3 },
        Ok(points) => match Polygon::new(points.clone()) {
            Ok(poly) => CoordinateField::Valid(poly),
            // closing duplicate left fewer than three distinct vertices
            Err(_) => CoordinateField::TooFew { points, required: 3 },
        },
        Err(e) => CoordinateField::Malformed { reason: e.to_string() },
    }
}

pub fn polyline_field(raw: &Value) -> CoordinateField<Polyline> {
    match parse_points(raw) {
        Ok(points) if points.len() < 2 => CoordinateField::TooFew { points, required: 2 },
        Ok(points) => match Polyline::new(points) {
            Ok(line) => CoordinateField::Valid(line),
            Err(e) => CoordinateField::Malformed { reason: e.to_string() },
        },
        Err(e) => CoordinateField::Malformed { reason: e.to_string() },
    }
}
