//! Coordinate Transforms
//!
//! Two coordinate systems are in play:
//!
//! - **ECAD space**: origin bottom-left, Y up (the board document)
//! - **draw space**: origin top-left, Y down (what a renderer consumes)
//!
//! Flipping between them is `y' = board_height - y`, which is its own
//! inverse. Component-local geometry is placed into board space by mirroring
//! (BACK side only), rotating counter-clockwise about the local origin and
//! finally translating to the placement position. The order is fixed.

use crate::geometry::{BoundingBox, GeometryError, Point, Polygon, Polyline};
use crate::parser::schema::{Board, Placement, Side};

/// ECAD → draw space. Fails when `board_height` is not finite or the
/// flipped coordinate overflows.
pub fn to_draw_space(point: &Point, board_height: f64) -> Result<Point, GeometryError> {
    Point::new(point.x(), board_height - point.y())
}

/// Draw → ECAD space. Same formula as [`to_draw_space`].
pub fn to_ecad_space(point: &Point, board_height: f64) -> Result<Point, GeometryError> {
    Point::new(point.x(), board_height - point.y())
}

/// Height used for the Y flip: maximum Y of the boundary bounding box.
pub fn board_height(board: &Board) -> f64 {
    board.board_height()
}

/// Place a component-local point into board space.
/// Placements far enough out to overflow `f64` are rejected.
pub fn place_point(local: &Point, placement: &Placement) -> Result<Point, GeometryError> {
    let mirrored = match placement.side {
        Side::Back => local.mirror_x(),
        Side::Front => *local,
    };
    mirrored.rotate(placement.rotation)?.translate(&placement.position)
}

pub fn place_polygon(local: &Polygon, placement: &Placement) -> Result<Polygon, GeometryError> {
    local.try_map(|p| place_point(p, placement))
}

pub fn polygon_to_draw_space(polygon: &Polygon, board_height: f64) -> Result<Polygon, GeometryError> {
    polygon.try_map(|p| to_draw_space(p, board_height))
}

pub fn polyline_to_draw_space(line: &Polyline, board_height: f64) -> Result<Polyline, GeometryError> {
    line.try_map(|p| to_draw_space(p, board_height))
}

/// `(x, y, width, height)` of `bbox` grown by `padding` of its size on every
/// side. An empty box yields all zeros.
pub fn view_box(bbox: &BoundingBox, padding: f64) -> (f64, f64, f64, f64) {
    if bbox.is_empty() {
        return (0.0, 0.0, 0.0, 0.0);
    }
    let padded = bbox.padded(padding);
    (padded.min_x, padded.min_y, padded.width(), padded.height())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::EPSILON;

    fn pt(x: f64, y: f64) -> Point {
        Point::new(x, y).unwrap()
    }

    fn placement(x: f64, y: f64, rotation: f64, side: Side) -> Placement {
        Placement {
            position: pt(x, y),
            rotation,
            side,
        }
    }

    #[test]
    fn test_draw_space_flip() {
        let p = to_draw_space(&pt(10.0, 20.0), 80.0).unwrap();
        assert_eq!(p, pt(10.0, 60.0));
        assert_eq!(to_ecad_space(&p, 80.0).unwrap(), pt(10.0, 20.0));
    }

    #[test]
    fn test_non_finite_height_is_rejected() {
        assert!(matches!(
            to_draw_space(&pt(1.0, 2.0), f64::NAN),
            Err(GeometryError::NonFiniteCoordinate { .. })
        ));
        assert!(to_ecad_space(&pt(1.0, 2.0), f64::INFINITY).is_err());
        assert!(to_draw_space(&pt(0.0, -1.5e308), 1.5e308).is_err());
    }

    #[test]
    fn test_overflowing_placement_is_rejected() {
        let far = placement(1.5e308, 10.0, 0.0, Side::Front);
        assert!(place_point(&pt(1.5e308, 0.0), &far).is_err());
        assert!(place_point(&pt(0.0, 0.0), &far).is_ok());
        let wide = Polygon::rectangle(f64::MAX, 1.0).unwrap();
        assert!(place_polygon(&wide, &placement(f64::MAX, 0.0, 0.0, Side::Front)).is_err());
    }

    #[test]
    fn test_front_rotation_then_translation() {
        let p = place_point(&pt(1.0, 0.0), &placement(10.0, 10.0, 90.0, Side::Front)).unwrap();
        assert!(p.approx_eq(&pt(10.0, 11.0)));
    }

    #[test]
    fn test_back_mirrors_before_rotating() {
        // mirror (1,0) -> (-1,0), rotate 90 CCW -> (0,-1), translate -> (10,9)
        let p = place_point(&pt(1.0, 0.0), &placement(10.0, 10.0, 90.0, Side::Back)).unwrap();
        assert!(p.approx_eq(&pt(10.0, 9.0)), "got {:?}", p);
        // rotating first would give (0,1) -> mirror (0,1) -> (10,11)
        assert!(!p.approx_eq(&pt(10.0, 11.0)));
    }

    #[test]
    fn test_rotation_is_about_local_origin() {
        let p = place_point(&pt(0.0, 0.0), &placement(5.0, 7.0, 123.0, Side::Front)).unwrap();
        assert!(p.approx_eq(&pt(5.0, 7.0)));
    }

    #[test]
    fn test_place_polygon() {
        let rect = Polygon::rectangle(2.0, 1.0).unwrap();
        let placed = place_polygon(&rect, &placement(10.0, 10.0, 90.0, Side::Front)).unwrap();
        let bbox = placed.bbox();
        assert!((bbox.width() - 1.0).abs() < EPSILON);
        assert!((bbox.height() - 2.0).abs() < EPSILON);
        assert!((bbox.min_x - 9.5).abs() < EPSILON);
    }

    #[test]
    fn test_view_box() {
        let bbox = BoundingBox::new(0.0, 0.0, 100.0, 50.0);
        assert_eq!(view_box(&bbox, 0.1), (-10.0, -5.0, 120.0, 60.0));
        assert_eq!(view_box(&BoundingBox::default(), 0.1), (0.0, 0.0, 0.0, 0.0));
    }
}
