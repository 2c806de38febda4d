//! Segment intersection and polygon self-intersection.
//!
//! The self-intersection test is the quadratic edge-pair sweep: every pair
//! of non-adjacent edges is tested with the orientation predicate. Boards
//! with tens of thousands of primitives still have outlines of a few hundred
//! vertices at most, so O(E²) on the outline is not a bottleneck.

use super::primitives::{Point, Polygon};

/// Twice the signed area of triangle `p, q, r`.
///
/// Positive when `r` lies to the left of `p → q` (counter-clockwise turn),
/// negative to the right, zero when collinear.
pub fn orientation(p: &Point, q: &Point, r: &Point) -> f64 {
    (q.x() - p.x()) * (r.y() - p.y()) - (q.y() - p.y()) * (r.x() - p.x())
}

/// `q` lies within the bounding rectangle of segment `p r`. Only meaningful
/// once `p, q, r` are known to be collinear.
fn on_segment(p: &Point, q: &Point, r: &Point) -> bool {
    q.x() >= p.x().min(r.x())
        && q.x() <= p.x().max(r.x())
        && q.y() >= p.y().min(r.y())
        && q.y() <= p.y().max(r.y())
}

/// Whether closed segments `a1 a2` and `b1 b2` share at least one point.
///
/// Proper crossings, T-junctions, shared endpoints and collinear overlap all
/// count as intersecting.
pub fn segments_intersect(a1: &Point, a2: &Point, b1: &Point, b2: &Point) -> bool {
    let o1 = orientation(a1, a2, b1);
    let o2 = orientation(a1, a2, b2);
    let o3 = orientation(b1, b2, a1);
    let o4 = orientation(b1, b2, a2);

    if ((o1 > 0.0 && o2 < 0.0) || (o1 < 0.0 && o2 > 0.0))
        && ((o3 > 0.0 && o4 < 0.0) || (o3 < 0.0 && o4 > 0.0))
    {
        return true;
    }

    (o1 == 0.0 && on_segment(a1, b1, a2))
        || (o2 == 0.0 && on_segment(a1, b2, a2))
        || (o3 == 0.0 && on_segment(b1, a1, b2))
        || (o4 == 0.0 && on_segment(b1, a2, b2))
}

/// Shortest distance from `p` to the closed segment `a b`.
pub fn point_segment_distance(p: &Point, a: &Point, b: &Point) -> f64 {
    let dx = b.x() - a.x();
    let dy = b.y() - a.y();
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0.0 {
        return p.distance_to(a);
    }
    let t = (((p.x() - a.x()) * dx + (p.y() - a.y()) * dy) / len_sq).clamp(0.0, 1.0);
    let cx = a.x() + t * dx;
    let cy = a.y() + t * dy;
    (p.x() - cx).hypot(p.y() - cy)
}

/// True when two non-adjacent edges of the polygon touch or cross.
///
/// Zero-length edges (repeated consecutive vertices) are removed first so a
/// duplicated vertex does not make its neighbours look non-adjacent.
pub fn is_self_intersecting(polygon: &Polygon) -> bool {
    let mut verts: Vec<Point> = Vec::with_capacity(polygon.vertices().len());
    for v in polygon.vertices() {
        if verts.last().map_or(true, |last: &Point| !last.approx_eq(v)) {
            verts.push(*v);
        }
    }
    while verts.len() > 1 && verts[0].approx_eq(&verts[verts.len() - 1]) {
        verts.pop();
    }

    let n = verts.len();
    if n < 4 {
        // a triangle has no non-adjacent edge pairs
        return false;
    }

    for i in 0..n {
        let (a1, a2) = (verts[i], verts[(i + 1) % n]);
        for j in (i + 2)..n {
            if i == 0 && j == n - 1 {
                continue;
            }
            let (b1, b2) = (verts[j], verts[(j + 1) % n]);
            if segments_intersect(&a1, &a2, &b1, &b2) {
                return true;
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(x: f64, y: f64) -> Point {
        Point::new(x, y).unwrap()
    }

    fn poly(coords: &[(f64, f64)]) -> Polygon {
        Polygon::new(coords.iter().map(|&(x, y)| pt(x, y)).collect()).unwrap()
    }

    #[test]
    fn test_orientation_sign() {
        assert!(orientation(&pt(0.0, 0.0), &pt(1.0, 0.0), &pt(0.0, 1.0)) > 0.0);
        assert!(orientation(&pt(0.0, 0.0), &pt(1.0, 0.0), &pt(0.0, -1.0)) < 0.0);
        assert_eq!(orientation(&pt(0.0, 0.0), &pt(1.0, 0.0), &pt(2.0, 0.0)), 0.0);
    }

    #[test]
    fn test_crossing_segments() {
        assert!(segments_intersect(&pt(0.0, 0.0), &pt(2.0, 2.0), &pt(0.0, 2.0), &pt(2.0, 0.0)));
        assert!(!segments_intersect(&pt(0.0, 0.0), &pt(1.0, 0.0), &pt(0.0, 1.0), &pt(1.0, 1.0)));
    }

    #[test]
    fn test_touching_and_collinear_segments() {
        // T-junction
        assert!(segments_intersect(&pt(0.0, 0.0), &pt(2.0, 0.0), &pt(1.0, 0.0), &pt(1.0, 1.0)));
        // collinear overlap
        assert!(segments_intersect(&pt(0.0, 0.0), &pt(2.0, 0.0), &pt(1.0, 0.0), &pt(3.0, 0.0)));
        // collinear, disjoint
        assert!(!segments_intersect(&pt(0.0, 0.0), &pt(1.0, 0.0), &pt(2.0, 0.0), &pt(3.0, 0.0)));
    }

    #[test]
    fn test_point_segment_distance() {
        let a = pt(0.0, 0.0);
        let b = pt(10.0, 0.0);
        assert_eq!(point_segment_distance(&pt(5.0, 3.0), &a, &b), 3.0);
        assert_eq!(point_segment_distance(&pt(-3.0, 4.0), &a, &b), 5.0);
        assert_eq!(point_segment_distance(&pt(1.0, 1.0), &a, &a), 2f64.sqrt());
    }

    #[test]
    fn test_square_is_simple() {
        let sq = poly(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)]);
        assert!(!is_self_intersecting(&sq));
    }

    #[test]
    fn test_bowtie_self_intersects() {
        let bowtie = poly(&[(0.0, 0.0), (10.0, 10.0), (10.0, 0.0), (0.0, 10.0)]);
        assert!(is_self_intersecting(&bowtie));
    }

    #[test]
    fn test_triangle_never_self_intersects() {
        let tri = poly(&[(0.0, 0.0), (5.0, 0.0), (0.0, 5.0)]);
        assert!(!is_self_intersecting(&tri));
    }

    #[test]
    fn test_concave_polygon_is_simple() {
        let l_shape = poly(&[
            (0.0, 0.0),
            (10.0, 0.0),
            (10.0, 4.0),
            (4.0, 4.0),
            (4.0, 10.0),
            (0.0, 10.0),
        ]);
        assert!(!is_self_intersecting(&l_shape));
    }

    #[test]
    fn test_repeated_vertex_is_ignored() {
        let sq = poly(&[(0.0, 0.0), (10.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)]);
        assert!(!is_self_intersecting(&sq));
    }

    #[test]
    fn test_non_adjacent_edges_touching_at_vertex() {
        // figure-eight pinched at (5, 5)
        let pinched = poly(&[
            (0.0, 0.0),
            (5.0, 5.0),
            (10.0, 0.0),
            (10.0, 10.0),
            (5.0, 5.0),
            (0.0, 10.0),
        ]);
        assert!(is_self_intersecting(&pinched));
    }
}
