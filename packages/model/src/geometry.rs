//! # Document-Space Geometry
//!
//! Coordinates are document-space units with the origin at the top-left
//! and y increasing downward. A region outline is an ordered vertex
//! sequence: four vertices for an axis-aligned rectangle, three or more
//! for a polygon.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A 2D point in document coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

impl From<Point> for (f64, f64) {
    fn from(p: Point) -> Self {
        (p.x, p.y)
    }
}

/// Errors from outline validation at region creation time.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    #[error("region outline needs at least 3 vertices, got {0}")]
    TooFewVertices(usize),

    #[error("region outline is self-intersecting")]
    SelfIntersecting,
}

/// Build the four-vertex outline of an axis-aligned rectangle from two
/// opposite corners, in top-left, top-right, bottom-right, bottom-left
/// order regardless of which corners were given.
pub fn rect_coords(a: Point, b: Point) -> Vec<Point> {
    let (x0, x1) = (a.x.min(b.x), a.x.max(b.x));
    let (y0, y1) = (a.y.min(b.y), a.y.max(b.y));
    vec![
        Point::new(x0, y0),
        Point::new(x1, y0),
        Point::new(x1, y1),
        Point::new(x0, y1),
    ]
}

/// Validate an outline for use as region coordinates. The simplicity
/// check is best-effort at creation time only; outlines loaded from disk
/// are not re-verified.
pub fn validate_outline(points: &[Point]) -> Result<(), GeometryError> {
    if points.len() < 3 {
        return Err(GeometryError::TooFewVertices(points.len()));
    }
    if !is_simple_polygon(points) {
        return Err(GeometryError::SelfIntersecting);
    }
    Ok(())
}

/// Best-effort check that a closed polygon does not self-intersect:
/// no two non-adjacent edges may cross. O(n^2) over the edge pairs,
/// which is fine for hand-drawn outlines.
pub fn is_simple_polygon(points: &[Point]) -> bool {
    let n = points.len();
    if n < 3 {
        return false;
    }
    for i in 0..n {
        let (a1, a2) = (points[i], points[(i + 1) % n]);
        for j in (i + 1)..n {
            // Skip the shared-vertex neighbours of edge i.
            if j == i || (j + 1) % n == i || (i + 1) % n == j {
                continue;
            }
            let (b1, b2) = (points[j], points[(j + 1) % n]);
            if segments_intersect(a1, a2, b1, b2) {
                return false;
            }
        }
    }
    true
}

/// The axis-aligned hull of a set of outlines, as a four-vertex
/// rectangle. Used when a container region has no outline of its own and
/// must enclose its children. Returns an empty outline if the input has
/// no points at all.
pub fn enclosing_polygon(outlines: &[Vec<Point>]) -> Vec<Point> {
    let mut points = outlines.iter().flatten();
    let first = match points.next() {
        Some(p) => *p,
        None => return Vec::new(),
    };
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
    for p in points {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    rect_coords(Point::new(min_x, min_y), Point::new(max_x, max_y))
}

fn cross(o: Point, a: Point, b: Point) -> f64 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

/// Proper segment intersection test. Collinear overlaps count as an
/// intersection; touching at a single shared endpoint does not, since
/// adjacent edges are excluded by the caller.
fn segments_intersect(p1: Point, p2: Point, q1: Point, q2: Point) -> bool {
    let d1 = cross(q1, q2, p1);
    let d2 = cross(q1, q2, p2);
    let d3 = cross(p1, p2, q1);
    let d4 = cross(p1, p2, q2);

    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }

    // Collinear cases: check for overlap on either axis projection.
    let on_segment = |a: Point, b: Point, c: Point| {
        c.x >= a.x.min(b.x) && c.x <= a.x.max(b.x) && c.y >= a.y.min(b.y) && c.y <= a.y.max(b.y)
    };
    (d1 == 0.0 && on_segment(q1, q2, p1))
        || (d2 == 0.0 && on_segment(q1, q2, p2))
        || (d3 == 0.0 && on_segment(p1, p2, q1))
        || (d4 == 0.0 && on_segment(p1, p2, q2))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_coords_normalizes_corners() {
        let coords = rect_coords(Point::new(10.0, 20.0), Point::new(2.0, 4.0));
        assert_eq!(coords[0], Point::new(2.0, 4.0));
        assert_eq!(coords[2], Point::new(10.0, 20.0));
        assert_eq!(coords.len(), 4);
    }

    #[test]
    fn square_is_simple() {
        let square = rect_coords(Point::new(0.0, 0.0), Point::new(1.0, 1.0));
        assert!(is_simple_polygon(&square));
    }

    #[test]
    fn bowtie_is_not_simple() {
        // Crossing diagonals: (0,0) -> (1,1) -> (1,0) -> (0,1)
        let bowtie = vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(1.0, 0.0),
            Point::new(0.0, 1.0),
        ];
        assert!(!is_simple_polygon(&bowtie));
        assert_eq!(
            validate_outline(&bowtie),
            Err(GeometryError::SelfIntersecting)
        );
    }

    #[test]
    fn too_few_vertices_rejected() {
        let line = vec![Point::new(0.0, 0.0), Point::new(1.0, 1.0)];
        assert_eq!(validate_outline(&line), Err(GeometryError::TooFewVertices(2)));
    }

    #[test]
    fn enclosing_polygon_covers_all_outlines() {
        let a = rect_coords(Point::new(0.0, 0.0), Point::new(2.0, 2.0));
        let b = rect_coords(Point::new(5.0, 1.0), Point::new(7.0, 9.0));
        let hull = enclosing_polygon(&[a, b]);
        assert_eq!(hull[0], Point::new(0.0, 0.0));
        assert_eq!(hull[2], Point::new(7.0, 9.0));
    }

    #[test]
    fn enclosing_polygon_of_nothing_is_empty() {
        assert!(enclosing_polygon(&[]).is_empty());
    }
}
