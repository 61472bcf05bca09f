//! Closed loops of edges.

use crate::edge::{include_point, EdgeSegment};
use crate::math::{sign, Point2, VectorExt};
use lyon_geom::Box2D;

/// A list of edges forming a closed loop. Each edge should start where the
/// previous one ends, and the last one should end where the first starts.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Contour {
    pub edges: Vec<EdgeSegment>,
}

impl Contour {
    pub fn new(edges: Vec<EdgeSegment>) -> Self {
        Self { edges }
    }

    pub fn add_edge(&mut self, edge: EdgeSegment) {
        self.edges.push(edge);
    }

    /// Replaces the whole edge list, e.g. after splitting edges.
    pub fn set_edges(&mut self, edges: Vec<EdgeSegment>) {
        self.edges = edges;
    }

    /// Grows `bounds` to contain every edge.
    pub fn bound(&self, bounds: &mut Box2D<f64>) {
        for edge in &self.edges {
            edge.bound(bounds);
        }
    }

    /// Grows `bounds` to contain the miters a stroke of half-width `border`
    /// would produce at the contour's convex corners. `polarity` selects
    /// which turning direction counts as convex.
    pub fn bound_miters(&self, bounds: &mut Box2D<f64>, border: f64, miter_limit: f64, polarity: i32) {
        let Some(last) = self.edges.last() else {
            return;
        };
        let mut prev_dir = last.direction(1.0).normalized(true);
        for edge in &self.edges {
            let dir = -edge.direction(0.0).normalized(true);
            if polarity as f64 * prev_dir.cross(dir) >= 0.0 {
                let mut miter_length = miter_limit;
                let q = 0.5 * (1.0 - prev_dir.dot(dir));
                if q > 0.0 {
                    miter_length = (1.0 / q.sqrt()).min(miter_limit);
                }
                let miter: Point2 =
                    edge.point(0.0) + (prev_dir + dir).normalized(true) * (border * miter_length);
                include_point(bounds, miter);
            }
            prev_dir = edge.direction(1.0).normalized(true);
        }
    }

    /// Orientation of the contour: +1 or -1 by the sign of its shoelace
    /// area, 0 for an empty or degenerate contour.
    ///
    /// Curves are sampled so that one or two edge loops still enclose area.
    pub fn winding(&self) -> i32 {
        let shoelace = |a: Point2, b: Point2| (b.x - a.x) * (a.y + b.y);
        let n = self.edges.len();
        let total = match n {
            0 => return 0,
            1 => {
                let a = self.edges[0].point(0.0);
                let b = self.edges[0].point(1.0 / 3.0);
                let c = self.edges[0].point(2.0 / 3.0);
                shoelace(a, b) + shoelace(b, c) + shoelace(c, a)
            }
            2 => {
                let a = self.edges[0].point(0.0);
                let b = self.edges[0].point(0.5);
                let c = self.edges[1].point(0.0);
                let d = self.edges[1].point(0.5);
                shoelace(a, b) + shoelace(b, c) + shoelace(c, d) + shoelace(d, a)
            }
            _ => {
                let mut total = 0.0;
                let mut prev = self.edges[n - 1].point(0.0);
                for edge in &self.edges {
                    let cur = edge.point(0.0);
                    total += shoelace(prev, cur);
                    prev = cur;
                }
                total
            }
        };
        sign(total)
    }

    /// Reverses the direction of the contour, flipping its winding.
    pub fn reverse(&mut self) {
        self.edges.reverse();
        for edge in &mut self.edges {
            edge.reverse();
        }
    }
}
