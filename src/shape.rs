//! Shapes: collections of contours, and the whole-shape preparation steps
//! that run before any distance is sampled.

use crate::contour::Contour;
use crate::edge::EdgeEnd;
use crate::error::{Error, Result};
use crate::math::{mix, VectorExt};
use crate::scanline::{Intersection, Scanline};
use lyon_geom::{point, vector, Box2D};
use log::{debug, trace};
use std::cmp::Ordering;

/// Joints whose tangents are closer than this to fully reversed are cusps.
pub const CORNER_DOT_EPSILON: f64 = 0.000001;
/// How far the control points next to a cusp are pushed apart.
pub const DECONVERGENCE_FACTOR: f64 = 0.000001;

/// Stand-in for infinity when accumulating bounds.
const LARGE_VALUE: f64 = 1e240;

/// A vector shape made of closed contours.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Shape {
    pub contours: Vec<Contour>,
    /// Rows of generated bitmaps are stored bottom-up when set.
    pub inverse_y_axis: bool,
}

impl Shape {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_contours(contours: Vec<Contour>) -> Self {
        Self {
            contours,
            inverse_y_axis: false,
        }
    }

    pub fn add_contour(&mut self, contour: Contour) {
        self.contours.push(contour);
    }

    /// Appends an empty contour and returns it for filling in.
    pub fn add_empty_contour(&mut self) -> &mut Contour {
        self.contours.push(Contour::default());
        let last = self.contours.len() - 1;
        &mut self.contours[last]
    }

    pub fn edge_count(&self) -> usize {
        self.contours.iter().map(|c| c.edges.len()).sum()
    }

    /// Checks that every contour is a closed loop.
    pub fn validate(&self) -> Result<()> {
        for (ci, contour) in self.contours.iter().enumerate() {
            let Some(last) = contour.edges.last() else {
                continue;
            };
            let mut corner = last.end();
            for (ei, edge) in contour.edges.iter().enumerate() {
                if edge.start() != corner {
                    return Err(Error::Discontinuous {
                        contour: ci,
                        edge: ei,
                    });
                }
                corner = edge.end();
            }
        }
        Ok(())
    }

    /// Splits single-edge contours into thirds and pulls apart the control
    /// points at cusps, where two edges meet heading in opposite directions.
    pub fn normalize(&mut self) {
        for (ci, contour) in self.contours.iter_mut().enumerate() {
            let n = contour.edges.len();
            if n == 1 {
                trace!("contour {}: splitting lone edge in thirds", ci);
                let parts = contour.edges[0].split_in_thirds();
                contour.set_edges(parts.to_vec());
                continue;
            }
            for i in 0..n {
                let prev = if i == 0 { n - 1 } else { i - 1 };
                let prev_dir = contour.edges[prev].direction(1.0).normalized(false);
                let cur_dir = contour.edges[i].direction(0.0).normalized(false);
                if prev_dir.dot(cur_dir) < CORNER_DOT_EPSILON - 1.0 {
                    trace!("contour {}: deconverging edges {} and {}", ci, prev, i);
                    contour.edges[prev].deconverge(EdgeEnd::End, DECONVERGENCE_FACTOR);
                    contour.edges[i].deconverge(EdgeEnd::Start, DECONVERGENCE_FACTOR);
                }
            }
        }
    }

    /// Grows `bounds` to contain the whole shape.
    pub fn bound(&self, bounds: &mut Box2D<f64>) {
        for contour in &self.contours {
            contour.bound(bounds);
        }
    }

    pub fn bound_miters(&self, bounds: &mut Box2D<f64>, border: f64, miter_limit: f64, polarity: i32) {
        for contour in &self.contours {
            contour.bound_miters(bounds, border, miter_limit, polarity);
        }
    }

    /// Bounds of the shape padded by `border`, including miters up to
    /// `miter_limit` when both are positive. An empty shape yields an
    /// inverted box (min > max).
    pub fn get_bounds(&self, border: f64, miter_limit: f64, polarity: i32) -> Box2D<f64> {
        let mut bounds = Box2D::new(
            point(LARGE_VALUE, LARGE_VALUE),
            point(-LARGE_VALUE, -LARGE_VALUE),
        );
        self.bound(&mut bounds);
        if border > 0.0 {
            bounds.min -= vector(border, border);
            bounds.max += vector(border, border);
            if miter_limit > 0.0 {
                self.bound_miters(&mut bounds, border, miter_limit, polarity);
            }
        }
        bounds
    }

    /// All crossings of the shape with the horizontal line at `y`.
    pub fn scanline(&self, y: f64) -> Scanline {
        let intersections = self
            .contours
            .iter()
            .flat_map(|c| &c.edges)
            .flat_map(|e| e.scanline_intersections(y))
            .collect();
        Scanline::new(intersections)
    }

    /// Reverses contours whose orientation disagrees with their nesting, so
    /// that filled regions end up wound +1 and holes -1.
    ///
    /// For each contour not yet decided, a horizontal line through it is cut
    /// against the whole shape. Going left to right, crossings alternate
    /// between entering and leaving; a contour is positive where it enters
    /// upwards.
    pub fn orient_contours(&mut self) {
        let ratio = 0.5 * (5f64.sqrt() - 1.0);
        let mut orientations = vec![0i32; self.contours.len()];
        // (x, direction, contour)
        let mut crossings: Vec<(Intersection, usize)> = Vec::new();

        for i in 0..self.contours.len() {
            if orientations[i] != 0 || self.contours[i].edges.is_empty() {
                continue;
            }
            let edges = &self.contours[i].edges;
            // Any y strictly inside the contour's vertical extent will do;
            // an irrational mix avoids landing on vertices.
            let y0 = edges[0].point(0.0).y;
            let mut y1 = y0;
            for edge in edges {
                if y0 != y1 {
                    break;
                }
                y1 = edge.point(1.0).y;
            }
            for edge in edges {
                if y0 != y1 {
                    break;
                }
                y1 = edge.point(ratio).y;
            }
            let y = mix(y0, y1, ratio);

            for (ci, contour) in self.contours.iter().enumerate() {
                for edge in &contour.edges {
                    crossings.extend(edge.scanline_intersections(y).into_iter().map(|x| (x, ci)));
                }
            }
            if crossings.is_empty() {
                continue;
            }
            crossings.sort_by(|a, b| a.0.x.partial_cmp(&b.0.x).unwrap_or(Ordering::Equal));
            // Coincident crossings are ambiguous.
            for j in 1..crossings.len() {
                if crossings[j].0.x == crossings[j - 1].0.x {
                    crossings[j].0.direction = 0;
                    crossings[j - 1].0.direction = 0;
                }
            }
            for (j, (crossing, ci)) in crossings.iter().enumerate() {
                if crossing.direction != 0 {
                    let entering = (j & 1 == 0) == (crossing.direction > 0);
                    orientations[*ci] += if entering { 1 } else { -1 };
                }
            }
            crossings.clear();
        }

        for (i, contour) in self.contours.iter_mut().enumerate() {
            if orientations[i] < 0 {
                debug!("reversing contour {}", i);
                contour.reverse();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coloring::EdgeColor;
    use crate::edge::{EdgeSegment, Segment};
    use crate::scanline::FillRule;
    use lyon_geom::CubicBezierSegment;

    fn polygon(points: &[(f64, f64)]) -> Contour {
        let mut contour = Contour::default();
        for i in 0..points.len() {
            let (ax, ay) = points[i];
            let (bx, by) = points[(i + 1) % points.len()];
            contour.add_edge(EdgeSegment::line(point(ax, ay), point(bx, by), EdgeColor::WHITE));
        }
        contour
    }

    fn square_with_hole() -> Shape {
        Shape::from_contours(vec![
            polygon(&[(0.0, 0.0), (0.0, 3.0), (3.0, 3.0), (3.0, 0.0)]),
            polygon(&[(1.0, 1.0), (2.0, 1.0), (2.0, 2.0), (1.0, 2.0)]),
        ])
    }

    #[test]
    fn closed_contours_validate() {
        assert_eq!(square_with_hole().validate(), Ok(()));
        assert_eq!(Shape::new().validate(), Ok(()));
    }

    #[test]
    fn gaps_are_reported() {
        let mut shape = square_with_hole();
        shape.contours[1].edges[2] =
            EdgeSegment::line(point(2.0, 2.5), point(1.0, 2.0), EdgeColor::WHITE);
        assert_eq!(
            shape.validate(),
            Err(Error::Discontinuous { contour: 1, edge: 2 })
        );
    }

    #[test]
    fn lone_edge_is_split() {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut shape = Shape::new();
        shape.add_empty_contour().add_edge(EdgeSegment::new(
            Segment::Cubic(CubicBezierSegment {
                from: point(0.0, 0.0),
                ctrl1: point(2.0, 2.0),
                ctrl2: point(-2.0, 2.0),
                to: point(0.0, 0.0),
            }),
            EdgeColor::WHITE,
        ));
        shape.normalize();
        assert_eq!(shape.edge_count(), 3);
        assert_eq!(shape.validate(), Ok(()));
    }

    #[test]
    fn cusps_are_deconverged() {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut contour = Contour::default();
        contour.add_edge(EdgeSegment::line(point(0.0, 0.0), point(2.0, 0.0), EdgeColor::WHITE));
        contour.add_edge(EdgeSegment::quadratic(
            point(2.0, 0.0),
            point(0.0, 0.0),
            point(1.0, 1.0),
            EdgeColor::WHITE,
        ));
        contour.add_edge(EdgeSegment::line(point(1.0, 1.0), point(0.0, 0.0), EdgeColor::WHITE));
        let mut shape = Shape::from_contours(vec![contour]);
        shape.normalize();

        let edges = &shape.contours[0].edges;
        assert!(matches!(edges[0].segment, Segment::Linear(_)));
        assert!(matches!(edges[1].segment, Segment::Cubic(_)));
        assert_eq!(edges[1].start(), point(2.0, 0.0));
        assert_eq!(edges[1].end(), point(1.0, 1.0));
        // The reversed tangent is no longer exactly reversed.
        let before = edges[0].direction(1.0).normalized(false);
        let after = edges[1].direction(0.0).normalized(false);
        assert!(before.dot(after) > -1.0);
    }

    #[test]
    fn bounds_with_border() {
        let shape = square_with_hole();
        let plain = shape.get_bounds(0.0, 0.0, 1);
        assert_eq!(plain, Box2D::new(point(0.0, 0.0), point(3.0, 3.0)));
        let padded = shape.get_bounds(0.5, 0.0, 1);
        assert_eq!(padded, Box2D::new(point(-0.5, -0.5), point(3.5, 3.5)));
        let mitered = shape.get_bounds(0.5, 2.0, 1);
        assert!(mitered.contains_box(&padded));
    }

    #[test]
    fn empty_shape_has_inverted_bounds() {
        let bounds = Shape::new().get_bounds(0.0, 0.0, 1);
        assert!(bounds.min.x > bounds.max.x);
    }

    #[test]
    fn scanline_through_a_hole() {
        let shape = square_with_hole();
        let mut line = shape.scanline(1.5);
        assert_eq!(line.intersections().len(), 4);
        assert!(line.filled(0.5, FillRule::NonZero));
        assert!(!line.filled(1.5, FillRule::NonZero));
        assert!(line.filled(2.5, FillRule::NonZero));
        assert!(!line.filled(3.5, FillRule::NonZero));
    }

    #[test]
    fn consistent_orientation_is_kept() {
        let mut shape = square_with_hole();
        let before = shape.clone();
        shape.orient_contours();
        assert_eq!(shape, before);
        assert_eq!(shape.contours[0].winding(), 1);
        assert_eq!(shape.contours[1].winding(), -1);
    }

    #[test]
    fn inverted_orientation_is_fixed() {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut shape = square_with_hole();
        for contour in &mut shape.contours {
            contour.reverse();
        }
        shape.orient_contours();
        assert_eq!(shape.contours[0].winding(), 1);
        assert_eq!(shape.contours[1].winding(), -1);
    }
}
