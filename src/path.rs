//! Building shapes from pen commands and `lyon_path` outlines.

use crate::coloring::EdgeColor;
use crate::contour::Contour;
use crate::edge::EdgeSegment;
use crate::math::Point2;
use crate::shape::Shape;
use lyon_path::PathEvent;

/// Gaps shorter than this are not bridged when a contour is closed.
const CLOSE_EPSILON: f64 = 1e-14;

/// Collects pen commands into a [`Shape`]. Every edge starts out white.
#[derive(Clone, Debug, Default)]
pub struct ShapeBuilder {
    /// The start point of the current contour
    contour_start: Point2,
    /// The current pen location
    pen: Point2,
    /// in-flight edges
    edges: Vec<EdgeSegment>,
    shape: Shape,
}

impl ShapeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new contour at `to`. Edges of an unfinished contour are kept
    /// as they are, open or not.
    pub fn move_to(&mut self, to: Point2) {
        self.finish_contour();
        self.pen = to;
        self.contour_start = to;
    }

    pub fn line_to(&mut self, to: Point2) {
        if to != self.pen {
            self.edges.push(EdgeSegment::line(self.pen, to, EdgeColor::WHITE));
            self.pen = to;
        }
    }

    pub fn quadratic_to(&mut self, ctrl: Point2, to: Point2) {
        self.edges
            .push(EdgeSegment::quadratic(self.pen, ctrl, to, EdgeColor::WHITE));
        self.pen = to;
    }

    pub fn cubic_to(&mut self, ctrl1: Point2, ctrl2: Point2, to: Point2) {
        self.edges
            .push(EdgeSegment::cubic(self.pen, ctrl1, ctrl2, to, EdgeColor::WHITE));
        self.pen = to;
    }

    /// Ends the current contour, with a straight edge back to its start if
    /// the pen is not already there. A gap too small to bridge is closed by
    /// moving the end of the last edge onto the start.
    pub fn close(&mut self) {
        let gap = (self.pen - self.contour_start).length();
        if gap > CLOSE_EPSILON {
            self.edges
                .push(EdgeSegment::line(self.pen, self.contour_start, EdgeColor::WHITE));
        } else if gap > 0.0 {
            if let Some(last) = self.edges.last_mut() {
                last.move_end_point(self.contour_start);
            }
        }
        self.pen = self.contour_start;
        self.finish_contour();
    }

    /// Ends the current contour where the pen is, without closing it.
    pub fn end(&mut self) {
        self.finish_contour();
    }

    pub fn current_position(&self) -> Point2 {
        self.pen
    }

    pub fn build(mut self) -> Shape {
        self.finish_contour();
        self.shape
    }

    fn finish_contour(&mut self) {
        if !self.edges.is_empty() {
            let edges = std::mem::take(&mut self.edges);
            self.shape.add_contour(Contour::new(edges));
        }
    }
}

impl Shape {
    /// Converts a `lyon_path` outline. Sub-paths that end without closing
    /// are kept open, so [`Shape::validate`] reports them.
    pub fn from_path_events(events: impl IntoIterator<Item = PathEvent>) -> Self {
        let mut builder = ShapeBuilder::new();
        for event in events {
            match event {
                PathEvent::Begin { at } => builder.move_to(at.to_f64()),
                PathEvent::Line { to, .. } => builder.line_to(to.to_f64()),
                PathEvent::Quadratic { ctrl, to, .. } => builder.quadratic_to(ctrl.to_f64(), to.to_f64()),
                PathEvent::Cubic { ctrl1, ctrl2, to, .. } => {
                    builder.cubic_to(ctrl1.to_f64(), ctrl2.to_f64(), to.to_f64())
                }
                PathEvent::End { close: true, .. } => builder.close(),
                PathEvent::End { close: false, .. } => builder.end(),
            }
        }
        builder.build()
    }
}
