//! Edge segments: the linear, quadratic and cubic pieces contours are made of.

use crate::coloring::EdgeColor;
use crate::distance::SignedDistance;
use crate::math::{non_zero_sign, sign, solve_cubic, solve_quadratic, Point2, Vector2, VectorExt};
use crate::scanline::Intersection;
use arrayvec::ArrayVec;
use lyon_geom::{Box2D, CubicBezierSegment, LineSegment, QuadraticBezierSegment};

/// Number of evenly spaced seeds for the cubic nearest-point search, minus one.
pub const CUBIC_SEARCH_STARTS: usize = 4;
/// Newton iterations per cubic nearest-point seed.
pub const CUBIC_SEARCH_STEPS: usize = 4;
/// Number of chords used to estimate the length of a cubic.
pub const EDGE_LENGTH_PRECISION: usize = 4;

/// Crossings of one edge with a horizontal line.
pub type Crossings = ArrayVec<Intersection, 3>;

/// The geometric part of an edge.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Segment {
    Linear(LineSegment<f64>),
    Quadratic(QuadraticBezierSegment<f64>),
    Cubic(CubicBezierSegment<f64>),
}

/// Which end of an edge an operation applies to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EdgeEnd {
    Start,
    End,
}

/// A path segment together with the colour channels it contributes to.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct EdgeSegment {
    pub segment: Segment,
    pub color: EdgeColor,
}

/// Grows `bounds` to contain `p`.
pub(crate) fn include_point(bounds: &mut Box2D<f64>, p: Point2) {
    bounds.min.x = bounds.min.x.min(p.x);
    bounds.min.y = bounds.min.y.min(p.y);
    bounds.max.x = bounds.max.x.max(p.x);
    bounds.max.y = bounds.max.y.max(p.y);
}

impl EdgeSegment {
    pub fn new(segment: Segment, color: EdgeColor) -> Self {
        Self { segment, color }
    }

    /// A straight edge.
    pub fn line(p0: Point2, p1: Point2, color: EdgeColor) -> Self {
        Self::new(Segment::Linear(LineSegment { from: p0, to: p1 }), color)
    }

    /// A quadratic edge, or a straight one if the control point is collinear
    /// with the endpoints.
    pub fn quadratic(p0: Point2, p1: Point2, p2: Point2, color: EdgeColor) -> Self {
        if (p1 - p0).cross(p2 - p1) == 0.0 {
            return Self::line(p0, p2, color);
        }
        Self::new(
            Segment::Quadratic(QuadraticBezierSegment {
                from: p0,
                ctrl: p1,
                to: p2,
            }),
            color,
        )
    }

    /// A cubic edge, reduced to a line when all control points are collinear
    /// and to a quadratic when it is an exactly elevated quadratic.
    pub fn cubic(p0: Point2, p1: Point2, p2: Point2, p3: Point2, color: EdgeColor) -> Self {
        let p12 = p2 - p1;
        if (p1 - p0).cross(p12) == 0.0 && p12.cross(p3 - p2) == 0.0 {
            return Self::line(p0, p3, color);
        }
        let ctrl = p1.to_vector() * 1.5 - p0.to_vector() * 0.5;
        if ctrl == p2.to_vector() * 1.5 - p3.to_vector() * 0.5 {
            return Self::new(
                Segment::Quadratic(QuadraticBezierSegment {
                    from: p0,
                    ctrl: ctrl.to_point(),
                    to: p3,
                }),
                color,
            );
        }
        Self::new(
            Segment::Cubic(CubicBezierSegment {
                from: p0,
                ctrl1: p1,
                ctrl2: p2,
                to: p3,
            }),
            color,
        )
    }

    fn with_segment(&self, segment: Segment) -> Self {
        Self::new(segment, self.color)
    }

    pub fn control_points(&self) -> ArrayVec<Point2, 4> {
        let mut points = ArrayVec::new();
        match self.segment {
            Segment::Linear(s) => points.extend([s.from, s.to]),
            Segment::Quadratic(s) => points.extend([s.from, s.ctrl, s.to]),
            Segment::Cubic(s) => points.extend([s.from, s.ctrl1, s.ctrl2, s.to]),
        }
        points
    }

    pub fn start(&self) -> Point2 {
        self.point(0.0)
    }

    pub fn end(&self) -> Point2 {
        self.point(1.0)
    }

    /// Point on the edge at parameter `t`.
    pub fn point(&self, t: f64) -> Point2 {
        match self.segment {
            Segment::Linear(s) => s.from.lerp(s.to, t),
            Segment::Quadratic(s) => s.from.lerp(s.ctrl, t).lerp(s.ctrl.lerp(s.to, t), t),
            Segment::Cubic(s) => {
                let p12 = s.ctrl1.lerp(s.ctrl2, t);
                s.from
                    .lerp(s.ctrl1, t)
                    .lerp(p12, t)
                    .lerp(p12.lerp(s.ctrl2.lerp(s.to, t), t), t)
            }
        }
    }

    /// Direction of the edge at parameter `t`. Never zero for a
    /// non-degenerate edge: where the derivative vanishes the chord between
    /// the neighbouring control points is used instead.
    pub fn direction(&self, t: f64) -> Vector2 {
        match self.segment {
            Segment::Linear(s) => s.to - s.from,
            Segment::Quadratic(s) => {
                let tangent = (s.ctrl - s.from).lerp(s.to - s.ctrl, t);
                if tangent.is_zero() {
                    return s.to - s.from;
                }
                tangent
            }
            Segment::Cubic(s) => {
                let tangent = (s.ctrl1 - s.from)
                    .lerp(s.ctrl2 - s.ctrl1, t)
                    .lerp((s.ctrl2 - s.ctrl1).lerp(s.to - s.ctrl2, t), t);
                if tangent.is_zero() {
                    if t == 0.0 {
                        return s.ctrl2 - s.from;
                    }
                    if t == 1.0 {
                        return s.to - s.ctrl1;
                    }
                }
                tangent
            }
        }
    }

    /// Change of direction (second derivative, up to scale) at `t`.
    pub fn direction_change(&self, t: f64) -> Vector2 {
        match self.segment {
            Segment::Linear(_) => Vector2::zero(),
            Segment::Quadratic(s) => (s.to - s.ctrl) - (s.ctrl - s.from),
            Segment::Cubic(s) => ((s.ctrl2 - s.ctrl1) - (s.ctrl1 - s.from))
                .lerp((s.to - s.ctrl2) - (s.ctrl2 - s.ctrl1), t),
        }
    }

    /// Arc length of the edge. Exact for lines and quadratics, estimated with
    /// a short polyline for cubics.
    pub fn length(&self) -> f64 {
        match self.segment {
            Segment::Linear(s) => (s.to - s.from).length(),
            Segment::Quadratic(s) => {
                let ab = s.ctrl - s.from;
                let br = s.to - s.ctrl - ab;
                let abab = ab.dot(ab);
                let abbr = ab.dot(br);
                let brbr = br.dot(br);
                let ab_len = abab.sqrt();
                let br_len = brbr.sqrt();
                let crs = ab.cross(br);
                let h = (abab + abbr + abbr + brbr).sqrt();
                let len = (br_len * ((abbr + brbr) * h - abbr * ab_len)
                    + crs * crs * ((br_len * h + abbr + brbr) / (br_len * ab_len + abbr)).ln())
                    / (brbr * br_len);
                if len.is_finite() {
                    len
                } else {
                    self.estimate_length()
                }
            }
            Segment::Cubic(_) => self.estimate_length(),
        }
    }

    fn estimate_length(&self) -> f64 {
        let mut len = 0.0;
        let mut prev = self.point(0.0);
        for i in 1..=EDGE_LENGTH_PRECISION {
            let cur = self.point(i as f64 / EDGE_LENGTH_PRECISION as f64);
            len += (cur - prev).length();
            prev = cur;
        }
        len
    }

    /// Signed distance from `origin` to the edge, and the parameter of the
    /// closest point. The parameter falls outside `[0, 1]` when the closest
    /// point is an endpoint and `origin` lies beyond it along the tangent.
    pub fn signed_distance(&self, origin: Point2) -> (SignedDistance, f64) {
        match self.segment {
            Segment::Linear(LineSegment { from: p0, to: p1 }) => {
                let aq = origin - p0;
                let ab = p1 - p0;
                let param = aq.dot(ab) / ab.dot(ab);
                let eq = if param > 0.5 { p1 - origin } else { p0 - origin };
                let endpoint_distance = eq.length();
                if param > 0.0 && param < 1.0 {
                    let ortho_distance = ab.orthonormal(false, false).dot(aq);
                    if ortho_distance.abs() < endpoint_distance {
                        return (SignedDistance::new(ortho_distance, 0.0), param);
                    }
                }
                (
                    SignedDistance::new(
                        non_zero_sign(aq.cross(ab)) as f64 * endpoint_distance,
                        ab.normalized(false).dot(eq.normalized(false)).abs(),
                    ),
                    param,
                )
            }

            Segment::Quadratic(QuadraticBezierSegment {
                from: p0,
                ctrl: p1,
                to: p2,
            }) => {
                let qa = p0 - origin;
                let ab = p1 - p0;
                let br = p2 - p1 - ab;
                let a = br.dot(br);
                let b = 3.0 * ab.dot(br);
                let c = 2.0 * ab.dot(ab) + qa.dot(br);
                let d = qa.dot(ab);
                let solutions = solve_cubic(a, b, c, d);

                let mut ep_dir = self.direction(0.0);
                let mut min_distance = non_zero_sign(ep_dir.cross(qa)) as f64 * qa.length();
                let mut param = -qa.dot(ep_dir) / ep_dir.dot(ep_dir);
                {
                    ep_dir = self.direction(1.0);
                    let distance = (p2 - origin).length();
                    if distance < min_distance.abs() {
                        min_distance = non_zero_sign(ep_dir.cross(p2 - origin)) as f64 * distance;
                        param = (origin - p1).dot(ep_dir) / ep_dir.dot(ep_dir);
                    }
                }
                for t in solutions {
                    if t > 0.0 && t < 1.0 {
                        let qe = qa + ab * (2.0 * t) + br * (t * t);
                        let distance = qe.length();
                        if distance <= min_distance.abs() {
                            min_distance = non_zero_sign((ab + br * t).cross(qe)) as f64 * distance;
                            param = t;
                        }
                    }
                }

                (self.endpoint_aware(min_distance, param, qa, p2 - origin), param)
            }

            Segment::Cubic(CubicBezierSegment {
                from: p0,
                ctrl1: p1,
                ctrl2: p2,
                to: p3,
            }) => {
                let qa = p0 - origin;
                let ab = p1 - p0;
                let br = p2 - p1 - ab;
                let as_ = (p3 - p2) - (p2 - p1) - br;

                let mut ep_dir = self.direction(0.0);
                let mut min_distance = non_zero_sign(ep_dir.cross(qa)) as f64 * qa.length();
                let mut param = -qa.dot(ep_dir) / ep_dir.dot(ep_dir);
                {
                    ep_dir = self.direction(1.0);
                    let distance = (p3 - origin).length();
                    if distance < min_distance.abs() {
                        min_distance = non_zero_sign(ep_dir.cross(p3 - origin)) as f64 * distance;
                        param = (ep_dir - (p3 - origin)).dot(ep_dir) / ep_dir.dot(ep_dir);
                    }
                }
                // Newton iterations from evenly spaced seeds; the degree 5
                // stationarity condition has no closed form.
                for i in 0..=CUBIC_SEARCH_STARTS {
                    let mut t = i as f64 / CUBIC_SEARCH_STARTS as f64;
                    let mut qe = qa + ab * (3.0 * t) + br * (3.0 * t * t) + as_ * (t * t * t);
                    for _ in 0..CUBIC_SEARCH_STEPS {
                        let d1 = ab * 3.0 + br * (6.0 * t) + as_ * (3.0 * t * t);
                        let d2 = br * 6.0 + as_ * (6.0 * t);
                        t -= qe.dot(d1) / (d1.dot(d1) + qe.dot(d2));
                        if t <= 0.0 || t >= 1.0 {
                            break;
                        }
                        qe = qa + ab * (3.0 * t) + br * (3.0 * t * t) + as_ * (t * t * t);
                        let distance = qe.length();
                        if distance < min_distance.abs() {
                            min_distance = non_zero_sign(d1.cross(qe)) as f64 * distance;
                            param = t;
                        }
                    }
                }

                (self.endpoint_aware(min_distance, param, qa, p3 - origin), param)
            }
        }
    }

    /// Attaches the tie-break alignment for a curve distance whose closest
    /// point may be an endpoint. `qa` and `qb` point from the query to the
    /// start and end of the edge.
    fn endpoint_aware(&self, distance: f64, param: f64, qa: Vector2, qb: Vector2) -> SignedDistance {
        if (0.0..=1.0).contains(&param) {
            SignedDistance::new(distance, 0.0)
        } else if param < 0.5 {
            SignedDistance::new(
                distance,
                self.direction(0.0).normalized(false).dot(qa.normalized(false)).abs(),
            )
        } else {
            SignedDistance::new(
                distance,
                self.direction(1.0).normalized(false).dot(qb.normalized(false)).abs(),
            )
        }
    }

    /// Replaces `distance` with the perpendicular distance to the tangent line
    /// extended past the nearest endpoint, when `param` says the closest point
    /// lies beyond that endpoint and the pseudo-distance is not larger.
    pub fn distance_to_pseudo_distance(&self, distance: &mut SignedDistance, origin: Point2, param: f64) {
        if param < 0.0 {
            let dir = self.direction(0.0).normalized(false);
            let aq = origin - self.point(0.0);
            let ts = aq.dot(dir);
            if ts < 0.0 {
                let pseudo_distance = aq.cross(dir);
                if pseudo_distance.abs() <= distance.distance.abs() {
                    distance.distance = pseudo_distance;
                    distance.dot = 0.0;
                }
            }
        } else if param > 1.0 {
            let dir = self.direction(1.0).normalized(false);
            let bq = origin - self.point(1.0);
            let ts = bq.dot(dir);
            if ts > 0.0 {
                let pseudo_distance = bq.cross(dir);
                if pseudo_distance.abs() <= distance.distance.abs() {
                    distance.distance = pseudo_distance;
                    distance.dot = 0.0;
                }
            }
        }
    }

    /// Points where the edge crosses the horizontal line at `y`, each with
    /// the vertical direction of the crossing. Endpoints lying exactly on the
    /// line are attributed so that a shape's crossings pair up correctly
    /// across adjoining edges.
    pub fn scanline_intersections(&self, y: f64) -> Crossings {
        let mut crossings = Crossings::new();
        match self.segment {
            Segment::Linear(LineSegment { from: p0, to: p1 }) => {
                if (y >= p0.y && y < p1.y) || (y >= p1.y && y < p0.y) {
                    let param = (y - p0.y) / (p1.y - p0.y);
                    crossings.push(Intersection {
                        x: p0.x + (p1.x - p0.x) * param,
                        direction: sign(p1.y - p0.y),
                    });
                }
            }

            Segment::Quadratic(QuadraticBezierSegment {
                from: p0,
                ctrl: p1,
                to: p2,
            }) => {
                let mut x = [0.0; 2];
                let mut dy = [0; 2];
                let mut total = 0;
                let mut next_dy = if y > p0.y { 1 } else { -1 };
                x[total] = p0.x;
                if p0.y == y {
                    if p0.y < p1.y || (p0.y == p1.y && p0.y < p2.y) {
                        dy[total] = 1;
                        total += 1;
                    } else {
                        next_dy = 1;
                    }
                }
                {
                    let ab = p1 - p0;
                    let br = p2 - p1 - ab;
                    let mut t = solve_quadratic(br.y, 2.0 * ab.y, p0.y - y);
                    t.sort_by(|a, b| a.total_cmp(b));
                    for t in t {
                        if total >= 2 {
                            break;
                        }
                        if (0.0..=1.0).contains(&t) {
                            x[total] = p0.x + 2.0 * t * ab.x + t * t * br.x;
                            if next_dy as f64 * (ab.y + t * br.y) >= 0.0 {
                                dy[total] = next_dy;
                                total += 1;
                                next_dy = -next_dy;
                            }
                        }
                    }
                }
                if p2.y == y {
                    if next_dy > 0 && total > 0 {
                        total -= 1;
                        next_dy = -1;
                    }
                    if (p2.y < p1.y || (p2.y == p1.y && p2.y < p0.y)) && total < 2 {
                        x[total] = p2.x;
                        if next_dy < 0 {
                            dy[total] = -1;
                            total += 1;
                            next_dy = 1;
                        }
                    }
                }
                let end_dy = if y >= p2.y { 1 } else { -1 };
                if next_dy != end_dy {
                    if total > 0 {
                        total -= 1;
                    } else {
                        if (p2.y - y).abs() < (p0.y - y).abs() {
                            x[total] = p2.x;
                        }
                        dy[total] = next_dy;
                        total += 1;
                    }
                }
                for (&x, &direction) in x.iter().zip(&dy).take(total) {
                    crossings.push(Intersection { x, direction });
                }
            }

            Segment::Cubic(CubicBezierSegment {
                from: p0,
                ctrl1: p1,
                ctrl2: p2,
                to: p3,
            }) => {
                let mut x = [0.0; 3];
                let mut dy = [0; 3];
                let mut total = 0;
                let mut next_dy = if y > p0.y { 1 } else { -1 };
                x[total] = p0.x;
                if p0.y == y {
                    if p0.y < p1.y
                        || (p0.y == p1.y && (p0.y < p2.y || (p0.y == p2.y && p0.y < p3.y)))
                    {
                        dy[total] = 1;
                        total += 1;
                    } else {
                        next_dy = 1;
                    }
                }
                {
                    let ab = p1 - p0;
                    let br = p2 - p1 - ab;
                    let as_ = (p3 - p2) - (p2 - p1) - br;
                    let mut t = solve_cubic(as_.y, 3.0 * br.y, 3.0 * ab.y, p0.y - y);
                    t.sort_by(|a, b| a.total_cmp(b));
                    for t in t {
                        if total >= 3 {
                            break;
                        }
                        if (0.0..=1.0).contains(&t) {
                            x[total] =
                                p0.x + 3.0 * t * ab.x + 3.0 * t * t * br.x + t * t * t * as_.x;
                            if next_dy as f64 * (ab.y + 2.0 * t * br.y + t * t * as_.y) >= 0.0 {
                                dy[total] = next_dy;
                                total += 1;
                                next_dy = -next_dy;
                            }
                        }
                    }
                }
                if p3.y == y {
                    if next_dy > 0 && total > 0 {
                        total -= 1;
                        next_dy = -1;
                    }
                    if (p3.y < p2.y
                        || (p3.y == p2.y && (p3.y < p1.y || (p3.y == p1.y && p3.y < p0.y))))
                        && total < 3
                    {
                        x[total] = p3.x;
                        if next_dy < 0 {
                            dy[total] = -1;
                            total += 1;
                            next_dy = 1;
                        }
                    }
                }
                let end_dy = if y >= p3.y { 1 } else { -1 };
                if next_dy != end_dy {
                    if total > 0 {
                        total -= 1;
                    } else {
                        if (p3.y - y).abs() < (p0.y - y).abs() {
                            x[total] = p3.x;
                        }
                        dy[total] = next_dy;
                        total += 1;
                    }
                }
                for (&x, &direction) in x.iter().zip(&dy).take(total) {
                    crossings.push(Intersection { x, direction });
                }
            }
        }
        crossings
    }

    /// Grows `bounds` to the true extent of the edge, interior extrema
    /// included.
    pub fn bound(&self, bounds: &mut Box2D<f64>) {
        match self.segment {
            Segment::Linear(s) => {
                include_point(bounds, s.from);
                include_point(bounds, s.to);
            }
            Segment::Quadratic(s) => {
                include_point(bounds, s.from);
                include_point(bounds, s.to);
                let bot = (s.ctrl - s.from) - (s.to - s.ctrl);
                if bot.x != 0.0 {
                    let param = (s.ctrl.x - s.from.x) / bot.x;
                    if param > 0.0 && param < 1.0 {
                        include_point(bounds, self.point(param));
                    }
                }
                if bot.y != 0.0 {
                    let param = (s.ctrl.y - s.from.y) / bot.y;
                    if param > 0.0 && param < 1.0 {
                        include_point(bounds, self.point(param));
                    }
                }
            }
            Segment::Cubic(s) => {
                include_point(bounds, s.from);
                include_point(bounds, s.to);
                let a0 = s.ctrl1 - s.from;
                let a1 = (s.ctrl2 - s.ctrl1 - a0) * 2.0;
                let a2 = (s.to - s.from) - (s.ctrl2 - s.ctrl1) * 3.0;
                let extrema = solve_quadratic(a2.x, a1.x, a0.x)
                    .into_iter()
                    .chain(solve_quadratic(a2.y, a1.y, a0.y));
                for param in extrema {
                    if param > 0.0 && param < 1.0 {
                        include_point(bounds, self.point(param));
                    }
                }
            }
        }
    }

    /// Flips the direction of the edge in place.
    pub fn reverse(&mut self) {
        match &mut self.segment {
            Segment::Linear(s) => std::mem::swap(&mut s.from, &mut s.to),
            Segment::Quadratic(s) => std::mem::swap(&mut s.from, &mut s.to),
            Segment::Cubic(s) => {
                std::mem::swap(&mut s.from, &mut s.to);
                std::mem::swap(&mut s.ctrl1, &mut s.ctrl2);
            }
        }
    }

    /// Moves the start point, adjusting the adjacent control point so the
    /// start tangent keeps its direction.
    pub fn move_start_point(&mut self, to: Point2) {
        match &mut self.segment {
            Segment::Linear(s) => s.from = to,
            Segment::Quadratic(s) => {
                let orig_s_dir = s.from - s.ctrl;
                let orig_p1 = s.ctrl;
                s.ctrl += (s.to - s.ctrl)
                    * ((s.from - s.ctrl).cross(to - s.from) / (s.from - s.ctrl).cross(s.to - s.ctrl));
                s.from = to;
                // Keep the curve from flipping over.
                if orig_s_dir.dot(s.from - s.ctrl) < 0.0 {
                    s.ctrl = orig_p1;
                }
            }
            Segment::Cubic(s) => {
                s.ctrl1 += to - s.from;
                s.from = to;
            }
        }
    }

    /// Moves the end point, adjusting the adjacent control point so the end
    /// tangent keeps its direction.
    pub fn move_end_point(&mut self, to: Point2) {
        match &mut self.segment {
            Segment::Linear(s) => s.to = to,
            Segment::Quadratic(s) => {
                let orig_e_dir = s.to - s.ctrl;
                let orig_p1 = s.ctrl;
                s.ctrl += (s.from - s.ctrl)
                    * ((s.to - s.ctrl).cross(to - s.to) / (s.to - s.ctrl).cross(s.from - s.ctrl));
                s.to = to;
                if orig_e_dir.dot(s.to - s.ctrl) < 0.0 {
                    s.ctrl = orig_p1;
                }
            }
            Segment::Cubic(s) => {
                s.ctrl2 += to - s.to;
                s.to = to;
            }
        }
    }

    /// Splits the edge into three edges of the same kind covering
    /// `[0, 1/3]`, `[1/3, 2/3]` and `[2/3, 1]`.
    pub fn split_in_thirds(&self) -> [EdgeSegment; 3] {
        const THIRD: f64 = 1.0 / 3.0;
        const TWO_THIRDS: f64 = 2.0 / 3.0;
        let a = self.point(THIRD);
        let b = self.point(TWO_THIRDS);
        match self.segment {
            Segment::Linear(s) => [
                self.with_segment(Segment::Linear(LineSegment { from: s.from, to: a })),
                self.with_segment(Segment::Linear(LineSegment { from: a, to: b })),
                self.with_segment(Segment::Linear(LineSegment { from: b, to: s.to })),
            ],
            Segment::Quadratic(s) => [
                self.with_segment(Segment::Quadratic(QuadraticBezierSegment {
                    from: s.from,
                    ctrl: s.from.lerp(s.ctrl, THIRD),
                    to: a,
                })),
                self.with_segment(Segment::Quadratic(QuadraticBezierSegment {
                    from: a,
                    ctrl: s
                        .from
                        .lerp(s.ctrl, 5.0 / 9.0)
                        .lerp(s.ctrl.lerp(s.to, 4.0 / 9.0), 0.5),
                    to: b,
                })),
                self.with_segment(Segment::Quadratic(QuadraticBezierSegment {
                    from: b,
                    ctrl: s.ctrl.lerp(s.to, TWO_THIRDS),
                    to: s.to,
                })),
            ],
            Segment::Cubic(s) => {
                let (p0, p1, p2, p3) = (s.from, s.ctrl1, s.ctrl2, s.to);
                [
                    self.with_segment(Segment::Cubic(CubicBezierSegment {
                        from: p0,
                        ctrl1: if p0 == p1 { p0 } else { p0.lerp(p1, THIRD) },
                        ctrl2: p0.lerp(p1, THIRD).lerp(p1.lerp(p2, THIRD), THIRD),
                        to: a,
                    })),
                    self.with_segment(Segment::Cubic(CubicBezierSegment {
                        from: a,
                        ctrl1: p0
                            .lerp(p1, THIRD)
                            .lerp(p1.lerp(p2, THIRD), THIRD)
                            .lerp(p1.lerp(p2, THIRD).lerp(p2.lerp(p3, THIRD), THIRD), TWO_THIRDS),
                        ctrl2: p0
                            .lerp(p1, TWO_THIRDS)
                            .lerp(p1.lerp(p2, TWO_THIRDS), TWO_THIRDS)
                            .lerp(
                                p1.lerp(p2, TWO_THIRDS).lerp(p2.lerp(p3, TWO_THIRDS), TWO_THIRDS),
                                THIRD,
                            ),
                        to: b,
                    })),
                    self.with_segment(Segment::Cubic(CubicBezierSegment {
                        from: b,
                        ctrl1: p1.lerp(p2, TWO_THIRDS).lerp(p2.lerp(p3, TWO_THIRDS), TWO_THIRDS),
                        ctrl2: if p2 == p3 { p3 } else { p2.lerp(p3, TWO_THIRDS) },
                        to: p3,
                    })),
                ]
            }
        }
    }

    /// The same curve as a cubic. Lines and cubics are returned unchanged.
    pub fn convert_to_cubic(&self) -> EdgeSegment {
        match self.segment {
            Segment::Quadratic(s) => self.with_segment(Segment::Cubic(CubicBezierSegment {
                from: s.from,
                ctrl1: s.from.lerp(s.ctrl, 2.0 / 3.0),
                ctrl2: s.ctrl.lerp(s.to, 1.0 / 3.0),
                to: s.to,
            })),
            _ => *self,
        }
    }

    /// Nudges the control point next to `end` off the tangent so the edge no
    /// longer meets its neighbour at a perfect cusp. Quadratics are promoted
    /// to cubics first; lines are left alone.
    pub fn deconverge(&mut self, end: EdgeEnd, amount: f64) {
        match self.segment {
            Segment::Linear(_) => return,
            Segment::Quadratic(_) => *self = self.convert_to_cubic(),
            Segment::Cubic(_) => {}
        }
        let param = match end {
            EdgeEnd::Start => 0.0,
            EdgeEnd::End => 1.0,
        };
        let dir = self.direction(param);
        let normal = dir.orthonormal(true, false);
        let h = (self.direction_change(param) - dir).dot(normal);
        let offset = normal * (sign(h) as f64 * h.abs().sqrt());
        if let Segment::Cubic(s) = &mut self.segment {
            match end {
                EdgeEnd::Start => s.ctrl1 += (dir + offset) * amount,
                EdgeEnd::End => s.ctrl2 -= (dir - offset) * amount,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lyon_geom::point;
    use proptest::prelude::*;

    const W: EdgeColor = EdgeColor::WHITE;

    fn close(a: Point2, b: Point2) -> bool {
        (a - b).length() < 1e-9
    }

    fn quad() -> EdgeSegment {
        EdgeSegment::quadratic(point(0.0, 0.0), point(1.0, 2.0), point(2.0, 0.0), W)
    }

    fn cubic() -> EdgeSegment {
        EdgeSegment::cubic(point(0.0, 0.0), point(0.0, 2.0), point(3.0, 2.0), point(3.0, 0.0), W)
    }

    #[test]
    fn degenerate_quadratic_becomes_line() {
        let e = EdgeSegment::quadratic(point(0.0, 0.0), point(1.0, 1.0), point(2.0, 2.0), W);
        assert!(matches!(e.segment, Segment::Linear(_)));
    }

    #[test]
    fn elevated_quadratic_becomes_quadratic() {
        let e = EdgeSegment::cubic(point(0.0, 0.0), point(2.0, 4.0), point(4.0, 4.0), point(6.0, 0.0), W);
        assert_eq!(
            e.segment,
            Segment::Quadratic(QuadraticBezierSegment {
                from: point(0.0, 0.0),
                ctrl: point(3.0, 6.0),
                to: point(6.0, 0.0),
            })
        );
        let e = EdgeSegment::cubic(point(0.0, 0.0), point(0.0, 3.0), point(3.0, 3.0), point(3.0, 0.0), W);
        assert!(matches!(e.segment, Segment::Cubic(_)));
    }

    #[test]
    fn quadratic_to_cubic_keeps_the_curve() {
        let q = quad();
        let c = q.convert_to_cubic();
        assert!(matches!(c.segment, Segment::Cubic(_)));
        for t in [0.0, 0.25, 0.5, 0.9, 1.0] {
            assert!(close(q.point(t), c.point(t)));
        }
    }

    #[test]
    fn collinear_cubic_becomes_line() {
        let e = EdgeSegment::cubic(point(0.0, 0.0), point(1.0, 0.0), point(2.0, 0.0), point(3.0, 0.0), W);
        assert_eq!(e.segment, Segment::Linear(LineSegment { from: point(0.0, 0.0), to: point(3.0, 0.0) }));
    }

    #[test]
    fn zero_derivative_falls_back_to_chord() {
        let e = EdgeSegment::new(
            Segment::Cubic(CubicBezierSegment {
                from: point(0.0, 0.0),
                ctrl1: point(0.0, 0.0),
                ctrl2: point(1.0, 1.0),
                to: point(2.0, 0.0),
            }),
            W,
        );
        assert_eq!(e.direction(0.0), Vector2::new(1.0, 1.0));
    }

    #[test]
    fn line_distance_sign_and_param() {
        let e = EdgeSegment::line(point(0.0, 0.0), point(1.0, 0.0), W);
        let (d, t) = e.signed_distance(point(0.5, 0.5));
        assert_eq!(d.distance, -0.5);
        assert_eq!(d.dot, 0.0);
        assert_eq!(t, 0.5);
        let (d, _) = e.signed_distance(point(0.5, -0.25));
        assert_eq!(d.distance, 0.25);
        let (d, t) = e.signed_distance(point(2.0, 0.0));
        assert_eq!(d.distance.abs(), 1.0);
        assert_eq!(t, 2.0);
        assert_eq!(d.dot, 1.0);
    }

    #[test]
    fn quadratic_distance_at_apex() {
        // Apex of the curve is (1, 1).
        let (d, t) = quad().signed_distance(point(1.0, 3.0));
        assert!((d.distance.abs() - 2.0).abs() < 1e-9);
        assert!((t - 0.5).abs() < 1e-9);
        let (inside, _) = quad().signed_distance(point(1.0, 0.5));
        assert_eq!(inside.distance.signum(), -d.distance.signum());
    }

    #[test]
    fn cubic_distance_matches_sampled_minimum() {
        let e = cubic();
        let origin = point(1.5, 3.0);
        let (d, t) = e.signed_distance(origin);
        let sampled = (0..=1000)
            .map(|i| (e.point(i as f64 / 1000.0) - origin).length())
            .fold(f64::MAX, f64::min);
        assert!((d.distance.abs() - sampled).abs() < 1e-4);
        assert!((0.0..=1.0).contains(&t));
    }

    #[test]
    fn pseudo_distance_extends_past_the_end() {
        let e = EdgeSegment::line(point(0.0, 0.0), point(1.0, 0.0), W);
        let origin = point(3.0, 1.0);
        let (mut d, t) = e.signed_distance(origin);
        assert!(t > 1.0);
        e.distance_to_pseudo_distance(&mut d, origin, t);
        assert_eq!(d.distance, -1.0);
        assert_eq!(d.dot, 0.0);
    }

    #[test]
    fn quadratic_bounds_cover_the_apex() {
        let mut bounds = Box2D::new(point(f64::MAX, f64::MAX), point(-f64::MAX, -f64::MAX));
        quad().bound(&mut bounds);
        assert_eq!(bounds.min, point(0.0, 0.0));
        assert!((bounds.max.y - 1.0).abs() < 1e-12);
        assert_eq!(bounds.max.x, 2.0);
    }

    #[test]
    fn cubic_bounds_cover_the_extremum() {
        let mut bounds = Box2D::new(point(f64::MAX, f64::MAX), point(-f64::MAX, -f64::MAX));
        cubic().bound(&mut bounds);
        assert!((bounds.max.y - 1.5).abs() < 1e-12);
    }

    #[test]
    fn scanline_through_a_line() {
        let up = EdgeSegment::line(point(0.0, 0.0), point(0.0, 2.0), W);
        let crossings = up.scanline_intersections(1.0);
        assert_eq!(crossings.len(), 1);
        assert_eq!(crossings[0].x, 0.0);
        assert_eq!(crossings[0].direction, 1);
        assert!(up.scanline_intersections(2.0).is_empty());
        assert_eq!(up.scanline_intersections(0.0).len(), 1);
    }

    #[test]
    fn scanline_through_an_arch() {
        let crossings = quad().scanline_intersections(0.5);
        assert_eq!(crossings.len(), 2);
        assert_eq!(crossings[0].direction, 1);
        assert_eq!(crossings[1].direction, -1);
        assert!(crossings[0].x < crossings[1].x);
        assert!(quad().scanline_intersections(1.5).is_empty());

        let crossings = cubic().scanline_intersections(0.75);
        assert_eq!(crossings.len(), 2);
        assert_eq!(crossings[0].direction + crossings[1].direction, 0);
    }

    #[test]
    fn reverse_swaps_endpoints() {
        let mut e = cubic();
        e.reverse();
        assert_eq!(e.start(), point(3.0, 0.0));
        assert_eq!(e.end(), point(0.0, 0.0));
        assert_eq!(e.control_points()[1], point(3.0, 2.0));
    }

    #[test]
    fn moving_quadratic_start_keeps_tangent() {
        let mut e = quad();
        let before = e.direction(0.0).normalized(false);
        e.move_start_point(point(0.1, 0.0));
        assert_eq!(e.start(), point(0.1, 0.0));
        assert_eq!(e.end(), point(2.0, 0.0));
        let after = e.direction(0.0).normalized(false);
        assert!(before.cross(after).abs() < 1e-9);
    }

    #[test]
    fn deconverge_promotes_quadratic() {
        let mut e = quad();
        let start = e.start();
        e.deconverge(EdgeEnd::End, 1e-6);
        assert!(matches!(e.segment, Segment::Cubic(_)));
        assert_eq!(e.start(), start);
        assert!(close(e.end(), point(2.0, 0.0)));
    }

    #[test]
    fn deconverge_leaves_lines_alone() {
        let mut e = EdgeSegment::line(point(0.0, 0.0), point(2.0, 1.0), W);
        let before = e;
        e.deconverge(EdgeEnd::Start, 1e-6);
        e.deconverge(EdgeEnd::End, 1e-6);
        assert_eq!(e, before);
    }

    #[test]
    fn line_length() {
        assert_eq!(EdgeSegment::line(point(0.0, 0.0), point(3.0, 4.0), W).length(), 5.0);
        let q = quad();
        let estimate = (0..1000)
            .map(|i| (q.point((i + 1) as f64 / 1000.0) - q.point(i as f64 / 1000.0)).length())
            .sum::<f64>();
        assert!((q.length() - estimate).abs() < 1e-4);
    }

    fn any_point() -> impl Strategy<Value = Point2> {
        (-100.0f64..100.0, -100.0f64..100.0).prop_map(|(x, y)| point(x, y))
    }

    fn any_edge() -> impl Strategy<Value = EdgeSegment> {
        prop_oneof![
            (any_point(), any_point()).prop_map(|(a, b)| EdgeSegment::new(
                Segment::Linear(LineSegment { from: a, to: b }),
                W
            )),
            (any_point(), any_point(), any_point()).prop_map(|(a, b, c)| EdgeSegment::new(
                Segment::Quadratic(QuadraticBezierSegment { from: a, ctrl: b, to: c }),
                W
            )),
            (any_point(), any_point(), any_point(), any_point()).prop_map(|(a, b, c, d)| {
                EdgeSegment::new(
                    Segment::Cubic(CubicBezierSegment { from: a, ctrl1: b, ctrl2: c, to: d }),
                    W,
                )
            }),
        ]
    }

    proptest! {
        #[test]
        fn endpoints_are_reproduced(edge in any_edge()) {
            let points = edge.control_points();
            prop_assert_eq!(edge.point(0.0), points[0]);
            prop_assert_eq!(edge.point(1.0), points[points.len() - 1]);
        }

        #[test]
        fn thirds_chain_and_match_the_original(edge in any_edge()) {
            let [a, b, c] = edge.split_in_thirds();
            prop_assert!(close(a.start(), edge.start()));
            prop_assert!(close(a.end(), edge.point(1.0 / 3.0)));
            prop_assert!(close(b.end(), edge.point(2.0 / 3.0)));
            prop_assert!(close(c.end(), edge.end()));
            prop_assert_eq!(a.end(), b.start());
            prop_assert_eq!(b.end(), c.start());
            for (part, offset) in [(a, 0.0), (b, 1.0), (c, 2.0)] {
                let t = (offset + 0.5) / 3.0;
                prop_assert!((part.point(0.5) - edge.point(t)).length() < 1e-7);
            }
        }
    }
}
