//! Edge selectors: per-contour accumulators that find the nearest edge (or
//! per channel, the nearest edge of each colour) to a query point.
//!
//! A selector is fed the edges of one contour together with their
//! neighbours, and keeps the best true distance seen so far. The pseudo
//! distance variants additionally keep the tightest pseudo-distance bounds
//! on either side, which is what lets a multi-channel field keep its
//! corners sharp.
//!
//! Selectors are reused between nearby query points. Every edge keeps a
//! small cache of what it measured last time, and [`EdgeSelector::reset`]
//! widens the running bounds by how far the query point moved, so an edge
//! is only measured again when it could possibly win.

use crate::coloring::EdgeColor;
use crate::distance::{DistanceValue, MultiAndTrueDistance, MultiDistance, SignedDistance};
use crate::edge::EdgeSegment;
use crate::math::{non_zero_sign, Point2, Vector2, VectorExt};
use arrayvec::ArrayVec;
use lyon_geom::point;

/// Slack applied to the distance a query point moved between two queries.
pub const DISTANCE_DELTA_FACTOR: f64 = 1.001;

/// Accumulates the distance from one point to a set of edges.
pub trait EdgeSelector<'a>: Default + Clone {
    /// What [`EdgeSelector::distance`] produces.
    type Distance: DistanceValue;
    /// Per-edge memo carried between queries.
    type Cache: Default + Clone;

    /// Prepares for a query at `p`, keeping the previous results as bounds.
    fn reset(&mut self, p: Point2);
    /// Takes `edge` into account. `prev` and `next` are its neighbours in
    /// the contour.
    fn add_edge(
        &mut self,
        cache: &mut Self::Cache,
        prev: &'a EdgeSegment,
        edge: &'a EdgeSegment,
        next: &'a EdgeSegment,
    );
    /// Combines with a selector that has seen a different set of edges.
    fn merge(&mut self, other: &Self);
    fn distance(&self) -> Self::Distance;
}

/// What an edge measured at the last point it was evaluated for.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TrueDistanceCache {
    pub point: Point2,
    pub abs_distance: f64,
}

impl Default for TrueDistanceCache {
    fn default() -> Self {
        Self {
            point: point(0.0, 0.0),
            abs_distance: 0.0,
        }
    }
}

/// Selects the plain Euclidean distance to the nearest edge.
#[derive(Copy, Clone, Debug)]
pub struct TrueDistanceSelector {
    p: Point2,
    min_distance: SignedDistance,
}

impl Default for TrueDistanceSelector {
    fn default() -> Self {
        Self {
            p: point(0.0, 0.0),
            min_distance: SignedDistance::INFINITE,
        }
    }
}

impl<'a> EdgeSelector<'a> for TrueDistanceSelector {
    type Distance = f64;
    type Cache = TrueDistanceCache;

    fn reset(&mut self, p: Point2) {
        let delta = DISTANCE_DELTA_FACTOR * (p - self.p).length();
        self.min_distance.distance += non_zero_sign(self.min_distance.distance) as f64 * delta;
        self.p = p;
    }

    fn add_edge(
        &mut self,
        cache: &mut TrueDistanceCache,
        _prev: &'a EdgeSegment,
        edge: &'a EdgeSegment,
        _next: &'a EdgeSegment,
    ) {
        let delta = DISTANCE_DELTA_FACTOR * (self.p - cache.point).length();
        if cache.abs_distance - delta <= self.min_distance.distance.abs() {
            let (distance, _) = edge.signed_distance(self.p);
            if distance < self.min_distance {
                self.min_distance = distance;
            }
            cache.point = self.p;
            cache.abs_distance = distance.distance.abs();
        }
    }

    fn merge(&mut self, other: &Self) {
        if other.min_distance < self.min_distance {
            self.min_distance = other.min_distance;
        }
    }

    fn distance(&self) -> f64 {
        self.min_distance.distance
    }
}

/// What an edge measured at the last point it was evaluated for, including
/// its pseudo-distances past either end.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PseudoDistanceCache {
    pub point: Point2,
    pub abs_distance: f64,
    pub a_domain_distance: f64,
    pub b_domain_distance: f64,
    pub a_pseudo_distance: f64,
    pub b_pseudo_distance: f64,
}

impl Default for PseudoDistanceCache {
    fn default() -> Self {
        Self {
            point: point(0.0, 0.0),
            abs_distance: 0.0,
            a_domain_distance: 0.0,
            b_domain_distance: 0.0,
            a_pseudo_distance: 0.0,
            b_pseudo_distance: 0.0,
        }
    }
}

/// Replaces `distance` by the perpendicular distance to the line through the
/// endpoint along `edge_dir`, if `ep` lies ahead of that endpoint and the
/// result is strictly closer.
pub fn get_pseudo_distance(distance: &mut f64, ep: Vector2, edge_dir: Vector2) -> bool {
    let ts = ep.dot(edge_dir);
    if ts > 0.0 {
        let pseudo_distance = ep.cross(edge_dir);
        if pseudo_distance.abs() < distance.abs() {
            *distance = pseudo_distance;
            return true;
        }
    }
    false
}

/// The running state of one pseudo-distance channel.
#[derive(Copy, Clone, Debug)]
pub struct PseudoDistanceChannel<'a> {
    min_true_distance: SignedDistance,
    min_negative_pseudo_distance: f64,
    min_positive_pseudo_distance: f64,
    near_edge: Option<&'a EdgeSegment>,
    near_edge_param: f64,
}

impl<'a> Default for PseudoDistanceChannel<'a> {
    fn default() -> Self {
        let min_true_distance = SignedDistance::INFINITE;
        Self {
            min_true_distance,
            min_negative_pseudo_distance: -min_true_distance.distance.abs(),
            min_positive_pseudo_distance: min_true_distance.distance.abs(),
            near_edge: None,
            near_edge_param: 0.0,
        }
    }
}

impl<'a> PseudoDistanceChannel<'a> {
    /// Widens the true distance by `delta` and restarts the pseudo bounds
    /// from it.
    pub fn reset(&mut self, delta: f64) {
        self.min_true_distance.distance +=
            non_zero_sign(self.min_true_distance.distance) as f64 * delta;
        self.min_negative_pseudo_distance = -self.min_true_distance.distance.abs();
        self.min_positive_pseudo_distance = self.min_true_distance.distance.abs();
        self.near_edge = None;
        self.near_edge_param = 0.0;
    }

    /// Whether the edge behind `cache` could improve any bound at `p`.
    pub fn is_edge_relevant(&self, cache: &PseudoDistanceCache, p: Point2) -> bool {
        let delta = DISTANCE_DELTA_FACTOR * (p - cache.point).length();
        let pseudo_relevant = |domain_distance: f64, pseudo_distance: f64| {
            domain_distance > 0.0
                && if pseudo_distance < 0.0 {
                    pseudo_distance + delta >= self.min_negative_pseudo_distance
                } else {
                    pseudo_distance - delta <= self.min_positive_pseudo_distance
                }
        };
        cache.abs_distance - delta <= self.min_true_distance.distance.abs()
            || cache.a_domain_distance.abs() < delta
            || cache.b_domain_distance.abs() < delta
            || pseudo_relevant(cache.a_domain_distance, cache.a_pseudo_distance)
            || pseudo_relevant(cache.b_domain_distance, cache.b_pseudo_distance)
    }

    pub fn add_edge_true_distance(&mut self, edge: &'a EdgeSegment, distance: SignedDistance, param: f64) {
        if distance < self.min_true_distance {
            self.min_true_distance = distance;
            self.near_edge = Some(edge);
            self.near_edge_param = param;
        }
    }

    pub fn add_edge_pseudo_distance(&mut self, distance: f64) {
        if distance <= 0.0 && distance > self.min_negative_pseudo_distance {
            self.min_negative_pseudo_distance = distance;
        }
        if distance >= 0.0 && distance < self.min_positive_pseudo_distance {
            self.min_positive_pseudo_distance = distance;
        }
    }

    pub fn merge(&mut self, other: &Self) {
        if other.min_true_distance < self.min_true_distance {
            self.min_true_distance = other.min_true_distance;
            self.near_edge = other.near_edge;
            self.near_edge_param = other.near_edge_param;
        }
        if other.min_negative_pseudo_distance > self.min_negative_pseudo_distance {
            self.min_negative_pseudo_distance = other.min_negative_pseudo_distance;
        }
        if other.min_positive_pseudo_distance < self.min_positive_pseudo_distance {
            self.min_positive_pseudo_distance = other.min_positive_pseudo_distance;
        }
    }

    /// The pseudo-distance at `p`: the bound on the side of the true
    /// distance, tightened by the nearest edge's own extension.
    pub fn compute_distance(&self, p: Point2) -> f64 {
        let mut min_distance = if self.min_true_distance.distance < 0.0 {
            self.min_negative_pseudo_distance
        } else {
            self.min_positive_pseudo_distance
        };
        if let Some(edge) = self.near_edge {
            let mut distance = self.min_true_distance;
            edge.distance_to_pseudo_distance(&mut distance, p, self.near_edge_param);
            if distance.distance.abs() < min_distance.abs() {
                min_distance = distance.distance;
            }
        }
        min_distance
    }

    pub fn true_distance(&self) -> SignedDistance {
        self.min_true_distance
    }
}

/// An edge measured from a query point.
struct EdgeMeasurement {
    distance: SignedDistance,
    param: f64,
    /// Pseudo-distances past the start and end that improve on `distance`.
    pseudo_distances: ArrayVec<f64, 2>,
}

/// Measures `edge` from `p` and records the result in `cache`.
///
/// A pseudo-distance past an endpoint only counts when `p` lies in that
/// endpoint's domain, the half plane beyond the bisector of the edge and its
/// neighbour there.
fn measure_edge(
    cache: &mut PseudoDistanceCache,
    p: Point2,
    prev: &EdgeSegment,
    edge: &EdgeSegment,
    next: &EdgeSegment,
) -> EdgeMeasurement {
    let (distance, param) = edge.signed_distance(p);
    cache.point = p;
    cache.abs_distance = distance.distance.abs();

    let ap = p - edge.point(0.0);
    let bp = p - edge.point(1.0);
    let a_dir = edge.direction(0.0).normalized(true);
    let b_dir = edge.direction(1.0).normalized(true);
    let prev_dir = prev.direction(1.0).normalized(true);
    let next_dir = next.direction(0.0).normalized(true);
    let add = ap.dot((prev_dir + a_dir).normalized(true));
    let bdd = -bp.dot((b_dir + next_dir).normalized(true));

    let mut pseudo_distances = ArrayVec::new();
    if add > 0.0 {
        let mut pd = distance.distance;
        if get_pseudo_distance(&mut pd, ap, -a_dir) {
            pd = -pd;
            pseudo_distances.push(pd);
        }
        cache.a_pseudo_distance = pd;
    }
    if bdd > 0.0 {
        let mut pd = distance.distance;
        if get_pseudo_distance(&mut pd, bp, b_dir) {
            pseudo_distances.push(pd);
        }
        cache.b_pseudo_distance = pd;
    }
    cache.a_domain_distance = add;
    cache.b_domain_distance = bdd;

    EdgeMeasurement {
        distance,
        param,
        pseudo_distances,
    }
}

/// Selects the pseudo-distance to the nearest edge.
#[derive(Copy, Clone, Debug)]
pub struct PseudoDistanceSelector<'a> {
    p: Point2,
    channel: PseudoDistanceChannel<'a>,
}

impl<'a> Default for PseudoDistanceSelector<'a> {
    fn default() -> Self {
        Self {
            p: point(0.0, 0.0),
            channel: PseudoDistanceChannel::default(),
        }
    }
}

impl<'a> EdgeSelector<'a> for PseudoDistanceSelector<'a> {
    type Distance = f64;
    type Cache = PseudoDistanceCache;

    fn reset(&mut self, p: Point2) {
        let delta = DISTANCE_DELTA_FACTOR * (p - self.p).length();
        self.channel.reset(delta);
        self.p = p;
    }

    fn add_edge(
        &mut self,
        cache: &mut PseudoDistanceCache,
        prev: &'a EdgeSegment,
        edge: &'a EdgeSegment,
        next: &'a EdgeSegment,
    ) {
        if !self.channel.is_edge_relevant(cache, self.p) {
            return;
        }
        let measured = measure_edge(cache, self.p, prev, edge, next);
        self.channel
            .add_edge_true_distance(edge, measured.distance, measured.param);
        for pd in measured.pseudo_distances {
            self.channel.add_edge_pseudo_distance(pd);
        }
    }

    fn merge(&mut self, other: &Self) {
        self.channel.merge(&other.channel);
    }

    fn distance(&self) -> f64 {
        self.channel.compute_distance(self.p)
    }
}

/// Selects a pseudo-distance per colour channel, each over the edges whose
/// colour includes that channel.
#[derive(Copy, Clone, Debug)]
pub struct MultiDistanceSelector<'a> {
    p: Point2,
    r: PseudoDistanceChannel<'a>,
    g: PseudoDistanceChannel<'a>,
    b: PseudoDistanceChannel<'a>,
}

impl<'a> Default for MultiDistanceSelector<'a> {
    fn default() -> Self {
        Self {
            p: point(0.0, 0.0),
            r: PseudoDistanceChannel::default(),
            g: PseudoDistanceChannel::default(),
            b: PseudoDistanceChannel::default(),
        }
    }
}

impl<'a> MultiDistanceSelector<'a> {
    fn channels_for(&mut self, color: EdgeColor) -> impl Iterator<Item = &mut PseudoDistanceChannel<'a>> {
        [
            (EdgeColor::RED, &mut self.r),
            (EdgeColor::GREEN, &mut self.g),
            (EdgeColor::BLUE, &mut self.b),
        ]
        .into_iter()
        .filter(move |(channel, _)| color.intersects(*channel))
        .map(|(_, selector)| selector)
    }

    /// The nearest true distance over all three channels.
    pub fn true_distance(&self) -> SignedDistance {
        let mut distance = self.r.true_distance();
        if self.g.true_distance() < distance {
            distance = self.g.true_distance();
        }
        if self.b.true_distance() < distance {
            distance = self.b.true_distance();
        }
        distance
    }
}

impl<'a> EdgeSelector<'a> for MultiDistanceSelector<'a> {
    type Distance = MultiDistance;
    type Cache = PseudoDistanceCache;

    fn reset(&mut self, p: Point2) {
        let delta = DISTANCE_DELTA_FACTOR * (p - self.p).length();
        self.r.reset(delta);
        self.g.reset(delta);
        self.b.reset(delta);
        self.p = p;
    }

    fn add_edge(
        &mut self,
        cache: &mut PseudoDistanceCache,
        prev: &'a EdgeSegment,
        edge: &'a EdgeSegment,
        next: &'a EdgeSegment,
    ) {
        let p = self.p;
        if !self
            .channels_for(edge.color)
            .any(|channel| channel.is_edge_relevant(cache, p))
        {
            return;
        }
        let measured = measure_edge(cache, p, prev, edge, next);
        for channel in self.channels_for(edge.color) {
            channel.add_edge_true_distance(edge, measured.distance, measured.param);
            for &pd in &measured.pseudo_distances {
                channel.add_edge_pseudo_distance(pd);
            }
        }
    }

    fn merge(&mut self, other: &Self) {
        self.r.merge(&other.r);
        self.g.merge(&other.g);
        self.b.merge(&other.b);
    }

    fn distance(&self) -> MultiDistance {
        MultiDistance {
            r: self.r.compute_distance(self.p),
            g: self.g.compute_distance(self.p),
            b: self.b.compute_distance(self.p),
        }
    }
}

/// [`MultiDistanceSelector`] that also reports the true distance in a
/// fourth channel.
#[derive(Copy, Clone, Debug, Default)]
pub struct MultiAndTrueDistanceSelector<'a> {
    inner: MultiDistanceSelector<'a>,
}

impl<'a> EdgeSelector<'a> for MultiAndTrueDistanceSelector<'a> {
    type Distance = MultiAndTrueDistance;
    type Cache = PseudoDistanceCache;

    fn reset(&mut self, p: Point2) {
        self.inner.reset(p);
    }

    fn add_edge(
        &mut self,
        cache: &mut PseudoDistanceCache,
        prev: &'a EdgeSegment,
        edge: &'a EdgeSegment,
        next: &'a EdgeSegment,
    ) {
        self.inner.add_edge(cache, prev, edge, next);
    }

    fn merge(&mut self, other: &Self) {
        self.inner.merge(&other.inner);
    }

    fn distance(&self) -> MultiAndTrueDistance {
        let multi = self.inner.distance();
        MultiAndTrueDistance {
            r: multi.r,
            g: multi.g,
            b: multi.b,
            a: self.inner.true_distance().distance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const W: EdgeColor = EdgeColor::WHITE;

    /// Clockwise unit square, wound +1.
    fn square(color: [EdgeColor; 4]) -> Vec<EdgeSegment> {
        let p = [point(0.0, 0.0), point(0.0, 1.0), point(1.0, 1.0), point(1.0, 0.0)];
        (0..4)
            .map(|i| EdgeSegment::line(p[i], p[(i + 1) % 4], color[i]))
            .collect()
    }

    fn feed<'a, S: EdgeSelector<'a>>(selector: &mut S, caches: &mut [S::Cache], edges: &'a [EdgeSegment]) {
        let n = edges.len();
        for i in 0..n {
            let prev = &edges[(i + n - 1) % n];
            let next = &edges[(i + 1) % n];
            selector.add_edge(&mut caches[i], prev, &edges[i], next);
        }
    }

    fn query<'a, S: EdgeSelector<'a>>(edges: &'a [EdgeSegment], p: Point2) -> S::Distance {
        let mut selector = S::default();
        let mut caches = vec![S::Cache::default(); edges.len()];
        selector.reset(p);
        feed(&mut selector, &mut caches, edges);
        selector.distance()
    }

    #[test]
    fn pseudo_distance_needs_strict_improvement() {
        let mut d = 2.0;
        assert!(get_pseudo_distance(&mut d, Vector2::new(1.0, 1.0), Vector2::new(1.0, 0.0)));
        assert_eq!(d, 1.0);
        let mut d = 1.0;
        assert!(!get_pseudo_distance(&mut d, Vector2::new(1.0, 1.0), Vector2::new(1.0, 0.0)));
        let mut d = 5.0;
        assert!(!get_pseudo_distance(&mut d, Vector2::new(-1.0, 1.0), Vector2::new(1.0, 0.0)));
    }

    #[test]
    fn true_distance_inside_and_outside() {
        let edges = square([W; 4]);
        let inside = query::<TrueDistanceSelector>(&edges, point(0.5, 0.25));
        assert_eq!(inside, 0.25);
        let outside = query::<TrueDistanceSelector>(&edges, point(2.0, 2.0));
        assert!((outside + 2f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn pseudo_distance_extends_edges_past_corners() {
        let edges = square([W; 4]);
        // Diagonally outside the corner (1, 1), the pseudo-distance is the
        // distance to the nearer extended side.
        let d = query::<PseudoDistanceSelector>(&edges, point(1.5, 2.0));
        assert!((d + 1.0).abs() < 1e-12, "{}", d);
        let inside = query::<PseudoDistanceSelector>(&edges, point(0.5, 0.25));
        assert_eq!(inside, 0.25);
    }

    #[test]
    fn channels_only_see_their_edges() {
        use EdgeColor as C;
        let edges = square([C::CYAN, C::MAGENTA, C::YELLOW, C::MAGENTA]);
        // Near the left side, which has no red.
        let d = query::<MultiDistanceSelector>(&edges, point(0.1, 0.5));
        assert!((d.g - 0.1).abs() < 1e-12);
        assert!((d.b - 0.1).abs() < 1e-12);
        assert!(d.r > 0.1);
        assert!((d.resolve() - 0.1).abs() < 1e-12);
    }

    #[test]
    fn true_channel_is_euclidean() {
        let edges = square([EdgeColor::CYAN, EdgeColor::MAGENTA, EdgeColor::YELLOW, EdgeColor::MAGENTA]);
        let d = query::<MultiAndTrueDistanceSelector>(&edges, point(1.5, 2.0));
        assert!((d.a + (0.25f64 + 1.0).sqrt()).abs() < 1e-12);
        assert!(d.resolve() < 0.0);
    }

    #[test]
    fn reuse_between_queries_matches_fresh_queries() {
        let edges = square([EdgeColor::CYAN, EdgeColor::MAGENTA, EdgeColor::YELLOW, EdgeColor::MAGENTA]);
        let mut selector = MultiDistanceSelector::default();
        let mut caches = vec![PseudoDistanceCache::default(); edges.len()];
        for i in 0..40 {
            let p = point(-0.5 + i as f64 * 0.05, 0.3 + (i % 7) as f64 * 0.1);
            selector.reset(p);
            feed(&mut selector, &mut caches, &edges);
            assert_eq!(selector.distance(), query::<MultiDistanceSelector>(&edges, p));
        }
    }

    #[test]
    fn merge_keeps_the_nearer_edges() {
        let edges = square([W; 4]);
        let p = point(0.5, 0.2);
        let mut caches = vec![PseudoDistanceCache::default(); 4];
        let mut left = PseudoDistanceSelector::default();
        left.reset(p);
        left.add_edge(&mut caches[0], &edges[3], &edges[0], &edges[1]);
        let mut bottom = PseudoDistanceSelector::default();
        bottom.reset(p);
        bottom.add_edge(&mut caches[3], &edges[2], &edges[3], &edges[0]);
        left.merge(&bottom);
        assert!((left.distance() - 0.2).abs() < 1e-12);
    }
}
