//! Contour combiners turn the per-contour selector results into one distance
//! for the whole shape, and [`ShapeDistanceFinder`] drives them.

use crate::distance::DistanceValue;
use crate::math::Point2;
use crate::selector::EdgeSelector;
use crate::shape::Shape;
use lyon_geom::point;

/// Resolves the distance of a whole shape from the selectors of its
/// contours.
pub trait ContourCombiner<'a> {
    type Selector: EdgeSelector<'a>;

    fn new(shape: &Shape) -> Self;
    fn reset(&mut self, p: Point2);
    /// The selector collecting the edges of contour `contour`.
    fn edge_selector(&mut self, contour: usize) -> &mut Self::Selector;
    fn distance(&self) -> <Self::Selector as EdgeSelector<'a>>::Distance;
}

/// Treats the shape as one set of edges and takes the nearest. Only correct
/// for shapes whose contours do not overlap.
#[derive(Clone, Debug, Default)]
pub struct SimpleContourCombiner<S> {
    shape_selector: S,
}

impl<'a, S: EdgeSelector<'a>> ContourCombiner<'a> for SimpleContourCombiner<S> {
    type Selector = S;

    fn new(_shape: &Shape) -> Self {
        Self {
            shape_selector: S::default(),
        }
    }

    fn reset(&mut self, p: Point2) {
        self.shape_selector.reset(p);
    }

    fn edge_selector(&mut self, _contour: usize) -> &mut S {
        &mut self.shape_selector
    }

    fn distance(&self) -> S::Distance {
        self.shape_selector.distance()
    }
}

/// Resolves overlapping and nested contours by their winding.
///
/// Positively wound contours enclose filled area and negatively wound ones
/// cut holes. Where contours overlap, the edge that actually bounds the
/// filled region must win even if an edge of another contour is nearer.
#[derive(Clone, Debug)]
pub struct OverlappingContourCombiner<S> {
    p: Point2,
    windings: Vec<i32>,
    edge_selectors: Vec<S>,
}

impl<'a, S: EdgeSelector<'a>> ContourCombiner<'a> for OverlappingContourCombiner<S> {
    type Selector = S;

    fn new(shape: &Shape) -> Self {
        Self {
            p: point(0.0, 0.0),
            windings: shape.contours.iter().map(|c| c.winding()).collect(),
            edge_selectors: vec![S::default(); shape.contours.len()],
        }
    }

    fn reset(&mut self, p: Point2) {
        self.p = p;
        for selector in &mut self.edge_selectors {
            selector.reset(p);
        }
    }

    fn edge_selector(&mut self, contour: usize) -> &mut S {
        &mut self.edge_selectors[contour]
    }

    fn distance(&self) -> S::Distance {
        let fresh = || {
            let mut selector = S::default();
            selector.reset(self.p);
            selector
        };
        let mut shape_selector = fresh();
        let mut inner_selector = fresh();
        let mut outer_selector = fresh();
        for (selector, &winding) in self.edge_selectors.iter().zip(&self.windings) {
            let edge_distance = selector.distance().resolve();
            shape_selector.merge(selector);
            if winding > 0 && edge_distance >= 0.0 {
                inner_selector.merge(selector);
            }
            if winding < 0 && edge_distance <= 0.0 {
                outer_selector.merge(selector);
            }
        }

        let shape_distance = shape_selector.distance();
        let inner_distance = inner_selector.distance();
        let outer_distance = outer_selector.distance();
        let inner_scalar = inner_distance.resolve();
        let outer_scalar = outer_distance.resolve();

        let mut distance;
        let winding;
        if inner_scalar >= 0.0 && inner_scalar.abs() <= outer_scalar.abs() {
            distance = inner_distance;
            winding = 1;
            for (selector, _) in self.edge_selectors.iter().zip(&self.windings).filter(|(_, w)| **w > 0) {
                let contour_distance = selector.distance();
                if contour_distance.resolve().abs() < outer_scalar.abs()
                    && contour_distance.resolve() > distance.resolve()
                {
                    distance = contour_distance;
                }
            }
        } else if outer_scalar <= 0.0 && outer_scalar.abs() < inner_scalar.abs() {
            distance = outer_distance;
            winding = -1;
            for (selector, _) in self.edge_selectors.iter().zip(&self.windings).filter(|(_, w)| **w < 0) {
                let contour_distance = selector.distance();
                if contour_distance.resolve().abs() < inner_scalar.abs()
                    && contour_distance.resolve() < distance.resolve()
                {
                    distance = contour_distance;
                }
            }
        } else {
            return shape_distance;
        }

        // Contours of the other winding still win where they are nearer on
        // the same side.
        for (selector, _) in self
            .edge_selectors
            .iter()
            .zip(&self.windings)
            .filter(|(_, w)| **w != winding)
        {
            let contour_distance = selector.distance();
            if contour_distance.resolve() * distance.resolve() >= 0.0
                && contour_distance.resolve().abs() < distance.resolve().abs()
            {
                distance = contour_distance;
            }
        }
        if distance.resolve() == shape_distance.resolve() {
            distance = shape_distance;
        }
        distance
    }
}

/// Answers distance queries against one shape, keeping per-edge caches so
/// that successive nearby queries are cheap.
///
/// A finder holds mutable state for a single query at a time; concurrent
/// queries need one finder each.
pub struct ShapeDistanceFinder<'a, C: ContourCombiner<'a>> {
    shape: &'a Shape,
    combiner: C,
    caches: Vec<Vec<<C::Selector as EdgeSelector<'a>>::Cache>>,
}

impl<'a, C: ContourCombiner<'a>> ShapeDistanceFinder<'a, C> {
    pub fn new(shape: &'a Shape) -> Self {
        Self {
            shape,
            combiner: C::new(shape),
            caches: shape
                .contours
                .iter()
                .map(|c| vec![Default::default(); c.edges.len()])
                .collect(),
        }
    }

    /// Distance from `origin` to the shape.
    pub fn distance(&mut self, origin: Point2) -> <C::Selector as EdgeSelector<'a>>::Distance {
        let shape = self.shape;
        self.combiner.reset(origin);
        for (i, (contour, caches)) in shape.contours.iter().zip(&mut self.caches).enumerate() {
            let edges = &contour.edges[..];
            let (Some(last), Some(first)) = (edges.last(), edges.first()) else {
                continue;
            };
            let selector = self.combiner.edge_selector(i);
            // The last edge comes first, so every edge sees both neighbours.
            let mut prev = if edges.len() >= 2 { &edges[edges.len() - 2] } else { first };
            let mut cur = last;
            for (next, cache) in edges.iter().zip(caches.iter_mut()) {
                selector.add_edge(cache, prev, cur, next);
                prev = cur;
                cur = next;
            }
        }
        self.combiner.distance()
    }

    /// Distance from `origin` to `shape` without keeping any state.
    pub fn one_shot_distance(shape: &'a Shape, origin: Point2) -> <C::Selector as EdgeSelector<'a>>::Distance {
        Self::new(shape).distance(origin)
    }
}
