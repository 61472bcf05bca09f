//! Distance values produced by edges, selectors and the contour combiner.

use crate::math::median;
use std::cmp::Ordering;

/// A signed distance, augmented with the alignment between the edge tangent
/// at the point of closest approach and the vector to the measured point.
///
/// When two edges are equally far away (typically two edges meeting at a
/// corner, both closest at their shared endpoint), the one with the smaller
/// `dot` is the one the point lies "in front of" and wins the comparison.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct SignedDistance {
    /// The actual distance
    pub distance: f64,
    /// Absolute cosine between the endpoint tangent and the direction to the
    /// point. Zero when the closest point is interior to the edge.
    pub dot: f64,
}

impl SignedDistance {
    /// Farther away than anything, used to seed minimum searches.
    pub const INFINITE: SignedDistance = SignedDistance {
        distance: -f64::MAX,
        dot: 0.0,
    };

    pub fn new(distance: f64, dot: f64) -> Self {
        Self { distance, dot }
    }
}

impl Default for SignedDistance {
    fn default() -> Self {
        Self::INFINITE
    }
}

impl PartialOrd for SignedDistance {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match self.distance.abs().partial_cmp(&other.distance.abs()) {
            Some(Ordering::Equal) => self.dot.partial_cmp(&other.dot),
            ordering => ordering,
        }
    }
}

/// Per-channel distances of a multi-channel field.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct MultiDistance {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

/// [`MultiDistance`] with the true distance carried in a fourth channel.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct MultiAndTrueDistance {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

/// A distance value the contour combiner can rank.
///
/// Every selector's output collapses to one scalar for the inside/outside
/// decisions; multi-channel values collapse to the median of their colour
/// channels.
pub trait DistanceValue: Copy {
    fn resolve(&self) -> f64;
}

impl DistanceValue for f64 {
    fn resolve(&self) -> f64 {
        *self
    }
}

impl DistanceValue for MultiDistance {
    fn resolve(&self) -> f64 {
        median(self.r, self.g, self.b)
    }
}

impl DistanceValue for MultiAndTrueDistance {
    fn resolve(&self) -> f64 {
        median(self.r, self.g, self.b)
    }
}

/// A distance of any of the supported channel layouts, for callers that
/// pick the image type at runtime.
#[derive(Copy, Clone, PartialEq, Debug)]
pub enum Distance {
    Single(f64),
    Multi(MultiDistance),
    MultiAndTrue(MultiAndTrueDistance),
}

impl Distance {
    /// The scalar this distance stands for: the value itself, or the median
    /// of the colour channels.
    pub fn resolve_to_scalar(&self) -> f64 {
        match self {
            Distance::Single(d) => d.resolve(),
            Distance::Multi(d) => d.resolve(),
            Distance::MultiAndTrue(d) => d.resolve(),
        }
    }
}

impl From<f64> for Distance {
    fn from(d: f64) -> Self {
        Distance::Single(d)
    }
}

impl From<MultiDistance> for Distance {
    fn from(d: MultiDistance) -> Self {
        Distance::Multi(d)
    }
}

impl From<MultiAndTrueDistance> for Distance {
    fn from(d: MultiAndTrueDistance) -> Self {
        Distance::MultiAndTrue(d)
    }
}
