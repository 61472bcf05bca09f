//! msdfgen-core generates signed distance fields from vector outlines,
//! including the multi-channel kind ("MSDFs") that keep sharp corners sharp.
//! It follows
//! [Viktor Chlumský's `msdfgen` utility](https://github.com/Chlumsky/msdfgen/).
//!
//! The usual flow is to build a [`Shape`] (by hand, with a [`ShapeBuilder`],
//! or from `lyon_path` events), run [`prepare_shape`] on it, then call
//! [`generate`] or one of the `generate_*` functions.

pub mod coloring;
pub mod combiner;
pub mod contour;
pub mod distance;
pub mod edge;
mod error;
pub mod generate;
pub mod math;
pub mod path;
pub mod projection;
pub mod scanline;
pub mod selector;
pub mod shape;

pub use self::coloring::{edge_coloring_simple, EdgeColor};
pub use self::combiner::{
    ContourCombiner, OverlappingContourCombiner, ShapeDistanceFinder, SimpleContourCombiner,
};
pub use self::contour::Contour;
pub use self::distance::{Distance, MultiAndTrueDistance, MultiDistance, SignedDistance};
pub use self::edge::{EdgeEnd, EdgeSegment, Segment};
pub use self::error::{Error, Result};
pub use self::generate::{
    distance_sign_correction, generate, generate_msdf, generate_mtsdf, generate_psdf,
    generate_sdf, prepare_shape, Bitmap, DistanceField, GeneratorConfig, ImageType,
};
pub use self::math::{Point2, Vector2};
pub use self::path::ShapeBuilder;
pub use self::projection::Projection;
pub use self::scanline::{FillRule, Scanline};
pub use self::shape::Shape;
