//! Mapping between pixel space and shape space.

use crate::error::{Error, Result};
use crate::math::{Point2, Vector2};
use lyon_geom::{point, vector, Box2D};

/// An axis-aligned scale and translation: `project(p) = scale * (p + translate)`
/// takes shape coordinates to pixel coordinates.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Projection {
    scale: Vector2,
    translate: Vector2,
}

impl Default for Projection {
    fn default() -> Self {
        Self {
            scale: vector(1.0, 1.0),
            translate: vector(0.0, 0.0),
        }
    }
}

impl Projection {
    pub fn new(scale: Vector2, translate: Vector2) -> Result<Self> {
        if scale.x == 0.0 || scale.y == 0.0 {
            return Err(Error::InvalidProjection);
        }
        Ok(Self { scale, translate })
    }

    /// The largest uniform-scale projection that shows all of `bounds` in a
    /// `width` by `height` frame, centred along the axis with room to spare.
    pub fn fit(bounds: &Box2D<f64>, width: usize, height: usize) -> Result<Self> {
        let frame = vector(width as f64, height as f64);
        let dims = bounds.max - bounds.min;
        if !(dims.x > 0.0 && dims.y > 0.0) || !dims.x.is_finite() || !dims.y.is_finite() {
            return Err(Error::InvalidProjection);
        }
        let (l, b) = (bounds.min.x, bounds.min.y);
        let (scale, translate) = if dims.x * frame.y < dims.y * frame.x {
            (
                frame.y / dims.y,
                vector(0.5 * (frame.x / frame.y * dims.y - dims.x) - l, -b),
            )
        } else {
            (
                frame.x / dims.x,
                vector(-l, 0.5 * (frame.y / frame.x * dims.x - dims.y) - b),
            )
        };
        Self::new(vector(scale, scale), translate)
    }

    pub fn scale(&self) -> Vector2 {
        self.scale
    }

    pub fn translate(&self) -> Vector2 {
        self.translate
    }

    /// Shape space to pixel space.
    pub fn project(&self, coord: Point2) -> Point2 {
        point(self.project_x(coord.x), self.project_y(coord.y))
    }

    /// Pixel space to shape space.
    pub fn unproject(&self, coord: Point2) -> Point2 {
        point(self.unproject_x(coord.x), self.unproject_y(coord.y))
    }

    pub fn project_vector(&self, v: Vector2) -> Vector2 {
        vector(self.scale.x * v.x, self.scale.y * v.y)
    }

    pub fn unproject_vector(&self, v: Vector2) -> Vector2 {
        vector(v.x / self.scale.x, v.y / self.scale.y)
    }

    pub fn project_x(&self, x: f64) -> f64 {
        self.scale.x * (x + self.translate.x)
    }

    pub fn project_y(&self, y: f64) -> f64 {
        self.scale.y * (y + self.translate.y)
    }

    pub fn unproject_x(&self, x: f64) -> f64 {
        x / self.scale.x - self.translate.x
    }

    pub fn unproject_y(&self, y: f64) -> f64 {
        y / self.scale.y - self.translate.y
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn zero_scale_is_rejected() {
        assert_eq!(
            Projection::new(vector(0.0, 1.0), vector(0.0, 0.0)),
            Err(Error::InvalidProjection)
        );
    }

    #[test]
    fn projects_into_pixels() {
        let projection = Projection::new(vector(2.0, 4.0), vector(1.0, -1.0)).unwrap();
        assert_eq!(projection.project(point(0.0, 1.0)), point(2.0, 0.0));
        assert_eq!(projection.unproject(point(2.0, 0.0)), point(0.0, 1.0));
        assert_eq!(projection.project_vector(vector(1.0, 1.0)), vector(2.0, 4.0));
        assert_eq!(projection.unproject_vector(vector(2.0, 4.0)), vector(1.0, 1.0));
    }

    #[test]
    fn fit_centres_the_narrow_axis() {
        let bounds = Box2D::new(point(0.0, 0.0), point(1.0, 2.0));
        let projection = Projection::fit(&bounds, 32, 32).unwrap();
        assert_eq!(projection.scale(), vector(16.0, 16.0));
        assert_eq!(projection.project(point(0.0, 0.0)), point(8.0, 0.0));
        assert_eq!(projection.project(point(1.0, 2.0)), point(24.0, 32.0));
        assert!(Projection::fit(&Box2D::new(point(1.0, 1.0), point(1.0, 3.0)), 8, 8).is_err());
    }

    proptest! {
        #[test]
        fn unproject_inverts_project(
            sx in prop_oneof![-100.0f64..-0.01, 0.01f64..100.0],
            sy in prop_oneof![-100.0f64..-0.01, 0.01f64..100.0],
            tx in -100.0f64..100.0,
            ty in -100.0f64..100.0,
            x in -1000.0f64..1000.0,
            y in -1000.0f64..1000.0,
        ) {
            let projection = Projection::new(vector(sx, sy), vector(tx, ty)).unwrap();
            let p = point(x, y);
            let back = projection.unproject(projection.project(p));
            prop_assert!((back - p).length() <= 1e-9 * (1.0 + p.to_vector().length()));
        }
    }
}
