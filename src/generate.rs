//! Distance field generation.
//!
//! A shape is first prepared with [`prepare_shape`] (normalized and edge
//! coloured), then sampled once per pixel centre into a [`Bitmap`]. Rows are
//! sampled in parallel; each worker owns its own [`ShapeDistanceFinder`].
//!
//! The `generate_*` functions store raw shape-space distances, positive
//! inside. [`Bitmap::normalized`] maps them to the usual `[0, 1]` encoding
//! where the edge sits at one half.

use crate::coloring::edge_coloring_simple;
use crate::combiner::{
    ContourCombiner, OverlappingContourCombiner, ShapeDistanceFinder, SimpleContourCombiner,
};
use crate::distance::{MultiAndTrueDistance, MultiDistance};
use crate::error::{Error, Result};
use crate::math::{clamp_unit, median};
use crate::projection::Projection;
use crate::scanline::FillRule;
use crate::selector::{
    EdgeSelector, MultiAndTrueDistanceSelector, MultiDistanceSelector, PseudoDistanceSelector,
    TrueDistanceSelector,
};
use crate::shape::Shape;
use log::{debug, trace};
use lyon_geom::point;
use rayon::prelude::*;

/// The kind of image to generate.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum ImageType {
    /// 1 inside, 0 outside.
    HardMask,
    /// Distance clamped to one range around the edge.
    SoftMask,
    /// True signed distance.
    Sdf,
    /// Signed pseudo-distance.
    Psdf,
    /// Three channels of pseudo-distance, reconstructed by their median.
    #[default]
    Msdf,
    /// An MSDF with the true distance in a fourth channel.
    Mtsdf,
}

/// Everything needed to turn a shape into an image, apart from its size.
#[derive(Clone, Debug, PartialEq)]
pub struct GeneratorConfig {
    pub image_type: ImageType,
    pub fill_rule: FillRule,
    /// Angle in radians above which a joint between edges counts as a corner.
    pub angle_threshold: f64,
    pub seed: u64,
    /// Width of the distance range in shape units.
    pub range: f64,
    pub miter_limit: f64,
    pub projection: Projection,
    /// Resolve overlapping contours by winding instead of taking the nearest
    /// edge of the whole shape.
    pub overlap_support: bool,
    /// Fix pixel signs against a scanline fill test after sampling.
    pub scanline_pass: bool,
    /// Reverse contours whose winding disagrees with their nesting.
    pub orient_contours: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            image_type: ImageType::Msdf,
            fill_rule: FillRule::NonZero,
            angle_threshold: 3.0,
            seed: 0,
            range: 4.0,
            miter_limit: 1.0,
            projection: Projection::default(),
            overlap_support: true,
            scanline_pass: true,
            orient_contours: false,
        }
    }
}

impl GeneratorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_image_type(mut self, image_type: ImageType) -> Self {
        self.image_type = image_type;
        self
    }

    pub fn with_fill_rule(mut self, fill_rule: FillRule) -> Self {
        self.fill_rule = fill_rule;
        self
    }

    pub fn with_angle_threshold(mut self, angle_threshold: f64) -> Self {
        self.angle_threshold = angle_threshold;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_range(mut self, range: f64) -> Self {
        self.range = range;
        self
    }

    pub fn with_miter_limit(mut self, miter_limit: f64) -> Self {
        self.miter_limit = miter_limit;
        self
    }

    pub fn with_projection(mut self, projection: Projection) -> Self {
        self.projection = projection;
        self
    }

    pub fn with_overlap_support(mut self, overlap_support: bool) -> Self {
        self.overlap_support = overlap_support;
        self
    }

    pub fn with_scanline_pass(mut self, scanline_pass: bool) -> Self {
        self.scanline_pass = scanline_pass;
        self
    }

    pub fn with_orient_contours(mut self, orient_contours: bool) -> Self {
        self.orient_contours = orient_contours;
        self
    }

    /// A projection showing the whole of `shape` in a `width` by `height`
    /// image, with half the range of padding around it.
    pub fn framing(&self, shape: &Shape, width: usize, height: usize) -> Result<Projection> {
        let bounds = shape.get_bounds(0.5 * self.range, self.miter_limit, 1);
        Projection::fit(&bounds, width, height)
    }
}

/// A row-major image of `N`-channel pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct Bitmap<T, const N: usize> {
    width: usize,
    height: usize,
    pixels: Vec<[T; N]>,
}

impl<T: Copy + Default, const N: usize> Bitmap<T, N> {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![[T::default(); N]; width * height],
        }
    }
}

impl<T, const N: usize> Bitmap<T, N> {
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Panics if `(x, y)` is outside the image.
    pub fn pixel(&self, x: usize, y: usize) -> &[T; N] {
        &self.pixels[y * self.width + x]
    }

    pub fn pixel_mut(&mut self, x: usize, y: usize) -> &mut [T; N] {
        &mut self.pixels[y * self.width + x]
    }

    pub fn pixels(&self) -> &[[T; N]] {
        &self.pixels
    }

    pub fn rows(&self) -> std::slice::Chunks<'_, [T; N]> {
        self.pixels.chunks(self.width.max(1))
    }

    pub fn rows_mut(&mut self) -> std::slice::ChunksMut<'_, [T; N]> {
        self.pixels.chunks_mut(self.width.max(1))
    }
}

impl<const N: usize> Bitmap<f32, N> {
    /// Maps every raw distance `d` to `d / range + 0.5`.
    pub fn normalized(&self, range: f64) -> Self {
        let pixels = self
            .pixels
            .iter()
            .map(|p| p.map(|d| (d as f64 / range + 0.5) as f32))
            .collect();
        Self {
            width: self.width,
            height: self.height,
            pixels,
        }
    }
}

/// A generated image of whichever channel count its [`ImageType`] needs.
#[derive(Clone, Debug, PartialEq)]
pub enum DistanceField {
    Single(Bitmap<f32, 1>),
    Multi(Bitmap<f32, 3>),
    MultiAndTrue(Bitmap<f32, 4>),
}

impl DistanceField {
    pub fn width(&self) -> usize {
        match self {
            DistanceField::Single(b) => b.width(),
            DistanceField::Multi(b) => b.width(),
            DistanceField::MultiAndTrue(b) => b.width(),
        }
    }

    pub fn height(&self) -> usize {
        match self {
            DistanceField::Single(b) => b.height(),
            DistanceField::Multi(b) => b.height(),
            DistanceField::MultiAndTrue(b) => b.height(),
        }
    }

    pub fn channels(&self) -> usize {
        match self {
            DistanceField::Single(_) => 1,
            DistanceField::Multi(_) => 3,
            DistanceField::MultiAndTrue(_) => 4,
        }
    }
}

/// Readies `shape` for generation: checks that its contours are closed,
/// normalizes it, optionally fixes its orientation and colours its edges.
pub fn prepare_shape(shape: &mut Shape, config: &GeneratorConfig) -> Result<()> {
    shape.validate()?;
    shape.normalize();
    if config.orient_contours {
        shape.orient_contours();
    }
    edge_coloring_simple(shape, config.angle_threshold, config.seed);
    Ok(())
}

fn check_dimensions(width: usize, height: usize) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(Error::InvalidDimensions { width, height });
    }
    Ok(())
}

/// Row of the bitmap that holds the samples taken at image row `y`.
fn output_row(shape: &Shape, height: usize, y: usize) -> usize {
    if shape.inverse_y_axis {
        height - y - 1
    } else {
        y
    }
}

fn sample<'a, S: EdgeSelector<'a>, const N: usize>(
    shape: &'a Shape,
    width: usize,
    height: usize,
    config: &GeneratorConfig,
    to_pixel: impl Fn(S::Distance) -> [f32; N] + Sync,
) -> Result<Bitmap<f32, N>> {
    check_dimensions(width, height)?;
    shape.validate()?;
    debug!(
        "sampling {}x{} field with {} channel(s), overlap support {}",
        width, height, N, config.overlap_support
    );
    let mut bitmap = Bitmap::new(width, height);
    if config.overlap_support {
        sample_rows::<OverlappingContourCombiner<S>, N>(&mut bitmap, shape, &config.projection, &to_pixel);
    } else {
        sample_rows::<SimpleContourCombiner<S>, N>(&mut bitmap, shape, &config.projection, &to_pixel);
    }
    Ok(bitmap)
}

fn sample_rows<'a, C: ContourCombiner<'a>, const N: usize>(
    bitmap: &mut Bitmap<f32, N>,
    shape: &'a Shape,
    projection: &Projection,
    to_pixel: &(impl Fn(<C::Selector as EdgeSelector<'a>>::Distance) -> [f32; N] + Sync),
) {
    let (width, height) = (bitmap.width, bitmap.height);
    bitmap
        .pixels
        .par_chunks_mut(width)
        .enumerate()
        .for_each_init(
            || ShapeDistanceFinder::<C>::new(shape),
            |finder, (row, pixels)| {
                let y = output_row(shape, height, row) as f64 + 0.5;
                for (x, pixel) in pixels.iter_mut().enumerate() {
                    let p = projection.unproject(point(x as f64 + 0.5, y));
                    *pixel = to_pixel(finder.distance(p));
                }
            },
        );
}

/// Samples the true signed distance.
pub fn generate_sdf(shape: &Shape, width: usize, height: usize, config: &GeneratorConfig) -> Result<Bitmap<f32, 1>> {
    sample::<TrueDistanceSelector, 1>(shape, width, height, config, |d: f64| [d as f32])
}

/// Samples the signed pseudo-distance.
pub fn generate_psdf(shape: &Shape, width: usize, height: usize, config: &GeneratorConfig) -> Result<Bitmap<f32, 1>> {
    sample::<PseudoDistanceSelector<'_>, 1>(shape, width, height, config, |d: f64| [d as f32])
}

/// Samples one pseudo-distance per colour channel. The shape should have
/// been coloured first, see [`prepare_shape`].
pub fn generate_msdf(shape: &Shape, width: usize, height: usize, config: &GeneratorConfig) -> Result<Bitmap<f32, 3>> {
    sample::<MultiDistanceSelector<'_>, 3>(shape, width, height, config, |d: MultiDistance| {
        [d.r as f32, d.g as f32, d.b as f32]
    })
}

/// Like [`generate_msdf`], with the true distance in the fourth channel.
pub fn generate_mtsdf(shape: &Shape, width: usize, height: usize, config: &GeneratorConfig) -> Result<Bitmap<f32, 4>> {
    sample::<MultiAndTrueDistanceSelector<'_>, 4>(shape, width, height, config, |d: MultiAndTrueDistance| {
        [d.r as f32, d.g as f32, d.b as f32, d.a as f32]
    })
}

fn generate_hard_mask(shape: &Shape, width: usize, height: usize, config: &GeneratorConfig) -> Result<Bitmap<f32, 1>> {
    check_dimensions(width, height)?;
    shape.validate()?;
    let projection = &config.projection;
    let mut bitmap = Bitmap::new(width, height);
    bitmap
        .pixels
        .par_chunks_mut(width)
        .enumerate()
        .for_each(|(row, pixels)| {
            let y = output_row(shape, height, row) as f64 + 0.5;
            let mut scanline = shape.scanline(projection.unproject_y(y));
            for (x, pixel) in pixels.iter_mut().enumerate() {
                let filled = scanline.filled(projection.unproject_x(x as f64 + 0.5), config.fill_rule);
                *pixel = [if filled { 1.0 } else { 0.0 }];
            }
        });
    Ok(bitmap)
}

/// Generates the image `config.image_type` asks for.
///
/// Distance images hold raw distances and get a sign correction pass when
/// `config.scanline_pass` is set. Masks hold values in `[0, 1]`.
pub fn generate(shape: &Shape, width: usize, height: usize, config: &GeneratorConfig) -> Result<DistanceField> {
    debug!("generating {:?} of {}x{}", config.image_type, width, height);
    let scanline_pass = |bitmap: &mut Bitmap<f32, 1>| {
        if config.scanline_pass {
            distance_sign_correction(bitmap, shape, &config.projection, config.fill_rule);
        }
    };
    let field = match config.image_type {
        ImageType::HardMask => DistanceField::Single(generate_hard_mask(shape, width, height, config)?),
        ImageType::SoftMask => {
            let mut sdf = generate_sdf(shape, width, height, config)?;
            scanline_pass(&mut sdf);
            for pixel in sdf.pixels.iter_mut() {
                pixel[0] = clamp_unit(pixel[0] as f64 / config.range + 0.5) as f32;
            }
            DistanceField::Single(sdf)
        }
        ImageType::Sdf => {
            let mut sdf = generate_sdf(shape, width, height, config)?;
            scanline_pass(&mut sdf);
            DistanceField::Single(sdf)
        }
        ImageType::Psdf => {
            let mut psdf = generate_psdf(shape, width, height, config)?;
            scanline_pass(&mut psdf);
            DistanceField::Single(psdf)
        }
        ImageType::Msdf => {
            let mut msdf = generate_msdf(shape, width, height, config)?;
            if config.scanline_pass {
                distance_sign_correction(&mut msdf, shape, &config.projection, config.fill_rule);
            }
            DistanceField::Multi(msdf)
        }
        ImageType::Mtsdf => {
            let mut mtsdf = generate_mtsdf(shape, width, height, config)?;
            if config.scanline_pass {
                distance_sign_correction(&mut mtsdf, shape, &config.projection, config.fill_rule);
            }
            DistanceField::MultiAndTrue(mtsdf)
        }
    };
    Ok(field)
}

/// Flips the sign of every pixel that disagrees with a scanline fill test of
/// `shape`.
///
/// With three or more channels the median decides. A pixel whose median is
/// exactly zero cannot be judged on its own and follows the majority of its
/// four neighbours instead. A fourth channel is checked on its own.
pub fn distance_sign_correction<const N: usize>(
    bitmap: &mut Bitmap<f32, N>,
    shape: &Shape,
    projection: &Projection,
    fill_rule: FillRule,
) {
    let (width, height) = (bitmap.width, bitmap.height);
    // 1 where the pixel already agreed, -1 where it was flipped, 0 if unknown.
    let mut matches = vec![0i8; width * height];
    let mut ambiguous = 0usize;
    for y in 0..height {
        let row = output_row(shape, height, y);
        let mut scanline = shape.scanline(projection.unproject_y(y as f64 + 0.5));
        for x in 0..width {
            let fill = scanline.filled(projection.unproject_x(x as f64 + 0.5), fill_rule);
            let index = row * width + x;
            let pixel = &mut bitmap.pixels[index];
            if pixel.len() < 3 {
                for d in pixel.iter_mut() {
                    if (*d > 0.0) != fill {
                        *d = -*d;
                    }
                }
                continue;
            }
            let sd = median(pixel[0] as f64, pixel[1] as f64, pixel[2] as f64);
            if sd == 0.0 {
                ambiguous += 1;
            } else if (sd > 0.0) != fill {
                pixel[..3].iter_mut().for_each(|d| *d = -*d);
                matches[index] = -1;
            } else {
                matches[index] = 1;
            }
            if let Some(d) = pixel.get_mut(3) {
                if (*d > 0.0) != fill {
                    *d = -*d;
                }
            }
        }
    }

    if ambiguous == 0 {
        return;
    }
    trace!("resolving {} ambiguous pixel(s) from their neighbours", ambiguous);
    for y in 0..height {
        for x in 0..width {
            let index = y * width + x;
            if matches[index] != 0 {
                continue;
            }
            let mut neighbours = 0i32;
            if x > 0 {
                neighbours += matches[index - 1] as i32;
            }
            if x + 1 < width {
                neighbours += matches[index + 1] as i32;
            }
            if y > 0 {
                neighbours += matches[index - width] as i32;
            }
            if y + 1 < height {
                neighbours += matches[index + width] as i32;
            }
            if neighbours < 0 {
                bitmap.pixels[index][..3].iter_mut().for_each(|d| *d = -*d);
            }
        }
    }
}
