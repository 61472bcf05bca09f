//! Edge colouring: assigning each edge the channels it contributes to, so
//! that the two edges meeting at any sharp corner differ in at least one
//! channel.

use crate::contour::Contour;
use crate::edge::EdgeSegment;
use crate::math::{Vector2, VectorExt};
use crate::shape::Shape;
use log::debug;

bitflags::bitflags! {
    /// The colour channels affected by an edge.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
    pub struct EdgeColor: u8 {
        const BLACK = 0b000;
        const RED = 0b001;
        const GREEN = 0b010;
        const YELLOW = 0b011;
        const BLUE = 0b100;
        const MAGENTA = 0b101;
        const CYAN = 0b110;
        const WHITE = 0b111;
    }
}

impl Default for EdgeColor {
    fn default() -> Self {
        EdgeColor::WHITE
    }
}

impl EdgeColor {
    /// Moves to another two-channel colour, consuming bits of `seed`.
    ///
    /// From black or white one of cyan, magenta or yellow is picked by
    /// `seed % 3`. Otherwise the colour is rotated by one or two channels
    /// depending on the lowest bit of `seed`.
    pub fn switch(self, seed: &mut u64) -> Self {
        if self == EdgeColor::BLACK || self == EdgeColor::WHITE {
            const START: [EdgeColor; 3] = [EdgeColor::CYAN, EdgeColor::MAGENTA, EdgeColor::YELLOW];
            let color = START[(*seed % 3) as usize];
            *seed /= 3;
            return color;
        }
        let shifted = self.bits() << (1 + (*seed & 1) as u32);
        *seed >>= 1;
        EdgeColor::from_bits_truncate(shifted | shifted >> 3) & EdgeColor::WHITE
    }

    /// Like [`EdgeColor::switch`], but if the current colour shares exactly
    /// one channel with `banned`, moves to the colour made of the other two.
    pub fn switch_banned(self, seed: &mut u64, banned: EdgeColor) -> Self {
        let combined = self & banned;
        if combined == EdgeColor::RED || combined == EdgeColor::GREEN || combined == EdgeColor::BLUE {
            return combined ^ EdgeColor::WHITE;
        }
        self.switch(seed)
    }
}

fn is_corner(a_dir: Vector2, b_dir: Vector2, cross_threshold: f64) -> bool {
    // A turn of more than 90 degrees (dot) or more than the threshold (cross).
    a_dir.dot(b_dir) <= 0.0 || a_dir.cross(b_dir).abs() > cross_threshold
}

/// Indices of the edges that start at a corner.
fn find_corners(contour: &Contour, cross_threshold: f64) -> Vec<usize> {
    let mut corners = Vec::new();
    if let Some(last) = contour.edges.last() {
        let mut prev_direction = last.direction(1.0);
        for (i, edge) in contour.edges.iter().enumerate() {
            if is_corner(
                prev_direction.normalized(false),
                edge.direction(0.0).normalized(false),
                cross_threshold,
            ) {
                corners.push(i);
            }
            prev_direction = edge.direction(1.0);
        }
    }
    corners
}

/// Colours the edges of every contour of `shape`.
///
/// Vertices turning by less than `angle_threshold` (radians) are treated as
/// smooth. The same `seed` always produces the same colouring.
pub fn edge_coloring_simple(shape: &mut Shape, angle_threshold: f64, mut seed: u64) {
    let cross_threshold = angle_threshold.sin();
    for (index, contour) in shape.contours.iter_mut().enumerate() {
        let corners = find_corners(contour, cross_threshold);
        debug!(
            "contour {}: {} edges, {} corners",
            index,
            contour.edges.len(),
            corners.len()
        );
        match corners.len() {
            0 => color_smooth(contour),
            1 => color_teardrop(contour, corners[0], &mut seed),
            _ => color_corners(contour, &corners, &mut seed),
        }
    }
}

fn color_smooth(contour: &mut Contour) {
    for edge in &mut contour.edges {
        edge.color = EdgeColor::WHITE;
    }
}

/// A single corner needs three colours spread around the loop, so short
/// contours are split first.
fn color_teardrop(contour: &mut Contour, corner: usize, seed: &mut u64) {
    let first = EdgeColor::WHITE.switch(seed);
    let last = first.switch(seed);
    let colors = [first, first ^ last, last];
    let m = contour.edges.len();

    if m >= 3 {
        for i in 0..m {
            let slot = (3.0 + 2.875 * i as f64 / (m - 1) as f64 - 1.4375 + 0.5) as usize - 2;
            contour.edges[(corner + i) % m].color = colors[slot];
        }
        return;
    }

    // Fewer edges than colours: split each into thirds, starting at the corner.
    let mut parts: [Option<EdgeSegment>; 6] = [None; 6];
    let [a, b, c] = contour.edges[0].split_in_thirds();
    parts[3 * corner] = Some(a);
    parts[1 + 3 * corner] = Some(b);
    parts[2 + 3 * corner] = Some(c);
    let assigned = if m >= 2 {
        let [a, b, c] = contour.edges[1].split_in_thirds();
        parts[3 - 3 * corner] = Some(a);
        parts[4 - 3 * corner] = Some(b);
        parts[5 - 3 * corner] = Some(c);
        vec![colors[0], colors[0], colors[1], colors[1], colors[2], colors[2]]
    } else {
        colors.to_vec()
    };
    contour.edges = parts
        .into_iter()
        .flatten()
        .zip(assigned)
        .map(|(mut edge, color)| {
            edge.color = color;
            edge
        })
        .collect();
}

/// Switches colour at every corner. The colour of the last stretch must
/// also differ from the first, which is already fixed when we get there.
fn color_corners(contour: &mut Contour, corners: &[usize], seed: &mut u64) {
    let m = contour.edges.len();
    let corner_count = corners.len();
    let start = corners[0];
    let mut spline = 0;
    let mut color = EdgeColor::WHITE.switch(seed);
    let initial_color = color;
    for i in 0..m {
        let index = (start + i) % m;
        if spline + 1 < corner_count && corners[spline + 1] == index {
            spline += 1;
            let banned = if spline == corner_count - 1 {
                initial_color
            } else {
                EdgeColor::BLACK
            };
            color = color.switch_banned(seed, banned);
        }
        contour.edges[index].color = color;
    }
}
