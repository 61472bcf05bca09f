//! Horizontal cross-sections of a shape, used for fill tests.

use std::cmp::Ordering;

/// Rule deciding which winding numbers count as filled.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum FillRule {
    #[default]
    NonZero,
    Odd,
    Positive,
    Negative,
}

impl FillRule {
    /// Whether a point with the given winding number is filled.
    pub fn interpret(self, winding: i32) -> bool {
        match self {
            FillRule::NonZero => winding != 0,
            FillRule::Odd => winding & 1 != 0,
            FillRule::Positive => winding > 0,
            FillRule::Negative => winding < 0,
        }
    }
}

/// A point where an edge crosses a scanline.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Intersection {
    pub x: f64,
    /// Crossing direction (+1 upwards, -1 downwards) as reported by an edge.
    /// Inside a [`Scanline`] this holds the running winding number instead.
    pub direction: i32,
}

/// The crossings of a whole shape with one horizontal line, sorted by x.
#[derive(Clone, Debug, Default)]
pub struct Scanline {
    intersections: Vec<Intersection>,
    last_index: usize,
}

impl Scanline {
    pub fn new(intersections: Vec<Intersection>) -> Self {
        let mut line = Self::default();
        line.set_intersections(intersections);
        line
    }

    /// Replaces the crossings. They are sorted and their directions turned
    /// into running winding numbers.
    pub fn set_intersections(&mut self, intersections: Vec<Intersection>) {
        self.intersections = intersections;
        self.last_index = 0;
        self.intersections
            .sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(Ordering::Equal));
        let mut total_direction = 0;
        for intersection in &mut self.intersections {
            total_direction += intersection.direction;
            intersection.direction = total_direction;
        }
    }

    pub fn intersections(&self) -> &[Intersection] {
        &self.intersections
    }

    /// Index of the last crossing at or before `x`, if any. Remembers the
    /// position so that queries with increasing x are cheap.
    fn move_to(&mut self, x: f64) -> Option<usize> {
        if self.intersections.is_empty() {
            return None;
        }
        let mut index = self.last_index;
        if x < self.intersections[index].x {
            loop {
                if index == 0 {
                    self.last_index = 0;
                    return None;
                }
                index -= 1;
                if x >= self.intersections[index].x {
                    break;
                }
            }
        } else {
            while index + 1 < self.intersections.len() && x >= self.intersections[index + 1].x {
                index += 1;
            }
        }
        self.last_index = index;
        Some(index)
    }

    /// Number of crossings at or left of `x`.
    pub fn count_intersections(&mut self, x: f64) -> usize {
        self.move_to(x).map_or(0, |index| index + 1)
    }

    /// Winding number at `x`.
    pub fn sum_intersections(&mut self, x: f64) -> i32 {
        self.move_to(x)
            .map_or(0, |index| self.intersections[index].direction)
    }

    pub fn filled(&mut self, x: f64, fill_rule: FillRule) -> bool {
        fill_rule.interpret(self.sum_intersections(x))
    }

    /// Total length of `[x_from, x_to]` on which `a` and `b` agree about
    /// being filled.
    pub fn overlap(a: &Scanline, b: &Scanline, x_from: f64, x_to: f64, fill_rule: FillRule) -> f64 {
        let next_x = |line: &Scanline, i: usize| line.intersections.get(i).map_or(x_to, |s| s.x);

        let mut total = 0.0;
        let mut a_inside = false;
        let mut b_inside = false;
        let (mut ai, mut bi) = (0, 0);
        let mut ax = next_x(a, ai);
        let mut bx = next_x(b, bi);
        let mut step = |ax: &mut f64, bx: &mut f64, a_inside: &mut bool, b_inside: &mut bool| {
            let x_next = ax.min(*bx);
            if *ax == x_next && ai < a.intersections.len() {
                *a_inside = fill_rule.interpret(a.intersections[ai].direction);
                ai += 1;
                *ax = next_x(a, ai);
            }
            if *bx == x_next && bi < b.intersections.len() {
                *b_inside = fill_rule.interpret(b.intersections[bi].direction);
                bi += 1;
                *bx = next_x(b, bi);
            }
            x_next
        };

        while ax < x_from || bx < x_from {
            step(&mut ax, &mut bx, &mut a_inside, &mut b_inside);
        }
        let mut x = x_from;
        while ax < x_to || bx < x_to {
            let x_next = ax.min(bx);
            if a_inside == b_inside {
                total += x_next - x;
            }
            step(&mut ax, &mut bx, &mut a_inside, &mut b_inside);
            x = x_next;
        }
        if a_inside == b_inside {
            total += x_to - x;
        }
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_row() -> Scanline {
        Scanline::new(vec![
            Intersection { x: 1.0, direction: -1 },
            Intersection { x: 0.0, direction: 1 },
        ])
    }

    #[test]
    fn crossings_become_running_windings() {
        let line = square_row();
        let windings: Vec<_> = line.intersections().iter().map(|i| (i.x, i.direction)).collect();
        assert_eq!(windings, vec![(0.0, 1), (1.0, 0)]);
    }

    #[test]
    fn fill_queries() {
        let mut line = square_row();
        assert!(!line.filled(-0.5, FillRule::NonZero));
        assert!(line.filled(0.5, FillRule::NonZero));
        assert!(line.filled(0.5, FillRule::Positive));
        assert!(!line.filled(0.5, FillRule::Negative));
        assert!(!line.filled(1.5, FillRule::NonZero));
        // Walking backwards uses the remembered cursor.
        assert!(line.filled(0.0, FillRule::Odd));
        assert_eq!(line.count_intersections(2.0), 2);
        assert_eq!(line.count_intersections(-1.0), 0);
    }

    #[test]
    fn nested_windings() {
        let mut line = Scanline::new(vec![
            Intersection { x: 0.0, direction: 1 },
            Intersection { x: 1.0, direction: 1 },
            Intersection { x: 2.0, direction: -1 },
            Intersection { x: 3.0, direction: -1 },
        ]);
        assert_eq!(line.sum_intersections(1.5), 2);
        assert!(line.filled(1.5, FillRule::NonZero));
        assert!(!line.filled(1.5, FillRule::Odd));
    }

    #[test]
    fn self_overlap_is_total() {
        let line = square_row();
        assert_eq!(Scanline::overlap(&line, &line, -2.0, 3.0, FillRule::NonZero), 5.0);
    }

    #[test]
    fn partial_overlap() {
        let a = square_row();
        let b = Scanline::new(vec![
            Intersection { x: 0.5, direction: 1 },
            Intersection { x: 1.5, direction: -1 },
        ]);
        // Disagreement on [0, 0.5) and [1, 1.5).
        let overlap = Scanline::overlap(&a, &b, -1.0, 2.0, FillRule::NonZero);
        assert!((overlap - 2.0).abs() < 1e-12);
    }

    #[test]
    fn empty_scanline() {
        let mut line = Scanline::default();
        assert_eq!(line.sum_intersections(0.0), 0);
        assert_eq!(Scanline::overlap(&line, &line.clone(), 0.0, 1.0, FillRule::Odd), 1.0);
    }
}
