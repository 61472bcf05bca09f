//! Scalar helpers, vector extensions and the polynomial solvers used by the
//! edge geometry.

use arrayvec::ArrayVec;
use lyon_geom::{Point, Vector};

/// A location in shape space.
pub type Point2 = Point<f64>;
/// A direction or offset in shape space.
pub type Vector2 = Vector<f64>;

/// Real roots of a polynomial of degree three or less.
pub type Roots = ArrayVec<f64, 3>;

pub fn median(a: f64, b: f64, c: f64) -> f64 {
    let min = |a: f64, b: f64| a.min(b);
    let max = |a: f64, b: f64| a.max(b);
    max(min(a, b), min(max(a, b), c))
}

/// Linear interpolation, `a` at `w == 0` and `b` at `w == 1`.
pub fn mix(a: f64, b: f64, w: f64) -> f64 {
    a * (1.0 - w) + b * w
}

/// Clamps `n` to the unit interval.
pub fn clamp_unit(n: f64) -> f64 {
    if (0.0..=1.0).contains(&n) {
        n
    } else if n > 0.0 {
        1.0
    } else {
        0.0
    }
}

/// Returns -1, 0 or 1.
pub fn sign(n: f64) -> i32 {
    (n > 0.0) as i32 - (n < 0.0) as i32
}

/// Returns -1 for negative values and 1 otherwise. Zero maps to 1.
pub fn non_zero_sign(n: f64) -> i32 {
    if n < 0.0 {
        -1
    } else {
        1
    }
}

/// Operations on [`Vector2`] that euclid does not provide in the form the
/// distance computations need.
pub trait VectorExt {
    /// Unit vector in the same direction. A zero vector becomes `(0, 1)`
    /// unless `allow_zero` is set, in which case it stays zero.
    fn normalized(self, allow_zero: bool) -> Self;
    /// The vector rotated by 90 degrees, counter-clockwise when `polarity`
    /// is true.
    fn orthogonal(self, polarity: bool) -> Self;
    /// [`VectorExt::orthogonal`] scaled to unit length, with the same zero
    /// handling as [`VectorExt::normalized`].
    fn orthonormal(self, polarity: bool, allow_zero: bool) -> Self;
    fn is_zero(self) -> bool;
}

impl VectorExt for Vector2 {
    fn normalized(self, allow_zero: bool) -> Self {
        let len = self.length();
        if len != 0.0 {
            Vector2::new(self.x / len, self.y / len)
        } else {
            Vector2::new(0.0, if allow_zero { 0.0 } else { 1.0 })
        }
    }

    fn orthogonal(self, polarity: bool) -> Self {
        if polarity {
            Vector2::new(-self.y, self.x)
        } else {
            Vector2::new(self.y, -self.x)
        }
    }

    fn orthonormal(self, polarity: bool, allow_zero: bool) -> Self {
        let len = self.length();
        if len != 0.0 {
            if polarity {
                Vector2::new(-self.y / len, self.x / len)
            } else {
                Vector2::new(self.y / len, -self.x / len)
            }
        } else {
            let y = if allow_zero { 0.0 } else { 1.0 };
            Vector2::new(0.0, if polarity { y } else { -y })
        }
    }

    fn is_zero(self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }
}

/// Solves `a*x^2 + b*x + c = 0`.
///
/// When `b` dwarfs `a` the equation is treated as linear, since the quadratic
/// formula loses all precision there. An equation with no unknown (all
/// coefficients zero) yields no roots.
pub fn solve_quadratic(a: f64, b: f64, c: f64) -> Roots {
    let mut roots = Roots::new();
    if a == 0.0 || b.abs() > 1e12 * a.abs() {
        if b != 0.0 {
            roots.push(-c / b);
        }
        return roots;
    }
    let dscr = b * b - 4.0 * a * c;
    if dscr > 0.0 {
        let dscr = dscr.sqrt();
        roots.push((-b + dscr) / (2.0 * a));
        roots.push((-b - dscr) / (2.0 * a));
    } else if dscr == 0.0 {
        roots.push(-b / (2.0 * a));
    }
    roots
}

/// Solves the monic cubic `x^3 + a*x^2 + b*x + c = 0`.
fn solve_cubic_normed(a: f64, b: f64, c: f64) -> Roots {
    let mut roots = Roots::new();
    let a2 = a * a;
    let mut q = (a2 - 3.0 * b) / 9.0;
    let r = (a * (2.0 * a2 - 9.0 * b) + 27.0 * c) / 54.0;
    let r2 = r * r;
    let q3 = q * q * q;
    let a = a / 3.0;
    if r2 < q3 {
        let t = (r / q3.sqrt()).clamp(-1.0, 1.0).acos();
        q = -2.0 * q.sqrt();
        roots.push(q * (t / 3.0).cos() - a);
        roots.push(q * ((t + 2.0 * std::f64::consts::PI) / 3.0).cos() - a);
        roots.push(q * ((t - 2.0 * std::f64::consts::PI) / 3.0).cos() - a);
    } else {
        let u = if r < 0.0 { 1.0 } else { -1.0 } * (r.abs() + (r2 - q3).sqrt()).powf(1.0 / 3.0);
        let v = if u == 0.0 { 0.0 } else { q / u };
        roots.push((u + v) - a);
        if u == v || (u - v).abs() < 1e-12 * (u + v).abs() {
            roots.push(-0.5 * (u + v) - a);
        }
    }
    roots
}

/// Solves `a*x^3 + b*x^2 + c*x + d = 0`, falling back to the quadratic when
/// the leading coefficient is negligible next to `b`.
pub fn solve_cubic(a: f64, b: f64, c: f64, d: f64) -> Roots {
    if a != 0.0 {
        let bn = b / a;
        // Past this ratio the normalized form is less accurate than dropping `a`.
        if bn.abs() < 1e6 {
            return solve_cubic_normed(bn, c / a, d / a);
        }
    }
    solve_quadratic(b, c, d)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sorted(mut roots: Roots) -> Vec<f64> {
        roots.sort_by(|a, b| a.total_cmp(b));
        roots.to_vec()
    }

    #[test]
    fn median_picks_the_middle_value() {
        assert_eq!(median(1.0, 2.0, 3.0), 2.0);
        assert_eq!(median(3.0, 1.0, 2.0), 2.0);
        assert_eq!(median(-1.0, 5.0, -1.0), -1.0);
    }

    #[test]
    fn signs() {
        assert_eq!(sign(-3.0), -1);
        assert_eq!(sign(0.0), 0);
        assert_eq!(sign(0.5), 1);
        assert_eq!(non_zero_sign(0.0), 1);
        assert_eq!(non_zero_sign(-0.0), 1);
        assert_eq!(non_zero_sign(-2.0), -1);
    }

    #[test]
    fn zero_vector_normalization() {
        let zero = Vector2::zero();
        assert_eq!(zero.normalized(false), Vector2::new(0.0, 1.0));
        assert_eq!(zero.normalized(true), Vector2::new(0.0, 0.0));
        assert_eq!(zero.orthonormal(false, false), Vector2::new(0.0, -1.0));
        assert_eq!(zero.orthonormal(true, true), Vector2::new(0.0, 0.0));
    }

    #[test]
    fn orthonormal_rotates_a_quarter_turn() {
        let v = Vector2::new(2.0, 0.0);
        assert_eq!(v.orthonormal(true, false), Vector2::new(0.0, 1.0));
        assert_eq!(v.orthonormal(false, false), Vector2::new(0.0, -1.0));
        assert_eq!(v.orthogonal(true), Vector2::new(0.0, 2.0));
    }

    #[test]
    fn quadratic_roots() {
        assert_eq!(sorted(solve_quadratic(1.0, -3.0, 2.0)), vec![1.0, 2.0]);
        assert_eq!(sorted(solve_quadratic(1.0, 2.0, 1.0)), vec![-1.0]);
        assert!(solve_quadratic(1.0, 0.0, 1.0).is_empty());
        assert!(solve_quadratic(0.0, 0.0, 0.0).is_empty());
        assert_eq!(sorted(solve_quadratic(0.0, 2.0, -4.0)), vec![2.0]);
    }

    #[test]
    fn near_linear_quadratic_uses_linear_solve() {
        let roots = solve_quadratic(1e-14, 2.0, -4.0);
        assert_eq!(roots.len(), 1);
        assert_eq!(roots[0], 2.0);
    }

    #[test]
    fn cubic_with_three_roots() {
        // (x - 1)(x - 2)(x - 3)
        let roots = sorted(solve_cubic(1.0, -6.0, 11.0, -6.0));
        assert_eq!(roots.len(), 3);
        for (root, expected) in roots.iter().zip([1.0, 2.0, 3.0]) {
            assert!((root - expected).abs() < 1e-9, "{} vs {}", root, expected);
        }
    }

    #[test]
    fn cubic_with_one_root() {
        // (x - 2)(x^2 + 1)
        let roots = solve_cubic(1.0, -2.0, 1.0, -2.0);
        assert_eq!(roots.len(), 1);
        assert!((roots[0] - 2.0).abs() < 1e-9);
    }

    #[test]
    fn cubic_degrades_to_quadratic() {
        let roots = sorted(solve_cubic(0.0, 1.0, -3.0, 2.0));
        assert_eq!(roots, vec![1.0, 2.0]);
    }

    proptest! {
        #[test]
        fn cubic_roots_satisfy_polynomial(
            a in 0.5f64..4.0,
            b in -10.0f64..10.0,
            c in -10.0f64..10.0,
            d in -10.0f64..10.0,
        ) {
            let roots = solve_cubic(a, b, c, d);
            prop_assert!(!roots.is_empty());
            for x in roots {
                let residual = ((a * x + b) * x + c) * x + d;
                let scale = a.abs() * x.abs().powi(3) + b.abs() * x * x + c.abs() * x.abs() + d.abs();
                prop_assert!(residual.abs() <= 1e-6 * scale + 1e-9, "x = {}, residual = {}", x, residual);
            }
        }
    }
}
