//! Solving `A x = Z` over rational functions of `s`.
//!
//! Each row is first multiplied through by the distinct denominators of its
//! entries so that the augmented matrix holds polynomials only. Bareiss
//! elimination then keeps every intermediate entry a polynomial (a minor of
//! the input), and the solution comes out as `x_i = num_i / det`.
//!
//! Element values span many decades (teraohm resistors next to the unit
//! incidence entries of voltage sources, `1e-6 * s` next to `1e-3`), so the
//! cleared system is normalised before elimination:
//!
//! 1. `s` is replaced by `k * p`, with `k` the typical root scale of the
//!    entries, so coefficients of different powers become comparable
//! 2. rows and then columns are scaled so their largest entry is near one
//!
//! All scale factors are powers of two and are undone exactly afterwards.
//!
//! For constant kinds of analysis every polynomial is of degree zero and
//! this reduces to fraction-free Gaussian elimination on complex numbers.

use tracing::{debug, trace};

use crate::expr::{Expr, Poly};

use super::system::Matrix;

/// Coefficients this small relative to the products they were computed from
/// are cancellation residue.
const RESIDUE: f64 = 1e-12;

/// Clear the denominators of one row of `[A | Z]`.
fn clear_row(entries: impl Iterator<Item = Expr>) -> Vec<Poly> {
    let entries: Vec<Expr> = entries.collect();

    let mut dens: Vec<Poly> = Vec::new();
    for e in &entries {
        let den = e.denominator();
        if !e.is_zero() && !den.is_constant() && !dens.contains(den) {
            dens.push(den.clone());
        }
    }

    entries
        .iter()
        .map(|e| {
            if e.is_zero() {
                return Poly::zero();
            }
            dens.iter()
                .filter(|d| *d != e.denominator())
                .fold(e.numerator().clone(), |acc, d| &acc * d)
        })
        .collect()
}

/// Power of two nearest to `x`.
fn power_of_two(x: f64) -> f64 {
    if x > 0.0 && x.is_finite() {
        x.log2().round().exp2()
    } else {
        1.0
    }
}

/// Frequency scale of the system: geometric mean of the entries' root scales.
fn frequency_scale(m: &[Vec<Poly>]) -> f64 {
    let (sum, count) = m
        .iter()
        .flatten()
        .filter_map(Poly::root_scale)
        .fold((0.0, 0usize), |(sum, count), k| (sum + k.log2(), count + 1));
    if count == 0 {
        1.0
    } else {
        (sum / count as f64).round().exp2()
    }
}

/// Scale rows, then the first `n` columns, so each has a largest entry near
/// one. Returns the column factors; a row or column of zeros is left as is.
fn equilibrate(m: &mut [Vec<Poly>], n: usize) -> Vec<f64> {
    for row in m.iter_mut() {
        let largest = row[..n].iter().map(Poly::norm).fold(0.0, f64::max);
        let k = power_of_two(1.0 / largest);
        for entry in row.iter_mut() {
            *entry = entry.scale(k.into());
        }
    }
    (0..n)
        .map(|j| {
            let largest = m.iter().map(|row| row[j].norm()).fold(0.0, f64::max);
            let k = power_of_two(1.0 / largest);
            for row in m.iter_mut() {
                row[j] = row[j].scale(k.into());
            }
            k
        })
        .collect()
}

/// One Bareiss update `(a*b - c*d) / prev`, with cancellation residue
/// removed from both the minor and the quotient.
fn bareiss_step(a: &Poly, b: &Poly, c: &Poly, d: &Poly, prev: &Poly) -> Poly {
    let magnitude = a.norm() * b.norm() + c.norm() * d.norm();
    let minor = (&(a * b) - &(c * d)).chop(RESIDUE * magnitude);
    exact_quotient(&minor, prev, magnitude)
}

/// `dividend / divisor` for a division known to be exact; `magnitude` is the
/// size of the terms the dividend was computed from.
fn exact_quotient(dividend: &Poly, divisor: &Poly, magnitude: f64) -> Poly {
    dividend
        .div_exact(divisor)
        .map(|q| q.chop(RESIDUE * magnitude / divisor.norm()))
        .unwrap_or_default()
}

/// Solve `a x = z`, or `None` when `a` is (numerically) singular.
///
/// After normalisation a pivot counts as zero when its norm is at most
/// `pivot_tolerance` times the largest entry of the remaining submatrix.
pub fn solve(a: &Matrix, z: &[Expr], pivot_tolerance: f64) -> Option<Vec<Expr>> {
    let n = a.rows();
    if n == 0 {
        return Some(Vec::new());
    }

    let mut m: Vec<Vec<Poly>> = (0..n)
        .map(|i| clear_row(a.row(i).iter().cloned().chain(std::iter::once(z[i].clone()))))
        .collect();

    let freq = frequency_scale(&m);
    for row in m.iter_mut() {
        for entry in row.iter_mut() {
            *entry = entry.rescale(freq);
        }
    }
    let columns = equilibrate(&mut m, n);
    debug!(size = n, freq, "normalised system");

    let mut prev = Poly::constant(1.0);
    for k in 0..n {
        let mut pivot_row = k;
        let mut best = 0.0;
        let mut largest: f64 = 0.0;
        for (i, row) in m.iter().enumerate().skip(k) {
            let norm = row[k].norm();
            if norm > best {
                best = norm;
                pivot_row = i;
            }
            largest = row[k..n].iter().map(Poly::norm).fold(largest, f64::max);
        }
        if best == 0.0 || best <= pivot_tolerance * largest {
            debug!(column = k, pivot = best, largest, "zero pivot");
            return None;
        }
        m.swap(k, pivot_row);

        let (upper, lower) = m.split_at_mut(k + 1);
        let pivot = &upper[k];
        for row in lower.iter_mut() {
            let factor = row[k].clone();
            for j in k + 1..=n {
                row[j] = bareiss_step(&pivot[k], &row[j], &factor, &pivot[j], &prev);
            }
            row[k] = Poly::zero();
        }
        prev = m[k][k].clone();
        trace!(step = k, degree = ?prev.degree(), "eliminated column");
    }

    let det = m[n - 1][n - 1].clone();
    let mut nums: Vec<Poly> = vec![Poly::zero(); n];
    for i in (0..n).rev() {
        let mut acc = &det * &m[i][n];
        let mut magnitude = det.norm() * m[i][n].norm();
        for j in i + 1..n {
            acc = &acc - &(&m[i][j] * &nums[j]);
            magnitude += m[i][j].norm() * nums[j].norm();
        }
        nums[i] = exact_quotient(&acc.chop(RESIDUE * magnitude), &m[i][i], magnitude);
    }

    let det = det.rescale(1.0 / freq);
    nums.into_iter()
        .zip(columns)
        .map(|(num, col)| Expr::ratio(num.rescale(1.0 / freq).scale(col.into()), det.clone()))
        .collect()
}
