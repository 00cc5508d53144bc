//! Polynomials in the Laplace variable `s` with complex coefficients.

use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

use num_complex::Complex64;

pub(crate) const ZERO: Complex64 = Complex64::new(0.0, 0.0);
pub(crate) const ONE: Complex64 = Complex64::new(1.0, 0.0);

/// A polynomial `c0 + c1*s + c2*s^2 + ...`.
///
/// Coefficients are stored in ascending powers of `s` and the highest stored
/// coefficient is never exactly zero. The zero polynomial has no
/// coefficients at all.
///
/// Coefficients of different powers of `s` carry different units, so nothing
/// here compares them against each other. Rounding residue is removed by
/// callers that know where cancellation happens, through [`Poly::chop`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Poly {
    coeffs: Vec<Complex64>,
}

impl Poly {
    /// The zero polynomial.
    pub fn zero() -> Self {
        Self { coeffs: Vec::new() }
    }

    /// A constant polynomial.
    pub fn constant(value: impl Into<Complex64>) -> Self {
        Self::from_coeffs(vec![value.into()])
    }

    /// The polynomial `s`.
    pub fn s() -> Self {
        Self::monomial(ONE, 1)
    }

    /// The polynomial `coeff * s^degree`.
    pub fn monomial(coeff: impl Into<Complex64>, degree: usize) -> Self {
        let mut coeffs = vec![ZERO; degree + 1];
        coeffs[degree] = coeff.into();
        Self::from_coeffs(coeffs)
    }

    /// Build from ascending coefficients, dropping zero high-order terms.
    pub fn from_coeffs(coeffs: Vec<Complex64>) -> Self {
        let mut poly = Self { coeffs };
        poly.trim();
        poly
    }

    /// Build from real ascending coefficients.
    pub fn from_real(coeffs: &[f64]) -> Self {
        Self::from_coeffs(coeffs.iter().map(|&c| Complex64::new(c, 0.0)).collect())
    }

    fn trim(&mut self) {
        while self.coeffs.last() == Some(&ZERO) {
            self.coeffs.pop();
        }
    }

    /// Zero every coefficient whose magnitude is at most `threshold`.
    pub fn chop(&self, threshold: f64) -> Self {
        Self::from_coeffs(
            self.coeffs
                .iter()
                .map(|&c| if c.norm() <= threshold { ZERO } else { c })
                .collect(),
        )
    }

    /// Substitute `s -> k*s`, scaling the coefficient of `s^i` by `k^i`.
    pub fn rescale(&self, k: f64) -> Self {
        let mut factor = 1.0;
        let coeffs = self
            .coeffs
            .iter()
            .map(|&c| {
                let scaled = c * factor;
                factor *= k;
                scaled
            })
            .collect();
        Self::from_coeffs(coeffs)
    }

    /// Geometric mean of the magnitudes of the non-zero roots, rounded to a
    /// power of two so that [`Poly::rescale`] by it is exact.
    ///
    /// `None` when the polynomial has no non-zero roots.
    pub fn root_scale(&self) -> Option<f64> {
        let low = self.zero_root_multiplicity();
        let degree = self.degree()?;
        if degree <= low {
            return None;
        }
        let ratio = self.coeffs[low].norm() / self.leading().norm();
        let log2 = ratio.log2() / (degree - low) as f64;
        log2.is_finite().then(|| log2.round().exp2())
    }

    /// Ascending coefficients.
    pub fn coeffs(&self) -> &[Complex64] {
        &self.coeffs
    }

    pub fn is_zero(&self) -> bool {
        self.coeffs.is_empty()
    }

    /// Degree, or `None` for the zero polynomial.
    pub fn degree(&self) -> Option<usize> {
        self.coeffs.len().checked_sub(1)
    }

    /// True for constants, including zero.
    pub fn is_constant(&self) -> bool {
        self.coeffs.len() <= 1
    }

    /// Coefficient of the highest power (zero for the zero polynomial).
    pub fn leading(&self) -> Complex64 {
        self.coeffs.last().copied().unwrap_or(ZERO)
    }

    /// Coefficient of `s^0`.
    pub fn constant_term(&self) -> Complex64 {
        self.coeffs.first().copied().unwrap_or(ZERO)
    }

    /// Largest coefficient magnitude.
    pub fn norm(&self) -> f64 {
        self.coeffs.iter().map(|c| c.norm()).fold(0.0, f64::max)
    }

    /// Evaluate by Horner's rule.
    pub fn eval(&self, s: Complex64) -> Complex64 {
        self.coeffs.iter().rev().fold(ZERO, |acc, &c| acc * s + c)
    }

    /// Multiply every coefficient by `k`.
    pub fn scale(&self, k: Complex64) -> Self {
        Self::from_coeffs(self.coeffs.iter().map(|&c| c * k).collect())
    }

    /// Scale so the leading coefficient is one.
    pub fn monic(&self) -> Self {
        if self.is_zero() {
            return Self::zero();
        }
        self.scale(ONE / self.leading())
    }

    /// If the polynomial has a single non-zero term, return it.
    pub fn as_monomial(&self) -> Option<(Complex64, usize)> {
        let degree = self.degree()?;
        self.coeffs[..degree]
            .iter()
            .all(|&c| c == ZERO)
            .then(|| (self.leading(), degree))
    }

    /// Number of low-order coefficients that vanish, i.e. the multiplicity
    /// of the root at `s = 0`.
    pub fn zero_root_multiplicity(&self) -> usize {
        self.coeffs.iter().take_while(|&&c| c == ZERO).count()
    }

    /// Divide by `s^k`, discarding the `k` lowest coefficients.
    pub fn shift_down(&self, k: usize) -> Self {
        Self::from_coeffs(self.coeffs.iter().skip(k).copied().collect())
    }

    /// Long division, returning `(quotient, remainder)`.
    ///
    /// Returns `None` when dividing by the zero polynomial.
    pub fn div_rem(&self, divisor: &Poly) -> Option<(Poly, Poly)> {
        let dd = divisor.degree()?;
        if self.coeffs.len() <= dd {
            return Some((Poly::zero(), self.clone()));
        }
        let lead = divisor.leading();
        let mut rem = self.coeffs.clone();
        let mut quot = vec![ZERO; rem.len() - dd];
        for i in (0..quot.len()).rev() {
            let c = rem[i + dd] / lead;
            quot[i] = c;
            for (j, d) in divisor.coeffs.iter().enumerate() {
                rem[i + j] -= c * d;
            }
        }
        rem.truncate(dd);
        Some((Poly::from_coeffs(quot), Poly::from_coeffs(rem)))
    }

    /// Quotient of a division known to be exact; the remainder is rounding
    /// residue and is dropped.
    pub fn div_exact(&self, divisor: &Poly) -> Option<Poly> {
        self.div_rem(divisor).map(|(q, _)| q)
    }

    /// Monic greatest common divisor by the Euclidean algorithm.
    ///
    /// A remainder whose norm falls below `tolerance` relative to the
    /// operands counts as zero. Callers must verify the result before
    /// cancelling with it.
    pub fn gcd(&self, other: &Poly, tolerance: f64) -> Poly {
        let mut a = self.monic();
        let mut b = other.monic();
        if a.degree() < b.degree() {
            std::mem::swap(&mut a, &mut b);
        }
        while !b.is_zero() {
            let scale = a.norm().max(b.norm());
            let r = match a.div_rem(&b) {
                Some((_, r)) => r,
                None => break,
            };
            let r = if r.norm() <= tolerance * scale {
                Poly::zero()
            } else {
                r.monic()
            };
            a = b;
            b = r;
        }
        a.monic()
    }
}

impl From<f64> for Poly {
    fn from(value: f64) -> Self {
        Poly::constant(value)
    }
}

impl From<Complex64> for Poly {
    fn from(value: Complex64) -> Self {
        Poly::constant(value)
    }
}

impl Add<&Poly> for &Poly {
    type Output = Poly;

    fn add(self, rhs: &Poly) -> Poly {
        let n = self.coeffs.len().max(rhs.coeffs.len());
        let coeffs = (0..n)
            .map(|i| {
                self.coeffs.get(i).copied().unwrap_or(ZERO) + rhs.coeffs.get(i).copied().unwrap_or(ZERO)
            })
            .collect();
        Poly::from_coeffs(coeffs)
    }
}

impl Sub<&Poly> for &Poly {
    type Output = Poly;

    fn sub(self, rhs: &Poly) -> Poly {
        let n = self.coeffs.len().max(rhs.coeffs.len());
        let coeffs = (0..n)
            .map(|i| {
                self.coeffs.get(i).copied().unwrap_or(ZERO) - rhs.coeffs.get(i).copied().unwrap_or(ZERO)
            })
            .collect();
        Poly::from_coeffs(coeffs)
    }
}

impl Mul<&Poly> for &Poly {
    type Output = Poly;

    fn mul(self, rhs: &Poly) -> Poly {
        if self.is_zero() || rhs.is_zero() {
            return Poly::zero();
        }
        let mut coeffs = vec![ZERO; self.coeffs.len() + rhs.coeffs.len() - 1];
        for (i, a) in self.coeffs.iter().enumerate() {
            for (j, b) in rhs.coeffs.iter().enumerate() {
                coeffs[i + j] += a * b;
            }
        }
        Poly::from_coeffs(coeffs)
    }
}

impl Neg for &Poly {
    type Output = Poly;

    fn neg(self) -> Poly {
        Poly {
            coeffs: self.coeffs.iter().map(|c| -c).collect(),
        }
    }
}

impl Add for Poly {
    type Output = Poly;

    fn add(self, rhs: Poly) -> Poly {
        &self + &rhs
    }
}

impl Sub for Poly {
    type Output = Poly;

    fn sub(self, rhs: Poly) -> Poly {
        &self - &rhs
    }
}

impl Mul for Poly {
    type Output = Poly;

    fn mul(self, rhs: Poly) -> Poly {
        &self * &rhs
    }
}

impl Neg for Poly {
    type Output = Poly;

    fn neg(self) -> Poly {
        -&self
    }
}

pub(crate) fn fmt_coeff(c: Complex64, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if c.im == 0.0 {
        write!(f, "{}", c.re)
    } else if c.re == 0.0 {
        write!(f, "{}j", c.im)
    } else {
        write!(f, "({}{:+}j)", c.re, c.im)
    }
}

impl fmt::Display for Poly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return write!(f, "0");
        }
        let mut first = true;
        for (power, &c) in self.coeffs.iter().enumerate().rev() {
            if c == ZERO {
                continue;
            }
            if !first {
                write!(f, " + ")?;
            }
            first = false;
            match power {
                0 => fmt_coeff(c, f)?,
                _ => {
                    if c != ONE {
                        fmt_coeff(c, f)?;
                        write!(f, "*")?;
                    }
                    write!(f, "s")?;
                    if power > 1 {
                        write!(f, "^{}", power)?;
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_arithmetic_and_eval() {
        // (1 + s) * (2 - s) = 2 + s - s^2
        let p = Poly::from_real(&[1.0, 1.0]) * Poly::from_real(&[2.0, -1.0]);
        assert_eq!(p, Poly::from_real(&[2.0, 1.0, -1.0]));
        assert_relative_eq!(p.eval(Complex64::new(3.0, 0.0)).re, -4.0);

        let q = &p - &p;
        assert!(q.is_zero());
        assert_eq!(q.degree(), None);
    }

    #[test]
    fn test_div_rem() {
        // s^2 + 3s + 2 = (s + 1)(s + 2)
        let p = Poly::from_real(&[2.0, 3.0, 1.0]);
        let (q, r) = p.div_rem(&Poly::from_real(&[1.0, 1.0])).unwrap();
        assert_eq!(q, Poly::from_real(&[2.0, 1.0]));
        assert!(r.is_zero());

        assert!(p.div_rem(&Poly::zero()).is_none());
    }

    #[test]
    fn test_gcd_finds_common_root() {
        let a = Poly::from_real(&[2.0, 3.0, 1.0]); // (s+1)(s+2)
        let b = Poly::from_real(&[3.0, 4.0, 1.0]); // (s+1)(s+3)
        let g = a.gcd(&b, 1e-9);
        assert_eq!(g.degree(), Some(1));
        assert_relative_eq!(g.constant_term().re, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_gcd_of_coprime_is_one() {
        let a = Poly::from_real(&[1.0, 1.0]);
        let b = Poly::from_real(&[2.0, 1.0]);
        assert_eq!(a.gcd(&b, 1e-9).degree(), Some(0));
    }

    #[test]
    fn test_monomial_helpers() {
        let p = Poly::monomial(4.0, 2);
        assert_eq!(p.as_monomial(), Some((Complex64::new(4.0, 0.0), 2)));
        assert_eq!(p.zero_root_multiplicity(), 2);
        assert_eq!(p.shift_down(2), Poly::constant(4.0));
        assert_eq!(Poly::from_real(&[1.0, 1.0]).as_monomial(), None);
    }

    #[test]
    fn test_small_coefficients_survive() {
        // (1e-3 + 1e-6 s)^2 keeps its 1e-12 s^2 term
        let p = Poly::from_real(&[1e-3, 1e-6]);
        let sq = &p * &p;
        assert_eq!(sq.degree(), Some(2));
        assert_relative_eq!(sq.leading().re, 1e-12, max_relative = 1e-12);

        // A 10 TOhm conductance against a unit entry
        let q = Poly::from_real(&[1.0, 1e-13]);
        assert_eq!(q.degree(), Some(1));
    }

    #[test]
    fn test_chop_zeroes_residue() {
        let p = Poly::from_real(&[1e-18, 2.0, 3e-17]).chop(1e-12);
        assert_eq!(p, Poly::from_real(&[0.0, 2.0]));
        assert_eq!(p.zero_root_multiplicity(), 1);
    }

    #[test]
    fn test_rescale_and_root_scale() {
        // 1e6 + 2e3 s + s^2 has both roots at magnitude 1e3
        let p = Poly::from_real(&[1e6, 2e3, 1.0]);
        let k = p.root_scale().unwrap();
        assert!(k > 500.0 && k < 2000.0);
        assert_eq!(k.log2().fract(), 0.0);

        let scaled = p.rescale(k);
        assert_relative_eq!(scaled.leading().re, k * k);
        assert_eq!(scaled.rescale(1.0 / k), p);

        assert_eq!(Poly::monomial(3.0, 2).root_scale(), None);
        assert_eq!(Poly::constant(3.0).root_scale(), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(Poly::from_real(&[2.0, 0.0, 3.0]).to_string(), "3*s^2 + 2");
        assert_eq!(Poly::s().to_string(), "s");
        assert_eq!(Poly::zero().to_string(), "0");
    }
}
