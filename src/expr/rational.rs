//! Rational functions of `s`, the algebraic value carried through the MNA
//! matrices.

use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

use num_complex::Complex64;

use super::poly::{Poly, ONE, ZERO};

/// Points at which a cancelled expression is compared against the original.
const PROBES: [Complex64; 3] = [
    Complex64::new(0.371, 1.137),
    Complex64::new(-2.113, 0.719),
    Complex64::new(5.303, -3.907),
];

/// Relative agreement required at every probe point.
const PROBE_TOLERANCE: f64 = 1e-6;

/// A rational function `num(s) / den(s)`.
///
/// The denominator is never zero and is kept monic. Common powers of `s` are
/// cancelled eagerly; other common factors only by [`Expr::simplify`].
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    num: Poly,
    den: Poly,
}

impl Expr {
    pub fn zero() -> Self {
        Self {
            num: Poly::zero(),
            den: Poly::constant(ONE),
        }
    }

    pub fn one() -> Self {
        Self::constant(ONE)
    }

    /// A value independent of `s`.
    pub fn constant(value: impl Into<Complex64>) -> Self {
        Self::from_poly(Poly::constant(value))
    }

    /// The Laplace variable itself.
    pub fn s() -> Self {
        Self::from_poly(Poly::s())
    }

    pub fn from_poly(num: Poly) -> Self {
        Self::normalized(num, Poly::constant(ONE))
    }

    /// Build `num / den`, or `None` when `den` is zero.
    pub fn ratio(num: Poly, den: Poly) -> Option<Self> {
        if den.is_zero() {
            return None;
        }
        Some(Self::normalized(num, den))
    }

    fn normalized(num: Poly, den: Poly) -> Self {
        if num.is_zero() {
            return Self::zero();
        }
        let shift = num
            .zero_root_multiplicity()
            .min(den.zero_root_multiplicity());
        let (num, den) = if shift > 0 {
            (num.shift_down(shift), den.shift_down(shift))
        } else {
            (num, den)
        };
        let k = ONE / den.leading();
        Self {
            num: num.scale(k),
            den: den.scale(k),
        }
    }

    pub fn numerator(&self) -> &Poly {
        &self.num
    }

    pub fn denominator(&self) -> &Poly {
        &self.den
    }

    pub fn is_zero(&self) -> bool {
        self.num.is_zero()
    }

    /// True when the value does not depend on `s`.
    pub fn is_constant(&self) -> bool {
        self.num.is_constant() && self.den.is_constant()
    }

    /// The value when it does not depend on `s`.
    pub fn as_constant(&self) -> Option<Complex64> {
        self.is_constant()
            .then(|| self.num.constant_term() / self.den.constant_term())
    }

    /// Evaluate at `s`, or `None` at a pole.
    pub fn eval(&self, s: Complex64) -> Option<Complex64> {
        let d = self.den.eval(s);
        if d == ZERO {
            return None;
        }
        Some(self.num.eval(s) / d)
    }

    /// Substitute a value for `s`, giving a constant expression.
    pub fn substitute(&self, s: Complex64) -> Option<Expr> {
        self.eval(s).map(Expr::constant)
    }

    /// Substitute `s = jω`, the phasor (frequency response) value.
    pub fn at_omega(&self, omega: f64) -> Option<Complex64> {
        self.eval(Complex64::new(0.0, omega))
    }

    pub fn scale(&self, k: impl Into<Complex64>) -> Expr {
        Self::normalized(self.num.scale(k.into()), self.den.clone())
    }

    /// Reciprocal, or `None` for zero.
    pub fn recip(&self) -> Option<Expr> {
        Self::ratio(self.den.clone(), self.num.clone())
    }

    /// Division, or `None` when `rhs` is zero.
    pub fn checked_div(&self, rhs: &Expr) -> Option<Expr> {
        if rhs.is_zero() {
            return None;
        }
        Self::ratio(&self.num * &rhs.den, &self.den * &rhs.num)
    }

    /// Square root, defined for constants and single-term ratios such as
    /// `s^2 * L1 * L2`.
    pub fn sqrt(&self) -> Option<Expr> {
        if let Some(c) = self.as_constant() {
            return Some(Expr::constant(c.sqrt()));
        }
        let (cn, dn) = self.num.as_monomial()?;
        let (cd, dd) = self.den.as_monomial()?;
        if (dn + dd) % 2 != 0 {
            return None;
        }
        let coeff = (cn / cd).sqrt();
        if dn >= dd {
            Some(Expr::from_poly(Poly::monomial(coeff, (dn - dd) / 2)))
        } else {
            Self::ratio(Poly::constant(coeff), Poly::monomial(ONE, (dd - dn) / 2))
        }
    }

    /// Cancel common factors of numerator and denominator.
    ///
    /// The factors are found in a variable normalised to the denominator's
    /// root scale, so component values far from unity do not skew the
    /// tolerance. The cancellation is only accepted when both divisions leave
    /// a negligible remainder and the result agrees with the original at a
    /// few probe points; otherwise the expression is returned unchanged.
    pub fn simplify(&self, tolerance: f64) -> Expr {
        if self.is_zero() || self.den.is_constant() {
            return self.clone();
        }
        let k = self.den.root_scale().unwrap_or(1.0);
        let num = self.num.rescale(k);
        let den = self.den.rescale(k);

        let g = num.gcd(&den, tolerance);
        if g.degree().unwrap_or(0) == 0 {
            return self.clone();
        }
        let (qn, rn) = match num.div_rem(&g) {
            Some(parts) => parts,
            None => return self.clone(),
        };
        let (qd, rd) = match den.div_rem(&g) {
            Some(parts) => parts,
            None => return self.clone(),
        };
        if rn.norm() > tolerance * num.norm() || rd.norm() > tolerance * den.norm() {
            return self.clone();
        }
        let candidate = match Self::ratio(qn.rescale(1.0 / k), qd.rescale(1.0 / k)) {
            Some(c) => c,
            None => return self.clone(),
        };
        if self.agrees_with(&candidate, k) {
            candidate
        } else {
            self.clone()
        }
    }

    fn agrees_with(&self, other: &Expr, k: f64) -> bool {
        PROBES.iter().all(|&p| match (self.eval(p * k), other.eval(p * k)) {
            (Some(a), Some(b)) => {
                let scale = a.norm().max(b.norm()).max(f64::MIN_POSITIVE);
                (a - b).norm() <= PROBE_TOLERANCE * scale
            }
            _ => true,
        })
    }

    /// Approximate equality of two expressions, checked by evaluation.
    pub fn approx_eq(&self, other: &Expr, tolerance: f64) -> bool {
        PROBES.iter().all(|&p| match (self.eval(p), other.eval(p)) {
            (Some(a), Some(b)) => {
                let scale = a.norm().max(b.norm()).max(1.0);
                (a - b).norm() <= tolerance * scale
            }
            (None, None) => true,
            _ => false,
        })
    }
}

impl Default for Expr {
    fn default() -> Self {
        Self::zero()
    }
}

impl From<f64> for Expr {
    fn from(value: f64) -> Self {
        Expr::constant(value)
    }
}

impl From<Complex64> for Expr {
    fn from(value: Complex64) -> Self {
        Expr::constant(value)
    }
}

impl From<Poly> for Expr {
    fn from(value: Poly) -> Self {
        Expr::from_poly(value)
    }
}

impl Add<&Expr> for &Expr {
    type Output = Expr;

    fn add(self, rhs: &Expr) -> Expr {
        if self.den == rhs.den {
            return Expr::normalized(&self.num + &rhs.num, self.den.clone());
        }
        Expr::normalized(
            &(&self.num * &rhs.den) + &(&rhs.num * &self.den),
            &self.den * &rhs.den,
        )
    }
}

impl Sub<&Expr> for &Expr {
    type Output = Expr;

    fn sub(self, rhs: &Expr) -> Expr {
        self + &(-rhs)
    }
}

impl Mul<&Expr> for &Expr {
    type Output = Expr;

    fn mul(self, rhs: &Expr) -> Expr {
        if self.is_zero() || rhs.is_zero() {
            return Expr::zero();
        }
        Expr::normalized(&self.num * &rhs.num, &self.den * &rhs.den)
    }
}

impl Neg for &Expr {
    type Output = Expr;

    fn neg(self) -> Expr {
        Expr {
            num: -&self.num,
            den: self.den.clone(),
        }
    }
}

impl Add for Expr {
    type Output = Expr;

    fn add(self, rhs: Expr) -> Expr {
        &self + &rhs
    }
}

impl Sub for Expr {
    type Output = Expr;

    fn sub(self, rhs: Expr) -> Expr {
        &self - &rhs
    }
}

impl Mul for Expr {
    type Output = Expr;

    fn mul(self, rhs: Expr) -> Expr {
        &self * &rhs
    }
}

impl Neg for Expr {
    type Output = Expr;

    fn neg(self) -> Expr {
        -&self
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.den.is_constant() {
            if self.num.is_constant() {
                return super::poly::fmt_coeff(self.num.constant_term(), f);
            }
            return write!(f, "{}", self.num);
        }
        write!(f, "({}) / ({})", self.num, self.den)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn c(re: f64) -> Complex64 {
        Complex64::new(re, 0.0)
    }

    #[test]
    fn test_constant_arithmetic() {
        let a = Expr::from(4.0);
        let b = Expr::from(2.0);
        assert_eq!((&a + &b).as_constant(), Some(c(6.0)));
        assert_eq!((&a - &b).as_constant(), Some(c(2.0)));
        assert_eq!((&a * &b).as_constant(), Some(c(8.0)));
        assert_eq!(a.checked_div(&b).unwrap().as_constant(), Some(c(2.0)));
        assert!(a.checked_div(&Expr::zero()).is_none());
    }

    #[test]
    fn test_impedance_of_series_rc() {
        // Z = R + 1/(sC) with R = 10, C = 0.5
        let z = &Expr::from(10.0) + &Expr::s().scale(0.5).recip().unwrap();
        let at = z.eval(c(2.0)).unwrap();
        assert_relative_eq!(at.re, 11.0);
        assert!(z.eval(c(0.0)).is_none());
    }

    #[test]
    fn test_common_powers_of_s_cancel() {
        let e = Expr::ratio(Poly::monomial(3.0, 2), Poly::monomial(1.0, 1)).unwrap();
        assert_eq!(e, Expr::s().scale(3.0));
    }

    #[test]
    fn test_simplify_cancels_common_factor() {
        // (s + 1)(s + 2) / ((s + 1)(s + 3))
        let e = Expr::ratio(
            Poly::from_real(&[2.0, 3.0, 1.0]),
            Poly::from_real(&[3.0, 4.0, 1.0]),
        )
        .unwrap();
        let simple = e.simplify(1e-9);
        assert_eq!(simple.denominator().degree(), Some(1));
        assert!(simple.approx_eq(&e, 1e-9));
    }

    #[test]
    fn test_simplify_at_physical_scale() {
        // (s + 1e3)(s + 2e3) / ((s + 1e3)(s + 3e3)) scaled by an RC of 1e-6
        let e = Expr::ratio(
            Poly::from_real(&[2e6, 3e3, 1.0]).scale(c(1e-6)),
            Poly::from_real(&[3e6, 4e3, 1.0]),
        )
        .unwrap();
        let simple = e.simplify(1e-9);
        assert_eq!(simple.denominator().degree(), Some(1));
        let w = 1.5e3;
        let (a, b) = (e.at_omega(w).unwrap(), simple.at_omega(w).unwrap());
        assert_relative_eq!((a - b).norm() / a.norm(), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_sqrt_of_inductor_product() {
        // sqrt(s*2 * s*8) = 4s
        let z1 = Expr::s().scale(2.0);
        let z2 = Expr::s().scale(8.0);
        let root = (&z1 * &z2).sqrt().unwrap();
        assert!(root.approx_eq(&Expr::s().scale(4.0), 1e-12));

        let not_square = Expr::from_poly(Poly::from_real(&[1.0, 1.0]));
        assert!(not_square.sqrt().is_none());
    }

    #[test]
    fn test_phasor_substitution() {
        // 1/(sC) at omega = 2, C = 0.25 is -2j
        let z = Expr::s().scale(0.25).recip().unwrap();
        let phasor = z.at_omega(2.0).unwrap();
        assert_relative_eq!(phasor.im, -2.0);
        assert_relative_eq!(phasor.re, 0.0);
    }

    #[test]
    fn test_display() {
        assert_eq!(Expr::from(2.5).to_string(), "2.5");
        let e = Expr::ratio(Poly::constant(10.0), Poly::s()).unwrap();
        assert_eq!(e.to_string(), "(10) / (s)");
    }
}
