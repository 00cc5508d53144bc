//! Independent source values.
//!
//! A source value is a superposition of parts, each belonging to exactly one
//! analysis kind. [`Source::select`] picks out the part a given kind sees.

use std::fmt;

use num_complex::Complex64;

use crate::error::{NodalError, Result};
use crate::expr::{Expr, Poly};
use crate::solver::AnalysisKind;

/// Identifies one independent noise process.
///
/// Sources with different ids are uncorrelated and are solved in separate
/// noise passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NoiseId(pub u32);

impl fmt::Display for NoiseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// One component of a source waveform.
#[derive(Debug, Clone, PartialEq)]
pub enum SourcePart {
    /// Constant for all time
    Dc(f64),
    /// Sinusoid `Re{phasor * exp(j*omega*t)}`
    Ac { phasor: Complex64, omega: f64 },
    /// `value * u(t)`
    Step(f64),
    /// Arbitrary causal transient given by its Laplace transform
    Laplace(Expr),
    /// Noise with a flat amplitude spectral density
    Noise { asd: f64, id: NoiseId },
}

impl SourcePart {
    /// The analysis kind this part is solved in.
    pub fn kind(&self) -> AnalysisKind {
        match self {
            SourcePart::Dc(_) => AnalysisKind::Dc,
            SourcePart::Ac { omega, .. } => AnalysisKind::Ac { omega: *omega },
            SourcePart::Step(_) | SourcePart::Laplace(_) => AnalysisKind::Laplace,
            SourcePart::Noise { id, .. } => AnalysisKind::Noise(*id),
        }
    }

    fn is_causal(&self) -> bool {
        matches!(self, SourcePart::Step(_) | SourcePart::Laplace(_))
    }
}

pub(crate) fn same_omega(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-12 * a.abs().max(b.abs())
}

/// Value of an independent voltage or current source.
#[derive(Debug, Clone, PartialEq)]
pub struct Source {
    parts: Vec<SourcePart>,
}

impl Source {
    pub fn dc(value: f64) -> Self {
        Self::from_part(SourcePart::Dc(value))
    }

    /// Sinusoid with complex amplitude `phasor` at angular frequency `omega`.
    pub fn ac(phasor: impl Into<Complex64>, omega: f64) -> Self {
        Self::from_part(SourcePart::Ac {
            phasor: phasor.into(),
            omega,
        })
    }

    pub fn step(value: f64) -> Self {
        Self::from_part(SourcePart::Step(value))
    }

    pub fn laplace(transform: Expr) -> Self {
        Self::from_part(SourcePart::Laplace(transform))
    }

    pub fn noise(asd: f64, id: NoiseId) -> Self {
        Self::from_part(SourcePart::Noise { asd, id })
    }

    /// A killed source: constant zero.
    pub fn zero() -> Self {
        Self::dc(0.0)
    }

    pub fn from_part(part: SourcePart) -> Self {
        Self { parts: vec![part] }
    }

    /// Superimpose another part.
    pub fn and(mut self, part: SourcePart) -> Self {
        self.parts.push(part);
        self
    }

    pub fn parts(&self) -> &[SourcePart] {
        &self.parts
    }

    pub fn is_dc(&self) -> bool {
        !self.parts.is_empty() && self.parts.iter().all(|p| matches!(p, SourcePart::Dc(_)))
    }

    pub fn is_ac(&self) -> bool {
        !self.parts.is_empty() && self.parts.iter().all(|p| matches!(p, SourcePart::Ac { .. }))
    }

    pub fn is_causal(&self) -> bool {
        self.parts.iter().all(SourcePart::is_causal)
    }

    pub fn is_noisy(&self) -> bool {
        self.parts.iter().any(|p| matches!(p, SourcePart::Noise { .. }))
    }

    /// True when some part has a Laplace-domain transient.
    pub fn has_s(&self) -> bool {
        self.parts.iter().any(SourcePart::is_causal)
    }

    /// Distinct analysis kinds of the parts, in order of appearance.
    pub fn kinds(&self) -> Vec<AnalysisKind> {
        let mut kinds: Vec<AnalysisKind> = Vec::new();
        for kind in self.parts.iter().map(SourcePart::kind) {
            if !kinds.contains(&kind) {
                kinds.push(kind);
            }
        }
        kinds
    }

    /// The part of this source seen by an analysis of the given kind.
    pub fn select(&self, kind: AnalysisKind) -> Result<Expr> {
        let mut total = Expr::zero();
        for part in &self.parts {
            let contribution = match (kind, part) {
                (AnalysisKind::Dc | AnalysisKind::Time, SourcePart::Dc(v)) => Expr::from(*v),
                (AnalysisKind::Ac { omega }, SourcePart::Ac { phasor, omega: w })
                    if same_omega(omega, *w) =>
                {
                    Expr::from(*phasor)
                }
                (AnalysisKind::Laplace | AnalysisKind::Ivp, SourcePart::Step(v)) => step_transform(*v),
                (AnalysisKind::Laplace | AnalysisKind::Ivp, SourcePart::Laplace(e)) => e.clone(),
                (AnalysisKind::Ivp, SourcePart::Dc(v)) => step_transform(*v),
                (AnalysisKind::Ivp, SourcePart::Ac { phasor, omega }) => sinusoid_transform(*phasor, *omega),
                (AnalysisKind::Noise(id), SourcePart::Noise { asd, id: nid }) if id == *nid => {
                    Expr::from(*asd)
                }
                (AnalysisKind::Superposition, _) => {
                    return Err(NodalError::structural(
                        "superposition analysis must be decomposed into single-kind passes",
                    ))
                }
                _ => continue,
            };
            total = &total + &contribution;
        }
        Ok(total)
    }
}

/// `v * u(t)` transforms to `v / s`.
fn step_transform(v: f64) -> Expr {
    Expr::from(v).checked_div(&Expr::s()).unwrap_or_default()
}

/// `Re{(a + jb) exp(jwt)} = a cos(wt) - b sin(wt)` transforms to
/// `(a s - b w) / (s^2 + w^2)`.
fn sinusoid_transform(phasor: Complex64, omega: f64) -> Expr {
    let num = Poly::from_real(&[-phasor.im * omega, phasor.re]);
    let den = Poly::from_real(&[omega * omega, 0.0, 1.0]);
    Expr::ratio(num, den).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_select_picks_matching_part() {
        let src = Source::dc(10.0)
            .and(SourcePart::Ac {
                phasor: Complex64::new(40.0, 0.0),
                omega: 3.0,
            })
            .and(SourcePart::Step(5.0))
            .and(SourcePart::Noise {
                asd: 20.0,
                id: NoiseId(1),
            });

        let dc = src.select(AnalysisKind::Dc).unwrap();
        assert_eq!(dc.as_constant(), Some(Complex64::new(10.0, 0.0)));

        let ac = src.select(AnalysisKind::Ac { omega: 3.0 }).unwrap();
        assert_eq!(ac.as_constant(), Some(Complex64::new(40.0, 0.0)));
        assert!(src.select(AnalysisKind::Ac { omega: 4.0 }).unwrap().is_zero());

        let s = src.select(AnalysisKind::Laplace).unwrap();
        let at = s.eval(Complex64::new(2.0, 0.0)).unwrap();
        assert_relative_eq!(at.re, 2.5);

        let n = src.select(AnalysisKind::Noise(NoiseId(1))).unwrap();
        assert_eq!(n.as_constant(), Some(Complex64::new(20.0, 0.0)));
        assert!(src.select(AnalysisKind::Noise(NoiseId(2))).unwrap().is_zero());

        assert!(src.select(AnalysisKind::Superposition).is_err());
    }

    #[test]
    fn test_source_mix_flags() {
        assert!(Source::dc(1.0).is_dc());
        assert!(!Source::dc(1.0).is_causal());
        assert!(Source::step(1.0).is_causal());
        assert!(Source::ac(1.0, 2.0).is_ac());
        assert!(Source::noise(1.0, NoiseId(0)).is_noisy());
        assert_eq!(
            Source::step(1.0).and(SourcePart::Dc(2.0)).kinds(),
            vec![AnalysisKind::Laplace, AnalysisKind::Dc]
        );
    }

    #[test]
    fn test_ivp_transforms_dc_and_ac() {
        // cos(2t) -> s / (s^2 + 4)
        let src = Source::ac(1.0, 2.0).and(SourcePart::Dc(3.0));
        let e = src.select(AnalysisKind::Ivp).unwrap();
        let s = Complex64::new(1.0, 0.0);
        let expected = 1.0 / 5.0 + 3.0;
        assert_relative_eq!(e.eval(s).unwrap().re, expected, epsilon = 1e-12);
    }
}
