//! Analysis kinds and the domain each one solves in.

use std::fmt;

use tracing::debug;

use crate::circuit::Netlist;
use crate::components::NoiseId;
use crate::error::{NodalError, Result};
use crate::expr::{Complex64, Expr};

/// The domain an analysis is carried out in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnalysisKind {
    /// Steady state with DC sources: `s = 0`
    Dc,
    /// Sinusoidal steady state at one angular frequency: `s = jω`
    Ac { omega: f64 },
    /// General Laplace domain
    Laplace,
    /// Laplace domain with the initial conditions of reactive elements
    Ivp,
    /// Mixed sources; must be split into single-kind passes
    Superposition,
    /// Numeric time domain for circuits that reduce to DC
    Time,
    /// Noise from one independent noise process
    Noise(NoiseId),
}

/// How a solved value is to be read.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Representation {
    /// A constant (DC value)
    Constant,
    /// A time-domain value, constant for all `t`
    Time,
    /// A function of `s`
    Laplace,
    /// A complex amplitude at `omega`
    Phasor { omega: f64 },
    /// A noise amplitude spectral density, read at `s = jω`
    Noise { id: NoiseId },
}

/// Properties of the source mix a result was derived under.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Assumptions {
    pub ac: bool,
    pub dc: bool,
    pub causal: bool,
}

impl Assumptions {
    /// The assumptions justified by a netlist's sources.
    pub fn of(netlist: &Netlist) -> Self {
        Self {
            ac: netlist.is_ac(),
            dc: netlist.is_dc(),
            causal: netlist.is_causal(),
        }
    }
}

impl AnalysisKind {
    /// Pick the kind from the mix of sources in a netlist.
    pub fn detect(netlist: &Netlist) -> Self {
        let kind = if netlist.has_ic() {
            AnalysisKind::Ivp
        } else {
            match netlist.source_kinds().as_slice() {
                [] => AnalysisKind::Laplace,
                [single] => *single,
                _ => AnalysisKind::Superposition,
            }
        };
        debug!(%kind, "detected analysis kind");
        kind
    }

    pub fn representation(&self) -> Representation {
        match self {
            AnalysisKind::Dc => Representation::Constant,
            AnalysisKind::Time => Representation::Time,
            AnalysisKind::Ac { omega } => Representation::Phasor { omega: *omega },
            AnalysisKind::Noise(id) => Representation::Noise { id: *id },
            AnalysisKind::Laplace | AnalysisKind::Ivp | AnalysisKind::Superposition => {
                Representation::Laplace
            }
        }
    }

    /// True for kinds that substitute `s` before stamping.
    pub fn is_constant(&self) -> bool {
        matches!(
            self,
            AnalysisKind::Dc | AnalysisKind::Time | AnalysisKind::Ac { .. }
        )
    }

    /// An impedance or admittance as seen by this kind.
    ///
    /// DC and time kinds evaluate at `s = 0`, AC at `s = jω`; the others keep
    /// the full function of `s`. `name` identifies the component in errors.
    pub fn select_immittance(&self, name: &str, value: &Expr) -> Result<Expr> {
        let at = match self {
            AnalysisKind::Dc | AnalysisKind::Time => Complex64::new(0.0, 0.0),
            AnalysisKind::Ac { omega } => Complex64::new(0.0, *omega),
            AnalysisKind::Laplace
            | AnalysisKind::Ivp
            | AnalysisKind::Superposition
            | AnalysisKind::Noise(_) => return Ok(value.clone()),
        };
        value.substitute(at).ok_or_else(|| {
            NodalError::invalid_value(name, format!("value {} has a pole at s = {}", value, at))
        })
    }
}

impl fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisKind::Dc => write!(f, "dc"),
            AnalysisKind::Ac { omega } => write!(f, "ac (omega = {})", omega),
            AnalysisKind::Laplace => write!(f, "s"),
            AnalysisKind::Ivp => write!(f, "ivp"),
            AnalysisKind::Superposition => write!(f, "super"),
            AnalysisKind::Time => write!(f, "time"),
            AnalysisKind::Noise(id) => write!(f, "noise {}", id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Component, Source, SourcePart};

    fn with_source(source: Source) -> Netlist {
        Netlist::from_components([
            Component::voltage_source("V1", 1, 0, source),
            Component::resistor("R1", 1, 0, 5.0),
        ])
        .unwrap()
    }

    #[test]
    fn test_detect_single_kinds() {
        assert_eq!(AnalysisKind::detect(&with_source(Source::dc(1.0))), AnalysisKind::Dc);
        assert_eq!(
            AnalysisKind::detect(&with_source(Source::ac(1.0, 3.0))),
            AnalysisKind::Ac { omega: 3.0 }
        );
        assert_eq!(AnalysisKind::detect(&with_source(Source::step(1.0))), AnalysisKind::Laplace);
        assert_eq!(
            AnalysisKind::detect(&with_source(Source::noise(1.0, NoiseId(2)))),
            AnalysisKind::Noise(NoiseId(2))
        );
    }

    #[test]
    fn test_detect_mixed_and_empty() {
        let mixed = with_source(Source::dc(1.0).and(SourcePart::Step(2.0)));
        assert_eq!(AnalysisKind::detect(&mixed), AnalysisKind::Superposition);

        let two_freqs = with_source(Source::ac(1.0, 3.0).and(SourcePart::Ac {
            phasor: Complex64::new(1.0, 0.0),
            omega: 5.0,
        }));
        assert_eq!(AnalysisKind::detect(&two_freqs), AnalysisKind::Superposition);

        let passive = Netlist::from_components([Component::resistor("R1", 1, 0, 5.0)]).unwrap();
        assert_eq!(AnalysisKind::detect(&passive), AnalysisKind::Laplace);
    }

    #[test]
    fn test_initial_conditions_force_ivp() {
        let mut netlist = with_source(Source::dc(1.0));
        netlist.add(Component::capacitor_ic("C1", 1, 0, 1.0, 0.0)).unwrap();
        assert_eq!(AnalysisKind::detect(&netlist), AnalysisKind::Ivp);
    }

    #[test]
    fn test_select_immittance() {
        // Inductor impedance: short at DC, jωL at AC
        let z = Expr::s().scale(2.0);
        assert!(AnalysisKind::Dc.select_immittance("L1", &z).unwrap().is_zero());
        let ac = AnalysisKind::Ac { omega: 3.0 }.select_immittance("L1", &z).unwrap();
        assert_eq!(ac.as_constant(), Some(Complex64::new(0.0, 6.0)));
        assert_eq!(AnalysisKind::Laplace.select_immittance("L1", &z).unwrap(), z);

        // Inductor admittance has a pole at DC
        let y = z.recip().unwrap();
        assert!(matches!(
            AnalysisKind::Dc.select_immittance("L1", &y),
            Err(NodalError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_assumptions() {
        let a = Assumptions::of(&with_source(Source::step(1.0)));
        assert!(a.causal && !a.dc && !a.ac);
        let a = Assumptions::of(&with_source(Source::dc(1.0)));
        assert!(a.dc && !a.causal);
    }
}
