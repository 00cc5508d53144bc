//! Circuits with a mix of source kinds, solved one kind at a time.
//!
//! A circuit whose sources combine DC, AC, transient and noise parts has no
//! single domain to be solved in. [`Superposition::solve`] runs one analysis
//! per kind present and keeps the per-kind results side by side. With initial
//! conditions, every deterministic part is folded into one initial-value pass;
//! noise always gets a pass per independent process.

use tracing::debug;

use crate::circuit::{NodeName, Netlist};
use crate::components::NoiseId;
use crate::error::Result;
use crate::expr::Expr;

use super::analysis::{AnalysisConfig, Circuit};
use super::kind::AnalysisKind;
use super::results::Quantity;

/// Per-kind solves of one netlist.
#[derive(Debug, Clone)]
pub struct Superposition {
    passes: Vec<Circuit>,
}

impl Superposition {
    /// Solve `netlist` once for every kind of source it contains.
    pub fn solve(netlist: &Netlist, config: AnalysisConfig) -> Result<Self> {
        let mut passes = Vec::new();
        for kind in decompose(netlist) {
            let mut pass = Circuit::with_config(netlist.clone(), config.clone()).with_kind(kind);
            pass.solve()?;
            passes.push(pass);
        }
        debug!(passes = passes.len(), "solved superposition");
        Ok(Self { passes })
    }

    /// Kinds solved, in order of first appearance in the netlist.
    pub fn kinds(&self) -> impl Iterator<Item = AnalysisKind> + '_ {
        self.passes.iter().map(Circuit::kind)
    }

    /// The session of one pass.
    pub fn pass(&mut self, kind: AnalysisKind) -> Option<&mut Circuit> {
        self.passes.iter_mut().find(|pass| pass.kind() == kind)
    }

    pub fn node_voltage(&mut self, node: impl Into<NodeName>) -> Result<Superposed> {
        let node = node.into();
        self.collect(|pass| pass.node_voltage(node.clone()))
    }

    pub fn voltage(&mut self, name: &str) -> Result<Superposed> {
        self.collect(|pass| pass.voltage(name))
    }

    pub fn current(&mut self, name: &str) -> Result<Superposed> {
        self.collect(|pass| pass.current(name))
    }

    fn collect(&mut self, mut query: impl FnMut(&mut Circuit) -> Result<Quantity>) -> Result<Superposed> {
        let parts = self
            .passes
            .iter_mut()
            .map(|pass| Ok((pass.kind(), query(pass)?)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Superposed { parts })
    }
}

/// The kinds a netlist has to be solved as.
fn decompose(netlist: &Netlist) -> Vec<AnalysisKind> {
    let kinds = netlist.source_kinds();
    if netlist.has_ic() {
        let noise = kinds
            .into_iter()
            .filter(|kind| matches!(kind, AnalysisKind::Noise(_)));
        return std::iter::once(AnalysisKind::Ivp).chain(noise).collect();
    }
    if kinds.is_empty() {
        vec![AnalysisKind::Laplace]
    } else {
        kinds
    }
}

/// One quantity split by the kind it was solved under.
#[derive(Debug, Clone, PartialEq)]
pub struct Superposed {
    parts: Vec<(AnalysisKind, Quantity)>,
}

impl Superposed {
    pub fn parts(&self) -> &[(AnalysisKind, Quantity)] {
        &self.parts
    }

    fn sum(&self, mut wanted: impl FnMut(&AnalysisKind) -> bool) -> Expr {
        self.parts
            .iter()
            .filter(|(kind, _)| wanted(kind))
            .fold(Expr::zero(), |acc, (_, q)| &acc + q.expr())
    }

    /// The DC component.
    pub fn dc(&self) -> Expr {
        self.sum(|kind| *kind == AnalysisKind::Dc)
    }

    /// The phasor at angular frequency `omega`.
    pub fn ac(&self, omega: f64) -> Expr {
        self.sum(|kind| *kind == AnalysisKind::Ac { omega })
    }

    /// The transient part as a function of `s`, including initial conditions.
    pub fn laplace(&self) -> Expr {
        self.sum(|kind| matches!(kind, AnalysisKind::Laplace | AnalysisKind::Ivp))
    }

    /// The response to one noise process.
    pub fn noise(&self, id: NoiseId) -> Expr {
        self.sum(|kind| *kind == AnalysisKind::Noise(id))
    }

    /// Total noise ASD at `omega`; independent processes add in power.
    pub fn noise_asd(&self, omega: f64) -> f64 {
        self.parts
            .iter()
            .filter(|(kind, _)| matches!(kind, AnalysisKind::Noise(_)))
            .map(|(_, q)| match q.expr().at_omega(omega) {
                Some(v) => v.norm_sqr(),
                None => f64::INFINITY,
            })
            .sum::<f64>()
            .sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Component, Source, SourcePart};
    use crate::expr::{Complex64, Poly};
    use approx::assert_relative_eq;

    fn mixed_source() -> Source {
        Source::ac(40.0, 3.0)
            .and(SourcePart::Noise {
                asd: 20.0,
                id: NoiseId(1),
            })
            .and(SourcePart::Step(10.0))
    }

    fn constant(e: &Expr) -> Complex64 {
        e.as_constant().unwrap_or(Complex64::new(f64::NAN, 0.0))
    }

    #[test]
    fn test_open_circuit_voltage_by_kind() {
        let netlist = Netlist::from_components([
            Component::voltage_source("V1", 1, 0, mixed_source()),
            Component::resistor("R1", 1, 2, 5.0),
        ])
        .unwrap();
        let mut sup = Superposition::solve(&netlist, AnalysisConfig::default()).unwrap();
        assert_eq!(
            sup.kinds().collect::<Vec<_>>(),
            vec![
                AnalysisKind::Ac { omega: 3.0 },
                AnalysisKind::Noise(NoiseId(1)),
                AnalysisKind::Laplace
            ]
        );

        let voc = sup.node_voltage(2).unwrap();
        let step = Expr::ratio(Poly::constant(10.0), Poly::from_real(&[0.0, 1.0])).unwrap();
        assert!(voc.laplace().approx_eq(&step, 1e-9));
        assert_relative_eq!(constant(&voc.ac(3.0)).re, 40.0, epsilon = 1e-9);
        assert_relative_eq!(constant(&voc.noise(NoiseId(1))).re, 20.0, epsilon = 1e-9);
        assert!(voc.dc().is_zero());
        assert!(voc.ac(5.0).is_zero());
    }

    #[test]
    fn test_short_circuit_current_by_kind() {
        let netlist = Netlist::from_components([
            Component::voltage_source("V1", 1, 0, mixed_source()),
            Component::resistor("R1", 1, 2, 5.0),
            Component::wire("W1", 2, 0),
        ])
        .unwrap();
        let mut sup = Superposition::solve(&netlist, AnalysisConfig::default()).unwrap();
        let isc = sup.current("R1").unwrap();
        let step = Expr::ratio(Poly::constant(2.0), Poly::from_real(&[0.0, 1.0])).unwrap();
        assert!(isc.laplace().approx_eq(&step, 1e-9));
        assert_relative_eq!(constant(&isc.ac(3.0)).re, 8.0, epsilon = 1e-9);
        assert_relative_eq!(constant(&isc.noise(NoiseId(1))).re, 4.0, epsilon = 1e-9);
    }

    #[test]
    fn test_passes_match_single_kind_solves() {
        let netlist = Netlist::from_components([
            Component::voltage_source("V1", 1, 0, mixed_source()),
            Component::resistor("R1", 1, 2, 5.0),
            Component::capacitor("C1", 2, 0, 0.1),
        ])
        .unwrap();
        let mut sup = Superposition::solve(&netlist, AnalysisConfig::default()).unwrap();
        let v2 = sup.node_voltage(2).unwrap();

        let mut ac = Circuit::new(netlist.clone()).with_kind(AnalysisKind::Ac { omega: 3.0 });
        let single = ac.node_voltage(2).unwrap();
        assert!(v2.ac(3.0).approx_eq(single.expr(), 1e-12));

        let mut transient = Circuit::new(netlist).with_kind(AnalysisKind::Laplace);
        let single = transient.node_voltage(2).unwrap();
        assert!(v2.laplace().approx_eq(single.expr(), 1e-12));
    }

    #[test]
    fn test_noise_adds_in_power() {
        let netlist = Netlist::from_components([
            Component::voltage_source("V1", 1, 0, Source::noise(3.0, NoiseId(1))),
            Component::voltage_source("V2", 2, 1, Source::noise(4.0, NoiseId(2))),
            Component::resistor("R1", 2, 0, 1.0),
        ])
        .unwrap();
        let mut sup = Superposition::solve(&netlist, AnalysisConfig::default()).unwrap();
        let v2 = sup.node_voltage(2).unwrap();
        assert_relative_eq!(v2.noise_asd(10.0), 5.0, epsilon = 1e-9);
    }

    #[test]
    fn test_initial_conditions_take_one_pass() {
        let netlist = Netlist::from_components([
            Component::voltage_source("V1", 1, 0, Source::dc(1.0).and(SourcePart::Noise {
                asd: 1.0,
                id: NoiseId(7),
            })),
            Component::resistor("R1", 1, 2, 1.0),
            Component::capacitor_ic("C1", 2, 0, 1.0, 2.0),
        ])
        .unwrap();
        let sup = Superposition::solve(&netlist, AnalysisConfig::default()).unwrap();
        assert_eq!(
            sup.kinds().collect::<Vec<_>>(),
            vec![AnalysisKind::Ivp, AnalysisKind::Noise(NoiseId(7))]
        );
    }

    #[test]
    fn test_passive_circuit_solves_in_s() {
        let netlist = Netlist::from_components([Component::resistor("R1", 1, 0, 1.0)]).unwrap();
        let mut sup = Superposition::solve(&netlist, AnalysisConfig::default()).unwrap();
        assert_eq!(sup.kinds().collect::<Vec<_>>(), vec![AnalysisKind::Laplace]);
        assert!(sup.pass(AnalysisKind::Laplace).is_some());
        assert!(sup.node_voltage(1).unwrap().laplace().is_zero());
    }
}
