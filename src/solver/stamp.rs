//! Component stamps.
//!
//! Each component writes its contribution into the system blocks held by a
//! [`StampContext`]. Branch unknowns come from the allocator; node indices
//! of ground are `None` and the corresponding writes are dropped.

use crate::components::{Component, ComponentKind, SummingSigns};
use crate::error::{NodalError, Result};
use crate::expr::Expr;

use super::kind::AnalysisKind;
use super::system::StampContext;

impl Component {
    /// Add this component's contribution to the system.
    pub fn stamp(&self, ctx: &mut StampContext<'_>) -> Result<()> {
        let kind = ctx.kind();
        let nodes = self
            .nodes()
            .iter()
            .map(|n| ctx.node_index(n))
            .collect::<Result<Vec<_>>>()?;

        match self.kind() {
            ComponentKind::Resistor(_)
            | ComponentKind::Capacitor(_)
            | ComponentKind::Impedance(_)
            | ComponentKind::Admittance(_) => {
                let (n1, n2) = (nodes[0], nodes[1]);
                let y = match self.kind() {
                    ComponentKind::Capacitor(_) if kind == AnalysisKind::Dc => Expr::zero(),
                    _ => kind.select_immittance(self.name(), &self.admittance_s()?)?,
                };
                ctx.stamp_admittance(n1, n2, &y);

                if let ComponentKind::Capacitor(c) = self.kind() {
                    if kind == AnalysisKind::Ivp && c.has_ic() {
                        let isc = c.initial_isc();
                        ctx.add_is(n1, &isc);
                        ctx.add_is(n2, &-&isc);
                    }
                }
            }

            ComponentKind::Inductor(l) => {
                let (n1, n2) = (nodes[0], nodes[1]);
                let m = ctx.branch_index(self.name())?;
                ctx.set_b(n1, m, Expr::one());
                ctx.set_c(m, n1, Expr::one());
                ctx.set_b(n2, m, Expr::constant(-1.0));
                ctx.set_c(m, n2, Expr::constant(-1.0));

                let z = match kind {
                    AnalysisKind::Dc => Expr::zero(),
                    _ => kind.select_immittance(self.name(), &l.impedance())?,
                };
                ctx.add_d(m, m, &-&z);

                if kind == AnalysisKind::Ivp && l.has_ic() {
                    ctx.add_es(m, &l.initial_voc());
                }
            }

            ComponentKind::VoltageSource(src) => {
                let m = ctx.branch_index(self.name())?;
                ctx.stamp_incidence(nodes[0], nodes[1], m);
                ctx.add_es(m, &src.select(kind)?);
            }

            ComponentKind::CurrentSource(src) => {
                let i = src.select(kind)?;
                ctx.add_is(nodes[0], &i);
                ctx.add_is(nodes[1], &-&i);
            }

            ComponentKind::Vcvs { gain } => {
                let m = ctx.branch_index(self.name())?;
                ctx.stamp_incidence(nodes[0], nodes[1], m);
                ctx.add_c(m, nodes[2], &-gain);
                ctx.add_c(m, nodes[3], gain);
            }

            ComponentKind::Cccs { control, gain } => {
                let m = ctx.branch_index(control)?;
                ctx.add_b(nodes[0], m, &-gain);
                ctx.add_b(nodes[1], m, gain);
            }

            ComponentKind::Vccs { gain } => {
                let neg = -gain;
                ctx.add_g(nodes[0], nodes[2], &neg);
                ctx.add_g(nodes[0], nodes[3], gain);
                ctx.add_g(nodes[1], nodes[2], gain);
                ctx.add_g(nodes[1], nodes[3], &neg);
            }

            ComponentKind::Ccvs { control, gain } => {
                let m = ctx.branch_index(self.name())?;
                ctx.stamp_incidence(nodes[0], nodes[1], m);
                let mc = ctx.branch_index(control)?;
                ctx.add_d(m, mc, &-gain);
            }

            ComponentKind::Mutual {
                inductor1,
                inductor2,
                coupling,
            } => self.stamp_mutual(ctx, inductor1, inductor2, *coupling)?,

            ComponentKind::Gyrator { impedance } => {
                let m_out = ctx.branch_index(self.name())?;
                let m_in = ctx.branch_index(&format!("{}X", self.name()))?;
                let one = Expr::one();
                let minus_one = -&one;

                ctx.add_b(nodes[0], m_out, &one);
                ctx.add_c(m_in, nodes[0], &one);
                ctx.add_b(nodes[1], m_out, &minus_one);
                ctx.add_c(m_in, nodes[1], &minus_one);
                ctx.add_b(nodes[2], m_in, &one);
                ctx.add_c(m_out, nodes[2], &one);
                ctx.add_b(nodes[3], m_in, &minus_one);
                ctx.add_c(m_out, nodes[3], &minus_one);

                ctx.add_d(m_in, m_in, impedance);
                ctx.add_d(m_out, m_out, &-impedance);
            }

            ComponentKind::Transformer { ratio } => {
                let m = ctx.branch_index(self.name())?;
                ctx.stamp_incidence(nodes[0], nodes[1], m);
                let neg = -ratio;
                ctx.add_b(nodes[2], m, &neg);
                ctx.add_c(m, nodes[2], &neg);
                ctx.add_b(nodes[3], m, ratio);
                ctx.add_c(m, nodes[3], ratio);
            }

            ComponentKind::TransferFunction { gain } => {
                let m = ctx.branch_index(self.name())?;
                let one = Expr::one();
                ctx.add_b(nodes[1], m, &one);
                ctx.add_c(m, nodes[1], &one);
                ctx.add_c(m, nodes[0], &-gain);
            }

            ComponentKind::SummingPoint(signs) => {
                let m = ctx.branch_index(self.name())?;
                let one = Expr::one();
                let output = nodes[SummingSigns::OUTPUT];
                ctx.add_b(output, m, &one);
                ctx.add_c(m, output, &one);
                for (&pos, &sign) in signs.input_positions().iter().zip(signs.signs()) {
                    ctx.add_c(m, nodes[pos], &Expr::from(-sign));
                }
            }

            ComponentKind::Wire | ComponentKind::Open | ComponentKind::Port => {}

            ComponentKind::Unsupported { class, .. } => {
                return Err(NodalError::UnsupportedComponent {
                    class: class.to_string(),
                    name: self.name().to_string(),
                });
            }
        }
        Ok(())
    }

    fn stamp_mutual(
        &self,
        ctx: &mut StampContext<'_>,
        inductor1: &str,
        inductor2: &str,
        coupling: f64,
    ) -> Result<()> {
        match ctx.kind() {
            AnalysisKind::Dc => return Ok(()),
            AnalysisKind::Time => {
                return Err(NodalError::structural(format!(
                    "mutual inductance {} cannot be evaluated in the time domain",
                    self.name()
                )))
            }
            _ => {}
        }

        let netlist = ctx.netlist();
        let z1 = mutual_partner(netlist.get(inductor1), inductor1)?;
        let z2 = mutual_partner(netlist.get(inductor2), inductor2)?;
        let root = (&z1 * &z2).sqrt().ok_or_else(|| {
            NodalError::invalid_value(self.name(), "cannot take the square root of the inductor impedances")
        })?;
        let zm = ctx
            .kind()
            .select_immittance(self.name(), &root.scale(coupling))?;

        let m1 = ctx.branch_index(inductor1)?;
        let m2 = ctx.branch_index(inductor2)?;
        let neg = -&zm;
        ctx.add_d(m1, m2, &neg);
        ctx.add_d(m2, m1, &neg);
        Ok(())
    }
}

/// s-domain impedance of an inductor named by a mutual inductance.
fn mutual_partner(component: Option<&Component>, name: &str) -> Result<Expr> {
    match component.map(Component::kind) {
        Some(ComponentKind::Inductor(l)) => Ok(l.impedance()),
        Some(_) => Err(NodalError::invalid_value(name, "mutual inductance must couple inductors")),
        None => Err(NodalError::unknown_branch(name)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::Netlist;
    use crate::components::{Source, UnsupportedClass};
    use crate::expr::Complex64;
    use crate::solver::allocator::UnknownAllocator;
    use crate::solver::system::{assemble, Assembled};

    fn build(components: Vec<Component>, kind: AnalysisKind) -> Result<Assembled> {
        let netlist = Netlist::from_components(components)?;
        let alloc = UnknownAllocator::new(&netlist)?;
        assemble(&netlist, &alloc, kind)
    }

    fn re(e: &Expr) -> f64 {
        e.as_constant().map(|c| c.re).unwrap_or(f64::NAN)
    }

    #[test]
    fn test_passive_stamp_symmetric() {
        let asm = build(
            vec![
                Component::resistor("R1", 1, 2, 10.0),
                Component::capacitor("C1", 2, 0, 1e-6),
                Component::resistor("R2", 2, 3, 5.0),
                Component::capacitor("C2", 3, 1, 2e-6),
            ],
            AnalysisKind::Laplace,
        )
        .unwrap();
        assert!(asm.system.g.is_symmetric());
        assert!(asm.system.g.get(0, 1).approx_eq(&Expr::from(-0.1), 1e-12));
    }

    #[test]
    fn test_capacitor_open_at_dc() {
        let asm = build(
            vec![
                Component::resistor("R1", 1, 0, 1.0),
                Component::capacitor("C1", 1, 0, 1.0),
            ],
            AnalysisKind::Dc,
        )
        .unwrap();
        assert_eq!(re(asm.system.g.get(0, 0)), 1.0);
    }

    #[test]
    fn test_capacitor_initial_voltage_injects_current() {
        let asm = build(
            vec![
                Component::resistor("R1", 1, 2, 1.0),
                Component::capacitor_ic("C1", 1, 2, 2.0, 3.0),
                Component::resistor("R2", 2, 0, 1.0),
            ],
            AnalysisKind::Ivp,
        )
        .unwrap();
        assert_eq!(re(&asm.system.is[0]), 6.0);
        assert_eq!(re(&asm.system.is[1]), -6.0);
    }

    #[test]
    fn test_inductor_dc_short_and_ivp_source() {
        let parts = || {
            vec![
                Component::resistor("R1", 1, 0, 1.0),
                Component::inductor_ic("L1", 1, 0, 0.5, 2.0),
            ]
        };
        let dc = build(parts(), AnalysisKind::Dc).unwrap();
        assert!(dc.system.d.get(0, 0).is_zero());
        assert!(dc.system.es[0].is_zero());
        assert_eq!(re(dc.system.b.get(0, 0)), 1.0);

        let ivp = build(parts(), AnalysisKind::Ivp).unwrap();
        assert!(ivp.system.d.get(0, 0).approx_eq(&Expr::s().scale(-0.5), 1e-12));
        assert_eq!(re(&ivp.system.es[0]), -1.0);
    }

    #[test]
    fn test_vcvs_and_vccs() {
        let asm = build(
            vec![
                Component::resistor("R1", 1, 0, 1.0),
                Component::vcvs("E1", (2, 0), (1, 0), 5.0),
                Component::vccs("G1", (3, 0), (1, 2), 0.1),
                Component::resistor("R3", 3, 0, 1.0),
            ],
            AnalysisKind::Dc,
        )
        .unwrap();
        let c = &asm.system.c;
        assert_eq!(re(c.get(0, 1)), 1.0);
        assert_eq!(re(c.get(0, 0)), -5.0);

        let g = &asm.system.g;
        assert_eq!(re(g.get(2, 0)), -0.1);
        assert_eq!(re(g.get(2, 1)), 0.1);
    }

    #[test]
    fn test_current_controlled_sources() {
        let asm = build(
            vec![
                Component::voltage_source("V1", 1, 0, Source::dc(1.0)),
                Component::resistor("R1", 1, 0, 1.0),
                Component::cccs("F1", 2, 0, "V1", 3.0),
                Component::ccvs("H1", 3, 0, "V1", 7.0),
                Component::resistor("R2", 2, 0, 1.0),
            ],
            AnalysisKind::Dc,
        )
        .unwrap();
        assert_eq!(re(asm.system.b.get(1, 0)), -3.0);
        assert_eq!(re(asm.system.d.get(1, 0)), -7.0);

        let missing = build(
            vec![
                Component::resistor("R1", 1, 0, 1.0),
                Component::cccs("F1", 1, 0, "Vx", 3.0),
            ],
            AnalysisKind::Dc,
        );
        assert!(matches!(missing, Err(NodalError::UnknownReference { .. })));
    }

    #[test]
    fn test_mutual_inductance() {
        let parts = || {
            vec![
                Component::inductor("L1", 1, 0, 2.0),
                Component::inductor("L2", 2, 0, 8.0),
                Component::mutual("K1", "L1", "L2", 0.5),
                Component::resistor("R1", 2, 0, 1.0),
            ]
        };
        let asm = build(parts(), AnalysisKind::Laplace).unwrap();
        // Zm = 0.5 * sqrt(2s * 8s) = 2s
        assert!(asm.system.d.get(0, 1).approx_eq(&Expr::s().scale(-2.0), 1e-12));
        assert_eq!(asm.system.d.get(0, 1), asm.system.d.get(1, 0));

        let ac = build(parts(), AnalysisKind::Ac { omega: 10.0 }).unwrap();
        assert_eq!(ac.system.d.get(0, 1).as_constant(), Some(Complex64::new(0.0, -20.0)));

        let dc = build(parts(), AnalysisKind::Dc).unwrap();
        assert!(dc.system.d.get(0, 1).is_zero());

        assert!(build(parts(), AnalysisKind::Time).is_err());
    }

    #[test]
    fn test_gyrator() {
        let asm = build(
            vec![
                Component::gyrator("GY1", (2, 0), (1, 0), 50.0),
                Component::resistor("R1", 1, 0, 1.0),
                Component::resistor("R2", 2, 0, 1.0),
            ],
            AnalysisKind::Dc,
        )
        .unwrap();
        // Node 2 is index 0, node 1 index 1; branch 0 is the output GY1,
        // branch 1 the input GY1X
        assert_eq!(re(asm.system.b.get(0, 0)), 1.0);
        assert_eq!(re(asm.system.c.get(1, 0)), 1.0);
        assert_eq!(re(asm.system.b.get(1, 1)), 1.0);
        assert_eq!(re(asm.system.c.get(0, 1)), 1.0);
        assert_eq!(re(asm.system.d.get(1, 1)), 50.0);
        assert_eq!(re(asm.system.d.get(0, 0)), -50.0);
    }

    #[test]
    fn test_summing_point_signs() {
        let sp = Component::summing_point(
            "SP1",
            vec!["a".into(), "b".into(), "out".into(), "c".into()],
            SummingSigns::Pmm,
        )
        .unwrap();
        let asm = build(
            vec![
                Component::resistor("Ra", "a", 0, 1.0),
                Component::resistor("Rb", "b", 0, 1.0),
                Component::resistor("Rc", "c", 0, 1.0),
                sp,
            ],
            AnalysisKind::Dc,
        )
        .unwrap();
        // Node order: a, b, c, out
        let c = &asm.system.c;
        assert_eq!(re(c.get(0, 0)), -1.0);
        assert_eq!(re(c.get(0, 1)), 1.0);
        assert_eq!(re(c.get(0, 2)), 1.0);
        assert_eq!(re(c.get(0, 3)), 1.0);
        assert_eq!(re(asm.system.b.get(3, 0)), 1.0);
    }

    #[test]
    fn test_unsupported_component_fails() {
        let err = build(
            vec![
                Component::resistor("R1", 1, 0, 1.0),
                Component::unsupported("D1", vec!["1".into(), "0".into()], UnsupportedClass::NonLinear, "Diode"),
            ],
            AnalysisKind::Dc,
        )
        .unwrap_err();
        assert_eq!(
            err,
            NodalError::UnsupportedComponent {
                class: "non-linear".to_string(),
                name: "D1".to_string()
            }
        );
    }
}
