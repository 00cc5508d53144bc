//! Component models for nodal analysis.
//!
//! This module provides the closed set of component kinds the engine knows:
//! - Linear: Resistor, Capacitor, Inductor, generic impedance/admittance
//! - Sources: independent voltage and current sources
//! - Dependent sources: VCVS (E), CCCS (F), VCCS (G), CCVS (H)
//! - Coupling: mutual inductance, gyrator, transformer, transfer function
//! - Connectivity: wire, open circuit, port
//! - Signal flow: summing points
//!
//! Kinds the linear engine cannot analyse are kept as
//! [`ComponentKind::Unsupported`] so a netlist can still describe them.
//! Stamping lives in [`crate::solver`].

mod linear;
pub mod registry;
mod signal_flow;
mod sources;

pub use linear::{Admittance, Capacitor, Impedance, Inductor, Resistor};
pub use registry::Arg;
pub use signal_flow::SummingSigns;
pub use sources::{NoiseId, Source, SourcePart};

use std::fmt;

use crate::circuit::{qualify_name, NodeName};
use crate::error::{NodalError, Result};
use crate::expr::Expr;
use crate::solver::AnalysisKind;

/// Why a component cannot be analysed by the linear engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnsupportedClass {
    NonLinear,
    TimeVarying,
    Logic,
    Misc,
}

impl fmt::Display for UnsupportedClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UnsupportedClass::NonLinear => "non-linear",
            UnsupportedClass::TimeVarying => "time-varying",
            UnsupportedClass::Logic => "logic",
            UnsupportedClass::Misc => "unimplemented",
        };
        write!(f, "{}", name)
    }
}

/// What a component needs from the analysis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub independent_source: bool,
    pub dependent_source: bool,
    pub reactive: bool,
    /// Current through the component is an unknown of the system
    pub need_branch_current: bool,
    /// A second current unknown, named `<name>X`
    pub need_extra_branch_current: bool,
    /// Reads the branch current of another component
    pub need_control_current: bool,
}

/// The kind of a component, with its value.
#[derive(Debug, Clone, PartialEq)]
pub enum ComponentKind {
    Resistor(Resistor),
    Capacitor(Capacitor),
    Inductor(Inductor),
    Impedance(Impedance),
    Admittance(Admittance),
    VoltageSource(Source),
    CurrentSource(Source),
    /// Voltage-controlled voltage source: `V(n1,n2) = gain * V(n3,n4)`
    Vcvs { gain: Expr },
    /// Current-controlled current source: `I(n1->n2) = gain * I(control)`
    Cccs { control: String, gain: Expr },
    /// Voltage-controlled current source: `I(n1->n2) = gain * V(n3,n4)`
    Vccs { gain: Expr },
    /// Current-controlled voltage source: `V(n1,n2) = gain * I(control)`
    Ccvs { control: String, gain: Expr },
    /// Mutual inductance between two inductors
    Mutual {
        inductor1: String,
        inductor2: String,
        coupling: f64,
    },
    /// Gyrator with gyration resistance `impedance`
    Gyrator { impedance: Expr },
    /// Ideal transformer, `V(n1,n2) = ratio * V(n3,n4)`
    Transformer { ratio: Expr },
    /// Ground-referenced amplifier, `V(n2) = gain * V(n1)`
    TransferFunction { gain: Expr },
    Wire,
    Open,
    Port,
    SummingPoint(SummingSigns),
    Unsupported {
        class: UnsupportedClass,
        description: String,
    },
}

impl ComponentKind {
    /// Number of nodes the kind connects to, or `None` for any number.
    pub fn node_count(&self) -> Option<usize> {
        match self {
            ComponentKind::Vcvs { .. }
            | ComponentKind::Vccs { .. }
            | ComponentKind::Gyrator { .. }
            | ComponentKind::Transformer { .. } => Some(4),
            ComponentKind::Mutual { .. } => Some(0),
            ComponentKind::SummingPoint(signs) => Some(signs.node_count()),
            ComponentKind::Unsupported { .. } => None,
            _ => Some(2),
        }
    }

    /// Netlist type letter.
    pub fn type_letter(&self) -> &'static str {
        match self {
            ComponentKind::Resistor(_) => "R",
            ComponentKind::Capacitor(_) => "C",
            ComponentKind::Inductor(_) => "L",
            ComponentKind::Impedance(_) => "Z",
            ComponentKind::Admittance(_) => "Y",
            ComponentKind::VoltageSource(_) => "V",
            ComponentKind::CurrentSource(_) => "I",
            ComponentKind::Vcvs { .. } => "E",
            ComponentKind::Cccs { .. } => "F",
            ComponentKind::Vccs { .. } => "G",
            ComponentKind::Ccvs { .. } => "H",
            ComponentKind::Mutual { .. } => "K",
            ComponentKind::Gyrator { .. } => "GY",
            ComponentKind::Transformer { .. } => "TF",
            ComponentKind::TransferFunction { .. } => "TR",
            ComponentKind::Wire => "W",
            ComponentKind::Open => "O",
            ComponentKind::Port => "P",
            ComponentKind::SummingPoint(_) => "SP",
            ComponentKind::Unsupported { .. } => "U",
        }
    }

    pub fn capabilities(&self) -> Capabilities {
        let none = Capabilities::default();
        match self {
            ComponentKind::Resistor(_)
            | ComponentKind::Mutual { .. }
            | ComponentKind::Wire
            | ComponentKind::Open
            | ComponentKind::Port
            | ComponentKind::Unsupported { .. } => none,
            ComponentKind::Capacitor(_) | ComponentKind::Impedance(_) | ComponentKind::Admittance(_) => {
                Capabilities { reactive: true, ..none }
            }
            ComponentKind::Inductor(_) => Capabilities {
                reactive: true,
                need_branch_current: true,
                ..none
            },
            ComponentKind::VoltageSource(_) => Capabilities {
                independent_source: true,
                need_branch_current: true,
                ..none
            },
            ComponentKind::CurrentSource(_) => Capabilities {
                independent_source: true,
                ..none
            },
            ComponentKind::Vcvs { .. } => Capabilities {
                dependent_source: true,
                need_branch_current: true,
                ..none
            },
            ComponentKind::Cccs { .. } => Capabilities {
                dependent_source: true,
                need_control_current: true,
                ..none
            },
            ComponentKind::Vccs { .. } => Capabilities {
                dependent_source: true,
                ..none
            },
            ComponentKind::Ccvs { .. } => Capabilities {
                dependent_source: true,
                need_branch_current: true,
                need_control_current: true,
                ..none
            },
            ComponentKind::Gyrator { .. } => Capabilities {
                need_branch_current: true,
                need_extra_branch_current: true,
                ..none
            },
            ComponentKind::Transformer { .. }
            | ComponentKind::TransferFunction { .. }
            | ComponentKind::SummingPoint(_) => Capabilities {
                need_branch_current: true,
                ..none
            },
        }
    }
}

/// A named component connected to circuit nodes.
///
/// The node list always matches [`ComponentKind::node_count`].
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    pub(crate) name: String,
    pub(crate) nodes: Vec<NodeName>,
    pub(crate) kind: ComponentKind,
}

impl Component {
    /// Create a component, checking the node count against the kind.
    pub fn new(name: impl Into<String>, nodes: Vec<NodeName>, kind: ComponentKind) -> Result<Self> {
        let name = name.into();
        if let Some(expected) = kind.node_count() {
            if nodes.len() != expected {
                return Err(NodalError::invalid_value(
                    name,
                    format!(
                        "{} component needs {} nodes, got {}",
                        kind.type_letter(),
                        expected,
                        nodes.len()
                    ),
                ));
            }
        }
        Ok(Self { name, nodes, kind })
    }

    fn two_terminal(
        name: impl Into<String>,
        n1: impl Into<NodeName>,
        n2: impl Into<NodeName>,
        kind: ComponentKind,
    ) -> Self {
        Self {
            name: name.into(),
            nodes: vec![n1.into(), n2.into()],
            kind,
        }
    }

    fn four_terminal(
        name: impl Into<String>,
        nodes: [NodeName; 4],
        kind: ComponentKind,
    ) -> Self {
        Self {
            name: name.into(),
            nodes: nodes.into(),
            kind,
        }
    }

    pub fn resistor(
        name: impl Into<String>,
        n1: impl Into<NodeName>,
        n2: impl Into<NodeName>,
        resistance: f64,
    ) -> Self {
        Self::two_terminal(name, n1, n2, ComponentKind::Resistor(Resistor::new(resistance)))
    }

    pub fn capacitor(
        name: impl Into<String>,
        n1: impl Into<NodeName>,
        n2: impl Into<NodeName>,
        capacitance: f64,
    ) -> Self {
        Self::two_terminal(name, n1, n2, ComponentKind::Capacitor(Capacitor::new(capacitance)))
    }

    /// Capacitor charged to `v0` at `t = 0`.
    pub fn capacitor_ic(
        name: impl Into<String>,
        n1: impl Into<NodeName>,
        n2: impl Into<NodeName>,
        capacitance: f64,
        v0: f64,
    ) -> Self {
        Self::two_terminal(
            name,
            n1,
            n2,
            ComponentKind::Capacitor(Capacitor::with_initial_voltage(capacitance, v0)),
        )
    }

    pub fn inductor(
        name: impl Into<String>,
        n1: impl Into<NodeName>,
        n2: impl Into<NodeName>,
        inductance: f64,
    ) -> Self {
        Self::two_terminal(name, n1, n2, ComponentKind::Inductor(Inductor::new(inductance)))
    }

    /// Inductor carrying `i0` at `t = 0`.
    pub fn inductor_ic(
        name: impl Into<String>,
        n1: impl Into<NodeName>,
        n2: impl Into<NodeName>,
        inductance: f64,
        i0: f64,
    ) -> Self {
        Self::two_terminal(
            name,
            n1,
            n2,
            ComponentKind::Inductor(Inductor::with_initial_current(inductance, i0)),
        )
    }

    pub fn impedance(
        name: impl Into<String>,
        n1: impl Into<NodeName>,
        n2: impl Into<NodeName>,
        z: Expr,
    ) -> Self {
        Self::two_terminal(name, n1, n2, ComponentKind::Impedance(Impedance { z }))
    }

    pub fn admittance(
        name: impl Into<String>,
        n1: impl Into<NodeName>,
        n2: impl Into<NodeName>,
        y: Expr,
    ) -> Self {
        Self::two_terminal(name, n1, n2, ComponentKind::Admittance(Admittance { y }))
    }

    /// Voltage source with `V(n1) - V(n2) = source`.
    pub fn voltage_source(
        name: impl Into<String>,
        n1: impl Into<NodeName>,
        n2: impl Into<NodeName>,
        source: Source,
    ) -> Self {
        Self::two_terminal(name, n1, n2, ComponentKind::VoltageSource(source))
    }

    /// Current source injecting `source` into `n1`, drawn from `n2`.
    pub fn current_source(
        name: impl Into<String>,
        n1: impl Into<NodeName>,
        n2: impl Into<NodeName>,
        source: Source,
    ) -> Self {
        Self::two_terminal(name, n1, n2, ComponentKind::CurrentSource(source))
    }

    pub fn vcvs(
        name: impl Into<String>,
        out: (impl Into<NodeName>, impl Into<NodeName>),
        sense: (impl Into<NodeName>, impl Into<NodeName>),
        gain: impl Into<Expr>,
    ) -> Self {
        Self::four_terminal(
            name,
            [out.0.into(), out.1.into(), sense.0.into(), sense.1.into()],
            ComponentKind::Vcvs { gain: gain.into() },
        )
    }

    pub fn vccs(
        name: impl Into<String>,
        out: (impl Into<NodeName>, impl Into<NodeName>),
        sense: (impl Into<NodeName>, impl Into<NodeName>),
        transconductance: impl Into<Expr>,
    ) -> Self {
        Self::four_terminal(
            name,
            [out.0.into(), out.1.into(), sense.0.into(), sense.1.into()],
            ComponentKind::Vccs {
                gain: transconductance.into(),
            },
        )
    }

    pub fn cccs(
        name: impl Into<String>,
        n1: impl Into<NodeName>,
        n2: impl Into<NodeName>,
        control: impl Into<String>,
        gain: impl Into<Expr>,
    ) -> Self {
        Self::two_terminal(
            name,
            n1,
            n2,
            ComponentKind::Cccs {
                control: control.into(),
                gain: gain.into(),
            },
        )
    }

    pub fn ccvs(
        name: impl Into<String>,
        n1: impl Into<NodeName>,
        n2: impl Into<NodeName>,
        control: impl Into<String>,
        transresistance: impl Into<Expr>,
    ) -> Self {
        Self::two_terminal(
            name,
            n1,
            n2,
            ComponentKind::Ccvs {
                control: control.into(),
                gain: transresistance.into(),
            },
        )
    }

    /// Coupling `k` between two inductors, named by component.
    pub fn mutual(
        name: impl Into<String>,
        inductor1: impl Into<String>,
        inductor2: impl Into<String>,
        coupling: f64,
    ) -> Self {
        Self {
            name: name.into(),
            nodes: Vec::new(),
            kind: ComponentKind::Mutual {
                inductor1: inductor1.into(),
                inductor2: inductor2.into(),
                coupling,
            },
        }
    }

    /// Gyrator with output port `(n1, n2)` and input port `(n3, n4)`.
    pub fn gyrator(
        name: impl Into<String>,
        out: (impl Into<NodeName>, impl Into<NodeName>),
        input: (impl Into<NodeName>, impl Into<NodeName>),
        resistance: impl Into<Expr>,
    ) -> Self {
        Self::four_terminal(
            name,
            [out.0.into(), out.1.into(), input.0.into(), input.1.into()],
            ComponentKind::Gyrator {
                impedance: resistance.into(),
            },
        )
    }

    /// Transformer with secondary `(n1, n2)` and primary `(n3, n4)`.
    pub fn transformer(
        name: impl Into<String>,
        secondary: (impl Into<NodeName>, impl Into<NodeName>),
        primary: (impl Into<NodeName>, impl Into<NodeName>),
        ratio: impl Into<Expr>,
    ) -> Self {
        Self::four_terminal(
            name,
            [secondary.0.into(), secondary.1.into(), primary.0.into(), primary.1.into()],
            ComponentKind::Transformer {
                ratio: ratio.into(),
            },
        )
    }

    /// `V(output) = gain * V(input)`, both referenced to ground.
    pub fn transfer_function(
        name: impl Into<String>,
        input: impl Into<NodeName>,
        output: impl Into<NodeName>,
        gain: impl Into<Expr>,
    ) -> Self {
        Self::two_terminal(name, input, output, ComponentKind::TransferFunction { gain: gain.into() })
    }

    pub fn wire(name: impl Into<String>, n1: impl Into<NodeName>, n2: impl Into<NodeName>) -> Self {
        Self::two_terminal(name, n1, n2, ComponentKind::Wire)
    }

    pub fn open(name: impl Into<String>, n1: impl Into<NodeName>, n2: impl Into<NodeName>) -> Self {
        Self::two_terminal(name, n1, n2, ComponentKind::Open)
    }

    pub fn port(name: impl Into<String>, n1: impl Into<NodeName>, n2: impl Into<NodeName>) -> Self {
        Self::two_terminal(name, n1, n2, ComponentKind::Port)
    }

    /// Summing point; `nodes` are `in1, in2, out[, in3]`.
    pub fn summing_point(
        name: impl Into<String>,
        nodes: Vec<NodeName>,
        signs: SummingSigns,
    ) -> Result<Self> {
        Self::new(name, nodes, ComponentKind::SummingPoint(signs))
    }

    pub fn unsupported(
        name: impl Into<String>,
        nodes: Vec<NodeName>,
        class: UnsupportedClass,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            nodes,
            kind: ComponentKind::Unsupported {
                class,
                description: description.into(),
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn nodes(&self) -> &[NodeName] {
        &self.nodes
    }

    pub fn kind(&self) -> &ComponentKind {
        &self.kind
    }

    pub fn type_letter(&self) -> &'static str {
        self.kind.type_letter()
    }

    pub fn capabilities(&self) -> Capabilities {
        self.kind.capabilities()
    }

    /// The source value of an independent source.
    pub fn source(&self) -> Option<&Source> {
        match &self.kind {
            ComponentKind::VoltageSource(src) | ComponentKind::CurrentSource(src) => Some(src),
            _ => None,
        }
    }

    fn require_source(&self) -> Result<&Source> {
        self.source().ok_or_else(|| NodalError::NotASource {
            name: self.name.clone(),
        })
    }

    pub fn is_dc(&self) -> Result<bool> {
        Ok(self.require_source()?.is_dc())
    }

    pub fn is_ac(&self) -> Result<bool> {
        Ok(self.require_source()?.is_ac())
    }

    pub fn is_causal(&self) -> Result<bool> {
        Ok(self.require_source()?.is_causal())
    }

    pub fn is_noisy(&self) -> Result<bool> {
        Ok(self.require_source()?.is_noisy())
    }

    /// True for a reactive element with an explicit initial condition.
    pub fn has_ic(&self) -> bool {
        match &self.kind {
            ComponentKind::Capacitor(c) => c.has_ic(),
            ComponentKind::Inductor(l) => l.has_ic(),
            _ => false,
        }
    }

    /// s-domain impedance of a two-terminal element.
    pub fn impedance_s(&self) -> Result<Expr> {
        let z = match &self.kind {
            ComponentKind::Resistor(r) => Some(r.impedance()),
            ComponentKind::Capacitor(c) => c.impedance(),
            ComponentKind::Inductor(l) => Some(l.impedance()),
            ComponentKind::Impedance(z) => Some(z.z.clone()),
            ComponentKind::Admittance(y) => y.y.recip(),
            ComponentKind::VoltageSource(_) | ComponentKind::Wire => Some(Expr::zero()),
            _ => return Err(self.no_immittance("impedance")),
        };
        z.ok_or_else(|| NodalError::invalid_value(&self.name, "impedance is infinite"))
    }

    /// s-domain admittance of a two-terminal element.
    pub fn admittance_s(&self) -> Result<Expr> {
        let y = match &self.kind {
            ComponentKind::Resistor(r) => r.admittance(),
            ComponentKind::Capacitor(c) => Some(c.admittance()),
            ComponentKind::Inductor(l) => l.admittance(),
            ComponentKind::Impedance(z) => z.z.recip(),
            ComponentKind::Admittance(y) => Some(y.y.clone()),
            ComponentKind::CurrentSource(_) | ComponentKind::Open => Some(Expr::zero()),
            _ => return Err(self.no_immittance("admittance")),
        };
        y.ok_or_else(|| NodalError::invalid_value(&self.name, "admittance is infinite"))
    }

    fn no_immittance(&self, what: &str) -> NodalError {
        NodalError::invalid_value(
            &self.name,
            format!("{} component has no two-terminal {}", self.type_letter(), what),
        )
    }

    /// Open-circuit (Thevenin) voltage seen by an analysis of `kind`.
    pub fn voc(&self, kind: AnalysisKind) -> Result<Expr> {
        match &self.kind {
            ComponentKind::VoltageSource(src) => src.select(kind),
            ComponentKind::CurrentSource(_) => Err(NodalError::invalid_value(
                &self.name,
                "ideal current source has no open-circuit voltage",
            )),
            ComponentKind::Capacitor(c) if kind == AnalysisKind::Ivp => Ok(c.initial_voc()),
            ComponentKind::Inductor(l) if kind == AnalysisKind::Ivp => Ok(l.initial_voc()),
            _ => Ok(Expr::zero()),
        }
    }

    /// Short-circuit (Norton) current seen by an analysis of `kind`.
    pub fn isc(&self, kind: AnalysisKind) -> Result<Expr> {
        match &self.kind {
            ComponentKind::CurrentSource(src) => src.select(kind),
            ComponentKind::VoltageSource(_) => Err(NodalError::invalid_value(
                &self.name,
                "ideal voltage source has no short-circuit current",
            )),
            ComponentKind::Capacitor(c) if kind == AnalysisKind::Ivp => Ok(c.initial_isc()),
            ComponentKind::Inductor(l) if kind == AnalysisKind::Ivp => Ok(l.initial_isc()),
            _ => Ok(Expr::zero()),
        }
    }

    /// Copy of this component placed inside namespace `ns`.
    ///
    /// The name, the nodes and any referenced control components are
    /// qualified; ground stays global.
    pub fn qualified(&self, ns: &str) -> Self {
        let kind = match &self.kind {
            ComponentKind::Cccs { control, gain } => ComponentKind::Cccs {
                control: qualify_name(ns, control),
                gain: gain.clone(),
            },
            ComponentKind::Ccvs { control, gain } => ComponentKind::Ccvs {
                control: qualify_name(ns, control),
                gain: gain.clone(),
            },
            ComponentKind::Mutual {
                inductor1,
                inductor2,
                coupling,
            } => ComponentKind::Mutual {
                inductor1: qualify_name(ns, inductor1),
                inductor2: qualify_name(ns, inductor2),
                coupling: *coupling,
            },
            other => other.clone(),
        };
        Self {
            name: qualify_name(ns, &self.name),
            nodes: self.nodes.iter().map(|n| n.qualified(ns)).collect(),
            kind,
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        for node in &self.nodes {
            write!(f, " {}", node)?;
        }
        Ok(())
    }
}
