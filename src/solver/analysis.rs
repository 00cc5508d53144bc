//! Analysis session over a netlist.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::circuit::{validate_netlist, NodeName, Netlist};
use crate::components::{Component, ComponentKind, Source};
use crate::error::{NodalError, Result};
use crate::expr::Expr;

use super::allocator::UnknownAllocator;
use super::kind::{AnalysisKind, Assumptions};
use super::linear;
use super::results::{BranchCurrents, NodeVoltages, Quantity, Unit};
use super::system::{assemble, Assembled, Matrix};

/// Default relative threshold below which a pivot counts as zero.
pub const DEFAULT_PIVOT_TOLERANCE: f64 = 1e-12;

/// Default tolerance for cancelling common factors of results.
pub const DEFAULT_CANCEL_TOLERANCE: f64 = 1e-9;

/// Configuration for an analysis.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Relative pivot threshold for detecting a singular system.
    pub pivot_tolerance: f64,
    /// Whether solved expressions have common factors cancelled.
    pub simplify: bool,
    /// Tolerance used when cancelling common factors.
    pub cancel_tolerance: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            pivot_tolerance: DEFAULT_PIVOT_TOLERANCE,
            simplify: true,
            cancel_tolerance: DEFAULT_CANCEL_TOLERANCE,
        }
    }
}

impl AnalysisConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the relative pivot threshold.
    ///
    /// Pivots are compared after the system has been scaled in frequency and
    /// equilibrated, so the threshold does not depend on element magnitudes.
    pub fn with_pivot_tolerance(mut self, pivot_tolerance: f64) -> Self {
        self.pivot_tolerance = pivot_tolerance;
        self
    }

    /// Enable or disable cancellation of common factors in results.
    pub fn with_simplify(mut self, simplify: bool) -> Self {
        self.simplify = simplify;
        self
    }

    /// Set the tolerance for cancelling common factors.
    pub fn with_cancel_tolerance(mut self, cancel_tolerance: f64) -> Self {
        self.cancel_tolerance = cancel_tolerance;
        self
    }

    fn tidy(&self, value: Expr) -> Expr {
        if self.simplify {
            value.simplify(self.cancel_tolerance)
        } else {
            value
        }
    }
}

/// How far an analysis has progressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisState {
    /// Nothing cached
    Unanalyzed,
    /// Unknowns allocated and the system assembled
    Assembled,
    /// Results published
    Solved,
}

/// Unknowns and the assembled system for one kind.
#[derive(Debug, Clone)]
struct Analysis {
    allocator: UnknownAllocator,
    assembled: Assembled,
}

impl Analysis {
    fn build(netlist: &Netlist, kind: AnalysisKind) -> Result<Self> {
        validate_netlist(netlist)?;
        if kind == AnalysisKind::Time && !reduces_to_dc(netlist) {
            return Err(NodalError::structural(
                "time-domain analysis needs a circuit with only DC sources and no initial conditions",
            ));
        }
        let allocator = UnknownAllocator::new(netlist)?;
        let assembled = assemble(netlist, &allocator, kind)?;
        Ok(Self {
            allocator,
            assembled,
        })
    }
}

fn reduces_to_dc(netlist: &Netlist) -> bool {
    !netlist.has_ic() && netlist.sources().all(Source::is_dc)
}

/// Published results of one solve.
#[derive(Debug, Clone)]
struct Solution {
    assumptions: Assumptions,
    unknowns: Vec<Expr>,
    node_voltages: NodeVoltages,
    branch_currents: BranchCurrents,
    /// Currents of elements without a branch unknown, filled on demand
    derived_currents: HashMap<String, Quantity>,
}

impl Solution {
    fn compute(
        netlist: &Netlist,
        kind: AnalysisKind,
        config: &AnalysisConfig,
        analysis: &Analysis,
    ) -> Result<Self> {
        let Assembled { a, z, .. } = &analysis.assembled;
        debug!(size = a.rows(), %kind, "solving MNA system");
        let unknowns: Vec<Expr> = linear::solve(a, z, config.pivot_tolerance)
            .ok_or_else(|| {
                warn!(%kind, "singular MNA system");
                singular_system(kind)
            })?
            .into_iter()
            .map(|x| config.tidy(x))
            .collect();

        let assumptions = Assumptions::of(netlist);
        let representation = kind.representation();
        let allocator = &analysis.allocator;

        let mut node_voltages = NodeVoltages::new();
        for node in netlist.nodes() {
            let value = match allocator.node_index(&node)? {
                Some(i) => unknowns[i].clone(),
                None => Expr::zero(),
            };
            node_voltages.insert(node, Quantity::new(Unit::Voltage, representation, assumptions, value));
        }

        let nn = allocator.num_nodes();
        let branch_currents: BranchCurrents = allocator
            .branches()
            .enumerate()
            .map(|(j, name)| {
                let value = unknowns[nn + j].clone();
                (
                    name.to_string(),
                    Quantity::new(Unit::Current, representation, assumptions, value),
                )
            })
            .collect();

        debug!(
            nodes = node_voltages.len(),
            branches = branch_currents.len(),
            "published results"
        );
        Ok(Self {
            assumptions,
            unknowns,
            node_voltages,
            branch_currents,
            derived_currents: HashMap::new(),
        })
    }
}

fn singular_system(kind: AnalysisKind) -> NodalError {
    let mut hint = String::from(
        "check for floating nodes, shorted voltage sources and open current sources.",
    );
    if kind == AnalysisKind::Dc {
        hint.push_str(" Check there is a DC path between all nodes.");
    }
    NodalError::SingularSystem {
        kind: kind.to_string(),
        hint,
    }
}

/// An analysis session: a netlist, the kind it is analysed as, and the
/// cached system and results.
///
/// The system is assembled on first use and solved once; results stay valid
/// until the netlist or the kind changes.
#[derive(Debug, Clone)]
pub struct Circuit {
    netlist: Netlist,
    kind: AnalysisKind,
    /// Kind chosen by the caller rather than detected
    kind_fixed: bool,
    config: AnalysisConfig,
    analysis: Option<Analysis>,
    solution: Option<Solution>,
}

impl Circuit {
    /// Create a session analysing `netlist` as its detected kind.
    pub fn new(netlist: Netlist) -> Self {
        Self::with_config(netlist, AnalysisConfig::default())
    }

    /// Create a session with custom configuration.
    pub fn with_config(netlist: Netlist, config: AnalysisConfig) -> Self {
        let kind = AnalysisKind::detect(&netlist);
        Self {
            netlist,
            kind,
            kind_fixed: false,
            config,
            analysis: None,
            solution: None,
        }
    }

    /// Analyse as `kind` instead of the detected kind.
    pub fn with_kind(mut self, kind: AnalysisKind) -> Self {
        self.set_kind(kind);
        self
    }

    pub fn netlist(&self) -> &Netlist {
        &self.netlist
    }

    pub fn into_netlist(self) -> Netlist {
        self.netlist
    }

    pub fn kind(&self) -> AnalysisKind {
        self.kind
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn state(&self) -> AnalysisState {
        match (&self.analysis, &self.solution) {
            (_, Some(_)) => AnalysisState::Solved,
            (Some(_), None) => AnalysisState::Assembled,
            (None, None) => AnalysisState::Unanalyzed,
        }
    }

    // ============ Mutation ============

    pub fn add(&mut self, component: Component) -> Result<()> {
        self.netlist.add(component)?;
        self.netlist_changed();
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> Result<Component> {
        let removed = self.netlist.remove(name)?;
        self.netlist_changed();
        Ok(removed)
    }

    /// Replace the component of the same name, returning the old one.
    pub fn replace(&mut self, component: Component) -> Result<Component> {
        let old = self.netlist.replace(component)?;
        self.netlist_changed();
        Ok(old)
    }

    /// Analyse as `kind` from now on.
    pub fn set_kind(&mut self, kind: AnalysisKind) {
        self.kind_fixed = true;
        if kind != self.kind {
            self.kind = kind;
            self.invalidate();
        }
    }

    fn netlist_changed(&mut self) {
        if !self.kind_fixed {
            self.kind = AnalysisKind::detect(&self.netlist);
        }
        self.invalidate();
    }

    fn invalidate(&mut self) {
        if self.analysis.is_some() || self.solution.is_some() {
            debug!(kind = %self.kind, "invalidating cached analysis");
        }
        self.analysis = None;
        self.solution = None;
    }

    // ============ Analysis ============

    /// Allocate unknowns and assemble the system, if not already done.
    pub fn analyze(&mut self) -> Result<()> {
        self.analysis().map(|_| ())
    }

    /// Solve the system and publish results, if not already done.
    ///
    /// A failed solve publishes nothing.
    pub fn solve(&mut self) -> Result<()> {
        self.solution().map(|_| ())
    }

    fn analysis(&mut self) -> Result<&Analysis> {
        let analysis = match self.analysis.take() {
            Some(analysis) => analysis,
            None => Analysis::build(&self.netlist, self.kind)?,
        };
        Ok(&*self.analysis.insert(analysis))
    }

    fn solution(&mut self) -> Result<&mut Solution> {
        let solution = match self.solution.take() {
            Some(solution) => solution,
            None => {
                if self.kind == AnalysisKind::Superposition {
                    return Err(NodalError::structural(
                        "a superposition of sources must be solved one kind at a time",
                    ));
                }
                self.analysis()?;
                let analysis = self
                    .analysis
                    .as_ref()
                    .ok_or_else(|| NodalError::structural("system was not assembled"))?;
                Solution::compute(&self.netlist, self.kind, &self.config, analysis)?
            }
        };
        Ok(self.solution.insert(solution))
    }

    /// The aggregate system matrix `A`.
    pub fn matrix_a(&mut self) -> Result<&Matrix> {
        Ok(&self.analysis()?.assembled.a)
    }

    /// The aggregate right-hand side `Z`.
    pub fn vector_z(&mut self) -> Result<&[Expr]> {
        Ok(self.analysis()?.assembled.z.as_slice())
    }

    /// Labels of the unknowns `x` in `A x = Z`.
    pub fn unknown_vector(&mut self) -> Result<Vec<String>> {
        Ok(self.analysis()?.allocator.unknown_names())
    }

    /// The solved unknowns, in the order of [`Circuit::unknown_vector`].
    pub fn solution_vector(&mut self) -> Result<&[Expr]> {
        Ok(self.solution()?.unknowns.as_slice())
    }

    pub fn node_voltages(&mut self) -> Result<&NodeVoltages> {
        Ok(&self.solution()?.node_voltages)
    }

    pub fn branch_currents(&mut self) -> Result<&BranchCurrents> {
        Ok(&self.solution()?.branch_currents)
    }

    // ============ Per-element queries ============

    /// Voltage of a node with respect to ground.
    pub fn node_voltage(&mut self, node: impl Into<NodeName>) -> Result<Quantity> {
        let node = node.into();
        self.node_voltages()?
            .get(&node)
            .cloned()
            .ok_or_else(|| NodalError::unknown_node(node.to_string()))
    }

    /// `V(n1) - V(n2)`.
    pub fn voltage_between(
        &mut self,
        n1: impl Into<NodeName>,
        n2: impl Into<NodeName>,
    ) -> Result<Quantity> {
        let v1 = self.node_voltage(n1)?;
        let v2 = self.node_voltage(n2)?;
        let diff = self.config.tidy(v1.expr() - v2.expr());
        Ok(v1.with_value(diff))
    }

    /// Voltage across a component's first two terminals.
    pub fn voltage(&mut self, name: &str) -> Result<Quantity> {
        let (n1, n2) = match self.netlist.component(name)?.nodes() {
            [n1, n2, ..] => (n1.clone(), n2.clone()),
            _ => return Err(NodalError::invalid_value(name, "component has no terminals")),
        };
        self.voltage_between(n1, n2)
    }

    /// Current through a component, from its first terminal to its second.
    ///
    /// Elements with a branch unknown report it directly; the others are
    /// derived from the node voltages on first request and remembered.
    pub fn current(&mut self, name: &str) -> Result<Quantity> {
        let cached = {
            let solution = self.solution()?;
            solution
                .branch_currents
                .get(name)
                .or_else(|| solution.derived_currents.get(name))
                .cloned()
        };
        if let Some(current) = cached {
            return Ok(current);
        }

        let value = self.derive_current(name)?;
        let value = self.config.tidy(value);
        let representation = self.kind.representation();
        let solution = self.solution()?;
        let current = Quantity::new(Unit::Current, representation, solution.assumptions, value);
        solution
            .derived_currents
            .insert(name.to_string(), current.clone());
        Ok(current)
    }

    fn derive_current(&mut self, name: &str) -> Result<Expr> {
        let component = self.netlist.component(name)?.clone();
        let kind = self.kind;
        match component.kind() {
            ComponentKind::Resistor(_)
            | ComponentKind::Capacitor(_)
            | ComponentKind::Impedance(_)
            | ComponentKind::Admittance(_) => {
                let y = kind.select_immittance(name, &component.admittance_s()?)?;
                let v = self.voltage(name)?;
                let isc = component.isc(kind)?;
                Ok(&(&y * v.expr()) - &isc)
            }
            ComponentKind::CurrentSource(_) => component.isc(kind),
            ComponentKind::Vccs { gain } => {
                let nodes = component.nodes();
                let v = self.voltage_between(nodes[2].clone(), nodes[3].clone())?;
                Ok(gain * v.expr())
            }
            ComponentKind::Cccs { control, gain } => {
                let i = self.current(control)?;
                Ok(gain * i.expr())
            }
            ComponentKind::Open | ComponentKind::Port => Ok(Expr::zero()),
            ComponentKind::Wire => Err(NodalError::invalid_value(
                name,
                "current through a wire is not determined by the node voltages",
            )),
            ComponentKind::Mutual { .. } => Err(NodalError::invalid_value(
                name,
                "a mutual inductance carries no current of its own",
            )),
            ComponentKind::Unsupported { class, .. } => Err(NodalError::UnsupportedComponent {
                class: class.to_string(),
                name: name.to_string(),
            }),
            _ => Err(NodalError::unknown_branch(name)),
        }
    }

    /// Short-circuit current of a component as seen by this kind.
    pub fn isc(&self, name: &str) -> Result<Quantity> {
        let value = self.netlist.component(name)?.isc(self.kind)?;
        Ok(self.quantity(Unit::Current, value))
    }

    /// Open-circuit voltage of a component as seen by this kind.
    pub fn voc(&self, name: &str) -> Result<Quantity> {
        let value = self.netlist.component(name)?.voc(self.kind)?;
        Ok(self.quantity(Unit::Voltage, value))
    }

    /// Admittance of a two-terminal component as seen by this kind.
    pub fn admittance(&self, name: &str) -> Result<Quantity> {
        let y = self.netlist.component(name)?.admittance_s()?;
        let value = self.kind.select_immittance(name, &y)?;
        Ok(self.quantity(Unit::Admittance, value))
    }

    /// Impedance of a two-terminal component as seen by this kind.
    pub fn impedance(&self, name: &str) -> Result<Quantity> {
        let z = self.netlist.component(name)?.impedance_s()?;
        let value = self.kind.select_immittance(name, &z)?;
        Ok(self.quantity(Unit::Impedance, value))
    }

    fn quantity(&self, unit: Unit, value: Expr) -> Quantity {
        let assumptions = match &self.solution {
            Some(solution) => solution.assumptions,
            None => Assumptions::of(&self.netlist),
        };
        Quantity::new(unit, self.kind.representation(), assumptions, value)
    }
}
