//! Solved quantities and the dictionaries they are published in.

use std::fmt;

use indexmap::IndexMap;

use crate::circuit::NodeName;
use crate::expr::{Complex64, Expr};

use super::kind::{Assumptions, Representation};

/// Physical unit of a quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Voltage,
    Current,
    Impedance,
    Admittance,
}

impl Unit {
    pub fn symbol(&self) -> &'static str {
        match self {
            Unit::Voltage => "V",
            Unit::Current => "A",
            Unit::Impedance => "ohm",
            Unit::Admittance => "S",
        }
    }
}

/// A solved value tagged with the domain it lives in.
#[derive(Debug, Clone, PartialEq)]
pub struct Quantity {
    pub unit: Unit,
    pub representation: Representation,
    /// Source-mix properties the value was derived under
    pub assumptions: Assumptions,
    value: Expr,
}

impl Quantity {
    pub fn new(
        unit: Unit,
        representation: Representation,
        assumptions: Assumptions,
        value: Expr,
    ) -> Self {
        Self {
            unit,
            representation,
            assumptions,
            value,
        }
    }

    /// The zero of a domain.
    pub fn zero(unit: Unit, representation: Representation, assumptions: Assumptions) -> Self {
        Self::new(unit, representation, assumptions, Expr::zero())
    }

    /// The underlying expression.
    pub fn expr(&self) -> &Expr {
        &self.value
    }

    pub fn into_expr(self) -> Expr {
        self.value
    }

    pub fn is_zero(&self) -> bool {
        self.value.is_zero()
    }

    /// The value as a single number, for constant and phasor quantities.
    pub fn constant(&self) -> Option<Complex64> {
        self.value.as_constant()
    }

    /// Complex amplitude at the phasor's angular frequency.
    pub fn phasor(&self) -> Option<(Complex64, f64)> {
        match self.representation {
            Representation::Phasor { omega } => self.constant().map(|v| (v, omega)),
            _ => None,
        }
    }

    /// The value as a function of `s`, for Laplace quantities.
    pub fn laplace(&self) -> Option<&Expr> {
        match self.representation {
            Representation::Laplace => Some(&self.value),
            _ => None,
        }
    }

    /// Noise amplitude spectral density at `omega`: `|value(jω)|`.
    pub fn noise_asd(&self, omega: f64) -> Option<f64> {
        match self.representation {
            Representation::Noise { .. } => self.value.at_omega(omega).map(|v| v.norm()),
            _ => None,
        }
    }

    /// Same domain and unit, new value.
    pub(crate) fn with_value(&self, value: Expr) -> Self {
        Self {
            unit: self.unit,
            representation: self.representation,
            assumptions: self.assumptions,
            value,
        }
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.unit.symbol())
    }
}

/// Node voltages, keyed by node, in netlist order with ground first.
pub type NodeVoltages = IndexMap<NodeName, Quantity>;

/// Branch currents, keyed by component name.
pub type BranchCurrents = IndexMap<String, Quantity>;
