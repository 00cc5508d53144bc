//! Linear passive components: Resistor, Capacitor, Inductor and generic
//! impedance/admittance elements.
//!
//! Values here are s-domain; the analysis kind substitutes `s` before
//! stamping (see [`crate::solver::AnalysisKind::select_immittance`]).

use crate::expr::Expr;

/// A resistor.
#[derive(Debug, Clone, PartialEq)]
pub struct Resistor {
    pub resistance: f64,
}

impl Resistor {
    pub fn new(resistance: f64) -> Self {
        Self { resistance }
    }

    pub fn impedance(&self) -> Expr {
        Expr::from(self.resistance)
    }

    pub fn admittance(&self) -> Option<Expr> {
        self.impedance().recip()
    }
}

/// A capacitor with an optional initial voltage.
///
/// Its s-domain model is `Z = 1/(sC)` in series with a voltage source
/// `v0/s`, or equivalently `Y = sC` in parallel with a current source `C*v0`.
#[derive(Debug, Clone, PartialEq)]
pub struct Capacitor {
    pub capacitance: f64,
    pub v0: Option<f64>,
}

impl Capacitor {
    pub fn new(capacitance: f64) -> Self {
        Self {
            capacitance,
            v0: None,
        }
    }

    pub fn with_initial_voltage(capacitance: f64, v0: f64) -> Self {
        Self {
            capacitance,
            v0: Some(v0),
        }
    }

    pub fn impedance(&self) -> Option<Expr> {
        self.admittance().recip()
    }

    pub fn admittance(&self) -> Expr {
        Expr::s().scale(self.capacitance)
    }

    /// True when an initial voltage was given, even if it is zero.
    pub fn has_ic(&self) -> bool {
        self.v0.is_some()
    }

    /// Thevenin voltage of the initial condition, `v0/s`.
    pub fn initial_voc(&self) -> Expr {
        Expr::from(self.v0.unwrap_or(0.0))
            .checked_div(&Expr::s())
            .unwrap_or_default()
    }

    /// Norton current of the initial condition, `C*v0`.
    pub fn initial_isc(&self) -> Expr {
        Expr::from(self.capacitance * self.v0.unwrap_or(0.0))
    }
}

/// An inductor with an optional initial current.
///
/// Its s-domain model is `Z = sL` in series with a voltage source `-L*i0`.
#[derive(Debug, Clone, PartialEq)]
pub struct Inductor {
    pub inductance: f64,
    pub i0: Option<f64>,
}

impl Inductor {
    pub fn new(inductance: f64) -> Self {
        Self {
            inductance,
            i0: None,
        }
    }

    pub fn with_initial_current(inductance: f64, i0: f64) -> Self {
        Self {
            inductance,
            i0: Some(i0),
        }
    }

    pub fn impedance(&self) -> Expr {
        Expr::s().scale(self.inductance)
    }

    pub fn admittance(&self) -> Option<Expr> {
        self.impedance().recip()
    }

    pub fn has_ic(&self) -> bool {
        self.i0.is_some()
    }

    /// Thevenin voltage of the initial condition, `-L*i0`.
    pub fn initial_voc(&self) -> Expr {
        Expr::from(-self.inductance * self.i0.unwrap_or(0.0))
    }

    /// Norton current of the initial condition, `-i0/s`.
    pub fn initial_isc(&self) -> Expr {
        Expr::from(-self.i0.unwrap_or(0.0))
            .checked_div(&Expr::s())
            .unwrap_or_default()
    }
}

/// A generic element given by its s-domain impedance.
#[derive(Debug, Clone, PartialEq)]
pub struct Impedance {
    pub z: Expr,
}

/// A generic element given by its s-domain admittance.
#[derive(Debug, Clone, PartialEq)]
pub struct Admittance {
    pub y: Expr,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Complex64;
    use approx::assert_relative_eq;

    #[test]
    fn test_resistor_conductance() {
        let r = Resistor::new(1000.0);
        let g = r.admittance().unwrap().as_constant().unwrap();
        assert!((g.re - 0.001).abs() < 1e-10);
    }

    #[test]
    fn test_capacitor_initial_condition_model() {
        let c = Capacitor::with_initial_voltage(2.0, 5.0);
        let s = Complex64::new(0.5, 0.0);
        // Isc = Voc / Z = (v0/s) * sC
        let voc = c.initial_voc().eval(s).unwrap();
        let z = c.impedance().unwrap().eval(s).unwrap();
        assert_relative_eq!((voc / z).re, c.initial_isc().as_constant().unwrap().re);
        assert_relative_eq!(voc.re, 10.0);
    }

    #[test]
    fn test_inductor_initial_condition_model() {
        let l = Inductor::with_initial_current(0.5, 2.0);
        assert_eq!(l.initial_voc().as_constant(), Some(Complex64::new(-1.0, 0.0)));
        let s = Complex64::new(4.0, 0.0);
        assert_relative_eq!(l.initial_isc().eval(s).unwrap().re, -0.5);
        assert!(!Inductor::new(1.0).has_ic());
    }
}
