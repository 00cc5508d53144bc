//! Static registry of component type tags.
//!
//! Maps netlist type tags such as `Vdc`, `Istep`, `TFcore` or `SWno` to a
//! constructor. Tags for parts the linear engine cannot analyse build
//! [`ComponentKind::Unsupported`] components carrying their class.

use num_complex::Complex64;

use super::{Component, ComponentKind, NoiseId, Source, SummingSigns, UnsupportedClass};
use crate::circuit::NodeName;
use crate::error::{NodalError, Result};
use crate::expr::Expr;

/// A positional component argument.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Value(f64),
    Expr(Expr),
    /// Reference to another component, e.g. the control of an `F` source
    Name(String),
}

impl Arg {
    pub fn as_expr(&self) -> Option<Expr> {
        match self {
            Arg::Value(v) => Some(Expr::from(*v)),
            Arg::Expr(e) => Some(e.clone()),
            Arg::Name(_) => None,
        }
    }

    /// Real numeric value, also accepted from a real constant expression.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Arg::Value(v) => Some(*v),
            Arg::Expr(e) => e.as_constant().filter(|c| c.im == 0.0).map(|c| c.re),
            Arg::Name(_) => None,
        }
    }

    pub fn as_name(&self) -> Option<&str> {
        match self {
            Arg::Name(name) => Some(name.as_str()),
            _ => None,
        }
    }
}

impl From<f64> for Arg {
    fn from(value: f64) -> Self {
        Arg::Value(value)
    }
}

impl From<Expr> for Arg {
    fn from(value: Expr) -> Self {
        Arg::Expr(value)
    }
}

impl From<&str> for Arg {
    fn from(value: &str) -> Self {
        Arg::Name(value.to_string())
    }
}

type Builder = fn(&str, Vec<NodeName>, &[Arg]) -> Result<Component>;

/// How a registry entry builds its component.
#[derive(Clone, Copy)]
pub enum Build {
    Linear(Builder),
    Unsupported(UnsupportedClass),
}

/// One registered type tag.
#[derive(Clone, Copy)]
pub struct Entry {
    pub tag: &'static str,
    pub description: &'static str,
    pub build: Build,
}

impl Entry {
    /// Class of an unsupported tag, `None` for analysable ones.
    pub fn unsupported_class(&self) -> Option<UnsupportedClass> {
        match self.build {
            Build::Linear(_) => None,
            Build::Unsupported(class) => Some(class),
        }
    }
}

macro_rules! linear {
    ($tag:expr, $desc:expr, $build:expr) => {
        Entry {
            tag: $tag,
            description: $desc,
            build: Build::Linear($build),
        }
    };
}

macro_rules! unsupported {
    ($tag:expr, $desc:expr, $class:ident) => {
        Entry {
            tag: $tag,
            description: $desc,
            build: Build::Unsupported(UnsupportedClass::$class),
        }
    };
}

static REGISTRY: &[Entry] = &[
    // Passive
    linear!("R", "Resistor", build_resistor),
    linear!("C", "Capacitor", build_capacitor),
    linear!("L", "Inductor", build_inductor),
    linear!("Z", "Impedance", build_impedance),
    linear!("Y", "Admittance", build_admittance),
    // Independent sources
    linear!("V", "Voltage source", build_v),
    linear!("Vdc", "DC voltage source", build_vdc),
    linear!("BAT", "Battery", build_vdc),
    linear!("Vstep", "Step voltage source", build_vstep),
    linear!("Vac", "AC voltage source", build_vac),
    linear!("Vnoise", "Noise voltage source", build_vnoise),
    linear!("sV", "s-domain voltage source", build_sv),
    linear!("I", "Current source", build_i),
    linear!("Idc", "DC current source", build_idc),
    linear!("Istep", "Step current source", build_istep),
    linear!("Iac", "AC current source", build_iac),
    linear!("Inoise", "Noise current source", build_inoise),
    linear!("sI", "s-domain current source", build_si),
    // Dependent sources
    linear!("E", "Voltage-controlled voltage source", build_vcvs),
    linear!("Eopamp", "Opamp", build_vcvs),
    linear!("F", "Current-controlled current source", build_cccs),
    linear!("G", "Voltage-controlled current source", build_vccs),
    linear!("H", "Current-controlled voltage source", build_ccvs),
    // Coupling
    linear!("K", "Mutual inductance", build_mutual),
    linear!("GY", "Gyrator", build_gyrator),
    linear!("TF", "Transformer", build_transformer),
    linear!("TFcore", "Transformer with core", build_transformer),
    linear!("TR", "Transfer function", build_transfer_function),
    // Connectivity
    linear!("W", "Wire", build_wire),
    linear!("AM", "Ammeter", build_wire),
    linear!("O", "Open circuit", build_open),
    linear!("VM", "Voltmeter", build_open),
    linear!("P", "Port", build_port),
    // Signal flow
    linear!("SPpp", "Summing point", build_sp_pp),
    linear!("SPpm", "Summing point", build_sp_pm),
    linear!("SPppp", "Summing point", build_sp_ppp),
    linear!("SPpmm", "Summing point", build_sp_pmm),
    linear!("SPppm", "Summing point", build_sp_ppm),
    // Not analysable
    unsupported!("D", "Diode", NonLinear),
    unsupported!("Dled", "LED", NonLinear),
    unsupported!("Dphoto", "Photo diode", NonLinear),
    unsupported!("Dschottky", "Schottky diode", NonLinear),
    unsupported!("Dtunnel", "Tunnel diode", NonLinear),
    unsupported!("Dzener", "Zener diode", NonLinear),
    unsupported!("J", "N JFET transistor", NonLinear),
    unsupported!("Jnjf", "N JFET transistor", NonLinear),
    unsupported!("Jpjf", "P JFET transistor", NonLinear),
    unsupported!("M", "N MOSFET transistor", NonLinear),
    unsupported!("Mnmos", "N channel MOSFET transistor", NonLinear),
    unsupported!("Mpmos", "P channel MOSFET transistor", NonLinear),
    unsupported!("Q", "NPN transistor", NonLinear),
    unsupported!("Qnpn", "NPN transistor", NonLinear),
    unsupported!("Qpnp", "PNP transistor", NonLinear),
    unsupported!("SW", "Switch", TimeVarying),
    unsupported!("SWno", "Normally open switch", TimeVarying),
    unsupported!("SWnc", "Normally closed switch", TimeVarying),
    unsupported!("SWpush", "Pushbutton switch", TimeVarying),
    unsupported!("SWspdt", "SPDT switch", TimeVarying),
    unsupported!("Ubuffer", "Buffer", Logic),
    unsupported!("Upbuffer", "Buffer with power supplies", Logic),
    unsupported!("Uinverter", "Inverter", Logic),
    unsupported!("Upinverter", "Inverter with power supplies", Logic),
    unsupported!("Uchip1310", "General purpose chip", Logic),
    unsupported!("Uchip2121", "General purpose chip", Logic),
    unsupported!("Uchip3131", "General purpose chip", Logic),
    unsupported!("Uchip4141", "General purpose chip", Logic),
    unsupported!("Efdopamp", "Fully differential opamp", Misc),
    unsupported!("Udiffamp", "Differential amplifier", Misc),
    unsupported!("Uadc", "ADC", Misc),
    unsupported!("Udac", "DAC", Misc),
    unsupported!("TFtap", "Tapped transformer", Misc),
    unsupported!("TFtapcore", "Tapped transformer with core", Misc),
    unsupported!("TL", "Transmission line", Misc),
    unsupported!("TP", "Two port", Misc),
    unsupported!("FB", "Ferrite bead", Misc),
    unsupported!("XT", "Crystal", Misc),
    unsupported!("MX", "Mixer", Misc),
];

/// Look up a type tag.
pub fn lookup(tag: &str) -> Option<&'static Entry> {
    REGISTRY.iter().find(|entry| entry.tag == tag)
}

/// All registered tags, in registry order.
pub fn tags() -> impl Iterator<Item = &'static str> {
    REGISTRY.iter().map(|entry| entry.tag)
}

/// Build a component from its type tag, nodes and positional arguments.
pub fn make(tag: &str, name: &str, nodes: Vec<NodeName>, args: &[Arg]) -> Result<Component> {
    let entry = lookup(tag).ok_or_else(|| NodalError::UnknownComponentType {
        tag: tag.to_string(),
    })?;
    match entry.build {
        Build::Linear(build) => build(name, nodes, args),
        Build::Unsupported(class) => Ok(Component::unsupported(name, nodes, class, entry.description)),
    }
}

// ============ Argument helpers ============

fn arg<'a>(name: &str, args: &'a [Arg], index: usize) -> Result<&'a Arg> {
    args.get(index)
        .ok_or_else(|| NodalError::invalid_value(name, format!("missing argument {}", index + 1)))
}

fn value(name: &str, args: &[Arg], index: usize) -> Result<f64> {
    arg(name, args, index)?
        .as_f64()
        .ok_or_else(|| NodalError::invalid_value(name, format!("argument {} must be a real number", index + 1)))
}

fn optional_value(name: &str, args: &[Arg], index: usize) -> Result<Option<f64>> {
    match args.get(index) {
        Some(_) => value(name, args, index).map(Some),
        None => Ok(None),
    }
}

fn expr(name: &str, args: &[Arg], index: usize) -> Result<Expr> {
    arg(name, args, index)?
        .as_expr()
        .ok_or_else(|| NodalError::invalid_value(name, format!("argument {} must be a value", index + 1)))
}

fn reference(name: &str, args: &[Arg], index: usize) -> Result<String> {
    arg(name, args, index)?
        .as_name()
        .map(str::to_string)
        .ok_or_else(|| NodalError::invalid_value(name, format!("argument {} must be a component name", index + 1)))
}

// ============ Builders ============

fn build_resistor(name: &str, nodes: Vec<NodeName>, args: &[Arg]) -> Result<Component> {
    let r = value(name, args, 0)?;
    Component::new(name, nodes, ComponentKind::Resistor(super::Resistor::new(r)))
}

fn build_capacitor(name: &str, nodes: Vec<NodeName>, args: &[Arg]) -> Result<Component> {
    let c = super::Capacitor {
        capacitance: value(name, args, 0)?,
        v0: optional_value(name, args, 1)?,
    };
    Component::new(name, nodes, ComponentKind::Capacitor(c))
}

fn build_inductor(name: &str, nodes: Vec<NodeName>, args: &[Arg]) -> Result<Component> {
    let l = super::Inductor {
        inductance: value(name, args, 0)?,
        i0: optional_value(name, args, 1)?,
    };
    Component::new(name, nodes, ComponentKind::Inductor(l))
}

fn build_impedance(name: &str, nodes: Vec<NodeName>, args: &[Arg]) -> Result<Component> {
    let z = expr(name, args, 0)?;
    Component::new(name, nodes, ComponentKind::Impedance(super::Impedance { z }))
}

fn build_admittance(name: &str, nodes: Vec<NodeName>, args: &[Arg]) -> Result<Component> {
    let y = expr(name, args, 0)?;
    Component::new(name, nodes, ComponentKind::Admittance(super::Admittance { y }))
}

/// Untyped source value: a constant is DC, anything depending on `s` is a
/// Laplace transient.
fn generic_source(name: &str, args: &[Arg]) -> Result<Source> {
    let e = expr(name, args, 0)?;
    Ok(match e.as_constant() {
        Some(c) if c.im == 0.0 => Source::dc(c.re),
        _ => Source::laplace(e),
    })
}

fn ac_source(name: &str, args: &[Arg]) -> Result<Source> {
    let amplitude = value(name, args, 0)?;
    let omega = value(name, args, 1)?;
    let phase = optional_value(name, args, 2)?.unwrap_or(0.0);
    Ok(Source::ac(Complex64::from_polar(amplitude, phase), omega))
}

fn noise_source(name: &str, args: &[Arg]) -> Result<Source> {
    let asd = value(name, args, 0)?;
    let id = optional_value(name, args, 1)?.unwrap_or(0.0);
    if id < 0.0 || id.fract() != 0.0 {
        return Err(NodalError::invalid_value(name, "noise id must be a non-negative integer"));
    }
    Ok(Source::noise(asd, NoiseId(id as u32)))
}

fn voltage(name: &str, nodes: Vec<NodeName>, source: Source) -> Result<Component> {
    Component::new(name, nodes, ComponentKind::VoltageSource(source))
}

fn current(name: &str, nodes: Vec<NodeName>, source: Source) -> Result<Component> {
    Component::new(name, nodes, ComponentKind::CurrentSource(source))
}

fn build_v(name: &str, nodes: Vec<NodeName>, args: &[Arg]) -> Result<Component> {
    voltage(name, nodes, generic_source(name, args)?)
}

fn build_vdc(name: &str, nodes: Vec<NodeName>, args: &[Arg]) -> Result<Component> {
    voltage(name, nodes, Source::dc(value(name, args, 0)?))
}

fn build_vstep(name: &str, nodes: Vec<NodeName>, args: &[Arg]) -> Result<Component> {
    voltage(name, nodes, Source::step(value(name, args, 0)?))
}

fn build_vac(name: &str, nodes: Vec<NodeName>, args: &[Arg]) -> Result<Component> {
    voltage(name, nodes, ac_source(name, args)?)
}

fn build_vnoise(name: &str, nodes: Vec<NodeName>, args: &[Arg]) -> Result<Component> {
    voltage(name, nodes, noise_source(name, args)?)
}

fn build_sv(name: &str, nodes: Vec<NodeName>, args: &[Arg]) -> Result<Component> {
    voltage(name, nodes, Source::laplace(expr(name, args, 0)?))
}

fn build_i(name: &str, nodes: Vec<NodeName>, args: &[Arg]) -> Result<Component> {
    current(name, nodes, generic_source(name, args)?)
}

fn build_idc(name: &str, nodes: Vec<NodeName>, args: &[Arg]) -> Result<Component> {
    current(name, nodes, Source::dc(value(name, args, 0)?))
}

fn build_istep(name: &str, nodes: Vec<NodeName>, args: &[Arg]) -> Result<Component> {
    current(name, nodes, Source::step(value(name, args, 0)?))
}

fn build_iac(name: &str, nodes: Vec<NodeName>, args: &[Arg]) -> Result<Component> {
    current(name, nodes, ac_source(name, args)?)
}

fn build_inoise(name: &str, nodes: Vec<NodeName>, args: &[Arg]) -> Result<Component> {
    current(name, nodes, noise_source(name, args)?)
}

fn build_si(name: &str, nodes: Vec<NodeName>, args: &[Arg]) -> Result<Component> {
    current(name, nodes, Source::laplace(expr(name, args, 0)?))
}

fn build_vcvs(name: &str, nodes: Vec<NodeName>, args: &[Arg]) -> Result<Component> {
    let gain = expr(name, args, 0)?;
    Component::new(name, nodes, ComponentKind::Vcvs { gain })
}

fn build_cccs(name: &str, nodes: Vec<NodeName>, args: &[Arg]) -> Result<Component> {
    let control = reference(name, args, 0)?;
    let gain = expr(name, args, 1)?;
    Component::new(name, nodes, ComponentKind::Cccs { control, gain })
}

fn build_vccs(name: &str, nodes: Vec<NodeName>, args: &[Arg]) -> Result<Component> {
    let gain = expr(name, args, 0)?;
    Component::new(name, nodes, ComponentKind::Vccs { gain })
}

fn build_ccvs(name: &str, nodes: Vec<NodeName>, args: &[Arg]) -> Result<Component> {
    let control = reference(name, args, 0)?;
    let gain = expr(name, args, 1)?;
    Component::new(name, nodes, ComponentKind::Ccvs { control, gain })
}

fn build_mutual(name: &str, nodes: Vec<NodeName>, args: &[Arg]) -> Result<Component> {
    let kind = ComponentKind::Mutual {
        inductor1: reference(name, args, 0)?,
        inductor2: reference(name, args, 1)?,
        coupling: value(name, args, 2)?,
    };
    Component::new(name, nodes, kind)
}

fn build_gyrator(name: &str, nodes: Vec<NodeName>, args: &[Arg]) -> Result<Component> {
    let impedance = expr(name, args, 0)?;
    Component::new(name, nodes, ComponentKind::Gyrator { impedance })
}

fn build_transformer(name: &str, nodes: Vec<NodeName>, args: &[Arg]) -> Result<Component> {
    let ratio = expr(name, args, 0)?;
    Component::new(name, nodes, ComponentKind::Transformer { ratio })
}

fn build_transfer_function(name: &str, nodes: Vec<NodeName>, args: &[Arg]) -> Result<Component> {
    let gain = expr(name, args, 0)?;
    Component::new(name, nodes, ComponentKind::TransferFunction { gain })
}

fn build_wire(name: &str, nodes: Vec<NodeName>, _args: &[Arg]) -> Result<Component> {
    Component::new(name, nodes, ComponentKind::Wire)
}

fn build_open(name: &str, nodes: Vec<NodeName>, _args: &[Arg]) -> Result<Component> {
    Component::new(name, nodes, ComponentKind::Open)
}

fn build_port(name: &str, nodes: Vec<NodeName>, _args: &[Arg]) -> Result<Component> {
    Component::new(name, nodes, ComponentKind::Port)
}

fn summing_point(name: &str, nodes: Vec<NodeName>, signs: SummingSigns) -> Result<Component> {
    Component::summing_point(name, nodes, signs)
}

fn build_sp_pp(name: &str, nodes: Vec<NodeName>, _args: &[Arg]) -> Result<Component> {
    summing_point(name, nodes, SummingSigns::Pp)
}

fn build_sp_pm(name: &str, nodes: Vec<NodeName>, _args: &[Arg]) -> Result<Component> {
    summing_point(name, nodes, SummingSigns::Pm)
}

fn build_sp_ppp(name: &str, nodes: Vec<NodeName>, _args: &[Arg]) -> Result<Component> {
    summing_point(name, nodes, SummingSigns::Ppp)
}

fn build_sp_pmm(name: &str, nodes: Vec<NodeName>, _args: &[Arg]) -> Result<Component> {
    summing_point(name, nodes, SummingSigns::Pmm)
}

fn build_sp_ppm(name: &str, nodes: Vec<NodeName>, _args: &[Arg]) -> Result<Component> {
    summing_point(name, nodes, SummingSigns::Ppm)
}
