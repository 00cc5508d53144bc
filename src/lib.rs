//! # Nodal Core
//!
//! A Modified Nodal Analysis engine for linear circuits.
//!
//! This library provides:
//! - A netlist model with namespaced nodes and wire-merged node groups
//! - Stamps for passive elements, independent and dependent sources,
//!   coupled inductors, gyrators, transformers and signal-flow blocks
//! - Exact solving over rational functions of the Laplace variable `s`
//! - DC, phasor, Laplace, initial-value, time and noise views of the results
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`expr`] - Polynomials and rational functions of `s`
//! - [`circuit`] - Node names, the netlist and its validation
//! - [`components`] - Component kinds, source values and the type-tag registry
//! - [`solver`] - Unknown allocation, stamping, solving and result lookup
//!
//! ## Usage
//!
//! ```
//! use nodal_core::{AnalysisKind, Circuit, Component, Netlist, Source};
//!
//! let netlist = Netlist::from_components([
//!     Component::voltage_source("V1", 1, 0, Source::step(1.0)),
//!     Component::resistor("R1", 1, 2, 1e3),
//!     Component::capacitor("C1", 2, 0, 1e-6),
//! ])?;
//!
//! let mut cct = Circuit::new(netlist);
//! assert_eq!(cct.kind(), AnalysisKind::Laplace);
//! let v_out = cct.node_voltage(2)?;
//! println!("V(2) = {}", v_out);
//! # Ok::<(), nodal_core::NodalError>(())
//! ```
//!
//! ## Analysis Method
//!
//! For each analysis:
//!
//! 1. Allocate one unknown per non-ground node and per branch current
//!    that a component needs (voltage sources, inductors, controlled sources)
//! 2. Let each component stamp its contribution into G, B, C, D, Is and Es
//! 3. Solve Ax = z by fraction-free elimination
//! 4. Publish node voltages and branch currents; derive the remaining
//!    element currents on request
//!
//! Circuits mixing source kinds are solved one kind at a time with
//! [`Superposition`].

pub mod circuit;
pub mod components;
pub mod error;
pub mod expr;
pub mod solver;

// Re-export main types for convenience
pub use circuit::{NodeName, Netlist};
pub use components::{Component, ComponentKind, NoiseId, Source, SourcePart};
pub use error::{NodalError, Result};
pub use expr::{Complex64, Expr, Poly};
pub use solver::{AnalysisConfig, AnalysisKind, Circuit, Quantity, Superposition};
