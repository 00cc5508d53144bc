//! MNA (Modified Nodal Analysis) engine.
//!
//! ## Modified Nodal Analysis
//!
//! MNA assembles a system of equations Ax = z where:
//! - x contains node voltages and branch currents
//! - A is the coefficient matrix
//! - z is the source vector
//!
//! The matrix structure is:
//! ```text
//! [ G   B ] [ v ]   [ Is ]
//! [ C   D ] [ j ] = [ Es ]
//! ```
//!
//! where:
//! - G holds the admittances between nodes
//! - B and C tie branch currents to nodes
//! - D holds branch impedances and current-controlled couplings
//! - v is the vector of node voltages (ground excluded)
//! - j is the vector of branch currents of voltage-like elements
//! - Is is the sum of current sources into each node
//! - Es is the vector of branch voltage sources
//!
//! Entries are rational functions of `s`. Constant kinds (DC, AC, time)
//! substitute `s` while stamping, so their systems are plain complex numbers.

mod allocator;
mod analysis;
mod kind;
mod linear;
mod results;
mod stamp;
mod superposition;
mod system;

pub use allocator::UnknownAllocator;
pub use analysis::{
    AnalysisConfig, AnalysisState, Circuit, DEFAULT_CANCEL_TOLERANCE, DEFAULT_PIVOT_TOLERANCE,
};
pub use kind::{AnalysisKind, Assumptions, Representation};
pub use linear::solve as solve_linear;
pub use results::{BranchCurrents, NodeVoltages, Quantity, Unit};
pub use superposition::{Superposed, Superposition};
pub use system::{assemble, Assembled, Matrix, StampContext, SystemMatrices};
