//! Circuit description and validation.
//!
//! This module provides node identity ([`NodeName`]), the ordered component
//! list ([`Netlist`]) with its wire-merged node groups, and the checks run
//! before a netlist is analysed.

mod netlist;
mod types;
mod validate;

pub use netlist::Netlist;
pub use types::*;
pub use validate::validate_netlist;
