//! Netlist validation.

use tracing::warn;

use crate::error::{NodalError, Result};

use super::Netlist;

/// Validate a netlist before assembling its MNA system.
///
/// Checks:
/// - The netlist has at least one component
/// - It is not an s-domain model (those describe an already transformed
///   circuit)
/// - Some element connects to ground
pub fn validate_netlist(netlist: &Netlist) -> Result<()> {
    if netlist.is_empty() {
        return Err(NodalError::structural("nothing to analyze"));
    }

    if netlist.is_s_model() {
        return Err(NodalError::structural(
            "cannot analyse an s-domain model circuit; analyse the original netlist instead",
        ));
    }

    if !netlist.has_ground_connection() {
        warn!("no element connected to ground");
        return Err(NodalError::structural(
            "nothing connected to ground node 0",
        ));
    }

    Ok(())
}
