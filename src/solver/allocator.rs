//! Unknown allocation: which node voltages and branch currents the MNA
//! system solves for, and at which index.

use std::collections::HashMap;

use indexmap::IndexSet;
use tracing::debug;

use crate::circuit::{NodeName, Netlist};
use crate::error::{NodalError, Result};

/// Index spaces of the node-voltage and branch-current unknowns.
///
/// Ground is never an unknown; its index is `None`. Wire-connected nodes
/// share the index of their group representative.
#[derive(Debug, Clone)]
pub struct UnknownAllocator {
    /// Every netlist node to its group representative
    node_map: HashMap<NodeName, NodeName>,
    /// Non-ground representatives, in first-seen order
    nodes: IndexSet<NodeName>,
    /// Branch-current unknown names, in netlist order
    branches: IndexSet<String>,
}

impl UnknownAllocator {
    pub fn new(netlist: &Netlist) -> Result<Self> {
        if netlist.is_empty() {
            return Err(NodalError::structural("nothing to analyze"));
        }

        let node_map = netlist.node_map();
        let mut nodes = IndexSet::new();
        for node in netlist.nodes() {
            let rep = node_map.get(&node).cloned().unwrap_or(node);
            if !rep.is_ground() {
                nodes.insert(rep);
            }
        }

        let mut branches = IndexSet::new();
        for component in netlist.components() {
            let caps = component.capabilities();
            if caps.need_branch_current {
                insert_branch(&mut branches, component.name().to_string())?;
            }
            if caps.need_extra_branch_current {
                insert_branch(&mut branches, format!("{}X", component.name()))?;
            }
        }

        debug!(
            nodes = nodes.len(),
            branches = branches.len(),
            "allocated unknowns"
        );

        Ok(Self {
            node_map,
            nodes,
            branches,
        })
    }

    /// Number of node-voltage unknowns.
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Number of branch-current unknowns.
    pub fn num_branches(&self) -> usize {
        self.branches.len()
    }

    /// Dimension of the aggregate system.
    pub fn size(&self) -> usize {
        self.num_nodes() + self.num_branches()
    }

    /// Index of a node's voltage unknown; `None` for ground.
    pub fn node_index(&self, node: &NodeName) -> Result<Option<usize>> {
        let rep = self
            .node_map
            .get(node)
            .ok_or_else(|| NodalError::unknown_node(node.to_string()))?;
        if rep.is_ground() {
            return Ok(None);
        }
        self.nodes
            .get_index_of(rep)
            .map(Some)
            .ok_or_else(|| NodalError::unknown_node(node.to_string()))
    }

    /// Index of a branch-current unknown within the branch block.
    pub fn branch_index(&self, name: &str) -> Result<usize> {
        self.branches
            .get_index_of(name)
            .ok_or_else(|| NodalError::unknown_branch(name))
    }

    /// Representative of the group a node belongs to.
    pub fn representative(&self, node: &NodeName) -> Option<&NodeName> {
        self.node_map.get(node)
    }

    /// Non-ground node representatives in unknown order.
    pub fn nodes(&self) -> impl Iterator<Item = &NodeName> {
        self.nodes.iter()
    }

    /// Branch-current names in unknown order.
    pub fn branches(&self) -> impl Iterator<Item = &str> {
        self.branches.iter().map(String::as_str)
    }

    /// Labels of the unknown vector: `V_<node>` then `I_<branch>`.
    pub fn unknown_names(&self) -> Vec<String> {
        self.nodes
            .iter()
            .map(|n| format!("V_{}", n))
            .chain(self.branches.iter().map(|b| format!("I_{}", b)))
            .collect()
    }
}

fn insert_branch(branches: &mut IndexSet<String>, name: String) -> Result<()> {
    if !branches.insert(name.clone()) {
        return Err(NodalError::structural(format!(
            "branch current '{}' allocated twice",
            name
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Component, Source};

    #[test]
    fn test_ground_first_and_excluded() {
        let netlist = Netlist::from_components([
            Component::voltage_source("V1", 1, 0, Source::dc(1.0)),
            Component::resistor("R1", 1, 2, 1.0),
            Component::inductor("L1", 2, 0, 1.0),
        ])
        .unwrap();
        let alloc = UnknownAllocator::new(&netlist).unwrap();
        assert_eq!(alloc.num_nodes(), 2);
        assert_eq!(alloc.num_branches(), 2);
        assert_eq!(alloc.node_index(&NodeName::ground()).unwrap(), None);
        assert_eq!(alloc.node_index(&NodeName::from(2)).unwrap(), Some(1));
        assert_eq!(alloc.branch_index("L1").unwrap(), 1);
        assert_eq!(alloc.unknown_names(), vec!["V_1", "V_2", "I_V1", "I_L1"]);
    }

    #[test]
    fn test_gyrator_gets_two_branches() {
        let netlist = Netlist::from_components([
            Component::gyrator("GY1", (2, 0), (1, 0), 10.0),
            Component::resistor("R1", 1, 0, 1.0),
        ])
        .unwrap();
        let alloc = UnknownAllocator::new(&netlist).unwrap();
        assert_eq!(alloc.branches().collect::<Vec<_>>(), vec!["GY1", "GY1X"]);
    }

    #[test]
    fn test_wire_aliases_share_index() {
        let netlist = Netlist::from_components([
            Component::resistor("R1", 1, 2, 1.0),
            Component::wire("W1", 2, 3),
            Component::resistor("R2", 3, 0, 1.0),
        ])
        .unwrap();
        let alloc = UnknownAllocator::new(&netlist).unwrap();
        assert_eq!(alloc.num_nodes(), 2);
        assert_eq!(
            alloc.node_index(&NodeName::from(3)).unwrap(),
            alloc.node_index(&NodeName::from(2)).unwrap()
        );
    }

    #[test]
    fn test_lookup_errors() {
        let netlist = Netlist::from_components([Component::resistor("R1", 1, 0, 1.0)]).unwrap();
        let alloc = UnknownAllocator::new(&netlist).unwrap();
        assert!(matches!(
            alloc.node_index(&NodeName::from("nowhere")),
            Err(NodalError::UnknownReference { what: "node", .. })
        ));
        assert!(matches!(
            alloc.branch_index("V9"),
            Err(NodalError::UnknownReference { what: "branch", .. })
        ));
        assert!(UnknownAllocator::new(&Netlist::new()).is_err());
    }
}
