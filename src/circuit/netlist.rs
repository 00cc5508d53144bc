//! Ordered, name-indexed component list.

use std::collections::HashMap;

use indexmap::IndexMap;
use tracing::debug;

use super::types::NodeName;
use crate::components::{Component, ComponentKind, Source};
use crate::error::{NodalError, Result};
use crate::expr::Expr;
use crate::solver::AnalysisKind;

/// A circuit description: components in insertion order, keyed by name.
///
/// Nodes joined by wires form one equipotential group; the analysis sees
/// only the group representatives.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Netlist {
    components: IndexMap<String, Component>,
    /// Set on netlists produced by [`Netlist::s_model`]
    s_model: bool,
}

impl Netlist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a netlist from components, rejecting duplicate names.
    pub fn from_components(components: impl IntoIterator<Item = Component>) -> Result<Self> {
        let mut netlist = Self::new();
        for component in components {
            netlist.add(component)?;
        }
        Ok(netlist)
    }

    pub fn add(&mut self, component: Component) -> Result<()> {
        if self.components.contains_key(component.name()) {
            return Err(NodalError::DuplicateComponent {
                name: component.name.clone(),
            });
        }
        self.components.insert(component.name.clone(), component);
        Ok(())
    }

    /// Remove a component, keeping the order of the rest.
    pub fn remove(&mut self, name: &str) -> Result<Component> {
        self.components
            .shift_remove(name)
            .ok_or_else(|| NodalError::unknown_component(name))
    }

    /// Replace the component with the same name in place, returning the old one.
    pub fn replace(&mut self, component: Component) -> Result<Component> {
        let slot = self
            .components
            .get_mut(component.name())
            .ok_or_else(|| NodalError::unknown_component(component.name()))?;
        Ok(std::mem::replace(slot, component))
    }

    pub fn get(&self, name: &str) -> Option<&Component> {
        self.components.get(name)
    }

    pub fn component(&self, name: &str) -> Result<&Component> {
        self.get(name).ok_or_else(|| NodalError::unknown_component(name))
    }

    pub fn components(&self) -> impl Iterator<Item = &Component> {
        self.components.values()
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// True for netlists produced by [`Netlist::s_model`].
    pub fn is_s_model(&self) -> bool {
        self.s_model
    }

    /// Every node mentioned by a component, ground first, then in order of
    /// first appearance.
    pub fn nodes(&self) -> Vec<NodeName> {
        let mut nodes = vec![NodeName::ground()];
        for node in self.components().flat_map(|c| c.nodes().iter()) {
            if !nodes.contains(node) {
                nodes.push(node.clone());
            }
        }
        nodes
    }

    /// Map from every node to the representative of its wire-connected
    /// group. A group containing ground is represented by ground; otherwise
    /// by its first-seen member.
    pub fn node_map(&self) -> HashMap<NodeName, NodeName> {
        let nodes = self.nodes();
        let index: HashMap<&NodeName, usize> = nodes.iter().enumerate().map(|(i, n)| (n, i)).collect();
        let mut parent: Vec<usize> = (0..nodes.len()).collect();

        fn find(parent: &mut [usize], mut i: usize) -> usize {
            while parent[i] != i {
                parent[i] = parent[parent[i]];
                i = parent[i];
            }
            i
        }

        for component in self.components() {
            if !matches!(component.kind, ComponentKind::Wire) {
                continue;
            }
            let a = find(&mut parent, index[&component.nodes[0]]);
            let b = find(&mut parent, index[&component.nodes[1]]);
            // The smaller index is seen first; ground is index 0.
            if a < b {
                parent[b] = a;
            } else {
                parent[a] = b;
            }
        }

        (0..nodes.len())
            .map(|i| {
                let root = find(&mut parent, i);
                (nodes[i].clone(), nodes[root].clone())
            })
            .collect()
    }

    /// Wire-connected node groups keyed by representative, in node order.
    pub fn equipotential_nodes(&self) -> IndexMap<NodeName, Vec<NodeName>> {
        let map = self.node_map();
        let mut groups: IndexMap<NodeName, Vec<NodeName>> = IndexMap::new();
        for node in self.nodes() {
            let rep = map.get(&node).cloned().unwrap_or_else(|| node.clone());
            groups.entry(rep).or_default().push(node);
        }
        groups
    }

    /// True when some element other than a wire touches the ground group.
    pub fn has_ground_connection(&self) -> bool {
        let map = self.node_map();
        self.components()
            .filter(|c| !matches!(c.kind, ComponentKind::Wire))
            .flat_map(|c| c.nodes().iter())
            .any(|n| map.get(n).map_or(n.is_ground(), NodeName::is_ground))
    }

    // ============ Source mix ============

    /// Independent source values in netlist order.
    pub fn sources(&self) -> impl Iterator<Item = &Source> {
        self.components().filter_map(Component::source)
    }

    /// True when there are independent sources and all are DC.
    pub fn is_dc(&self) -> bool {
        self.sources().next().is_some() && self.sources().all(Source::is_dc)
    }

    /// True when there are independent sources and all are AC.
    pub fn is_ac(&self) -> bool {
        self.sources().next().is_some() && self.sources().all(Source::is_ac)
    }

    /// True when every independent source is zero before `t = 0`.
    pub fn is_causal(&self) -> bool {
        self.sources().all(Source::is_causal)
    }

    /// True when a reactive element carries an initial condition.
    pub fn has_ic(&self) -> bool {
        self.components().any(Component::has_ic)
    }

    /// Initial-value problem: some element has an explicit initial condition.
    pub fn is_ivp(&self) -> bool {
        self.has_ic()
    }

    /// True when some source has a Laplace-domain transient.
    pub fn has_s(&self) -> bool {
        self.sources().any(Source::has_s)
    }

    /// Distinct analysis kinds over all source parts, in order of appearance.
    pub fn source_kinds(&self) -> Vec<AnalysisKind> {
        let mut kinds: Vec<AnalysisKind> = Vec::new();
        for kind in self.sources().flat_map(Source::kinds) {
            if !kinds.contains(&kind) {
                kinds.push(kind);
            }
        }
        kinds
    }

    // ============ Transformations ============

    /// Kill a source in place: voltage sources become wires, current
    /// sources opens.
    pub fn kill(&mut self, name: &str) -> Result<()> {
        let component = self.component(name)?;
        let short = match component.kind {
            ComponentKind::VoltageSource(_) | ComponentKind::Vcvs { .. } | ComponentKind::Ccvs { .. } => true,
            ComponentKind::CurrentSource(_) | ComponentKind::Cccs { .. } | ComponentKind::Vccs { .. } => false,
            _ => {
                return Err(NodalError::NotASource {
                    name: name.to_string(),
                })
            }
        };
        let (n1, n2) = (component.nodes[0].clone(), component.nodes[1].clone());
        let killed = if short {
            Component::wire(name, n1, n2)
        } else {
            Component::open(name, n1, n2)
        };
        debug!(component = name, "killed source");
        self.replace(killed)?;
        Ok(())
    }

    /// Set an independent source to zero, keeping it in the circuit.
    pub fn zero(&mut self, name: &str) -> Result<()> {
        let component = self.component(name)?;
        let kind = match component.kind {
            ComponentKind::VoltageSource(_) => ComponentKind::VoltageSource(Source::zero()),
            ComponentKind::CurrentSource(_) => ComponentKind::CurrentSource(Source::zero()),
            _ => {
                return Err(NodalError::NotASource {
                    name: name.to_string(),
                })
            }
        };
        let zeroed = Component::new(name, component.nodes.clone(), kind)?;
        self.replace(zeroed)?;
        Ok(())
    }

    /// Drop every initial condition.
    pub fn kill_initial(&mut self) {
        for component in self.components.values_mut() {
            match &mut component.kind {
                ComponentKind::Capacitor(c) => c.v0 = None,
                ComponentKind::Inductor(l) => l.i0 = None,
                _ => {}
            }
        }
    }

    /// Instantiate `sub` inside namespace `ns`: component names, nodes and
    /// control references are qualified, ground is shared.
    pub fn merge_namespaced(&mut self, ns: &str, sub: &Netlist) -> Result<()> {
        for component in sub.components() {
            self.add(component.qualified(ns))?;
        }
        Ok(())
    }

    /// The s-domain model: reactive elements become impedances with their
    /// initial conditions as series sources, and sources become their
    /// Laplace transforms.
    ///
    /// The result describes the same circuit but cannot itself be analysed.
    pub fn s_model(&self) -> Result<Netlist> {
        let mut model = Netlist {
            components: IndexMap::new(),
            s_model: true,
        };
        for component in self.components() {
            let name = component.name();
            match &component.kind {
                ComponentKind::Capacitor(_) | ComponentKind::Inductor(_) => {
                    let z = component.impedance_s()?;
                    let voc = component.voc(AnalysisKind::Ivp)?;
                    let (n1, n2) = (component.nodes[0].clone(), component.nodes[1].clone());
                    if component.has_ic() {
                        let mid = NodeName::in_namespace(n1.namespace().to_vec(), format!("_{}", name));
                        model.add(Component::voltage_source(
                            format!("{}_ic", name),
                            n1,
                            mid.clone(),
                            Source::laplace(voc),
                        ))?;
                        model.add(Component::impedance(name, mid, n2, z))?;
                    } else {
                        model.add(Component::impedance(name, n1, n2, z))?;
                    }
                }
                ComponentKind::VoltageSource(src) => {
                    let transform = laplace_of(name, src)?;
                    let nodes = component.nodes.clone();
                    model.add(Component::new(name, nodes, ComponentKind::VoltageSource(transform))?)?;
                }
                ComponentKind::CurrentSource(src) => {
                    let transform = laplace_of(name, src)?;
                    let nodes = component.nodes.clone();
                    model.add(Component::new(name, nodes, ComponentKind::CurrentSource(transform))?)?;
                }
                _ => model.add(component.clone())?,
            }
        }
        Ok(model)
    }
}

/// Transform of a source value for the s-domain model.
fn laplace_of(name: &str, src: &Source) -> Result<Source> {
    if src.is_noisy() {
        return Err(NodalError::invalid_value(name, "noise sources have no Laplace transform"));
    }
    let transform: Expr = src.select(AnalysisKind::Ivp)?;
    Ok(Source::laplace(transform))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{NoiseId, SourcePart};

    fn divider() -> Netlist {
        Netlist::from_components([
            Component::voltage_source("V1", 1, 0, Source::dc(4.0)),
            Component::resistor("R1", 1, 2, 2.0),
            Component::resistor("R2", 2, 0, 2.0),
        ])
        .unwrap()
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let mut netlist = divider();
        let err = netlist.add(Component::resistor("R1", 1, 0, 1.0)).unwrap_err();
        assert_eq!(
            err,
            NodalError::DuplicateComponent {
                name: "R1".to_string()
            }
        );
    }

    #[test]
    fn test_replace_keeps_position() {
        let mut netlist = divider();
        netlist.replace(Component::resistor("R1", 1, 2, 8.0)).unwrap();
        let names: Vec<_> = netlist.components().map(Component::name).collect();
        assert_eq!(names, vec!["V1", "R1", "R2"]);
        assert!(netlist.replace(Component::resistor("R9", 1, 2, 8.0)).is_err());
    }

    #[test]
    fn test_wires_merge_nodes() {
        let mut netlist = divider();
        netlist.add(Component::wire("W1", 2, 3)).unwrap();
        netlist.add(Component::wire("W2", 4, 0)).unwrap();
        netlist.add(Component::resistor("R3", 3, 4, 1.0)).unwrap();

        let map = netlist.node_map();
        assert_eq!(map[&NodeName::from(3)], NodeName::from(2));
        assert_eq!(map[&NodeName::from(4)], NodeName::ground());

        let groups = netlist.equipotential_nodes();
        assert_eq!(groups.len(), 3);
        assert_eq!(groups[&NodeName::ground()], vec![NodeName::ground(), NodeName::from(4)]);
    }

    #[test]
    fn test_ground_connection() {
        assert!(divider().has_ground_connection());
        let floating = Netlist::from_components([
            Component::voltage_source("V1", 1, 2, Source::dc(1.0)),
            Component::resistor("R1", 1, 2, 1.0),
        ])
        .unwrap();
        assert!(!floating.has_ground_connection());

        // A wire alone does not connect the circuit to ground
        let via_wire = Netlist::from_components([
            Component::resistor("R1", 1, 2, 1.0),
            Component::wire("W1", 3, 0),
        ])
        .unwrap();
        assert!(!via_wire.has_ground_connection());
    }

    #[test]
    fn test_source_mix_queries() {
        let netlist = divider();
        assert!(netlist.is_dc());
        assert!(!netlist.is_ac());
        assert!(!netlist.has_ic());
        assert_eq!(netlist.source_kinds(), vec![AnalysisKind::Dc]);

        let mut mixed = netlist.clone();
        mixed
            .replace(Component::voltage_source(
                "V1",
                1,
                0,
                Source::step(1.0).and(SourcePart::Noise {
                    asd: 1.0,
                    id: NoiseId(3),
                }),
            ))
            .unwrap();
        assert!(!mixed.is_dc());
        assert!(mixed.has_s());
        assert_eq!(
            mixed.source_kinds(),
            vec![AnalysisKind::Laplace, AnalysisKind::Noise(NoiseId(3))]
        );
    }

    #[test]
    fn test_kill_and_zero() {
        let mut netlist = divider();
        netlist.kill("V1").unwrap();
        assert_eq!(netlist.component("V1").unwrap().kind(), &ComponentKind::Wire);
        assert!(matches!(netlist.kill("R1"), Err(NodalError::NotASource { .. })));

        let mut netlist = divider();
        netlist.zero("V1").unwrap();
        let v1 = netlist.component("V1").unwrap();
        assert_eq!(v1.source(), Some(&Source::zero()));
    }

    #[test]
    fn test_kill_initial() {
        let mut netlist = Netlist::from_components([
            Component::capacitor_ic("C1", 1, 0, 1.0, 2.0),
            Component::resistor("R1", 1, 0, 1.0),
        ])
        .unwrap();
        assert!(netlist.is_ivp());
        netlist.kill_initial();
        assert!(!netlist.has_ic());
    }

    #[test]
    fn test_merge_namespaced() {
        let sub = Netlist::from_components([
            Component::resistor("R1", "in", "out", 1.0),
            Component::resistor("R2", "out", 0, 1.0),
        ])
        .unwrap();
        let mut top = divider();
        top.merge_namespaced("a", &sub).unwrap();
        top.add(Component::wire("W1", 2, NodeName::in_namespace(["a"], "in")))
            .unwrap();

        let r2 = top.component("a.R2").unwrap();
        assert_eq!(r2.nodes()[0], NodeName::in_namespace(["a"], "out"));
        assert!(r2.nodes()[1].is_ground());
        assert!(top.merge_namespaced("a", &sub).is_err());
    }

    #[test]
    fn test_s_model() {
        let netlist = Netlist::from_components([
            Component::voltage_source("V1", 1, 0, Source::step(5.0)),
            Component::resistor("R1", 1, 2, 1.0),
            Component::capacitor_ic("C1", 2, 0, 1.0, 3.0),
        ])
        .unwrap();
        let model = netlist.s_model().unwrap();
        assert!(model.is_s_model());
        assert_eq!(model.len(), 4);
        assert!(matches!(
            model.component("C1").unwrap().kind(),
            ComponentKind::Impedance(_)
        ));
        assert!(model.component("C1_ic").unwrap().is_causal().unwrap());
    }
}
