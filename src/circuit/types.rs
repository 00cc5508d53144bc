//! Core types for circuit representation.

use std::fmt;

/// Label of the distinguished ground node.
pub const GROUND_LABEL: &str = "0";

/// A node identity: a local label qualified by a (possibly empty) path of
/// sub-circuit namespaces.
///
/// Ground is the local label `"0"` with no namespace and is shared by every
/// sub-circuit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeName {
    namespace: Vec<String>,
    local: String,
}

impl NodeName {
    /// A top-level node.
    pub fn new(local: impl Into<String>) -> Self {
        Self {
            namespace: Vec::new(),
            local: local.into(),
        }
    }

    /// A node inside nested namespaces, outermost first.
    pub fn in_namespace<I, S>(namespace: I, local: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            namespace: namespace.into_iter().map(Into::into).collect(),
            local: local.into(),
        }
    }

    /// The ground node.
    pub fn ground() -> Self {
        Self::new(GROUND_LABEL)
    }

    pub fn is_ground(&self) -> bool {
        self.namespace.is_empty() && self.local == GROUND_LABEL
    }

    pub fn namespace(&self) -> &[String] {
        &self.namespace
    }

    pub fn local(&self) -> &str {
        &self.local
    }

    /// Place this node inside namespace `ns`. Ground stays global.
    pub fn qualified(&self, ns: &str) -> Self {
        if self.is_ground() {
            return self.clone();
        }
        let mut namespace = Vec::with_capacity(self.namespace.len() + 1);
        namespace.push(ns.to_string());
        namespace.extend(self.namespace.iter().cloned());
        Self {
            namespace,
            local: self.local.clone(),
        }
    }

    /// Strip the outermost namespace if it is `ns`.
    pub fn dequalified(&self, ns: &str) -> Self {
        match self.namespace.first() {
            Some(first) if first == ns => Self {
                namespace: self.namespace[1..].to_vec(),
                local: self.local.clone(),
            },
            _ => self.clone(),
        }
    }
}

impl fmt::Display for NodeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.namespace {
            write!(f, "{}.", segment)?;
        }
        write!(f, "{}", self.local)
    }
}

impl From<&str> for NodeName {
    fn from(local: &str) -> Self {
        NodeName::new(local)
    }
}

impl From<String> for NodeName {
    fn from(local: String) -> Self {
        NodeName::new(local)
    }
}

impl From<&String> for NodeName {
    fn from(local: &String) -> Self {
        NodeName::new(local.clone())
    }
}

impl From<u32> for NodeName {
    fn from(label: u32) -> Self {
        NodeName::new(label.to_string())
    }
}

impl From<i32> for NodeName {
    fn from(label: i32) -> Self {
        NodeName::new(label.to_string())
    }
}

impl From<&NodeName> for NodeName {
    fn from(node: &NodeName) -> Self {
        node.clone()
    }
}

/// Prefix a component name with a namespace.
pub fn qualify_name(ns: &str, name: &str) -> String {
    format!("{}.{}", ns, name)
}
