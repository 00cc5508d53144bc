//! Error types for the nodal analysis engine.
//!
//! This module provides a unified error type [`NodalError`] that covers
//! all error conditions that can occur while building a netlist, assembling
//! the MNA system, and solving it.

use thiserror::Error;

/// Result type alias using [`NodalError`].
pub type Result<T> = std::result::Result<T, NodalError>;

/// Unified error type for all analysis operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NodalError {
    // ============ Structural Errors ============
    /// The circuit cannot be analysed as built
    #[error("Structural error: {message}")]
    Structural { message: String },

    /// Duplicate component name
    #[error("Duplicate component name '{name}'")]
    DuplicateComponent { name: String },

    // ============ Lookup Errors ============
    /// A node, branch or component that does not exist was referenced
    #[error("Unknown {what} '{name}'")]
    UnknownReference { what: &'static str, name: String },

    /// Type tag missing from the component registry
    #[error("Unknown component type '{tag}'")]
    UnknownComponentType { tag: String },

    // ============ Component Errors ============
    /// Component kind the linear engine refuses to stamp
    #[error("Cannot analyse {class} component '{name}'")]
    UnsupportedComponent { class: String, name: String },

    /// Source-only property queried on a passive component
    #[error("Component '{name}' is not a source")]
    NotASource { name: String },

    /// A component value cannot be used in the requested domain
    #[error("Invalid value for '{name}': {message}")]
    InvalidValue { name: String, message: String },

    // ============ Solver Errors ============
    /// The aggregate MNA matrix is not invertible
    #[error("The MNA A matrix is not invertible for {kind} analysis; {hint}")]
    SingularSystem { kind: String, hint: String },
}

impl NodalError {
    /// Create a structural error
    pub fn structural(message: impl Into<String>) -> Self {
        Self::Structural {
            message: message.into(),
        }
    }

    /// Create an unknown node error
    pub fn unknown_node(name: impl Into<String>) -> Self {
        Self::UnknownReference {
            what: "node",
            name: name.into(),
        }
    }

    /// Create an unknown branch error
    pub fn unknown_branch(name: impl Into<String>) -> Self {
        Self::UnknownReference {
            what: "branch",
            name: name.into(),
        }
    }

    /// Create an unknown component error
    pub fn unknown_component(name: impl Into<String>) -> Self {
        Self::UnknownReference {
            what: "component",
            name: name.into(),
        }
    }

    /// Create an invalid value error
    pub fn invalid_value(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            name: name.into(),
            message: message.into(),
        }
    }
}
