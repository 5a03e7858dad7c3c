//! Error types for the bean container

use crate::ResolutionState;
use thiserror::Error;

/// Errors that can occur while registering or resolving components
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DiError {
    /// No definition is registered under the requested name
    #[error("No component definition named '{name}'")]
    NotFound { name: String },

    /// No definition is assignable to the requested type
    #[error("No component definition assignable to {type_name}")]
    TypeNotFound { type_name: &'static str },

    /// More than one definition is assignable to the requested type
    #[error("{type_name} is ambiguous, candidates: {}", candidates.join(", "))]
    AmbiguousType {
        type_name: &'static str,
        candidates: Vec<String>,
    },

    /// A definition with this name already exists and overwrite was not requested
    #[error("Component definition '{name}' already registered")]
    DuplicateDefinition { name: String },

    /// A hook deliberately stopped the resolution
    #[error("Resolution of '{name}' halted by a hook during {state}")]
    ResolutionHalted {
        name: String,
        state: ResolutionState,
    },

    /// The component is already being resolved on this thread
    #[error("Circular dependency detected while resolving: {name}")]
    CircularDependency { name: String },

    /// The resolved instance is not of the requested type
    #[error("Component '{name}' is {found}, expected {expected}")]
    TypeMismatch {
        name: String,
        expected: &'static str,
        found: &'static str,
    },

    /// A constructor, callback or factory failed to create the component
    #[error("Failed to create component '{name}': {reason}")]
    CreationFailed { name: String, reason: String },

    /// An invocation handler returned a value of the wrong type
    #[error("Handler for '{method}' did not return {expected}")]
    ReturnTypeMismatch {
        method: String,
        expected: &'static str,
    },

    /// Container is locked and cannot be modified
    #[error("Container is locked - cannot register new definitions or hooks")]
    Locked,
}

impl DiError {
    /// Create a NotFound error for a name
    #[inline]
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound { name: name.into() }
    }

    /// Create a CreationFailed error
    #[inline]
    pub fn creation_failed(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::CreationFailed {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create a DuplicateDefinition error
    #[inline]
    pub fn duplicate(name: impl Into<String>) -> Self {
        Self::DuplicateDefinition { name: name.into() }
    }

    /// Create a ResolutionHalted error
    #[inline]
    pub fn halted(name: impl Into<String>, state: ResolutionState) -> Self {
        Self::ResolutionHalted {
            name: name.into(),
            state,
        }
    }

    /// Create a CircularDependency error
    #[inline]
    pub fn circular(name: impl Into<String>) -> Self {
        Self::CircularDependency { name: name.into() }
    }

    /// True when a hook vetoed the resolution (as opposed to a failure).
    #[inline]
    pub fn is_halted(&self) -> bool {
        matches!(self, Self::ResolutionHalted { .. })
    }

    /// True for unknown names and unmatched types.
    #[inline]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::TypeNotFound { .. })
    }
}

/// Result type alias for container operations
pub type Result<T> = std::result::Result<T, DiError>;
