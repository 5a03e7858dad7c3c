//! Resolution lifecycle states
//!
//! Direct definitions move through
//! `Registered → Constructing → Populated → PreInit → PostInit → Ready`,
//! factory-indirected ones through `Registered → FactoryInvoked → Ready`.

use std::fmt;

/// A state in the resolution of a single component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResolutionState {
    /// Definition stored, nothing built yet
    Registered,
    /// Bare instance being constructed
    Constructing,
    /// Properties populated
    Populated,
    /// Before-initialization hooks
    PreInit,
    /// After-initialization hooks
    PostInit,
    /// Attached factory produced the instance
    FactoryInvoked,
    /// Usable instance returned to the caller
    Ready,
}

impl ResolutionState {
    /// Lowercase label used in log fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Registered => "registered",
            Self::Constructing => "constructing",
            Self::Populated => "populated",
            Self::PreInit => "pre-init",
            Self::PostInit => "post-init",
            Self::FactoryInvoked => "factory-invoked",
            Self::Ready => "ready",
        }
    }

    /// Whether a resolution can end in this state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Ready)
    }
}

impl fmt::Display for ResolutionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
