//! Lifecycle interception hooks
//!
//! Hooks run around a component's initialization callback. Each hook may
//! observe the instance in flight, replace it (for example with a wrapping
//! decorator), or halt the resolution altogether.
//!
//! Ordering is by ascending integer priority; hooks with equal priority run
//! in the order they were added.

use crate::{Instance, Result};
use std::sync::Arc;

#[cfg(feature = "logging")]
use tracing::trace;

/// Outcome of a single hook callback or of a whole chain run.
#[derive(Debug, Clone)]
pub enum Interception {
    /// Continue with this instance (the original or a replacement)
    Proceed(Instance),
    /// Stop the resolution; no further hooks run
    Halt,
}

impl Interception {
    /// The instance to continue with, or `None` on halt.
    #[inline]
    pub fn into_instance(self) -> Option<Instance> {
        match self {
            Self::Proceed(instance) => Some(instance),
            Self::Halt => None,
        }
    }

    /// Whether the chain was halted.
    #[inline]
    pub fn is_halt(&self) -> bool {
        matches!(self, Self::Halt)
    }
}

/// Hook callback: receives the running instance and the component name
pub type HookFn = Arc<dyn Fn(Instance, &str) -> Result<Interception> + Send + Sync>;

/// A priority-ordered pair of before/after-initialization callbacks.
///
/// An empty slot passes the instance through unchanged.
///
/// # Examples
///
/// ```rust
/// use bean_container::{HookRecord, Interception};
///
/// let audit = HookRecord::new(11)
///     .before(|instance, name| {
///         println!("before init of {name}");
///         Ok(Interception::Proceed(instance))
///     })
///     .after(|instance, _| Ok(Interception::Proceed(instance)));
///
/// assert_eq!(audit.priority(), 11);
/// ```
#[derive(Clone)]
pub struct HookRecord {
    priority: i32,
    before: Option<HookFn>,
    after: Option<HookFn>,
}

impl HookRecord {
    /// A record with empty callback slots.
    #[inline]
    pub fn new(priority: i32) -> Self {
        Self {
            priority,
            before: None,
            after: None,
        }
    }

    /// Set the before-initialization callback.
    pub fn before<F>(mut self, callback: F) -> Self
    where
        F: Fn(Instance, &str) -> Result<Interception> + Send + Sync + 'static,
    {
        self.before = Some(Arc::new(callback));
        self
    }

    /// Set the after-initialization callback.
    pub fn after<F>(mut self, callback: F) -> Self
    where
        F: Fn(Instance, &str) -> Result<Interception> + Send + Sync + 'static,
    {
        self.after = Some(Arc::new(callback));
        self
    }

    /// Build from optional, already type-erased callbacks.
    #[inline]
    pub fn from_parts(priority: i32, before: Option<HookFn>, after: Option<HookFn>) -> Self {
        Self {
            priority,
            before,
            after,
        }
    }

    /// Ordering key, lower runs earlier.
    #[inline]
    pub fn priority(&self) -> i32 {
        self.priority
    }
}

impl std::fmt::Debug for HookRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookRecord")
            .field("priority", &self.priority)
            .field("before", &self.before.is_some())
            .field("after", &self.after.is_some())
            .finish()
    }
}

#[derive(Clone, Copy)]
enum Phase {
    Before,
    After,
}

/// Ordered collection of hooks.
#[derive(Clone, Default, Debug)]
pub struct HookChain {
    hooks: Vec<HookRecord>,
}

impl HookChain {
    /// Create an empty chain.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a hook, keeping ascending priority and first-added-first-run on ties.
    pub fn add_hook(&mut self, record: HookRecord) {
        let at = self
            .hooks
            .partition_point(|existing| existing.priority <= record.priority);
        self.hooks.insert(at, record);
    }

    /// Run every before-initialization callback in order.
    #[inline]
    pub fn run_before(&self, instance: Instance, name: &str) -> Result<Interception> {
        self.run(Phase::Before, instance, name)
    }

    /// Run every after-initialization callback in order.
    #[inline]
    pub fn run_after(&self, instance: Instance, name: &str) -> Result<Interception> {
        self.run(Phase::After, instance, name)
    }

    fn run(&self, phase: Phase, mut instance: Instance, name: &str) -> Result<Interception> {
        for hook in &self.hooks {
            let slot = match phase {
                Phase::Before => &hook.before,
                Phase::After => &hook.after,
            };
            let Some(callback) = slot else {
                continue;
            };

            match callback(instance, name)? {
                Interception::Proceed(next) => instance = next,
                Interception::Halt => {
                    #[cfg(feature = "logging")]
                    trace!(
                        target: crate::logging::TARGET,
                        component = name,
                        priority = hook.priority,
                        "Hook halted the chain"
                    );
                    return Ok(Interception::Halt);
                }
            }
        }
        Ok(Interception::Proceed(instance))
    }

    /// Number of hooks.
    #[inline]
    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    /// Check if empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Priorities in execution order.
    pub fn priorities(&self) -> Vec<i32> {
        self.hooks.iter().map(HookRecord::priority).collect()
    }
}
