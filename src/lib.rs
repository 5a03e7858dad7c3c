//! # Bean Container - Managed Objects for Rust
//!
//! A container that turns named, declarative component definitions into
//! live, fully-initialized instances.
//!
//! ## Features
//!
//! - **Named definitions** - Register components under unique names, with explicit overwrite
//! - **Singleton and prototype scopes** - Shared instances or a fresh one per resolve
//! - **Lifecycle hooks** - Priority-ordered before/after-initialization interceptors that can
//!   observe, replace or veto the instance in flight
//! - **Object factories** - Delegate construction entirely to a producer
//! - **Dynamic stand-ins** - Resolve interfaces that have no implementing type; every call is
//!   forwarded to a single handler
//! - **Thread-safe** - At most one construction per singleton, even under racing first access
//! - **Observable** - Optional tracing integration with JSON or pretty output
//!
//! ## Quick Start
//!
//! ```rust
//! use bean_container::{ComponentDefinition, Container, HookRecord, Interception};
//! use std::sync::Arc;
//!
//! #[derive(Default)]
//! struct IndexDao;
//!
//! impl IndexDao {
//!     fn query(&self) -> &'static str {
//!         "query"
//!     }
//! }
//!
//! let container = Container::new();
//!
//! // Supply definitions and hooks during bootstrap
//! container
//!     .register("indexDao", ComponentDefinition::default_of::<IndexDao>())
//!     .unwrap();
//! container
//!     .add_hook(HookRecord::new(11).before(|instance, name| {
//!         println!("postProcessBeforeInitialization + {name}");
//!         Ok(Interception::Proceed(instance))
//!     }))
//!     .unwrap();
//! container.lock();
//!
//! // Resolve by name or by type
//! let dao: Arc<IndexDao> = container.get_named("indexDao").unwrap();
//! assert_eq!(dao.query(), "query");
//! assert!(Arc::ptr_eq(&dao, &container.get::<IndexDao>().unwrap()));
//! ```
//!
//! ## Halting
//!
//! A hook that returns [`Interception::Halt`] stops resolution. The caller
//! sees [`DiError::ResolutionHalted`], which is distinct from
//! [`DiError::NotFound`], and nothing is cached.
//!
//! ```rust
//! use bean_container::{ComponentDefinition, Container, HookRecord, Interception};
//!
//! let container = Container::new();
//! container.register("secret", ComponentDefinition::of(|| 42u32)).unwrap();
//! container
//!     .add_hook(HookRecord::new(0).before(|_, _| Ok(Interception::Halt)))
//!     .unwrap();
//!
//! let err = container.get_bean("secret").unwrap_err();
//! assert!(err.is_halted());
//! ```

mod container;
mod definition;
mod error;
mod factory;
mod hook;
mod lifecycle;
#[cfg(feature = "logging")]
pub mod logging;
mod provider;
mod proxy;
mod registry;

pub use container::*;
pub use definition::*;
pub use error::*;
pub use factory::*;
pub use hook::*;
pub use lifecycle::*;
pub use provider::*;
pub use proxy::*;
pub use registry::*;

// Re-export for convenience
pub use std::sync::Arc;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        ComponentDefinition, Container, DefinitionSupplier, DiError, DynamicStandIn, FnFactory,
        HookChain, HookRecord, Injectable, Instance, Interception, InvocationHandler,
        ObjectFactory, ProxyFactory, ResolutionState, Result, Scope, TypeKey, Value,
        forward_interface,
    };
    pub use std::sync::Arc;
}
