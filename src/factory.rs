//! Object factories
//!
//! An [`ObjectFactory`] attached to a definition fully replaces direct
//! construction of that component. The container asks it for its produced
//! type without instantiating anything, and for whether its products should
//! be cached.

use crate::{Instance, Result, TypeKey};
use std::sync::Arc;

#[cfg(feature = "logging")]
use tracing::trace;

/// A producer of component instances.
///
/// # Examples
///
/// ```rust
/// use bean_container::{Container, Instance, ObjectFactory, Result, TypeKey};
/// use std::sync::Arc;
///
/// struct Connection {
///     url: String,
/// }
///
/// struct ConnectionFactory;
///
/// impl ObjectFactory for ConnectionFactory {
///     fn produce(&self) -> Result<Instance> {
///         Ok(Instance::new(Connection { url: "mem://".into() }))
///     }
///
///     fn produced_type(&self) -> TypeKey {
///         TypeKey::of::<Connection>()
///     }
///
///     fn is_singleton(&self) -> bool {
///         false
///     }
/// }
///
/// let container = Container::new();
/// container.register_factory("connection", Arc::new(ConnectionFactory)).unwrap();
///
/// let conn = container.get::<Connection>().unwrap();
/// assert_eq!(conn.url, "mem://");
/// ```
pub trait ObjectFactory: Send + Sync {
    /// Produce an instance.
    ///
    /// Called on every resolve for prototype factories and once in total for
    /// singleton factories. Implementations must be safe to call concurrently.
    fn produce(&self) -> Result<Instance>;

    /// The type of instance this factory produces, answered without producing one.
    fn produced_type(&self) -> TypeKey;

    /// Whether the container should cache the first product.
    fn is_singleton(&self) -> bool {
        true
    }
}

/// Type-erased produce function
type ProduceFn = Arc<dyn Fn() -> Result<Instance> + Send + Sync>;

/// Closure-backed factory.
pub struct FnFactory {
    produce: ProduceFn,
    produced_type: TypeKey,
    singleton: bool,
}

impl FnFactory {
    /// Create a factory producing `Arc<T>`; `T` may be an interface type.
    pub fn new<T, F>(singleton: bool, produce: F) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn() -> Result<Arc<T>> + Send + Sync + 'static,
    {
        Self {
            produce: Arc::new(move || produce().map(Instance::from_arc)),
            produced_type: TypeKey::of::<T>(),
            singleton,
        }
    }

    /// Factory whose first product is cached.
    #[inline]
    pub fn singleton<T, F>(produce: F) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn() -> Result<Arc<T>> + Send + Sync + 'static,
    {
        Self::new(true, produce)
    }

    /// Factory invoked on every resolve.
    #[inline]
    pub fn prototype<T, F>(produce: F) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn() -> Result<Arc<T>> + Send + Sync + 'static,
    {
        Self::new(false, produce)
    }
}

impl ObjectFactory for FnFactory {
    #[inline]
    fn produce(&self) -> Result<Instance> {
        #[cfg(feature = "logging")]
        trace!(
            target: crate::logging::TARGET,
            produced_type = self.produced_type.name(),
            singleton = self.singleton,
            "Invoking closure factory"
        );

        (self.produce)()
    }

    #[inline]
    fn produced_type(&self) -> TypeKey {
        self.produced_type
    }

    #[inline]
    fn is_singleton(&self) -> bool {
        self.singleton
    }
}

impl std::fmt::Debug for FnFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnFactory")
            .field("produced_type", &self.produced_type)
            .field("singleton", &self.singleton)
            .finish()
    }
}
