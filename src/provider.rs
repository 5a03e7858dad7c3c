//! Provider traits and type-erased instances
//!
//! These types define what can be managed by the container, how types are
//! keyed for lookup, and how definitions are supplied during bootstrap.

use crate::{Container, Result};
use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Marker trait for types that can be managed by the container.
///
/// This is automatically implemented for all types that are `Send + Sync + 'static`.
/// You never need to implement this manually.
pub trait Injectable: Send + Sync + 'static {}

// Blanket implementation - everything that's Send + Sync + 'static is Injectable
impl<T: Send + Sync + 'static> Injectable for T {}

/// Runtime key for a type, including unsized interface types such as `dyn Trait`.
///
/// Equality and hashing use the `TypeId` only; the name is kept for messages.
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    /// Key for `T`.
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// The underlying `TypeId`.
    #[inline]
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Human-readable type name.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// A live, type-erased component instance.
///
/// Wraps an `Arc<T>` where `T` may be a concrete type or an interface such as
/// `dyn Fetcher`. Cloning an `Instance` shares the underlying object.
///
/// # Examples
///
/// ```rust
/// use bean_container::Instance;
/// use std::sync::Arc;
///
/// trait Greeter: Send + Sync {
///     fn greet(&self) -> String;
/// }
///
/// struct English;
///
/// impl Greeter for English {
///     fn greet(&self) -> String {
///         "hello".into()
///     }
/// }
///
/// let instance = Instance::from_arc(Arc::new(English) as Arc<dyn Greeter>);
/// let greeter = instance.downcast::<dyn Greeter>().unwrap();
/// assert_eq!(greeter.greet(), "hello");
/// assert!(instance.downcast::<English>().is_none());
/// ```
#[derive(Clone)]
pub struct Instance {
    /// Always holds an `Arc<T>` where `T` matches `type_key`
    inner: Arc<dyn Any + Send + Sync>,
    type_key: TypeKey,
    /// Address of the managed object, used for identity comparison
    addr: usize,
}

impl Instance {
    /// Wrap an owned value.
    #[inline]
    pub fn new<T: Injectable>(value: T) -> Self {
        Self::from_arc(Arc::new(value))
    }

    /// Wrap an existing `Arc`, which may point at an unsized interface type.
    #[inline]
    pub fn from_arc<T: ?Sized + Send + Sync + 'static>(value: Arc<T>) -> Self {
        let addr = Arc::as_ptr(&value).cast::<()>() as usize;
        Self {
            inner: Arc::new(value) as Arc<dyn Any + Send + Sync>,
            type_key: TypeKey::of::<T>(),
            addr,
        }
    }

    /// Recover the typed `Arc<T>`, or `None` if this instance holds another type.
    #[inline]
    pub fn downcast<T: ?Sized + 'static>(&self) -> Option<Arc<T>> {
        self.inner.downcast_ref::<Arc<T>>().map(Arc::clone)
    }

    /// Whether this instance holds a `T`.
    #[inline]
    pub fn is<T: ?Sized + 'static>(&self) -> bool {
        self.type_key.id() == TypeId::of::<T>()
    }

    /// Key of the held type.
    #[inline]
    pub fn type_key(&self) -> TypeKey {
        self.type_key
    }

    /// Name of the held type.
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_key.name()
    }

    /// Reference equality: both handles point at the same object.
    #[inline]
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        a.addr == b.addr
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("type", &self.type_key.name())
            .field("addr", &format_args!("{:#x}", self.addr))
            .finish()
    }
}

/// Bootstrap collaborator that registers definitions, factories and hooks.
///
/// Closures taking `&Container` are suppliers, so simple bootstraps need no
/// dedicated type.
///
/// # Examples
///
/// ```rust
/// use bean_container::{ComponentDefinition, Container, Result};
///
/// struct IndexDao;
///
/// let container = Container::new();
/// container
///     .import(|c: &Container| -> Result<()> {
///         c.register("indexDao", ComponentDefinition::of(|| IndexDao))
///     })
///     .unwrap();
///
/// assert!(container.contains("indexDao"));
/// ```
pub trait DefinitionSupplier {
    /// Register everything this supplier knows about.
    fn supply(&self, container: &Container) -> Result<()>;
}

impl<F> DefinitionSupplier for F
where
    F: Fn(&Container) -> Result<()>,
{
    fn supply(&self, container: &Container) -> Result<()> {
        self(container)
    }
}
