//! Component definitions
//!
//! A definition says what type a named component exposes, how a bare
//! instance is constructed, which callbacks run during its lifecycle, and
//! whether it is shared (`Singleton`) or built fresh on every resolve
//! (`Prototype`). Attaching an [`ObjectFactory`] replaces direct construction.

use crate::{DiError, Injectable, Instance, ObjectFactory, Result, TypeKey};
use std::fmt;
use std::sync::Arc;

/// Type-erased constructor for the bare instance
pub(crate) type Constructor = Arc<dyn Fn() -> Result<Instance> + Send + Sync>;

/// Type-erased populate/init callback, receives the component name
pub(crate) type InstanceCallback = Arc<dyn Fn(&str, &Instance) -> Result<()> + Send + Sync>;

/// Type-erased conversion into an alias type
type AliasCast = Arc<dyn Fn(&Instance) -> Option<Instance> + Send + Sync>;

/// Component scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Scope {
    /// One cached instance per name, shared by all resolvers
    #[default]
    Singleton,

    /// A fresh instance on every resolve
    Prototype,
}

#[derive(Clone)]
struct Alias {
    key: TypeKey,
    cast: AliasCast,
}

/// Declarative description of a named component.
///
/// # Examples
///
/// ```rust
/// use bean_container::{ComponentDefinition, Container, Scope};
/// use std::sync::Arc;
///
/// trait Dao: Send + Sync {
///     fn query(&self) -> &'static str;
/// }
///
/// #[derive(Default)]
/// struct IndexDao;
///
/// impl Dao for IndexDao {
///     fn query(&self) -> &'static str {
///         "query"
///     }
/// }
///
/// let definition = ComponentDefinition::default_of::<IndexDao>()
///     .assignable_to(|dao: Arc<IndexDao>| dao as Arc<dyn Dao>)
///     .scope(Scope::Prototype);
///
/// let container = Container::new();
/// container.register("indexDao", definition).unwrap();
///
/// let dao = container.get::<dyn Dao>().unwrap();
/// assert_eq!(dao.query(), "query");
/// ```
#[derive(Clone)]
pub struct ComponentDefinition {
    declared_type: TypeKey,
    scope: Scope,
    constructor: Option<Constructor>,
    populate: Option<InstanceCallback>,
    init: Option<InstanceCallback>,
    aliases: Vec<Alias>,
    factory: Option<Arc<dyn ObjectFactory>>,
}

impl ComponentDefinition {
    /// Definition constructed directly by calling `constructor`.
    pub fn of<T: Injectable, F>(constructor: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self::with_constructor(
            TypeKey::of::<T>(),
            Arc::new(move || Ok(Instance::new(constructor()))),
        )
    }

    /// Definition whose constructor may fail.
    pub fn try_of<T: Injectable, F>(constructor: F) -> Self
    where
        F: Fn() -> Result<T> + Send + Sync + 'static,
    {
        Self::with_constructor(
            TypeKey::of::<T>(),
            Arc::new(move || constructor().map(Instance::new)),
        )
    }

    /// Definition constructed with `T::default()`.
    pub fn default_of<T: Injectable + Default>() -> Self {
        Self::of(T::default)
    }

    /// Abstract definition declared as `I` with no constructor.
    ///
    /// Such a definition only resolves once a factory is attached; this is how
    /// interfaces without any implementing type are registered.
    pub fn declared<I: ?Sized + 'static>() -> Self {
        Self::declared_key(TypeKey::of::<I>())
    }

    /// Definition declared as the factory's produced type, with the factory attached.
    pub fn from_factory(factory: Arc<dyn ObjectFactory>) -> Self {
        Self::declared_key(factory.produced_type()).with_factory(factory)
    }

    fn with_constructor(declared_type: TypeKey, constructor: Constructor) -> Self {
        Self {
            constructor: Some(constructor),
            ..Self::declared_key(declared_type)
        }
    }

    fn declared_key(declared_type: TypeKey) -> Self {
        Self {
            declared_type,
            scope: Scope::default(),
            constructor: None,
            populate: None,
            init: None,
            aliases: Vec::new(),
            factory: None,
        }
    }

    // =========================================================================
    // Builder Methods
    // =========================================================================

    /// Set the scope.
    #[inline]
    pub fn scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    /// Shorthand for `scope(Scope::Prototype)`.
    #[inline]
    pub fn prototype(self) -> Self {
        self.scope(Scope::Prototype)
    }

    /// Property population step, run right after construction.
    pub fn with_populate<T: Injectable, F>(mut self, populate: F) -> Self
    where
        F: Fn(&T) -> Result<()> + Send + Sync + 'static,
    {
        self.populate = Some(typed_callback(populate));
        self
    }

    /// The instance's own initialization callback, run between the
    /// before- and after-initialization hooks.
    ///
    /// Runs against the instance returned by the before hooks, so a hook that
    /// swaps in a different type makes this fail with `TypeMismatch`.
    pub fn with_init<T: Injectable, F>(mut self, init: F) -> Self
    where
        F: Fn(&T) -> Result<()> + Send + Sync + 'static,
    {
        self.init = Some(typed_callback(init));
        self
    }

    /// Declare that this component is also assignable to `I`.
    pub fn assignable_to<T, I, F>(mut self, cast: F) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
        I: ?Sized + Send + Sync + 'static,
        F: Fn(Arc<T>) -> Arc<I> + Send + Sync + 'static,
    {
        self.aliases.push(Alias {
            key: TypeKey::of::<I>(),
            cast: Arc::new(move |instance| {
                instance
                    .downcast::<T>()
                    .map(|value| Instance::from_arc(cast(value)))
            }),
        });
        self
    }

    /// Attach a factory, replacing direct construction.
    #[inline]
    pub fn with_factory(mut self, factory: Arc<dyn ObjectFactory>) -> Self {
        self.factory = Some(factory);
        self
    }

    pub(crate) fn set_factory(&mut self, factory: Arc<dyn ObjectFactory>) {
        self.factory = Some(factory);
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// The declared type.
    #[inline]
    pub fn declared_type(&self) -> TypeKey {
        self.declared_type
    }

    /// The type callers see: the factory's produced type when one is attached.
    #[inline]
    pub fn exposed_type(&self) -> TypeKey {
        self.factory
            .as_ref()
            .map_or(self.declared_type, |f| f.produced_type())
    }

    /// The scope flag on the definition itself.
    #[inline]
    pub fn scope_flag(&self) -> Scope {
        self.scope
    }

    /// Caching policy: the factory's answer wins when one is attached.
    #[inline]
    pub fn is_singleton(&self) -> bool {
        match &self.factory {
            Some(factory) => factory.is_singleton(),
            None => self.scope == Scope::Singleton,
        }
    }

    /// The attached factory, if any.
    #[inline]
    pub fn factory(&self) -> Option<&Arc<dyn ObjectFactory>> {
        self.factory.as_ref()
    }

    /// Whether resolution is delegated to a factory.
    #[inline]
    pub fn has_factory(&self) -> bool {
        self.factory.is_some()
    }

    /// Whether a lookup for `key` should match this definition.
    pub fn is_assignable_to(&self, key: TypeKey) -> bool {
        self.declared_type == key
            || self.exposed_type() == key
            || self.aliases.iter().any(|alias| alias.key == key)
    }

    /// Convert a resolved instance into `key` through a declared alias.
    pub(crate) fn cast_to(&self, key: TypeKey, instance: &Instance) -> Option<Instance> {
        self.aliases
            .iter()
            .filter(|alias| alias.key == key)
            .find_map(|alias| (alias.cast)(instance))
    }

    pub(crate) fn constructor(&self) -> Option<&Constructor> {
        self.constructor.as_ref()
    }

    pub(crate) fn populate_callback(&self) -> Option<&InstanceCallback> {
        self.populate.as_ref()
    }

    pub(crate) fn init_callback(&self) -> Option<&InstanceCallback> {
        self.init.as_ref()
    }
}

fn typed_callback<T: Injectable, F>(callback: F) -> InstanceCallback
where
    F: Fn(&T) -> Result<()> + Send + Sync + 'static,
{
    Arc::new(move |name, instance| match instance.downcast::<T>() {
        Some(value) => callback(&value),
        None => Err(DiError::TypeMismatch {
            name: name.to_string(),
            expected: std::any::type_name::<T>(),
            found: instance.type_name(),
        }),
    })
}

impl fmt::Debug for ComponentDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentDefinition")
            .field("declared_type", &self.declared_type)
            .field("scope", &self.scope)
            .field("has_constructor", &self.constructor.is_some())
            .field("has_init", &self.init.is_some())
            .field("aliases", &self.aliases.iter().map(|a| a.key).collect::<Vec<_>>())
            .field("has_factory", &self.factory.is_some())
            .finish()
    }
}
