//! Managed-object container
//!
//! The `Container` turns registered definitions into live instances. It picks
//! the construction path (direct or factory-indirected), drives the
//! resolution lifecycle, and applies the hook chain around initialization.
//!
//! Singleton resolution runs inside a per-name critical section
//! (`OnceCell::get_or_try_init`), so at most one construction ever completes
//! for a name even when many threads race on first access. Errors and halts
//! leave the cell empty. Resolutions that would wait on each other in a
//! cycle, on one thread or across several, fail with `CircularDependency`.

use crate::{
    ComponentDefinition, DefinitionRegistry, DefinitionSupplier, DiError, HookChain, HookFn,
    HookRecord, Instance, ObjectFactory, ResolutionState, Result, TypeKey,
};
use ahash::RandomState;
use dashmap::DashMap;
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use std::cell::RefCell;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, ThreadId};

#[cfg(feature = "logging")]
use tracing::{debug, trace};

// =============================================================================
// Re-entrancy Detection
// =============================================================================

thread_local! {
    /// Names currently being resolved on this thread, outermost first
    static RESOLVING: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
}

/// Marks a name as in-flight on this thread; unmarks on drop.
struct ResolutionGuard;

impl ResolutionGuard {
    fn enter(name: &str) -> Result<Self> {
        RESOLVING.with(|stack| {
            let mut stack = stack.borrow_mut();
            if stack.iter().any(|resolving| resolving == name) {
                return Err(DiError::circular(name));
            }
            stack.push(name.to_string());
            Ok(ResolutionGuard)
        })
    }
}

impl Drop for ResolutionGuard {
    fn drop(&mut self) {
        RESOLVING.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

/// Cross-thread wait-for graph over singleton critical sections.
///
/// `owners` maps a name to the thread running its construction, `waiting`
/// maps a thread to the name it is about to block on. A thread registers its
/// wait before checking the chain, so of two threads closing a cycle at
/// least the later one sees it.
#[derive(Default)]
struct WaitGraph {
    owners: DashMap<String, ThreadId, RandomState>,
    waiting: DashMap<ThreadId, String, RandomState>,
}

impl WaitGraph {
    /// Record that `me` is about to block on `name`.
    ///
    /// Fails with `CircularDependency` when the owner chain starting at
    /// `name` leads back to `me`.
    fn wait_for(&self, name: &str, me: ThreadId) -> Result<WaitGuard<'_>> {
        self.waiting.insert(me, name.to_string());
        let guard = WaitGuard {
            graph: self,
            thread: me,
        };

        let mut current = name.to_string();
        // every hop visits a distinct owner unless the chain loops
        for _ in 0..=self.owners.len() {
            let Some(owner) = self.owners.get(&current).map(|entry| *entry.value()) else {
                break;
            };
            if owner == me {
                #[cfg(feature = "logging")]
                debug!(
                    target: crate::logging::TARGET,
                    component = name,
                    "Cross-thread resolution cycle detected"
                );
                return Err(DiError::circular(name));
            }
            let Some(next) = self.waiting.get(&owner).map(|entry| entry.value().clone()) else {
                break;
            };
            current = next;
        }
        Ok(guard)
    }

    /// Mark `me` as the constructing thread for `name`.
    fn claim(&self, name: &str, me: ThreadId) -> OwnerGuard<'_> {
        self.waiting.remove(&me);
        self.owners.insert(name.to_string(), me);
        OwnerGuard {
            graph: self,
            name: name.to_string(),
        }
    }
}

struct WaitGuard<'a> {
    graph: &'a WaitGraph,
    thread: ThreadId,
}

impl Drop for WaitGuard<'_> {
    fn drop(&mut self) {
        self.graph.waiting.remove(&self.thread);
    }
}

struct OwnerGuard<'a> {
    graph: &'a WaitGraph,
    name: String,
}

impl Drop for OwnerGuard<'_> {
    fn drop(&mut self) {
        self.graph.owners.remove(&self.name);
    }
}

#[inline]
fn transition(_name: &str, _state: ResolutionState) {
    #[cfg(feature = "logging")]
    trace!(
        target: crate::logging::TARGET,
        component = _name,
        state = _state.as_str(),
        "Resolution state changed"
    );
}

/// Per-name singleton slot; empty until the first successful resolution
type SingletonSlot = Arc<OnceCell<Instance>>;

/// Managed-object container.
///
/// Cloning a `Container` yields another handle to the same registry, hook
/// chain and singleton cache.
///
/// # Examples
///
/// ```rust
/// use bean_container::{ComponentDefinition, Container, HookRecord, Instance, Interception};
/// use std::sync::Arc;
///
/// #[derive(Default)]
/// struct IndexDao;
///
/// let container = Container::new();
/// container
///     .register("indexDao", ComponentDefinition::default_of::<IndexDao>())
///     .unwrap();
/// container
///     .add_hook(HookRecord::new(15).after(|instance, _| Ok(Interception::Proceed(instance))))
///     .unwrap();
///
/// let a = container.get_bean("indexDao").unwrap();
/// let b = container.get_bean("indexDao").unwrap();
/// assert!(Instance::ptr_eq(&a, &b));
///
/// let dao: Arc<IndexDao> = container.get_named("indexDao").unwrap();
/// assert!(Arc::ptr_eq(&dao, &a.downcast::<IndexDao>().unwrap()));
/// ```
#[derive(Clone)]
pub struct Container {
    /// Component definitions
    registry: Arc<DefinitionRegistry>,
    /// Hook chain, replaced wholesale on every add so resolutions can snapshot it
    hooks: Arc<RwLock<Arc<HookChain>>>,
    /// Singleton cache keyed by component name
    singletons: Arc<DashMap<String, SingletonSlot, RandomState>>,
    /// Which threads are constructing or waiting on which singletons
    waits: Arc<WaitGraph>,
    /// Set once the registration phase is closed
    locked: Arc<AtomicBool>,
}

impl Container {
    /// Create a new, empty container.
    #[inline]
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create a container with pre-allocated capacity.
    ///
    /// Use this when you know approximately how many components will be registered.
    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        #[cfg(feature = "logging")]
        debug!(
            target: crate::logging::TARGET,
            capacity = capacity,
            "Creating new bean container"
        );

        Self {
            registry: Arc::new(DefinitionRegistry::with_capacity(capacity)),
            hooks: Arc::new(RwLock::new(Arc::new(HookChain::new()))),
            singletons: Arc::new(DashMap::with_capacity_and_hasher(
                capacity,
                RandomState::new(),
            )),
            waits: Arc::new(WaitGraph::default()),
            locked: Arc::new(AtomicBool::new(false)),
        }
    }

    // =========================================================================
    // Registration Methods
    // =========================================================================

    /// Register a definition, failing if the name is taken.
    #[inline]
    pub fn register(&self, name: &str, definition: ComponentDefinition) -> Result<()> {
        self.register_definition(name, definition, false)
    }

    /// Register a definition, replacing an existing one only when `overwrite` is set.
    ///
    /// A replaced definition's cached singleton is discarded with it.
    pub fn register_definition(
        &self,
        name: &str,
        definition: ComponentDefinition,
        overwrite: bool,
    ) -> Result<()> {
        self.check_not_locked()?;

        #[cfg(feature = "logging")]
        debug!(
            target: crate::logging::TARGET,
            component = name,
            declared_type = definition.declared_type().name(),
            scope = ?definition.scope_flag(),
            factory = definition.has_factory(),
            overwrite = overwrite,
            "Registering component definition"
        );

        if self.registry.register(name, definition, overwrite)?.is_some() {
            self.singletons.remove(name);
        }
        transition(name, ResolutionState::Registered);
        Ok(())
    }

    /// Attach a factory to a registered definition.
    pub fn attach_factory(&self, name: &str, factory: Arc<dyn ObjectFactory>) -> Result<()> {
        self.check_not_locked()?;

        #[cfg(feature = "logging")]
        debug!(
            target: crate::logging::TARGET,
            component = name,
            produced_type = factory.produced_type().name(),
            singleton = factory.is_singleton(),
            "Attaching object factory"
        );

        self.registry.attach_factory(name, factory)?;
        self.singletons.remove(name);
        Ok(())
    }

    /// Register a definition declared as the factory's produced type, with the
    /// factory attached.
    #[inline]
    pub fn register_factory(&self, name: &str, factory: Arc<dyn ObjectFactory>) -> Result<()> {
        self.register(name, ComponentDefinition::from_factory(factory))
    }

    /// Add a hook to the chain.
    pub fn add_hook(&self, record: HookRecord) -> Result<()> {
        self.check_not_locked()?;

        #[cfg(feature = "logging")]
        debug!(
            target: crate::logging::TARGET,
            priority = record.priority(),
            "Adding lifecycle hook"
        );

        let mut hooks = self.hooks.write();
        Arc::make_mut(&mut *hooks).add_hook(record);
        Ok(())
    }

    /// Add a hook from its parts.
    #[inline]
    pub fn add_hook_fns(
        &self,
        priority: i32,
        before: Option<HookFn>,
        after: Option<HookFn>,
    ) -> Result<()> {
        self.add_hook(HookRecord::from_parts(priority, before, after))
    }

    /// Run a bootstrap supplier against this container.
    #[inline]
    pub fn import<S: DefinitionSupplier>(&self, supplier: S) -> Result<()> {
        supplier.supply(self)
    }

    // =========================================================================
    // Resolution Methods
    // =========================================================================

    /// Resolve a component by name.
    pub fn get_bean(&self, name: &str) -> Result<Instance> {
        let definition = self.registry.lookup(name)?;
        self.resolve(name, &definition)
    }

    /// Resolve the single component assignable to `key`.
    pub fn get_bean_by_type(&self, key: TypeKey) -> Result<Instance> {
        let (name, definition) = self.registry.lookup_by_type(key)?;
        self.resolve(&name, &definition)
    }

    /// Resolve the single component assignable to `T`, typed.
    ///
    /// `T` may be an interface (`dyn Trait`) reached through a factory or a
    /// declared alias.
    pub fn get<T: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<T>> {
        let (name, definition) = self.registry.lookup_by_type(TypeKey::of::<T>())?;
        let instance = self.resolve(&name, &definition)?;
        view_as::<T>(&name, &definition, &instance)
    }

    /// Resolve a component by name, typed.
    pub fn get_named<T: ?Sized + Send + Sync + 'static>(&self, name: &str) -> Result<Arc<T>> {
        let definition = self.registry.lookup(name)?;
        let instance = self.resolve(name, &definition)?;
        view_as::<T>(name, &definition, &instance)
    }

    /// Like [`get`](Self::get), but `None` on any failure.
    #[inline]
    pub fn try_get<T: ?Sized + Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.get::<T>().ok()
    }

    /// The factory attached to `name`, without invoking it.
    pub fn get_factory(&self, name: &str) -> Result<Arc<dyn ObjectFactory>> {
        let definition = self.registry.lookup(name)?;
        definition.factory().cloned().ok_or_else(|| {
            DiError::creation_failed(name, "no object factory attached to this definition")
        })
    }

    /// Resolve every singleton up front, in registration order.
    ///
    /// Halted components are skipped; any other error stops the walk.
    /// Returns the number of singletons that are now cached.
    pub fn preinstantiate_singletons(&self) -> Result<usize> {
        let mut ready = 0;
        for name in self.registry.names() {
            let definition = self.registry.lookup(&name)?;
            if !definition.is_singleton() {
                continue;
            }
            match self.resolve(&name, &definition) {
                Ok(_) => ready += 1,
                Err(err) if err.is_halted() => {
                    #[cfg(feature = "logging")]
                    debug!(
                        target: crate::logging::TARGET,
                        component = name.as_str(),
                        "Skipping halted singleton during pre-instantiation"
                    );
                }
                Err(err) => return Err(err),
            }
        }
        Ok(ready)
    }

    fn resolve(&self, name: &str, definition: &Arc<ComponentDefinition>) -> Result<Instance> {
        if !definition.is_singleton() {
            let _guard = ResolutionGuard::enter(name)?;
            return self.create(name, definition);
        }

        let slot = self.singleton_slot(name);
        if let Some(instance) = slot.get() {
            #[cfg(feature = "logging")]
            trace!(
                target: crate::logging::TARGET,
                component = name,
                "Singleton resolved from cache"
            );
            return Ok(instance.clone());
        }

        let _guard = ResolutionGuard::enter(name)?;
        let me = thread::current().id();
        let _waiting = self.waits.wait_for(name, me)?;
        slot.get_or_try_init(|| {
            let _owner = self.waits.claim(name, me);
            self.create(name, definition)
        })
        .cloned()
    }

    fn singleton_slot(&self, name: &str) -> SingletonSlot {
        if let Some(slot) = self.singletons.get(name) {
            return Arc::clone(slot.value());
        }
        Arc::clone(self.singletons.entry(name.to_string()).or_default().value())
    }

    fn create(&self, name: &str, definition: &ComponentDefinition) -> Result<Instance> {
        match definition.factory() {
            Some(factory) => {
                let instance = factory.produce()?;
                transition(name, ResolutionState::FactoryInvoked);
                transition(name, ResolutionState::Ready);
                Ok(instance)
            }
            None => self.construct(name, definition),
        }
    }

    fn construct(&self, name: &str, definition: &ComponentDefinition) -> Result<Instance> {
        let constructor = definition.constructor().ok_or_else(|| {
            DiError::creation_failed(name, "no constructor and no object factory attached")
        })?;

        transition(name, ResolutionState::Constructing);
        let instance = constructor()?;

        if let Some(populate) = definition.populate_callback() {
            populate(name, &instance)?;
        }
        transition(name, ResolutionState::Populated);

        let chain = Arc::clone(&*self.hooks.read());

        transition(name, ResolutionState::PreInit);
        let instance = chain
            .run_before(instance, name)?
            .into_instance()
            .ok_or_else(|| DiError::halted(name, ResolutionState::PreInit))?;

        if let Some(init) = definition.init_callback() {
            init(name, &instance)?;
        }

        transition(name, ResolutionState::PostInit);
        let instance = chain
            .run_after(instance, name)?
            .into_instance()
            .ok_or_else(|| DiError::halted(name, ResolutionState::PostInit))?;

        transition(name, ResolutionState::Ready);
        Ok(instance)
    }

    // =========================================================================
    // Introspection
    // =========================================================================

    /// Check if a name is registered.
    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.registry.contains(name)
    }

    /// The type `name` exposes, answered without instantiating it.
    #[inline]
    pub fn type_of(&self, name: &str) -> Result<TypeKey> {
        Ok(self.registry.lookup(name)?.exposed_type())
    }

    /// Whether `name` resolves to a shared instance.
    #[inline]
    pub fn is_singleton(&self, name: &str) -> Result<bool> {
        Ok(self.registry.lookup(name)?.is_singleton())
    }

    /// Registered names in registration order.
    #[inline]
    pub fn definition_names(&self) -> Vec<String> {
        self.registry.names()
    }

    /// Get the number of registered definitions.
    #[inline]
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    /// Check if no definitions are registered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// Number of hooks in the chain.
    #[inline]
    pub fn hook_count(&self) -> usize {
        self.hooks.read().len()
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Close the registration phase.
    ///
    /// Registering definitions, factories or hooks afterwards fails with `Locked`.
    #[inline]
    pub fn lock(&self) {
        self.locked.store(true, Ordering::Release);

        #[cfg(feature = "logging")]
        debug!(
            target: crate::logging::TARGET,
            definitions = self.registry.len(),
            "Container locked - registration closed"
        );
    }

    /// Check if the container is locked.
    #[inline]
    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Acquire)
    }

    #[inline]
    fn check_not_locked(&self) -> Result<()> {
        if self.is_locked() {
            return Err(DiError::Locked);
        }
        Ok(())
    }
}

/// View a resolved instance as `T`, through a declared alias if needed.
fn view_as<T: ?Sized + Send + Sync + 'static>(
    name: &str,
    definition: &ComponentDefinition,
    instance: &Instance,
) -> Result<Arc<T>> {
    if let Some(value) = instance.downcast::<T>() {
        return Ok(value);
    }
    definition
        .cast_to(TypeKey::of::<T>(), instance)
        .and_then(|cast| cast.downcast::<T>())
        .ok_or_else(|| DiError::TypeMismatch {
            name: name.to_string(),
            expected: std::any::type_name::<T>(),
            found: instance.type_name(),
        })
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("definitions", &self.len())
            .field("hooks", &self.hook_count())
            .field("cached_singletons", &self.singletons.len())
            .field("locked", &self.is_locked())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FnFactory, Interception, Scope};
    use parking_lot::Mutex;
    use std::sync::{Barrier, mpsc};
    use std::sync::atomic::AtomicU32;
    use std::thread;
    use std::time::Duration;

    #[derive(Default, Debug)]
    struct IndexDao {
        inited: AtomicBool,
    }

    trait Dao: Send + Sync {
        fn describe(&self) -> String;
    }

    impl Dao for IndexDao {
        fn describe(&self) -> String {
            "index".into()
        }
    }

    struct LoggingDao {
        inner: Arc<IndexDao>,
    }

    fn counting(counter: &Arc<AtomicU32>) -> ComponentDefinition {
        let counter = Arc::clone(counter);
        ComponentDefinition::of(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            IndexDao::default()
        })
    }

    fn log_hook(log: &Arc<Mutex<Vec<String>>>, priority: i32, tag: &'static str) -> HookRecord {
        let before_log = Arc::clone(log);
        let after_log = Arc::clone(log);
        HookRecord::new(priority)
            .before(move |instance, name| {
                before_log.lock().push(format!("before:{tag}:{name}"));
                Ok(Interception::Proceed(instance))
            })
            .after(move |instance, name| {
                after_log.lock().push(format!("after:{tag}:{name}"));
                Ok(Interception::Proceed(instance))
            })
    }

    #[test]
    fn test_singleton_identity() {
        let counter = Arc::new(AtomicU32::new(0));
        let container = Container::new();
        container.register("indexDao", counting(&counter)).unwrap();

        let a = container.get_bean("indexDao").unwrap();
        let b = container.get_bean("indexDao").unwrap();

        assert!(Instance::ptr_eq(&a, &b));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_prototype_builds_every_time() {
        let counter = Arc::new(AtomicU32::new(0));
        let container = Container::new();
        container
            .register("indexDao", counting(&counter).scope(Scope::Prototype))
            .unwrap();

        let a = container.get_bean("indexDao").unwrap();
        let b = container.get_bean("indexDao").unwrap();

        assert!(!Instance::ptr_eq(&a, &b));
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_not_found() {
        let container = Container::new();
        let err = container.get_bean("missing").unwrap_err();
        assert_eq!(err, DiError::not_found("missing"));
        assert!(!err.is_halted());
    }

    #[test]
    fn test_hooks_wrap_init_in_priority_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let init_log = Arc::clone(&log);

        let container = Container::new();
        container
            .register(
                "indexDao",
                ComponentDefinition::default_of::<IndexDao>().with_init(move |dao: &IndexDao| {
                    dao.inited.store(true, Ordering::SeqCst);
                    init_log.lock().push("init".into());
                    Ok(())
                }),
            )
            .unwrap();
        container.add_hook(log_hook(&log, 15, "h15")).unwrap();
        container.add_hook(log_hook(&log, 11, "h11")).unwrap();

        let dao: Arc<IndexDao> = container.get_named("indexDao").unwrap();
        assert!(dao.inited.load(Ordering::SeqCst));
        assert_eq!(
            *log.lock(),
            vec![
                "before:h11:indexDao",
                "before:h15:indexDao",
                "init",
                "after:h11:indexDao",
                "after:h15:indexDao",
            ]
        );
    }

    #[test]
    fn test_before_halt_skips_init_and_after_hooks() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let counter = Arc::new(AtomicU32::new(0));
        let init_log = Arc::clone(&log);

        let container = Container::new();
        container
            .register(
                "indexDao",
                counting(&counter).with_init(move |_: &IndexDao| {
                    init_log.lock().push("init".into());
                    Ok(())
                }),
            )
            .unwrap();
        container
            .add_hook(HookRecord::new(5).before(|_, _| Ok(Interception::Halt)))
            .unwrap();
        container.add_hook(log_hook(&log, 15, "late")).unwrap();

        let err = container.get_bean("indexDao").unwrap_err();
        assert_eq!(err, DiError::halted("indexDao", ResolutionState::PreInit));
        assert!(log.lock().is_empty());

        // nothing was cached, so the next attempt constructs again
        let _ = container.get_bean("indexDao");
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_after_halt_reports_post_init() {
        let container = Container::new();
        container
            .register("indexDao", ComponentDefinition::default_of::<IndexDao>())
            .unwrap();
        container
            .add_hook(HookRecord::new(1).after(|_, _| Ok(Interception::Halt)))
            .unwrap();

        let err = container.get_bean("indexDao").unwrap_err();
        assert_eq!(err, DiError::halted("indexDao", ResolutionState::PostInit));
    }

    #[test]
    fn test_after_hook_replacement_is_final_instance() {
        let container = Container::new();
        container
            .register("indexDao", ComponentDefinition::default_of::<IndexDao>())
            .unwrap();
        container
            .add_hook(HookRecord::new(0).after(|instance, _| {
                let inner = instance.downcast::<IndexDao>().unwrap();
                let wrapped = Arc::new(LoggingDao { inner });
                Ok(Interception::Proceed(Instance::from_arc(wrapped)))
            }))
            .unwrap();

        let bean = container.get_bean("indexDao").unwrap();
        assert!(bean.is::<LoggingDao>());

        let again: Arc<LoggingDao> = container.get_named("indexDao").unwrap();
        assert_eq!(again.inner.describe(), "index");

        let err = container.get_named::<IndexDao>("indexDao").unwrap_err();
        assert!(matches!(err, DiError::TypeMismatch { .. }));
    }

    #[test]
    fn test_hook_error_propagates_without_caching() {
        let fail = Arc::new(AtomicBool::new(true));
        let hook_fail = Arc::clone(&fail);
        let container = Container::new();
        container
            .register("indexDao", ComponentDefinition::default_of::<IndexDao>())
            .unwrap();
        container
            .add_hook(HookRecord::new(0).before(move |instance, name| {
                if hook_fail.load(Ordering::SeqCst) {
                    return Err(DiError::creation_failed(name, "veto by audit"));
                }
                Ok(Interception::Proceed(instance))
            }))
            .unwrap();

        let err = container.get_bean("indexDao").unwrap_err();
        assert_eq!(err, DiError::creation_failed("indexDao", "veto by audit"));

        fail.store(false, Ordering::SeqCst);
        assert!(container.get_bean("indexDao").is_ok());
    }

    #[test]
    fn test_concurrent_singleton_constructs_once() {
        let counter = Arc::new(AtomicU32::new(0));
        let slow = Arc::clone(&counter);
        let container = Container::new();
        container
            .register(
                "indexDao",
                ComponentDefinition::of(move || {
                    slow.fetch_add(1, Ordering::SeqCst);
                    thread::sleep(Duration::from_millis(20));
                    IndexDao::default()
                }),
            )
            .unwrap();
        container.lock();

        let threads = 8;
        let barrier = Arc::new(Barrier::new(threads));
        let handles: Vec<_> = (0..threads)
            .map(|_| {
                let container = container.clone();
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    container.get_bean("indexDao").unwrap()
                })
            })
            .collect();

        let instances: Vec<Instance> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(instances.iter().all(|i| Instance::ptr_eq(i, &instances[0])));
    }

    #[test]
    fn test_concurrent_singleton_factory_produces_once() {
        let calls = Arc::new(AtomicU32::new(0));
        let produce_calls = Arc::clone(&calls);
        let container = Container::new();
        container
            .register_factory(
                "clock",
                Arc::new(FnFactory::singleton(move || {
                    produce_calls.fetch_add(1, Ordering::SeqCst);
                    thread::sleep(Duration::from_millis(20));
                    Ok(Arc::new(42u64))
                })),
            )
            .unwrap();

        let barrier = Arc::new(Barrier::new(6));
        let handles: Vec<_> = (0..6)
            .map(|_| {
                let container = container.clone();
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    container.get::<u64>().unwrap()
                })
            })
            .collect();

        let values: Vec<Arc<u64>> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(values.iter().all(|v| Arc::ptr_eq(v, &values[0])));
    }

    #[test]
    fn test_prototype_factory_produces_each_time() {
        let calls = Arc::new(AtomicU32::new(0));
        let produce_calls = Arc::clone(&calls);
        let container = Container::new();
        container
            .register("connection", ComponentDefinition::declared::<String>())
            .unwrap();
        container
            .attach_factory(
                "connection",
                Arc::new(FnFactory::prototype(move || {
                    produce_calls.fetch_add(1, Ordering::SeqCst);
                    Ok(Arc::new(String::from("conn")))
                })),
            )
            .unwrap();

        let a = container.get_bean("connection").unwrap();
        let b = container.get_bean("connection").unwrap();

        assert!(!Instance::ptr_eq(&a, &b));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(container.is_singleton("connection"), Ok(false));
    }

    #[test]
    fn test_factory_path_skips_hooks() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let container = Container::new();
        container
            .register_factory(
                "name",
                Arc::new(FnFactory::prototype(|| Ok(Arc::new(String::from("x"))))),
            )
            .unwrap();
        container.add_hook(log_hook(&log, 0, "h")).unwrap();

        container.get_bean("name").unwrap();
        assert!(log.lock().is_empty());
    }

    #[test]
    fn test_factory_error_propagates_without_caching() {
        let offline = Arc::new(AtomicBool::new(true));
        let backend = Arc::clone(&offline);
        let calls = Arc::new(AtomicU32::new(0));
        let produce_calls = Arc::clone(&calls);
        let container = Container::new();
        container
            .register_factory(
                "flaky",
                Arc::new(FnFactory::singleton(move || {
                    produce_calls.fetch_add(1, Ordering::SeqCst);
                    if backend.load(Ordering::SeqCst) {
                        return Err(DiError::creation_failed("flaky", "no backend"));
                    }
                    Ok(Arc::new(String::from("connected")))
                })),
            )
            .unwrap();

        assert_eq!(
            container.get_bean("flaky").unwrap_err(),
            DiError::creation_failed("flaky", "no backend")
        );

        // the failed attempt released the slot, so the next resolve produces again
        offline.store(false, Ordering::SeqCst);
        let first: Arc<String> = container.get_named("flaky").unwrap();
        let second: Arc<String> = container.get_named("flaky").unwrap();

        assert_eq!(*first, "connected");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_declared_without_factory_fails() {
        let container = Container::new();
        container
            .register("fetcher", ComponentDefinition::declared::<dyn Dao>())
            .unwrap();

        assert!(matches!(
            container.get_bean("fetcher"),
            Err(DiError::CreationFailed { .. })
        ));
    }

    #[test]
    fn test_duplicate_keeps_original() {
        let container = Container::new();
        container
            .register("dao", ComponentDefinition::default_of::<IndexDao>())
            .unwrap();

        let err = container
            .register("dao", ComponentDefinition::of(|| String::from("other")))
            .unwrap_err();
        assert_eq!(err, DiError::duplicate("dao"));
        assert!(container.get_named::<IndexDao>("dao").is_ok());
    }

    #[test]
    fn test_overwrite_discards_cached_singleton() {
        let container = Container::new();
        container
            .register("value", ComponentDefinition::of(|| 1u32))
            .unwrap();
        assert_eq!(*container.get_named::<u32>("value").unwrap(), 1);

        container
            .register_definition("value", ComponentDefinition::of(|| 2u32), true)
            .unwrap();
        assert_eq!(*container.get_named::<u32>("value").unwrap(), 2);
    }

    #[test]
    fn test_get_by_type_and_alias() {
        let container = Container::new();
        container
            .register(
                "indexDao",
                ComponentDefinition::default_of::<IndexDao>()
                    .assignable_to(|dao: Arc<IndexDao>| dao as Arc<dyn Dao>),
            )
            .unwrap();

        let dao = container.get::<dyn Dao>().unwrap();
        assert_eq!(dao.describe(), "index");

        let concrete = container.get::<IndexDao>().unwrap();
        let by_key = container.get_bean_by_type(TypeKey::of::<dyn Dao>()).unwrap();
        assert!(Instance::ptr_eq(&by_key, &Instance::from_arc(concrete)));
    }

    #[test]
    fn test_get_by_type_ambiguous() {
        let container = Container::new();
        container
            .register("a", ComponentDefinition::of(|| 1u8))
            .unwrap();
        container
            .register("b", ComponentDefinition::of(|| 2u8))
            .unwrap();

        match container.get::<u8>() {
            Err(DiError::AmbiguousType { candidates, .. }) => {
                assert_eq!(candidates, vec!["a", "b"]);
            }
            other => panic!("expected ambiguity, got {other:?}"),
        }
        assert!(container.try_get::<u16>().is_none());
    }

    #[test]
    fn test_self_reference_is_circular() {
        let container = Container::new();
        let inner = container.clone();
        container
            .register(
                "loop",
                ComponentDefinition::try_of(move || {
                    inner.get_bean("loop")?;
                    Ok(IndexDao::default())
                }),
            )
            .unwrap();

        assert_eq!(
            container.get_bean("loop").unwrap_err(),
            DiError::circular("loop")
        );
    }

    /// Constructor that, on its first run only, waits for the other thread
    /// before resolving `other`.
    fn crossing(
        container: &Container,
        other: &'static str,
        barrier: &Arc<Barrier>,
    ) -> ComponentDefinition {
        let inner = container.clone();
        let barrier = Arc::clone(barrier);
        let first_run = AtomicBool::new(true);
        ComponentDefinition::try_of(move || {
            if first_run.swap(false, Ordering::SeqCst) {
                barrier.wait();
            }
            inner.get_bean(other)?;
            Ok(IndexDao::default())
        })
    }

    #[test]
    fn test_cross_thread_cycle_is_circular() {
        let container = Container::new();
        let barrier = Arc::new(Barrier::new(2));
        container
            .register("a", crossing(&container, "b", &barrier))
            .unwrap();
        container
            .register("b", crossing(&container, "a", &barrier))
            .unwrap();

        let (tx, rx) = mpsc::channel();
        for name in ["a", "b"] {
            let container = container.clone();
            let tx = tx.clone();
            thread::spawn(move || {
                let _ = tx.send((name, container.get_bean(name)));
            });
        }

        for _ in 0..2 {
            let (name, result) = rx
                .recv_timeout(Duration::from_secs(5))
                .unwrap_or_else(|_| panic!("resolution did not finish: threads deadlocked"));
            assert!(
                matches!(result, Err(DiError::CircularDependency { .. })),
                "{name} resolved to {result:?}"
            );
        }

        // both sections were released
        assert!(container.waits.owners.is_empty());
        assert!(container.waits.waiting.is_empty());
    }

    #[test]
    fn test_nested_resolution_in_constructor() {
        let container = Container::new();
        let inner = container.clone();
        container
            .register("url", ComponentDefinition::of(|| String::from("mem://")))
            .unwrap();
        container
            .register(
                "greeting",
                ComponentDefinition::try_of(move || {
                    let url: Arc<String> = inner.get_named("url")?;
                    Ok(format!("connected to {url}").into_bytes())
                }),
            )
            .unwrap();

        let bytes: Arc<Vec<u8>> = container.get_named("greeting").unwrap();
        assert_eq!(bytes.as_slice(), b"connected to mem://");
    }

    #[test]
    fn test_lock_closes_registration() {
        let container = Container::new();
        container.lock();

        assert!(container.is_locked());
        assert_eq!(
            container.register("x", ComponentDefinition::of(|| 0u8)),
            Err(DiError::Locked)
        );
        assert_eq!(container.add_hook(HookRecord::new(0)), Err(DiError::Locked));
    }

    #[test]
    fn test_type_of_and_get_factory_do_not_produce() {
        let calls = Arc::new(AtomicU32::new(0));
        let produce_calls = Arc::clone(&calls);
        let container = Container::new();
        container
            .register_factory(
                "name",
                Arc::new(FnFactory::singleton(move || {
                    produce_calls.fetch_add(1, Ordering::SeqCst);
                    Ok(Arc::new(String::from("x")))
                })),
            )
            .unwrap();

        assert_eq!(container.type_of("name").unwrap(), TypeKey::of::<String>());
        let factory = container.get_factory("name").unwrap();
        assert!(factory.is_singleton());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_preinstantiate_singletons() {
        let counter = Arc::new(AtomicU32::new(0));
        let container = Container::new();
        container.register("eager", counting(&counter)).unwrap();
        container
            .register("proto", counting(&counter).prototype())
            .unwrap();
        container
            .register("vetoed", ComponentDefinition::of(|| 0u8))
            .unwrap();
        container
            .add_hook(HookRecord::new(0).before(|instance, name| {
                if name == "vetoed" {
                    return Ok(Interception::Halt);
                }
                Ok(Interception::Proceed(instance))
            }))
            .unwrap();

        assert_eq!(container.preinstantiate_singletons().unwrap(), 1);
        assert_eq!(counter.load(Ordering::SeqCst), 1);

        container.get_bean("eager").unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_introspection() {
        let container = Container::new();
        assert!(container.is_empty());
        container
            .register("b", ComponentDefinition::of(|| 0u8))
            .unwrap();
        container
            .register("a", ComponentDefinition::of(|| 0u16))
            .unwrap();

        assert_eq!(container.len(), 2);
        assert!(container.contains("a"));
        assert_eq!(container.definition_names(), vec!["b", "a"]);
        assert_eq!(container.is_singleton("a"), Ok(true));
        assert!(container.is_singleton("zzz").is_err());
    }
}
