//! Definition registry
//!
//! Uses DashMap for lock-free concurrent reads. Every entry carries a
//! sequence number so that type lookups can report candidates in
//! registration order.

use crate::{ComponentDefinition, DiError, ObjectFactory, Result, TypeKey};
use ahash::RandomState;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

#[cfg(feature = "logging")]
use tracing::debug;

/// A stored definition and its registration position
struct Registered {
    seq: u64,
    definition: Arc<ComponentDefinition>,
}

/// Name-keyed store of component definitions.
pub struct DefinitionRegistry {
    definitions: DashMap<String, Registered, RandomState>,
    next_seq: AtomicU64,
}

impl DefinitionRegistry {
    /// Create new empty registry.
    ///
    /// Uses 8 shards; definition counts are small and mostly read.
    #[inline]
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create with pre-allocated capacity.
    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        let shard_amount = if capacity <= 16 { 8 } else { 16 };
        Self {
            definitions: DashMap::with_capacity_and_hasher_and_shard_amount(
                capacity,
                RandomState::new(),
                shard_amount,
            ),
            next_seq: AtomicU64::new(0),
        }
    }

    /// Store a definition under `name`.
    ///
    /// Fails with `DuplicateDefinition` when the name is taken and `overwrite`
    /// is false. An overwrite keeps the original registration position and
    /// returns the replaced definition.
    pub fn register(
        &self,
        name: &str,
        definition: ComponentDefinition,
        overwrite: bool,
    ) -> Result<Option<Arc<ComponentDefinition>>> {
        match self.definitions.entry(name.to_string()) {
            Entry::Occupied(mut occupied) => {
                if !overwrite {
                    return Err(DiError::duplicate(name));
                }

                #[cfg(feature = "logging")]
                debug!(
                    target: crate::logging::TARGET,
                    component = name,
                    "Overwriting component definition"
                );

                let previous = std::mem::replace(
                    &mut occupied.get_mut().definition,
                    Arc::new(definition),
                );
                Ok(Some(previous))
            }
            Entry::Vacant(vacant) => {
                let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
                vacant.insert(Registered {
                    seq,
                    definition: Arc::new(definition),
                });
                Ok(None)
            }
        }
    }

    /// Attach a factory to an existing definition.
    pub fn attach_factory(&self, name: &str, factory: Arc<dyn ObjectFactory>) -> Result<()> {
        let mut entry = self
            .definitions
            .get_mut(name)
            .ok_or_else(|| DiError::not_found(name))?;
        Arc::make_mut(&mut entry.definition).set_factory(factory);
        Ok(())
    }

    /// Look up a definition by name.
    #[inline]
    pub fn lookup(&self, name: &str) -> Result<Arc<ComponentDefinition>> {
        self.definitions
            .get(name)
            .map(|entry| Arc::clone(&entry.definition))
            .ok_or_else(|| DiError::not_found(name))
    }

    /// Find the single definition assignable to `key`.
    ///
    /// Fails with `TypeNotFound` when nothing matches and with `AmbiguousType`
    /// (candidates in registration order) when more than one does.
    pub fn lookup_by_type(&self, key: TypeKey) -> Result<(String, Arc<ComponentDefinition>)> {
        let mut matches: Vec<(u64, String, Arc<ComponentDefinition>)> = self
            .definitions
            .iter()
            .filter(|entry| entry.definition.is_assignable_to(key))
            .map(|entry| {
                (
                    entry.seq,
                    entry.key().clone(),
                    Arc::clone(&entry.definition),
                )
            })
            .collect();

        match matches.len() {
            0 => Err(DiError::TypeNotFound {
                type_name: key.name(),
            }),
            1 => {
                let (_, name, definition) = matches.remove(0);
                Ok((name, definition))
            }
            _ => {
                matches.sort_by_key(|(seq, _, _)| *seq);
                Err(DiError::AmbiguousType {
                    type_name: key.name(),
                    candidates: matches.into_iter().map(|(_, name, _)| name).collect(),
                })
            }
        }
    }

    /// Check if a name is registered
    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.definitions.contains_key(name)
    }

    /// Registered names in registration order.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<(u64, String)> = self
            .definitions
            .iter()
            .map(|entry| (entry.seq, entry.key().clone()))
            .collect();
        names.sort_by_key(|(seq, _)| *seq);
        names.into_iter().map(|(_, name)| name).collect()
    }

    /// Get number of registered definitions
    #[inline]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Check if empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

impl Default for DefinitionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DefinitionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefinitionRegistry")
            .field("count", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FnFactory;

    trait Dao: Send + Sync {}

    #[derive(Default)]
    struct IndexDao;
    impl Dao for IndexDao {}

    #[derive(Default)]
    struct OrderDao;
    impl Dao for OrderDao {}

    fn index_dao() -> ComponentDefinition {
        ComponentDefinition::default_of::<IndexDao>()
            .assignable_to(|dao: Arc<IndexDao>| dao as Arc<dyn Dao>)
    }

    fn order_dao() -> ComponentDefinition {
        ComponentDefinition::default_of::<OrderDao>()
            .assignable_to(|dao: Arc<OrderDao>| dao as Arc<dyn Dao>)
    }

    #[test]
    fn test_register_and_lookup() {
        let registry = DefinitionRegistry::new();
        registry.register("indexDao", index_dao(), false).unwrap();

        let def = registry.lookup("indexDao").unwrap();
        assert_eq!(def.declared_type(), TypeKey::of::<IndexDao>());
        assert!(registry.contains("indexDao"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_lookup_missing() {
        let registry = DefinitionRegistry::new();
        assert_eq!(
            registry.lookup("nope").unwrap_err(),
            DiError::not_found("nope")
        );
    }

    #[test]
    fn test_duplicate_without_overwrite_keeps_original() {
        let registry = DefinitionRegistry::new();
        registry.register("dao", index_dao(), false).unwrap();

        let err = registry.register("dao", order_dao(), false).unwrap_err();
        assert_eq!(err, DiError::duplicate("dao"));

        let def = registry.lookup("dao").unwrap();
        assert_eq!(def.declared_type(), TypeKey::of::<IndexDao>());
    }

    #[test]
    fn test_overwrite_replaces_and_keeps_position() {
        let registry = DefinitionRegistry::new();
        registry.register("a", index_dao(), false).unwrap();
        registry.register("b", index_dao(), false).unwrap();

        let previous = registry.register("a", order_dao(), true).unwrap();
        assert_eq!(previous.unwrap().declared_type(), TypeKey::of::<IndexDao>());
        assert_eq!(
            registry.lookup("a").unwrap().declared_type(),
            TypeKey::of::<OrderDao>()
        );
        assert_eq!(registry.names(), vec!["a", "b"]);
    }

    #[test]
    fn test_lookup_by_type() {
        let registry = DefinitionRegistry::new();
        registry.register("indexDao", index_dao(), false).unwrap();

        let (name, _) = registry.lookup_by_type(TypeKey::of::<IndexDao>()).unwrap();
        assert_eq!(name, "indexDao");

        let (name, _) = registry.lookup_by_type(TypeKey::of::<dyn Dao>()).unwrap();
        assert_eq!(name, "indexDao");

        assert!(matches!(
            registry.lookup_by_type(TypeKey::of::<String>()),
            Err(DiError::TypeNotFound { .. })
        ));
    }

    #[test]
    fn test_ambiguous_type_lists_candidates_in_order() {
        let registry = DefinitionRegistry::new();
        for name in ["orderDao", "indexDao", "auditDao"] {
            let def = if name == "orderDao" { order_dao() } else { index_dao() };
            registry.register(name, def, false).unwrap();
        }

        match registry.lookup_by_type(TypeKey::of::<dyn Dao>()) {
            Err(DiError::AmbiguousType { candidates, .. }) => {
                assert_eq!(candidates, vec!["orderDao", "indexDao", "auditDao"]);
            }
            other => panic!("expected ambiguity, got {other:?}"),
        }
    }

    #[test]
    fn test_attach_factory() {
        let registry = DefinitionRegistry::new();
        registry
            .register("fetcher", ComponentDefinition::declared::<dyn Dao>(), false)
            .unwrap();

        let factory = FnFactory::prototype(|| Ok(Arc::new(IndexDao) as Arc<dyn Dao>));
        registry.attach_factory("fetcher", Arc::new(factory)).unwrap();
        assert!(registry.lookup("fetcher").unwrap().has_factory());

        let missing = FnFactory::prototype(|| Ok(Arc::new(IndexDao)));
        assert_eq!(
            registry.attach_factory("ghost", Arc::new(missing)).unwrap_err(),
            DiError::not_found("ghost")
        );
    }
}
