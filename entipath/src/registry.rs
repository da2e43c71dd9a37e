use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use log::debug;

use crate::entity::EntityPathType;
use crate::inits::PathInits;
use crate::metadata::PathMetadata;
use crate::schema::{EntitySchema, Schema};

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
struct SlotKey {
    entity: Arc<str>,
    metadata: PathMetadata,
    type_id: TypeId,
}

type Slot = Arc<dyn Any + Send + Sync>;

/// Cache of entity paths keyed by entity type, metadata and Rust type.
///
/// Each key is built at most once, even when several threads ask for it at the same time.
/// Building happens outside the map lock, so a factory may itself use the registry.
#[derive(Default)]
pub struct PathRegistry {
    slots: RwLock<HashMap<SlotKey, Slot>>,
}

impl PathRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached path for `(entity, metadata, Q)`, building it with `build` on first use.
    pub fn get_or_insert_with<Q, F>(
        &self,
        entity: &str,
        metadata: &PathMetadata,
        build: F,
    ) -> Arc<Q>
    where
        Q: Send + Sync + 'static,
        F: FnOnce() -> Q,
    {
        let key = SlotKey {
            entity: Arc::from(entity),
            metadata: metadata.clone(),
            type_id: TypeId::of::<Q>(),
        };
        let cell = self.slot::<Q>(key);
        Arc::clone(cell.get_or_init(|| Arc::new(build())))
    }

    /// Cached root path of a typed entity for `variable`.
    pub fn root<Q: EntityPathType>(&self, variable: &str) -> Arc<Q> {
        let metadata = PathMetadata::root(variable);
        self.get_or_insert_with(Q::ENTITY, &metadata, || {
            Q::with_inits(metadata.clone(), PathInits::default())
        })
    }

    /// Cached root path under the entity's canonical variable.
    pub fn canonical<Q: EntityPathType>(&self) -> Arc<Q> {
        self.root::<Q>(Q::VARIABLE)
    }

    pub fn len(&self) -> usize {
        self.slots.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.slots.write().unwrap_or_else(PoisonError::into_inner).clear();
    }

    fn slot<Q: Send + Sync + 'static>(&self, key: SlotKey) -> Arc<OnceLock<Arc<Q>>> {
        let cached = self
            .slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .cloned()
            .and_then(|slot| slot.downcast::<OnceLock<Arc<Q>>>().ok());
        if let Some(cell) = cached {
            return cell;
        }
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        let slot = slots.entry(key).or_insert_with_key(|key| {
            debug!("registry slot for {} at {}", key.entity, key.metadata);
            Arc::new(OnceLock::<Arc<Q>>::new())
        });
        // `type_id` is part of the key, so only a slot of type `Q` can sit under it.
        match Arc::clone(slot).downcast::<OnceLock<Arc<Q>>>() {
            Ok(cell) => cell,
            Err(_) => {
                let cell = Arc::new(OnceLock::new());
                *slot = Arc::clone(&cell) as Slot;
                cell
            }
        }
    }
}

impl std::fmt::Debug for PathRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PathRegistry").field("len", &self.len()).finish()
    }
}

/// Typed entity path registered for discovery.
///
/// Submitted with `inventory::submit!` next to each typed entity path; the CLI assembles its
/// built-in schema from these.
pub struct PathTypeRegistration {
    pub entity: &'static str,
    pub variable: &'static str,
    pub describe: fn() -> EntitySchema,
}

inventory::collect!(PathTypeRegistration);

/// Describes a typed entity path without expanding any association.
pub fn describe_entity<Q: EntityPathType>() -> EntitySchema {
    Q::with_inits(PathMetadata::root(Q::VARIABLE), PathInits::deferred()).base().describe()
}

pub fn registered_path_types() -> impl Iterator<Item = &'static PathTypeRegistration> {
    inventory::iter::<PathTypeRegistration>()
}

/// Schema of every registered typed entity path, sorted by entity name.
pub fn builtin_schema() -> Schema {
    let mut registrations: Vec<_> = registered_path_types().collect();
    registrations.sort_by_key(|registration| registration.entity);
    Schema {
        entities: registrations.into_iter().map(|registration| (registration.describe)()).collect(),
    }
}
