//! Association slots: the child entity path behind a to-one edge or a collection element.
//!
//! A slot is either built eagerly when its owner is built, or deferred behind a placeholder
//! that builds the child on first access. The choice is made by [`PathInits::decide`].

use std::fmt;
use std::sync::{Arc, OnceLock};

use log::{debug, trace};
use serde::Serialize;

use crate::entity::{EntityPath, EntityPathBase, EntityPathType};
use crate::inits::{Expansion, PathInits};
use crate::metadata::PathMetadata;
use crate::types::TypeTag;

/// Builds an entity path of type `Q` at a metadata position.
pub type EntityFactory<Q> = Arc<dyn Fn(PathMetadata, PathInits) -> Q + Send + Sync>;

/// Target side of an association edge: the entity type name and how to build its path.
pub struct EntityTarget<Q> {
    entity: Arc<str>,
    factory: EntityFactory<Q>,
}

impl<Q> EntityTarget<Q> {
    pub fn new(
        entity: impl Into<Arc<str>>,
        factory: impl Fn(PathMetadata, PathInits) -> Q + Send + Sync + 'static,
    ) -> Self {
        Self {
            entity: entity.into(),
            factory: Arc::new(factory),
        }
    }

    #[inline]
    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn build(&self, metadata: PathMetadata, inits: PathInits) -> Q {
        (self.factory)(metadata, inits)
    }
}

impl<Q: EntityPathType> EntityTarget<Q> {
    /// Target for a typed entity path.
    pub fn of() -> Self {
        Self::new(Q::ENTITY, Q::with_inits)
    }
}

impl<Q> Clone for EntityTarget<Q> {
    fn clone(&self) -> Self {
        Self {
            entity: Arc::clone(&self.entity),
            factory: Arc::clone(&self.factory),
        }
    }
}

impl<Q> fmt::Debug for EntityTarget<Q> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EntityTarget").field(&self.entity).finish()
    }
}

/// Construction state of an association slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AssociationState {
    /// Built together with its owner.
    Eager,
    /// Placeholder not yet accessed.
    Deferred,
    /// Placeholder that has been accessed and built.
    Expanded,
}

impl AssociationState {
    pub const fn as_str(self) -> &'static str {
        match self {
            AssociationState::Eager => "eager",
            AssociationState::Deferred => "deferred",
            AssociationState::Expanded => "expanded",
        }
    }

    pub const fn is_built(self) -> bool {
        !matches!(self, AssociationState::Deferred)
    }
}

impl fmt::Display for AssociationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

enum Slot<Q> {
    Eager(Arc<Q>),
    Deferred {
        target: EntityTarget<Q>,
        inits: PathInits,
        cell: OnceLock<Arc<Q>>,
    },
}

/// Child entity path at one association position.
pub struct Association<Q> {
    metadata: PathMetadata,
    type_tag: TypeTag,
    slot: Slot<Q>,
}

impl<Q> Association<Q> {
    /// Builds the slot for `edge` at `metadata`, asking `inits` whether to expand it now.
    pub fn resolve(
        edge: &str,
        metadata: PathMetadata,
        target: &EntityTarget<Q>,
        inits: &PathInits,
    ) -> Self {
        let type_tag = TypeTag::entity(target.entity());
        let slot = match inits.decide(edge, target.entity()) {
            Expansion::Eager => {
                debug!("eager association {metadata} -> {}", target.entity());
                let child = target.build(metadata.clone(), inits.derive(edge, target.entity()));
                Slot::Eager(Arc::new(child))
            }
            Expansion::Deferred => {
                trace!("deferred association {metadata} -> {}", target.entity());
                Slot::Deferred {
                    target: target.clone(),
                    inits: inits.fresh(),
                    cell: OnceLock::new(),
                }
            }
        };
        Self {
            metadata,
            type_tag,
            slot,
        }
    }

    /// The child path, building a deferred placeholder on first call.
    ///
    /// Concurrent first calls build at most once and all observe the same instance.
    pub fn get(&self) -> &Q {
        self.shared()
    }

    /// Shared handle on the child path, building it if needed.
    pub fn shared(&self) -> &Arc<Q> {
        match &self.slot {
            Slot::Eager(child) => child,
            Slot::Deferred { target, inits, cell } => cell.get_or_init(|| {
                trace!("expanding deferred association {} -> {}", self.metadata, target.entity());
                Arc::new(target.build(self.metadata.clone(), inits.clone()))
            }),
        }
    }

    /// The child path if it has been built.
    pub fn peek(&self) -> Option<&Q> {
        match &self.slot {
            Slot::Eager(child) => Some(child.as_ref()),
            Slot::Deferred { cell, .. } => cell.get().map(AsRef::as_ref),
        }
    }

    pub fn state(&self) -> AssociationState {
        match &self.slot {
            Slot::Eager(_) => AssociationState::Eager,
            Slot::Deferred { cell, .. } if cell.get().is_some() => AssociationState::Expanded,
            Slot::Deferred { .. } => AssociationState::Deferred,
        }
    }

    #[inline]
    pub fn metadata(&self) -> &PathMetadata {
        &self.metadata
    }

    #[inline]
    pub fn type_tag(&self) -> &TypeTag {
        &self.type_tag
    }

    pub fn target_entity(&self) -> &str {
        self.type_tag.entity_name().unwrap_or_default()
    }
}

impl<Q> fmt::Debug for Association<Q> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Association")
            .field("path", &format_args!("{}", self.metadata))
            .field("target", &self.target_entity())
            .field("state", &self.state())
            .finish()
    }
}

/// Type-erased view of an association, used for generic tree walks.
pub trait AssociationNode: Send + Sync {
    fn metadata(&self) -> &PathMetadata;

    fn target_entity(&self) -> &str;

    fn state(&self) -> AssociationState;

    /// Child entity base if already built.
    fn peek_base(&self) -> Option<&EntityPathBase>;

    /// Child entity base, building a deferred placeholder if needed.
    fn expand_base(&self) -> &EntityPathBase;
}

impl<Q: EntityPath> AssociationNode for Association<Q> {
    fn metadata(&self) -> &PathMetadata {
        Association::metadata(self)
    }

    fn target_entity(&self) -> &str {
        Association::target_entity(self)
    }

    fn state(&self) -> AssociationState {
        Association::state(self)
    }

    fn peek_base(&self) -> Option<&EntityPathBase> {
        self.peek().map(EntityPath::base)
    }

    fn expand_base(&self) -> &EntityPathBase {
        self.get().base()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_target(builds: Arc<AtomicUsize>) -> EntityTarget<EntityPathBase> {
        EntityTarget::new("Node", move |metadata, inits| {
            builds.fetch_add(1, Ordering::SeqCst);
            EntityPathBase::new("Node", metadata, inits)
        })
    }

    #[test]
    fn eager_slot_builds_immediately() {
        let builds = Arc::new(AtomicUsize::new(0));
        let target = counting_target(Arc::clone(&builds));
        let inits = PathInits::default().entering("Owner");
        let metadata = PathMetadata::root("o").property("node");
        let slot = Association::resolve("node", metadata, &target, &inits);
        assert_eq!(slot.state(), AssociationState::Eager);
        assert_eq!(builds.load(Ordering::SeqCst), 1);
        assert_eq!(slot.get().entity_type(), "Node");
        assert_eq!(slot.target_entity(), "Node");
    }

    #[test]
    fn deferred_slot_expands_once() {
        let builds = Arc::new(AtomicUsize::new(0));
        let target = counting_target(Arc::clone(&builds));
        let inits = PathInits::deferred().entering("Owner");
        let metadata = PathMetadata::root("o").property("node");
        let slot = Association::resolve("node", metadata, &target, &inits);
        assert_eq!(slot.state(), AssociationState::Deferred);
        assert!(slot.peek().is_none());
        assert_eq!(builds.load(Ordering::SeqCst), 0);

        let first = Arc::clone(slot.shared());
        let second = Arc::clone(slot.shared());
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(builds.load(Ordering::SeqCst), 1);
        assert_eq!(slot.state(), AssociationState::Expanded);
        assert_eq!(first.metadata().to_string(), "o.node");
    }

    #[test]
    fn erased_view_reports_state() {
        let target = counting_target(Arc::new(AtomicUsize::new(0)));
        let inits = PathInits::deferred().entering("Owner");
        let metadata = PathMetadata::root("o").property("node");
        let slot = Association::resolve("node", metadata, &target, &inits);
        let erased: &dyn AssociationNode = &slot;
        assert!(erased.peek_base().is_none());
        assert_eq!(erased.expand_base().entity_type(), "Node");
        assert!(erased.state().is_built());
    }
}
