//! Association paths: to-one references, lists, sets and maps of entities.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::ops::Deref;
use std::sync::Arc;

use crate::association::{Association, AssociationState, EntityTarget};
use crate::expr::{Expr, Operator, Predicate};
use crate::inits::PathInits;
use crate::metadata::PathMetadata;
use crate::path::{ops, Path, PathNode};
use crate::types::{IntoConstant, TypeTag, ValueType};

/// Path to a single associated entity.
///
/// Dereferences to the target entity path, so `loan.user.name` reads like the domain model.
/// Dereferencing a deferred reference builds it.
pub struct EntityRef<Q> {
    association: Arc<Association<Q>>,
}

impl<Q> EntityRef<Q> {
    pub fn new(
        name: &str,
        parent: &PathMetadata,
        target: &EntityTarget<Q>,
        inits: &PathInits,
    ) -> Self {
        Self::from_association(Association::resolve(name, parent.property(name), target, inits))
    }

    pub fn from_association(association: Association<Q>) -> Self {
        Self {
            association: Arc::new(association),
        }
    }

    /// The target entity path, building it if it was deferred.
    #[inline]
    pub fn get(&self) -> &Q {
        self.association.get()
    }

    #[inline]
    pub fn association(&self) -> &Arc<Association<Q>> {
        &self.association
    }

    #[inline]
    pub fn state(&self) -> AssociationState {
        self.association.state()
    }

    pub fn is_null(&self) -> Predicate {
        ops::unary(self, Operator::IsNull)
    }

    pub fn is_not_null(&self) -> Predicate {
        ops::unary(self, Operator::IsNotNull)
    }

    /// `self = other` for two entity positions, e.g. `loan.user` against a root alias.
    pub fn eq_entity(&self, other: &impl Path) -> Predicate {
        ops::compare_paths(self, Operator::Eq, other)
    }
}

impl<Q> Path for EntityRef<Q> {
    #[inline]
    fn metadata(&self) -> &PathMetadata {
        self.association.metadata()
    }

    #[inline]
    fn type_tag(&self) -> &TypeTag {
        self.association.type_tag()
    }
}

impl<Q> Deref for EntityRef<Q> {
    type Target = Q;

    fn deref(&self) -> &Q {
        self.get()
    }
}

impl<Q> Clone for EntityRef<Q> {
    fn clone(&self) -> Self {
        Self {
            association: Arc::clone(&self.association),
        }
    }
}

impl<Q> PartialEq for EntityRef<Q> {
    fn eq(&self, other: &Self) -> bool {
        self.metadata() == other.metadata()
    }
}

impl<Q> Eq for EntityRef<Q> {}

impl<Q> Hash for EntityRef<Q> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.metadata().hash(state);
    }
}

impl<Q> fmt::Debug for EntityRef<Q> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EntityRef").field(&self.association).finish()
    }
}

/// Shared state of list and set paths.
pub struct CollectionPathBase<Q> {
    node: PathNode,
    element: Arc<Association<Q>>,
    target: EntityTarget<Q>,
    inits: PathInits,
}

impl<Q> CollectionPathBase<Q> {
    /// Collection attribute `name` of `parent`; the "any element" slot is resolved against
    /// `inits` along the edge `name`.
    pub fn new(
        name: &str,
        parent: &PathMetadata,
        type_tag: TypeTag,
        target: &EntityTarget<Q>,
        inits: &PathInits,
    ) -> Self {
        let node = PathNode::property(parent, name, type_tag);
        let element = Association::resolve(name, node.metadata().collection_any(), target, inits);
        Self {
            node,
            element: Arc::new(element),
            target: target.clone(),
            inits: inits.clone(),
        }
    }

    /// Path to any element of the collection, for exists-style predicates.
    #[inline]
    pub fn any(&self) -> &Q {
        self.element.get()
    }

    #[inline]
    pub fn element(&self) -> &Arc<Association<Q>> {
        &self.element
    }

    pub fn target_entity(&self) -> &str {
        self.target.entity()
    }

    pub fn size(&self) -> Expr {
        ops::function(self, Operator::CollectionSize)
    }

    pub fn is_empty(&self) -> Predicate {
        ops::unary(self, Operator::CollectionIsEmpty)
    }

    pub fn is_not_empty(&self) -> Predicate {
        self.is_empty().not()
    }

    /// The collection contains the entity at `element`.
    pub fn contains(&self, element: &impl Path) -> Predicate {
        ops::compare_paths(self, Operator::CollectionContains, element)
    }

    fn element_at(&self, metadata: PathMetadata) -> EntityRef<Q> {
        let edge = self.node.metadata().name().unwrap_or_default();
        EntityRef::from_association(Association::resolve(edge, metadata, &self.target, &self.inits))
    }
}

impl<Q> Path for CollectionPathBase<Q> {
    #[inline]
    fn metadata(&self) -> &PathMetadata {
        self.node.metadata()
    }

    #[inline]
    fn type_tag(&self) -> &TypeTag {
        self.node.type_tag()
    }
}

impl<Q> Clone for CollectionPathBase<Q> {
    fn clone(&self) -> Self {
        Self {
            node: self.node.clone(),
            element: Arc::clone(&self.element),
            target: self.target.clone(),
            inits: self.inits.clone(),
        }
    }
}

impl<Q> PartialEq for CollectionPathBase<Q> {
    fn eq(&self, other: &Self) -> bool {
        self.node == other.node
    }
}

impl<Q> Eq for CollectionPathBase<Q> {}

impl<Q> Hash for CollectionPathBase<Q> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.node.hash(state);
    }
}

impl<Q> fmt::Debug for CollectionPathBase<Q> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionPath")
            .field("node", &self.node)
            .field("element", &self.element.state())
            .finish()
    }
}

macro_rules! collection_wrapper {
    ($(#[$meta:meta])* $name:ident, $tag:expr) => {
        $(#[$meta])*
        pub struct $name<Q>(CollectionPathBase<Q>);

        impl<Q> $name<Q> {
            pub fn new(
                name: &str,
                parent: &PathMetadata,
                target: &EntityTarget<Q>,
                inits: &PathInits,
            ) -> Self {
                let type_tag = ($tag)(TypeTag::entity(target.entity()));
                Self(CollectionPathBase::new(name, parent, type_tag, target, inits))
            }
        }

        impl<Q> Deref for $name<Q> {
            type Target = CollectionPathBase<Q>;

            fn deref(&self) -> &CollectionPathBase<Q> {
                &self.0
            }
        }

        impl<Q> Path for $name<Q> {
            #[inline]
            fn metadata(&self) -> &PathMetadata {
                self.0.metadata()
            }

            #[inline]
            fn type_tag(&self) -> &TypeTag {
                self.0.type_tag()
            }
        }

        impl<Q> Clone for $name<Q> {
            fn clone(&self) -> Self {
                Self(self.0.clone())
            }
        }

        impl<Q> PartialEq for $name<Q> {
            fn eq(&self, other: &Self) -> bool {
                self.0 == other.0
            }
        }

        impl<Q> Eq for $name<Q> {}

        impl<Q> Hash for $name<Q> {
            fn hash<H: Hasher>(&self, state: &mut H) {
                self.0.hash(state);
            }
        }

        impl<Q> fmt::Debug for $name<Q> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_tuple(stringify!($name)).field(&self.0).finish()
            }
        }
    };
}

collection_wrapper!(
    /// Ordered to-many association.
    ListPath,
    TypeTag::list_of
);

collection_wrapper!(
    /// Unordered to-many association.
    SetPath,
    TypeTag::set_of
);

impl<Q> ListPath<Q> {
    /// Element at a fixed position; expansion follows the same policy as
    /// [`CollectionPathBase::any`].
    pub fn get(&self, index: usize) -> EntityRef<Q> {
        self.0.element_at(self.metadata().list_value(index))
    }
}

/// Map from scalar keys to entities.
pub struct MapPath<K, Q> {
    key_type: TypeTag,
    value: CollectionPathBase<Q>,
    _key: PhantomData<fn() -> K>,
}

impl<K: ValueType, Q> MapPath<K, Q> {
    pub fn new(
        name: &str,
        parent: &PathMetadata,
        target: &EntityTarget<Q>,
        inits: &PathInits,
    ) -> Self {
        Self::with_key_type(name, parent, K::type_tag(), target, inits)
    }
}

impl<K: IntoConstant, Q> MapPath<K, Q> {
    pub fn with_key_type(
        name: &str,
        parent: &PathMetadata,
        key_type: TypeTag,
        target: &EntityTarget<Q>,
        inits: &PathInits,
    ) -> Self {
        let type_tag = TypeTag::map_of(key_type.clone(), TypeTag::entity(target.entity()));
        let value = CollectionPathBase::new(name, parent, type_tag, target, inits);
        Self {
            key_type,
            value,
            _key: PhantomData,
        }
    }

    /// Path to any value of the map.
    #[inline]
    pub fn any(&self) -> &Q {
        self.value.any()
    }

    /// Value stored under the key found at `key`.
    pub fn get(&self, key: &impl Path) -> EntityRef<Q> {
        self.value.element_at(self.value.metadata().map_value(key.metadata()))
    }

    pub fn values(&self) -> &CollectionPathBase<Q> {
        &self.value
    }

    #[inline]
    pub fn key_type(&self) -> &TypeTag {
        &self.key_type
    }

    pub fn contains_key(&self, key: impl Into<K>) -> Predicate {
        ops::compare(self, Operator::ContainsKey, Into::<K>::into(key).into_constant())
    }

    pub fn contains_value(&self, value: &impl Path) -> Predicate {
        ops::compare_paths(self, Operator::ContainsValue, value)
    }

    pub fn size(&self) -> Expr {
        ops::function(self, Operator::CollectionSize)
    }

    pub fn is_empty(&self) -> Predicate {
        ops::unary(self, Operator::CollectionIsEmpty)
    }

    pub fn is_not_empty(&self) -> Predicate {
        self.is_empty().not()
    }
}

impl<K, Q> Path for MapPath<K, Q> {
    #[inline]
    fn metadata(&self) -> &PathMetadata {
        self.value.metadata()
    }

    #[inline]
    fn type_tag(&self) -> &TypeTag {
        self.value.type_tag()
    }
}

impl<K, Q> Clone for MapPath<K, Q> {
    fn clone(&self) -> Self {
        Self {
            key_type: self.key_type.clone(),
            value: self.value.clone(),
            _key: PhantomData,
        }
    }
}

impl<K, Q> PartialEq for MapPath<K, Q> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<K, Q> Eq for MapPath<K, Q> {}

impl<K, Q> Hash for MapPath<K, Q> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl<K, Q> fmt::Debug for MapPath<K, Q> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("MapPath").field(&self.value.node).finish()
    }
}
