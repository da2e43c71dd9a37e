//! Entity paths: one composite node per entity type and metadata position.
//!
//! [`EntityPathBase`] owns the ordered attribute map of an entity path. Typed entity paths such as
//! [`QUser`](crate::examples::library::QUser) hold one named field per attribute and delegate
//! everything else to their base; [`SchemaEntityPath`](crate::schema::SchemaEntityPath) builds the
//! same structure from a runtime [`EntitySchema`].

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use log::warn;

use crate::association::{AssociationNode, EntityTarget};
use crate::expr::{Expr, Operator, Predicate};
use crate::inits::PathInits;
use crate::metadata::PathMetadata;
use crate::path::{
    ops, BooleanPath, EntityRef, EnumPath, ListPath, MapPath, NumberPath, Path, PathNode, SetPath,
    SimplePath, StringPath, TemporalPath,
};
use crate::schema::{AttributeKind, AttributeSchema, EntitySchema, ScalarType};
use crate::types::{Constant, IntoConstant, NumberType, PathEnum, TemporalType, TypeTag, ValueType};

/// A path whose value is an entity.
pub trait EntityPath: Path + Send + Sync + 'static {
    fn base(&self) -> &EntityPathBase;

    fn entity_type(&self) -> &str {
        self.base().entity_type()
    }
}

/// Entity paths with a static entity name and constructor, as implemented by typed wiring.
pub trait EntityPathType: EntityPath + Sized {
    /// Entity type name, e.g. `"User"`.
    const ENTITY: &'static str;

    /// Variable used by [`EntityPathType::canonical`], e.g. `"user"`.
    const VARIABLE: &'static str;

    /// Builds the path at `metadata`, expanding associations according to `inits`.
    fn with_inits(metadata: PathMetadata, inits: PathInits) -> Self;

    fn from_metadata(metadata: PathMetadata) -> Self {
        Self::with_inits(metadata, PathInits::default())
    }

    /// Root path for a query variable. Distinct variables give distinct paths (self-joins).
    fn root(variable: &str) -> Self {
        Self::from_metadata(PathMetadata::root(variable))
    }

    fn canonical() -> Self {
        Self::root(Self::VARIABLE)
    }

    /// Entity path at the position of another path, e.g. a subtype view of `loan.user`.
    fn from_path(path: &impl Path) -> Self {
        Self::from_metadata(path.metadata().clone())
    }

    fn target() -> EntityTarget<Self> {
        EntityTarget::of()
    }
}

/// Kind of child an attribute holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeCategory {
    Scalar,
    Reference,
    List,
    Set,
    Map,
}

impl AttributeCategory {
    pub const fn as_str(self) -> &'static str {
        match self {
            AttributeCategory::Scalar => "scalar",
            AttributeCategory::Reference => "reference",
            AttributeCategory::List => "list",
            AttributeCategory::Set => "set",
            AttributeCategory::Map => "map",
        }
    }

    pub const fn is_association(self) -> bool {
        !matches!(self, AttributeCategory::Scalar)
    }
}

/// One entry of an entity path's attribute map.
#[derive(Clone)]
pub struct Attribute {
    name: Arc<str>,
    node: PathNode,
    category: AttributeCategory,
    association: Option<Arc<dyn AssociationNode>>,
}

impl Attribute {
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn node(&self) -> &PathNode {
        &self.node
    }

    #[inline]
    pub fn category(&self) -> AttributeCategory {
        self.category
    }

    /// Association slot for reference attributes, element slot for collections.
    pub fn association(&self) -> Option<&dyn AssociationNode> {
        self.association.as_deref()
    }

    pub fn type_tag(&self) -> &TypeTag {
        self.node.type_tag()
    }
}

impl fmt::Debug for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("Attribute");
        debug
            .field("name", &self.name)
            .field("node", &self.node)
            .field("category", &self.category);
        if let Some(association) = &self.association {
            debug.field("state", &association.state());
        }
        debug.finish()
    }
}

/// Composite path for one entity type at one metadata position.
#[derive(Clone)]
pub struct EntityPathBase {
    entity: Arc<str>,
    node: PathNode,
    inits: PathInits,
    attributes: Vec<Attribute>,
}

impl EntityPathBase {
    pub fn new(entity_type: impl Into<Arc<str>>, metadata: PathMetadata, inits: PathInits) -> Self {
        let entity: Arc<str> = entity_type.into();
        let inits = inits.entering(&entity);
        Self {
            node: PathNode::new(metadata, TypeTag::entity(&*entity)),
            entity,
            inits,
            attributes: Vec::new(),
        }
    }

    #[inline]
    pub fn entity_type(&self) -> &str {
        &self.entity
    }

    /// Policy applied to this entity's associations.
    #[inline]
    pub fn inits(&self) -> &PathInits {
        &self.inits
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|attribute| attribute.name() == name)
    }

    /// Attributes in declaration order.
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn count(&self) -> Expr {
        ops::function(self, Operator::Count)
    }

    pub fn count_distinct(&self) -> Expr {
        ops::function(self, Operator::CountDistinct)
    }

    pub fn is_null(&self) -> Predicate {
        ops::unary(self, Operator::IsNull)
    }

    pub fn is_not_null(&self) -> Predicate {
        ops::unary(self, Operator::IsNotNull)
    }

    pub fn create_boolean(&mut self, name: &str) -> BooleanPath {
        let path = BooleanPath::new(name, self.metadata());
        self.record_scalar(name, &path);
        path
    }

    pub fn create_number<T: NumberType>(&mut self, name: &str) -> NumberPath<T> {
        let path = NumberPath::new(name, self.metadata());
        self.record_scalar(name, &path);
        path
    }

    pub fn create_string(&mut self, name: &str) -> StringPath {
        let path = StringPath::new(name, self.metadata());
        self.record_scalar(name, &path);
        path
    }

    pub fn create_enum<E: PathEnum>(&mut self, name: &str) -> EnumPath<E> {
        let path = EnumPath::new(name, self.metadata());
        self.record_scalar(name, &path);
        path
    }

    pub fn create_temporal<T: TemporalType>(&mut self, name: &str) -> TemporalPath<T> {
        let path = TemporalPath::new(name, self.metadata());
        self.record_scalar(name, &path);
        path
    }

    pub fn create_simple<T: ValueType>(&mut self, name: &str) -> SimplePath<T> {
        let path = SimplePath::new(name, self.metadata());
        self.record_scalar(name, &path);
        path
    }

    /// Scalar with a type declared at runtime.
    pub fn create_scalar(&mut self, name: &str, type_tag: TypeTag) -> SimplePath<Constant> {
        let path = SimplePath::with_type(name, self.metadata(), type_tag);
        self.record_scalar(name, &path);
        path
    }

    pub fn create_entity<Q: EntityPathType>(&mut self, name: &str) -> EntityRef<Q> {
        self.create_entity_with(name, &Q::target())
    }

    pub fn create_entity_with<Q: EntityPath>(
        &mut self,
        name: &str,
        target: &EntityTarget<Q>,
    ) -> EntityRef<Q> {
        let path = EntityRef::new(name, self.metadata(), target, &self.inits);
        let association: Arc<dyn AssociationNode> = path.association().clone();
        self.record(name, PathNode::of(&path), AttributeCategory::Reference, Some(association));
        path
    }

    pub fn create_list<Q: EntityPathType>(&mut self, name: &str) -> ListPath<Q> {
        self.create_list_with(name, &Q::target())
    }

    pub fn create_list_with<Q: EntityPath>(
        &mut self,
        name: &str,
        target: &EntityTarget<Q>,
    ) -> ListPath<Q> {
        let path = ListPath::new(name, self.metadata(), target, &self.inits);
        let element: Arc<dyn AssociationNode> = path.element().clone();
        self.record(name, PathNode::of(&path), AttributeCategory::List, Some(element));
        path
    }

    pub fn create_set<Q: EntityPathType>(&mut self, name: &str) -> SetPath<Q> {
        self.create_set_with(name, &Q::target())
    }

    pub fn create_set_with<Q: EntityPath>(
        &mut self,
        name: &str,
        target: &EntityTarget<Q>,
    ) -> SetPath<Q> {
        let path = SetPath::new(name, self.metadata(), target, &self.inits);
        let element: Arc<dyn AssociationNode> = path.element().clone();
        self.record(name, PathNode::of(&path), AttributeCategory::Set, Some(element));
        path
    }

    pub fn create_map<K: ValueType, Q: EntityPathType>(&mut self, name: &str) -> MapPath<K, Q> {
        self.create_map_with(name, K::type_tag(), &Q::target())
    }

    pub fn create_map_with<K: IntoConstant, Q: EntityPath>(
        &mut self,
        name: &str,
        key_type: TypeTag,
        target: &EntityTarget<Q>,
    ) -> MapPath<K, Q> {
        let path = MapPath::with_key_type(name, self.metadata(), key_type, target, &self.inits);
        let element: Arc<dyn AssociationNode> = path.values().element().clone();
        self.record(name, PathNode::of(&path), AttributeCategory::Map, Some(element));
        path
    }

    /// Declarative description of this entity's attributes.
    pub fn describe(&self) -> EntitySchema {
        let attributes = self
            .attributes
            .iter()
            .map(|attribute| {
                let target = || {
                    attribute
                        .association()
                        .map(|association| association.target_entity().to_string())
                        .unwrap_or_default()
                };
                let kind = match (attribute.category(), attribute.type_tag()) {
                    (AttributeCategory::Scalar, tag) => {
                        AttributeKind::Scalar(ScalarType::from_type_tag(tag))
                    }
                    (AttributeCategory::Reference, _) => AttributeKind::Reference(target()),
                    (AttributeCategory::List, _) => AttributeKind::List(target()),
                    (AttributeCategory::Set, _) => AttributeKind::Set(target()),
                    (AttributeCategory::Map, TypeTag::Map(key, _)) => AttributeKind::Map {
                        key: ScalarType::from_type_tag(key),
                        target: target(),
                    },
                    (AttributeCategory::Map, _) => AttributeKind::Map {
                        key: ScalarType::Any,
                        target: target(),
                    },
                };
                AttributeSchema::new(attribute.name(), kind)
            })
            .collect();
        EntitySchema {
            name: self.entity.to_string(),
            variable: self.metadata().is_root().then(|| self.metadata().variable().to_string()),
            attributes,
        }
    }

    fn record_scalar(&mut self, name: &str, path: &impl Path) {
        self.record(name, PathNode::of(path), AttributeCategory::Scalar, None);
    }

    fn record(
        &mut self,
        name: &str,
        node: PathNode,
        category: AttributeCategory,
        association: Option<Arc<dyn AssociationNode>>,
    ) {
        let attribute = Attribute {
            name: Arc::from(name),
            node,
            category,
            association,
        };
        match self.attributes.iter_mut().find(|existing| existing.name() == name) {
            Some(existing) => {
                warn!("{}: attribute '{name}' declared twice, keeping the later one", self.entity);
                *existing = attribute;
            }
            None => self.attributes.push(attribute),
        }
    }
}

impl Path for EntityPathBase {
    #[inline]
    fn metadata(&self) -> &PathMetadata {
        self.node.metadata()
    }

    #[inline]
    fn type_tag(&self) -> &TypeTag {
        self.node.type_tag()
    }
}

impl EntityPath for EntityPathBase {
    #[inline]
    fn base(&self) -> &EntityPathBase {
        self
    }
}

impl PartialEq for EntityPathBase {
    fn eq(&self, other: &Self) -> bool {
        self.entity == other.entity && self.node == other.node
    }
}

impl Eq for EntityPathBase {}

impl Hash for EntityPathBase {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.entity.hash(state);
        self.node.hash(state);
    }
}

impl fmt::Debug for EntityPathBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityPathBase")
            .field("entity", &self.entity)
            .field("path", &format_args!("{}", self.metadata()))
            .field("attributes", &self.attributes.iter().map(Attribute::name).collect::<Vec<_>>())
            .finish()
    }
}

impl fmt::Display for EntityPathBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.metadata(), f)
    }
}

/// Implements [`Path`], [`EntityPath`], `Deref<Target = EntityPathBase>`, equality, hashing and
/// `Debug` for a typed entity path struct with a `base: EntityPathBase` field.
#[macro_export]
macro_rules! impl_entity_path {
    ($path:ty) => {
        impl $crate::path::Path for $path {
            #[inline]
            fn metadata(&self) -> &$crate::metadata::PathMetadata {
                $crate::path::Path::metadata(&self.base)
            }

            #[inline]
            fn type_tag(&self) -> &$crate::types::TypeTag {
                $crate::path::Path::type_tag(&self.base)
            }
        }

        impl $crate::entity::EntityPath for $path {
            #[inline]
            fn base(&self) -> &$crate::entity::EntityPathBase {
                &self.base
            }
        }

        impl std::ops::Deref for $path {
            type Target = $crate::entity::EntityPathBase;

            fn deref(&self) -> &Self::Target {
                &self.base
            }
        }

        impl PartialEq for $path {
            fn eq(&self, other: &Self) -> bool {
                self.base == other.base
            }
        }

        impl Eq for $path {}

        impl std::hash::Hash for $path {
            fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
                std::hash::Hash::hash(&self.base, state);
            }
        }

        impl std::fmt::Debug for $path {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                std::fmt::Debug::fmt(&self.base, f)
            }
        }
    };
}
