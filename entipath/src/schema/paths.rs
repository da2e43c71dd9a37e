use std::fmt;
use std::hash::{Hash, Hasher};
use std::iter::Peekable;
use std::ops::Deref;
use std::str::Split;
use std::sync::Arc;

use log::warn;

use crate::association::EntityTarget;
use crate::entity::{EntityPath, EntityPathBase};
use crate::errors::SchemaError;
use crate::inits::PathInits;
use crate::metadata::PathMetadata;
use crate::path::{
    BooleanPath, EntityRef, ListPath, MapPath, NumberPath, Path, PathNode, SetPath, SimplePath,
    StringPath,
};
use crate::registry::PathRegistry;
use crate::schema::{AttributeKind, Schema};
use crate::types::{Constant, NumberType, TypeTag};

/// Segment selecting the "any element" step of a collection in [`SchemaEntityPath::resolve`].
pub const ANY_SEGMENT: &str = "any";

/// Association child of a schema-driven entity path.
#[derive(Debug, Clone)]
pub enum SchemaAssociation {
    Reference(EntityRef<SchemaEntityPath>),
    List(ListPath<SchemaEntityPath>),
    Set(SetPath<SchemaEntityPath>),
    Map(MapPath<Constant, SchemaEntityPath>),
}

impl SchemaAssociation {
    /// The associated entity path: the referenced entity, or any element of a collection.
    pub fn entity(&self) -> &SchemaEntityPath {
        match self {
            SchemaAssociation::Reference(path) => path.get(),
            SchemaAssociation::List(path) => path.any(),
            SchemaAssociation::Set(path) => path.any(),
            SchemaAssociation::Map(path) => path.any(),
        }
    }

    fn label(&self) -> &'static str {
        match self {
            SchemaAssociation::Reference(_) => "a reference",
            SchemaAssociation::List(_) => "a list",
            SchemaAssociation::Set(_) => "a set",
            SchemaAssociation::Map(_) => "a map",
        }
    }
}

/// Entity path built at runtime from an [`EntitySchema`](crate::schema::EntitySchema).
///
/// Scalars are exposed through typed accessors that check the declared type; associations
/// follow the same [`PathInits`] policy as typed entity paths.
#[derive(Clone)]
pub struct SchemaEntityPath {
    base: EntityPathBase,
    associations: Vec<(String, SchemaAssociation)>,
}

impl SchemaEntityPath {
    /// Builds the path of `entity` at `metadata`.
    pub fn new(
        schema: &Arc<Schema>,
        entity: &str,
        metadata: PathMetadata,
        inits: PathInits,
    ) -> Result<Self, SchemaError> {
        schema.require(entity)?;
        Ok(Self::build(schema, entity, metadata, inits))
    }

    fn build(schema: &Arc<Schema>, entity: &str, metadata: PathMetadata, inits: PathInits) -> Self {
        let mut base = EntityPathBase::new(entity, metadata, inits);
        let mut associations = Vec::new();
        let Some(declaration) = schema.get(entity) else {
            warn!("entity '{entity}' is not declared, building it without attributes");
            return Self { base, associations };
        };

        for attribute in &declaration.attributes {
            let name = attribute.name.as_str();
            let association = match &attribute.kind {
                AttributeKind::Scalar(scalar) => {
                    base.create_scalar(name, scalar.type_tag());
                    continue;
                }
                AttributeKind::Reference(target) => {
                    let target = Self::target(schema, target);
                    SchemaAssociation::Reference(base.create_entity_with(name, &target))
                }
                AttributeKind::List(target) => {
                    let target = Self::target(schema, target);
                    SchemaAssociation::List(base.create_list_with(name, &target))
                }
                AttributeKind::Set(target) => {
                    let target = Self::target(schema, target);
                    SchemaAssociation::Set(base.create_set_with(name, &target))
                }
                AttributeKind::Map { key, target } => {
                    let target = Self::target(schema, target);
                    SchemaAssociation::Map(base.create_map_with(name, key.type_tag(), &target))
                }
            };
            match associations.iter_mut().find(|(existing, _)| existing == name) {
                Some((_, existing)) => *existing = association,
                None => associations.push((attribute.name.clone(), association)),
            }
        }
        Self { base, associations }
    }

    fn target(schema: &Arc<Schema>, entity: &str) -> EntityTarget<SchemaEntityPath> {
        let schema = Arc::clone(schema);
        let name = entity.to_string();
        EntityTarget::new(entity, move |metadata, inits| {
            Self::build(&schema, &name, metadata, inits)
        })
    }

    /// Any scalar attribute, typed by its declared tag.
    pub fn scalar(&self, name: &str) -> Result<SimplePath<Constant>, SchemaError> {
        let node = self.scalar_node(name, "a scalar", |_| true)?;
        Ok(SimplePath::from_node(node))
    }

    pub fn string(&self, name: &str) -> Result<StringPath, SchemaError> {
        let node = self.scalar_node(name, "a string", |tag| *tag == TypeTag::String)?;
        Ok(StringPath::from_node(node))
    }

    pub fn boolean(&self, name: &str) -> Result<BooleanPath, SchemaError> {
        let node = self.scalar_node(name, "a boolean", |tag| *tag == TypeTag::Boolean)?;
        Ok(BooleanPath::from_node(node))
    }

    /// Numeric attribute whose declared type matches `T` exactly.
    pub fn number<T: NumberType>(&self, name: &str) -> Result<NumberPath<T>, SchemaError> {
        let expected = T::type_tag();
        let node = self.scalar_node(name, &format!("a {expected} number"), |tag| *tag == expected)?;
        Ok(NumberPath::from_node(node))
    }

    pub fn reference(&self, name: &str) -> Result<&EntityRef<SchemaEntityPath>, SchemaError> {
        match self.association_entry(name)? {
            SchemaAssociation::Reference(path) => Ok(path),
            other => Err(self.mismatch(name, "a reference", other.label())),
        }
    }

    pub fn list(&self, name: &str) -> Result<&ListPath<SchemaEntityPath>, SchemaError> {
        match self.association_entry(name)? {
            SchemaAssociation::List(path) => Ok(path),
            other => Err(self.mismatch(name, "a list", other.label())),
        }
    }

    pub fn set(&self, name: &str) -> Result<&SetPath<SchemaEntityPath>, SchemaError> {
        match self.association_entry(name)? {
            SchemaAssociation::Set(path) => Ok(path),
            other => Err(self.mismatch(name, "a set", other.label())),
        }
    }

    pub fn map(&self, name: &str) -> Result<&MapPath<Constant, SchemaEntityPath>, SchemaError> {
        match self.association_entry(name)? {
            SchemaAssociation::Map(path) => Ok(path),
            other => Err(self.mismatch(name, "a map", other.label())),
        }
    }

    /// Entity reached through association `name`; collections give their "any element" path.
    pub fn association(&self, name: &str) -> Result<&SchemaEntityPath, SchemaError> {
        self.association_entry(name).map(SchemaAssociation::entity)
    }

    /// Association children in declaration order.
    pub fn associations(&self) -> impl Iterator<Item = (&str, &SchemaAssociation)> {
        self.associations.iter().map(|(name, association)| (name.as_str(), association))
    }

    /// Resolves a dotted path such as `"user_loan_histories.any.user.name"`.
    ///
    /// References are followed directly. A collection segment is followed by `any` (any
    /// element) or, for lists, by an index. Deferred associations are built on the way.
    pub fn resolve(&self, path: &str) -> Result<PathNode, SchemaError> {
        let mut segments = path.split('.').peekable();
        self.resolve_segments(path, &mut segments)
    }

    fn resolve_segments(
        &self,
        full: &str,
        segments: &mut Peekable<Split<'_, char>>,
    ) -> Result<PathNode, SchemaError> {
        let Some(segment) = segments.next() else {
            return Ok(PathNode::of(self));
        };
        if segment.is_empty() {
            return Err(invalid(full, "empty segment"));
        }

        if let Some(attribute) = self.base.attribute(segment)
            && !attribute.category().is_association()
        {
            return match segments.peek() {
                None => Ok(attribute.node().clone()),
                Some(next) => Err(invalid(
                    full,
                    &format!("'{segment}' is a scalar and has no attribute '{next}'"),
                )),
            };
        }

        let association = self.association_entry(segment)?;
        let collection: &dyn Path = match association {
            SchemaAssociation::Reference(reference) => {
                return reference.get().resolve_segments(full, segments);
            }
            SchemaAssociation::List(list) => list,
            SchemaAssociation::Set(set) => set,
            SchemaAssociation::Map(map) => map,
        };

        let Some(step) = segments.next() else {
            return Ok(PathNode::of(collection));
        };
        if step == ANY_SEGMENT {
            return association.entity().resolve_segments(full, segments);
        }
        match (association, step.parse::<usize>()) {
            (SchemaAssociation::List(list), Ok(index)) => {
                list.get(index).get().resolve_segments(full, segments)
            }
            _ => Err(invalid(
                full,
                &format!("expected '{ANY_SEGMENT}' after collection '{segment}', found '{step}'"),
            )),
        }
    }

    fn scalar_node(
        &self,
        name: &str,
        expected: &str,
        accept: impl Fn(&TypeTag) -> bool,
    ) -> Result<PathNode, SchemaError> {
        let attribute = self.base.attribute(name).ok_or_else(|| self.unknown(name))?;
        if attribute.category().is_association() {
            return Err(self.mismatch(name, expected, attribute.category().as_str()));
        }
        if !accept(attribute.type_tag()) {
            return Err(self.mismatch(name, expected, &attribute.type_tag().to_string()));
        }
        Ok(attribute.node().clone())
    }

    fn association_entry(&self, name: &str) -> Result<&SchemaAssociation, SchemaError> {
        match self.associations.iter().find(|(existing, _)| existing == name) {
            Some((_, association)) => Ok(association),
            None if self.base.attribute(name).is_some() => {
                Err(self.mismatch(name, "an association", "a scalar"))
            }
            None => Err(self.unknown(name)),
        }
    }

    fn unknown(&self, name: &str) -> SchemaError {
        SchemaError::UnknownAttribute {
            entity: self.base.entity_type().to_string(),
            attribute: name.to_string(),
        }
    }

    fn mismatch(&self, name: &str, expected: &str, actual: &str) -> SchemaError {
        SchemaError::KindMismatch {
            entity: self.base.entity_type().to_string(),
            attribute: name.to_string(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }
}

fn invalid(path: &str, reason: &str) -> SchemaError {
    SchemaError::InvalidPath {
        path: path.to_string(),
        reason: reason.to_string(),
    }
}

impl Path for SchemaEntityPath {
    #[inline]
    fn metadata(&self) -> &PathMetadata {
        self.base.metadata()
    }

    #[inline]
    fn type_tag(&self) -> &TypeTag {
        self.base.type_tag()
    }
}

impl EntityPath for SchemaEntityPath {
    #[inline]
    fn base(&self) -> &EntityPathBase {
        &self.base
    }
}

impl Deref for SchemaEntityPath {
    type Target = EntityPathBase;

    fn deref(&self) -> &EntityPathBase {
        &self.base
    }
}

impl PartialEq for SchemaEntityPath {
    fn eq(&self, other: &Self) -> bool {
        self.base == other.base
    }
}

impl Eq for SchemaEntityPath {}

impl Hash for SchemaEntityPath {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.base.hash(state);
    }
}

impl fmt::Debug for SchemaEntityPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.base, f)
    }
}

/// Validated schema plus the policy and cache used to build its entity paths.
#[derive(Debug)]
pub struct SchemaPaths {
    schema: Arc<Schema>,
    inits: PathInits,
    registry: PathRegistry,
}

impl SchemaPaths {
    pub fn new(schema: Schema, inits: PathInits) -> Result<Self, SchemaError> {
        schema.validate()?;
        Ok(Self {
            schema: Arc::new(schema),
            inits,
            registry: PathRegistry::new(),
        })
    }

    #[inline]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    #[inline]
    pub fn inits(&self) -> &PathInits {
        &self.inits
    }

    #[inline]
    pub fn registry(&self) -> &PathRegistry {
        &self.registry
    }

    /// Cached root path of `entity` for `variable`.
    pub fn root(&self, entity: &str, variable: &str) -> Result<Arc<SchemaEntityPath>, SchemaError> {
        self.schema.require(entity)?;
        let metadata = PathMetadata::root(variable);
        Ok(self.registry.get_or_insert_with(entity, &metadata, || {
            SchemaEntityPath::build(&self.schema, entity, metadata.clone(), self.inits.clone())
        }))
    }

    /// Cached root path of `entity` under its canonical variable.
    pub fn canonical(&self, entity: &str) -> Result<Arc<SchemaEntityPath>, SchemaError> {
        let variable = self.schema.require(entity)?.variable_name();
        self.root(entity, &variable)
    }

    /// Fresh, uncached path of `entity` at `metadata`.
    pub fn construct(
        &self,
        entity: &str,
        metadata: PathMetadata,
    ) -> Result<SchemaEntityPath, SchemaError> {
        SchemaEntityPath::new(&self.schema, entity, metadata, self.inits.clone())
    }
}
