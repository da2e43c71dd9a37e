//! entipath core library.
//!
//! Typed, composable paths over entity schemas. An entity path mirrors one entity type at one
//! position (a query variable or a step below one) and exposes a typed path per attribute.
//! Paths build predicates, projections and orderings for a downstream evaluation engine.
//!
//! Schemas may be cyclic. [`PathInits`] decides per association edge whether the child path is
//! built together with its owner or deferred until first access, which keeps construction finite
//! while every position stays reachable.

pub mod association;
pub mod config;
pub mod entity;
pub mod errors;
pub mod examples;
pub mod expr;
pub mod inits;
pub mod metadata;
pub mod path;
pub mod registry;
pub mod schema;
pub mod tree;
pub mod types;

pub use association::{Association, AssociationNode, AssociationState, EntityTarget};
pub use config::PathsConfig;
pub use entity::{Attribute, AttributeCategory, EntityPath, EntityPathBase, EntityPathType};
pub use errors::*;
pub use expr::{Expr, NullHandling, Operator, OrderSpecifier, Predicate, SortOrder};
pub use inits::{DEFAULT_MAX_DEPTH, Expansion, InitsConfig, PathInits, UNBOUNDED};
pub use metadata::{PathElement, PathKey, PathKind, PathMetadata};
pub use registry::{PathRegistry, PathTypeRegistration, builtin_schema, registered_path_types};
pub use schema::{
    AttributeKind, AttributeSchema, EntitySchema, ScalarType, Schema, SchemaEntityPath, SchemaPaths,
};
pub use types::{Constant, PathEnum, TypeTag};

// Re-export inventory so typed entity paths outside this crate can register themselves
pub use inventory;

/// Everything needed to declare typed entity paths and build predicates with them.
pub mod prelude {
    pub use crate::association::{AssociationState, EntityTarget};
    pub use crate::entity::{EntityPath, EntityPathBase, EntityPathType};
    pub use crate::expr::{Expr, OrderSpecifier, Predicate};
    pub use crate::inits::{Expansion, PathInits};
    pub use crate::metadata::PathMetadata;
    pub use crate::path::{
        BooleanPath, EntityRef, EnumPath, ListPath, MapPath, NumberPath, Path, SetPath, SimplePath,
        StringPath, TemporalPath,
    };
    pub use crate::registry::PathRegistry;
    pub use crate::types::{Constant, PathEnum, TypeTag};
}
