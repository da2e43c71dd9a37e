//! Paths: typed handles on one location in an entity's attribute graph.
//!
//! Every path knows its [`PathMetadata`] and declared [`TypeTag`]. Identity is the metadata
//! alone: two paths at the same position are interchangeable in predicates whatever their Rust
//! wrapper type.

#[macro_use]
pub(crate) mod ops;

pub mod collection;
pub mod scalar;
pub mod string;

use std::fmt;
use std::hash::{Hash, Hasher};

use crate::expr::Expr;
use crate::metadata::{PathKey, PathMetadata};
use crate::types::TypeTag;

pub use collection::{CollectionPathBase, EntityRef, ListPath, MapPath, SetPath};
pub use scalar::{BooleanPath, EnumPath, NumberPath, SimplePath, TemporalPath};
pub use string::StringPath;

/// Capability shared by every path node.
pub trait Path {
    fn metadata(&self) -> &PathMetadata;

    fn type_tag(&self) -> &TypeTag;

    /// Structural identity key; equal metadata gives equal keys.
    fn identity_key(&self) -> PathKey {
        self.metadata().key()
    }

    fn to_expr(&self) -> Expr {
        Expr::path(self.metadata().clone(), self.type_tag().clone())
    }
}

impl<P: Path + ?Sized> Path for &P {
    fn metadata(&self) -> &PathMetadata {
        (**self).metadata()
    }

    fn type_tag(&self) -> &TypeTag {
        (**self).type_tag()
    }
}

/// Untyped path: metadata plus declared type tag.
#[derive(Clone)]
pub struct PathNode {
    metadata: PathMetadata,
    type_tag: TypeTag,
}

impl PathNode {
    pub fn new(metadata: PathMetadata, type_tag: TypeTag) -> Self {
        Self { metadata, type_tag }
    }

    /// Node for attribute `name` of `parent`.
    pub fn property(parent: &PathMetadata, name: &str, type_tag: TypeTag) -> Self {
        Self::new(parent.property(name), type_tag)
    }

    /// Untyped copy of any path.
    pub fn of(path: &(impl Path + ?Sized)) -> Self {
        Self::new(path.metadata().clone(), path.type_tag().clone())
    }
}

impl Path for PathNode {
    #[inline]
    fn metadata(&self) -> &PathMetadata {
        &self.metadata
    }

    #[inline]
    fn type_tag(&self) -> &TypeTag {
        &self.type_tag
    }
}

impl PartialEq for PathNode {
    fn eq(&self, other: &Self) -> bool {
        self.metadata == other.metadata
    }
}

impl Eq for PathNode {}

impl Hash for PathNode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.metadata.hash(state);
    }
}

impl fmt::Debug for PathNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} : {}", self.metadata, self.type_tag)
    }
}

impl fmt::Display for PathNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.metadata, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_ignores_type_tag() {
        let parent = PathMetadata::root("user");
        let a = PathNode::property(&parent, "age", TypeTag::Int32);
        let b = PathNode::property(&parent, "age", TypeTag::Int64);
        assert_eq!(a, b);
        assert_eq!(a.identity_key(), b.identity_key());
        assert_eq!(format!("{a:?}"), "user.age : i32");
    }

    #[test]
    fn references_are_paths() {
        let node = PathNode::property(&PathMetadata::root("user"), "name", TypeTag::String);
        let copy = PathNode::of(&&node);
        assert_eq!(copy, node);
        assert_eq!(copy.to_expr(), node.to_expr());
    }
}
