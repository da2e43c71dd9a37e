//! Path metadata: the structural description of one step in a path.
//!
//! A [`PathMetadata`] is a cheap-to-clone handle on an immutable node that records its parent,
//! the element it selects (a property name, a list index, a map key or "any element") and the
//! step kind. The chain from any node up to its root mirrors one traversal through the schema,
//! so it is always finite even when the schema graph itself is cyclic.
//!
//! Equality and hashing are structural. Two chains built from equal arguments are equal no
//! matter which allocations back them, and each node carries a SHA-256 identity key derived
//! from its own step and its parent's key.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::{Serialize, Serializer};
use sha2::{Digest, Sha256};

/// Step kind of a [`PathMetadata`] node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PathKind {
    /// A query variable (alias). Has no parent.
    Root,
    /// A named attribute of the parent.
    Property,
    /// "Any element" of the collection at the parent, used for EXISTS-style predicates.
    CollectionAny,
    /// The value stored under a key of the map at the parent.
    MapValue,
    /// The element at a fixed index of the list at the parent.
    ListValue,
}

impl PathKind {
    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            PathKind::Root => "root",
            PathKind::Property => "property",
            PathKind::CollectionAny => "collection_any",
            PathKind::MapValue => "map_value",
            PathKind::ListValue => "list_value",
        }
    }

    const fn tag(self) -> u8 {
        match self {
            PathKind::Root => 0,
            PathKind::Property => 1,
            PathKind::CollectionAny => 2,
            PathKind::MapValue => 3,
            PathKind::ListValue => 4,
        }
    }
}

/// The element a step selects from its parent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PathElement {
    Name(String),
    Index(usize),
    Key(PathMetadata),
    Any,
}

/// Deterministic identity key of a metadata chain.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PathKey([u8; 32]);

impl PathKey {
    const EMPTY: PathKey = PathKey([0; 32]);

    #[inline]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        self.0.iter().map(|byte| format!("{byte:02x}")).collect()
    }
}

impl fmt::Display for PathKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for PathKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex = self.to_hex();
        write!(f, "PathKey({})", &hex[..16])
    }
}

impl Serialize for PathKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

/// Immutable, structurally compared description of a path position.
#[derive(Clone, Serialize)]
#[serde(transparent)]
pub struct PathMetadata {
    inner: Arc<MetadataNode>,
}

#[derive(Debug, Serialize)]
struct MetadataNode {
    kind: PathKind,
    element: PathElement,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent: Option<PathMetadata>,
    #[serde(skip)]
    depth: usize,
    #[serde(skip)]
    key: PathKey,
}

impl PathMetadata {
    fn new(parent: Option<PathMetadata>, element: PathElement, kind: PathKind) -> Self {
        let depth = parent.as_ref().map_or(0, |p| p.depth() + 1);
        let key = compute_key(parent.as_ref(), &element, kind);
        Self {
            inner: Arc::new(MetadataNode {
                kind,
                element,
                parent,
                depth,
                key,
            }),
        }
    }

    /// Root step for a query variable such as `"user"` or a self-join alias `"u2"`.
    pub fn root(variable: impl Into<String>) -> Self {
        Self::new(None, PathElement::Name(variable.into()), PathKind::Root)
    }

    /// Named attribute of `self`.
    pub fn property(&self, name: impl Into<String>) -> Self {
        Self::new(Some(self.clone()), PathElement::Name(name.into()), PathKind::Property)
    }

    /// Any element of the collection at `self`.
    pub fn collection_any(&self) -> Self {
        Self::new(Some(self.clone()), PathElement::Any, PathKind::CollectionAny)
    }

    /// Value under `key` in the map at `self`.
    pub fn map_value(&self, key: &PathMetadata) -> Self {
        Self::new(Some(self.clone()), PathElement::Key(key.clone()), PathKind::MapValue)
    }

    /// Element at `index` of the list at `self`.
    pub fn list_value(&self, index: usize) -> Self {
        Self::new(Some(self.clone()), PathElement::Index(index), PathKind::ListValue)
    }

    #[inline]
    pub fn parent(&self) -> Option<&PathMetadata> {
        self.inner.parent.as_ref()
    }

    #[inline]
    pub fn element(&self) -> &PathElement {
        &self.inner.element
    }

    #[inline]
    pub fn kind(&self) -> PathKind {
        self.inner.kind
    }

    /// Number of steps between `self` and its root (a root has depth 0).
    #[inline]
    pub fn depth(&self) -> usize {
        self.inner.depth
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.inner.kind == PathKind::Root
    }

    /// Structural identity key of the whole chain.
    #[inline]
    pub fn key(&self) -> PathKey {
        self.inner.key
    }

    /// Property or variable name of this step, if it has one.
    pub fn name(&self) -> Option<&str> {
        match &self.inner.element {
            PathElement::Name(name) => Some(name),
            _ => None,
        }
    }

    /// Root of the chain.
    pub fn root_metadata(&self) -> &PathMetadata {
        let mut current = self;
        while let Some(parent) = current.parent() {
            current = parent;
        }
        current
    }

    /// Variable name at the root of the chain.
    pub fn variable(&self) -> &str {
        self.root_metadata().name().unwrap_or_default()
    }

    /// Iterates from `self` up to and including the root.
    pub fn ancestors(&self) -> impl Iterator<Item = &PathMetadata> {
        std::iter::successors(Some(self), |metadata| metadata.parent())
    }

    /// Returns true when `other` is `self` or one of its ancestors.
    pub fn starts_with(&self, other: &PathMetadata) -> bool {
        self.depth() >= other.depth() && self.ancestors().any(|ancestor| ancestor == other)
    }
}

fn compute_key(parent: Option<&PathMetadata>, element: &PathElement, kind: PathKind) -> PathKey {
    let mut hasher = Sha256::new();
    hasher.update(parent.map_or(PathKey::EMPTY, PathMetadata::key).as_bytes());
    hasher.update([kind.tag()]);
    match element {
        PathElement::Name(name) => {
            hasher.update(b"n");
            hasher.update((name.len() as u64).to_le_bytes());
            hasher.update(name.as_bytes());
        }
        PathElement::Index(index) => {
            hasher.update(b"i");
            hasher.update((*index as u64).to_le_bytes());
        }
        PathElement::Key(key) => {
            hasher.update(b"k");
            hasher.update(key.key().as_bytes());
        }
        PathElement::Any => hasher.update(b"a"),
    }
    PathKey(hasher.finalize().into())
}

impl PartialEq for PathMetadata {
    fn eq(&self, other: &Self) -> bool {
        if Arc::ptr_eq(&self.inner, &other.inner) {
            return true;
        }
        self.inner.key == other.inner.key
            && self.inner.kind == other.inner.kind
            && self.inner.element == other.inner.element
            && self.inner.parent == other.inner.parent
    }
}

impl Eq for PathMetadata {}

impl Hash for PathMetadata {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write(self.inner.key.as_bytes());
    }
}

impl fmt::Display for PathMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.parent(), self.element()) {
            (None, PathElement::Name(name)) => f.write_str(name),
            (None, _) => f.write_str("?"),
            (Some(parent), PathElement::Any) => write!(f, "any({parent})"),
            (Some(parent), PathElement::Name(name)) => write!(f, "{parent}.{name}"),
            (Some(parent), PathElement::Index(index)) => write!(f, "{parent}.get({index})"),
            (Some(parent), PathElement::Key(key)) => write!(f, "{parent}.get({key})"),
        }
    }
}

impl fmt::Debug for PathMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathMetadata")
            .field("path", &format_args!("{self}"))
            .field("kind", &self.kind())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn equal_arguments_build_equal_chains() {
        let a = PathMetadata::root("user").property("user_loan_histories").collection_any();
        let b = PathMetadata::root("user").property("user_loan_histories").collection_any();
        assert_eq!(a, b);
        assert_eq!(a.key(), b.key());

        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
    }

    #[test]
    fn different_variables_are_distinct() {
        let u1 = PathMetadata::root("u1").property("name");
        let u2 = PathMetadata::root("u2").property("name");
        assert_ne!(u1, u2);
        assert_ne!(u1.key(), u2.key());
    }

    #[test]
    fn kind_participates_in_identity() {
        let root = PathMetadata::root("user");
        let any = root.property("tags").collection_any();
        let first = root.property("tags").list_value(0);
        assert_ne!(any, first);
        assert_ne!(root.property("a").list_value(1), root.property("a").list_value(2));
    }

    #[test]
    fn display_renders_traversal() {
        let root = PathMetadata::root("user");
        let loans = root.property("user_loan_histories");
        assert_eq!(loans.to_string(), "user.user_loan_histories");
        assert_eq!(
            loans.collection_any().property("user").to_string(),
            "any(user.user_loan_histories).user"
        );
        assert_eq!(loans.list_value(3).to_string(), "user.user_loan_histories.get(3)");

        let key = PathMetadata::root("k");
        assert_eq!(root.property("books").map_value(&key).to_string(), "user.books.get(k)");
    }

    #[test]
    fn depth_root_and_ancestors() {
        let leaf = PathMetadata::root("user").property("a").property("b");
        assert_eq!(leaf.depth(), 2);
        assert_eq!(leaf.variable(), "user");
        assert!(leaf.root_metadata().is_root());
        assert_eq!(leaf.ancestors().count(), 3);
        assert!(leaf.starts_with(&PathMetadata::root("user").property("a")));
        assert!(!leaf.starts_with(&PathMetadata::root("other")));
    }

    #[test]
    fn key_renders_as_hex() {
        let key = PathMetadata::root("user").key();
        assert_eq!(key.to_hex().len(), 64);
        assert_eq!(serde_json::to_value(key).unwrap(), serde_json::Value::String(key.to_hex()));
    }

    #[test]
    fn serializes_parent_chain() {
        let metadata = PathMetadata::root("user").property("name");
        let json = serde_json::to_value(&metadata).unwrap();
        assert_eq!(json["kind"], "property");
        assert_eq!(json["element"]["name"], "name");
        assert_eq!(json["parent"]["kind"], "root");
    }
}
