use std::marker::PhantomData;

use crate::expr::{Expr, Operator, Predicate};
use crate::metadata::PathMetadata;
use crate::path::{ops, PathNode};
use crate::types::{Constant, TypeTag};

/// Path to a string attribute.
pub struct StringPath {
    node: PathNode,
    _value: PhantomData<fn() -> String>,
}

impl StringPath {
    pub fn new(name: &str, parent: &PathMetadata) -> Self {
        Self::from_node(PathNode::property(parent, name, TypeTag::String))
    }

    pub fn from_node(node: PathNode) -> Self {
        Self {
            node,
            _value: PhantomData,
        }
    }

    pub fn starts_with(&self, prefix: impl Into<String>) -> Predicate {
        ops::compare(self, Operator::StartsWith, Constant::String(prefix.into()))
    }

    pub fn ends_with(&self, suffix: impl Into<String>) -> Predicate {
        ops::compare(self, Operator::EndsWith, Constant::String(suffix.into()))
    }

    pub fn contains(&self, needle: impl Into<String>) -> Predicate {
        ops::compare(self, Operator::StringContains, Constant::String(needle.into()))
    }

    pub fn contains_ignore_case(&self, needle: impl Into<String>) -> Predicate {
        ops::compare(self, Operator::StringContainsIgnoreCase, Constant::String(needle.into()))
    }

    /// SQL-style pattern match with `%` and `_` wildcards.
    pub fn like(&self, pattern: impl Into<String>) -> Predicate {
        ops::compare(self, Operator::Like, Constant::String(pattern.into()))
    }

    pub fn eq_ignore_case(&self, value: impl Into<String>) -> Predicate {
        ops::compare(self, Operator::EqIgnoreCase, Constant::String(value.into()))
    }

    pub fn is_empty(&self) -> Predicate {
        ops::unary(self, Operator::StringIsEmpty)
    }

    pub fn is_not_empty(&self) -> Predicate {
        self.is_empty().not()
    }

    pub fn length(&self) -> Expr {
        ops::function(self, Operator::StringLength)
    }

    pub fn lower(&self) -> Expr {
        ops::function(self, Operator::Lower)
    }

    pub fn upper(&self) -> Expr {
        ops::function(self, Operator::Upper)
    }
}

typed_node_path!([] StringPath);
value_ops!([] StringPath, String, crate::types::IntoConstant::into_constant);
comparable_ops!([] StringPath, String, crate::types::IntoConstant::into_constant);
