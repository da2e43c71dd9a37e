use std::marker::PhantomData;

use crate::expr::{Expr, Operator, Predicate};
use crate::metadata::PathMetadata;
use crate::path::{ops, PathNode};
use crate::types::{
    ComparableType, Constant, IntoConstant, NumberType, PathEnum, TemporalType, TypeTag, ValueType,
};

/// Path to a scalar with equality semantics only.
///
/// Schema-driven entities expose their scalars as `SimplePath<Constant>`, with the declared
/// type carried in the node's tag instead of the Rust type.
pub struct SimplePath<T> {
    node: PathNode,
    _value: PhantomData<fn() -> T>,
}

impl<T: ValueType> SimplePath<T> {
    pub fn new(name: &str, parent: &PathMetadata) -> Self {
        Self::with_type(name, parent, T::type_tag())
    }
}

impl<T: IntoConstant> SimplePath<T> {
    pub fn with_type(name: &str, parent: &PathMetadata, type_tag: TypeTag) -> Self {
        Self::from_node(PathNode::property(parent, name, type_tag))
    }

    pub fn from_node(node: PathNode) -> Self {
        Self {
            node,
            _value: PhantomData,
        }
    }
}

typed_node_path!([T] SimplePath<T>);
value_ops!([T: IntoConstant] SimplePath<T>, T, crate::types::IntoConstant::into_constant);

/// Path to a boolean attribute.
pub struct BooleanPath {
    node: PathNode,
    _value: PhantomData<fn() -> bool>,
}

impl BooleanPath {
    pub fn new(name: &str, parent: &PathMetadata) -> Self {
        Self::from_node(PathNode::property(parent, name, TypeTag::Boolean))
    }

    pub fn from_node(node: PathNode) -> Self {
        Self {
            node,
            _value: PhantomData,
        }
    }

    pub fn is_true(&self) -> Predicate {
        ops::compare(self, Operator::Eq, Constant::Boolean(true))
    }

    pub fn is_false(&self) -> Predicate {
        ops::compare(self, Operator::Eq, Constant::Boolean(false))
    }
}

typed_node_path!([] BooleanPath);
value_ops!([] BooleanPath, bool, crate::types::IntoConstant::into_constant);

/// Path to a numeric attribute.
pub struct NumberPath<T> {
    node: PathNode,
    _value: PhantomData<fn() -> T>,
}

impl<T: NumberType> NumberPath<T> {
    pub fn new(name: &str, parent: &PathMetadata) -> Self {
        Self::from_node(PathNode::property(parent, name, T::type_tag()))
    }

    pub fn from_node(node: PathNode) -> Self {
        Self {
            node,
            _value: PhantomData,
        }
    }

    pub fn sum(&self) -> Expr {
        ops::function(self, Operator::Sum)
    }

    pub fn avg(&self) -> Expr {
        ops::function(self, Operator::Avg)
    }
}

typed_node_path!([T] NumberPath<T>);
value_ops!([T: NumberType] NumberPath<T>, T, crate::types::IntoConstant::into_constant);
comparable_ops!(
    [T: NumberType + ComparableType] NumberPath<T>,
    T,
    crate::types::IntoConstant::into_constant
);

/// Path to an enum attribute stored by variant name.
pub struct EnumPath<E> {
    node: PathNode,
    _value: PhantomData<fn() -> E>,
}

impl<E: PathEnum> EnumPath<E> {
    pub fn new(name: &str, parent: &PathMetadata) -> Self {
        Self::from_node(PathNode::property(parent, name, TypeTag::Enum(E::NAME.to_string())))
    }

    pub fn from_node(node: PathNode) -> Self {
        Self {
            node,
            _value: PhantomData,
        }
    }

    pub fn asc(&self) -> crate::expr::OrderSpecifier {
        crate::expr::OrderSpecifier::asc(crate::path::Path::to_expr(self))
    }

    pub fn desc(&self) -> crate::expr::OrderSpecifier {
        crate::expr::OrderSpecifier::desc(crate::path::Path::to_expr(self))
    }
}

fn enum_constant<E: PathEnum>(value: E) -> Constant {
    value.to_constant()
}

typed_node_path!([E] EnumPath<E>);
value_ops!([E: PathEnum] EnumPath<E>, E, enum_constant::<E>);

/// Path to a date or timestamp attribute.
pub struct TemporalPath<T> {
    node: PathNode,
    _value: PhantomData<fn() -> T>,
}

impl<T: TemporalType> TemporalPath<T> {
    pub fn new(name: &str, parent: &PathMetadata) -> Self {
        Self::from_node(PathNode::property(parent, name, T::type_tag()))
    }

    pub fn from_node(node: PathNode) -> Self {
        Self {
            node,
            _value: PhantomData,
        }
    }

    pub fn before(&self, value: impl Into<T>) -> Predicate {
        self.lt(value)
    }

    pub fn after(&self, value: impl Into<T>) -> Predicate {
        self.gt(value)
    }
}

typed_node_path!([T] TemporalPath<T>);
value_ops!([T: TemporalType] TemporalPath<T>, T, crate::types::IntoConstant::into_constant);
comparable_ops!([T: TemporalType] TemporalPath<T>, T, crate::types::IntoConstant::into_constant);
