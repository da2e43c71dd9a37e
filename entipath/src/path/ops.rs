//! Operation sets shared by the typed path wrappers.
//!
//! The operations are inherent methods (not trait methods) so that `path.eq(value)` never clashes
//! with `PartialEq::eq` and callers need no extra imports.

use crate::expr::{Expr, Operator, Predicate};
use crate::path::Path;
use crate::types::Constant;

pub(crate) fn compare(path: &dyn Path, op: Operator, value: Constant) -> Predicate {
    Predicate::operation(op, [path.to_expr(), Expr::Constant { value }])
}

pub(crate) fn compare_paths(path: &dyn Path, op: Operator, other: &dyn Path) -> Predicate {
    Predicate::operation(op, [path.to_expr(), other.to_expr()])
}

pub(crate) fn unary(path: &dyn Path, op: Operator) -> Predicate {
    Predicate::operation(op, [path.to_expr()])
}

pub(crate) fn function(path: &dyn Path, op: Operator) -> Expr {
    Expr::operation(op, [path.to_expr()])
}

pub(crate) fn membership(
    path: &dyn Path,
    op: Operator,
    values: impl IntoIterator<Item = Constant>,
) -> Predicate {
    let constants = values.into_iter().map(|value| Expr::Constant { value });
    let args = std::iter::once(path.to_expr()).chain(constants);
    Predicate::operation(op, args)
}

/// Implements `Path`, `Clone`, `PartialEq`, `Eq`, `Hash` and `Debug` for a wrapper with a
/// `node: PathNode` field and a `_value: PhantomData<_>` marker.
macro_rules! typed_node_path {
    ([$($generics:tt)*] $path:ty) => {
        impl<$($generics)*> $crate::path::Path for $path {
            #[inline]
            fn metadata(&self) -> &$crate::metadata::PathMetadata {
                self.node.metadata()
            }

            #[inline]
            fn type_tag(&self) -> &$crate::types::TypeTag {
                self.node.type_tag()
            }
        }

        impl<$($generics)*> Clone for $path {
            fn clone(&self) -> Self {
                Self {
                    node: self.node.clone(),
                    _value: std::marker::PhantomData,
                }
            }
        }

        impl<$($generics)*> PartialEq for $path {
            fn eq(&self, other: &Self) -> bool {
                self.node == other.node
            }
        }

        impl<$($generics)*> Eq for $path {}

        impl<$($generics)*> std::hash::Hash for $path {
            fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
                std::hash::Hash::hash(&self.node, state);
            }
        }

        impl<$($generics)*> std::fmt::Debug for $path {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.debug_tuple(stringify!($path)).field(&self.node).finish()
            }
        }
    };
}

/// Equality, null checks, membership and counting.
macro_rules! value_ops {
    ([$($generics:tt)*] $path:ty, $value:ty, $convert:expr) => {
        impl<$($generics)*> $path {
            /// `self = value`
            pub fn eq(&self, value: impl Into<$value>) -> $crate::expr::Predicate {
                $crate::path::ops::compare(
                    self,
                    $crate::expr::Operator::Eq,
                    ($convert)(Into::<$value>::into(value)),
                )
            }

            /// `self != value`
            pub fn ne(&self, value: impl Into<$value>) -> $crate::expr::Predicate {
                $crate::path::ops::compare(
                    self,
                    $crate::expr::Operator::Ne,
                    ($convert)(Into::<$value>::into(value)),
                )
            }

            /// `self = other`, e.g. a join condition between two aliases.
            pub fn eq_path(&self, other: &impl $crate::path::Path) -> $crate::expr::Predicate {
                $crate::path::ops::compare_paths(self, $crate::expr::Operator::Eq, other)
            }

            pub fn ne_path(&self, other: &impl $crate::path::Path) -> $crate::expr::Predicate {
                $crate::path::ops::compare_paths(self, $crate::expr::Operator::Ne, other)
            }

            pub fn is_null(&self) -> $crate::expr::Predicate {
                $crate::path::ops::unary(self, $crate::expr::Operator::IsNull)
            }

            pub fn is_not_null(&self) -> $crate::expr::Predicate {
                $crate::path::ops::unary(self, $crate::expr::Operator::IsNotNull)
            }

            pub fn is_in<V: Into<$value>>(
                &self,
                values: impl IntoIterator<Item = V>,
            ) -> $crate::expr::Predicate {
                $crate::path::ops::membership(
                    self,
                    $crate::expr::Operator::In,
                    values.into_iter().map(|value| ($convert)(Into::<$value>::into(value))),
                )
            }

            pub fn not_in<V: Into<$value>>(
                &self,
                values: impl IntoIterator<Item = V>,
            ) -> $crate::expr::Predicate {
                $crate::path::ops::membership(
                    self,
                    $crate::expr::Operator::NotIn,
                    values.into_iter().map(|value| ($convert)(Into::<$value>::into(value))),
                )
            }

            pub fn count(&self) -> $crate::expr::Expr {
                $crate::path::ops::function(self, $crate::expr::Operator::Count)
            }

            pub fn count_distinct(&self) -> $crate::expr::Expr {
                $crate::path::ops::function(self, $crate::expr::Operator::CountDistinct)
            }
        }
    };
}

/// Range comparisons, ordering and min/max.
macro_rules! comparable_ops {
    ([$($generics:tt)*] $path:ty, $value:ty, $convert:expr) => {
        impl<$($generics)*> $path {
            /// `self < value`
            pub fn lt(&self, value: impl Into<$value>) -> $crate::expr::Predicate {
                $crate::path::ops::compare(
                    self,
                    $crate::expr::Operator::Lt,
                    ($convert)(Into::<$value>::into(value)),
                )
            }

            /// `self > value`
            pub fn gt(&self, value: impl Into<$value>) -> $crate::expr::Predicate {
                $crate::path::ops::compare(
                    self,
                    $crate::expr::Operator::Gt,
                    ($convert)(Into::<$value>::into(value)),
                )
            }

            /// `self <= value`
            pub fn loe(&self, value: impl Into<$value>) -> $crate::expr::Predicate {
                $crate::path::ops::compare(
                    self,
                    $crate::expr::Operator::Loe,
                    ($convert)(Into::<$value>::into(value)),
                )
            }

            /// `self >= value`
            pub fn goe(&self, value: impl Into<$value>) -> $crate::expr::Predicate {
                $crate::path::ops::compare(
                    self,
                    $crate::expr::Operator::Goe,
                    ($convert)(Into::<$value>::into(value)),
                )
            }

            /// Inclusive range.
            pub fn between(
                &self,
                low: impl Into<$value>,
                high: impl Into<$value>,
            ) -> $crate::expr::Predicate {
                $crate::path::ops::membership(
                    self,
                    $crate::expr::Operator::Between,
                    [($convert)(Into::<$value>::into(low)), ($convert)(Into::<$value>::into(high))],
                )
            }

            pub fn asc(&self) -> $crate::expr::OrderSpecifier {
                $crate::expr::OrderSpecifier::asc($crate::path::Path::to_expr(self))
            }

            pub fn desc(&self) -> $crate::expr::OrderSpecifier {
                $crate::expr::OrderSpecifier::desc($crate::path::Path::to_expr(self))
            }

            pub fn min(&self) -> $crate::expr::Expr {
                $crate::path::ops::function(self, $crate::expr::Operator::Min)
            }

            pub fn max(&self) -> $crate::expr::Expr {
                $crate::path::ops::function(self, $crate::expr::Operator::Max)
            }
        }
    };
}
