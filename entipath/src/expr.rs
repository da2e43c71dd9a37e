//! # Expressions, predicates and orderings
//!
//! Typed paths produce values from this module; the downstream evaluation engine consumes them.
//! Nothing here is evaluated locally.
//!
//! | Type               | Produced by                                  | Consumed as            |
//! |--------------------|----------------------------------------------|------------------------|
//! | [`Expr`]           | `path.to_expr()`, `count()`, `length()`, ... | projection / operand   |
//! | [`Predicate`]      | `eq`, `gt`, `starts_with`, `and`, `or`, ...  | where / having clause  |
//! | [`OrderSpecifier`] | `asc()`, `desc()`                            | order-by clause        |
//!
//! ```
//! use entipath::prelude::*;
//! use entipath::examples::library::QUser;
//!
//! let user = QUser::canonical();
//! let filter = user.name.starts_with("Kim").and(user.age.goe(20));
//! assert_eq!(filter.to_string(), "startsWith(user.name, Kim) && user.age >= 20");
//! ```

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::metadata::PathMetadata;
use crate::types::{Constant, IntoConstant, TypeTag};

/// Operation applied to the arguments of an [`Expr::Operation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    // Comparison
    Eq,
    Ne,
    Lt,
    Gt,
    Loe,
    Goe,
    Between,
    In,
    NotIn,
    IsNull,
    IsNotNull,
    // Strings
    StartsWith,
    EndsWith,
    StringContains,
    StringContainsIgnoreCase,
    Like,
    EqIgnoreCase,
    StringIsEmpty,
    StringLength,
    Lower,
    Upper,
    // Collections and maps
    CollectionSize,
    CollectionIsEmpty,
    CollectionContains,
    ContainsKey,
    ContainsValue,
    // Boolean connectives
    And,
    Or,
    Not,
    // Aggregates
    Count,
    CountDistinct,
    Sum,
    Avg,
    Min,
    Max,
}

impl Operator {
    /// Infix symbol for binary operators rendered between their operands.
    pub const fn symbol(self) -> Option<&'static str> {
        match self {
            Operator::Eq => Some("="),
            Operator::Ne => Some("!="),
            Operator::Lt => Some("<"),
            Operator::Gt => Some(">"),
            Operator::Loe => Some("<="),
            Operator::Goe => Some(">="),
            Operator::And => Some("&&"),
            Operator::Or => Some("||"),
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Operator::Eq => "eq",
            Operator::Ne => "ne",
            Operator::Lt => "lt",
            Operator::Gt => "gt",
            Operator::Loe => "loe",
            Operator::Goe => "goe",
            Operator::Between => "between",
            Operator::In => "in",
            Operator::NotIn => "notIn",
            Operator::IsNull => "isNull",
            Operator::IsNotNull => "isNotNull",
            Operator::StartsWith => "startsWith",
            Operator::EndsWith => "endsWith",
            Operator::StringContains => "contains",
            Operator::StringContainsIgnoreCase => "containsIc",
            Operator::Like => "like",
            Operator::EqIgnoreCase => "eqIc",
            Operator::StringIsEmpty => "isEmpty",
            Operator::StringLength => "length",
            Operator::Lower => "lower",
            Operator::Upper => "upper",
            Operator::CollectionSize => "size",
            Operator::CollectionIsEmpty => "isEmpty",
            Operator::CollectionContains => "contains",
            Operator::ContainsKey => "containsKey",
            Operator::ContainsValue => "containsValue",
            Operator::And => "and",
            Operator::Or => "or",
            Operator::Not => "not",
            Operator::Count => "count",
            Operator::CountDistinct => "countDistinct",
            Operator::Sum => "sum",
            Operator::Avg => "avg",
            Operator::Min => "min",
            Operator::Max => "max",
        }
    }
}

/// Expression tree handed to the evaluation engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "expr", rename_all = "snake_case")]
pub enum Expr {
    Path { metadata: PathMetadata, type_tag: TypeTag },
    Constant { value: Constant },
    Operation { op: Operator, args: Vec<Expr> },
}

impl Expr {
    #[inline]
    pub fn path(metadata: PathMetadata, type_tag: TypeTag) -> Self {
        Self::Path { metadata, type_tag }
    }

    #[inline]
    pub fn constant(value: impl IntoConstant) -> Self {
        Self::Constant {
            value: value.into_constant(),
        }
    }

    #[inline]
    pub fn operation(op: Operator, args: impl IntoIterator<Item = Expr>) -> Self {
        Self::Operation {
            op,
            args: args.into_iter().collect(),
        }
    }

    /// Comparison of this expression against a constant, e.g. `count() > 3` in a having clause.
    pub fn compare(self, op: Operator, value: impl IntoConstant) -> Predicate {
        Predicate::operation(op, [self, Expr::constant(value)])
    }

    pub fn asc(self) -> OrderSpecifier {
        OrderSpecifier::asc(self)
    }

    pub fn desc(self) -> OrderSpecifier {
        OrderSpecifier::desc(self)
    }

    /// Distinct path metadata referenced by this expression, in first-seen order.
    pub fn paths(&self) -> Vec<&PathMetadata> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        self.collect_paths(&mut seen, &mut out);
        out
    }

    fn collect_paths<'a>(
        &'a self,
        seen: &mut HashSet<&'a PathMetadata>,
        out: &mut Vec<&'a PathMetadata>,
    ) {
        match self {
            Expr::Path { metadata, .. } => {
                if seen.insert(metadata) {
                    out.push(metadata);
                }
            }
            Expr::Constant { .. } => {}
            Expr::Operation { args, .. } => {
                for arg in args {
                    arg.collect_paths(seen, out);
                }
            }
        }
    }

    fn is_connective(&self) -> bool {
        matches!(
            self,
            Expr::Operation {
                op: Operator::And | Operator::Or,
                ..
            }
        )
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Path { metadata, .. } => write!(f, "{metadata}"),
            Expr::Constant { value } => write!(f, "{value}"),
            Expr::Operation { op, args } => fmt_operation(f, *op, args),
        }
    }
}

fn fmt_operand(f: &mut fmt::Formatter<'_>, parent: Operator, arg: &Expr) -> fmt::Result {
    let needs_parens =
        arg.is_connective() && !matches!(arg, Expr::Operation { op, .. } if *op == parent);
    if needs_parens {
        write!(f, "({arg})")
    } else {
        write!(f, "{arg}")
    }
}

fn fmt_operation(f: &mut fmt::Formatter<'_>, op: Operator, args: &[Expr]) -> fmt::Result {
    match (op, args) {
        (Operator::Not, [arg]) => write!(f, "!({arg})"),
        (Operator::In | Operator::NotIn, [target, rest @ ..]) => {
            let keyword = if op == Operator::In { "in" } else { "not in" };
            write!(f, "{target} {keyword} [")?;
            for (index, value) in rest.iter().enumerate() {
                if index > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{value}")?;
            }
            f.write_str("]")
        }
        (Operator::Between, [target, low, high]) => write!(f, "{target} between {low} and {high}"),
        (Operator::IsNull, [target]) => write!(f, "{target} is null"),
        (Operator::IsNotNull, [target]) => write!(f, "{target} is not null"),
        _ => match op.symbol() {
            Some(symbol) if args.len() >= 2 => {
                for (index, arg) in args.iter().enumerate() {
                    if index > 0 {
                        write!(f, " {symbol} ")?;
                    }
                    fmt_operand(f, op, arg)?;
                }
                Ok(())
            }
            _ => {
                write!(f, "{}(", op.name())?;
                for (index, arg) in args.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(")")
            }
        },
    }
}

/// Boolean expression usable as a where/having condition.
///
/// Predicates compose with [`Predicate::and`], [`Predicate::or`] and [`Predicate::not`].
/// [`Predicate::all`] and [`Predicate::any`] skip `None` entries, which keeps optional filters
/// readable:
///
/// ```
/// use entipath::prelude::*;
/// use entipath::examples::library::{QUserLoanHistory, UserLoanStatus};
///
/// let loan = QUserLoanHistory::canonical();
/// let status: Option<UserLoanStatus> = None;
/// let filter = Predicate::all([
///     Some(loan.book_name.eq("Clean Code")),
///     status.map(|s| loan.status.eq(s)),
/// ]);
/// assert_eq!(filter.unwrap().to_string(), "userLoanHistory.book_name = Clean Code");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Predicate(Expr);

impl Predicate {
    pub(crate) fn operation(op: Operator, args: impl IntoIterator<Item = Expr>) -> Self {
        Self(Expr::operation(op, args))
    }

    #[inline]
    pub fn expr(&self) -> &Expr {
        &self.0
    }

    #[inline]
    pub fn into_expr(self) -> Expr {
        self.0
    }

    pub fn and(self, other: Predicate) -> Predicate {
        self.connect(Operator::And, other)
    }

    pub fn or(self, other: Predicate) -> Predicate {
        self.connect(Operator::Or, other)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Predicate {
        match self.0 {
            Expr::Operation { op: Operator::Not, mut args } if args.len() == 1 => match args.pop() {
                Some(inner) => Predicate(inner),
                None => Predicate::operation(Operator::Not, []),
            },
            expr => Predicate::operation(Operator::Not, [expr]),
        }
    }

    /// Conjunction of every present predicate; `None` when nothing is present.
    pub fn all<I, P>(predicates: I) -> Option<Predicate>
    where
        I: IntoIterator<Item = P>,
        P: Into<Option<Predicate>>,
    {
        predicates
            .into_iter()
            .filter_map(Into::into)
            .reduce(Predicate::and)
    }

    /// Disjunction of every present predicate; `None` when nothing is present.
    pub fn any<I, P>(predicates: I) -> Option<Predicate>
    where
        I: IntoIterator<Item = P>,
        P: Into<Option<Predicate>>,
    {
        predicates
            .into_iter()
            .filter_map(Into::into)
            .reduce(Predicate::or)
    }

    /// Distinct paths this predicate references.
    pub fn paths(&self) -> Vec<&PathMetadata> {
        self.0.paths()
    }

    fn connect(self, op: Operator, other: Predicate) -> Predicate {
        let mut args = match self.0 {
            Expr::Operation { op: existing, args } if existing == op => args,
            expr => vec![expr],
        };
        args.push(other.0);
        Predicate(Expr::Operation { op, args })
    }
}

impl From<Predicate> for Expr {
    fn from(predicate: Predicate) -> Self {
        predicate.0
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NullHandling {
    #[default]
    Default,
    NullsFirst,
    NullsLast,
}

/// Ordering of query results by an expression.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderSpecifier {
    target: Expr,
    order: SortOrder,
    nulls: NullHandling,
}

impl OrderSpecifier {
    pub fn new(target: Expr, order: SortOrder) -> Self {
        Self {
            target,
            order,
            nulls: NullHandling::Default,
        }
    }

    pub fn asc(target: Expr) -> Self {
        Self::new(target, SortOrder::Asc)
    }

    pub fn desc(target: Expr) -> Self {
        Self::new(target, SortOrder::Desc)
    }

    pub fn nulls_first(mut self) -> Self {
        self.nulls = NullHandling::NullsFirst;
        self
    }

    pub fn nulls_last(mut self) -> Self {
        self.nulls = NullHandling::NullsLast;
        self
    }

    #[inline]
    pub fn target(&self) -> &Expr {
        &self.target
    }

    #[inline]
    pub fn order(&self) -> SortOrder {
        self.order
    }

    #[inline]
    pub fn nulls(&self) -> NullHandling {
        self.nulls
    }
}

impl fmt::Display for OrderSpecifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.target, self.order.as_str())?;
        match self.nulls {
            NullHandling::Default => Ok(()),
            NullHandling::NullsFirst => f.write_str(" NULLS FIRST"),
            NullHandling::NullsLast => f.write_str(" NULLS LAST"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(name: &str) -> Expr {
        Expr::path(PathMetadata::root("user").property(name), TypeTag::Int32)
    }

    fn cmp(name: &str, op: Operator, value: i32) -> Predicate {
        path(name).compare(op, value)
    }

    #[test]
    fn and_flattens_chains() {
        let p = cmp("a", Operator::Eq, 1)
            .and(cmp("b", Operator::Eq, 2))
            .and(cmp("c", Operator::Eq, 3));
        match p.expr() {
            Expr::Operation { op, args } => {
                assert_eq!(*op, Operator::And);
                assert_eq!(args.len(), 3);
            }
            other => panic!("unexpected expression {other:?}"),
        }
        assert_eq!(p.to_string(), "user.a = 1 && user.b = 2 && user.c = 3");
    }

    #[test]
    fn mixed_connectives_are_parenthesized() {
        let p = cmp("a", Operator::Gt, 1)
            .or(cmp("b", Operator::Lt, 2))
            .and(cmp("c", Operator::Ne, 3));
        assert_eq!(p.to_string(), "(user.a > 1 || user.b < 2) && user.c != 3");
    }

    #[test]
    fn double_negation_cancels() {
        let p = cmp("a", Operator::Eq, 1);
        assert_eq!(p.clone().not().not(), p);
        assert_eq!(p.not().to_string(), "!(user.a = 1)");
    }

    #[test]
    fn all_skips_missing_predicates() {
        let none: Option<Predicate> = None;
        assert!(Predicate::all([none.clone(), None]).is_none());
        let single = Predicate::all([Some(cmp("a", Operator::Eq, 1)), none]).unwrap();
        assert_eq!(single, cmp("a", Operator::Eq, 1));
        let either =
            Predicate::any([cmp("a", Operator::Eq, 1), cmp("b", Operator::Eq, 2)]).unwrap();
        assert_eq!(either.to_string(), "user.a = 1 || user.b = 2");
    }

    #[test]
    fn paths_are_deduplicated() {
        let p = cmp("a", Operator::Gt, 1)
            .and(cmp("a", Operator::Lt, 9))
            .and(cmp("b", Operator::Eq, 2));
        let paths = p.paths();
        assert_eq!(paths.len(), 2);
        assert_eq!(paths[0].to_string(), "user.a");
        assert_eq!(paths[1].to_string(), "user.b");
    }

    #[test]
    fn order_specifier_display() {
        let order = path("age").desc().nulls_last();
        assert_eq!(order.to_string(), "user.age DESC NULLS LAST");
        assert_eq!(order.order(), SortOrder::Desc);
    }

    #[test]
    fn predicates_serialize_for_handoff() {
        let json = serde_json::to_value(cmp("age", Operator::Goe, 20)).unwrap();
        assert_eq!(json["expr"], "operation");
        assert_eq!(json["op"], "goe");
        assert_eq!(json["args"][0]["expr"], "path");
        assert_eq!(json["args"][0]["type_tag"], "int32");
        assert_eq!(json["args"][1]["value"]["value"], 20);
    }
}
