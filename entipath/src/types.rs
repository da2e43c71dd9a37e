use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Declared type of the attribute a path points at.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeTag {
    Boolean,
    Int16,
    Int32,
    Int64,
    UInt32,
    UInt64,
    Float32,
    Float64,
    String,
    Date,
    DateTime,
    /// Untyped constant slot, used by schema-driven scalar paths.
    Any,
    Enum(String),
    Entity(String),
    List(Box<TypeTag>),
    Set(Box<TypeTag>),
    Map(Box<TypeTag>, Box<TypeTag>),
}

impl TypeTag {
    pub fn entity(name: impl Into<String>) -> Self {
        TypeTag::Entity(name.into())
    }

    pub fn list_of(element: TypeTag) -> Self {
        TypeTag::List(Box::new(element))
    }

    pub fn set_of(element: TypeTag) -> Self {
        TypeTag::Set(Box::new(element))
    }

    pub fn map_of(key: TypeTag, value: TypeTag) -> Self {
        TypeTag::Map(Box::new(key), Box::new(value))
    }

    /// Entity name for entity tags.
    pub fn entity_name(&self) -> Option<&str> {
        match self {
            TypeTag::Entity(name) => Some(name),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            TypeTag::Int16
                | TypeTag::Int32
                | TypeTag::Int64
                | TypeTag::UInt32
                | TypeTag::UInt64
                | TypeTag::Float32
                | TypeTag::Float64
        )
    }

    pub fn is_collection(&self) -> bool {
        matches!(self, TypeTag::List(_) | TypeTag::Set(_) | TypeTag::Map(..))
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeTag::Boolean => f.write_str("bool"),
            TypeTag::Int16 => f.write_str("i16"),
            TypeTag::Int32 => f.write_str("i32"),
            TypeTag::Int64 => f.write_str("i64"),
            TypeTag::UInt32 => f.write_str("u32"),
            TypeTag::UInt64 => f.write_str("u64"),
            TypeTag::Float32 => f.write_str("f32"),
            TypeTag::Float64 => f.write_str("f64"),
            TypeTag::String => f.write_str("String"),
            TypeTag::Date => f.write_str("Date"),
            TypeTag::DateTime => f.write_str("DateTime"),
            TypeTag::Any => f.write_str("Any"),
            TypeTag::Enum(name) | TypeTag::Entity(name) => f.write_str(name),
            TypeTag::List(element) => write!(f, "List<{element}>"),
            TypeTag::Set(element) => write!(f, "Set<{element}>"),
            TypeTag::Map(key, value) => write!(f, "Map<{key}, {value}>"),
        }
    }
}

/// Literal operand of an expression.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Constant {
    Null,
    Boolean(bool),
    Integer(i64),
    Unsigned(u64),
    Float(f64),
    String(String),
    Date(NaiveDate),
    DateTime(DateTime<Utc>),
    Enum { name: String, variant: String },
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Null => f.write_str("null"),
            Constant::Boolean(value) => write!(f, "{value}"),
            Constant::Integer(value) => write!(f, "{value}"),
            Constant::Unsigned(value) => write!(f, "{value}"),
            Constant::Float(value) => write!(f, "{value}"),
            Constant::String(value) => f.write_str(value),
            Constant::Date(value) => write!(f, "{value}"),
            Constant::DateTime(value) => write!(f, "{}", value.to_rfc3339()),
            Constant::Enum { variant, .. } => f.write_str(variant),
        }
    }
}

/// Values that can appear as constants next to a path.
pub trait IntoConstant: Send + Sync + 'static {
    fn into_constant(self) -> Constant;
}

/// Scalar Rust types with a fixed declared [`TypeTag`].
pub trait ValueType: IntoConstant + Clone {
    fn type_tag() -> TypeTag;
}

/// Numeric attribute types.
pub trait NumberType: ValueType + PartialOrd {}

/// Attribute types with a total order usable in range predicates and sorting.
pub trait ComparableType: ValueType {}

/// Date and time attribute types.
pub trait TemporalType: ComparableType {}

/// Rust enums mapped to enum attributes, stored by variant name.
pub trait PathEnum: Clone + Send + Sync + 'static {
    /// Declared enum type name, e.g. `"UserLoanStatus"`.
    const NAME: &'static str;

    fn variant_name(&self) -> &'static str;

    fn to_constant(&self) -> Constant {
        Constant::Enum {
            name: Self::NAME.to_string(),
            variant: self.variant_name().to_string(),
        }
    }
}

macro_rules! integer_value {
    ($($ty:ty => $tag:ident),* $(,)?) => {
        $(
            impl IntoConstant for $ty {
                #[inline]
                fn into_constant(self) -> Constant {
                    Constant::Integer(i64::from(self))
                }
            }

            impl ValueType for $ty {
                fn type_tag() -> TypeTag {
                    TypeTag::$tag
                }
            }

            impl NumberType for $ty {}
            impl ComparableType for $ty {}
        )*
    };
}

integer_value!(i16 => Int16, i32 => Int32, i64 => Int64, u32 => UInt32);

impl IntoConstant for u64 {
    #[inline]
    fn into_constant(self) -> Constant {
        Constant::Unsigned(self)
    }
}

impl ValueType for u64 {
    fn type_tag() -> TypeTag {
        TypeTag::UInt64
    }
}

impl NumberType for u64 {}
impl ComparableType for u64 {}

impl IntoConstant for f32 {
    #[inline]
    fn into_constant(self) -> Constant {
        Constant::Float(f64::from(self))
    }
}

impl ValueType for f32 {
    fn type_tag() -> TypeTag {
        TypeTag::Float32
    }
}

impl NumberType for f32 {}
impl ComparableType for f32 {}

impl IntoConstant for f64 {
    #[inline]
    fn into_constant(self) -> Constant {
        Constant::Float(self)
    }
}

impl ValueType for f64 {
    fn type_tag() -> TypeTag {
        TypeTag::Float64
    }
}

impl NumberType for f64 {}
impl ComparableType for f64 {}

impl IntoConstant for bool {
    #[inline]
    fn into_constant(self) -> Constant {
        Constant::Boolean(self)
    }
}

impl ValueType for bool {
    fn type_tag() -> TypeTag {
        TypeTag::Boolean
    }
}

impl IntoConstant for String {
    #[inline]
    fn into_constant(self) -> Constant {
        Constant::String(self)
    }
}

impl ValueType for String {
    fn type_tag() -> TypeTag {
        TypeTag::String
    }
}

impl ComparableType for String {}

impl IntoConstant for NaiveDate {
    #[inline]
    fn into_constant(self) -> Constant {
        Constant::Date(self)
    }
}

impl ValueType for NaiveDate {
    fn type_tag() -> TypeTag {
        TypeTag::Date
    }
}

impl ComparableType for NaiveDate {}
impl TemporalType for NaiveDate {}

impl IntoConstant for DateTime<Utc> {
    #[inline]
    fn into_constant(self) -> Constant {
        Constant::DateTime(self)
    }
}

impl ValueType for DateTime<Utc> {
    fn type_tag() -> TypeTag {
        TypeTag::DateTime
    }
}

impl ComparableType for DateTime<Utc> {}
impl TemporalType for DateTime<Utc> {}

impl IntoConstant for NaiveDateTime {
    #[inline]
    fn into_constant(self) -> Constant {
        Constant::DateTime(self.and_utc())
    }
}

impl ValueType for NaiveDateTime {
    fn type_tag() -> TypeTag {
        TypeTag::DateTime
    }
}

impl ComparableType for NaiveDateTime {}
impl TemporalType for NaiveDateTime {}

impl IntoConstant for Constant {
    #[inline]
    fn into_constant(self) -> Constant {
        self
    }
}

impl From<&str> for Constant {
    fn from(value: &str) -> Self {
        Constant::String(value.to_string())
    }
}

impl From<String> for Constant {
    fn from(value: String) -> Self {
        Constant::String(value)
    }
}

impl From<i64> for Constant {
    fn from(value: i64) -> Self {
        Constant::Integer(value)
    }
}

impl From<i32> for Constant {
    fn from(value: i32) -> Self {
        Constant::Integer(i64::from(value))
    }
}

impl From<bool> for Constant {
    fn from(value: bool) -> Self {
        Constant::Boolean(value)
    }
}

impl From<f64> for Constant {
    fn from(value: f64) -> Self {
        Constant::Float(value)
    }
}
