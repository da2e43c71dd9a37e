//! Declarative entity schemas and the paths built from them at runtime.
//!
//! A [`Schema`] lists entities with their attributes in declaration order. It can be assembled
//! with the fluent builder, deserialized from TOML (see
//! [`PathsConfig`](crate::config::PathsConfig)) or derived from registered typed paths.
//! [`SchemaPaths`] turns a validated schema into entity paths with the same expansion
//! behaviour as the typed ones.

mod paths;

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::errors::SchemaError;
use crate::types::TypeTag;

pub use paths::{SchemaAssociation, SchemaEntityPath, SchemaPaths};

static IDENTIFIER: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").ok());

fn is_identifier(name: &str) -> bool {
    IDENTIFIER.as_ref().is_some_and(|regex| regex.is_match(name))
}

/// Declared type of a scalar attribute.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ScalarType {
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
    Any,
    Enum(String),
}

impl ScalarType {
    pub fn type_tag(&self) -> TypeTag {
        match self {
            ScalarType::Boolean => TypeTag::Boolean,
            ScalarType::Int16 => TypeTag::Int16,
            ScalarType::Int32 => TypeTag::Int32,
            ScalarType::Int64 => TypeTag::Int64,
            ScalarType::UInt32 => TypeTag::UInt32,
            ScalarType::UInt64 => TypeTag::UInt64,
            ScalarType::Float32 => TypeTag::Float32,
            ScalarType::Float64 => TypeTag::Float64,
            ScalarType::String => TypeTag::String,
            ScalarType::Date => TypeTag::Date,
            ScalarType::DateTime => TypeTag::DateTime,
            ScalarType::Any => TypeTag::Any,
            ScalarType::Enum(name) => TypeTag::Enum(name.clone()),
        }
    }

    /// Scalar type for a tag; entity and collection tags map to [`ScalarType::Any`].
    pub fn from_type_tag(tag: &TypeTag) -> Self {
        match tag {
            TypeTag::Boolean => ScalarType::Boolean,
            TypeTag::Int16 => ScalarType::Int16,
            TypeTag::Int32 => ScalarType::Int32,
            TypeTag::Int64 => ScalarType::Int64,
            TypeTag::UInt32 => ScalarType::UInt32,
            TypeTag::UInt64 => ScalarType::UInt64,
            TypeTag::Float32 => ScalarType::Float32,
            TypeTag::Float64 => ScalarType::Float64,
            TypeTag::String => ScalarType::String,
            TypeTag::Date => ScalarType::Date,
            TypeTag::DateTime => ScalarType::DateTime,
            TypeTag::Enum(name) => ScalarType::Enum(name.clone()),
            TypeTag::Any
            | TypeTag::Entity(_)
            | TypeTag::List(_)
            | TypeTag::Set(_)
            | TypeTag::Map(..) => ScalarType::Any,
        }
    }
}

impl FromStr for ScalarType {
    type Err = SchemaError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        if let Some(name) = value.strip_prefix("enum:") {
            return Ok(ScalarType::Enum(name.trim().to_string()));
        }
        let scalar = match value.to_ascii_lowercase().as_str() {
            "bool" | "boolean" => ScalarType::Boolean,
            "i16" | "int16" => ScalarType::Int16,
            "i32" | "int" | "int32" => ScalarType::Int32,
            "i64" | "long" | "int64" => ScalarType::Int64,
            "u32" | "uint32" => ScalarType::UInt32,
            "u64" | "uint64" => ScalarType::UInt64,
            "f32" | "float" | "float32" => ScalarType::Float32,
            "f64" | "double" | "float64" => ScalarType::Float64,
            "str" | "string" => ScalarType::String,
            "date" => ScalarType::Date,
            "datetime" | "timestamp" => ScalarType::DateTime,
            "any" => ScalarType::Any,
            "enum" => ScalarType::Enum(String::new()),
            _ => return Err(SchemaError::UnknownScalarType(value.to_string())),
        };
        Ok(scalar)
    }
}

impl TryFrom<String> for ScalarType {
    type Error = SchemaError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ScalarType> for String {
    fn from(value: ScalarType) -> Self {
        value.to_string()
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScalarType::Boolean => "boolean",
            ScalarType::Int16 => "int16",
            ScalarType::Int32 => "int32",
            ScalarType::Int64 => "int64",
            ScalarType::UInt32 => "uint32",
            ScalarType::UInt64 => "uint64",
            ScalarType::Float32 => "float32",
            ScalarType::Float64 => "float64",
            ScalarType::String => "string",
            ScalarType::Date => "date",
            ScalarType::DateTime => "datetime",
            ScalarType::Any => "any",
            ScalarType::Enum(name) => return write!(f, "enum:{name}"),
        };
        f.write_str(name)
    }
}

/// What an attribute holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeKind {
    #[serde(rename = "type")]
    Scalar(ScalarType),
    Reference(String),
    List(String),
    Set(String),
    Map { key: ScalarType, target: String },
}

impl AttributeKind {
    /// Target entity of an association.
    pub fn target(&self) -> Option<&str> {
        match self {
            AttributeKind::Scalar(_) => None,
            AttributeKind::Reference(target)
            | AttributeKind::List(target)
            | AttributeKind::Set(target) => Some(target),
            AttributeKind::Map { target, .. } => Some(target),
        }
    }

    pub const fn label(&self) -> &'static str {
        match self {
            AttributeKind::Scalar(_) => "scalar",
            AttributeKind::Reference(_) => "reference",
            AttributeKind::List(_) => "list",
            AttributeKind::Set(_) => "set",
            AttributeKind::Map { .. } => "map",
        }
    }
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeKind::Scalar(scalar) => write!(f, "{scalar}"),
            AttributeKind::Reference(target) => write!(f, "-> {target}"),
            AttributeKind::List(target) => write!(f, "list<{target}>"),
            AttributeKind::Set(target) => write!(f, "set<{target}>"),
            AttributeKind::Map { key, target } => write!(f, "map<{key}, {target}>"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeSchema {
    pub name: String,
    #[serde(flatten)]
    pub kind: AttributeKind,
}

impl AttributeSchema {
    pub fn new(name: impl Into<String>, kind: AttributeKind) -> Self {
        Self { name: name.into(), kind }
    }
}

/// One entity: its name, canonical variable and ordered attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySchema {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variable: Option<String>,
    #[serde(default, rename = "attribute")]
    pub attributes: Vec<AttributeSchema>,
}

impl EntitySchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            variable: None,
            attributes: Vec::new(),
        }
    }

    pub fn variable(mut self, variable: impl Into<String>) -> Self {
        self.variable = Some(variable.into());
        self
    }

    pub fn with_attribute(mut self, attribute: AttributeSchema) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn scalar(self, name: impl Into<String>, scalar: ScalarType) -> Self {
        self.with_attribute(AttributeSchema::new(name, AttributeKind::Scalar(scalar)))
    }

    pub fn reference(self, name: impl Into<String>, target: impl Into<String>) -> Self {
        self.with_attribute(AttributeSchema::new(name, AttributeKind::Reference(target.into())))
    }

    pub fn list(self, name: impl Into<String>, target: impl Into<String>) -> Self {
        self.with_attribute(AttributeSchema::new(name, AttributeKind::List(target.into())))
    }

    pub fn set(self, name: impl Into<String>, target: impl Into<String>) -> Self {
        self.with_attribute(AttributeSchema::new(name, AttributeKind::Set(target.into())))
    }

    pub fn map(self, name: impl Into<String>, key: ScalarType, target: impl Into<String>) -> Self {
        self.with_attribute(AttributeSchema::new(
            name,
            AttributeKind::Map {
                key,
                target: target.into(),
            },
        ))
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeSchema> {
        self.attributes.iter().find(|attribute| attribute.name == name)
    }

    /// Declared variable, or the entity name with a lower-case first letter
    /// (`UserLoanHistory` gives `userLoanHistory`).
    pub fn variable_name(&self) -> String {
        if let Some(variable) = &self.variable {
            return variable.clone();
        }
        let mut chars = self.name.chars();
        match chars.next() {
            Some(first) => first.to_lowercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

/// Ordered set of entity declarations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    #[serde(default, rename = "entity")]
    pub entities: Vec<EntitySchema>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entity(mut self, entity: EntitySchema) -> Self {
        self.entities.push(entity);
        self
    }

    pub fn get(&self, name: &str) -> Option<&EntitySchema> {
        self.entities.iter().find(|entity| entity.name == name)
    }

    pub fn require(&self, name: &str) -> Result<&EntitySchema, SchemaError> {
        self.get(name).ok_or_else(|| SchemaError::UnknownEntity(name.to_string()))
    }

    pub fn entity_names(&self) -> impl Iterator<Item = &str> {
        self.entities.iter().map(|entity| entity.name.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Fails with the first problem found; see [`Schema::problems`] for all of them.
    pub fn validate(&self) -> Result<(), SchemaError> {
        match self.problems().into_iter().next() {
            Some(problem) => Err(problem),
            None => Ok(()),
        }
    }

    /// Every validation problem, in declaration order.
    pub fn problems(&self) -> Vec<SchemaError> {
        let mut problems = Vec::new();
        let names: HashSet<&str> = self.entity_names().collect();
        let mut seen = HashSet::new();

        for entity in &self.entities {
            if !is_identifier(&entity.name) {
                problems.push(SchemaError::InvalidName {
                    what: "entity",
                    name: entity.name.clone(),
                });
            }
            if !seen.insert(entity.name.as_str()) {
                problems.push(SchemaError::DuplicateEntity(entity.name.clone()));
            }
            if let Some(variable) = &entity.variable
                && !is_identifier(variable)
            {
                problems.push(SchemaError::InvalidName {
                    what: "variable",
                    name: variable.clone(),
                });
            }

            let mut attributes = HashSet::new();
            for attribute in &entity.attributes {
                if !is_identifier(&attribute.name) || attribute.name == "any" {
                    problems.push(SchemaError::InvalidName {
                        what: "attribute",
                        name: format!("{}.{}", entity.name, attribute.name),
                    });
                }
                if !attributes.insert(attribute.name.as_str()) {
                    problems.push(SchemaError::DuplicateAttribute {
                        entity: entity.name.clone(),
                        attribute: attribute.name.clone(),
                    });
                }
                let scalar = match &attribute.kind {
                    AttributeKind::Scalar(scalar) | AttributeKind::Map { key: scalar, .. } => {
                        Some(scalar)
                    }
                    _ => None,
                };
                if let Some(ScalarType::Enum(name)) = scalar
                    && name.is_empty()
                {
                    problems.push(SchemaError::MissingEnumName {
                        entity: entity.name.clone(),
                        attribute: attribute.name.clone(),
                    });
                }
                if let Some(target) = attribute.kind.target()
                    && !names.contains(target)
                {
                    problems.push(SchemaError::UnknownTarget {
                        entity: entity.name.clone(),
                        attribute: attribute.name.clone(),
                        target: target.to_string(),
                    });
                }
            }
        }
        problems
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn library() -> Schema {
        Schema::new()
            .entity(
                EntitySchema::new("User")
                    .scalar("id", ScalarType::Int64)
                    .scalar("name", ScalarType::String)
                    .list("user_loan_histories", "UserLoanHistory"),
            )
            .entity(
                EntitySchema::new("UserLoanHistory")
                    .scalar("id", ScalarType::Int64)
                    .reference("user", "User")
                    .scalar("status", ScalarType::Enum("UserLoanStatus".into())),
            )
    }

    #[test]
    fn valid_schema_passes() {
        assert!(library().validate().is_ok());
        assert_eq!(library().entity_names().collect::<Vec<_>>(), ["User", "UserLoanHistory"]);
    }

    #[test]
    fn reports_every_problem() {
        let schema = library()
            .entity(EntitySchema::new("User"))
            .entity(
                EntitySchema::new("Broken")
                    .reference("owner", "Nobody")
                    .scalar("owner", ScalarType::Enum(String::new()))
                    .scalar("bad name", ScalarType::Int32),
            );
        let problems = schema.problems();
        assert!(problems.contains(&SchemaError::DuplicateEntity("User".into())));
        assert!(problems.contains(&SchemaError::UnknownTarget {
            entity: "Broken".into(),
            attribute: "owner".into(),
            target: "Nobody".into(),
        }));
        assert!(problems.contains(&SchemaError::DuplicateAttribute {
            entity: "Broken".into(),
            attribute: "owner".into(),
        }));
        assert!(problems.contains(&SchemaError::MissingEnumName {
            entity: "Broken".into(),
            attribute: "owner".into(),
        }));
        assert!(problems.iter().any(|problem| matches!(
            problem,
            SchemaError::InvalidName { what: "attribute", .. }
        )));
        assert_eq!(schema.validate(), Err(problems[0].clone()));
    }

    #[test]
    fn scalar_types_parse() {
        assert_eq!("int32".parse::<ScalarType>().unwrap(), ScalarType::Int32);
        assert_eq!("Long".parse::<ScalarType>().unwrap(), ScalarType::Int64);
        assert_eq!(
            "enum:UserLoanStatus".parse::<ScalarType>().unwrap(),
            ScalarType::Enum("UserLoanStatus".into())
        );
        assert_eq!(ScalarType::Enum("X".into()).to_string(), "enum:X");
        assert!(matches!("uuid".parse::<ScalarType>(), Err(SchemaError::UnknownScalarType(_))));
    }

    #[test]
    fn default_variable_is_lower_camel() {
        assert_eq!(EntitySchema::new("UserLoanHistory").variable_name(), "userLoanHistory");
        assert_eq!(EntitySchema::new("User").variable("u").variable_name(), "u");
    }

    #[test]
    fn attributes_round_trip_through_toml() {
        let entity: EntitySchema = toml::from_str(
            r#"
            name = "Shelf"

            [[attribute]]
            name = "label"
            type = "string"

            [[attribute]]
            name = "books"
            set = "Book"

            [[attribute]]
            name = "by_isbn"
            map = { key = "string", target = "Book" }
            "#,
        )
        .unwrap();
        assert_eq!(entity.attributes[0].kind, AttributeKind::Scalar(ScalarType::String));
        assert_eq!(entity.attributes[1].kind, AttributeKind::Set("Book".into()));
        assert_eq!(
            entity.attributes[2].kind,
            AttributeKind::Map {
                key: ScalarType::String,
                target: "Book".into()
            }
        );

        let json = serde_json::to_value(&entity.attributes[0]).unwrap();
        assert_eq!(json, serde_json::json!({"name": "label", "type": "string"}));
    }
}
