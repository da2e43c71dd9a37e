use std::path::PathBuf;

use thiserror::Error;

/// Problems found in a declarative schema or while looking paths up in one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// Entity, variable or attribute name is empty or not an identifier.
    #[error("invalid {what} name '{name}'")]
    InvalidName { what: &'static str, name: String },

    #[error("entity '{0}' is declared more than once")]
    DuplicateEntity(String),

    #[error("entity '{entity}' declares attribute '{attribute}' more than once")]
    DuplicateAttribute { entity: String, attribute: String },

    /// Association pointing at an entity the schema does not declare.
    #[error("attribute '{entity}.{attribute}' targets unknown entity '{target}'")]
    UnknownTarget {
        entity: String,
        attribute: String,
        target: String,
    },

    #[error("attribute '{entity}.{attribute}' is an enum without a type name")]
    MissingEnumName { entity: String, attribute: String },

    #[error("unknown scalar type '{0}'")]
    UnknownScalarType(String),

    #[error("unknown entity '{0}'")]
    UnknownEntity(String),

    #[error("entity '{entity}' has no attribute '{attribute}'")]
    UnknownAttribute { entity: String, attribute: String },

    /// Attribute exists but was requested as a different kind of path.
    #[error("attribute '{entity}.{attribute}' is {actual}, not {expected}")]
    KindMismatch {
        entity: String,
        attribute: String,
        expected: String,
        actual: String,
    },

    #[error("cannot resolve '{path}': {reason}")]
    InvalidPath { path: String, reason: String },
}

/// Failure to load a path configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration")]
    Parse(#[from] toml::de::Error),

    #[error(transparent)]
    Schema(#[from] SchemaError),
}
