//! TOML configuration: expansion policy plus entity declarations.
//!
//! ```toml
//! [inits]
//! default = "eager"
//! max_depth = 2 # or "unbounded"
//!
//! [inits.overrides]
//! "UserLoanHistory.user" = "eager"
//!
//! [[entity]]
//! name = "User"
//!
//! [[entity.attribute]]
//! name = "name"
//! type = "string"
//!
//! [[entity.attribute]]
//! name = "user_loan_histories"
//! list = "UserLoanHistory"
//! ```

use std::fs;
use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;
use crate::inits::{InitsConfig, PathInits};
use crate::registry::builtin_schema;
use crate::schema::{EntitySchema, Schema, SchemaPaths};

/// Environment variable the CLI reads the configuration path from.
pub const CONFIG_ENV: &str = "ENTIPATH_CONFIG";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default)]
    pub inits: InitsConfig,
    #[serde(default, rename = "entity")]
    pub entities: Vec<EntitySchema>,
}

impl PathsConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&source)?;
        debug!("loaded {} entities from {}", config.entities.len(), path.display());
        Ok(config)
    }

    /// Default policy over the schema of the registered typed entity paths.
    pub fn builtin() -> Self {
        Self {
            inits: InitsConfig::default(),
            entities: builtin_schema().entities,
        }
    }

    pub fn schema(&self) -> Schema {
        Schema {
            entities: self.entities.clone(),
        }
    }

    pub fn path_inits(&self) -> PathInits {
        PathInits::new(self.inits.clone())
    }

    /// Validates the schema and builds the path context.
    pub fn into_paths(self) -> Result<SchemaPaths, ConfigError> {
        let inits = self.path_inits();
        let schema = Schema {
            entities: self.entities,
        };
        Ok(SchemaPaths::new(schema, inits)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::SchemaError;
    use crate::inits::Expansion;
    use crate::path::Path as _;
    use std::io::Write;

    const LIBRARY: &str = r#"
        [inits]
        max_depth = 1

        [inits.overrides]
        "UserLoanHistory.user" = "eager"

        [[entity]]
        name = "User"

        [[entity.attribute]]
        name = "name"
        type = "string"

        [[entity.attribute]]
        name = "user_loan_histories"
        list = "UserLoanHistory"

        [[entity]]
        name = "UserLoanHistory"
        variable = "loan"

        [[entity.attribute]]
        name = "user"
        reference = "User"
    "#;

    #[test]
    fn parses_inits_and_entities() {
        let config = PathsConfig::from_toml_str(LIBRARY).unwrap();
        assert_eq!(config.inits.max_depth, Some(1));
        assert_eq!(config.inits.overrides.get("UserLoanHistory.user"), Some(&Expansion::Eager));
        assert_eq!(config.entities.len(), 2);
        assert_eq!(config.schema().require("UserLoanHistory").unwrap().variable_name(), "loan");
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(LIBRARY.as_bytes()).unwrap();
        let paths = PathsConfig::load(file.path()).unwrap().into_paths().unwrap();
        let loan = paths.canonical("UserLoanHistory").unwrap();
        assert_eq!(loan.metadata().to_string(), "loan");
    }

    #[test]
    fn missing_file_reports_path() {
        let err = PathsConfig::load("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert_eq!(err.to_string(), "failed to read /definitely/not/here.toml");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn unbounded_policy_survives_a_round_trip() {
        let mut config = PathsConfig::builtin();
        config.inits.max_depth = None;
        let text = toml::to_string(&config).unwrap();
        let reloaded = PathsConfig::from_toml_str(&text).unwrap();
        assert_eq!(reloaded.inits.max_depth, None);
        assert_eq!(reloaded.path_inits().remaining_depth(), None);

        let written = PathsConfig::from_toml_str("[inits]\nmax_depth = \"unbounded\"").unwrap();
        assert_eq!(written.inits.max_depth, None);
    }

    #[test]
    fn invalid_schema_surfaces_as_config_error() {
        let config = PathsConfig::from_toml_str(
            r#"
            [[entity]]
            name = "A"

            [[entity.attribute]]
            name = "b"
            reference = "B"
            "#,
        )
        .unwrap();
        assert!(matches!(
            config.into_paths(),
            Err(ConfigError::Schema(SchemaError::UnknownTarget { .. }))
        ));
        assert!(matches!(
            PathsConfig::from_toml_str("[inits]\ndefault = 3"),
            Err(ConfigError::Parse(_))
        ));
    }
}
