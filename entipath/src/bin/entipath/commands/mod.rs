pub mod paths;
pub mod schema;

use std::path::Path;

use anyhow::{Context, Result};
use entipath::PathsConfig;

use crate::output::OutputManager;

/// Loads the configuration file, or the registered typed paths when none is given.
pub fn load_config(path: Option<&Path>, output: &OutputManager) -> Result<PathsConfig> {
    match path {
        Some(path) => {
            output.verbose(&format!("Loading configuration from {}", path.display()));
            PathsConfig::load(path).with_context(|| {
                format!("Failed to load configuration from {}", path.display())
            })
        }
        None => {
            output.verbose("No configuration given, using the built-in library schema");
            Ok(PathsConfig::builtin())
        }
    }
}
