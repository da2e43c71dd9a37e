use anyhow::{Context, Result};
use comfy_table::{Cell, Table};
use entipath::path::Path;
use entipath::tree::{self, TreeEntry};
use entipath::{PathKey, PathKind, PathsConfig, SchemaPaths};
use serde::Serialize;

use crate::examples::ExampleGroup;
use crate::output::{OutputFormat, OutputManager, TableDisplay};

pub const TREE_EXAMPLES: &[ExampleGroup] = &[ExampleGroup {
    title: "Path Trees",
    commands: &[
        "entipath tree User                         # Eager attributes, deferred edges collapsed",
        "entipath tree User --alias u1              # Same tree rooted at another variable",
        "entipath tree UserLoanHistory --expand 2   # Force two levels of deferred edges",
    ],
}];

pub const KEY_EXAMPLES: &[ExampleGroup] = &[ExampleGroup {
    title: "Identity Keys",
    commands: &[
        "entipath key User name",
        "entipath key User user_loan_histories.any.user.name",
        "entipath key User user_loan_histories.0.status --alias u2",
    ],
}];

#[derive(Debug, Serialize)]
pub struct TreeView {
    pub entity: String,
    pub variable: String,
    pub expand: usize,
    pub entries: Vec<TreeEntry>,
}

impl TableDisplay for TreeView {
    fn to_table(&self, output: &OutputManager) -> Table {
        let mut table = output.create_table();
        output.add_table_header(&mut table, &["Path", "Type", "Category", "State"]);
        for entry in &self.entries {
            let indent = "  ".repeat(entry.depth);
            table.add_row(vec![
                Cell::new(format!("{indent}{}", entry.path)),
                Cell::new(&entry.type_tag),
                Cell::new(entry.category.as_str()),
                output.state_cell(entry.state),
            ]);
        }
        table
    }

    fn to_compact(&self) -> String {
        tree::render(&self.entries)
    }
}

#[derive(Debug, Serialize)]
pub struct KeyView {
    pub entity: String,
    pub path: String,
    pub metadata: String,
    pub kind: PathKind,
    pub type_tag: String,
    pub depth: usize,
    pub key: PathKey,
}

impl TableDisplay for KeyView {
    fn to_table(&self, output: &OutputManager) -> Table {
        let mut table = output.create_table();
        output.add_table_header(&mut table, &["Field", "Value"]);
        table.add_row(vec![Cell::new("Entity"), Cell::new(&self.entity)]);
        table.add_row(vec![Cell::new("Path"), Cell::new(&self.metadata)]);
        table.add_row(vec![Cell::new("Kind"), Cell::new(self.kind.as_str())]);
        table.add_row(vec![Cell::new("Type"), Cell::new(&self.type_tag)]);
        table.add_row(vec![Cell::new("Depth"), Cell::new(self.depth)]);
        table.add_row(vec![Cell::new("Key"), Cell::new(self.key)]);
        table
    }

    fn to_compact(&self) -> String {
        format!("{} {}", self.metadata, self.key)
    }
}

fn build_paths(config: PathsConfig) -> Result<SchemaPaths> {
    config.into_paths().context("Configured schema is invalid")
}

fn variable_for(paths: &SchemaPaths, entity: &str, alias: Option<String>) -> Result<String> {
    if let Some(alias) = alias {
        return Ok(alias);
    }
    Ok(paths.schema().require(entity)?.variable_name())
}

pub fn handle_tree(
    config: PathsConfig,
    entity: &str,
    alias: Option<String>,
    expand: usize,
    output: &OutputManager,
) -> Result<()> {
    let paths = build_paths(config)?;
    let variable = variable_for(&paths, entity, alias)?;
    let root = paths
        .root(entity, &variable)
        .with_context(|| format!("Cannot build a path for entity '{entity}'"))?;
    output.verbose(&format!("max_depth = {:?}", paths.inits().config().max_depth));

    let view = TreeView {
        entity: entity.to_string(),
        variable,
        expand,
        entries: tree::walk(&root, expand),
    };

    if output.options.output_format == OutputFormat::Table {
        output.heading(&format!("{} {} {}", view.entity, crate::theme::ICONS.arrow, view.variable));
    }
    output.display(&view)?;

    let deferred = view
        .entries
        .iter()
        .filter(|entry| entry.state.is_some_and(|state| !state.is_built()))
        .count();
    if deferred > 0 {
        output.info(&format!(
            "{deferred} deferred association(s); pass --expand to build them"
        ));
    }
    Ok(())
}

pub fn handle_key(
    config: PathsConfig,
    entity: &str,
    path: &str,
    alias: Option<String>,
    output: &OutputManager,
) -> Result<()> {
    let paths = build_paths(config)?;
    let variable = variable_for(&paths, entity, alias)?;
    let root = paths.root(entity, &variable)?;
    let node = root
        .resolve(path)
        .with_context(|| format!("Cannot resolve '{path}' on entity '{entity}'"))?;

    let metadata = node.metadata();
    let view = KeyView {
        entity: entity.to_string(),
        path: path.to_string(),
        metadata: metadata.to_string(),
        kind: metadata.kind(),
        type_tag: node.type_tag().to_string(),
        depth: metadata.depth(),
        key: node.identity_key(),
    };

    if output.options.output_format == OutputFormat::Table {
        output.key_value(&view.path, &view.metadata);
    }
    output.display(&view)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::GlobalOptions;

    fn quiet() -> OutputManager {
        OutputManager::new(GlobalOptions {
            quiet: true,
            ..Default::default()
        })
    }

    #[test]
    fn tree_of_builtin_user() {
        let alias = Some("u1".to_string());
        assert!(handle_tree(PathsConfig::builtin(), "User", alias, 1, &quiet()).is_ok());
        assert!(handle_tree(PathsConfig::builtin(), "Nope", None, 0, &quiet()).is_err());
    }

    #[test]
    fn key_resolves_through_collections() {
        let output = quiet();
        let path = "user_loan_histories.any.user.name";
        assert!(handle_key(PathsConfig::builtin(), "User", path, None, &output).is_ok());
        assert!(handle_key(PathsConfig::builtin(), "User", "name.first", None, &output).is_err());
    }
}
