use anyhow::Result;
use comfy_table::{Cell, Table};
use entipath::{EntitySchema, PathsConfig};
use serde::Serialize;

use crate::examples::ExampleGroup;
use crate::output::{OutputManager, TableDisplay};

pub const ENTITIES_EXAMPLES: &[ExampleGroup] = &[ExampleGroup {
    title: "List Entities",
    commands: &[
        "entipath entities                          # Built-in library schema",
        "entipath --config paths.toml entities      # Entities declared in a config file",
        "entipath --output json entities            # Machine-readable listing",
    ],
}];

pub const VALIDATE_EXAMPLES: &[ExampleGroup] = &[ExampleGroup {
    title: "Validate Schema",
    commands: &[
        "entipath --config paths.toml validate      # Report every schema problem",
        "ENTIPATH_CONFIG=paths.toml entipath validate",
    ],
}];

#[derive(Debug, Serialize)]
pub struct EntityRow {
    pub name: String,
    pub variable: String,
    pub attributes: usize,
    pub associations: Vec<String>,
}

impl From<&EntitySchema> for EntityRow {
    fn from(entity: &EntitySchema) -> Self {
        Self {
            name: entity.name.clone(),
            variable: entity.variable_name(),
            attributes: entity.attributes.len(),
            associations: entity
                .attributes
                .iter()
                .filter_map(|attribute| {
                    let label = attribute.kind.label();
                    attribute
                        .kind
                        .target()
                        .map(|target| format!("{} ({label} {target})", attribute.name))
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct EntityListing(pub Vec<EntityRow>);

impl TableDisplay for EntityListing {
    fn to_table(&self, output: &OutputManager) -> Table {
        let mut table = output.create_table();
        output.add_table_header(&mut table, &["Entity", "Variable", "Attributes", "Associations"]);
        for row in &self.0 {
            table.add_row(vec![
                Cell::new(&row.name),
                Cell::new(&row.variable),
                Cell::new(row.attributes),
                Cell::new(row.associations.join("\n")),
            ]);
        }
        table
    }

    fn to_compact(&self) -> String {
        self.0
            .iter()
            .map(|row| format!("{}:{}", row.name, row.attributes))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub entities: usize,
    pub problems: Vec<String>,
}

impl TableDisplay for ValidationReport {
    fn to_table(&self, output: &OutputManager) -> Table {
        let mut table = output.create_table();
        output.add_table_header(&mut table, &["#", "Problem"]);
        for (index, problem) in self.problems.iter().enumerate() {
            table.add_row(vec![Cell::new(index + 1), Cell::new(problem)]);
        }
        table
    }

    fn to_compact(&self) -> String {
        if self.valid {
            format!("valid entities={}", self.entities)
        } else {
            format!("invalid problems={}", self.problems.len())
        }
    }
}

pub fn handle_entities(config: &PathsConfig, output: &OutputManager) -> Result<()> {
    let schema = config.schema();
    if schema.is_empty() {
        output.warning("No entities declared");
        return Ok(());
    }
    output.heading("Entities");
    output.display(&EntityListing(schema.entities.iter().map(EntityRow::from).collect()))
}

pub fn handle_validate(config: &PathsConfig, output: &OutputManager) -> Result<()> {
    let schema = config.schema();
    let problems: Vec<String> = schema.problems().iter().map(ToString::to_string).collect();
    let report = ValidationReport {
        valid: problems.is_empty(),
        entities: schema.entities.len(),
        problems,
    };

    if report.valid {
        if output.is_json() {
            output.display(&report)?;
        } else {
            output.success(&format!("Schema is valid ({} entities)", report.entities));
            for name in schema.entity_names() {
                output.bullet(name);
            }
        }
        return Ok(());
    }

    output.heading("Schema Problems");
    output.display(&report)?;
    anyhow::bail!("schema has {} problem(s)", report.problems.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use entipath::{AttributeKind, ScalarType};

    #[test]
    fn entity_row_lists_associations() {
        let entity = EntitySchema::new("User")
            .scalar("name", ScalarType::String)
            .list("user_loan_histories", "UserLoanHistory");
        let row = EntityRow::from(&entity);
        assert_eq!(row.variable, "user");
        assert_eq!(row.attributes, 2);
        assert_eq!(row.associations, ["user_loan_histories (list UserLoanHistory)"]);
        assert!(matches!(entity.attributes[1].kind, AttributeKind::List(_)));
    }

    #[test]
    fn compact_listing() {
        let book = EntitySchema::new("Book").scalar("id", ScalarType::Int64);
        let listing = EntityListing(vec![EntityRow::from(&book)]);
        assert_eq!(listing.to_compact(), "Book:1");
    }
}
