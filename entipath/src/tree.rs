//! Flattened view of an entity path's attribute tree, for diagnostics and the CLI.

use std::fmt::Write as _;

use serde::Serialize;

use crate::association::AssociationState;
use crate::entity::{AttributeCategory, EntityPathBase};
use crate::metadata::PathKey;
use crate::path::Path;

/// One attribute in a walked tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeEntry {
    pub path: String,
    pub attribute: String,
    pub type_tag: String,
    pub category: AttributeCategory,
    /// State of the association when it was reached, before any forced expansion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<AssociationState>,
    pub depth: usize,
    pub key: PathKey,
}

/// Walks every attribute reachable from `root` without building anything deferred beyond
/// `expand` levels.
///
/// Built associations are always descended into. A deferred association is expanded (and
/// descended into) only while the forced-expansion budget lasts; each forced expansion spends
/// one level for the subtree below it.
pub fn walk(root: &EntityPathBase, expand: usize) -> Vec<TreeEntry> {
    let mut entries = Vec::new();
    walk_into(root, expand, 0, &mut entries);
    entries
}

fn walk_into(base: &EntityPathBase, expand: usize, depth: usize, entries: &mut Vec<TreeEntry>) {
    for attribute in base.attributes() {
        let association = attribute.association();
        let state = association.map(|association| association.state());
        entries.push(TreeEntry {
            path: attribute.node().to_string(),
            attribute: attribute.name().to_string(),
            type_tag: attribute.type_tag().to_string(),
            category: attribute.category(),
            state,
            depth,
            key: attribute.node().identity_key(),
        });

        let Some(association) = association else {
            continue;
        };
        if let Some(child) = association.peek_base() {
            walk_into(child, expand, depth + 1, entries);
        } else if expand > 0 {
            walk_into(association.expand_base(), expand - 1, depth + 1, entries);
        }
    }
}

/// Indented text rendering of walked entries.
pub fn render(entries: &[TreeEntry]) -> String {
    let mut out = String::new();
    for entry in entries {
        let indent = "  ".repeat(entry.depth);
        let _ = write!(out, "{indent}{} : {}", entry.attribute, entry.type_tag);
        if let Some(state) = entry.state {
            let _ = write!(out, " [{state}]");
        }
        out.push('\n');
    }
    out
}
