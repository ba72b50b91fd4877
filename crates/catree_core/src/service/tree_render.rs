//! Indented text rendering of a flat category list.
//!
//! # Responsibility
//! - Turn store output into the `- name` bullet tree shown to users.
//!
//! # Invariants
//! - Pure: no I/O, no logging, output depends only on the input slice.
//! - Siblings keep their relative input order (stable grouping, no sorting).
//! - Each depth level adds exactly two spaces before the `- ` bullet.
//! - Empty input renders as the empty string.

use crate::model::category::{Category, CategoryId};
use std::collections::HashMap;

const BULLET: &str = "- ";
const INDENT: &str = "  ";

/// Renders `categories` as an indented tree, roots first.
///
/// Categories whose parent is absent from `categories` are unreachable from
/// any root and are not rendered.
pub fn render_tree(categories: &[Category]) -> String {
    let children = index_by_parent(categories);
    let mut output = String::new();
    render_level(&children, None, "", &mut output);
    output
}

fn index_by_parent(categories: &[Category]) -> HashMap<Option<CategoryId>, Vec<&Category>> {
    let mut children: HashMap<Option<CategoryId>, Vec<&Category>> = HashMap::new();
    for category in categories {
        children.entry(category.parent_id).or_default().push(category);
    }
    children
}

fn render_level(
    children: &HashMap<Option<CategoryId>, Vec<&Category>>,
    parent_id: Option<CategoryId>,
    prefix: &str,
    output: &mut String,
) {
    let Some(level) = children.get(&parent_id) else {
        return;
    };

    let child_prefix = format!("{prefix}{INDENT}");
    for category in level {
        output.push_str(prefix);
        output.push_str(BULLET);
        output.push_str(&category.name);
        output.push('\n');
        render_level(children, Some(category.id), &child_prefix, output);
    }
}
