//! Error aggregation: turns cached failure codes into display strings.
//!
//! Traversal comes from [`FormTree::walk`]; the policy here decides which
//! nodes are shown and how their codes become text.

use std::collections::BTreeMap;

use crate::catalog::MessageCatalog;
use crate::tree::{FieldNode, FormTree, NodeRef};
use crate::validators::FailureCode;

/// Whether a node's failures may be shown yet.
///
/// This is the legacy rule as it behaves, not as it may have been meant:
/// touched, dirty, or holding any value at all. A group's value is
/// structured and always counts as present.
pub fn is_eligible(node: &FieldNode) -> bool {
    node.is_touched() || node.is_dirty() || node.has_value()
}

/// Resolve `codes` for `field` through the catalog and join them with a
/// space, in validator order. A code with no message yields a visible
/// placeholder and an error log.
pub fn resolve_messages(field: &str, codes: &[FailureCode], catalog: &MessageCatalog) -> String {
    codes
        .iter()
        .map(|code| match catalog.message(field, *code) {
            Some(message) => message.to_string(),
            None => {
                tracing::error!(field, code = %code, "No validation message for failure code");
                format!("[missing message: {field}.{code}]")
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn displayable<'a>(tree: &'a FormTree) -> impl Iterator<Item = NodeRef<'a>> {
    tree.walk()
        .into_iter()
        .filter(|n| !n.node.errors().is_empty() && is_eligible(n.node))
}

/// Field name → message for every eligible failing node.
///
/// Collection elements share field names; the first failing element in walk
/// order supplies the entry. Use [`collect_path_errors`] to see each one.
pub fn collect_errors(tree: &FormTree, catalog: &MessageCatalog) -> BTreeMap<String, String> {
    let mut errors = BTreeMap::new();
    for node in displayable(tree) {
        errors
            .entry(node.name.clone())
            .or_insert_with(|| resolve_messages(&node.name, node.node.errors(), catalog));
    }
    errors
}

/// Like [`collect_errors`] but keyed by full path (`skills.1.skillName`).
pub fn collect_path_errors(tree: &FormTree, catalog: &MessageCatalog) -> BTreeMap<String, String> {
    displayable(tree)
        .map(|node| {
            let message = resolve_messages(&node.name, node.node.errors(), catalog);
            (node.path, message)
        })
        .collect()
}
