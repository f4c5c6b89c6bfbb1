#![forbid(unsafe_code)]

//! Hierarchical source resolution.
//!
//! Given the target of a binding directive, find the node that should act
//! as the binding's source. The lookup is a chain of responsibility over
//! the node hierarchy:
//!
//! 1. an explicit source override wins at any link;
//! 2. a [`NodeKind::Scope`] link is a resolution terminal and answers with
//!    itself;
//! 3. a [`NodeKind::Nested`] link defers to its structural parent;
//! 4. a [`NodeKind::Plain`] link, or a nested link whose parent is not
//!    attached, ends the chain unresolved.
//!
//! Resolution is re-run fresh on every attempt — overrides and parent links
//! change dynamically, so nothing here is cached.

use tracing::trace;

use tether_core::{Node, NodeKind, PropPath};

/// Resolve the source node for a binding on `node`, or `None` if the chain
/// exhausts without a terminal. `key` is the right-hand property path the
/// binding will read; the default chain does not consult it, but it is part
/// of the lookup contract so custom hierarchies can route by property.
#[must_use]
pub fn resolve_source(node: &Node, key: &PropPath) -> Option<Node> {
    if let Some(source) = node.source_override() {
        trace!(key = %key, "resolved via explicit override");
        return Some(source);
    }
    match node.kind() {
        NodeKind::Scope => {
            trace!(key = %key, "resolved at scope terminal");
            Some(node.clone())
        }
        NodeKind::Nested => match node.structural_parent() {
            Some(parent) => resolve_source(&parent, key),
            None => None,
        },
        NodeKind::Plain => None,
    }
}
