//! Plain-text outline of the display tree.
//!
//! Rows are flattened depth-first. Collection roots are marked `+` while
//! collapsed (or failed) and `-` once expanded; placeholders are never shown.

use std::fmt::Write as _;

use crate::helpers::format_count;
use crate::models::{DisplayTree, LoadState, NodeId, NodeKind};

const INDENT: &str = "  ";

/// One printed line of the outline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineRow {
    pub node: NodeId,
    /// 0 for collection roots.
    pub depth: usize,
    pub label: String,
    /// Whether the node has (or may load) children.
    pub is_folder: bool,
    pub is_expanded: bool,
    /// Failure reason of a root whose last load failed.
    pub failure: Option<String>,
}

/// Flatten `tree` into rows in display order.
pub fn visible_rows(tree: &DisplayTree) -> Vec<OutlineRow> {
    let mut rows = Vec::with_capacity(tree.node_count());
    let mut stack: Vec<(NodeId, usize)> = tree.roots().iter().rev().map(|id| (*id, 0)).collect();

    while let Some((id, depth)) = stack.pop() {
        let Some(node) = tree.node(id) else { continue };
        if node.kind() == NodeKind::Placeholder {
            continue;
        }

        let (is_folder, is_expanded, failure) = match node.load_context().map(|ctx| ctx.state()) {
            Some(LoadState::Collapsed) => (true, false, None),
            Some(LoadState::Failed { reason }) => (true, false, Some(reason.clone())),
            Some(LoadState::Loading | LoadState::Loaded) => (true, true, None),
            None => (!node.children().is_empty(), true, None),
        };
        rows.push(OutlineRow {
            node: id,
            depth,
            label: node.label().to_string(),
            is_folder,
            is_expanded,
            failure,
        });

        stack.extend(node.children().iter().rev().map(|child| (*child, depth + 1)));
    }
    rows
}

/// Render the whole tree, one row per line.
pub fn render_outline(tree: &DisplayTree) -> String {
    let mut out = String::new();
    for row in visible_rows(tree) {
        let marker = match (row.is_folder, row.is_expanded) {
            (false, _) => " ",
            (true, false) => "+",
            (true, true) => "-",
        };
        let _ = write!(out, "{}{marker} {}", INDENT.repeat(row.depth), row.label);
        if let Some(reason) = &row.failure {
            let _ = write!(out, " (failed: {reason})");
        }
        out.push('\n');
    }
    out
}

/// Numbered list of collection roots with their load state.
pub fn render_collections(tree: &DisplayTree) -> String {
    let mut out = String::new();
    for (index, root) in tree.roots().iter().enumerate() {
        let label = tree.label(*root).unwrap_or_default();
        let state = match tree.load_context(*root).map(|ctx| ctx.state()) {
            Some(LoadState::Loaded) => {
                format!("{} nodes", format_count(tree.descendant_count(*root)))
            }
            Some(LoadState::Loading) => "loading".to_string(),
            Some(LoadState::Failed { reason }) => format!("failed: {reason}"),
            Some(LoadState::Collapsed) | None => "not loaded".to_string(),
        };
        let _ = writeln!(out, "#{index} {label} ({state})");
    }
    out
}

pub fn node_count_line(count: usize) -> String {
    format!("Current node count: {}", format_count(count))
}
