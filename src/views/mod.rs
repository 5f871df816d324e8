//! Terminal rendering of the display tree.

pub mod outline;

pub use outline::{OutlineRow, node_count_line, render_collections, render_outline, visible_rows};
