// Display tree data structures

mod load_context;
mod tree;

pub use load_context::{LoadContext, LoadState, StoreSource};
pub use tree::{DisplayTree, NodeId, NodeKind, PLACEHOLDER_LABEL, Subtree, TreeNode};
