//! Arena-backed display tree.
//!
//! Nodes live in a flat vector and are addressed by [`NodeId`]. Parents own
//! the ordered list of their children's ids; there are no back-references.
//! Detached nodes (a removed placeholder, say) stay in the arena but are no
//! longer reachable from any root.

use std::fmt;

use super::LoadContext;

/// Label of the temporary child shown under a collection that was not read yet.
pub const PLACEHOLDER_LABEL: &str = "Placeholder";

/// Type-safe index of a node in a [`DisplayTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What a node stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// A collection root; carries a [`LoadContext`].
    Collection,
    /// Stand-in child of a collection that has not been read.
    Placeholder,
    /// A promoted `_id` / `$id` field.
    Identity,
    /// A field name.
    Field,
    /// A rendered value.
    Value,
}

#[derive(Debug, Clone)]
pub struct TreeNode {
    label: String,
    kind: NodeKind,
    children: Vec<NodeId>,
    load: Option<LoadContext>,
}

impl TreeNode {
    fn new(label: String, kind: NodeKind, load: Option<LoadContext>) -> Self {
        Self { label, kind, children: Vec::new(), load }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn load_context(&self) -> Option<&LoadContext> {
        self.load.as_ref()
    }
}

#[derive(Debug, Clone, Default)]
pub struct DisplayTree {
    nodes: Vec<TreeNode>,
    roots: Vec<NodeId>,
}

impl DisplayTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Drop every node.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.roots.clear();
    }

    pub fn node(&self, id: NodeId) -> Option<&TreeNode> {
        self.nodes.get(id.0)
    }

    pub fn label(&self, id: NodeId) -> Option<&str> {
        self.node(id).map(TreeNode::label)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(TreeNode::children).unwrap_or(&[])
    }

    /// Labels of a node's children, in order.
    pub fn child_labels(&self, id: NodeId) -> Vec<&str> {
        self.children(id).iter().filter_map(|child| self.label(*child)).collect()
    }

    pub fn load_context(&self, id: NodeId) -> Option<&LoadContext> {
        self.node(id).and_then(TreeNode::load_context)
    }

    pub(crate) fn load_context_mut(&mut self, id: NodeId) -> Option<&mut LoadContext> {
        self.nodes.get_mut(id.0).and_then(|node| node.load.as_mut())
    }

    /// First root with the given label.
    pub fn find_root(&self, label: &str) -> Option<NodeId> {
        self.roots.iter().copied().find(|id| self.label(*id) == Some(label))
    }

    pub fn add_root(
        &mut self,
        label: impl Into<String>,
        kind: NodeKind,
        load: Option<LoadContext>,
    ) -> NodeId {
        let id = self.push(TreeNode::new(label.into(), kind, load));
        self.roots.push(id);
        id
    }

    /// Append a child to `parent`. Unknown parents leave the new node detached.
    pub fn add_child(
        &mut self,
        parent: NodeId,
        label: impl Into<String>,
        kind: NodeKind,
    ) -> NodeId {
        let id = self.push(TreeNode::new(label.into(), kind, None));
        if let Some(node) = self.nodes.get_mut(parent.0) {
            node.children.push(id);
        }
        id
    }

    /// Detach all children of a node.
    pub(crate) fn clear_children(&mut self, id: NodeId) {
        if let Some(node) = self.nodes.get_mut(id.0) {
            node.children.clear();
        }
    }

    /// Number of nodes reachable below `id`, excluding `id` itself.
    pub fn descendant_count(&self, id: NodeId) -> usize {
        let mut count = 0;
        let mut stack: Vec<NodeId> = self.children(id).to_vec();
        while let Some(next) = stack.pop() {
            count += 1;
            stack.extend_from_slice(self.children(next));
        }
        count
    }

    /// Sum over all roots of (descendants + 1).
    pub fn node_count(&self) -> usize {
        self.roots.iter().map(|root| self.descendant_count(*root) + 1).sum()
    }

    /// Move the top-level children of `subtree` under `parent` in one step.
    ///
    /// Returns the number of top-level children attached.
    pub fn graft(&mut self, parent: NodeId, subtree: Subtree) -> usize {
        let Subtree { tree, anchor } = subtree;
        let offset = self.nodes.len();

        // Every node except the anchor is copied, so ids past the anchor shift by one.
        let remap = |id: NodeId| -> NodeId {
            if id.0 < anchor.0 { NodeId(offset + id.0) } else { NodeId(offset + id.0 - 1) }
        };

        let top: Vec<NodeId> = tree.children(anchor).iter().copied().map(remap).collect();
        for (index, mut node) in tree.nodes.into_iter().enumerate() {
            if index == anchor.0 {
                continue;
            }
            node.children = node.children.into_iter().map(remap).collect();
            self.nodes.push(node);
        }

        let attached = top.len();
        if let Some(node) = self.nodes.get_mut(parent.0) {
            node.children.extend(top);
        }
        attached
    }

    fn push(&mut self, node: TreeNode) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }
}

/// A detached tree fragment built away from the live tree and attached later
/// with [`DisplayTree::graft`].
#[derive(Debug, Clone)]
pub struct Subtree {
    tree: DisplayTree,
    anchor: NodeId,
}

impl Subtree {
    /// New fragment whose anchor stands in for the eventual parent.
    pub fn new(label: impl Into<String>) -> Self {
        let mut tree = DisplayTree::new();
        let anchor = tree.add_root(label, NodeKind::Collection, None);
        Self { tree, anchor }
    }

    pub fn anchor(&self) -> NodeId {
        self.anchor
    }

    pub fn tree(&self) -> &DisplayTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut DisplayTree {
        &mut self.tree
    }

    /// Number of top-level children.
    pub fn len(&self) -> usize {
        self.tree.children(self.anchor).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
