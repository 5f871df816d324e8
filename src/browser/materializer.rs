//! Document-to-tree materialization.

use bson::{Bson, Document};

use crate::models::{DisplayTree, NodeId, NodeKind};
use crate::value::{Rendered, ValueRenderer, identity_field, identity_label};

/// Turns document values into display nodes.
#[derive(Debug, Clone, Copy)]
pub struct Materializer<'r> {
    renderer: &'r ValueRenderer,
}

impl<'r> Materializer<'r> {
    pub fn new(renderer: &'r ValueRenderer) -> Self {
        Self { renderer }
    }

    /// Attach the display form of `value` under `parent`.
    ///
    /// Documents expand into their fields; other values become a single leaf,
    /// or nothing at all when the value has no display form.
    pub fn value(&self, tree: &mut DisplayTree, parent: NodeId, value: &Bson) {
        match self.renderer.render(value) {
            Rendered::Leaf(label) => {
                tree.add_child(parent, label, NodeKind::Value);
            }
            Rendered::Nested(doc) => self.document(tree, parent, doc),
            Rendered::Nothing => {
                log::trace!("No display form for {:?}; skipping", value.element_type());
            }
        }
    }

    /// Attach the fields of `doc` under `parent`.
    ///
    /// An `_id` (or else `$id`) field becomes an identity node under
    /// `parent`, and the remaining fields hang below that node instead.
    pub fn document(&self, tree: &mut DisplayTree, parent: NodeId, doc: &Document) {
        let identity = identity_field(doc);
        let attach_to = match identity {
            Some((name, value)) => {
                tree.add_child(parent, identity_label(name, value), NodeKind::Identity)
            }
            None => parent,
        };
        let skip = identity.map(|(name, _)| name);

        for (key, value) in doc.iter() {
            if Some(key.as_str()) == skip {
                continue;
            }
            let field = tree.add_child(attach_to, key.clone(), NodeKind::Field);
            self.value(tree, field, value);
        }
    }
}
