//! Lazy expansion of collection roots.
//!
//! Every collection root starts `Collapsed` with a single placeholder child.
//! The first expansion request removes the placeholder, moves the node to
//! `Loading`, reads the collection and grafts the result in one batch
//! (`Loaded`). A failed read moves the node to `Failed` and puts the
//! placeholder back, so a later request can retry. `Loaded` and `Loading`
//! nodes, and nodes without a load context, never trigger a read.

use std::sync::Arc;

use crate::error::Result;
use crate::models::{
    DisplayTree, LoadContext, LoadState, NodeId, NodeKind, PLACEHOLDER_LABEL, StoreSource,
    Subtree,
};
use crate::store::StoreHandle;
use crate::value::ValueRenderer;

use super::load_collection;

/// Outcome of an expansion request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expansion {
    /// The collection was read; `children` nodes now hang under the root.
    Loaded { children: usize },
    /// Already loaded earlier; nothing happened.
    AlreadyLoaded,
    /// A load is running for this node; nothing happened.
    InProgress,
    /// The node is not lazily loadable (a value node, say).
    NotExpandable,
}

/// What a caller must fetch to finish a started expansion.
#[derive(Debug, Clone)]
pub struct LoadRequest {
    pub node: NodeId,
    pub source: Arc<StoreSource>,
    pub collection: String,
}

/// Either work to do or the reason there is none.
#[derive(Debug, Clone)]
pub enum Begin {
    Load(LoadRequest),
    Skip(Expansion),
}

/// Add a collection root in the `Collapsed` state.
pub fn add_collection_root(
    tree: &mut DisplayTree,
    collection: &str,
    source: Arc<StoreSource>,
) -> NodeId {
    let context = LoadContext::new(source, collection);
    let root = tree.add_root(collection, NodeKind::Collection, Some(context));
    tree.add_child(root, PLACEHOLDER_LABEL, NodeKind::Placeholder);
    root
}

/// Start expanding `node`: check the guard, drop the placeholder and enter `Loading`.
pub fn begin(tree: &mut DisplayTree, node: NodeId) -> Begin {
    let Some(context) = tree.load_context_mut(node) else {
        return Begin::Skip(Expansion::NotExpandable);
    };
    match context.state() {
        LoadState::Loaded => return Begin::Skip(Expansion::AlreadyLoaded),
        LoadState::Loading => return Begin::Skip(Expansion::InProgress),
        LoadState::Collapsed | LoadState::Failed { .. } => {}
    }

    context.set_state(LoadState::Loading);
    let request = LoadRequest {
        node,
        source: context.source().clone(),
        collection: context.collection().to_string(),
    };
    tree.clear_children(node);
    log::info!("Loading collection {}", request.collection);
    Begin::Load(request)
}

/// Finish a started expansion with the outcome of the read.
///
/// On success the subtree is attached and the node is `Loaded`. On failure
/// the node becomes `Failed`, the placeholder returns and the error is
/// handed back to the caller.
pub fn complete(
    tree: &mut DisplayTree,
    node: NodeId,
    outcome: Result<Subtree>,
) -> Result<Expansion> {
    match outcome {
        Ok(subtree) => {
            let children = tree.graft(node, subtree);
            if let Some(context) = tree.load_context_mut(node) {
                context.set_state(LoadState::Loaded);
                log::info!("Loaded collection {} ({children} nodes)", context.collection());
            }
            Ok(Expansion::Loaded { children })
        }
        Err(err) => {
            if let Some(context) = tree.load_context_mut(node) {
                log::error!("Failed to load collection {}: {err}", context.collection());
                context.set_state(LoadState::Failed { reason: err.to_string() });
            }
            tree.clear_children(node);
            tree.add_child(node, PLACEHOLDER_LABEL, NodeKind::Placeholder);
            Err(err)
        }
    }
}

/// Expand `node` synchronously.
///
/// `resolve` supplies the store handle for the node's source and is only
/// called when a read is actually needed.
pub fn expand<F>(
    tree: &mut DisplayTree,
    node: NodeId,
    renderer: &ValueRenderer,
    resolve: F,
) -> Result<Expansion>
where
    F: FnOnce(&StoreSource) -> Result<Arc<dyn StoreHandle>>,
{
    let request = match begin(tree, node) {
        Begin::Load(request) => request,
        Begin::Skip(outcome) => return Ok(outcome),
    };
    let outcome = resolve(&request.source)
        .and_then(|store| load_collection(store.as_ref(), &request.collection, renderer));
    complete(tree, node, outcome)
}
