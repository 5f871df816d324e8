//! Collection loading.

use crate::error::Result;
use crate::models::Subtree;
use crate::store::StoreHandle;
use crate::value::ValueRenderer;

use super::Materializer;

/// Read every item of `collection` and materialize it into a detached
/// [`Subtree`] whose anchor stands for the collection root.
///
/// Documents attach their nodes directly under the anchor; bare values add
/// one leaf each. Storage errors are returned unchanged and nothing partial
/// escapes: the caller grafts the subtree only on success.
pub fn load_collection(
    store: &dyn StoreHandle,
    collection: &str,
    renderer: &ValueRenderer,
) -> Result<Subtree> {
    let mut subtree = Subtree::new(collection);
    let anchor = subtree.anchor();
    let materializer = Materializer::new(renderer);

    let mut items = 0usize;
    for item in store.read_all(collection)? {
        let value = item?;
        materializer.value(subtree.tree_mut(), anchor, &value);
        items += 1;
    }

    log::debug!("Materialized {items} items from {collection} into {} nodes", subtree.len());
    Ok(subtree)
}
