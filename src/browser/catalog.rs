use crate::error::Result;
use crate::store::StoreHandle;

/// Collection names of an opened store, in the order the store reports them.
pub fn list_collections(store: &dyn StoreHandle) -> Result<Vec<String>> {
    let names = store.list_collections()?;
    log::debug!("Catalog lists {} collections", names.len());
    Ok(names)
}

#[cfg(test)]
mod tests {
    use bson::Bson;

    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn keeps_store_order() {
        let store = MemoryStore::new()
            .with_collection("zeta", Vec::<Bson>::new())
            .with_collection("alpha", Vec::<Bson>::new())
            .with_collection("mid", Vec::<Bson>::new());
        assert_eq!(list_collections(&store).unwrap(), vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn empty_store_has_no_collections() {
        assert!(list_collections(&MemoryStore::new()).unwrap().is_empty());
    }
}
