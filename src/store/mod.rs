//! Document-store collaborator.
//!
//! This module provides:
//! - `StoreOpener` / `StoreHandle`: the interface the tree browser consumes
//! - `FileStore`: the on-disk store format (optionally password protected)
//! - `StoreWriter`: builds store files
//! - `MemoryStore`: in-memory stores for embedding and tests

mod file;
mod format;
mod memory;
mod writer;

use std::path::Path;
use std::sync::Arc;

use bson::Bson;

use crate::error::Result;

pub use file::{CollectionInfo, FileStore, FileStoreOpener};
pub use memory::{MemoryStore, MemoryStoreOpener};
pub use writer::StoreWriter;

/// Items of one collection, in stored order. Finite and not restartable;
/// reading again means calling [`StoreHandle::read_all`] again.
pub type ItemStream<'a> = Box<dyn Iterator<Item = Result<Bson>> + Send + 'a>;

/// Result of inspecting a file without a password.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreProbe {
    /// Not a recognized store container.
    NotAStore,
    /// A store that needs a password.
    Locked,
    /// A store that opens without a password.
    Open,
}

/// An opened, validated store. Read-only.
pub trait StoreHandle: Send + Sync {
    /// Collection names in the order the store keeps them.
    fn list_collections(&self) -> Result<Vec<String>>;

    /// All items of a collection.
    ///
    /// Returns `Error::UnknownCollection` if the name is not in the catalog.
    /// Items are usually documents but may be bare values.
    fn read_all(&self, collection: &str) -> Result<ItemStream<'_>>;
}

/// Opens stores by path.
pub trait StoreOpener: Send + Sync {
    /// Classify a file without opening it fully.
    fn probe(&self, path: &Path) -> Result<StoreProbe>;

    /// Open and validate a store.
    ///
    /// Fails with `Error::NotAStore` for foreign files and
    /// `Error::WrongPassword` when a protected store is opened with a missing
    /// or incorrect password.
    fn open(&self, path: &Path, password: Option<&str>) -> Result<Arc<dyn StoreHandle>>;
}
