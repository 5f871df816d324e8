//! In-memory stores for embedding and tests.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use bson::Bson;
use parking_lot::{Mutex, RwLock};

use crate::error::{Error, Result};

use super::{ItemStream, StoreHandle, StoreOpener, StoreProbe};

/// A store held entirely in memory.
///
/// Counts [`StoreHandle::read_all`] calls and can be told to fail reads of a
/// collection, which makes it handy for exercising load behaviour.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: Vec<(String, Vec<Bson>)>,
    password: Option<String>,
    reads: AtomicUsize,
    failing: Mutex<HashSet<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn with_collection<I, T>(mut self, name: impl Into<String>, items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Bson>,
    {
        self.collections.push((name.into(), items.into_iter().map(Into::into).collect()));
        self
    }

    /// Number of `read_all` calls so far, failed ones included.
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Make reads of `collection` fail until [`MemoryStore::heal`] is called.
    pub fn fail_reads(&self, collection: &str) {
        self.failing.lock().insert(collection.to_string());
    }

    pub fn heal(&self, collection: &str) {
        self.failing.lock().remove(collection);
    }

    fn accepts(&self, password: Option<&str>) -> bool {
        match &self.password {
            Some(expected) => password == Some(expected.as_str()),
            None => true,
        }
    }
}

impl StoreHandle for MemoryStore {
    fn list_collections(&self) -> Result<Vec<String>> {
        Ok(self.collections.iter().map(|(name, _)| name.clone()).collect())
    }

    fn read_all(&self, collection: &str) -> Result<ItemStream<'_>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.failing.lock().contains(collection) {
            return Err(Error::Corrupt(format!("injected read failure for {collection}")));
        }
        let (_, items) = self
            .collections
            .iter()
            .find(|(name, _)| name == collection)
            .ok_or_else(|| Error::UnknownCollection(collection.to_string()))?;
        Ok(Box::new(items.iter().cloned().map(Ok)))
    }
}

/// Resolves paths to registered [`MemoryStore`]s; unknown paths are not stores.
#[derive(Debug, Default)]
pub struct MemoryStoreOpener {
    stores: RwLock<HashMap<PathBuf, Arc<MemoryStore>>>,
    opens: AtomicUsize,
}

impl MemoryStoreOpener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a store under `path`, returning a handle to it.
    pub fn insert(&self, path: impl Into<PathBuf>, store: MemoryStore) -> Arc<MemoryStore> {
        let store = Arc::new(store);
        self.stores.write().insert(path.into(), store.clone());
        store
    }

    /// Number of successful opens.
    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

impl StoreOpener for MemoryStoreOpener {
    fn probe(&self, path: &Path) -> Result<StoreProbe> {
        Ok(match self.stores.read().get(path) {
            None => StoreProbe::NotAStore,
            Some(store) if store.password.is_some() => StoreProbe::Locked,
            Some(_) => StoreProbe::Open,
        })
    }

    fn open(&self, path: &Path, password: Option<&str>) -> Result<Arc<dyn StoreHandle>> {
        let store = self
            .stores
            .read()
            .get(path)
            .cloned()
            .ok_or_else(|| Error::NotAStore(path.to_path_buf()))?;
        if !store.accepts(password) {
            return Err(Error::WrongPassword);
        }
        self.opens.fetch_add(1, Ordering::SeqCst);
        Ok(store)
    }
}
