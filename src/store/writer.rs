//! Store file creation.

use std::path::Path;

use bson::Bson;

use crate::error::Result;
use crate::helpers::atomic_write;
use crate::helpers::crypto::{SealingKey, random_salt};

use super::format::{
    CatalogEntry, Header, VERIFIER, encode_catalog, encode_document, encode_header, encode_items,
    write_segment,
};

/// Builds a store file from collections of items.
///
/// Collections are written in the order they were first added.
#[derive(Debug, Clone, Default)]
pub struct StoreWriter {
    collections: Vec<(String, Vec<Bson>)>,
    password: Option<String>,
}

impl StoreWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Protect the store with a password. An empty password leaves it unprotected.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        let password = password.into();
        self.password = (!password.is_empty()).then_some(password);
        self
    }

    /// Add items to a collection, creating it if needed.
    pub fn collection<I, T>(mut self, name: impl Into<String>, items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Bson>,
    {
        let name = name.into();
        let items = items.into_iter().map(Into::into);
        match self.collections.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, existing)) => existing.extend(items),
            None => self.collections.push((name, items.collect())),
        }
        self
    }

    /// Append one item to a collection, creating it if needed.
    pub fn push(&mut self, name: &str, item: impl Into<Bson>) {
        match self.collections.iter_mut().find(|(existing, _)| existing.as_str() == name) {
            Some((_, items)) => items.push(item.into()),
            None => self.collections.push((name.to_string(), vec![item.into()])),
        }
    }

    pub fn collection_names(&self) -> Vec<&str> {
        self.collections.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Encode the whole store.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        out.extend_from_slice(&encode_header(Header { protected: self.password.is_some() }));

        let key = match &self.password {
            Some(password) => {
                let salt = random_salt();
                let key = SealingKey::derive(password, &salt)?;
                out.extend_from_slice(&salt);
                write_segment(&mut out, &key.seal(VERIFIER)?)?;
                Some(key)
            }
            None => None,
        };
        let seal = |payload: Vec<u8>| -> Result<Vec<u8>> {
            match &key {
                Some(key) => key.seal(&payload),
                None => Ok(payload),
            }
        };

        let mut entries = Vec::with_capacity(self.collections.len());
        for (name, items) in &self.collections {
            let offset = out.len() as u64;
            write_segment(&mut out, &seal(encode_items(items)?)?)?;
            entries.push(CatalogEntry { name: name.clone(), offset, count: items.len() as u64 });
        }

        let catalog_offset = out.len() as u64;
        write_segment(&mut out, &seal(encode_document(&encode_catalog(&entries))?)?)?;
        out.extend_from_slice(&catalog_offset.to_le_bytes());
        Ok(out)
    }

    /// Write the store to `path`, replacing any existing file atomically.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let bytes = self.to_bytes()?;
        atomic_write(path, &bytes)?;
        log::info!(
            "Wrote store {} ({} collections, {} bytes)",
            path.display(),
            self.collections.len(),
            bytes.len()
        );
        Ok(())
    }
}
