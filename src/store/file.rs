//! File-backed store.

use std::fs::File;
use std::io::{ErrorKind, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::helpers::crypto::{SALT_LEN, SealingKey};

use super::format::{
    CatalogEntry, FOOTER_LEN, HEADER_LEN, Header, VERIFIER, decode_catalog, decode_document,
    decode_items, parse_header, read_segment,
};
use super::{ItemStream, StoreHandle, StoreOpener, StoreProbe};

/// Name and item count of a collection, as recorded in the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionInfo {
    pub name: String,
    pub count: u64,
}

/// An opened store file. Only the header and catalog are held in memory;
/// collection contents are read from disk on demand.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    file_len: u64,
    key: Option<SealingKey>,
    catalog: Vec<CatalogEntry>,
}

impl FileStore {
    /// Classify a file by its header alone.
    pub fn probe(path: &Path) -> Result<StoreProbe> {
        let mut file = File::open(path)?;
        Ok(match read_header(&mut file)? {
            None => StoreProbe::NotAStore,
            Some(Header { protected: true }) => StoreProbe::Locked,
            Some(Header { protected: false }) => StoreProbe::Open,
        })
    }

    /// Open a store file, validating the password for protected stores.
    ///
    /// A password given for an unprotected store is ignored.
    pub fn open(path: &Path, password: Option<&str>) -> Result<Self> {
        let mut file = File::open(path)?;
        let file_len = file.metadata()?.len();
        let not_a_store = || Error::NotAStore(path.to_path_buf());

        let header = read_header(&mut file)?.ok_or_else(not_a_store)?;
        if file_len < HEADER_LEN + FOOTER_LEN {
            return Err(not_a_store());
        }

        let key = if header.protected {
            Some(unlock(&mut file, file_len, password)?)
        } else {
            None
        };

        file.seek(SeekFrom::End(-(FOOTER_LEN as i64)))?;
        let mut footer = [0u8; FOOTER_LEN as usize];
        file.read_exact(&mut footer)?;
        let catalog_offset = u64::from_le_bytes(footer);
        if catalog_offset < HEADER_LEN || catalog_offset > file_len - FOOTER_LEN {
            return Err(Error::Corrupt(format!("catalog offset {catalog_offset} out of range")));
        }

        let store = Self { path: path.to_path_buf(), file_len, key, catalog: Vec::new() };
        let payload = store.read_payload(&mut file, catalog_offset)?;
        let catalog = decode_catalog(&decode_document(&payload)?)?;

        log::debug!(
            "Opened store {} ({} collections, protected: {})",
            path.display(),
            catalog.len(),
            header.protected
        );
        Ok(Self { catalog, ..store })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_protected(&self) -> bool {
        self.key.is_some()
    }

    /// Catalog entries with their item counts.
    pub fn collections(&self) -> Vec<CollectionInfo> {
        self.catalog
            .iter()
            .map(|entry| CollectionInfo { name: entry.name.clone(), count: entry.count })
            .collect()
    }

    /// Read a segment and unseal it if the store is protected.
    fn read_payload(&self, file: &mut File, offset: u64) -> Result<Vec<u8>> {
        let payload = read_segment(file, offset, self.file_len)?;
        match &self.key {
            Some(key) => key.open(&payload).map_err(|_| {
                Error::Corrupt(format!("segment at {offset} failed authentication"))
            }),
            None => Ok(payload),
        }
    }
}

impl StoreHandle for FileStore {
    fn list_collections(&self) -> Result<Vec<String>> {
        Ok(self.catalog.iter().map(|entry| entry.name.clone()).collect())
    }

    fn read_all(&self, collection: &str) -> Result<ItemStream<'_>> {
        let entry = self
            .catalog
            .iter()
            .find(|entry| entry.name == collection)
            .ok_or_else(|| Error::UnknownCollection(collection.to_string()))?;

        let mut file = File::open(&self.path)?;
        let items = decode_items(&self.read_payload(&mut file, entry.offset)?)?;
        if items.len() as u64 != entry.count {
            log::warn!(
                "Collection {collection} holds {} items, catalog says {}",
                items.len(),
                entry.count
            );
        }
        Ok(Box::new(items.into_iter().map(Ok)))
    }
}

/// Opens [`FileStore`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileStoreOpener;

impl StoreOpener for FileStoreOpener {
    fn probe(&self, path: &Path) -> Result<StoreProbe> {
        FileStore::probe(path)
    }

    fn open(&self, path: &Path, password: Option<&str>) -> Result<Arc<dyn StoreHandle>> {
        Ok(Arc::new(FileStore::open(path, password)?))
    }
}

/// Read the fixed header; `None` for files that are too short or foreign.
fn read_header(file: &mut File) -> Result<Option<Header>> {
    let mut bytes = [0u8; HEADER_LEN as usize];
    match file.read_exact(&mut bytes) {
        Ok(()) => Ok(parse_header(&bytes)),
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Derive the key and check it against the verifier segment.
fn unlock(file: &mut File, file_len: u64, password: Option<&str>) -> Result<SealingKey> {
    let password = password.filter(|p| !p.is_empty()).ok_or(Error::WrongPassword)?;

    file.seek(SeekFrom::Start(HEADER_LEN))?;
    let mut salt = [0u8; SALT_LEN];
    file.read_exact(&mut salt)?;

    let key = SealingKey::derive(password, &salt)?;
    let verifier = read_segment(file, HEADER_LEN + SALT_LEN as u64, file_len)?;
    match key.open(&verifier) {
        Ok(plain) if plain == VERIFIER => Ok(key),
        _ => Err(Error::WrongPassword),
    }
}

#[cfg(test)]
mod tests {
    use bson::{Bson, doc};
    use tempfile::TempDir;

    use super::*;
    use crate::store::StoreWriter;

    fn write_store(dir: &TempDir, writer: &StoreWriter) -> PathBuf {
        let path = dir.path().join("test.store");
        writer.write_to(&path).expect("failed to write store");
        path
    }

    #[test]
    fn reads_catalog_and_items_in_order() {
        let dir = TempDir::new().expect("failed to create temp dir");
        let writer = StoreWriter::new()
            .collection("zeta", vec![doc! { "n": 1 }, doc! { "n": 2 }])
            .collection("alpha", Vec::<Bson>::new());
        let path = write_store(&dir, &writer);

        let store = FileStore::open(&path, None).unwrap();
        assert!(!store.is_protected());
        assert_eq!(store.list_collections().unwrap(), vec!["zeta", "alpha"]);
        assert_eq!(
            store.collections(),
            vec![
                CollectionInfo { name: "zeta".into(), count: 2 },
                CollectionInfo { name: "alpha".into(), count: 0 },
            ]
        );

        let items: Vec<Bson> = store.read_all("zeta").unwrap().collect::<Result<_>>().unwrap();
        assert_eq!(items, vec![Bson::Document(doc! { "n": 1 }), Bson::Document(doc! { "n": 2 })]);
        assert_eq!(store.read_all("alpha").unwrap().count(), 0);
    }

    #[test]
    fn unknown_collection_is_reported() {
        let dir = TempDir::new().expect("failed to create temp dir");
        let path = write_store(&dir, &StoreWriter::new().collection("a", vec![Bson::Int32(1)]));
        let store = FileStore::open(&path, None).unwrap();
        assert!(matches!(store.read_all("b"), Err(Error::UnknownCollection(name)) if name == "b"));
    }

    #[test]
    fn probe_classifies_files() {
        let dir = TempDir::new().expect("failed to create temp dir");
        let plain = write_store(&dir, &StoreWriter::new().collection("a", vec![Bson::Null]));
        assert_eq!(FileStore::probe(&plain).unwrap(), StoreProbe::Open);

        let locked = dir.path().join("locked.store");
        StoreWriter::new().password("pw").write_to(&locked).unwrap();
        assert_eq!(FileStore::probe(&locked).unwrap(), StoreProbe::Locked);

        let text = dir.path().join("notes.txt");
        std::fs::write(&text, "just some text, not a store").unwrap();
        assert_eq!(FileStore::probe(&text).unwrap(), StoreProbe::NotAStore);

        let tiny = dir.path().join("tiny");
        std::fs::write(&tiny, b"SV").unwrap();
        assert_eq!(FileStore::probe(&tiny).unwrap(), StoreProbe::NotAStore);
    }

    #[test]
    fn foreign_file_is_not_a_store() {
        let dir = TempDir::new().expect("failed to create temp dir");
        let text = dir.path().join("notes.txt");
        std::fs::write(&text, "just some text, not a store").unwrap();
        assert!(matches!(FileStore::open(&text, None), Err(Error::NotAStore(_))));
    }

    #[test]
    fn protected_store_checks_password() {
        let dir = TempDir::new().expect("failed to create temp dir");
        let writer =
            StoreWriter::new().password("s3cret").collection("users", vec![doc! { "a": 1 }]);
        let path = write_store(&dir, &writer);

        assert!(matches!(FileStore::open(&path, None), Err(Error::WrongPassword)));
        assert!(matches!(FileStore::open(&path, Some("")), Err(Error::WrongPassword)));
        assert!(matches!(FileStore::open(&path, Some("nope")), Err(Error::WrongPassword)));

        let store = FileStore::open(&path, Some("s3cret")).unwrap();
        assert!(store.is_protected());
        assert_eq!(store.read_all("users").unwrap().count(), 1);
    }

    #[test]
    fn password_for_plain_store_is_ignored() {
        let dir = TempDir::new().expect("failed to create temp dir");
        let path = write_store(&dir, &StoreWriter::new().collection("a", vec![Bson::Null]));
        let store = FileStore::open(&path, Some("anything")).unwrap();
        assert!(!store.is_protected());
    }

    #[test]
    fn damaged_collection_segment_fails_on_read() {
        let dir = TempDir::new().expect("failed to create temp dir");
        let writer = StoreWriter::new().password("pw").collection("users", vec![doc! { "a": 1 }]);
        let path = write_store(&dir, &writer);

        let store = FileStore::open(&path, Some("pw")).unwrap();
        let offset = store.catalog[0].offset as usize;

        // Flip a byte inside the sealed collection payload; the catalog stays intact.
        let mut bytes = std::fs::read(&path).unwrap();
        bytes[offset + 4 + 20] ^= 0xff;
        std::fs::write(&path, &bytes).unwrap();

        assert!(matches!(store.read_all("users"), Err(Error::Corrupt(_))));
    }
}
