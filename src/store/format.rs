//! On-disk layout of store files.
//!
//! ```text
//! header    : magic (8) | version u8 | flags u8
//! protected : salt (16) | verifier segment
//! body      : one segment per collection, then the catalog segment
//! footer    : catalog offset, u64 little-endian
//! segment   : payload length, u32 little-endian | payload
//! ```
//!
//! Payloads are BSON documents. In protected stores every payload is sealed
//! (`nonce || ciphertext`) with the password-derived key, and the verifier
//! segment holds the sealed [`VERIFIER`] constant.

use std::io::{Read, Seek, SeekFrom};

use bson::{Bson, Document, doc};

use crate::error::{Error, Result};

pub(crate) const MAGIC: &[u8; 8] = b"SVSTORE\0";
pub(crate) const VERSION: u8 = 1;
pub(crate) const FLAG_PROTECTED: u8 = 0b0000_0001;
pub(crate) const HEADER_LEN: u64 = 10;
pub(crate) const FOOTER_LEN: u64 = 8;
pub(crate) const VERIFIER: &[u8] = b"storeview-verifier";

const SEGMENT_PREFIX_LEN: u64 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Header {
    pub protected: bool,
}

/// Parse a header; `None` means the bytes are not a store header.
pub(crate) fn parse_header(bytes: &[u8; HEADER_LEN as usize]) -> Option<Header> {
    if &bytes[..8] != MAGIC || bytes[8] != VERSION {
        return None;
    }
    // Unknown flag bits come from a newer writer.
    if bytes[9] & !FLAG_PROTECTED != 0 {
        return None;
    }
    Some(Header { protected: bytes[9] & FLAG_PROTECTED != 0 })
}

pub(crate) fn encode_header(header: Header) -> [u8; HEADER_LEN as usize] {
    let mut out = [0u8; HEADER_LEN as usize];
    out[..8].copy_from_slice(MAGIC);
    out[8] = VERSION;
    out[9] = if header.protected { FLAG_PROTECTED } else { 0 };
    out
}

/// Append a length-prefixed segment.
pub(crate) fn write_segment(out: &mut Vec<u8>, payload: &[u8]) -> Result<()> {
    let len = u32::try_from(payload.len())
        .map_err(|_| Error::Encode(format!("segment of {} bytes is too large", payload.len())))?;
    out.extend_from_slice(&len.to_le_bytes());
    out.extend_from_slice(payload);
    Ok(())
}

/// Read the segment starting at `offset`, checking it fits in `file_len`.
pub(crate) fn read_segment<R: Read + Seek>(
    reader: &mut R,
    offset: u64,
    file_len: u64,
) -> Result<Vec<u8>> {
    if offset.saturating_add(SEGMENT_PREFIX_LEN) > file_len {
        return Err(Error::Corrupt(format!("segment offset {offset} is past end of file")));
    }
    reader.seek(SeekFrom::Start(offset))?;
    let mut len_bytes = [0u8; SEGMENT_PREFIX_LEN as usize];
    reader.read_exact(&mut len_bytes)?;
    let len = u64::from(u32::from_le_bytes(len_bytes));
    if offset + SEGMENT_PREFIX_LEN + len > file_len {
        return Err(Error::Corrupt(format!("segment at {offset} overruns the file")));
    }
    let mut payload = vec![0u8; len as usize];
    reader.read_exact(&mut payload)?;
    Ok(payload)
}

pub(crate) fn encode_document(doc: &Document) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    doc.to_writer(&mut buf).map_err(|e| Error::Encode(e.to_string()))?;
    Ok(buf)
}

pub(crate) fn decode_document(bytes: &[u8]) -> Result<Document> {
    Document::from_reader(bytes).map_err(|e| Error::Corrupt(e.to_string()))
}

/// Catalog record for one collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CatalogEntry {
    pub name: String,
    pub offset: u64,
    pub count: u64,
}

pub(crate) fn encode_catalog(entries: &[CatalogEntry]) -> Document {
    let collections: Vec<Bson> = entries
        .iter()
        .map(|entry| {
            Bson::Document(doc! {
                "name": entry.name.clone(),
                "offset": entry.offset as i64,
                "count": entry.count as i64,
            })
        })
        .collect();
    doc! { "collections": collections }
}

pub(crate) fn decode_catalog(doc: &Document) -> Result<Vec<CatalogEntry>> {
    let corrupt = |what: &str| Error::Corrupt(format!("catalog: {what}"));
    let collections = doc.get_array("collections").map_err(|e| corrupt(&e.to_string()))?;

    collections
        .iter()
        .map(|item| {
            let entry = item.as_document().ok_or_else(|| corrupt("entry is not a document"))?;
            let name = entry.get_str("name").map_err(|e| corrupt(&e.to_string()))?;
            let offset = entry.get_i64("offset").map_err(|e| corrupt(&e.to_string()))?;
            let count = entry.get_i64("count").map_err(|e| corrupt(&e.to_string()))?;
            if offset < 0 || count < 0 {
                return Err(corrupt("negative offset or count"));
            }
            Ok(CatalogEntry { name: name.to_string(), offset: offset as u64, count: count as u64 })
        })
        .collect()
}

pub(crate) fn encode_items(items: &[Bson]) -> Result<Vec<u8>> {
    encode_document(&doc! { "items": items.to_vec() })
}

pub(crate) fn decode_items(bytes: &[u8]) -> Result<Vec<Bson>> {
    let mut doc = decode_document(bytes)?;
    match doc.remove("items") {
        Some(Bson::Array(items)) => Ok(items),
        _ => Err(Error::Corrupt("collection segment has no item list".to_string())),
    }
}
