//! Test fixtures for integration tests.

#![allow(dead_code)]

use bson::oid::ObjectId;
use bson::spec::BinarySubtype;
use bson::{Binary, Bson, DateTime, Decimal128, Document, doc};
use storeview::store::StoreWriter;

pub const ANN_OID: &str = "65a1f0c2e4b0a1b2c3d4e5f6";
pub const UUID_TEXT: &str = "67e55044-10b1-426f-9247-bb680e5fe0c8";

pub fn ann() -> Document {
    doc! {
        "_id": ObjectId::parse_str(ANN_OID).expect("valid oid"),
        "name": "Ann",
        "age": 30,
    }
}

pub fn bob() -> Document {
    doc! { "name": "Bob", "address": { "city": "NY" } }
}

pub fn uuid_binary() -> Bson {
    let bytes = uuid::Uuid::parse_str(UUID_TEXT).expect("valid uuid").into_bytes();
    Bson::Binary(Binary { subtype: BinarySubtype::Uuid, bytes: bytes.to_vec() })
}

/// A document touching every renderable value kind.
pub fn document_with_all_types() -> Document {
    doc! {
        "_id": 9_000_000_000_i64,
        "string": "hello world",
        "int32": 42_i32,
        "double": 2.5,
        "decimal": "12.50".parse::<Decimal128>().expect("valid decimal"),
        "boolean": true,
        "null": null,
        "low": Bson::MinKey,
        "high": Bson::MaxKey,
        "array": ["a", "b", "c"],
        "blob": Bson::Binary(Binary { subtype: BinarySubtype::Generic, bytes: vec![1, 2, 3] }),
        "uuid": uuid_binary(),
        "when": DateTime::from_millis(1_710_374_400_000 + 13 * 3_600_000),
        "nested": { "key": "value", "deep": { "deeper": "bottom" } },
        "code": Bson::JavaScriptCode("return 1".into()),
    }
}

/// Generate `count` numbered documents with Int32 identities.
pub fn numbered_documents(count: usize) -> Vec<Document> {
    (0..count)
        .map(|i| doc! { "_id": i as i32, "name": format!("Document {i}") })
        .collect()
}

/// Three collections in a fixed order, including one of bare values.
pub fn sample_writer() -> StoreWriter {
    StoreWriter::new()
        .collection("users", vec![ann()])
        .collection("people", vec![bob()])
        .collection(
            "scalars",
            vec![Bson::String("plain".into()), Bson::Int64(7), Bson::Undefined],
        )
}
