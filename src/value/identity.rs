//! Identity field detection and labelling.

use bson::{Bson, Document};

use super::binary_uuid;

/// Identity fields in priority order: a document's own `_id`, then the
/// `$id` of a reference-style embedded value.
pub const IDENTITY_FIELDS: [&str; 2] = ["_id", "$id"];

/// Find the identity field of a document, if any.
pub fn identity_field(doc: &Document) -> Option<(&'static str, &Bson)> {
    IDENTITY_FIELDS.iter().find_map(|name| doc.get(*name).map(|value| (*name, value)))
}

/// Label for an identity node: `"<field>: <TypeName>: <value>"`.
///
/// Only Int32, Int64, ObjectId and UUID identities carry a value segment;
/// every other type yields `"<field>: "` with an empty segment.
pub fn identity_label(field: &str, value: &Bson) -> String {
    let segment = match value {
        Bson::Int32(n) => format!("Int32: {n}"),
        Bson::Int64(n) => format!("Int64: {n}"),
        Bson::ObjectId(oid) => format!("ObjectID: {}", oid.to_hex()),
        Bson::Binary(bin) => match binary_uuid(bin) {
            Some(uuid) => format!("Guid: {uuid}"),
            None => String::new(),
        },
        _ => String::new(),
    };
    format!("{field}: {segment}")
}
