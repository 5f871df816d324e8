//! Parsing Extended JSON input into document values.

use bson::Bson;
use serde_json::Value;

use crate::error::{Error, Result};

/// Convert one JSON value (relaxed or canonical Extended JSON) into BSON.
pub fn json_to_bson(value: Value) -> Result<Bson> {
    Bson::try_from(value).map_err(|e| Error::Parse(e.to_string()))
}

/// Parse collection items from JSON text.
///
/// Accepts a JSON array (one item per element), a single JSON value, or
/// JSON lines (one value per non-empty line). Items may be documents or
/// bare values.
pub fn parse_items_from_json(input: &str) -> Result<Vec<Bson>> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Array(arr)) => arr.into_iter().map(json_to_bson).collect(),
        Ok(value) => Ok(vec![json_to_bson(value)?]),
        Err(_) => {
            let mut items = Vec::new();
            for (line_no, line) in trimmed.lines().enumerate() {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let value: Value = serde_json::from_str(line)
                    .map_err(|e| Error::Parse(format!("Line {}: {}", line_no + 1, e)))?;
                items.push(json_to_bson(value)?);
            }
            Ok(items)
        }
    }
}
