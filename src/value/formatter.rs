//! Display rendering for document values.

use std::fmt::Write as _;
use std::str::FromStr;

use bson::spec::BinarySubtype;
use bson::{Binary, Bson, Document};
use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::state::RenderSettings;

/// Default strftime pattern for date-time values (date only).
///
/// Stands in for the viewer's short-date culture pattern; the calendar day is
/// taken in the zone given by [`DateZone`], local time unless configured.
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";

/// Time zone in which a date-time is cut down to its calendar date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateZone {
    /// The machine's local zone.
    #[default]
    Local,
    Utc,
}

impl FromStr for DateZone {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "utc" => Ok(Self::Utc),
            _ => Err(format!("unknown time zone '{raw}', expected 'local' or 'utc'")),
        }
    }
}

/// Outcome of rendering one value for the tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Rendered<'a> {
    /// A leaf label.
    Leaf(String),
    /// A nested document; the caller materializes its fields instead of a leaf.
    Nested(&'a Document),
    /// No display form; no node is produced.
    Nothing,
}

/// Maps document values to tree labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueRenderer {
    date_format: String,
    zone: DateZone,
}

impl Default for ValueRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_DATE_FORMAT)
    }
}

impl ValueRenderer {
    pub fn new(date_format: impl Into<String>) -> Self {
        Self { date_format: date_format.into(), zone: DateZone::default() }
    }

    pub fn with_zone(mut self, zone: DateZone) -> Self {
        self.zone = zone;
        self
    }

    pub fn from_settings(settings: &RenderSettings) -> Self {
        Self::new(settings.date_format.clone()).with_zone(settings.time_zone)
    }

    pub fn date_format(&self) -> &str {
        &self.date_format
    }

    pub fn zone(&self) -> DateZone {
        self.zone
    }

    /// Render a single value.
    ///
    /// Arrays and binary blobs are shown by type name only; their contents
    /// are never expanded. Regular expressions, code, timestamps, symbols,
    /// undefined and DB pointers have no display form and yield
    /// [`Rendered::Nothing`].
    pub fn render<'a>(&self, value: &'a Bson) -> Rendered<'a> {
        match value {
            Bson::MinKey => Rendered::Leaf("MinValue".to_string()),
            Bson::MaxKey => Rendered::Leaf("MaxValue".to_string()),
            Bson::Null => Rendered::Leaf("Null".to_string()),
            Bson::Int32(n) => Rendered::Leaf(n.to_string()),
            Bson::Int64(n) => Rendered::Leaf(n.to_string()),
            Bson::Double(n) => Rendered::Leaf(n.to_string()),
            Bson::Decimal128(d) => Rendered::Leaf(d.to_string()),
            Bson::String(s) => Rendered::Leaf(s.clone()),
            Bson::Document(doc) => Rendered::Nested(doc),
            Bson::Array(_) => Rendered::Leaf("Array".to_string()),
            Bson::Binary(bin) => match binary_uuid(bin) {
                Some(uuid) => Rendered::Leaf(uuid.to_string()),
                None => Rendered::Leaf("Binary".to_string()),
            },
            Bson::ObjectId(oid) => Rendered::Leaf(oid.to_hex()),
            Bson::Boolean(b) => Rendered::Leaf(b.to_string()),
            Bson::DateTime(dt) => Rendered::Leaf(self.format_date(*dt)),
            _ => Rendered::Nothing,
        }
    }

    /// Date part of a date-time in the configured zone; time-of-day is dropped.
    fn format_date(&self, dt: bson::DateTime) -> String {
        let Some(ts) = DateTime::<Utc>::from_timestamp_millis(dt.timestamp_millis()) else {
            // Outside chrono's range: keep whatever precedes the time separator.
            let raw = dt.to_string();
            return raw.split('T').next().unwrap_or(&raw).to_string();
        };
        let date = match self.zone {
            DateZone::Local => ts.with_timezone(&Local).date_naive(),
            DateZone::Utc => ts.date_naive(),
        };
        format_naive_date(date, &self.date_format)
    }
}

/// Render with the default renderer.
pub fn render_value(value: &Bson) -> Rendered<'_> {
    ValueRenderer::default().render(value)
}

/// UUID carried by a binary value, if it is a well-formed UUID subtype.
pub fn binary_uuid(bin: &Binary) -> Option<Uuid> {
    if bin.subtype != BinarySubtype::Uuid {
        return None;
    }
    Uuid::from_slice(&bin.bytes).ok()
}

/// Check whether a strftime pattern can format a calendar date.
pub fn is_valid_date_format(pattern: &str) -> bool {
    let sample = NaiveDate::from_ymd_opt(2000, 1, 31).unwrap_or_default();
    let mut out = String::new();
    write!(out, "{}", sample.format(pattern)).is_ok()
}

fn format_naive_date(date: NaiveDate, pattern: &str) -> String {
    let mut out = String::new();
    if write!(out, "{}", date.format(pattern)).is_ok() {
        return out;
    }
    log::warn!("Date format {pattern:?} cannot format dates; using {DEFAULT_DATE_FORMAT}");
    date.format(DEFAULT_DATE_FORMAT).to_string()
}
