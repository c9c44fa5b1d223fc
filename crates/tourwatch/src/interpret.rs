//! Scan result interpretation.
//!
//! Turns the raw text decoded from a QR code into a [`TouristRecord`].
//! Interpretation never fails: a payload that is not a structured JSON
//! object with an identity falls back to using the raw text as the identity.

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, trace};

use crate::profile::{Status, TouristRecord, UNKNOWN_TOURIST_NAME};

/// The decoded content of a tourist QR code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanPayload {
    /// A JSON object carrying an identity and, optionally, a name.
    Structured {
        /// The `id` field.
        id: String,
        /// The `name` field, if it is a non-blank string or a number.
        name: Option<String>,
    },
    /// Anything else; the trimmed text is the identity.
    Opaque(String),
}

impl ScanPayload {
    /// Parse raw scanned text.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();

        let map = match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(map)) => map,
            Ok(other) => {
                trace!(kind = json_kind(&other), "scan payload is JSON but not an object");
                return Self::Opaque(raw.to_string());
            }
            Err(e) => {
                trace!(error = %e, "scan payload is not structured");
                return Self::Opaque(raw.to_string());
            }
        };

        let Some(id) = map.get("id").and_then(text_value) else {
            debug!("structured scan payload has no usable id field");
            return Self::Opaque(raw.to_string());
        };

        let name = map.get("name").and_then(text_value);

        Self::Structured { id, name }
    }

    /// The identity this payload resolves to.
    #[must_use]
    pub fn identity(&self) -> &str {
        match self {
            Self::Structured { id, .. } => id,
            Self::Opaque(id) => id,
        }
    }

    /// Check whether the payload parsed as a structured object.
    #[must_use]
    pub fn is_structured(&self) -> bool {
        matches!(self, Self::Structured { .. })
    }
}

/// Accept strings and numbers as display text; reject blank strings and
/// other JSON types.
fn text_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Build a tourist record from raw scanned text.
///
/// Every field not carried by the payload comes from
/// [`TouristRecord::baseline`]. The record takes the dashboard's `status` at
/// the time of interpretation and is sealed with a fresh integrity tag.
#[must_use]
pub fn interpret(raw: &str, status: Status, scanned_at: DateTime<Utc>) -> TouristRecord {
    let payload = ScanPayload::parse(raw);
    let mut record = TouristRecord::baseline(scanned_at);

    match payload {
        ScanPayload::Structured { id, name } => {
            record.id = id;
            record.name = name.unwrap_or_else(|| UNKNOWN_TOURIST_NAME.to_string());
        }
        ScanPayload::Opaque(id) => record.id = id,
    }

    record.qr_code_id = raw.trim().to_string();
    record.status = status;
    record.seal();

    debug!(tourist_id = %record.id, status = %status, "interpreted scan");
    record
}
