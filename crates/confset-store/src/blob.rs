//! Blob codec
//!
//! Stored payloads are plain JSON objects. The schema version the data was
//! written under is kept inside the same object, under [`VERSION_FIELD`].

use crate::error::StoreError;
use confset_schema::Blob;
use serde_json::Value;

/// Reserved top-level key holding the schema version
pub const VERSION_FIELD: &str = "$version";

/// Payload stored for a location that has never been written
pub(crate) const EMPTY_PAYLOAD: &str = "{}";

/// Decoded payload split into data and version marker
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded {
    /// Configuration data without the version marker
    pub data: Blob,
    /// Recorded schema version
    pub version: Option<String>,
}

/// Decode a payload, separating the version marker
///
/// # Errors
/// - [`StoreError::Decode`] if the payload is not JSON
/// - [`StoreError::NotAnObject`] if the top-level value is not an object
/// - [`StoreError::InvalidVersionMarker`] if `$version` is not a string
pub fn decode(location: &str, payload: &str) -> Result<Decoded, StoreError> {
    let value: Value = serde_json::from_str(payload).map_err(|source| StoreError::Decode {
        location: location.to_string(),
        source,
    })?;
    let mut data = match value {
        Value::Object(map) => map,
        other => {
            return Err(StoreError::NotAnObject {
                location: location.to_string(),
                found: type_name(&other),
            })
        }
    };
    let version = match data.remove(VERSION_FIELD) {
        None => None,
        Some(Value::String(version)) => Some(version),
        Some(_) => {
            return Err(StoreError::InvalidVersionMarker {
                location: location.to_string(),
            })
        }
    };
    Ok(Decoded { data, version })
}

/// Encode data, stamping `version` when given
///
/// A `$version` key already present in `data` is replaced by `version`, or
/// dropped when `version` is `None`.
///
/// # Errors
/// Returns [`StoreError::Encode`] if serialization fails.
pub fn encode(data: &Blob, version: Option<&str>) -> Result<String, StoreError> {
    let mut payload = data.clone();
    payload.remove(VERSION_FIELD);
    if let Some(version) = version {
        payload.insert(VERSION_FIELD.to_string(), Value::String(version.to_string()));
    }
    serde_json::to_string(&payload).map_err(StoreError::Encode)
}

/// Validate a raw backend payload and return its canonical form
///
/// # Errors
/// See [`decode`].
pub fn canonicalize(location: &str, raw: Option<&str>) -> Result<String, StoreError> {
    let raw = match raw {
        Some(raw) if !raw.trim().is_empty() => raw,
        _ => return Ok(EMPTY_PAYLOAD.to_string()),
    };
    let decoded = decode(location, raw)?;
    encode(&decoded.data, decoded.version.as_deref())
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
