//! Conversion between cached values and stored content
//!
//! Containers are stored as compact JSON, strings as their raw text and other
//! scalars as their JSON text. Reading reverses this heuristically: content
//! that parses as JSON is decoded as such, anything else is taken as raw text.

use crate::{Error, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Encode a value for storage
pub fn encode_content<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    let json = serde_json::to_value(value)
        .map_err(|e| Error::serialization(format!("Failed to encode cached value: {e}")))?;
    match json {
        Value::String(text) => Ok(text.into_bytes()),
        // serialize the original value so struct field order is kept
        Value::Object(_) | Value::Array(_) => serde_json::to_vec(value)
            .map_err(|e| Error::serialization(format!("Failed to encode cached value: {e}"))),
        scalar => Ok(scalar.to_string().into_bytes()),
    }
}

/// Decode stored content
///
/// Tries the content as JSON first and falls back to the raw text as a
/// string value.
pub fn decode_content<T: DeserializeOwned>(raw: &str) -> Result<T> {
    let parsed = serde_json::from_str::<Value>(raw)
        .ok()
        .and_then(|json| serde_json::from_value::<T>(json).ok());
    if let Some(value) = parsed {
        return Ok(value);
    }
    serde_json::from_value(Value::String(raw.to_string()))
        .map_err(|e| Error::serialization(format!("Failed to decode cached content: {e}")))
}
