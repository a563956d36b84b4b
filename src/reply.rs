use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{Error, Result};

// Endpoints disagree on the error key: submission uses the first, progress the second.
const ERROR_KEYS: [&str; 2] = ["error_message", "errormessage"];

/// A decoded catalog response: either the expected payload or a server-reported error.
#[derive(Debug, PartialEq)]
pub(crate) enum Reply<T> {
    Success(T),
    Error(String),
}

impl<T: DeserializeOwned> Reply<T> {
    pub(crate) fn from_slice(body: &[u8]) -> serde_json::Result<Self> {
        let value: Value = serde_json::from_slice(body)?;
        if let Some(message) = error_message(&value) {
            return Ok(Reply::Error(message));
        }
        serde_json::from_value(value).map(Reply::Success)
    }

    /// Decodes `body` and turns a server-reported error into [`Error`].
    pub(crate) fn decode(body: &[u8], url: &str) -> Result<T> {
        match Self::from_slice(body) {
            Ok(Reply::Success(v)) => Ok(v),
            Ok(Reply::Error(message)) => Err(Error::new(message)),
            Err(e) => Err(Error::with_source(
                format!("Failed to decode response from {}: {}", url, e),
                e,
            )),
        }
    }
}

pub(crate) fn error_message(value: &Value) -> Option<String> {
    let obj = value.as_object()?;
    ERROR_KEYS.iter().find_map(|k| {
        obj.get(*k).map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    })
}

/// Extracts an error field from a body that may or may not be JSON at all.
pub(crate) fn error_in_body(body: &[u8]) -> Option<String> {
    serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|v| error_message(&v))
}
