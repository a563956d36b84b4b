use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Builds the `Authorization` header value for the catalog's Basic auth.
pub fn basic_auth_header(username: &str, api_key: &str) -> String {
    format!(
        "Basic {}",
        STANDARD.encode(format!("{}:{}", username, api_key))
    )
}

/// Splits a `<username>:<apikey>` pair, as accepted in the rc file's `key:` entry.
pub(crate) fn split_key_basic(key: &str) -> Option<(String, String)> {
    let parts: Vec<&str> = key.splitn(2, ':').collect();
    if parts.len() == 2 && !parts[0].trim().is_empty() && !parts[1].trim().is_empty() {
        Some((parts[0].trim().to_string(), parts[1].trim().to_string()))
    } else {
        None
    }
}
