use reqwest::StatusCode;

/// The single error kind returned by every client operation.
///
/// The message is meant for humans; when the server reported an error field,
/// the message is that field's value verbatim.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct Error {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub(crate) fn with_source(
        message: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// The human-readable message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

pub(crate) fn format_status_error(status: StatusCode, url: &str, body: &[u8]) -> Error {
    let text = String::from_utf8_lossy(body);
    let excerpt: String = text.trim().chars().take(512).collect();

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Error::new(format!(
            "Error sending request to host server: authentication failed (HTTP {}).\n- Check the username and the API key generated under `REST API Key Manager`\n- Ensure the key has not been revoked\n\nrequest: {}\n{}",
            status.as_u16(),
            url,
            excerpt
        ));
    }

    if status == StatusCode::NOT_FOUND {
        return Error::new(format!(
            "Error sending request to host server: endpoint not found (HTTP 404).\n- Check the configured host (e.g. https://minos.lbl.gov)\n\nrequest: {}",
            url
        ));
    }

    Error::new(format!(
        "Error sending request to host server: HTTP {} for url ({})\n{}",
        status.as_u16(),
        url,
        excerpt
    ))
}
