use std::time::Duration;

use loader_core::{FragmentPayload, LoadFailure, LoadFailureKind, RequestId};
use thiserror::Error;

/// Everything the client needs to reach the content service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    /// Full URL of the service endpoint, e.g. `https://example.edu/wp-admin/admin-ajax.php`.
    pub endpoint: String,
    pub action: String,
    /// Opaque validation token forwarded as `nonce`.
    pub token: Option<String>,
    pub request_timeout: Option<Duration>,
    pub max_bytes: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            action: "vn_menu_load_page_content".to_string(),
            token: None,
            request_timeout: None,
            max_bytes: 2 * 1024 * 1024,
        }
    }
}

/// One fragment request as sent to the content service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentRequest {
    pub fragment_path: String,
    /// Path of the document the request originates from (`current_page`).
    pub document_path: String,
}

impl ContentRequest {
    pub fn new(fragment_path: impl Into<String>, document_path: impl Into<String>) -> Self {
        Self {
            fragment_path: fragment_path.into(),
            document_path: document_path.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    FetchCompleted {
        request_id: RequestId,
        result: Result<FragmentPayload, LoadFailure>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContentError {
    #[error("no validation token configured")]
    MissingToken,
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
    #[error("service rejected request ({status}, {code:?}): {message}")]
    Rejected {
        status: u16,
        code: Option<String>,
        message: String,
    },
    #[error("service returned no content")]
    EmptyContent,
    #[error("response too large (max {max_bytes} bytes)")]
    TooLarge { max_bytes: u64 },
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("http status {0}")]
    HttpStatus(u16),
    #[error("timeout")]
    Timeout,
    #[error("network error: {0}")]
    Network(String),
}

impl ContentError {
    pub fn failure_kind(&self) -> LoadFailureKind {
        match self {
            ContentError::MissingToken => LoadFailureKind::Validation,
            ContentError::Rejected { status, code, .. } => {
                match code.as_deref() {
                    Some("not_found") => return LoadFailureKind::NotFound,
                    Some("invalid_nonce") => return LoadFailureKind::Forbidden,
                    Some("empty_path" | "invalid_format") => return LoadFailureKind::Validation,
                    _ => {}
                }
                match status {
                    400 => LoadFailureKind::Validation,
                    403 => LoadFailureKind::Forbidden,
                    404 => LoadFailureKind::NotFound,
                    _ => LoadFailureKind::Transport,
                }
            }
            ContentError::EmptyContent => LoadFailureKind::EmptyContent,
            ContentError::InvalidEndpoint(_)
            | ContentError::TooLarge { .. }
            | ContentError::Malformed(_)
            | ContentError::HttpStatus(_)
            | ContentError::Timeout
            | ContentError::Network(_) => LoadFailureKind::Transport,
        }
    }

    /// Converts into the failure the core state machine understands.
    ///
    /// Only service-authored messages are kept; transport details stay in the log.
    pub fn into_failure(self) -> LoadFailure {
        let kind = self.failure_kind();
        match self {
            ContentError::Rejected { message, .. } if !message.trim().is_empty() => {
                LoadFailure::with_message(kind, message)
            }
            _ => LoadFailure::new(kind),
        }
    }
}
