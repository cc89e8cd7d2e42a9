//! Error reporting for the terminal shell.

use setlist_core::Error;
use tracing::error;

/// Structured error response, printed as JSON with `--json-errors`.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub message: String,
    /// Error category for programmatic handling.
    pub kind: String,
    /// Whether the error can be retried.
    pub retryable: bool,
}

impl From<&Error> for ErrorResponse {
    fn from(e: &Error) -> Self {
        Self {
            message: e.to_string(),
            kind: format!("{:?}", e.kind()),
            retryable: e.is_retryable(),
        }
    }
}

/// Log `e` and render it for the user.
///
/// With `json` the result is an encoded [`ErrorResponse`], falling back to the
/// plain message if serialization fails.
pub fn map_err(e: &Error, json: bool) -> String {
    error!(
        "Command error [kind={:?}, retryable={}]: {}",
        e.kind(),
        e.is_retryable(),
        e
    );

    if json {
        serde_json::to_string(&ErrorResponse::from(e)).unwrap_or_else(|_| e.to_string())
    } else if e.is_retryable() {
        format!("error: {e} (may succeed if retried)")
    } else {
        format!("error: {e}")
    }
}
