use std::io;

use thiserror::Error;

/// Fallback message when a failed response carries no `detail` field.
pub const GENERIC_FAILURE: &str = "Something went wrong";

/// Fallback message for failed uploads without a `detail` field.
pub const UPLOAD_FAILURE: &str = "Upload failed";

/// Errors surfaced by the request gateway.
///
/// The `Display` text of `Denied` and `Status` is exactly the backend's
/// `detail` message (or the fixed fallback), so call sites can show it to
/// the user verbatim.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The backend rejected the session (401 or 403 for `request`, 403 for
    /// `upload`). The stored token has already been cleared when this is
    /// returned.
    #[error("{message}")]
    Denied { status: u16, message: String },

    /// Any other non-success HTTP status.
    #[error("{message}")]
    Status { status: u16, message: String },

    /// Network-level failure (connection refused, DNS, TLS). Propagates
    /// with no retry; each call is one-shot.
    #[error("request failed: {0}")]
    Transport(#[source] Box<ureq::Transport>),

    /// The response body was not valid JSON.
    #[error("failed to decode response body: {0}")]
    Decode(#[source] io::Error),

    /// Local I/O failure before or after the call itself (reading the
    /// upload file, persisting the session token).
    #[error("local i/o failed: {0}")]
    Io(#[source] io::Error),

    /// A successful response did not match the expected payload shape.
    #[error("unexpected response payload: {0}")]
    Payload(#[from] serde_json::Error),
}

impl ApiError {
    /// HTTP status associated with the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Denied { status, .. } | Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether this error represents a denied (expired) session.
    pub fn is_denied(&self) -> bool {
        matches!(self, Self::Denied { .. })
    }
}
