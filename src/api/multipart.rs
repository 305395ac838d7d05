//! Minimal `multipart/form-data` encoder for video uploads.
//!
//! The gateway's `upload` must not set the JSON content type; instead the
//! encoded form supplies its own `multipart/form-data; boundary=…` header so
//! the backend can split the parts. Only the features the upload endpoint
//! needs are implemented: text fields and a single file part.

use std::path::Path;

/// An in-memory multipart form body.
#[derive(Debug)]
pub struct Multipart {
    boundary: String,
    body: Vec<u8>,
}

impl Multipart {
    pub fn new() -> Self {
        Self {
            boundary: make_boundary(),
            body: Vec::new(),
        }
    }

    /// Append a plain text field.
    pub fn add_text(&mut self, name: &str, value: &str) -> &mut Self {
        self.open_part(&format!(
            "Content-Disposition: form-data; name=\"{name}\"\r\n\r\n"
        ));
        self.body.extend_from_slice(value.as_bytes());
        self.body.extend_from_slice(b"\r\n");
        self
    }

    /// Append a file part with an explicit content type.
    pub fn add_file(&mut self, name: &str, filename: &str, content_type: &str, bytes: &[u8]) -> &mut Self {
        self.open_part(&format!(
            "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
             Content-Type: {content_type}\r\n\r\n"
        ));
        self.body.extend_from_slice(bytes);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    /// Finalize the form, returning the `Content-Type` header value and the
    /// encoded body.
    pub fn finish(mut self) -> (String, Vec<u8>) {
        let content_type = format!("multipart/form-data; boundary={}", self.boundary);
        self.body
            .extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        (content_type, self.body)
    }

    fn open_part(&mut self, headers: &str) {
        self.body
            .extend_from_slice(format!("--{}\r\n", self.boundary).as_bytes());
        self.body.extend_from_slice(headers.as_bytes());
    }
}

impl Default for Multipart {
    fn default() -> Self {
        Self::new()
    }
}

/// Boundary unique enough for one-shot uploads: pid plus a nanosecond
/// timestamp. Uploaded videos never contain the marker in practice; the
/// backend rejects a malformed body otherwise.
fn make_boundary() -> String {
    format!(
        "platewatch-{}-{}",
        std::process::id(),
        chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()
    )
}

/// Guess a content type from the file extension. Unknown extensions fall
/// back to the generic binary type, which the backend accepts.
pub fn content_type_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("mp4") => "video/mp4",
        Some("avi") => "video/x-msvideo",
        Some("mkv") => "video/x-matroska",
        Some("mov") => "video/quicktime",
        Some("webm") => "video/webm",
        _ => "application/octet-stream",
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
