//! Client for the ALPR backend REST API.
//!
//! Layout:
//! - [`gateway`] — the authenticated request gateway: bearer attachment,
//!   `detail` error unwrapping, clear-token-on-denial.
//! - [`token`] — session token storage ([`TokenStore`] plus file/memory
//!   implementations).
//! - [`multipart`] — form encoding for video uploads.
//! - [`types`] / [`endpoints`] — typed views of the backend payloads and
//!   one wrapper per operation.

pub mod endpoints;
pub mod error;
pub mod gateway;
pub mod multipart;
pub mod token;
pub mod types;

pub use endpoints::DetectionQuery;
pub use error::ApiError;
pub use gateway::{ApiClient, ExpiryNotify, ExpirySink};
pub use multipart::Multipart;
pub use token::{FileTokenStore, MemoryTokenStore, TokenStore};
