//! Uniform response envelope.
//!
//! Every response body, success or failure, has the same shape:
//!
//! ```json
//! { "code": 0, "message": "Success", "data": { ... } }
//! ```
//!
//! `code == 0` is the only success code. Domain crates own the rest of the
//! numbering; this module reserves the generic codes below.

use axum::Json;
use serde::{Deserialize, Serialize};

/// Generic response codes shared by every service built on this crate.
pub mod codes {
    /// Request handled successfully.
    pub const SUCCESS: i32 = 0;

    /// Unclassified failure (also used for recovered panics).
    pub const FAILURE: i32 = 1;

    /// Request body could not be decoded as the expected JSON.
    pub const REQUEST_DECODE_JSON: i32 = 2;

    /// Message paired with [`SUCCESS`].
    pub const SUCCESS_MESSAGE: &str = "Success";

    /// Message paired with [`FAILURE`].
    pub const FAILURE_MESSAGE: &str = "Failure";

    /// Message paired with [`REQUEST_DECODE_JSON`].
    pub const REQUEST_DECODE_JSON_MESSAGE: &str = "Request JSON decoding failed";
}

/// Response envelope.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Envelope<T> {
    /// Stable numeric code; `0` means success.
    pub code: i32,

    /// Message paired 1:1 with `code`.
    pub message: String,

    /// Payload, omitted when empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    /// Successful envelope carrying `data`.
    #[must_use]
    pub fn success(data: T) -> Self {
        Self {
            code: codes::SUCCESS,
            message: codes::SUCCESS_MESSAGE.to_string(),
            data: Some(data),
        }
    }

    /// Whether this envelope reports success.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.code == codes::SUCCESS
    }
}

impl Envelope<()> {
    /// Successful envelope with no payload.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            code: codes::SUCCESS,
            message: codes::SUCCESS_MESSAGE.to_string(),
            data: None,
        }
    }

    /// Failure envelope with no payload.
    #[must_use]
    pub fn failure(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }
}

/// Wrap `data` in a success envelope ready to return from a handler.
pub fn respond<T: Serialize>(data: T) -> Json<Envelope<T>> {
    Json(Envelope::success(data))
}

/// Success envelope without data.
#[must_use]
pub fn respond_empty() -> Json<Envelope<()>> {
    Json(Envelope::empty())
}
