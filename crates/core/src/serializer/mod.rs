//! Payload serializers.
//!
//! A serializer turns structured data into wire text and back. Two flavors:
//! [`JsonSerializer`] writes keys as given, [`CamelCaseJsonSerializer`]
//! rewrites every mapping key between `snake_case` and `camelCase`.

use std::fmt;

use serde_json::Value;
use thiserror::Error;

pub mod camel_case;
pub mod convention;
pub mod json;

pub use camel_case::CamelCaseJsonSerializer;
pub use convention::{camelize, camelize_key, underscorize, underscorize_key};
pub use json::JsonSerializer;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("malformed payload: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Wire codec used by the dispatcher for request payloads and envelopes.
///
/// Implementations must be stateless; one instance is shared by every
/// request routed to a handler.
pub trait Serializer: Send + Sync + fmt::Debug {
    fn content_type(&self) -> &str {
        "application/json"
    }

    fn encoding(&self) -> &str {
        "UTF-8"
    }

    /// Value for the `Content-Type` header.
    fn full_content_type(&self) -> String {
        format!("{}; charset={}", self.content_type(), self.encoding())
    }

    fn encode(&self, value: &Value) -> Result<String, CodecError>;

    fn decode(&self, text: &str) -> Result<Value, CodecError>;
}
