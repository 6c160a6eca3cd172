//! `resto-core` - response model, declared errors, request context and
//! payload serializers.
//!
//! Nothing here knows about a transport; the API crate binds it to one.

pub mod envelope;
pub mod error;
pub mod headers;
pub mod id;
pub mod identity;
pub mod request;
pub mod response;
pub mod serializer;
pub mod status;

pub use envelope::{Envelope, Meta};
pub use error::{ApiError, ApiResult, ErrorClass};
pub use headers::Headers;
pub use id::RequestId;
pub use identity::{Identity, Role};
pub use request::Request;
pub use response::Response;
pub use serializer::{CamelCaseJsonSerializer, CodecError, JsonSerializer, Serializer};
pub use status::{InvalidStatusCode, reason_phrase};
