//! Declared error taxonomy.
//!
//! Every variant maps deterministically to one [`Response`]. These are
//! control-flow signals raised anywhere in an operation's call chain and
//! resolved once, at the dispatcher boundary.

use serde_json::{Value, json};
use thiserror::Error;

use crate::response::Response;
use crate::status::{
    HTTP_STATUS_BAD_REQUEST, HTTP_STATUS_FORBIDDEN, HTTP_STATUS_INTERNAL_SERVER_ERROR,
    HTTP_STATUS_METHOD_NOT_ALLOWED, HTTP_STATUS_NOT_FOUND, HTTP_STATUS_UNAUTHORIZED,
    HTTP_STATUS_UNPROCESSABLE_ENTITY,
};

/// Result type for code that only fails with declared errors.
pub type ApiResult<T> = Result<T, ApiError>;

/// A declared failure condition.
///
/// All variants except [`ApiError::Immediate`] carry an optional structured
/// detail payload, rendered as the response body.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ApiError {
    #[error("bad request")]
    BadRequest(Option<Value>),

    #[error("unauthorized")]
    Unauthorized(Option<Value>),

    #[error("forbidden")]
    Forbidden(Option<Value>),

    #[error("not found")]
    NotFound(Option<Value>),

    #[error("method not allowed")]
    MethodNotAllowed(Option<Value>),

    #[error("unprocessable entity")]
    UnprocessableEntity(Option<Value>),

    /// Server-side fault.
    #[error("application error")]
    Application(Option<Value>),

    /// Short-circuit with a fully formed response, bypassing the status table.
    #[error("immediate response ({})", .0.status())]
    Immediate(Box<Response>),
}

/// Coarse classification used for logging and the debug bypass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Immediate,
    Client,
    Application,
}

impl ApiError {
    pub fn bad_request() -> Self {
        Self::BadRequest(None)
    }

    pub fn unauthorized() -> Self {
        Self::Unauthorized(None)
    }

    pub fn forbidden() -> Self {
        Self::Forbidden(None)
    }

    pub fn not_found() -> Self {
        Self::NotFound(None)
    }

    pub fn method_not_allowed() -> Self {
        Self::MethodNotAllowed(None)
    }

    pub fn unprocessable_entity() -> Self {
        Self::UnprocessableEntity(None)
    }

    pub fn application() -> Self {
        Self::Application(None)
    }

    pub fn immediate(response: Response) -> Self {
        Self::Immediate(Box::new(response))
    }

    /// A required parameter was absent (422, `{"message": "Missing `<param>` param"}`).
    pub fn missing_param(param: &str) -> Self {
        Self::unprocessable_entity().with_message(format!("Missing `{param}` param"))
    }

    /// Attach a detail payload. No-op on [`ApiError::Immediate`].
    pub fn with_detail(mut self, detail: Value) -> Self {
        if let Some(slot) = self.detail_slot() {
            *slot = Some(detail);
        }
        self
    }

    /// Attach `{"message": message}` as the detail payload.
    pub fn with_message(self, message: impl Into<String>) -> Self {
        self.with_detail(json!({ "message": message.into() }))
    }

    fn detail_slot(&mut self) -> Option<&mut Option<Value>> {
        match self {
            Self::BadRequest(d)
            | Self::Unauthorized(d)
            | Self::Forbidden(d)
            | Self::NotFound(d)
            | Self::MethodNotAllowed(d)
            | Self::UnprocessableEntity(d)
            | Self::Application(d) => Some(d),
            Self::Immediate(_) => None,
        }
    }

    pub fn detail(&self) -> Option<&Value> {
        match self {
            Self::BadRequest(d)
            | Self::Unauthorized(d)
            | Self::Forbidden(d)
            | Self::NotFound(d)
            | Self::MethodNotAllowed(d)
            | Self::UnprocessableEntity(d)
            | Self::Application(d) => d.as_ref(),
            Self::Immediate(_) => None,
        }
    }

    /// Fixed status code of the variant (or of the carried response).
    pub fn status(&self) -> u16 {
        match self {
            Self::BadRequest(_) => HTTP_STATUS_BAD_REQUEST,
            Self::Unauthorized(_) => HTTP_STATUS_UNAUTHORIZED,
            Self::Forbidden(_) => HTTP_STATUS_FORBIDDEN,
            Self::NotFound(_) => HTTP_STATUS_NOT_FOUND,
            Self::MethodNotAllowed(_) => HTTP_STATUS_METHOD_NOT_ALLOWED,
            Self::UnprocessableEntity(_) => HTTP_STATUS_UNPROCESSABLE_ENTITY,
            Self::Application(_) => HTTP_STATUS_INTERNAL_SERVER_ERROR,
            Self::Immediate(response) => response.status(),
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Immediate(_) => ErrorClass::Immediate,
            Self::Application(_) => ErrorClass::Application,
            _ => ErrorClass::Client,
        }
    }

    pub fn to_response(&self) -> Response {
        match self {
            Self::Immediate(response) => (**response).clone(),
            other => other.table_response(),
        }
    }

    pub fn into_response(self) -> Response {
        match self {
            Self::Immediate(response) => *response,
            other => other.table_response(),
        }
    }

    fn table_response(&self) -> Response {
        let mut response = Response::known(self.status());
        if let Some(detail) = self.detail() {
            if let Some(message) = detail.get("message").and_then(Value::as_str) {
                response = response.with_error_message(message);
            }
            response = response.with_body(detail.clone());
        }
        response
    }
}

impl From<Response> for ApiError {
    fn from(response: Response) -> Self {
        Self::immediate(response)
    }
}
