//! Response model: one HTTP outcome (status line, headers, body).

use serde_json::Value;

use crate::headers::Headers;
use crate::status::{
    self, InvalidStatusCode, HTTP_STATUS_CREATED, HTTP_STATUS_METHOD_NOT_ALLOWED,
    HTTP_STATUS_NOT_IMPLEMENTED, HTTP_STATUS_NO_CONTENT, HTTP_STATUS_OK,
};

/// An HTTP outcome produced by an operation or a declared error.
///
/// Status code and reason phrase only change together through
/// [`Response::set_status`], so they never disagree. Headers stay mutable
/// until the response is rendered.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    status: u16,
    reason: String,
    headers: Headers,
    body: Option<Value>,
    error_message: Option<String>,
}

impl Response {
    /// Response with a status code from the standard table.
    pub fn new(status: u16) -> Result<Self, InvalidStatusCode> {
        let reason = status::resolve_reason(status, None)?;
        Ok(Self::from_parts(status, reason))
    }

    /// Response with an explicit reason phrase (the code need not be registered).
    pub fn with_reason(status: u16, reason: impl Into<String>) -> Self {
        Self::from_parts(status, reason.into())
    }

    pub fn ok() -> Self {
        Self::known(HTTP_STATUS_OK)
    }

    pub fn created() -> Self {
        Self::known(HTTP_STATUS_CREATED)
    }

    pub fn no_content() -> Self {
        Self::known(HTTP_STATUS_NO_CONTENT)
    }

    pub fn method_not_allowed() -> Self {
        Self::known(HTTP_STATUS_METHOD_NOT_ALLOWED)
    }

    pub fn not_implemented() -> Self {
        Self::known(HTTP_STATUS_NOT_IMPLEMENTED)
    }

    /// Codes declared in [`crate::status`] are always in the table.
    pub(crate) fn known(status: u16) -> Self {
        let reason = status::reason_phrase(status).unwrap_or_default();
        Self::from_parts(status, reason.to_string())
    }

    fn from_parts(status: u16, reason: String) -> Self {
        Self {
            status,
            reason,
            headers: Headers::new(),
            body: None,
            error_message: None,
        }
    }

    pub fn with_body(mut self, body: impl Into<Value>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.set(name, value);
        self
    }

    pub fn with_error_message(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }

    /// Change the status line.
    ///
    /// Without `reason`, `code` must have a standard reason phrase.
    pub fn set_status(&mut self, code: u16, reason: Option<&str>) -> Result<(), InvalidStatusCode> {
        self.reason = status::resolve_reason(code, reason)?;
        self.status = code;
        Ok(())
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn is_error(&self) -> bool {
        self.status >= 400
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }

    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    /// Human-readable message surfaced as `meta.message` on error responses.
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }
}
