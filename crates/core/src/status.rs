//! HTTP status codes and the standard reason-phrase table.

use thiserror::Error;

pub const HTTP_STATUS_OK: u16 = 200;
pub const HTTP_STATUS_CREATED: u16 = 201;
pub const HTTP_STATUS_NO_CONTENT: u16 = 204;
pub const HTTP_STATUS_BAD_REQUEST: u16 = 400;
pub const HTTP_STATUS_UNAUTHORIZED: u16 = 401;
pub const HTTP_STATUS_FORBIDDEN: u16 = 403;
pub const HTTP_STATUS_NOT_FOUND: u16 = 404;
pub const HTTP_STATUS_METHOD_NOT_ALLOWED: u16 = 405;
pub const HTTP_STATUS_UNPROCESSABLE_ENTITY: u16 = 422;
pub const HTTP_STATUS_INTERNAL_SERVER_ERROR: u16 = 500;
pub const HTTP_STATUS_NOT_IMPLEMENTED: u16 = 501;

/// A status code with no standard reason phrase was set without an explicit reason.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("unknown status code {0}")]
pub struct InvalidStatusCode(pub u16);

/// Standard reason phrase for `code`, if the code is registered.
pub fn reason_phrase(code: u16) -> Option<&'static str> {
    http::StatusCode::from_u16(code)
        .ok()
        .and_then(|status| status.canonical_reason())
}

/// Resolve the reason phrase for a status line.
///
/// An explicit `reason` always wins; otherwise the code must be in the table.
pub fn resolve_reason(code: u16, reason: Option<&str>) -> Result<String, InvalidStatusCode> {
    match reason {
        Some(reason) => Ok(reason.to_string()),
        None => reason_phrase(code)
            .map(str::to_string)
            .ok_or(InvalidStatusCode(code)),
    }
}
