//! Wire envelope: `{"meta": {...}, "response": <body>}`.

use serde::Serialize;
use serde_json::Value;

use crate::response::Response;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Meta {
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Envelope placed around every non-debug response.
///
/// `error`/`message` only appear when the status is 400 or above;
/// `response` is the body verbatim (`null` when there is none).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope {
    pub meta: Meta,
    pub response: Value,
}

impl Envelope {
    pub fn from_response(response: &Response) -> Self {
        let meta = if response.is_error() {
            Meta {
                status: response.status(),
                error: Some(response.reason().to_string()),
                message: response.error_message().map(str::to_string),
            }
        } else {
            Meta {
                status: response.status(),
                error: None,
                message: None,
            }
        };

        Self {
            meta,
            response: response.body().cloned().unwrap_or(Value::Null),
        }
    }

    pub fn to_value(&self) -> Value {
        serde_json::json!({
            "meta": self.meta,
            "response": self.response,
        })
    }
}
