//! Per-request context handed to the authentication gate and to operations.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::error::{ApiError, ApiResult};
use crate::headers::Headers;
use crate::id::RequestId;
use crate::identity::Identity;

/// One inbound HTTP request.
///
/// The transport binding fills method, path, headers, arguments and raw body.
/// The dispatcher later binds the decoded payload and the authenticated identity.
#[derive(Debug, Clone)]
pub struct Request {
    id: RequestId,
    method: String,
    path: String,
    headers: Headers,
    path_args: BTreeMap<String, String>,
    query: BTreeMap<String, String>,
    body: Vec<u8>,
    payload: Option<Value>,
    identity: Option<Identity>,
    received_at: DateTime<Utc>,
}

impl Request {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            id: RequestId::new(),
            method: method.into(),
            path: path.into(),
            headers: Headers::new(),
            path_args: BTreeMap::new(),
            query: BTreeMap::new(),
            body: Vec::new(),
            payload: None,
            identity: None,
            received_at: Utc::now(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.set(name, value);
        self
    }

    pub fn with_path_arg(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.path_args.insert(name.into(), value.into());
        self
    }

    pub fn with_path_args(mut self, args: impl IntoIterator<Item = (String, String)>) -> Self {
        self.path_args.extend(args);
        self
    }

    pub fn with_query(mut self, args: impl IntoIterator<Item = (String, String)>) -> Self {
        self.query.extend(args);
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn id(&self) -> RequestId {
        self.id
    }

    /// Method as received (not normalized).
    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn path_args(&self) -> &BTreeMap<String, String> {
        &self.path_args
    }

    pub fn query(&self) -> &BTreeMap<String, String> {
        &self.query
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn received_at(&self) -> DateTime<Utc> {
        self.received_at
    }

    /// Decoded request body, if there was one.
    pub fn payload(&self) -> Option<&Value> {
        self.payload.as_ref()
    }

    pub fn set_payload(&mut self, payload: Option<Value>) {
        self.payload = payload;
    }

    /// Identity bound after successful authentication.
    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn bind_identity(&mut self, identity: Identity) {
        self.identity = Some(identity);
    }

    /// Path argument, falling back to the query string.
    pub fn param(&self, name: &str) -> ApiResult<&str> {
        self.path_args
            .get(name)
            .or_else(|| self.query.get(name))
            .map(String::as_str)
            .ok_or_else(|| ApiError::missing_param(name))
    }

    /// Top-level field of the decoded payload.
    pub fn field(&self, name: &str) -> ApiResult<&Value> {
        self.payload
            .as_ref()
            .and_then(|payload| payload.get(name))
            .filter(|value| !value.is_null())
            .ok_or_else(|| ApiError::missing_param(name))
    }
}
