//! Outgoing response buffer for one request.
//!
//! Collects status line, headers and body chunks until [`ResponseWriter::finish`]
//! hands the finished [`WireResponse`] to the transport. After that every
//! mutation fails with [`WriteError::AfterFinish`].

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use resto_core::status::{self, HTTP_STATUS_OK, InvalidStatusCode};
use resto_core::{CodecError, Headers, Serializer};

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("cannot write() after finish()")]
    AfterFinish,

    #[error(transparent)]
    Status(#[from] InvalidStatusCode),

    #[error("failed to encode body: {0}")]
    Encode(#[from] CodecError),
}

/// A piece of body.
#[derive(Debug, Clone, PartialEq)]
pub enum Chunk {
    /// Encoded with the writer's serializer; sets `Content-Type`.
    Structured(Value),
    Text(String),
}

impl From<Value> for Chunk {
    fn from(value: Value) -> Self {
        Self::Structured(value)
    }
}

impl From<String> for Chunk {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for Chunk {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

/// A finished response, ready for the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireResponse {
    pub status: u16,
    pub reason: String,
    pub headers: Headers,
    pub body: Vec<u8>,
}

impl WireResponse {
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[derive(Debug)]
pub struct ResponseWriter {
    serializer: Arc<dyn Serializer>,
    status: u16,
    reason: String,
    headers: Headers,
    buffer: Vec<u8>,
    finished: bool,
}

impl ResponseWriter {
    pub fn new(serializer: Arc<dyn Serializer>) -> Self {
        Self {
            serializer,
            status: HTTP_STATUS_OK,
            reason: status::reason_phrase(HTTP_STATUS_OK).unwrap_or_default().to_string(),
            headers: Headers::new(),
            buffer: Vec::new(),
            finished: false,
        }
    }

    fn ensure_open(&self) -> Result<(), WriteError> {
        if self.finished {
            return Err(WriteError::AfterFinish);
        }
        Ok(())
    }

    /// Without `reason`, `code` must have a standard reason phrase.
    pub fn set_status(&mut self, code: u16, reason: Option<&str>) -> Result<(), WriteError> {
        self.ensure_open()?;
        self.reason = status::resolve_reason(code, reason)?;
        self.status = code;
        Ok(())
    }

    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) -> Result<(), WriteError> {
        self.ensure_open()?;
        self.headers.set(name, value);
        Ok(())
    }

    /// Drop every header set so far and start from `headers`.
    pub fn replace_headers(&mut self, headers: Headers) -> Result<(), WriteError> {
        self.ensure_open()?;
        self.headers = headers;
        Ok(())
    }

    pub fn write(&mut self, chunk: impl Into<Chunk>) -> Result<(), WriteError> {
        self.ensure_open()?;
        match chunk.into() {
            Chunk::Structured(value) => {
                let encoded = self.serializer.encode(&value)?;
                self.headers
                    .set("Content-Type", self.serializer.full_content_type());
                self.buffer.extend_from_slice(encoded.as_bytes());
            }
            Chunk::Text(text) => self.buffer.extend_from_slice(text.as_bytes()),
        }
        Ok(())
    }

    /// Complete the response. Only the first call yields a [`WireResponse`].
    pub fn finish(&mut self) -> Result<WireResponse, WriteError> {
        self.ensure_open()?;
        self.finished = true;
        Ok(WireResponse {
            status: self.status,
            reason: std::mem::take(&mut self.reason),
            headers: std::mem::take(&mut self.headers),
            body: std::mem::take(&mut self.buffer),
        })
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}
