use serde_json::Value;

use super::convention::{camelize, underscorize};
use super::json::to_sorted_json;
use super::{CodecError, Serializer};

/// JSON with `snake_case` keys in memory and `camelCase` keys on the wire.
#[derive(Debug, Clone, Copy, Default)]
pub struct CamelCaseJsonSerializer;

impl CamelCaseJsonSerializer {
    pub fn new() -> Self {
        Self
    }
}

impl Serializer for CamelCaseJsonSerializer {
    fn encode(&self, value: &Value) -> Result<String, CodecError> {
        to_sorted_json(&camelize(value))
    }

    fn decode(&self, text: &str) -> Result<Value, CodecError> {
        let value: Value = serde_json::from_str(text)?;
        Ok(underscorize(&value))
    }
}
