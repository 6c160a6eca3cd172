use serde::ser::{Serialize, SerializeSeq};
use serde_json::Value;

use super::{CodecError, Serializer};

/// Plain JSON: keys sorted, non-ASCII text left unescaped.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer;

impl JsonSerializer {
    pub fn new() -> Self {
        Self
    }
}

impl Serializer for JsonSerializer {
    fn encode(&self, value: &Value) -> Result<String, CodecError> {
        to_sorted_json(value)
    }

    fn decode(&self, text: &str) -> Result<Value, CodecError> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Encode with object keys in sorted order at every depth.
///
/// Ordering is enforced here rather than relying on the map type `serde_json`
/// was compiled with.
pub(crate) fn to_sorted_json(value: &Value) -> Result<String, CodecError> {
    Ok(serde_json::to_string(&Sorted(value))?)
}

struct Sorted<'a>(&'a Value);

impl Serialize for Sorted<'_> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0 {
            Value::Object(map) => {
                let mut entries: Vec<_> = map.iter().collect();
                entries.sort_by(|a, b| a.0.cmp(b.0));
                serializer.collect_map(entries.into_iter().map(|(k, v)| (k, Sorted(v))))
            }
            Value::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(&Sorted(item))?;
                }
                seq.end()
            }
            scalar => scalar.serialize(serializer),
        }
    }
}
