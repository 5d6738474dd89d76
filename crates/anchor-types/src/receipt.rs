use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::TypeError;
use crate::json;

/// Consensus receipt returned by the ledger for a committed transaction.
///
/// The document is opaque: nothing here interprets its fields. It is only
/// rendered in a reproducible form for storage.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Receipt(Value);

impl Receipt {
    pub fn new(document: Value) -> Self {
        Self(document)
    }

    pub fn document(&self) -> &Value {
        &self.0
    }

    /// Pretty JSON with every object's keys sorted, 2-space indentation and
    /// non-ASCII characters escaped.
    pub fn to_canonical_json(&self) -> Result<String, TypeError> {
        json::to_pretty_string(&sort_keys(&self.0))
    }
}

// Rebuilds objects in key order so the output is sorted even when
// serde_json's `preserve_order` feature is enabled somewhere in the graph.
fn sort_keys(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            let mut sorted = Map::new();
            for (key, inner) in entries {
                sorted.insert(key.clone(), sort_keys(inner));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(sort_keys).collect()),
        other => other.clone(),
    }
}
