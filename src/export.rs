use crate::error::{Error, Result};
use crate::storage::KvStore;
use serde_json::{Map, Value};

/// Serialize every persisted key into one JSON object: `{"key": "raw value"}`.
/// Values are stored verbatim as strings, exactly as the store holds them.
pub fn export_snapshot(kv: &dyn KvStore) -> Result<String> {
    let mut doc = Map::new();
    for key in kv.keys() {
        if let Some(value) = kv.get(&key) {
            doc.insert(key, Value::String(value));
        }
    }
    Ok(serde_json::to_string_pretty(&Value::Object(doc))?)
}

/// Restore a snapshot. The whole document is validated before anything is
/// written: a malformed snapshot leaves the store untouched. A valid one
/// clears the store and restores every entry verbatim.
pub fn import_snapshot(kv: &mut dyn KvStore, raw: &str) -> Result<()> {
    let doc: Value = serde_json::from_str(raw)
        .map_err(|e| Error::MalformedImport(e.to_string()))?;
    let Value::Object(entries) = doc else {
        return Err(Error::MalformedImport("expected a top-level object".into()));
    };
    let mut pairs = Vec::with_capacity(entries.len());
    for (key, value) in entries {
        match value {
            Value::String(s) => pairs.push((key, s)),
            other => {
                return Err(Error::MalformedImport(format!(
                    "key {key:?} holds a {} instead of a string",
                    json_type(&other)
                )))
            }
        }
    }

    for key in kv.keys() {
        kv.remove(&key)?;
    }
    for (key, value) in pairs {
        kv.set(&key, &value)?;
    }
    Ok(())
}

fn json_type(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
