//! JSON document codec for the snippets file.
//!
//! The on-disk shape is a single object mapping group names to arrays of
//! message strings. Reading is lenient: anything that is not that shape is
//! coerced to the nearest valid value instead of being rejected, so a
//! hand-edited or truncated file never blocks startup.

use crate::config::ALL_MESSAGES;
use crate::error::Result;
use crate::models::{default_groups, Groups};
use serde_json::{Map, Value};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// Build the persisted document. The virtual group is never written.
pub fn serialize(groups: &Groups) -> Value {
    let mut object = Map::with_capacity(groups.len());
    for (name, messages) in groups {
        if name == ALL_MESSAGES {
            continue;
        }
        let values = messages.iter().cloned().map(Value::String).collect();
        object.insert(name.clone(), Value::Array(values));
    }
    Value::Object(object)
}

/// Repair a parsed document into a valid mapping.
pub fn deserialize(document: Value) -> Groups {
    let Value::Object(object) = document else {
        tracing::warn!("snippets document is not an object, using the default dataset");
        return default_groups();
    };

    let mut groups = Groups::with_capacity(object.len());
    for (name, value) in object {
        if name == ALL_MESSAGES {
            continue;
        }
        let messages = match value {
            Value::Array(items) => items.into_iter().filter_map(scalar_to_string).collect(),
            _ => Vec::new(),
        };
        groups.insert(name, messages);
    }
    groups
}

fn scalar_to_string(value: Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Parse file content. Empty or unparseable content is treated like a
/// non-object document.
pub fn parse_document(content: &str) -> Groups {
    if content.trim().is_empty() {
        return default_groups();
    }
    match serde_json::from_str::<Value>(content) {
        Ok(document) => deserialize(document),
        Err(err) => {
            tracing::warn!("snippets file is not valid JSON ({}), using the default dataset", err);
            default_groups()
        }
    }
}

/// Read the snippets file. `Ok(None)` when the file does not exist.
pub fn read_file(path: &Path) -> Result<Option<Groups>> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(parse_document(&content))),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err.into()),
    }
}

/// Write the snippets file, creating its directory when needed.
pub fn write_file(path: &Path, groups: &Groups) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }
    let serialized = serde_json::to_string_pretty(&serialize(groups))?;
    fs::write(path, serialized)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn groups(pairs: &[(&str, &[&str])]) -> Groups {
        pairs
            .iter()
            .map(|(name, messages)| {
                (
                    name.to_string(),
                    messages.iter().map(|m| m.to_string()).collect(),
                )
            })
            .collect()
    }

    #[test]
    fn serialize_skips_the_virtual_group() {
        let mut data = groups(&[("General", &["hola"])]);
        data.insert(ALL_MESSAGES.to_string(), vec!["leak".to_string()]);
        let document = serialize(&data);
        assert_eq!(document, json!({ "General": ["hola"] }));
    }

    #[test]
    fn round_trip_is_stable_and_keeps_order() {
        let data = groups(&[
            ("zeta", &["1", "2"]),
            ("Alpha", &["multi\nline", "dup", "dup"]),
            ("empty", &[]),
        ]);
        let once = serialize(&data);
        let twice = serialize(&deserialize(once.clone()));
        assert_eq!(once, twice);
        let names: Vec<_> = deserialize(once).keys().cloned().collect();
        assert_eq!(names, vec!["zeta", "Alpha", "empty"]);
    }

    #[test]
    fn deserialize_coerces_scalars_and_drops_the_rest() {
        let document = json!({
            "Mixed": ["text", 42, 1.5, true, null, ["nested"], {"k": "v"}],
            "NotAList": "oops",
            "Todos Los mensajes": ["virtual"],
        });
        let data = deserialize(document);
        assert_eq!(data["Mixed"], vec!["text", "42", "1.5", "true"]);
        assert!(data["NotAList"].is_empty());
        assert!(!data.contains_key(ALL_MESSAGES));
    }

    #[test]
    fn non_object_documents_become_the_default_dataset() {
        assert_eq!(deserialize(json!(["a", "b"])), default_groups());
        assert_eq!(deserialize(json!("text")), default_groups());
        assert_eq!(parse_document("   "), default_groups());
        assert_eq!(parse_document("{ not json"), default_groups());
    }

    #[test]
    fn write_then_read_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub").join("snippets.json");
        assert!(read_file(&path).unwrap().is_none());

        let data = groups(&[("Ventas", &["Envío en 24-48 h hábiles."])]);
        write_file(&path, &data).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("Envío"), "non-ASCII is written literally");
        assert!(content.contains("\n  \"Ventas\""), "pretty printed");
        assert_eq!(read_file(&path).unwrap(), Some(data));
    }
}
