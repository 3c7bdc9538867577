//! Loading recorded update batches.

use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;

/// Read batches from a recording.
///
/// A recording is either one JSON document (a single batch, or an object
/// with a `batches` array) or JSON Lines with one batch per line.
pub fn load_batches(path: &Path) -> Result<Vec<Value>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    parse_batches(&text)
}

pub fn parse_batches(text: &str) -> Result<Vec<Value>> {
    if let Ok(document) = serde_json::from_str::<Value>(text) {
        return Ok(match document {
            Value::Object(mut obj) if obj.get("batches").is_some_and(Value::is_array) => {
                match obj.remove("batches") {
                    Some(Value::Array(batches)) => batches,
                    _ => Vec::new(),
                }
            }
            other => vec![other],
        });
    }

    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            serde_json::from_str(line).with_context(|| format!("Invalid JSON on line {}", idx + 1))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_document_is_one_batch() {
        let batches = parse_batches(r#"[{"id": "a"}, {"id": "b"}]"#).unwrap();
        assert_eq!(batches.len(), 1);
    }

    #[test]
    fn batches_key_is_unwrapped() {
        let batches = parse_batches(r#"{"batches": [[{"id": "a"}], {"features": []}]}"#).unwrap();
        assert_eq!(batches.len(), 2);
    }

    #[test]
    fn json_lines_are_split() {
        let text = "[{\"id\": \"a\"}]\n\n{\"features\": []}\n";
        assert_eq!(parse_batches(text).unwrap().len(), 2);
    }

    #[test]
    fn bad_line_reports_its_number() {
        let err = parse_batches("[]\n{oops\n").unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }
}
