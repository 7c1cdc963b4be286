//! Input file parsing for import operations

use std::path::Path;

use serde_json::Value;
use tracing::debug;

use crate::error::{FormatError, Result};
use crate::search::Document;

/// Read a JSON array of documents from `path`
///
/// The whole file is parsed up front so a malformed file is rejected before
/// anything is sent to the service.
///
/// # Arguments
/// * `path` - File holding a JSON array of objects
///
/// # Returns
/// * `Result<Vec<Document>>` - Documents in file order, I/O error or FormatError
pub async fn read_documents(path: &Path) -> Result<Vec<Document>> {
    let text = tokio::fs::read_to_string(path).await?;
    debug!("Read {} bytes from {}", text.len(), path.display());
    parse_documents(&text, &path.display().to_string())
}

/// Parse `text` as a JSON array of objects
///
/// `label` names the source in error messages.
pub fn parse_documents(text: &str, label: &str) -> Result<Vec<Document>> {
    let value: Value = serde_json::from_str(text).map_err(|e| FormatError::InvalidJson {
        path: label.to_string(),
        message: e.to_string(),
    })?;

    let Value::Array(items) = value else {
        return Err(FormatError::NotAnArray {
            path: label.to_string(),
            found: kind(&value),
        }
        .into());
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Object(doc) => Ok(doc),
            other => Err(FormatError::NotAnObject {
                path: label.to_string(),
                index,
                found: kind(&other),
            }
            .into()),
        })
        .collect()
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PorterError;

    #[test]
    fn test_parse_array_of_objects() {
        let docs = parse_documents(r#"[{"id": "1", "b": 2, "a": 1}, {"id": "2"}]"#, "in.json").unwrap();
        assert_eq!(docs.len(), 2);
        let keys: Vec<&str> = docs[0].keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["id", "b", "a"]);
    }

    #[test]
    fn test_empty_array() {
        assert!(parse_documents("[]", "in.json").unwrap().is_empty());
    }

    #[test]
    fn test_top_level_object_is_rejected() {
        let err = parse_documents(r#"{"value": []}"#, "in.json").unwrap_err();
        assert!(matches!(
            err,
            PorterError::Format(FormatError::NotAnArray { found: "an object", .. })
        ));
    }

    #[test]
    fn test_non_object_element_reports_index() {
        let err = parse_documents(r#"[{"id": "1"}, 7]"#, "in.json").unwrap_err();
        match err {
            PorterError::Format(FormatError::NotAnObject { index, found, .. }) => {
                assert_eq!(index, 1);
                assert_eq!(found, "a number");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_invalid_json() {
        let err = parse_documents("[{\"id\": ", "in.json").unwrap_err();
        assert!(matches!(err, PorterError::Format(FormatError::InvalidJson { .. })));
        assert!(err.to_string().contains("in.json"));
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let err = read_documents(Path::new("/nonexistent/in.json")).await.unwrap_err();
        assert!(matches!(err, PorterError::Io(_)));
    }
}
