//! Object-storage "file created" notifications.

use serde_json::Value;

use crate::error::{CrmError, Result};

/// Bucket and key of the object an event refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectLocation {
    pub bucket: String,
    pub key: String,
}

impl ObjectLocation {
    /// Lower-cased extension of the key including the leading dot, or empty.
    pub fn suffix(&self) -> String {
        std::path::Path::new(&self.key)
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
            .unwrap_or_default()
    }
}

/// Read `Records[0].s3.bucket.name` and `Records[0].s3.object.key`.
pub fn parse_storage_event(event: &Value) -> Result<ObjectLocation> {
    let record = event
        .get("Records")
        .and_then(Value::as_array)
        .ok_or_else(|| CrmError::InvalidEvent("missing Records".into()))?
        .first()
        .ok_or_else(|| CrmError::InvalidEvent("Records is empty".into()))?;
    let s3 = record
        .get("s3")
        .ok_or_else(|| CrmError::InvalidEvent("missing s3".into()))?;

    let bucket = string_at(s3, &["bucket", "name"])?;
    let key = string_at(s3, &["object", "key"])?;
    Ok(ObjectLocation { bucket, key })
}

fn string_at(root: &Value, path: &[&str]) -> Result<String> {
    let mut node = root;
    for part in path {
        node = node
            .get(part)
            .ok_or_else(|| CrmError::InvalidEvent(format!("missing s3.{}", path.join("."))))?;
    }
    node.as_str()
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or_else(|| CrmError::InvalidEvent(format!("s3.{} is not a string", path.join("."))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(bucket: Value, key: Value) -> Value {
        json!({"Records": [{"s3": {"bucket": {"name": bucket}, "object": {"key": key}}}]})
    }

    fn invalid(v: Value) -> String {
        match parse_storage_event(&v) {
            Err(CrmError::InvalidEvent(m)) => m,
            other => panic!("expected InvalidEvent, got {other:?}"),
        }
    }

    #[test]
    fn parses_bucket_and_key() {
        let loc = parse_storage_event(&event(json!("exports"), json!("in/Cotiza.ZIP"))).unwrap();
        assert_eq!(loc.bucket, "exports");
        assert_eq!(loc.key, "in/Cotiza.ZIP");
        assert_eq!(loc.suffix(), ".zip");
    }

    #[test]
    fn rejects_each_missing_piece() {
        assert_eq!(invalid(json!({})), "missing Records");
        assert_eq!(invalid(json!({"Records": []})), "Records is empty");
        assert_eq!(invalid(json!({"Records": [{}]})), "missing s3");
        assert_eq!(
            invalid(json!({"Records": [{"s3": {"object": {"key": "k"}}}]})),
            "missing s3.bucket.name"
        );
        assert_eq!(
            invalid(json!({"Records": [{"s3": {"bucket": {"name": "b"}, "object": {}}}]})),
            "missing s3.object.key"
        );
    }

    #[test]
    fn rejects_non_string_values() {
        assert!(invalid(event(json!(3), json!("k"))).contains("bucket.name"));
        assert!(invalid(event(json!("b"), json!(null))).contains("object.key"));
    }

    #[test]
    fn key_without_extension_has_empty_suffix() {
        let loc = ObjectLocation {
            bucket: "b".into(),
            key: "plain".into(),
        };
        assert_eq!(loc.suffix(), "");
    }
}
