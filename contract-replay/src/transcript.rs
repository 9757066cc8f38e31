use crate::error::Error;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::{fs, path::Path};

/// One recorded exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    /// Informational only, never validated.
    #[serde(default)]
    pub timestamp: String,
    pub request: RequestRecord,
    pub response: ResponseRecord,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestRecord {
    pub method: String,
    pub path: String,
    #[serde(default, deserialize_with = "nullable_headers")]
    pub headers: IndexMap<String, String>,
    #[serde(default)]
    pub body: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseRecord {
    pub status: i64,
    #[serde(default, deserialize_with = "nullable_headers")]
    pub headers: IndexMap<String, String>,
    #[serde(default)]
    pub body: Option<Value>,
}

// headers keep source order so that a later key wins over an earlier one that
// differs only in case
fn nullable_headers<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<IndexMap<String, String>, D::Error> {
    Ok(Option::<IndexMap<String, String>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Decodes a whole transcript. Any structural mismatch fails the whole file.
pub fn decode(bytes: &[u8]) -> Result<Vec<TranscriptEntry>, serde_json::Error> {
    serde_json::from_slice(bytes)
}

pub fn load_transcript<P: AsRef<Path>>(path: P) -> Result<Vec<TranscriptEntry>, Error> {
    let path = path.as_ref();
    let contents = fs::read(path).map_err(|e| Error::ReadTranscript(path.to_path_buf(), e))?;

    decode(&contents).map_err(Error::DecodeTranscript)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_full_entry() {
        let entries = decode(
            br#"[{
                "timestamp": "2024-03-01T10:00:00Z",
                "request": {
                    "method": "POST",
                    "path": "/pets?dry_run=true",
                    "headers": {"Content-Type": "application/json"},
                    "body": {"name": "Rex"}
                },
                "response": {
                    "status": 201,
                    "headers": {"Content-Type": "application/json"},
                    "body": {"id": 7, "name": "Rex"}
                }
            }]"#,
        )
        .unwrap();

        assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        assert_eq!(entry.timestamp, "2024-03-01T10:00:00Z");
        assert_eq!(entry.request.method, "POST");
        assert_eq!(entry.request.path, "/pets?dry_run=true");
        assert_eq!(entry.request.body, Some(json!({"name": "Rex"})));
        assert_eq!(entry.response.status, 201);
        assert_eq!(entry.response.body, Some(json!({"id": 7, "name": "Rex"})));
    }

    #[test]
    fn optional_fields_may_be_absent_or_null() {
        let entries = decode(
            br#"[{
                "request": {"method": "GET", "path": "/pets", "headers": null, "body": null},
                "response": {"status": 204}
            }]"#,
        )
        .unwrap();

        let entry = &entries[0];
        assert!(entry.timestamp.is_empty());
        assert!(entry.request.headers.is_empty());
        assert!(entry.request.body.is_none());
        assert!(entry.response.headers.is_empty());
        assert!(entry.response.body.is_none());
    }

    #[test]
    fn duplicate_header_keys_keep_last_value() {
        let entries = decode(
            br#"[{
                "request": {"method": "GET", "path": "/", "headers": {"Accept": "a", "Accept": "b"}},
                "response": {"status": 200}
            }]"#,
        )
        .unwrap();

        assert_eq!(entries[0].request.headers.get("Accept").unwrap(), "b");
    }

    #[test]
    fn bare_object_is_rejected() {
        let result = decode(
            br#"{"request": {"method": "GET", "path": "/"}, "response": {"status": 200}}"#,
        );

        assert!(result.is_err());
    }

    #[test]
    fn one_malformed_entry_rejects_the_file() {
        let result = decode(
            br#"[
                {"request": {"method": "GET", "path": "/"}, "response": {"status": 200}},
                {"request": {"method": "GET"}, "response": {"status": 200}}
            ]"#,
        );

        assert!(result.is_err());
    }

    #[test]
    fn non_string_header_values_are_rejected() {
        let result = decode(
            br#"[{
                "request": {"method": "GET", "path": "/", "headers": {"X-Count": 3}},
                "response": {"status": 200}
            }]"#,
        );

        assert!(result.is_err());
    }

    #[test]
    fn load_reports_missing_file() {
        let result = load_transcript("/nonexistent/requests.json");

        assert!(matches!(result, Err(Error::ReadTranscript(_, _))));
    }
}
