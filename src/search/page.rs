//! One page of search results as returned by the upstream.

use serde_json::Value;

use crate::api::ApiError;
use crate::models::deserializers::value_to_string;
use crate::models::{Record, RecordKind};

/// Records plus the continuation token, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub records: Vec<Record>,
    pub token: Option<String>,
}

impl Page {
    /// Parse `{"result": {"<key>": [...], "token": "..."}}`.
    ///
    /// A body without a `result` object is a decode failure. A missing or
    /// non-array list is an empty page, and an empty token counts as absent.
    pub fn parse(kind: RecordKind, results_key: &str, body: Value) -> Result<Self, ApiError> {
        let Value::Object(mut root) = body else {
            return Err(ApiError::decode("search response is not a JSON object"));
        };
        let Some(Value::Object(mut result)) = root.remove("result") else {
            return Err(ApiError::decode("search response has no result object"));
        };

        let records = match result.remove(results_key) {
            Some(Value::Array(items)) => items
                .into_iter()
                .map(|item| Record::from_value(kind, item))
                .collect(),
            _ => Vec::new(),
        };
        let token = result.get("token").and_then(value_to_string);

        Ok(Self { records, token })
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_events_page() {
        let page = Page::parse(
            RecordKind::Event,
            "events",
            json!({"result": {"events": [{"thisId": "a"}, {"thisId": "b"}], "token": "t1"}}),
        )
        .unwrap();
        assert_eq!(page.records.len(), 2);
        assert_eq!(page.token.as_deref(), Some("t1"));
    }

    #[test]
    fn test_empty_token_is_absent() {
        let page = Page::parse(
            RecordKind::Appearance,
            "results",
            json!({"result": {"results": [{}], "token": ""}}),
        )
        .unwrap();
        assert_eq!(page.token, None);
    }

    #[test]
    fn test_non_array_list_is_empty() {
        let page = Page::parse(
            RecordKind::Appearance,
            "results",
            json!({"result": {"results": {}}}),
        )
        .unwrap();
        assert!(page.is_empty());
    }

    #[test]
    fn test_missing_result_is_decode_error() {
        let err = Page::parse(RecordKind::Event, "events", json!({"error": "x"})).unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
        let err = Page::parse(RecordKind::Event, "events", json!([1])).unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }
}
