//! Request/response values exchanged with the upstream API.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::error::ApiError;

/// HTTP verbs used by the upstream contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the response body should be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BodyMode {
    /// JSON when the declared content type says so, raw bytes otherwise.
    #[default]
    Sniff,
    /// Always raw bytes (media endpoints).
    Raw,
}

/// A request relative to the configured base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    pub mode: BodyMode,
}

impl ApiRequest {
    pub fn get(path: &str) -> Self {
        Self {
            method: Method::Get,
            path: path.to_string(),
            query: Vec::new(),
            body: None,
            mode: BodyMode::Sniff,
        }
    }

    pub fn post(path: &str, body: Value) -> Self {
        Self {
            method: Method::Post,
            path: path.to_string(),
            query: Vec::new(),
            body: Some(body),
            mode: BodyMode::Sniff,
        }
    }

    /// Append a query parameter.
    pub fn param(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn raw(mut self) -> Self {
        self.mode = BodyMode::Raw;
        self
    }

    /// Query parameters as a JSON object, for logging.
    pub fn query_json(&self) -> Option<Value> {
        if self.query.is_empty() {
            return None;
        }
        let map = self
            .query
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        Some(Value::Object(map))
    }
}

/// Parsed body of a successful response.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Json(Value),
    Bytes(Vec<u8>),
}

/// A successful (2xx) response.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: ResponseBody,
}

impl ApiResponse {
    pub fn json(value: Value) -> Self {
        Self {
            status: 200,
            content_type: Some("application/json".to_string()),
            body: ResponseBody::Json(value),
        }
    }

    pub fn bytes(content_type: &str, bytes: Vec<u8>) -> Self {
        Self {
            status: 200,
            content_type: Some(content_type.to_string()),
            body: ResponseBody::Bytes(bytes),
        }
    }

    /// Deserialize the JSON body into `T`.
    pub fn into_json<T: DeserializeOwned>(self) -> Result<T, ApiError> {
        match self.body {
            ResponseBody::Json(value) => Ok(serde_json::from_value(value)?),
            ResponseBody::Bytes(bytes) => Ok(serde_json::from_slice(&bytes)?),
        }
    }

    /// Body as raw bytes, re-serializing JSON if needed.
    pub fn into_bytes(self) -> Vec<u8> {
        match self.body {
            ResponseBody::Bytes(bytes) => bytes,
            ResponseBody::Json(value) => value.to_string().into_bytes(),
        }
    }
}

/// The seam between callers and the network.
///
/// `ApiClient` is the production implementation; tests drive sessions and
/// resolvers through scripted implementations.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_json_empty_is_none() {
        assert_eq!(ApiRequest::get("/cameras").query_json(), None);
    }

    #[test]
    fn test_query_json_preserves_params() {
        let req = ApiRequest::get("/site").param("id", "abc").param("limit", 5);
        assert_eq!(req.query_json(), Some(json!({"id": "abc", "limit": "5"})));
    }

    #[test]
    fn test_into_json_from_bytes() {
        let resp = ApiResponse::bytes("text/plain", br#"{"ok": true}"#.to_vec());
        let v: Value = resp.into_json().unwrap();
        assert_eq!(v, json!({"ok": true}));
    }
}
