//! HTTP client for the VMS REST API with request logging.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tracing::{debug, warn};
use url::Url;

use super::error::ApiError;
use super::request::{ApiRequest, ApiResponse, BodyMode, Method, ResponseBody, Transport};
use super::request_log::{RequestLog, RequestLogEntry};

const USER_AGENT: &str = concat!("vmsquery/", env!("CARGO_PKG_VERSION"));

/// Longest upstream error body echoed into an `HttpStatus` message.
const MAX_ERROR_BODY_CHARS: usize = 200;

/// Resolve user agent from config value.
/// - None => default vmsquery user agent
/// - other => custom user agent string
pub fn resolve_user_agent(config: Option<&str>) -> String {
    match config {
        None | Some("") => USER_AGENT.to_string(),
        Some(custom) => custom.to_string(),
    }
}

/// Client bound to one upstream base URL.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    request_log: RequestLog,
}

impl ApiClient {
    /// Create a new client for `base_url` (e.g. `http://localhost:8000/api`).
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        Self::with_user_agent(base_url, timeout, None)
    }

    /// Create a new client with custom user agent configuration.
    pub fn with_user_agent(
        base_url: &str,
        timeout: Duration,
        user_agent_config: Option<&str>,
    ) -> Result<Self, ApiError> {
        let parsed = Url::parse(base_url)
            .map_err(|e| ApiError::precondition(format!("invalid base URL {base_url}: {e}")))?;
        if parsed.cannot_be_a_base() {
            return Err(ApiError::precondition(format!(
                "base URL {base_url} cannot carry paths"
            )));
        }

        let user_agent = resolve_user_agent(user_agent_config);
        let client = Client::builder()
            .user_agent(&user_agent)
            .timeout(timeout)
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(|e| ApiError::Network(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            request_log: RequestLog::new(),
        })
    }

    /// Share an existing request log (e.g. one owned by the UI).
    pub fn with_request_log(mut self, log: RequestLog) -> Self {
        self.request_log = log;
        self
    }

    pub fn request_log(&self) -> &RequestLog {
        &self.request_log
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for a path relative to the base URL.
    pub fn endpoint_url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Issue a request and interpret the body.
    pub async fn request(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let url = self.endpoint_url(&request.path);

        let mut entry = RequestLogEntry::new(request.method.as_str(), &url);
        entry.params = request.query_json();
        entry.body = request.body.clone();
        self.request_log.record(entry);

        let mut builder = match request.method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
        };
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        debug!(method = %request.method, url = %url, "Sending request");
        let start = Instant::now();
        let response = builder.send().await?;
        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        debug!(
            status = status.as_u16(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Received response"
        );

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("{} {} failed with HTTP {}", request.method, url, status);
            return Err(ApiError::HttpStatus {
                status: status.as_u16(),
                message: error_message(status.canonical_reason(), &body),
            });
        }

        let bytes = response.bytes().await?.to_vec();
        let body = decode_body(request.mode, content_type.as_deref(), bytes)?;

        Ok(ApiResponse {
            status: status.as_u16(),
            content_type,
            body,
        })
    }
}

#[async_trait]
impl Transport for ApiClient {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        self.request(request).await
    }
}

/// Whether a Content-Type header declares a single JSON document.
pub fn is_json_content_type(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    essence == "application/json" || essence.ends_with("+json")
}

/// Interpret a 2xx body according to the request mode and declared type.
pub fn decode_body(
    mode: BodyMode,
    content_type: Option<&str>,
    bytes: Vec<u8>,
) -> Result<ResponseBody, ApiError> {
    if mode == BodyMode::Raw {
        return Ok(ResponseBody::Bytes(bytes));
    }

    match content_type {
        Some(ct) if is_json_content_type(ct) => Ok(ResponseBody::Json(serde_json::from_slice(
            &bytes,
        )?)),
        Some(_) => Ok(ResponseBody::Bytes(bytes)),
        None => {
            // Undeclared: binary signatures win, otherwise try JSON.
            if infer::get(&bytes).is_some() {
                return Ok(ResponseBody::Bytes(bytes));
            }
            match serde_json::from_slice(&bytes) {
                Ok(value) => Ok(ResponseBody::Json(value)),
                Err(_) => Ok(ResponseBody::Bytes(bytes)),
            }
        }
    }
}

/// Build an `HttpStatus` message from the reason phrase and body (UTF-8 safe).
fn error_message(reason: Option<&str>, body: &str) -> String {
    let body = body.trim();
    let mut end = body.len().min(MAX_ERROR_BODY_CHARS);
    while end > 0 && !body.is_char_boundary(end) {
        end -= 1;
    }
    let reason = reason.unwrap_or("Unknown status");
    if end == 0 {
        reason.to_string()
    } else {
        format!("{}: {}", reason, &body[..end])
    }
}
