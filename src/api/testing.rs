//! Scripted in-memory transport for unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use super::error::ApiError;
use super::request::{ApiRequest, ApiResponse, Transport};

/// Replays queued responses in order and records every request it sees.
/// Running out of responses is a `Network` failure.
#[derive(Default)]
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<Result<ApiResponse, ApiError>>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, response: Result<ApiResponse, ApiError>) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub fn push_json(&self, value: Value) {
        self.push(Ok(ApiResponse::json(value)));
    }

    pub fn push_bytes(&self, content_type: &str, bytes: Vec<u8>) {
        self.push(Ok(ApiResponse::bytes(content_type, bytes)));
    }

    pub fn push_status(&self, status: u16) {
        self.push(Err(ApiError::HttpStatus {
            status,
            message: "scripted failure".to_string(),
        }));
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ApiError::Network("no scripted response".to_string())))
    }
}
