//! Upstream VMS REST API access.

pub mod client;
pub mod error;
pub mod inventory;
pub mod request;
pub mod request_log;

#[cfg(test)]
pub(crate) mod testing;

pub use client::ApiClient;
pub use error::ApiError;
pub use inventory::Endpoint;
pub use request::{ApiRequest, ApiResponse, BodyMode, Method, ResponseBody, Transport};
pub use request_log::{RequestLog, RequestLogEntry};
