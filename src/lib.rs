//! vmsquery - operator console for a video-management-system REST API.
//!
//! Camera inventory, paginated event and appearance searches with token
//! continuation, and media retrieval with region-of-interest cropping.

pub mod api;
pub mod config;
pub mod media;
pub mod models;
pub mod projector;
pub mod search;

pub use api::{ApiClient, ApiError, ApiRequest, ApiResponse, RequestLog, Transport};
pub use config::{load_settings, Config, Settings};
pub use media::{CacheKey, CropTarget, MediaFormat, MediaHandle, MediaPayload, MediaResolver};
pub use models::{Record, RecordKind};
pub use projector::{project, DerivedView, ViewKind};
pub use search::{QueryParams, SearchSession, SessionState};
