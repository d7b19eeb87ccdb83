//! Media retrieval and region-of-interest cropping.

pub mod crop;
pub mod resolver;

pub use crop::{crop_to_rect, roi_to_pixels, CroppedImage, PixelRect};
pub use resolver::{parse_json_lines, MediaPayload, MediaResolver};

use serde::{Deserialize, Serialize};

use crate::api::{ApiError, ApiRequest};
use crate::models::Roi;

pub const MEDIA_PATH: &str = "/media";

/// Representation requested from `/media`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaFormat {
    /// Fragmented MP4 clip.
    Fmp4,
    /// Single JPEG frame.
    Jpeg,
    /// Newline-delimited JSON metadata.
    Json,
}

impl MediaFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaFormat::Fmp4 => "fmp4",
            MediaFormat::Jpeg => "jpeg",
            MediaFormat::Json => "json",
        }
    }

    /// File extension for saved payloads.
    pub fn extension(&self) -> &'static str {
        match self {
            MediaFormat::Fmp4 => "mp4",
            MediaFormat::Jpeg => "jpg",
            MediaFormat::Json => "ndjson",
        }
    }
}

impl std::str::FromStr for MediaFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fmp4" | "video" => Ok(MediaFormat::Fmp4),
            "jpeg" | "jpg" => Ok(MediaFormat::Jpeg),
            "json" => Ok(MediaFormat::Json),
            other => Err(format!("unknown media format {other:?}")),
        }
    }
}

/// Camera and instant to fetch media for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MediaHandle {
    pub camera_id: String,
    pub timestamp: String,
    pub format: MediaFormat,
}

impl MediaHandle {
    pub fn new(camera_id: &str, timestamp: &str, format: MediaFormat) -> Self {
        Self {
            camera_id: camera_id.to_string(),
            timestamp: timestamp.to_string(),
            format,
        }
    }

    pub fn request(&self) -> Result<ApiRequest, ApiError> {
        if self.camera_id.is_empty() || self.timestamp.is_empty() {
            return Err(ApiError::precondition(
                "camera id and timestamp are required for media",
            ));
        }
        Ok(ApiRequest::get(MEDIA_PATH)
            .param("cameraId", &self.camera_id)
            .param("t", &self.timestamp)
            .param("format", self.format.as_str())
            .raw())
    }
}

/// Identifies a crop within a session: who (subject) and which capture (record).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub subject_id: String,
    pub record_id: String,
}

impl CacheKey {
    pub fn new(subject_id: impl Into<String>, record_id: impl Into<String>) -> Self {
        Self {
            subject_id: subject_id.into(),
            record_id: record_id.into(),
        }
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}_{}", self.subject_id, self.record_id)
    }
}

/// Everything needed to fetch a frame and crop it.
#[derive(Debug, Clone, PartialEq)]
pub struct CropTarget {
    pub handle: MediaHandle,
    pub roi: Roi,
    pub key: CacheKey,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::BodyMode;

    #[test]
    fn test_media_request_params() {
        let req = MediaHandle::new("cam-1", "2025-06-01T10:00:00.000Z", MediaFormat::Json)
            .request()
            .unwrap();
        assert_eq!(req.path, MEDIA_PATH);
        assert_eq!(req.mode, BodyMode::Raw);
        assert_eq!(
            req.query,
            vec![
                ("cameraId".to_string(), "cam-1".to_string()),
                ("t".to_string(), "2025-06-01T10:00:00.000Z".to_string()),
                ("format".to_string(), "json".to_string()),
            ]
        );
    }

    #[test]
    fn test_media_request_requires_fields() {
        let err = MediaHandle::new("", "t", MediaFormat::Jpeg)
            .request()
            .unwrap_err();
        assert!(err.is_precondition());
    }

    #[test]
    fn test_format_parse_and_display_key() {
        assert_eq!("JPG".parse::<MediaFormat>().unwrap(), MediaFormat::Jpeg);
        assert!("gif".parse::<MediaFormat>().is_err());
        assert_eq!(CacheKey::new("obj", "evt").to_string(), "obj_evt");
    }
}
