//! Fetches media for a handle and caches region-of-interest crops.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use image::DynamicImage;
use serde_json::Value;
use tracing::{debug, warn};

use super::crop::CroppedImage;
use super::{CacheKey, CropTarget, MediaFormat, MediaHandle};
use crate::api::{ApiError, Transport};

/// Decoded `/media` payload.
#[derive(Debug, Clone)]
pub enum MediaPayload {
    Video(Vec<u8>),
    Image { bytes: Vec<u8>, image: DynamicImage },
    JsonLines(Vec<Value>),
    /// Body that could not be read as the requested format.
    Raw(Vec<u8>),
}

impl MediaPayload {
    /// Bytes as received from the server (or re-joined ndjson).
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            MediaPayload::Video(bytes) | MediaPayload::Raw(bytes) => bytes,
            MediaPayload::Image { bytes, .. } => bytes,
            MediaPayload::JsonLines(lines) => lines
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join("\n")
                .into_bytes(),
        }
    }
}

/// Parse newline-delimited JSON, skipping blank lines.
pub fn parse_json_lines(bytes: &[u8]) -> Result<Vec<Value>, ApiError> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| ApiError::decode(format!("ndjson is not UTF-8: {e}")))?;
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).map_err(ApiError::from))
        .collect()
}

/// Media access for one session, with its own crop cache.
#[derive(Debug, Default)]
pub struct MediaResolver {
    cache: HashMap<CacheKey, CroppedImage>,
}

impl MediaResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch and decode media. Never cached.
    pub async fn resolve<T: Transport + ?Sized>(
        &self,
        api: &T,
        handle: &MediaHandle,
    ) -> Result<MediaPayload, ApiError> {
        let bytes = api.send(handle.request()?).await?.into_bytes();
        debug!(
            "Fetched {} bytes of {} media for camera {}",
            bytes.len(),
            handle.format.as_str(),
            handle.camera_id
        );

        match handle.format {
            MediaFormat::Fmp4 => Ok(MediaPayload::Video(bytes)),
            MediaFormat::Jpeg => {
                let image = image::load_from_memory(&bytes)?;
                Ok(MediaPayload::Image { bytes, image })
            }
            MediaFormat::Json => match parse_json_lines(&bytes) {
                Ok(lines) => Ok(MediaPayload::JsonLines(lines)),
                Err(e) => {
                    warn!("Media metadata is not valid ndjson, keeping raw body: {}", e);
                    Ok(MediaPayload::Raw(bytes))
                }
            },
        }
    }

    /// Fetch the target's frame and crop it, reusing an earlier crop with
    /// the same key instead of fetching again.
    pub async fn crop<T: Transport + ?Sized>(
        &mut self,
        api: &T,
        target: &CropTarget,
    ) -> Result<&CroppedImage, ApiError> {
        match self.cache.entry(target.key.clone()) {
            Entry::Occupied(slot) => {
                debug!("Crop cache hit for {}", target.key);
                Ok(slot.into_mut())
            }
            Entry::Vacant(slot) => {
                let cropped = fetch_and_crop(api, target).await?;
                Ok(slot.insert(cropped))
            }
        }
    }

    pub fn cached(&self, key: &CacheKey) -> Option<&CroppedImage> {
        self.cache.get(key)
    }

    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    pub fn clear(&mut self) {
        self.cache.clear();
    }
}

async fn fetch_and_crop<T: Transport + ?Sized>(
    api: &T,
    target: &CropTarget,
) -> Result<CroppedImage, ApiError> {
    let mut handle = target.handle.clone();
    handle.format = MediaFormat::Jpeg;
    let bytes = api.send(handle.request()?).await?.into_bytes();
    let frame = image::load_from_memory(&bytes)?;
    Ok(CroppedImage::from_frame(frame, &target.roi))
}
