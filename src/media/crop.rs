//! Normalized region-of-interest to pixel crop.
//!
//! Coordinates come from the server and are trusted: they are not checked
//! for ordering or range. Out-of-frame edges are clamped to the image and an
//! inverted rectangle yields a zero-area crop.

use std::io::Cursor;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::{DynamicImage, GenericImageView, ImageFormat};
use tracing::warn;

use crate::api::ApiError;
use crate::models::Roi;

/// Pixel bounds of a crop, right/bottom exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub left: i64,
    pub top: i64,
    pub right: i64,
    pub bottom: i64,
}

impl PixelRect {
    pub fn width(&self) -> i64 {
        (self.right - self.left).max(0)
    }

    pub fn height(&self) -> i64 {
        (self.bottom - self.top).max(0)
    }

    pub fn is_degenerate(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }
}

/// Scale fractions by the frame size, truncating toward zero.
pub fn roi_to_pixels(roi: &Roi, width: u32, height: u32) -> PixelRect {
    let w = width as f64;
    let h = height as f64;
    PixelRect {
        left: (roi.left * w) as i64,
        top: (roi.top * h) as i64,
        right: (roi.right * w) as i64,
        bottom: (roi.bottom * h) as i64,
    }
}

/// Crop `image` to `rect`, clamped to the image bounds.
pub fn crop_to_rect(image: &DynamicImage, rect: PixelRect) -> DynamicImage {
    let (w, h) = image.dimensions();
    let x0 = rect.left.clamp(0, w as i64);
    let y0 = rect.top.clamp(0, h as i64);
    let x1 = rect.right.clamp(0, w as i64);
    let y1 = rect.bottom.clamp(0, h as i64);
    let cw = (x1 - x0).max(0);
    let ch = (y1 - y0).max(0);
    if cw == 0 || ch == 0 {
        warn!(
            "Region of interest {:?} is empty within a {}x{} frame",
            rect, w, h
        );
    }
    image.crop_imm(x0 as u32, y0 as u32, cw as u32, ch as u32)
}

/// A fetched frame and its region-of-interest crop.
#[derive(Debug, Clone)]
pub struct CroppedImage {
    pub full: DynamicImage,
    pub cropped: DynamicImage,
    pub rect: PixelRect,
}

impl CroppedImage {
    pub fn from_frame(full: DynamicImage, roi: &Roi) -> Self {
        let rect = roi_to_pixels(roi, full.width(), full.height());
        let cropped = crop_to_rect(&full, rect);
        Self { full, cropped, rect }
    }

    pub fn full_jpeg(&self) -> Result<Vec<u8>, ApiError> {
        encode_jpeg(&self.full)
    }

    pub fn cropped_jpeg(&self) -> Result<Vec<u8>, ApiError> {
        encode_jpeg(&self.cropped)
    }

    pub fn full_base64(&self) -> Result<String, ApiError> {
        Ok(STANDARD.encode(self.full_jpeg()?))
    }

    pub fn cropped_base64(&self) -> Result<String, ApiError> {
        Ok(STANDARD.encode(self.cropped_jpeg()?))
    }
}

/// Encode as JPEG. JPEG has no alpha channel, so the image is flattened to RGB.
pub fn encode_jpeg(image: &DynamicImage) -> Result<Vec<u8>, ApiError> {
    if image.width() == 0 || image.height() == 0 {
        return Err(ApiError::precondition("cannot encode an empty image"));
    }
    let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
    let mut out = Cursor::new(Vec::new());
    rgb.write_to(&mut out, ImageFormat::Jpeg)?;
    Ok(out.into_inner())
}
