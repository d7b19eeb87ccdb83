//! Media command: fetch a clip, frame or metadata and save it.

use std::path::{Path, PathBuf};

use anyhow::Result;
use console::style;
use image::GenericImageView;

use vmsquery::api::{ApiClient, Transport};
use vmsquery::media::{MediaFormat, MediaHandle, MediaPayload, MediaResolver};

use super::helpers::{output_path, print_json, spinner, write_file};

/// Default file for a handle: `<camera>_<timestamp>.<ext>` under `dir`.
pub fn media_path(dir: &Path, handle: &MediaHandle) -> PathBuf {
    output_path(
        dir,
        &format!("{}_{}", handle.camera_id, handle.timestamp),
        handle.format.extension(),
    )
}

pub async fn fetch_media<T: Transport + ?Sized>(
    api: &T,
    handle: &MediaHandle,
) -> Result<MediaPayload> {
    Ok(MediaResolver::new().resolve(api, handle).await?)
}

/// Describe the payload on stdout and write its bytes to `path`.
pub fn write_media(payload: MediaPayload, path: &Path) -> Result<()> {
    match &payload {
        MediaPayload::Video(bytes) => println!("Video clip: {} bytes", bytes.len()),
        MediaPayload::Image { image, .. } => {
            let (w, h) = image.dimensions();
            println!("Frame: {}x{}", w, h);
        }
        MediaPayload::JsonLines(lines) => {
            for line in lines {
                print_json(line);
            }
        }
        MediaPayload::Raw(bytes) => println!(
            "{} {} bytes (not valid ndjson)",
            style("Raw body:").yellow(),
            bytes.len()
        ),
    }

    write_file(path, &payload.into_bytes())?;
    println!("Saved {}", path.display());
    Ok(())
}

/// `at` is sent exactly as given; server timestamps must round-trip unchanged.
pub async fn cmd_media(
    client: &ApiClient,
    camera_id: &str,
    at: &str,
    format: MediaFormat,
    out: Option<PathBuf>,
    output_dir: &Path,
) -> Result<()> {
    let handle = MediaHandle::new(camera_id, at, format);

    let pb = spinner(format!("Fetching {} for {} at {}...", format.as_str(), camera_id, at));
    let payload = fetch_media(client, &handle).await;
    pb.finish_and_clear();

    let path = out.unwrap_or_else(|| media_path(output_dir, &handle));
    write_media(payload?, &path)
}
