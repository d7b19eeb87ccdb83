//! Event, face watchlist and appearance search commands.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use console::style;
use serde_json::Value;
use tracing::warn;

use vmsquery::api::ApiClient;
use vmsquery::media::{CropTarget, MediaFormat, MediaResolver};
use vmsquery::models::Record;
use vmsquery::projector::{
    appearance_snapshots, face_matches, project, DerivedView, SnapshotRow, ViewKind,
};
use vmsquery::search::query::{EventsActive, EventsTimeRange};
use vmsquery::search::{
    AppearanceQuery, AppearanceRef, DescriptorQuery, DetectedObject, QueryParams, ScanType,
    SearchSession, SessionState,
};

use super::helpers::{output_path, print_json, spinner, write_file};
use super::media::{fetch_media, media_path, write_media};
use super::{AppearanceArgs, EventView};

pub fn time_range_query(
    server_id: &str,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    limit: u32,
    topic: Option<String>,
) -> QueryParams {
    QueryParams::EventsTimeRange(EventsTimeRange {
        server_id: server_id.to_string(),
        from,
        to,
        limit,
        event_topics: topic,
    })
}

pub fn active_query(server_id: &str, limit: u32) -> QueryParams {
    QueryParams::EventsActive(EventsActive {
        server_id: server_id.to_string(),
        limit,
    })
}

/// Build an appearance or descriptor query from the exclusive CLI group.
pub fn appearance_query(
    by: AppearanceArgs,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    camera_ids: Vec<String>,
    limit: u32,
    scan_type: ScanType,
) -> Result<QueryParams> {
    if !by.descriptor.is_empty() {
        return Ok(QueryParams::QueryDescriptors(DescriptorQuery {
            from,
            to,
            descriptors: by.descriptor,
            camera_ids,
            limit,
            scan_type,
        }));
    }

    let appearances = if !by.detected_object.is_empty() {
        let objects = by
            .detected_object
            .iter()
            .map(|raw| {
                serde_json::from_str::<DetectedObject>(raw)
                    .with_context(|| format!("invalid detected object {raw}"))
            })
            .collect::<Result<Vec<_>>>()?;
        AppearanceRef::DetectedObjects(objects)
    } else if let Some(raw) = by.images {
        let images: Vec<Value> =
            serde_json::from_str(&raw).context("--images must be a JSON array")?;
        AppearanceRef::Images(images)
    } else if !by.image_urls.is_empty() {
        AppearanceRef::ImageUrls(by.image_urls)
    } else {
        bail!("one of --detected-object, --images, --image-url or --descriptor is required");
    };

    Ok(QueryParams::Appearances(AppearanceQuery {
        from,
        to,
        appearances,
        camera_ids,
        limit,
        scan_type,
    }))
}

/// Run a session for up to `pages` pages. Results gathered before a failure
/// are kept in the session so they can still be shown.
async fn run_session(
    client: &ApiClient,
    query: QueryParams,
    pages: usize,
) -> (SearchSession, Result<SessionState>) {
    let mut session = SearchSession::new(query);
    let pb = spinner(format!("Searching {}...", session.query().name()));
    let outcome = session.fetch_pages(client, pages.max(1)).await;
    pb.finish_and_clear();
    (session, outcome.map_err(Into::into))
}

fn print_session_footer(session: &SearchSession) {
    let state = match session.state() {
        SessionState::Idle => "nothing found",
        SessionState::Active => "more available (raise --pages)",
        SessionState::Exhausted => "complete",
    };
    println!(
        "{}",
        style(format!(
            "{} results over {} page(s), {}",
            session.results().len(),
            session.page_count(),
            state
        ))
        .dim()
    );
}

/// Every result paired with its face crop target, when it has one.
pub fn face_entries(results: &[Record]) -> Vec<(&Record, Option<CropTarget>)> {
    let mut targets: HashMap<usize, CropTarget> = face_matches(results)
        .into_iter()
        .map(|row| (row.index, row.target))
        .collect();
    results
        .iter()
        .enumerate()
        .map(|(index, record)| (record, targets.remove(&index)))
        .collect()
}

/// Every result paired with its croppable snapshots, possibly none.
pub fn appearance_entries(results: &[Record]) -> Vec<(&Record, Vec<SnapshotRow<'_>>)> {
    let mut entries: Vec<(&Record, Vec<SnapshotRow<'_>>)> =
        results.iter().map(|record| (record, Vec::new())).collect();
    for row in appearance_snapshots(results) {
        entries[row.index].1.push(row);
    }
    entries
}

pub async fn cmd_events(
    client: &ApiClient,
    query: QueryParams,
    pages: usize,
    view: EventView,
    fetch: Option<MediaFormat>,
    out_dir: &Path,
) -> Result<()> {
    let (session, outcome) = run_session(client, query, pages).await;

    if session.state() == SessionState::Idle && outcome.is_ok() {
        println!("{}", style("No events found for the given parameters.").yellow());
        return Ok(());
    }

    // Fetching only applies to media events
    let kind = match (view, fetch) {
        (_, Some(_)) | (EventView::MediaEvents, None) => ViewKind::MediaEvents,
        (EventView::All, None) => ViewKind::All,
    };
    match project(session.results(), kind) {
        DerivedView::All(records) => {
            for record in records {
                print_json(record.raw());
            }
        }
        DerivedView::MediaEvents(rows) => {
            if rows.is_empty() {
                println!("{}", style("No media events in these results.").yellow());
            }
            for row in rows {
                let handle = fetch.map(|format| row.handle(format));
                print_json(&Value::Object(row.summary));
                let Some(handle) = handle else {
                    continue;
                };
                let saved = match fetch_media(client, &handle).await {
                    Ok(payload) => write_media(payload, &media_path(out_dir, &handle)),
                    Err(e) => Err(e),
                };
                if let Err(e) = saved {
                    warn!(
                        "Could not fetch {} media for {} at {}: {:#}",
                        handle.format.as_str(),
                        handle.camera_id,
                        handle.timestamp,
                        e
                    );
                }
            }
        }
        _ => {}
    }
    print_session_footer(&session);
    outcome.map(|_| ())
}

pub async fn cmd_faces(
    client: &ApiClient,
    server_id: &str,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    limit: u32,
    pages: usize,
    crop_dir: Option<PathBuf>,
) -> Result<()> {
    let query = QueryParams::face_watchlist(server_id, from, to, limit);
    let (session, outcome) = run_session(client, query, pages).await;

    if session.state() == SessionState::Idle && outcome.is_ok() {
        println!("{}", style("No face watchlist events found.").yellow());
        return Ok(());
    }

    let mut resolver = MediaResolver::new();
    for (n, (record, target)) in face_entries(session.results()).into_iter().enumerate() {
        println!("{}", style(format!("Event {}", n + 1)).bold());
        print_json(record.raw());
        match (target, &crop_dir) {
            (Some(target), Some(dir)) => save_crop(client, &mut resolver, &target, dir).await,
            (Some(_), None) => {}
            (None, _) => println!(
                "  {}",
                style("Missing cameraId, timestamp, or faceRoi; no face crop.").yellow()
            ),
        }
    }
    print_session_footer(&session);
    outcome.map(|_| ())
}

pub async fn cmd_appearances(
    client: &ApiClient,
    query: QueryParams,
    pages: usize,
    crop_dir: Option<PathBuf>,
) -> Result<()> {
    let (session, outcome) = run_session(client, query, pages).await;

    if session.state() == SessionState::Idle && outcome.is_ok() {
        println!("{}", style("No appearances found for the given parameters.").yellow());
        return Ok(());
    }

    let mut resolver = MediaResolver::new();
    for (n, (record, rows)) in appearance_entries(session.results()).into_iter().enumerate() {
        println!("{}", style(format!("Instance {}", n + 1)).bold());
        print_json(&record.summary());
        if rows.is_empty() {
            let has_snapshots = record
                .as_appearance()
                .is_some_and(|a| !a.snapshots.is_empty());
            let note = if has_snapshots {
                "No snapshot has a deviceGid, timestamp and roi; nothing to crop."
            } else {
                "No snapshots available."
            };
            println!("  {}", style(note).yellow());
        }
        for row in rows {
            println!(
                "  snapshot {} at {}",
                row.snapshot_index + 1,
                row.snapshot.timestamp.as_deref().unwrap_or("-")
            );
            if let Some(dir) = &crop_dir {
                save_crop(client, &mut resolver, &row.target, dir).await;
            }
        }
    }
    print_session_footer(&session);
    outcome.map(|_| ())
}

/// Fetch, crop and write `<key>_full.jpg` / `<key>_crop.jpg`. Failures are
/// reported per row and do not stop the listing.
async fn save_crop(
    client: &ApiClient,
    resolver: &mut MediaResolver,
    target: &CropTarget,
    dir: &Path,
) {
    let key = target.key.to_string();
    let cropped = match resolver.crop(client, target).await {
        Ok(cropped) => cropped,
        Err(e) => {
            warn!("Could not load frame for {}: {}", key, e);
            return;
        }
    };

    let files = [
        (format!("{key}_full"), cropped.full_jpeg()),
        (format!("{key}_crop"), cropped.cropped_jpeg()),
    ];
    for (stem, encoded) in files {
        let written = encoded
            .map_err(anyhow::Error::from)
            .and_then(|bytes| {
                let path = output_path(dir, &stem, "jpg");
                write_file(&path, &bytes).map(|_| path)
            });
        match written {
            Ok(path) => println!("  wrote {}", path.display()),
            Err(e) => warn!("Skipping {}: {:#}", stem, e),
        }
    }
}
