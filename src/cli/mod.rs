//! Command definitions and dispatch.

mod helpers;
mod inventory;
mod media;
mod search;

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};

use vmsquery::api::Endpoint;
use vmsquery::config::{load_settings, API_URL_ENV};
use vmsquery::media::MediaFormat;
use vmsquery::models::QueryDescriptor;
use vmsquery::search::ScanType;

use helpers::parse_time;

#[derive(Parser)]
#[command(name = "vmsq")]
#[command(version)]
#[command(about = "Query a video-management-system API: inventory, searches and media", long_about = None)]
pub struct Cli {
    /// Upstream API base URL
    #[arg(long, global = true, env = API_URL_ENV)]
    pub api_url: Option<String>,

    /// Print the request log after the command
    #[arg(long, global = true)]
    pub show_log: bool,

    /// Debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Query a read-only endpoint
    Endpoint {
        #[arg(value_enum)]
        name: EndpointArg,
        /// Site id (for `site`)
        #[arg(long)]
        id: Option<String>,
        /// Print the JSON body instead of a listing
        #[arg(long)]
        raw: bool,
    },

    /// Search events by time range or list active events
    Events {
        #[arg(long, value_enum, default_value = "time-range")]
        query_type: EventQueryType,
        #[arg(long)]
        server_id: String,
        /// Start (YYYY-MM-DD or RFC 3339), default 24h ago
        #[arg(long, value_parser = parse_time)]
        from: Option<DateTime<Utc>>,
        /// End (YYYY-MM-DD or RFC 3339), default now
        #[arg(long, value_parser = parse_time)]
        to: Option<DateTime<Utc>>,
        #[arg(long)]
        limit: Option<u32>,
        /// Event topic filter (time-range only)
        #[arg(long)]
        topic: Option<String>,
        /// Maximum number of pages to fetch
        #[arg(long, default_value_t = 1)]
        pages: usize,
        #[arg(long, value_enum, default_value = "all")]
        view: EventView,
        /// Fetch each media event as fmp4, jpeg or json (implies --view media-events)
        #[arg(long)]
        fetch: Option<MediaFormat>,
        /// Where fetched media is written (default: configured output dir)
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },

    /// Search face watchlist matches and crop the faces
    Faces {
        #[arg(long)]
        server_id: String,
        #[arg(long, value_parser = parse_time)]
        from: Option<DateTime<Utc>>,
        #[arg(long, value_parser = parse_time)]
        to: Option<DateTime<Utc>>,
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long, default_value_t = 1)]
        pages: usize,
        /// Write full and cropped JPEGs here
        #[arg(long)]
        crop_dir: Option<PathBuf>,
    },

    /// Appearance search by example or by descriptor
    Appearances {
        #[arg(long, value_parser = parse_time)]
        from: Option<DateTime<Utc>>,
        #[arg(long, value_parser = parse_time)]
        to: Option<DateTime<Utc>>,
        /// Restrict to these cameras (repeatable)
        #[arg(long = "camera-id")]
        camera_ids: Vec<String>,
        #[arg(long)]
        limit: Option<u32>,
        /// FULL or FAST
        #[arg(long)]
        scan_type: Option<ScanType>,
        #[command(flatten)]
        by: AppearanceArgs,
        #[arg(long, default_value_t = 1)]
        pages: usize,
        #[arg(long)]
        crop_dir: Option<PathBuf>,
    },

    /// Fetch a clip, frame or metadata for a camera and instant
    Media {
        #[arg(long)]
        camera_id: String,
        /// Instant as reported by the server, sent unchanged
        #[arg(long)]
        at: String,
        /// fmp4, jpeg or json
        #[arg(long, default_value = "jpeg")]
        format: MediaFormat,
        /// Output file (default: <camera>_<time>.<ext> in the output dir)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// List descriptor facets and their tags
    Descriptors,
}

/// Exactly one way of describing what to look for.
#[derive(clap::Args)]
#[group(required = true, multiple = false)]
pub struct AppearanceArgs {
    /// Detected object as JSON {sourceCameraId, sourceTime, objectId, generatorId} (repeatable)
    #[arg(long)]
    pub detected_object: Vec<String>,
    /// JSON array of image objects
    #[arg(long)]
    pub images: Option<String>,
    /// Image URL (repeatable)
    #[arg(long = "image-url")]
    pub image_urls: Vec<String>,
    /// Descriptor as facet:tag (repeatable)
    #[arg(long)]
    pub descriptor: Vec<QueryDescriptor>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum EndpointArg {
    Health,
    Capabilities,
    Cameras,
    Sites,
    Site,
    Servers,
    Subtopics,
    Descriptions,
}

impl From<EndpointArg> for Endpoint {
    fn from(arg: EndpointArg) -> Self {
        match arg {
            EndpointArg::Health => Endpoint::Health,
            EndpointArg::Capabilities => Endpoint::Capabilities,
            EndpointArg::Cameras => Endpoint::Cameras,
            EndpointArg::Sites => Endpoint::Sites,
            EndpointArg::Site => Endpoint::Site,
            EndpointArg::Servers => Endpoint::Servers,
            EndpointArg::Subtopics => Endpoint::EventSubtopics,
            EndpointArg::Descriptions => Endpoint::AppearanceDescriptions,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EventQueryType {
    TimeRange,
    Active,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EventView {
    All,
    MediaEvents,
}

pub async fn run(cli: Cli) -> Result<()> {
    let mut settings = load_settings().await;
    if let Some(url) = cli.api_url {
        settings.api_url = url;
    }
    let client = settings
        .build_client()
        .with_context(|| format!("cannot use API URL {}", settings.api_url))?;

    let result = match cli.command {
        Commands::Endpoint { name, id, raw } => {
            inventory::cmd_endpoint(&client, name.into(), id.as_deref(), raw).await
        }
        Commands::Descriptors => inventory::cmd_descriptors(&client).await,
        Commands::Events {
            query_type,
            server_id,
            from,
            to,
            limit,
            topic,
            pages,
            view,
            fetch,
            out_dir,
        } => {
            let limit = limit.unwrap_or(settings.default_limit);
            let query = match query_type {
                EventQueryType::TimeRange => {
                    let (from, to) = helpers::time_window(from, to);
                    search::time_range_query(&server_id, from, to, limit, topic)
                }
                EventQueryType::Active => search::active_query(&server_id, limit),
            };
            let out_dir = out_dir.unwrap_or_else(|| settings.output_dir.clone());
            search::cmd_events(&client, query, pages, view, fetch, &out_dir).await
        }
        Commands::Faces {
            server_id,
            from,
            to,
            limit,
            pages,
            crop_dir,
        } => {
            let (from, to) = helpers::time_window(from, to);
            let limit = limit.unwrap_or(settings.default_limit);
            search::cmd_faces(&client, &server_id, from, to, limit, pages, crop_dir).await
        }
        Commands::Appearances {
            from,
            to,
            camera_ids,
            limit,
            scan_type,
            by,
            pages,
            crop_dir,
        } => {
            let (from, to) = helpers::time_window(from, to);
            let query = search::appearance_query(
                by,
                from,
                to,
                camera_ids,
                limit.unwrap_or(settings.default_limit),
                scan_type.unwrap_or(settings.scan_type),
            )?;
            search::cmd_appearances(&client, query, pages, crop_dir).await
        }
        Commands::Media {
            camera_id,
            at,
            format,
            out,
        } => media::cmd_media(&client, &camera_id, &at, format, out, &settings.output_dir).await,
    };

    if cli.show_log {
        helpers::print_request_log(client.request_log());
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_at_is_kept_verbatim() {
        let cli = Cli::try_parse_from([
            "vmsq",
            "media",
            "--camera-id",
            "cam-1",
            "--at",
            "2025-06-01T10:00:00.123456Z",
        ])
        .unwrap();
        match cli.command {
            Commands::Media { at, format, .. } => {
                assert_eq!(at, "2025-06-01T10:00:00.123456Z");
                assert_eq!(format, MediaFormat::Jpeg);
            }
            _ => panic!("expected media command"),
        }
    }

    #[test]
    fn test_events_fetch_flag() {
        let cli = Cli::try_parse_from([
            "vmsq",
            "events",
            "--server-id",
            "srv-1",
            "--fetch",
            "json",
            "--out-dir",
            "/tmp/clips",
        ])
        .unwrap();
        match cli.command {
            Commands::Events { fetch, out_dir, .. } => {
                assert_eq!(fetch, Some(MediaFormat::Json));
                assert_eq!(out_dir, Some(PathBuf::from("/tmp/clips")));
            }
            _ => panic!("expected events command"),
        }
    }
}
