//! Search parameters per query kind and their wire requests.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::api::ApiRequest;
use crate::models::{QueryDescriptor, RecordKind, FACE_MATCH_TOPIC};

pub const EVENTS_SEARCH_PATH: &str = "/events-search";
pub const APPEARANCE_SEARCH_PATH: &str = "/appearance-search";
pub const DESCRIPTOR_SEARCH_PATH: &str = "/appearance-search-by-description";

/// Format a timestamp the way the upstream expects (`2025-06-01T00:00:00.000Z`).
pub fn format_api_time(t: &DateTime<Utc>) -> String {
    t.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// Appearance scan depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ScanType {
    #[default]
    Full,
    Fast,
}

impl ScanType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanType::Full => "FULL",
            ScanType::Fast => "FAST",
        }
    }
}

impl std::str::FromStr for ScanType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "FULL" => Ok(ScanType::Full),
            "FAST" => Ok(ScanType::Fast),
            other => Err(format!("unknown scan type {other:?}")),
        }
    }
}

/// A detection to search for by example.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectedObject {
    pub source_camera_id: String,
    pub source_time: String,
    pub object_id: i64,
    pub generator_id: i64,
}

/// What an appearance search looks for.
#[derive(Debug, Clone, PartialEq)]
pub enum AppearanceRef {
    DetectedObjects(Vec<DetectedObject>),
    /// Opaque image objects as accepted by the upstream.
    Images(Vec<Value>),
    ImageUrls(Vec<String>),
}

impl AppearanceRef {
    pub fn to_json(&self) -> Value {
        match self {
            AppearanceRef::DetectedObjects(objects) => json!({ "detectedObjects": objects }),
            AppearanceRef::Images(images) => json!({ "images": images }),
            AppearanceRef::ImageUrls(urls) => json!({ "imageUrls": urls }),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventsTimeRange {
    pub server_id: String,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub limit: u32,
    pub event_topics: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventsActive {
    pub server_id: String,
    pub limit: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppearanceQuery {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub appearances: AppearanceRef,
    pub camera_ids: Vec<String>,
    pub limit: u32,
    pub scan_type: ScanType,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DescriptorQuery {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub descriptors: Vec<QueryDescriptor>,
    pub camera_ids: Vec<String>,
    pub limit: u32,
    pub scan_type: ScanType,
}

/// Parameters that start a search. A continuation token is only valid
/// against the exact parameters that produced it, so these never change
/// once a session has started.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryParams {
    EventsTimeRange(EventsTimeRange),
    EventsActive(EventsActive),
    Appearances(AppearanceQuery),
    QueryDescriptors(DescriptorQuery),
}

impl QueryParams {
    /// Time-range search restricted to face watchlist matches.
    pub fn face_watchlist(
        server_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        limit: u32,
    ) -> Self {
        QueryParams::EventsTimeRange(EventsTimeRange {
            server_id: server_id.to_string(),
            from,
            to,
            limit,
            event_topics: Some(FACE_MATCH_TOPIC.to_string()),
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            QueryParams::EventsTimeRange(_) => "events (time range)",
            QueryParams::EventsActive(_) => "events (active)",
            QueryParams::Appearances(_) => "appearances",
            QueryParams::QueryDescriptors(_) => "appearances (descriptors)",
        }
    }

    pub fn record_kind(&self) -> RecordKind {
        match self {
            QueryParams::EventsTimeRange(_) | QueryParams::EventsActive(_) => RecordKind::Event,
            QueryParams::Appearances(_) | QueryParams::QueryDescriptors(_) => {
                RecordKind::Appearance
            }
        }
    }

    /// Key holding the record list inside `result`.
    pub fn results_key(&self) -> &'static str {
        match self.record_kind() {
            RecordKind::Event => "events",
            RecordKind::Appearance => "results",
        }
    }

    fn path(&self) -> &'static str {
        match self {
            QueryParams::EventsTimeRange(_) | QueryParams::EventsActive(_) => EVENTS_SEARCH_PATH,
            QueryParams::Appearances(_) => APPEARANCE_SEARCH_PATH,
            QueryParams::QueryDescriptors(_) => DESCRIPTOR_SEARCH_PATH,
        }
    }

    /// Request for the first page.
    pub fn initial_request(&self) -> ApiRequest {
        match self {
            QueryParams::EventsTimeRange(q) => {
                let req = ApiRequest::get(self.path())
                    .param("query_type", "TIME_RANGE")
                    .param("from_time", format_api_time(&q.from))
                    .param("to_time", format_api_time(&q.to))
                    .param("serverId", &q.server_id)
                    .param("limit", q.limit);
                match &q.event_topics {
                    Some(topics) => req.param("eventTopics", topics),
                    None => req,
                }
            }
            QueryParams::EventsActive(q) => ApiRequest::get(self.path())
                .param("query_type", "ACTIVE")
                .param("serverId", &q.server_id)
                .param("limit", q.limit),
            QueryParams::Appearances(q) => ApiRequest::post(
                self.path(),
                json!({
                    "from": format_api_time(&q.from),
                    "to": format_api_time(&q.to),
                    "appearances": q.appearances.to_json(),
                    "cameraIds": q.camera_ids,
                    "limit": q.limit,
                    "scanType": q.scan_type,
                }),
            ),
            QueryParams::QueryDescriptors(q) => ApiRequest::post(
                self.path(),
                json!({
                    "from": format_api_time(&q.from),
                    "to": format_api_time(&q.to),
                    "queryDescriptors": q.descriptors,
                    "cameraIds": q.camera_ids,
                    "limit": q.limit,
                    "scanType": q.scan_type,
                }),
            ),
        }
    }

    /// Request for the next page: the token alone, original filters dropped.
    pub fn continuation_request(&self, token: &str) -> ApiRequest {
        match self.record_kind() {
            RecordKind::Event => ApiRequest::get(self.path())
                .param("query_type", "CONTINUE")
                .param("token", token),
            RecordKind::Appearance => ApiRequest::post(self.path(), json!({ "token": token })),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Method;
    use chrono::TimeZone;

    fn june(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, day, 0, 0, 0).unwrap()
    }

    fn params(req: &ApiRequest) -> Vec<(&str, &str)> {
        req.query
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect()
    }

    #[test]
    fn test_format_api_time() {
        assert_eq!(format_api_time(&june(1)), "2025-06-01T00:00:00.000Z");
    }

    #[test]
    fn test_time_range_request() {
        let q = QueryParams::EventsTimeRange(EventsTimeRange {
            server_id: "srv-1".to_string(),
            from: june(1),
            to: june(30),
            limit: 50,
            event_topics: Some("DEVICE_FACET_START".to_string()),
        });
        let req = q.initial_request();
        assert_eq!(req.method, Method::Get);
        assert_eq!(req.path, EVENTS_SEARCH_PATH);
        assert_eq!(
            params(&req),
            vec![
                ("query_type", "TIME_RANGE"),
                ("from_time", "2025-06-01T00:00:00.000Z"),
                ("to_time", "2025-06-30T00:00:00.000Z"),
                ("serverId", "srv-1"),
                ("limit", "50"),
                ("eventTopics", "DEVICE_FACET_START"),
            ]
        );
    }

    #[test]
    fn test_active_request_omits_time_and_topics() {
        let q = QueryParams::EventsActive(EventsActive {
            server_id: "srv-1".to_string(),
            limit: 10,
        });
        assert_eq!(
            params(&q.initial_request()),
            vec![("query_type", "ACTIVE"), ("serverId", "srv-1"), ("limit", "10")]
        );
    }

    #[test]
    fn test_face_watchlist_uses_face_topic() {
        let q = QueryParams::face_watchlist("srv-1", june(1), june(2), 5);
        let req = q.initial_request();
        assert!(params(&req).contains(&("eventTopics", FACE_MATCH_TOPIC)));
    }

    #[test]
    fn test_appearance_request_body() {
        let q = QueryParams::Appearances(AppearanceQuery {
            from: june(1),
            to: june(2),
            appearances: AppearanceRef::DetectedObjects(vec![DetectedObject {
                source_camera_id: "cam-1".to_string(),
                source_time: "2025-06-01T10:00:00.000Z".to_string(),
                object_id: 7,
                generator_id: 2,
            }]),
            camera_ids: vec!["cam-1".to_string()],
            limit: 5,
            scan_type: ScanType::Fast,
        });
        let req = q.initial_request();
        assert_eq!(req.method, Method::Post);
        assert_eq!(req.path, APPEARANCE_SEARCH_PATH);
        let body = req.body.unwrap();
        assert_eq!(body["scanType"], json!("FAST"));
        assert_eq!(
            body["appearances"]["detectedObjects"][0]["sourceCameraId"],
            json!("cam-1")
        );
        assert_eq!(body["appearances"]["detectedObjects"][0]["generatorId"], json!(2));
    }

    #[test]
    fn test_descriptor_request_body() {
        let q = QueryParams::QueryDescriptors(DescriptorQuery {
            from: june(1),
            to: june(2),
            descriptors: vec![QueryDescriptor::new("upperClothing", "red")],
            camera_ids: vec![],
            limit: 5,
            scan_type: ScanType::Full,
        });
        let req = q.initial_request();
        assert_eq!(req.path, DESCRIPTOR_SEARCH_PATH);
        assert_eq!(
            req.body.unwrap()["queryDescriptors"],
            json!([{"facet": "upperClothing", "tag": "red"}])
        );
    }

    #[test]
    fn test_continuation_drops_filters() {
        let events = QueryParams::face_watchlist("srv-1", june(1), june(2), 5);
        let req = events.continuation_request("tok-1");
        assert_eq!(params(&req), vec![("query_type", "CONTINUE"), ("token", "tok-1")]);
        assert!(req.body.is_none());

        let desc = QueryParams::QueryDescriptors(DescriptorQuery {
            from: june(1),
            to: june(2),
            descriptors: vec![],
            camera_ids: vec!["cam-1".to_string()],
            limit: 5,
            scan_type: ScanType::Full,
        });
        let req = desc.continuation_request("tok-2");
        assert_eq!(req.path, DESCRIPTOR_SEARCH_PATH);
        assert!(req.query.is_empty());
        assert_eq!(req.body, Some(json!({"token": "tok-2"})));
    }

    #[test]
    fn test_scan_type_parse() {
        assert_eq!("fast".parse::<ScanType>().unwrap(), ScanType::Fast);
        assert!("deep".parse::<ScanType>().is_err());
    }
}
