//! Search result records.
//!
//! A record keeps the server's JSON verbatim. The typed structs declare only
//! the fields the console inspects and are read-only views over it.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::deserializers::{lenient, lenient_string, lenient_vec, non_null, value_to_string};

/// Event type that carries a device facet clip.
pub const FACET_START_EVENT: &str = "DEVICE_FACET_START";

/// Event topic used by face watchlist searches.
pub const FACE_MATCH_TOPIC: &str = "DEVICE_FACE_MATCH_START";

/// Normalized region of interest; each coordinate is a fraction of the frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Roi {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

/// A record returned by `/events-search`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    #[serde(default, deserialize_with = "non_null", skip_serializing_if = "Option::is_none")]
    pub this_id: Option<Value>,
    #[serde(
        rename = "type",
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub event_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub camera_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, deserialize_with = "non_null", skip_serializing_if = "Option::is_none")]
    pub object_id: Option<Value>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub face_roi: Option<Roi>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EventRecord {
    pub fn this_id_str(&self) -> Option<String> {
        self.this_id.as_ref().and_then(value_to_string)
    }

    pub fn object_id_str(&self) -> Option<String> {
        self.object_id.as_ref().and_then(value_to_string)
    }
}

/// One captured frame of an appearance instance.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub roi: Option<Roi>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A track instance returned by the appearance search endpoints.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppearanceRecord {
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub device_gid: Option<String>,
    #[serde(default, deserialize_with = "non_null", skip_serializing_if = "Option::is_none")]
    pub object_id: Option<Value>,
    #[serde(default, deserialize_with = "lenient_vec", skip_serializing_if = "Vec::is_empty")]
    pub snapshots: Vec<Snapshot>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AppearanceRecord {
    pub fn object_id_str(&self) -> Option<String> {
        self.object_id.as_ref().and_then(value_to_string)
    }
}

/// Which record shape a search endpoint returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Event,
    Appearance,
}

/// Typed view of a record's known fields.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordView {
    Event(EventRecord),
    Appearance(AppearanceRecord),
}

/// A search result: the record exactly as the server sent it, plus a typed
/// read-only view of the fields the console inspects.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    raw: Value,
    view: RecordView,
}

impl Record {
    /// Parse a raw record of the given kind. Fields that do not fit the typed
    /// view are absent from it but stay untouched in the raw value, so a
    /// single bad entry cannot sink a page.
    pub fn from_value(kind: RecordKind, raw: Value) -> Self {
        let view = match kind {
            RecordKind::Event => {
                RecordView::Event(EventRecord::deserialize(&raw).unwrap_or_default())
            }
            RecordKind::Appearance => {
                RecordView::Appearance(AppearanceRecord::deserialize(&raw).unwrap_or_default())
            }
        };
        Self { raw, view }
    }

    pub fn kind(&self) -> RecordKind {
        match self.view {
            RecordView::Event(_) => RecordKind::Event,
            RecordView::Appearance(_) => RecordKind::Appearance,
        }
    }

    pub fn view(&self) -> &RecordView {
        &self.view
    }

    pub fn as_event(&self) -> Option<&EventRecord> {
        match &self.view {
            RecordView::Event(e) => Some(e),
            RecordView::Appearance(_) => None,
        }
    }

    pub fn as_appearance(&self) -> Option<&AppearanceRecord> {
        match &self.view {
            RecordView::Appearance(a) => Some(a),
            RecordView::Event(_) => None,
        }
    }

    /// Camera the record was captured on (`cameraId` or `deviceGid`).
    pub fn camera_id(&self) -> Option<&str> {
        match &self.view {
            RecordView::Event(e) => e.camera_id.as_deref(),
            RecordView::Appearance(a) => a.device_gid.as_deref(),
        }
    }

    /// The record as received.
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    pub fn to_value(&self) -> Value {
        self.raw.clone()
    }

    /// The record without its `snapshots`, as shown next to each frame.
    pub fn summary(&self) -> Value {
        let mut trimmed = self.raw.clone();
        if let Value::Object(map) = &mut trimmed {
            map.remove("snapshots");
        }
        trimmed
    }
}

impl Serialize for Record {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.raw.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_record_passthrough_roundtrip() {
        let raw = json!({
            "thisId": "evt-1",
            "type": "DEVICE_FACET_START",
            "cameraId": "cam-7",
            "timestamp": "2025-06-01T10:00:00.000Z",
            "originatingServerId": "srv-1",
            "recordTriggerParams": {"zone": 3}
        });
        let record = Record::from_value(RecordKind::Event, raw.clone());
        assert_eq!(record.camera_id(), Some("cam-7"));
        assert_eq!(record.to_value(), raw);
    }

    #[test]
    fn test_event_record_tolerates_bad_fields() {
        let raw = json!({"thisId": 9, "faceRoi": "not-a-roi", "cameraId": null});
        let record = Record::from_value(RecordKind::Event, raw);
        let event = record.as_event().unwrap();
        assert_eq!(event.this_id_str().as_deref(), Some("9"));
        assert_eq!(event.face_roi, None);
        assert_eq!(event.camera_id, None);
    }

    #[test]
    fn test_non_object_record_becomes_empty() {
        let record = Record::from_value(RecordKind::Appearance, json!("garbage"));
        let appearance = record.as_appearance().unwrap();
        assert_eq!(appearance, &AppearanceRecord::default());
        assert_eq!(record.to_value(), json!("garbage"));
    }

    #[test]
    fn test_malformed_known_fields_serialize_unchanged() {
        let raw = json!({
            "thisId": "e1",
            "cameraId": 4242,
            "timestamp": null,
            "faceRoi": {"left": 0, "top": 0, "right": 1, "bottom": 1, "confidence": 0.9}
        });
        let record = Record::from_value(RecordKind::Event, raw.clone());
        assert_eq!(record.to_value(), raw);
        assert_eq!(serde_json::to_value(&record).unwrap(), raw);

        let event = record.as_event().unwrap();
        assert_eq!(event.camera_id.as_deref(), Some("4242"));
        assert_eq!(event.timestamp, None);
        assert_eq!(event.face_roi.map(|roi| roi.right), Some(1.0));
    }

    #[test]
    fn test_bad_snapshots_kept_in_raw() {
        let raw = json!({
            "deviceGid": "gid-1",
            "snapshots": [
                "broken",
                {"timestamp": "t1", "roi": {"left": 0.1, "top": 0.2, "right": 0.3, "bottom": "x"}}
            ]
        });
        let record = Record::from_value(RecordKind::Appearance, raw.clone());
        let appearance = record.as_appearance().unwrap();
        assert_eq!(appearance.snapshots.len(), 1);
        assert!(appearance.snapshots[0].roi.is_none());
        assert_eq!(record.to_value(), raw);
    }

    #[test]
    fn test_appearance_record_snapshots() {
        let raw = json!({
            "deviceGid": "gid-1",
            "objectId": 12,
            "snapshots": [
                {"timestamp": "t1", "roi": {"left": 0.1, "top": 0.2, "right": 0.3, "bottom": 0.4}},
                {"timestamp": "t2"}
            ],
            "confidence": 0.9
        });
        let record = Record::from_value(RecordKind::Appearance, raw);
        let appearance = record.as_appearance().unwrap();
        assert_eq!(appearance.snapshots.len(), 2);
        assert!(appearance.snapshots[1].roi.is_none());
        assert_eq!(appearance.object_id_str().as_deref(), Some("12"));

        let summary = record.summary();
        assert!(summary.get("snapshots").is_none());
        assert_eq!(summary["confidence"], json!(0.9));
    }
}
