//! Derived views over accumulated search results.
//!
//! Projection never mutates or reorders the results and never fails: a
//! record lacking what a view needs is simply left out of that view.

use serde_json::{Map, Value};

use crate::media::{CacheKey, CropTarget, MediaFormat, MediaHandle};
use crate::models::{AppearanceRecord, EventRecord, Record, Snapshot, FACET_START_EVENT};

/// Columns shown for a media event, when present.
pub const MEDIA_EVENT_COLUMNS: [&str; 6] = [
    "thisId",
    "timestamp",
    "originatingEventId",
    "originatingServerId",
    "recordTriggerParams",
    "cameraId",
];

/// Which view to project.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    All,
    MediaEvents,
    FaceMatches,
    AppearanceSnapshots,
}

/// A facet-start event whose clip or metadata can be fetched.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaEventRow<'a> {
    pub index: usize,
    pub event: &'a EventRecord,
    /// Available display columns, in `MEDIA_EVENT_COLUMNS` order.
    pub summary: Map<String, Value>,
    pub camera_id: &'a str,
    pub timestamp: &'a str,
}

impl MediaEventRow<'_> {
    pub fn handle(&self, format: MediaFormat) -> MediaHandle {
        MediaHandle::new(self.camera_id, self.timestamp, format)
    }
}

/// A face match with everything needed to fetch and crop its frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceMatchRow<'a> {
    pub index: usize,
    pub event: &'a EventRecord,
    pub target: CropTarget,
}

/// One snapshot of an appearance instance, ready to crop.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotRow<'a> {
    pub index: usize,
    pub snapshot_index: usize,
    pub instance: &'a AppearanceRecord,
    pub snapshot: &'a Snapshot,
    pub target: CropTarget,
}

/// The projected view.
#[derive(Debug, Clone, PartialEq)]
pub enum DerivedView<'a> {
    All(Vec<&'a Record>),
    MediaEvents(Vec<MediaEventRow<'a>>),
    FaceMatches(Vec<FaceMatchRow<'a>>),
    AppearanceSnapshots(Vec<SnapshotRow<'a>>),
}

impl DerivedView<'_> {
    pub fn len(&self) -> usize {
        match self {
            DerivedView::All(rows) => rows.len(),
            DerivedView::MediaEvents(rows) => rows.len(),
            DerivedView::FaceMatches(rows) => rows.len(),
            DerivedView::AppearanceSnapshots(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub fn project(results: &[Record], view: ViewKind) -> DerivedView<'_> {
    match view {
        ViewKind::All => DerivedView::All(results.iter().collect()),
        ViewKind::MediaEvents => DerivedView::MediaEvents(media_events(results)),
        ViewKind::FaceMatches => DerivedView::FaceMatches(face_matches(results)),
        ViewKind::AppearanceSnapshots => {
            DerivedView::AppearanceSnapshots(appearance_snapshots(results))
        }
    }
}

fn events(results: &[Record]) -> impl Iterator<Item = (usize, &EventRecord)> {
    results
        .iter()
        .enumerate()
        .filter_map(|(i, r)| r.as_event().map(|e| (i, e)))
}

pub fn media_events(results: &[Record]) -> Vec<MediaEventRow<'_>> {
    results
        .iter()
        .enumerate()
        .filter_map(|(index, record)| {
            let event = record.as_event()?;
            if event.event_type.as_deref() != Some(FACET_START_EVENT) {
                return None;
            }
            let camera_id = event.camera_id.as_deref()?;
            let timestamp = event.timestamp.as_deref()?;
            let summary = MEDIA_EVENT_COLUMNS
                .iter()
                .filter_map(|col| record.raw().get(*col).map(|v| (col.to_string(), v.clone())))
                .collect();
            Some(MediaEventRow {
                index,
                event,
                summary,
                camera_id,
                timestamp,
            })
        })
        .collect()
}

pub fn face_matches(results: &[Record]) -> Vec<FaceMatchRow<'_>> {
    events(results)
        .filter_map(|(index, event)| {
            let camera_id = event.camera_id.as_deref()?;
            let timestamp = event.timestamp.as_deref()?;
            let roi = event.face_roi?;
            let key = CacheKey::new(
                event.object_id_str().unwrap_or_default(),
                event.this_id_str().unwrap_or_default(),
            );
            Some(FaceMatchRow {
                index,
                event,
                target: CropTarget {
                    handle: MediaHandle::new(camera_id, timestamp, MediaFormat::Jpeg),
                    roi,
                    key,
                },
            })
        })
        .collect()
}

pub fn appearance_snapshots(results: &[Record]) -> Vec<SnapshotRow<'_>> {
    let mut rows = Vec::new();
    for (index, record) in results.iter().enumerate() {
        let Some(instance) = record.as_appearance() else {
            continue;
        };
        let Some(device_gid) = instance.device_gid.as_deref() else {
            continue;
        };
        let subject = instance
            .object_id_str()
            .unwrap_or_else(|| device_gid.to_string());
        for (snapshot_index, snapshot) in instance.snapshots.iter().enumerate() {
            let (Some(timestamp), Some(roi)) = (snapshot.timestamp.as_deref(), snapshot.roi)
            else {
                continue;
            };
            rows.push(SnapshotRow {
                index,
                snapshot_index,
                instance,
                snapshot,
                target: CropTarget {
                    handle: MediaHandle::new(device_gid, timestamp, MediaFormat::Jpeg),
                    roi,
                    key: CacheKey::new(subject.clone(), timestamp.to_string()),
                },
            });
        }
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RecordKind;
    use serde_json::json;

    fn events_from(values: Vec<Value>) -> Vec<Record> {
        values
            .into_iter()
            .map(|v| Record::from_value(RecordKind::Event, v))
            .collect()
    }

    #[test]
    fn test_media_events_filters_type_and_fields() {
        let results = events_from(vec![
            json!({"thisId": "1", "type": "DEVICE_FACET_START", "cameraId": "c", "timestamp": "t"}),
            json!({"thisId": "2", "type": "DEVICE_MOTION_START", "cameraId": "c", "timestamp": "t"}),
            json!({"thisId": "3", "type": "DEVICE_FACET_START", "timestamp": "t"}),
            json!({"thisId": "4", "type": "DEVICE_FACET_START", "cameraId": "c2", "timestamp": "t2",
                   "originatingServerId": "srv", "noise": true}),
        ]);

        let rows = media_events(&results);
        let indexes: Vec<usize> = rows.iter().map(|r| r.index).collect();
        assert_eq!(indexes, vec![0, 3]);
        assert_eq!(rows[1].summary.get("originatingServerId"), Some(&json!("srv")));
        assert_eq!(rows[1].summary.get("cameraId"), Some(&json!("c2")));
        assert!(rows[1].summary.get("noise").is_none());
        assert_eq!(
            rows[1].handle(MediaFormat::Fmp4),
            MediaHandle::new("c2", "t2", MediaFormat::Fmp4)
        );
    }

    #[test]
    fn test_face_matches_require_roi() {
        let results = events_from(vec![
            json!({"thisId": "e1", "objectId": 5, "cameraId": "c", "timestamp": "t",
                   "faceRoi": {"left": 0.1, "top": 0.1, "right": 0.2, "bottom": 0.2}}),
            json!({"thisId": "e2", "cameraId": "c", "timestamp": "t"}),
            json!({"thisId": "e3", "cameraId": "c", "timestamp": "t", "faceRoi": [1, 2]}),
        ]);

        let rows = face_matches(&results);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].target.key, CacheKey::new("5", "e1"));
        assert_eq!(rows[0].target.handle.format, MediaFormat::Jpeg);
    }

    #[test]
    fn test_appearance_snapshots_flatten_in_order() {
        let results: Vec<Record> = vec![
            json!({"deviceGid": "g1", "objectId": 9, "snapshots": [
                {"timestamp": "t1", "roi": {"left": 0.0, "top": 0.0, "right": 0.5, "bottom": 0.5}},
                {"timestamp": "t2"},
                {"timestamp": "t3", "roi": {"left": 0.1, "top": 0.1, "right": 0.9, "bottom": 0.9}}
            ]}),
            json!({"snapshots": [
                {"timestamp": "t4", "roi": {"left": 0.0, "top": 0.0, "right": 1.0, "bottom": 1.0}}
            ]}),
        ]
        .into_iter()
        .map(|v| Record::from_value(RecordKind::Appearance, v))
        .collect();

        let rows = appearance_snapshots(&results);
        let picked: Vec<(usize, usize)> =
            rows.iter().map(|r| (r.index, r.snapshot_index)).collect();
        assert_eq!(picked, vec![(0, 0), (0, 2)]);
        assert_eq!(rows[1].target.key, CacheKey::new("9", "t3"));
        assert_eq!(rows[1].target.handle.camera_id, "g1");
    }

    #[test]
    fn test_project_all_and_mixed_shapes() {
        let results = vec![
            Record::from_value(RecordKind::Event, json!("not an object")),
            Record::from_value(RecordKind::Appearance, json!({"deviceGid": "g"})),
        ];
        assert_eq!(project(&results, ViewKind::All).len(), 2);
        assert!(project(&results, ViewKind::MediaEvents).is_empty());
        assert!(project(&results, ViewKind::FaceMatches).is_empty());
        assert!(project(&results, ViewKind::AppearanceSnapshots).is_empty());
    }
}
