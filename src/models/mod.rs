//! Data models for upstream records and inventory.

pub mod deserializers;
pub mod inventory;
pub mod record;

pub use inventory::{facet_tags, Camera, NamedResource, QueryDescriptor, Server, Site};
pub use record::{
    AppearanceRecord, EventRecord, Record, RecordKind, RecordView, Roi, Snapshot,
    FACET_START_EVENT, FACE_MATCH_TOPIC,
};
