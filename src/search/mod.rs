//! Token-continued searches over events and appearances.

pub mod page;
pub mod query;
pub mod session;

pub use page::Page;
pub use query::{
    format_api_time, AppearanceQuery, AppearanceRef, DescriptorQuery, DetectedObject,
    EventsActive, EventsTimeRange, QueryParams, ScanType,
};
pub use session::{PageOutcome, SearchSession, SessionState};
