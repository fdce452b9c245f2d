//! Upload ingestion: validate, store, normalize when needed, record.

mod service;
mod store;

pub use service::{IngestError, IngestRequest, IngestService, IngestedMedia};
pub use store::{JsonLinesStore, MediaRecord, MediaStore, PENDING_APPROVAL};
