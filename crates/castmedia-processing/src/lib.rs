//! Castmedia Media Processing Library
//!
//! Validation and 9:16 normalization of uploaded images and videos:
//! classification, metadata extraction, aspect-ratio policy, letterboxing,
//! external tool discovery and unique filename allocation.

pub mod aspect;
pub mod classifier;
pub mod filename;
pub mod image;
pub mod ingest;
pub mod metadata;
pub mod normalizer;
pub mod process;
pub mod tools;
pub mod validator;
pub mod video;

// Re-export commonly used types
pub use aspect::{conforms, conforms_to};
pub use classifier::{classify, detect_mime, media_kind_of_path};
pub use filename::{allocate_unique_filename, AllocateError, FilenameAllocator};
pub use crate::image::{ImageNormalizer, LetterboxPlan};
pub use ingest::{
    IngestError, IngestRequest, IngestService, IngestedMedia, JsonLinesStore, MediaRecord,
    MediaStore,
};
pub use metadata::{ExtractError, MetadataExtractor};
pub use normalizer::{NormalizationOutcome, Normalizer};
pub use process::{ProcessOutput, ProcessRunner, TokioProcessRunner, ToolError};
pub use tools::{locate_executable, MediaTools};
pub use validator::{MediaValidator, SizeLimits, ValidationIssue, ValidationResult, Verdict};
pub use video::{ProbeReport, VideoTranscoder};
