//! Castmedia Core Library
//!
//! This crate provides the domain models, target geometry, error types and
//! configuration shared by the media pipeline and its binaries.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;

// Re-export commonly used types
pub use config::MediaPipelineConfig;
pub use constants::TargetGeometry;
pub use error::{AppError, LogLevel};
pub use models::{FileDescriptor, MediaKind, MediaMetadata};
