//! Data models for the media pipeline

mod media;

pub use media::{FileDescriptor, MediaKind, MediaMetadata};
