//! Shared helpers for pipeline integration tests.

#![allow(dead_code)]

pub mod fixtures;
pub mod runners;

use castmedia_core::{MediaPipelineConfig, TargetGeometry};
use castmedia_processing::{
    MediaTools, MediaValidator, MetadataExtractor, Normalizer, ProcessRunner, SizeLimits,
};
use std::path::PathBuf;
use std::sync::Arc;

pub fn fake_tools() -> MediaTools {
    MediaTools::with_paths(
        Some(PathBuf::from("/opt/fake/ffprobe")),
        Some(PathBuf::from("/opt/fake/ffmpeg")),
    )
}

pub fn validator(tools: &MediaTools, runner: Arc<dyn ProcessRunner>) -> MediaValidator {
    let config = MediaPipelineConfig::default();
    MediaValidator::new(
        MetadataExtractor::new(tools, runner, config.probe_timeout()),
        SizeLimits::from_config(&config),
        TargetGeometry::PORTRAIT,
    )
}

pub fn normalizer(tools: &MediaTools, runner: Arc<dyn ProcessRunner>) -> Normalizer {
    Normalizer::from_tools(tools, runner, &MediaPipelineConfig::default())
}
