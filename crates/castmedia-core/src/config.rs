//! Configuration module
//!
//! Size ceilings, external tool overrides, subprocess timeouts and the upload
//! root used by the media pipeline. Values come from the environment (and an
//! optional `.env` file) with defaults matching the upload policy.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::constants::BYTES_PER_MB;

const MAX_FILE_SIZE_MB: u64 = 100;
const MAX_IMAGE_SIZE_MB: u64 = 10;
const MAX_VIDEO_SIZE_MB: u64 = 100;
const PROBE_TIMEOUT_SECS: u64 = 30;
const TRANSCODE_TIMEOUT_SECS: u64 = 600;
const UPLOAD_DIR: &str = "./uploads";

/// Media pipeline configuration
#[derive(Clone, Debug)]
pub struct MediaPipelineConfig {
    pub max_file_size_bytes: u64,
    pub max_image_size_bytes: u64,
    pub max_video_size_bytes: u64,
    /// Explicit ffprobe location; discovered on the host when unset
    pub ffprobe_path: Option<PathBuf>,
    /// Explicit ffmpeg location; discovered on the host when unset
    pub ffmpeg_path: Option<PathBuf>,
    pub probe_timeout_secs: u64,
    pub transcode_timeout_secs: u64,
    pub upload_dir: PathBuf,
}

impl Default for MediaPipelineConfig {
    fn default() -> Self {
        Self {
            max_file_size_bytes: MAX_FILE_SIZE_MB * BYTES_PER_MB,
            max_image_size_bytes: MAX_IMAGE_SIZE_MB * BYTES_PER_MB,
            max_video_size_bytes: MAX_VIDEO_SIZE_MB * BYTES_PER_MB,
            ffprobe_path: None,
            ffmpeg_path: None,
            probe_timeout_secs: PROBE_TIMEOUT_SECS,
            transcode_timeout_secs: TRANSCODE_TIMEOUT_SECS,
            upload_dir: PathBuf::from(UPLOAD_DIR),
        }
    }
}

impl MediaPipelineConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup (the process
    /// environment in production, a map in tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let megabytes = |key: &str, default: u64| -> u64 {
            lookup(key)
                .and_then(|v| v.trim().parse::<u64>().ok())
                .unwrap_or(default)
                * BYTES_PER_MB
        };
        let seconds = |key: &str, default: u64| -> u64 {
            lookup(key)
                .and_then(|v| v.trim().parse::<u64>().ok())
                .unwrap_or(default)
        };
        let path = |key: &str| -> Option<PathBuf> {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
        };

        let config = MediaPipelineConfig {
            max_file_size_bytes: megabytes("MAX_FILE_SIZE_MB", MAX_FILE_SIZE_MB),
            max_image_size_bytes: megabytes("MAX_IMAGE_SIZE_MB", MAX_IMAGE_SIZE_MB),
            max_video_size_bytes: megabytes("MAX_VIDEO_SIZE_MB", MAX_VIDEO_SIZE_MB),
            ffprobe_path: path("FFPROBE_PATH"),
            ffmpeg_path: path("FFMPEG_PATH"),
            probe_timeout_secs: seconds("PROBE_TIMEOUT_SECS", PROBE_TIMEOUT_SECS),
            transcode_timeout_secs: seconds("TRANSCODE_TIMEOUT_SECS", TRANSCODE_TIMEOUT_SECS),
            upload_dir: path("UPLOAD_DIR").unwrap_or_else(|| PathBuf::from(UPLOAD_DIR)),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.max_file_size_bytes == 0
            || self.max_image_size_bytes == 0
            || self.max_video_size_bytes == 0
        {
            return Err(anyhow::anyhow!("Size ceilings must be greater than zero"));
        }

        if self.max_image_size_bytes > self.max_file_size_bytes
            || self.max_video_size_bytes > self.max_file_size_bytes
        {
            return Err(anyhow::anyhow!(
                "MAX_IMAGE_SIZE_MB and MAX_VIDEO_SIZE_MB cannot exceed MAX_FILE_SIZE_MB"
            ));
        }

        if self.probe_timeout_secs == 0 || self.transcode_timeout_secs == 0 {
            return Err(anyhow::anyhow!(
                "PROBE_TIMEOUT_SECS and TRANSCODE_TIMEOUT_SECS must be greater than zero"
            ));
        }

        Ok(())
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn transcode_timeout(&self) -> Duration {
        Duration::from_secs(self.transcode_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_match_upload_policy() {
        let config = MediaPipelineConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.max_file_size_bytes, 100 * 1024 * 1024);
        assert_eq!(config.max_image_size_bytes, 10 * 1024 * 1024);
        assert_eq!(config.max_video_size_bytes, 100 * 1024 * 1024);
        assert!(config.ffprobe_path.is_none());
        assert!(config.ffmpeg_path.is_none());
        assert_eq!(config.probe_timeout(), Duration::from_secs(30));
        assert_eq!(config.upload_dir, PathBuf::from("./uploads"));
    }

    #[test]
    fn test_overrides_are_applied() {
        let config = MediaPipelineConfig::from_lookup(lookup_from(&[
            ("MAX_IMAGE_SIZE_MB", "5"),
            ("FFMPEG_PATH", "/opt/ffmpeg/bin/ffmpeg"),
            ("TRANSCODE_TIMEOUT_SECS", "60"),
            ("UPLOAD_DIR", "/srv/uploads"),
        ]))
        .unwrap();
        assert_eq!(config.max_image_size_bytes, 5 * 1024 * 1024);
        assert_eq!(
            config.ffmpeg_path,
            Some(PathBuf::from("/opt/ffmpeg/bin/ffmpeg"))
        );
        assert_eq!(config.transcode_timeout(), Duration::from_secs(60));
        assert_eq!(config.upload_dir, PathBuf::from("/srv/uploads"));
    }

    #[test]
    fn test_unparseable_values_fall_back_to_defaults() {
        let config =
            MediaPipelineConfig::from_lookup(lookup_from(&[("MAX_FILE_SIZE_MB", "lots")]))
                .unwrap();
        assert_eq!(config.max_file_size_bytes, 100 * 1024 * 1024);
    }

    #[test]
    fn test_blank_tool_path_is_ignored() {
        let config =
            MediaPipelineConfig::from_lookup(lookup_from(&[("FFPROBE_PATH", "  ")])).unwrap();
        assert!(config.ffprobe_path.is_none());
    }

    #[test]
    fn test_kind_ceiling_above_absolute_is_rejected() {
        let result = MediaPipelineConfig::from_lookup(lookup_from(&[
            ("MAX_FILE_SIZE_MB", "50"),
            ("MAX_VIDEO_SIZE_MB", "80"),
        ]));
        assert!(result.is_err());
    }

    #[test]
    fn test_zero_timeout_is_rejected() {
        let result =
            MediaPipelineConfig::from_lookup(lookup_from(&[("PROBE_TIMEOUT_SECS", "0")]));
        assert!(result.is_err());
    }
}
