//! Video handling through the external ffprobe/ffmpeg tools

pub mod probe;
pub mod transcoder;

pub use probe::{probe_video, ProbeReport};
pub use transcoder::VideoTranscoder;
