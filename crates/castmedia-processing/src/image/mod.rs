//! Image processing module
//!
//! - Decoding and dimension extraction (processor)
//! - Letterbox geometry and rendering (letterbox)
//! - Output encoding in the source's format family (encoder)
//! - The end-to-end file normalization (normalizer)

pub mod encoder;
pub mod letterbox;
pub mod normalizer;
pub mod processor;

pub use encoder::OutputEncoding;
pub use letterbox::LetterboxPlan;
pub use normalizer::{ImageNormalizeError, ImageNormalizer};
pub use processor::ImageProcessor;
