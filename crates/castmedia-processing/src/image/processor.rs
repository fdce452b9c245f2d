//! Image processor - decoding and dimension extraction

use image::{DynamicImage, GenericImageView, ImageFormat, ImageReader};
use std::path::Path;

pub struct ImageProcessor;

impl ImageProcessor {
    /// Map a sniffed MIME type to the decoder that must accept the file.
    pub fn format_for_mime(mime_type: &str) -> Option<ImageFormat> {
        match mime_type {
            "image/jpeg" => Some(ImageFormat::Jpeg),
            "image/png" => Some(ImageFormat::Png),
            "image/webp" => Some(ImageFormat::WebP),
            _ => None,
        }
    }

    /// Fully decode `path` as `mime_type`. A file whose bytes do not decode
    /// under that format is an error, even if another decoder would accept it.
    pub fn decode(path: &Path, mime_type: &str) -> Result<DynamicImage, anyhow::Error> {
        let format = Self::format_for_mime(mime_type)
            .ok_or_else(|| anyhow::anyhow!("Unsupported image type: {}", mime_type))?;

        let mut reader = ImageReader::open(path)?;
        reader.set_format(format);
        Ok(reader.decode()?)
    }

    /// Decode and return pixel dimensions.
    pub fn dimensions(path: &Path, mime_type: &str) -> Result<(u32, u32), anyhow::Error> {
        Ok(Self::decode(path, mime_type)?.dimensions())
    }
}
