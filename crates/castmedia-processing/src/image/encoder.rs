//! Output encoding for normalized images.
//!
//! The normalized file keeps the format family of its source: JPEG stays
//! JPEG, PNG stays PNG, WebP stays WebP.

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilterType, PngEncoder};
use image::RgbImage;
use std::io::Write;

pub const JPEG_QUALITY: u8 = 90;
pub const WEBP_QUALITY: f32 = 90.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputEncoding {
    Jpeg,
    Png,
    WebP,
}

impl OutputEncoding {
    pub fn from_mime(mime_type: &str) -> Option<Self> {
        match mime_type {
            "image/jpeg" => Some(Self::Jpeg),
            "image/png" => Some(Self::Png),
            "image/webp" => Some(Self::WebP),
            _ => None,
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::WebP => "image/webp",
        }
    }

    /// Encode `img` into `writer`.
    ///
    /// JPEG and WebP use quality 90, PNG uses maximum compression.
    pub fn encode<W: Write>(&self, img: &RgbImage, mut writer: W) -> Result<(), anyhow::Error> {
        match self {
            Self::Jpeg => {
                img.write_with_encoder(JpegEncoder::new_with_quality(&mut writer, JPEG_QUALITY))?;
            }
            Self::Png => {
                img.write_with_encoder(PngEncoder::new_with_quality(
                    &mut writer,
                    CompressionType::Best,
                    PngFilterType::Adaptive,
                ))?;
            }
            Self::WebP => {
                let (width, height) = img.dimensions();
                let encoded = webp::Encoder::from_rgb(img.as_raw(), width, height).encode(WEBP_QUALITY);
                writer.write_all(&encoded)?;
            }
        }
        writer.flush()?;
        Ok(())
    }
}
