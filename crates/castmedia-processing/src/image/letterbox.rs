//! Letterbox geometry: fit a source frame inside the target frame, keep its
//! aspect ratio and center it on black bars.

use castmedia_core::TargetGeometry;
use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgba, RgbaImage, RgbImage};

const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Placement of a scaled source inside the target canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LetterboxPlan {
    pub scale: f64,
    pub scaled_width: u32,
    pub scaled_height: u32,
    pub pad_x: u32,
    pub pad_y: u32,
    pub canvas_width: u32,
    pub canvas_height: u32,
}

impl LetterboxPlan {
    /// Compute the plan for a `src_width x src_height` frame.
    ///
    /// Returns `None` for zero-sized sources. The binding side is chosen
    /// with integer cross-multiplication and the other side is floored, so
    /// the scaled frame never exceeds the canvas and is at least 1px wide.
    pub fn fit(src_width: u32, src_height: u32, geometry: &TargetGeometry) -> Option<Self> {
        if src_width == 0 || src_height == 0 || geometry.width == 0 || geometry.height == 0 {
            return None;
        }

        let (sw, sh) = (src_width as u64, src_height as u64);
        let (tw, th) = (geometry.width as u64, geometry.height as u64);

        // tw/sw <= th/sh: width binds
        let (scaled_width, scaled_height, scale) = if tw * sh <= th * sw {
            (tw, sh * tw / sw, tw as f64 / sw as f64)
        } else {
            (sw * th / sh, th, th as f64 / sh as f64)
        };
        let scaled_width = scaled_width.clamp(1, tw) as u32;
        let scaled_height = scaled_height.clamp(1, th) as u32;

        Some(Self {
            scale,
            scaled_width,
            scaled_height,
            pad_x: (geometry.width - scaled_width) / 2,
            pad_y: (geometry.height - scaled_height) / 2,
            canvas_width: geometry.width,
            canvas_height: geometry.height,
        })
    }

    /// True when the source already fills the canvas exactly.
    pub fn is_identity(&self) -> bool {
        self.pad_x == 0
            && self.pad_y == 0
            && self.scaled_width == self.canvas_width
            && self.scaled_height == self.canvas_height
    }

    /// Resample `source` (bilinear) and composite it onto an opaque black
    /// canvas. Transparency in the source is flattened onto the black bars.
    pub fn render(&self, source: &DynamicImage) -> RgbImage {
        let resized = imageops::resize(
            &source.to_rgba8(),
            self.scaled_width,
            self.scaled_height,
            FilterType::Triangle,
        );

        let mut canvas = RgbaImage::from_pixel(self.canvas_width, self.canvas_height, BLACK);
        imageops::overlay(&mut canvas, &resized, self.pad_x as i64, self.pad_y as i64);

        DynamicImage::ImageRgba8(canvas).to_rgb8()
    }
}
