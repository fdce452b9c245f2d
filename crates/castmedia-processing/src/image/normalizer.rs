//! Image normalization: decode, letterbox onto the target canvas and write
//! the result in the source's format family.

use castmedia_core::TargetGeometry;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use super::encoder::OutputEncoding;
use super::letterbox::LetterboxPlan;
use super::processor::ImageProcessor;
use crate::classifier::detect_mime;

#[derive(Debug, thiserror::Error)]
pub enum ImageNormalizeError {
    #[error("Unsupported image type: {0}")]
    UnsupportedFormat(String),

    #[error("Could not decode source image: {0}")]
    Decode(String),

    #[error("Source image has no pixels")]
    EmptySource,

    #[error("Could not encode normalized image: {0}")]
    Encode(String),

    #[error("Image normalization was cancelled")]
    Cancelled,

    #[error("Image worker failed: {0}")]
    Worker(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Letterboxes still images onto the target canvas.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageNormalizer {
    geometry: TargetGeometry,
}

impl ImageNormalizer {
    pub fn new(geometry: TargetGeometry) -> Self {
        Self { geometry }
    }

    pub fn geometry(&self) -> &TargetGeometry {
        &self.geometry
    }

    /// Normalize `source` into `dest` on the blocking pool.
    ///
    /// The output is staged in a temporary file next to `dest` and renamed
    /// into place, so `dest` is either complete or untouched. If this future
    /// is dropped, the staged file is discarded instead of being persisted.
    /// The rename and the drop-side cancel take the same lock, so once the
    /// future is gone no later rename can land at `dest`.
    #[tracing::instrument(skip(self), fields(media.kind = "image"))]
    pub async fn normalize(
        &self,
        source: &Path,
        dest: &Path,
    ) -> Result<LetterboxPlan, ImageNormalizeError> {
        let cancelled = Arc::new(Mutex::new(false));
        let _cancel_on_drop = CancelOnDrop(cancelled.clone());

        let source = source.to_path_buf();
        let dest = dest.to_path_buf();
        let geometry = self.geometry;

        tokio::task::spawn_blocking(move || {
            normalize_blocking(&source, &dest, &geometry, &cancelled)
        })
        .await
        .map_err(|e| ImageNormalizeError::Worker(e.to_string()))?
    }
}

struct CancelOnDrop(Arc<Mutex<bool>>);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) = true;
    }
}

/// Rename `staged` onto `dest` unless the caller has gone away.
///
/// Holds the cancel lock across the rename.
fn persist_unless_cancelled(
    staged: tempfile::NamedTempFile,
    dest: &Path,
    cancelled: &Mutex<bool>,
) -> Result<(), ImageNormalizeError> {
    let cancelled = cancelled.lock().unwrap_or_else(PoisonError::into_inner);
    if *cancelled {
        return Err(ImageNormalizeError::Cancelled);
    }
    staged.persist(dest).map_err(|e| e.error)?;
    Ok(())
}

fn normalize_blocking(
    source: &Path,
    dest: &Path,
    geometry: &TargetGeometry,
    cancelled: &Mutex<bool>,
) -> Result<LetterboxPlan, ImageNormalizeError> {
    let start = Instant::now();

    let mime_type = detect_mime(source)?;
    let encoding = OutputEncoding::from_mime(&mime_type)
        .ok_or_else(|| ImageNormalizeError::UnsupportedFormat(mime_type.clone()))?;

    let img = ImageProcessor::decode(source, &mime_type)
        .map_err(|e| ImageNormalizeError::Decode(e.to_string()))?;
    let (source_width, source_height) = (img.width(), img.height());
    let plan = LetterboxPlan::fit(source_width, source_height, geometry)
        .ok_or(ImageNormalizeError::EmptySource)?;

    let canvas = plan.render(&img);
    drop(img);

    let staging_dir = staging_dir_for(dest);
    let mut staged = tempfile::NamedTempFile::new_in(&staging_dir)?;
    encoding
        .encode(&canvas, BufWriter::new(staged.as_file_mut()))
        .map_err(|e| ImageNormalizeError::Encode(e.to_string()))?;

    persist_unless_cancelled(staged, dest, cancelled)?;

    tracing::info!(
        duration_ms = start.elapsed().as_millis() as u64,
        source_width,
        source_height,
        scaled_width = plan.scaled_width,
        scaled_height = plan.scaled_height,
        pad_x = plan.pad_x,
        pad_y = plan.pad_y,
        format = encoding.mime_type(),
        "Image letterbox completed"
    );

    Ok(plan)
}

fn staging_dir_for(dest: &Path) -> PathBuf {
    match dest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, ImageFormat, Rgb, RgbImage};

    fn write_source(dir: &Path, name: &str, w: u32, h: u32, format: ImageFormat) -> PathBuf {
        let path = dir.join(name);
        RgbImage::from_pixel(w, h, Rgb([250, 250, 250]))
            .save_with_format(&path, format)
            .unwrap();
        path
    }

    fn small_portrait() -> TargetGeometry {
        TargetGeometry {
            width: 90,
            height: 160,
            ..TargetGeometry::PORTRAIT
        }
    }

    #[tokio::test]
    async fn test_normalize_png_to_target_canvas() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_source(dir.path(), "wide.png", 320, 180, ImageFormat::Png);
        let dest = dir.path().join("norm_wide.png");

        let plan = ImageNormalizer::new(small_portrait())
            .normalize(&source, &dest)
            .await
            .unwrap();

        assert_eq!((plan.pad_x, plan.pad_y), (0, 55));
        assert_eq!(detect_mime(&dest).unwrap(), "image/png");
        let out = image::open(&dest).unwrap();
        assert_eq!(out.dimensions(), (90, 160));
        assert_eq!(out.to_rgb8().get_pixel(10, 5), &Rgb([0, 0, 0]));
    }

    #[tokio::test]
    async fn test_jpeg_stays_jpeg() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_source(dir.path(), "photo.jpg", 200, 200, ImageFormat::Jpeg);
        let dest = dir.path().join("norm_photo.jpg");

        ImageNormalizer::new(small_portrait())
            .normalize(&source, &dest)
            .await
            .unwrap();

        assert_eq!(detect_mime(&dest).unwrap(), "image/jpeg");
        assert_eq!(image::open(&dest).unwrap().dimensions(), (90, 160));
    }

    #[tokio::test]
    async fn test_webp_stays_webp() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_source(dir.path(), "clip.webp", 60, 60, ImageFormat::WebP);
        let dest = dir.path().join("norm_clip.webp");

        ImageNormalizer::new(small_portrait())
            .normalize(&source, &dest)
            .await
            .unwrap();

        assert_eq!(detect_mime(&dest).unwrap(), "image/webp");
    }

    #[tokio::test]
    async fn test_corrupt_source_leaves_no_output() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("broken.jpg");
        std::fs::write(&source, [0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0]).unwrap();
        let dest = dir.path().join("norm_broken.jpg");

        let result = ImageNormalizer::default().normalize(&source, &dest).await;

        assert!(matches!(result, Err(ImageNormalizeError::Decode(_))));
        assert!(!dest.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_non_image_source_is_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("notes.txt");
        std::fs::write(&source, "plain text").unwrap();

        let result = ImageNormalizer::default()
            .normalize(&source, &dir.path().join("out.txt"))
            .await;

        assert!(matches!(result, Err(ImageNormalizeError::UnsupportedFormat(_))));
    }

    #[tokio::test]
    async fn test_missing_destination_dir_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_source(dir.path(), "a.png", 9, 16, ImageFormat::Png);

        let result = ImageNormalizer::new(small_portrait())
            .normalize(&source, &dir.path().join("missing/out.png"))
            .await;

        assert!(matches!(result, Err(ImageNormalizeError::Io(_))));
    }

    #[test]
    fn test_cancelled_flag_blocks_persist() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("norm_late.png");
        let staged = tempfile::NamedTempFile::new_in(dir.path()).unwrap();
        let cancelled = Arc::new(Mutex::new(false));
        drop(CancelOnDrop(cancelled.clone()));

        let result = persist_unless_cancelled(staged, &dest, &cancelled);

        assert!(matches!(result, Err(ImageNormalizeError::Cancelled)));
        assert!(!dest.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_cancel_waits_for_inflight_persist() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("norm_race.png");
        let staged = tempfile::NamedTempFile::new_in(dir.path()).unwrap();
        let cancelled = Arc::new(Mutex::new(false));

        let held = cancelled.lock().unwrap();
        let canceller = {
            let cancelled = cancelled.clone();
            std::thread::spawn(move || drop(CancelOnDrop(cancelled)))
        };
        std::thread::sleep(std::time::Duration::from_millis(50));
        assert!(!canceller.is_finished());
        drop(held);
        canceller.join().unwrap();

        assert!(*cancelled.lock().unwrap());
        assert!(matches!(
            persist_unless_cancelled(staged, &dest, &cancelled),
            Err(ImageNormalizeError::Cancelled)
        ));
        assert!(!dest.exists());
    }
}
