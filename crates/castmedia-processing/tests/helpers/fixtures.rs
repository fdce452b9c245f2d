//! Media fixtures generated in-process.

use castmedia_core::FileDescriptor;
use image::{ImageFormat, Rgb, RgbImage};
use std::path::{Path, PathBuf};

/// ftyp box of an ISO base media file; enough for content sniffing.
const MP4_HEADER: [u8; 24] = [
    0x00, 0x00, 0x00, 0x18, b'f', b't', b'y', b'p', b'i', b's', b'o', b'm', 0x00, 0x00, 0x02,
    0x00, b'i', b's', b'o', b'm', b'm', b'p', b'4', b'1',
];

pub fn write_image(dir: &Path, name: &str, width: u32, height: u32, format: ImageFormat) -> PathBuf {
    let path = dir.join(name);
    RgbImage::from_fn(width, height, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 128]))
        .save_with_format(&path, format)
        .unwrap();
    path
}

/// A file that sniffs as JPEG but does not decode.
pub fn write_truncated_jpeg(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(
        &path,
        [0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0x00, 0x01, 0x01, 0x00],
    )
    .unwrap();
    path
}

pub fn write_mp4_stub(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    let mut bytes = MP4_HEADER.to_vec();
    bytes.extend_from_slice(&[0u8; 256]);
    std::fs::write(&path, bytes).unwrap();
    path
}

pub fn descriptor(path: &Path, original_filename: &str) -> FileDescriptor {
    let size = std::fs::metadata(path).unwrap().len();
    FileDescriptor::new(path, original_filename, size)
}
