//! Aspect ratio evaluation against the target geometry.

use castmedia_core::TargetGeometry;

/// Whether `width x height` is within tolerance of 9:16.
pub fn conforms(width: u32, height: u32) -> bool {
    conforms_to(width, height, &TargetGeometry::PORTRAIT)
}

/// Whether `width / height` lies within `tolerance_percent` of the target
/// ratio, bounds inclusive. Zero on either side never conforms.
///
/// `|w/h - rw/rh| <= rw/rh * p/100` is evaluated as
/// `|w*rh - h*rw| * 100 <= p * rw * h`, which is exact in integers, so ratios
/// sitting precisely on a tolerance bound are not lost to float rounding.
pub fn conforms_to(width: u32, height: u32, geometry: &TargetGeometry) -> bool {
    if width == 0 || height == 0 || geometry.ratio_width == 0 || geometry.ratio_height == 0 {
        return false;
    }

    let w = width as u128;
    let h = height as u128;
    let rw = geometry.ratio_width as u128;
    let rh = geometry.ratio_height as u128;

    let deviation = (w * rh).abs_diff(h * rw);
    deviation * 100 <= geometry.tolerance_percent as u128 * rw * h
}
