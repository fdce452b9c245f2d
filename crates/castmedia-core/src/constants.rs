//! Fixed geometry every normalized upload must conform to.

use serde::Serialize;

/// Target frame for portrait media: aspect ratio, canonical resolution and
/// the relative tolerance used when comparing ratios.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TargetGeometry {
    pub ratio_width: u32,
    pub ratio_height: u32,
    pub width: u32,
    pub height: u32,
    /// Accepted deviation, in percent of the expected ratio.
    pub tolerance_percent: u32,
}

impl TargetGeometry {
    /// 9:16 portrait at 1080x1920 with ±5% tolerance.
    pub const PORTRAIT: TargetGeometry = TargetGeometry {
        ratio_width: 9,
        ratio_height: 16,
        width: 1080,
        height: 1920,
        tolerance_percent: 5,
    };

    pub fn expected_ratio(&self) -> f64 {
        self.ratio_width as f64 / self.ratio_height as f64
    }

    /// Largest accepted deviation from [`expected_ratio`](Self::expected_ratio).
    pub fn max_deviation(&self) -> f64 {
        self.expected_ratio() * self.tolerance_percent as f64 / 100.0
    }

    pub fn label(&self) -> String {
        format!("{}:{}", self.ratio_width, self.ratio_height)
    }
}

impl Default for TargetGeometry {
    fn default() -> Self {
        Self::PORTRAIT
    }
}

pub const BYTES_PER_MB: u64 = 1024 * 1024;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_portrait_geometry_matches_canonical_resolution() {
        let g = TargetGeometry::PORTRAIT;
        assert_eq!(g.expected_ratio(), 9.0 / 16.0);
        assert_eq!(g.width as f64 / g.height as f64, g.expected_ratio());
        assert_eq!(g.label(), "9:16");
        assert!((g.max_deviation() - 0.028125).abs() < 1e-12);
    }
}
