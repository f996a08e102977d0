//! Ambient light estimation from frame luminance

use image::RgbImage;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Low-light estimator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LightConfig {
    /// Sample every n-th pixel
    pub sample_stride: usize,
    /// Average luma (0-255) below which the cabin counts as dark
    pub low_light_luma: u8,
    /// Re-estimate on frames whose counter is a multiple of this
    pub check_every_frames: u64,
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            sample_stride: 10,
            low_light_luma: 40,
            check_every_frames: 30,
        }
    }
}

/// Average luma (0.299R + 0.587G + 0.114B) over every `stride`-th pixel
pub fn average_luma(image: &RgbImage, stride: usize) -> u8 {
    let mut total: u64 = 0;
    let mut count: u64 = 0;

    for pixel in image.as_raw().chunks_exact(3).step_by(stride.max(1)) {
        // Integer weights keep pure white at exactly 255
        let luma = (299 * pixel[0] as u64 + 587 * pixel[1] as u64 + 114 * pixel[2] as u64) / 1000;
        total += luma;
        count += 1;
    }

    if count == 0 {
        0
    } else {
        (total / count) as u8
    }
}

/// Periodic low-light detector
///
/// The flag persists between estimates.
#[derive(Debug, Clone, Default)]
pub struct LowLightEstimator {
    config: LightConfig,
    low_light: bool,
}

impl LowLightEstimator {
    pub fn new(config: LightConfig) -> Self {
        Self {
            config,
            low_light: false,
        }
    }

    /// Feed an admitted frame; re-estimates only on scheduled frames
    pub fn observe(&mut self, frame_index: u64, image: &RgbImage) -> bool {
        let every = self.config.check_every_frames.max(1);
        if frame_index % every == 0 {
            let luma = average_luma(image, self.config.sample_stride);
            self.low_light = luma < self.config.low_light_luma;
            if self.low_light {
                info!("Low light detected (brightness: {})", luma);
            }
        }
        self.low_light
    }

    pub fn is_low_light(&self) -> bool {
        self.low_light
    }

    pub fn reset(&mut self) {
        self.low_light = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_average_luma() {
        let white = RgbImage::from_pixel(20, 10, Rgb([255, 255, 255]));
        assert_eq!(average_luma(&white, 10), 255);

        let black = RgbImage::from_pixel(20, 10, Rgb([0, 0, 0]));
        assert_eq!(average_luma(&black, 10), 0);
    }

    #[test]
    fn test_empty_image() {
        let empty = RgbImage::new(0, 0);
        assert_eq!(average_luma(&empty, 10), 0);
    }

    #[test]
    fn test_estimate_only_on_schedule() {
        let mut estimator = LowLightEstimator::default();
        let dark = RgbImage::from_pixel(8, 8, Rgb([10, 10, 10]));
        let bright = RgbImage::from_pixel(8, 8, Rgb([200, 200, 200]));

        assert!(!estimator.observe(29, &dark));
        assert!(estimator.observe(30, &dark));
        // Not a scheduled frame: flag persists
        assert!(estimator.observe(31, &bright));
        assert!(!estimator.observe(60, &bright));
    }
}
