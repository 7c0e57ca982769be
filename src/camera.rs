//! Stereo camera model: disparity to range and pixel column to bearing.

use crate::config::CameraConfig;

/// Fixed-point view of [`CameraConfig`] used on the per-feature path.
#[derive(Debug, Clone, PartialEq)]
pub struct StereoCamera {
    pub image_width: u32,
    pub image_height: u32,
    pub fov_degrees: f32,
    baseline_mm: i64,
    /// Focal length in hundredths of a millimetre.
    focal_length_mm100: i64,
    /// Sensor width in hundredths of a millimetre.
    sensor_width_mm100: f32,
}

impl StereoCamera {
    pub fn new(config: &CameraConfig) -> Self {
        Self {
            image_width: config.image_width,
            image_height: config.image_height,
            fov_degrees: config.fov_degrees,
            baseline_mm: config.baseline_mm as i64,
            focal_length_mm100: (config.focal_length_mm * 100.0).round() as i64,
            sensor_width_mm100: config.sensor_width_mm * 100.0,
        }
    }

    /// Range in millimetres for a disparity in pixels.
    ///
    /// `range = focal_mm100 * baseline / disparity_mm100`, where the disparity
    /// is first converted to hundredths of a millimetre on the sensor.
    /// Returns `None` when the sensor disparity rounds to zero or below.
    pub fn range_from_disparity(&self, disparity_px: f32) -> Option<i32> {
        let disparity_mm100 =
            (disparity_px * self.sensor_width_mm100 / self.image_width as f32) as i64;
        if disparity_mm100 <= 0 {
            return None;
        }
        let range = self.focal_length_mm100 * self.baseline_mm / disparity_mm100;
        i32::try_from(range).ok()
    }

    /// Disparity (pixels) at which a point appears at `range_mm`.
    pub fn disparity_for_range(&self, range_mm: i32) -> f32 {
        if range_mm <= 0 {
            return 0.0;
        }
        let disparity_mm100 = (self.focal_length_mm100 * self.baseline_mm) as f32 / range_mm as f32;
        disparity_mm100 * self.image_width as f32 / self.sensor_width_mm100
    }

    /// Horizontal angle of a pixel column relative to the optical axis (degrees, right positive).
    #[inline]
    pub fn bearing_degrees(&self, pixel_x: f32) -> f32 {
        let center_x = self.image_width as f32 * 0.5;
        (pixel_x - center_x) * self.fov_degrees / self.image_width as f32
    }

    #[inline]
    pub fn in_field_of_view(&self, bearing_degrees: f32) -> bool {
        bearing_degrees.abs() <= self.fov_degrees * 0.5
    }
}
