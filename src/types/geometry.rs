//! Geometric and sensor types shared by the projector and both grid variants.

use glam::IVec2;
use serde::{Deserialize, Serialize};

/// Robot pose in world coordinates (millimetres, compass degrees).
///
/// Heading 0 points along +Y and increases clockwise towards +X.
#[derive(Default, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RobotPose {
    pub x_mm: i32,
    pub y_mm: i32,
    pub orientation_degrees: f32,
}

impl RobotPose {
    pub fn new(x_mm: i32, y_mm: i32, orientation_degrees: f32) -> Self {
        Self {
            x_mm,
            y_mm,
            orientation_degrees,
        }
    }

    #[inline]
    pub fn position(&self) -> IVec2 {
        IVec2::new(self.x_mm, self.y_mm)
    }
}

/// One stereo correspondence. A match is valid when `probability > 0`.
#[derive(Default, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureMatch {
    pub probability: f32,
    pub pixel_x: f32,
    pub pixel_y: f32,
    /// Horizontal offset between the left and right image (pixels).
    pub disparity: f32,
}

impl FeatureMatch {
    pub fn new(pixel_x: f32, pixel_y: f32, disparity: f32) -> Self {
        Self {
            probability: 1.0,
            pixel_x,
            pixel_y,
            disparity,
        }
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.probability > 0.0
    }
}

/// Occupancy belief of a single cell, derived from its two counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellState {
    Unknown,
    Vacant,
    Occupied,
}
