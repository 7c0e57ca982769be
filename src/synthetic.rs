//! Synthetic stereo frames rendered from a 2D world of obstacle points.
//!
//! Stands in for the upstream matcher in demos, benches and integration
//! tests: every visible obstacle point yields one raised feature, one floor
//! feature halfway to it, and lowers the footline in its image column.

use glam::IVec2;

use crate::camera::StereoCamera;
use crate::config::{CameraConfig, GroundConfig};
use crate::mapper::StereoFrame;
use crate::types::{FOOTLINE_UNKNOWN, FeatureMatch, RobotPose};

/// Features and footline samples one camera would report at a pose.
#[derive(Debug, Clone, Default)]
pub struct SyntheticFrame {
    pub features: Vec<FeatureMatch>,
    pub footline_samples: Vec<u32>,
    pub pose: RobotPose,
}

impl SyntheticFrame {
    pub fn as_stereo_frame(&self, camera: &CameraConfig) -> StereoFrame<'_> {
        StereoFrame {
            image_width: camera.image_width,
            image_height: camera.image_height,
            features: &self.features,
            footline_samples: &self.footline_samples,
            pose: self.pose,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SyntheticScene {
    pub camera: CameraConfig,
    pub ground: GroundConfig,
    /// Obstacle surface points in world coordinates (mm).
    pub obstacles: Vec<IVec2>,
}

impl SyntheticScene {
    pub fn new(camera: CameraConfig, ground: GroundConfig, obstacles: Vec<IVec2>) -> Self {
        Self {
            camera,
            ground,
            obstacles,
        }
    }

    /// Two parallel walls at `x = ±half_width_mm`, from `y = 0` to `length_mm`,
    /// sampled every `spacing_mm`, closed by an end wall.
    pub fn corridor(
        camera: CameraConfig,
        ground: GroundConfig,
        length_mm: i32,
        half_width_mm: i32,
        spacing_mm: i32,
    ) -> Self {
        let spacing = spacing_mm.max(1) as usize;
        let mut obstacles = Vec::new();
        for y in (0..=length_mm).step_by(spacing) {
            obstacles.push(IVec2::new(-half_width_mm, y));
            obstacles.push(IVec2::new(half_width_mm, y));
        }
        for x in (-half_width_mm..=half_width_mm).step_by(spacing) {
            obstacles.push(IVec2::new(x, length_mm));
        }
        Self::new(camera, ground, obstacles)
    }

    /// Render what the camera sees from `pose`.
    pub fn frame(&self, pose: RobotPose) -> SyntheticFrame {
        let camera = StereoCamera::new(&self.camera);
        let stride = self.ground.footline_stride.max(1);
        let columns = self.camera.image_width.div_ceil(stride) as usize;
        let mut nearest = vec![i32::MAX; columns];
        let mut features = Vec::new();

        for &obstacle in &self.obstacles {
            let Some((pixel_x, range_mm)) = self.view_of(&camera, pose, obstacle) else {
                continue;
            };
            let disparity = camera.disparity_for_range(range_mm);
            if disparity <= 0.0 {
                continue;
            }

            let column = (pixel_x as u32 / stride) as usize;
            if let Some(best) = nearest.get_mut(column) {
                *best = (*best).min(range_mm);
            }

            let horizon = self.horizon_row(pixel_x as i64);
            features.push(FeatureMatch::new(
                pixel_x,
                horizon.saturating_sub(self.camera.image_height / 10) as f32,
                disparity,
            ));

            let floor_range = range_mm / 2;
            let floor_row = self.ground_row_for_range(&camera, pixel_x as i64, floor_range);
            features.push(FeatureMatch::new(
                pixel_x,
                floor_row as f32 + 1.0,
                camera.disparity_for_range(floor_range),
            ));
        }

        let footline_samples = nearest
            .iter()
            .enumerate()
            .map(|(col, &range)| {
                if range == i32::MAX {
                    FOOTLINE_UNKNOWN
                } else {
                    self.ground_row_for_range(&camera, (col as u32 * stride) as i64, range)
                }
            })
            .collect();

        SyntheticFrame {
            features,
            footline_samples,
            pose,
        }
    }

    /// Image column and range of a world point, if it is in the field of view.
    fn view_of(&self, camera: &StereoCamera, pose: RobotPose, point: IVec2) -> Option<(f32, i32)> {
        let offset = (point - pose.position()).as_vec2();
        let range_mm = offset.length();
        if range_mm < 1.0 {
            return None;
        }
        let heading = offset.x.atan2(offset.y).to_degrees();
        let bearing = (heading - pose.orientation_degrees + 180.0).rem_euclid(360.0) - 180.0;
        if !camera.in_field_of_view(bearing) {
            return None;
        }
        let width = self.camera.image_width as f32;
        let pixel_x = (width * 0.5 + bearing * width / self.camera.fov_degrees).clamp(0.0, width - 1.0);
        Some((pixel_x, range_mm.round() as i32))
    }

    /// Horizon row at image column `x` under the flat-ground model.
    fn horizon_row(&self, x: i64) -> u32 {
        let width = self.camera.image_width as i64;
        let height = self.camera.image_height as i64;
        let horizon = height * self.ground.ground_row_percent as i64 / 100
            + (x - width / 2) * height * self.ground.ground_slope_percent as i64 / (100 * width);
        horizon.clamp(0, height - 1) as u32
    }

    /// Image row where the floor at `range_mm` appears in column `x`.
    fn ground_row_for_range(&self, camera: &StereoCamera, x: i64, range_mm: i32) -> u32 {
        let height = self.camera.image_height;
        let horizon = self.horizon_row(x);
        let depth = (height - horizon) as f32;
        let max_disparity =
            self.camera.image_width as f32 * self.ground.max_disparity_percent as f32 / 100.0;
        let below = camera.disparity_for_range(range_mm) * depth / max_disparity;
        (horizon as f32 + below.ceil()).clamp(1.0, (height - 1) as f32) as u32
    }
}
