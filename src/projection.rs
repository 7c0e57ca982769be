//! Projection of a stereo match into a robot-relative metric offset.

use glam::IVec2;

use crate::camera::StereoCamera;
use crate::ground::Footline;
use crate::trig::{tables, wrap_degrees};
use crate::types::{FeatureMatch, RobotPose};

/// A feature located relative to the robot, in world-aligned axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectedFeature {
    /// Below the footline, i.e. a point on the floor rather than an obstacle.
    pub on_ground: bool,
    pub range_mm: i32,
    /// Compass heading of the ray in whole degrees, `[0, 360)`.
    pub heading_degrees: i32,
    /// Offset from the robot to the feature (mm).
    pub offset: IVec2,
}

/// Why a feature did not produce a projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Match probability is not positive.
    Invalid,
    /// Bearing outside the field of view, or disparity/range outside the usable domain.
    OutOfRange,
}

#[derive(Debug, Clone)]
pub struct FeatureProjector {
    camera: StereoCamera,
    max_range_mm: i32,
}

impl FeatureProjector {
    pub fn new(camera: StereoCamera, max_range_mm: i32) -> Self {
        Self {
            camera,
            max_range_mm,
        }
    }

    pub fn camera(&self) -> &StereoCamera {
        &self.camera
    }

    pub fn max_range_mm(&self) -> i32 {
        self.max_range_mm
    }

    pub fn project(
        &self,
        feature: &FeatureMatch,
        footline: &Footline,
        pose: &RobotPose,
    ) -> Result<ProjectedFeature, Rejection> {
        if !feature.is_valid() {
            return Err(Rejection::Invalid);
        }

        let on_ground = footline.is_on_ground(feature.pixel_x, feature.pixel_y);

        let range_mm = self
            .camera
            .range_from_disparity(feature.disparity)
            .ok_or(Rejection::OutOfRange)?;
        if range_mm > self.max_range_mm {
            return Err(Rejection::OutOfRange);
        }

        let bearing = self.camera.bearing_degrees(feature.pixel_x);
        if !self.camera.in_field_of_view(bearing) {
            return Err(Rejection::OutOfRange);
        }

        let heading_degrees = wrap_degrees((pose.orientation_degrees + bearing).round() as i32);
        let offset = tables().rotate(range_mm, heading_degrees);

        Ok(ProjectedFeature {
            on_ground,
            range_mm,
            heading_degrees,
            offset,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CameraConfig;

    fn projector() -> FeatureProjector {
        FeatureProjector::new(StereoCamera::new(&CameraConfig::default()), 6000)
    }

    #[test]
    fn center_feature_projects_straight_ahead() {
        let footline = Footline::uniform(320, 4, 150);
        let feature = FeatureMatch::new(160.0, 100.0, 10.0);
        let projected = projector()
            .project(&feature, &footline, &RobotPose::default())
            .unwrap();

        assert!(!projected.on_ground);
        assert_eq!(projected.range_mm, 2568);
        assert_eq!(projected.heading_degrees, 0);
        assert_eq!(projected.offset, IVec2::new(0, 2568));
    }

    #[test]
    fn heading_combines_orientation_and_bearing() {
        let footline = Footline::uniform(320, 4, 150);
        // right edge of a 60 degree view is +30 degrees
        let feature = FeatureMatch::new(320.0, 200.0, 10.0);
        let pose = RobotPose::new(0, 0, 345.0);
        let projected = projector().project(&feature, &footline, &pose).unwrap();

        assert!(projected.on_ground);
        assert_eq!(projected.heading_degrees, 15);
        assert!(projected.offset.x > 0 && projected.offset.y > 0);
    }

    #[test]
    fn rejects_invalid_and_out_of_range() {
        let footline = Footline::uniform(320, 4, 150);
        let pose = RobotPose::default();
        let p = projector();

        let mut invalid = FeatureMatch::new(160.0, 100.0, 10.0);
        invalid.probability = 0.0;
        assert_eq!(p.project(&invalid, &footline, &pose), Err(Rejection::Invalid));

        let zero_disparity = FeatureMatch::new(160.0, 100.0, 0.0);
        assert_eq!(
            p.project(&zero_disparity, &footline, &pose),
            Err(Rejection::OutOfRange)
        );

        // 2 px -> 3 mm100 -> 12840 mm, beyond max range
        let too_far = FeatureMatch::new(160.0, 100.0, 2.0);
        assert_eq!(p.project(&too_far, &footline, &pose), Err(Rejection::OutOfRange));

        let outside_view = FeatureMatch::new(400.0, 100.0, 10.0);
        assert_eq!(
            p.project(&outside_view, &footline, &pose),
            Err(Rejection::OutOfRange)
        );
    }
}
