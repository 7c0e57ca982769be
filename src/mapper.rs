//! Per-frame pipeline: footline estimation followed by a map update.

use image::RgbImage;

use crate::camera::StereoCamera;
use crate::config::{MapKind, MapperConfig};
use crate::grid::{GridMap, HPolarGridMap, OccupancyMap, UpdateStats};
use crate::ground::{Footline, GroundPlaneEstimator};
use crate::types::{FeatureMatch, MapError, RobotPose};

/// One frame of matcher output.
#[derive(Debug, Clone, Copy)]
pub struct StereoFrame<'a> {
    pub image_width: u32,
    pub image_height: u32,
    pub features: &'a [FeatureMatch],
    /// Raw footline row per sampled column, 0 where the matcher found none.
    pub footline_samples: &'a [u32],
    pub pose: RobotPose,
}

/// Build the map variant selected by `config.grid.kind`.
pub fn build_map(config: &MapperConfig) -> Result<Box<dyn OccupancyMap>, MapError> {
    config.validate()?;
    Ok(match config.grid.kind {
        MapKind::Cartesian => Box::new(GridMap::new(config.grid.clone(), &config.camera)?),
        MapKind::Polar => Box::new(HPolarGridMap::new(
            config.grid.clone(),
            &config.polar,
            &config.camera,
        )?),
    })
}

pub struct StereoMapper {
    config: MapperConfig,
    camera: StereoCamera,
    estimator: GroundPlaneEstimator,
    map: Box<dyn OccupancyMap>,
    frames: u64,
}

impl StereoMapper {
    pub fn new(config: MapperConfig) -> Result<Self, MapError> {
        let map = build_map(&config)?;
        log::info!(
            "stereo mapper ready: {:?} map, {}x{} cells, {} mm",
            config.grid.kind,
            map.info().width,
            map.info().height,
            map.info().cell_size_mm
        );
        Ok(Self {
            camera: StereoCamera::new(&config.camera),
            estimator: GroundPlaneEstimator::new(config.ground.clone()),
            map,
            config,
            frames: 0,
        })
    }

    /// Estimate the footline for `frame` and fuse its features into the map.
    pub fn process_frame(&mut self, frame: &StereoFrame<'_>) -> UpdateStats {
        if frame.image_width != self.camera.image_width
            || frame.image_height != self.camera.image_height
        {
            self.resize_camera(frame.image_width, frame.image_height);
        }

        let footline = self.estimator.update(&self.camera, frame.footline_samples);
        let stats = self.map.update(frame.features, footline, frame.pose);
        self.frames += 1;

        if stats.truncated > 0 || stats.dropped_out_of_window > 0 {
            log::trace!(
                "frame {}: {} truncated, {} outside the map",
                self.frames,
                stats.truncated,
                stats.dropped_out_of_window
            );
        }
        stats
    }

    fn resize_camera(&mut self, width: u32, height: u32) {
        log::warn!(
            "frame is {width}x{height}, camera was configured for {}x{}",
            self.camera.image_width,
            self.camera.image_height
        );
        self.config.camera.image_width = width;
        self.config.camera.image_height = height;
        self.camera = StereoCamera::new(&self.config.camera);
        self.map.set_camera(self.camera.clone());
    }

    pub fn config(&self) -> &MapperConfig {
        &self.config
    }

    pub fn camera(&self) -> &StereoCamera {
        &self.camera
    }

    pub fn map(&self) -> &dyn OccupancyMap {
        self.map.as_ref()
    }

    pub fn map_mut(&mut self) -> &mut dyn OccupancyMap {
        self.map.as_mut()
    }

    pub fn footline(&self) -> &Footline {
        self.estimator.footline()
    }

    pub fn forward_motion_mm(&self) -> i32 {
        self.estimator.forward_motion_mm()
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames
    }

    pub fn show(&self, width: u32, height: u32) -> RgbImage {
        self.map.show(width, height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame<'a>(features: &'a [FeatureMatch], samples: &'a [u32]) -> StereoFrame<'a> {
        StereoFrame {
            image_width: 320,
            image_height: 240,
            features,
            footline_samples: samples,
            pose: RobotPose::default(),
        }
    }

    #[test]
    fn builds_selected_variant() {
        let mut config = MapperConfig::default();
        assert_eq!(build_map(&config).unwrap().info().width, 128);

        config.grid.kind = MapKind::Polar;
        let polar = build_map(&config).unwrap();
        assert_eq!(polar.info().width, 180);
        assert_eq!(polar.info().height, 100);

        config.grid.cell_size_mm = 0;
        assert!(build_map(&config).is_err());
    }

    #[test]
    fn frame_updates_map_and_footline() {
        let mut mapper = StereoMapper::new(MapperConfig::default()).unwrap();
        let samples = vec![150; 80];
        let features = [FeatureMatch::new(160.0, 100.0, 20.0)];
        let stats = mapper.process_frame(&frame(&features, &samples));

        assert_eq!(stats.features_used, 1);
        assert_eq!(mapper.frames_processed(), 1);
        assert_eq!(mapper.footline().len(), 80);
        assert!(!mapper.map().occupied_positions().is_empty());
    }

    #[test]
    fn image_size_change_rebuilds_camera() {
        let mut mapper = StereoMapper::new(MapperConfig::default()).unwrap();
        let samples = vec![300; 160];
        let mut f = frame(&[], &samples);
        f.image_width = 640;
        f.image_height = 480;
        mapper.process_frame(&f);

        assert_eq!(mapper.camera().image_width, 640);
        assert_eq!(mapper.config().camera.image_height, 480);
        assert_eq!(mapper.footline().len(), 160);
    }
}
