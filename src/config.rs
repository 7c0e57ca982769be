//! Configuration for the camera model, footline estimation and both grid variants.
//!
//! Every struct deserializes from YAML with per-field defaults, so a config
//! file only needs to name the values it changes.

use serde::{Deserialize, Serialize};

use crate::types::MapError;

/// Stereo camera geometry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CameraConfig {
    #[serde(default = "default_image_width")]
    pub image_width: u32,
    #[serde(default = "default_image_height")]
    pub image_height: u32,
    /// Horizontal field of view (degrees).
    #[serde(default = "default_fov_degrees")]
    pub fov_degrees: f32,
    /// Distance between the two optical centres (mm).
    #[serde(default = "default_baseline_mm")]
    pub baseline_mm: i32,
    #[serde(default = "default_focal_length_mm")]
    pub focal_length_mm: f32,
    /// Physical width of the image sensor (mm).
    #[serde(default = "default_sensor_width_mm")]
    pub sensor_width_mm: f32,
}

fn default_image_width() -> u32 {
    320
}
fn default_image_height() -> u32 {
    240
}
fn default_fov_degrees() -> f32 {
    60.0
}
fn default_baseline_mm() -> i32 {
    107
}
fn default_focal_length_mm() -> f32 {
    3.6
}
fn default_sensor_width_mm() -> f32 {
    4.8
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            image_width: default_image_width(),
            image_height: default_image_height(),
            fov_degrees: default_fov_degrees(),
            baseline_mm: default_baseline_mm(),
            focal_length_mm: default_focal_length_mm(),
            sensor_width_mm: default_sensor_width_mm(),
        }
    }
}

/// Footline sampling and the flat-ground model used to turn it into range.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GroundConfig {
    /// Horizontal distance between footline samples (pixels).
    #[serde(default = "default_footline_stride")]
    pub footline_stride: u32,
    /// Row of the horizon as a percentage of image height.
    #[serde(default = "default_ground_row_percent")]
    pub ground_row_percent: i32,
    /// Horizon drop across the full image width, as a percentage of image height.
    #[serde(default)]
    pub ground_slope_percent: i32,
    /// Disparity at the bottom image row as a percentage of image width.
    #[serde(default = "default_max_disparity_percent")]
    pub max_disparity_percent: i32,
}

fn default_footline_stride() -> u32 {
    4
}
fn default_ground_row_percent() -> i32 {
    50
}
fn default_max_disparity_percent() -> i32 {
    20
}

impl Default for GroundConfig {
    fn default() -> Self {
        Self {
            footline_stride: default_footline_stride(),
            ground_row_percent: default_ground_row_percent(),
            ground_slope_percent: 0,
            max_disparity_percent: default_max_disparity_percent(),
        }
    }
}

/// Which spatial index backs the map.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MapKind {
    #[default]
    Cartesian,
    Polar,
}

/// Parameters common to both grid variants.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridConfig {
    #[serde(default)]
    pub kind: MapKind,
    /// Cartesian cell edge and recenter threshold (mm).
    #[serde(default = "default_cell_size_mm")]
    pub cell_size_mm: i32,
    /// Cartesian grid width in cells (the grid is square).
    #[serde(default = "default_dimension_cells")]
    pub dimension_cells: u32,
    /// Obstacles closer than this get no occupancy tail (mm).
    #[serde(default = "default_min_range_mm")]
    pub min_range_mm: i32,
    /// Features further than this are ignored (mm).
    #[serde(default = "default_max_range_mm")]
    pub max_range_mm: i32,
}

fn default_cell_size_mm() -> i32 {
    40
}
fn default_dimension_cells() -> u32 {
    128
}
fn default_min_range_mm() -> i32 {
    300
}
fn default_max_range_mm() -> i32 {
    6000
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            kind: MapKind::default(),
            cell_size_mm: default_cell_size_mm(),
            dimension_cells: default_dimension_cells(),
            min_range_mm: default_min_range_mm(),
            max_range_mm: default_max_range_mm(),
        }
    }
}

/// Hyperbolic-polar grid layout.
///
/// Radial bins `0..radial_bins` cover `[0, r_min_mm)` at constant pitch. The
/// next `hyperbolic_bins` are equal steps in depression angle of a virtual
/// camera mounted `camera_height_mm` above the ground, scaled so the first of
/// them is `reference_height_mm` deep.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PolarConfig {
    #[serde(default = "default_radial_bins")]
    pub radial_bins: u32,
    #[serde(default = "default_hyperbolic_bins")]
    pub hyperbolic_bins: u32,
    #[serde(default = "default_angular_bins")]
    pub angular_bins: u32,
    #[serde(default = "default_r_min_mm")]
    pub r_min_mm: i32,
    #[serde(default = "default_camera_height_mm")]
    pub camera_height_mm: i32,
    #[serde(default = "default_reference_height_mm")]
    pub reference_height_mm: i32,
}

fn default_radial_bins() -> u32 {
    40
}
fn default_hyperbolic_bins() -> u32 {
    60
}
fn default_angular_bins() -> u32 {
    180
}
fn default_r_min_mm() -> i32 {
    1000
}
fn default_camera_height_mm() -> i32 {
    1000
}
fn default_reference_height_mm() -> i32 {
    25
}

impl Default for PolarConfig {
    fn default() -> Self {
        Self {
            radial_bins: default_radial_bins(),
            hyperbolic_bins: default_hyperbolic_bins(),
            angular_bins: default_angular_bins(),
            r_min_mm: default_r_min_mm(),
            camera_height_mm: default_camera_height_mm(),
            reference_height_mm: default_reference_height_mm(),
        }
    }
}

/// Full mapper configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MapperConfig {
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub ground: GroundConfig,
    #[serde(default)]
    pub grid: GridConfig,
    #[serde(default)]
    pub polar: PolarConfig,
}

impl MapperConfig {
    /// Check every section, returning the first inconsistency found.
    pub fn validate(&self) -> Result<(), MapError> {
        self.camera.validate()?;
        self.ground.validate()?;
        self.grid.validate()?;
        if self.grid.kind == MapKind::Polar {
            self.polar.validate()?;
        }
        Ok(())
    }
}

fn invalid(msg: impl Into<String>) -> MapError {
    MapError::InvalidConfig(msg.into())
}

impl CameraConfig {
    pub fn validate(&self) -> Result<(), MapError> {
        if self.image_width == 0 || self.image_height == 0 {
            return Err(invalid("image dimensions must be non-zero"));
        }
        if !(self.fov_degrees > 0.0 && self.fov_degrees < 180.0) {
            return Err(invalid("fov_degrees must be in (0, 180)"));
        }
        if self.baseline_mm <= 0 {
            return Err(invalid("baseline_mm must be positive"));
        }
        if !(self.focal_length_mm > 0.0 && self.sensor_width_mm > 0.0) {
            return Err(invalid(
                "focal_length_mm and sensor_width_mm must be positive",
            ));
        }
        Ok(())
    }
}

impl GroundConfig {
    pub fn validate(&self) -> Result<(), MapError> {
        if self.footline_stride == 0 {
            return Err(invalid("footline_stride must be non-zero"));
        }
        if !(0..100).contains(&self.ground_row_percent) {
            return Err(invalid("ground_row_percent must be in [0, 100)"));
        }
        if self.max_disparity_percent <= 0 || self.max_disparity_percent > 100 {
            return Err(invalid("max_disparity_percent must be in (0, 100]"));
        }
        Ok(())
    }
}

impl GridConfig {
    pub fn validate(&self) -> Result<(), MapError> {
        if self.cell_size_mm <= 0 {
            return Err(invalid("cell_size_mm must be positive"));
        }
        if self.dimension_cells < 2 {
            return Err(invalid("dimension_cells must be at least 2"));
        }
        if self.min_range_mm < 0 || self.max_range_mm <= self.min_range_mm {
            return Err(invalid("expected 0 <= min_range_mm < max_range_mm"));
        }
        Ok(())
    }

    /// Half the Cartesian window edge (mm).
    pub fn half_extent_mm(&self) -> i32 {
        (self.dimension_cells as i32 / 2) * self.cell_size_mm
    }
}

impl PolarConfig {
    pub fn validate(&self) -> Result<(), MapError> {
        if self.radial_bins == 0 || self.hyperbolic_bins == 0 {
            return Err(invalid("radial_bins and hyperbolic_bins must be non-zero"));
        }
        if self.angular_bins == 0 || self.angular_bins > 3600 {
            return Err(invalid("angular_bins must be in [1, 3600]"));
        }
        if self.r_min_mm <= 0 || self.camera_height_mm <= 0 || self.reference_height_mm <= 0 {
            return Err(invalid(
                "r_min_mm, camera_height_mm and reference_height_mm must be positive",
            ));
        }
        if self.hyperbolic_span_radians() >= self.horizon_angle_radians() {
            return Err(invalid("hyperbolic zone reaches past the horizon"));
        }
        Ok(())
    }

    /// Depression angle of the virtual camera's ray to `r_min_mm`.
    pub fn horizon_angle_radians(&self) -> f64 {
        (self.camera_height_mm as f64).atan2(self.r_min_mm as f64)
    }

    /// Angular step of one hyperbolic bin, sized so the first bin is `reference_height_mm` deep.
    pub fn bin_angle_radians(&self) -> f64 {
        let h = self.camera_height_mm as f64;
        let r = self.r_min_mm as f64;
        self.reference_height_mm as f64 * h / (r * r + h * h)
    }

    fn hyperbolic_span_radians(&self) -> f64 {
        self.hyperbolic_bins as f64 * self.bin_angle_radians()
    }

    #[inline]
    pub fn total_radial_bins(&self) -> u32 {
        self.radial_bins + self.hyperbolic_bins
    }
}
