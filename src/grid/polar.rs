//! Hyperbolic-polar occupancy grid.
//!
//! Cells are indexed by compass angle and a non-uniform radial bin. Near the
//! robot the radial pitch is constant; past `r_min_mm` each bin is one equal
//! step in depression angle of a virtual camera looking down at the floor, so
//! the pitch grows roughly with the square of the range. The same memory as a
//! small Cartesian grid then reaches several times further.
//!
//! A feature's ray stays in the angular bin of the feature as seen from the
//! map center and steps outward one radial bin at a time. Obstacles get an
//! occupied footprint a third of their range deep, however many bins that
//! spans.

use std::f64::consts::TAU;

use glam::IVec2;

use super::fusion::{RayPlan, cap_features, fuse_ray, tail_reach_mm};
use super::recenter::recenter_arena;
use super::{CellArena, GridCell, MapSnapshot, OccupancyMap, UpdateStats};
use crate::camera::StereoCamera;
use crate::config::{CameraConfig, GridConfig, PolarConfig};
use crate::ground::Footline;
use crate::projection::FeatureProjector;
use crate::types::{FeatureMatch, MapError, MapInfo, RobotPose};

/// Polar coordinates of a point relative to the map center.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolarIndex {
    pub range_mm: i32,
    pub angle_bin: u32,
    /// `None` beyond the outermost hyperbolic bin.
    pub radial_bin: Option<u32>,
}

/// Bin geometry derived from a [`PolarConfig`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolarLayout {
    radial_bins: u32,
    hyperbolic_bins: u32,
    angular_bins: u32,
    r_min: f64,
    height: f64,
    horizon: f64,
    bin_angle: f64,
}

impl PolarLayout {
    pub fn new(config: &PolarConfig) -> Result<Self, MapError> {
        config.validate()?;
        Ok(Self {
            radial_bins: config.radial_bins,
            hyperbolic_bins: config.hyperbolic_bins,
            angular_bins: config.angular_bins,
            r_min: config.r_min_mm as f64,
            height: config.camera_height_mm as f64,
            horizon: config.horizon_angle_radians(),
            bin_angle: config.bin_angle_radians(),
        })
    }

    #[inline]
    pub fn angular_bins(&self) -> u32 {
        self.angular_bins
    }

    #[inline]
    pub fn total_radial_bins(&self) -> u32 {
        self.radial_bins + self.hyperbolic_bins
    }

    pub fn len(&self) -> usize {
        self.angular_bins as usize * self.total_radial_bins() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Radial bin holding `range_mm`, or `None` past the outer edge.
    pub fn radial_bin(&self, range_mm: i32) -> Option<u32> {
        let range = range_mm.max(0) as f64;
        if range < self.r_min {
            let bin = (range_mm.max(0) as i64 * self.radial_bins as i64) / self.r_min as i64;
            return Some((bin as u32).min(self.radial_bins - 1));
        }
        let depression = self.height.atan2(range);
        let k = ((self.horizon - depression) / self.bin_angle).floor().max(0.0) as u32;
        (k < self.hyperbolic_bins).then_some(self.radial_bins + k)
    }

    /// Angular bin of a compass heading, `[0, 360)` degrees mapped onto `angular_bins`.
    pub fn angle_bin(&self, x_mm: i32, y_mm: i32) -> u32 {
        let heading = (x_mm as f64).atan2(y_mm as f64).rem_euclid(TAU);
        let bin = (heading / TAU * self.angular_bins as f64) as u32;
        bin.min(self.angular_bins - 1)
    }

    /// Polar coordinates of a point relative to the map center; `z_mm` only contributes to range.
    pub fn xyz_to_polar(&self, x_mm: i32, y_mm: i32, z_mm: i32) -> PolarIndex {
        let (x, y, z) = (x_mm as i64, y_mm as i64, z_mm as i64);
        let squared = (x * x + y * y + z * z) as u64;
        let range_mm = squared.isqrt().min(i32::MAX as u64) as i32;
        PolarIndex {
            range_mm,
            angle_bin: self.angle_bin(x_mm, y_mm),
            radial_bin: self.radial_bin(range_mm),
        }
    }

    /// Storage index, angle-major.
    #[inline]
    pub fn index(&self, polar: &PolarIndex) -> Option<usize> {
        let radial = polar.radial_bin?;
        Some(polar.angle_bin as usize * self.total_radial_bins() as usize + radial as usize)
    }

    /// Storage index of a world offset from the map center, if inside the grid.
    #[inline]
    pub fn index_of_offset(&self, offset: IVec2) -> Option<usize> {
        self.index(&self.xyz_to_polar(offset.x, offset.y, 0))
    }

    /// Inner edge of a radial bin (mm). Valid for `0..=total_radial_bins()`.
    pub fn bin_start_mm(&self, bin: u32) -> f64 {
        self.radius_at(bin as f64)
    }

    /// Radius at the middle of a radial bin (mm).
    pub fn bin_mid_mm(&self, bin: u32) -> f64 {
        self.radius_at(bin as f64 + 0.5)
    }

    /// Radial depth of a bin (mm).
    pub fn pitch_mm(&self, bin: u32) -> f64 {
        self.bin_start_mm(bin + 1) - self.bin_start_mm(bin)
    }

    /// Outer edge of the last bin (mm).
    pub fn outer_radius_mm(&self) -> f64 {
        self.bin_start_mm(self.total_radial_bins())
    }

    /// Bins after `bin` whose middle lies within `radius_mm` of the center.
    pub fn bins_until(&self, bin: u32, radius_mm: f64) -> u32 {
        (bin + 1..self.total_radial_bins())
            .take_while(|&b| self.bin_mid_mm(b) <= radius_mm)
            .count() as u32
    }

    /// Radius at a fractional bin position.
    fn radius_at(&self, bin: f64) -> f64 {
        let inner = self.radial_bins as f64;
        if bin <= inner {
            return bin * self.r_min / inner;
        }
        let depression = self.horizon - (bin - inner) * self.bin_angle;
        self.height / depression.tan()
    }
}

/// Occupancy grid over `angular_bins` x (`radial_bins` + `hyperbolic_bins`) polar cells.
///
/// `info.width` is the angular dimension and `info.height` the radial one.
/// Cells keep their world position so they can be re-binned when the center moves.
#[derive(Debug, Clone)]
pub struct HPolarGridMap {
    info: MapInfo,
    config: GridConfig,
    layout: PolarLayout,
    projector: FeatureProjector,
    arena: Option<CellArena>,
}

impl HPolarGridMap {
    pub fn new(
        config: GridConfig,
        polar: &PolarConfig,
        camera: &CameraConfig,
    ) -> Result<Self, MapError> {
        config.validate()?;
        camera.validate()?;
        let layout = PolarLayout::new(polar)?;
        let info = MapInfo {
            width: layout.angular_bins(),
            height: layout.total_radial_bins(),
            cell_size_mm: config.cell_size_mm,
            center: IVec2::ZERO,
        };
        let projector = FeatureProjector::new(StereoCamera::new(camera), config.max_range_mm);
        Ok(Self {
            info,
            config,
            layout,
            projector,
            arena: None,
        })
    }

    pub fn layout(&self) -> &PolarLayout {
        &self.layout
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    /// Polar coordinates of a world position relative to the current center.
    pub fn polar_of(&self, world: IVec2) -> PolarIndex {
        let rel = world - self.info.center;
        self.layout.xyz_to_polar(rel.x, rel.y, 0)
    }

    fn ensure_allocated(&mut self, robot: IVec2) {
        if self.arena.is_none() {
            log::debug!(
                "allocating {}x{} polar grid at {:?}",
                self.info.width,
                self.info.height,
                robot
            );
            self.arena = Some(CellArena::new(self.layout.len()));
            self.info.center = robot;
        }
    }
}

/// `offset` scaled to length `radius`, rounded to whole millimetres.
#[inline]
fn along(offset: IVec2, range_mm: i32, radius: f64) -> IVec2 {
    let scale = radius / range_mm.max(1) as f64;
    IVec2::new(
        (offset.x as f64 * scale).round() as i32,
        (offset.y as f64 * scale).round() as i32,
    )
}

impl OccupancyMap for HPolarGridMap {
    fn info(&self) -> &MapInfo {
        &self.info
    }

    fn update(
        &mut self,
        features: &[FeatureMatch],
        footline: &Footline,
        pose: RobotPose,
    ) -> UpdateStats {
        let mut stats = UpdateStats::default();
        let robot = pose.position();
        self.ensure_allocated(robot);
        if self.info.needs_recenter(robot) {
            self.recenter(pose);
            stats.recentered = true;
        }

        let (features, truncated) = cap_features(features);
        stats.truncated = truncated;

        let layout = self.layout;
        let center = self.info.center;
        let Some(arena) = self.arena.as_mut() else {
            return stats;
        };

        for feature in features {
            let projected = match self.projector.project(feature, footline, &pose) {
                Ok(projected) => projected,
                Err(rejection) => {
                    stats.record_rejection(rejection);
                    continue;
                }
            };

            let target = robot + projected.offset;
            let rel = target - center;
            let polar = layout.xyz_to_polar(rel.x, rel.y, 0);
            let Some(target_bin) = polar.radial_bin else {
                stats.dropped_out_of_window += 1;
                continue;
            };

            let reach = tail_reach_mm(&projected, self.config.min_range_mm);
            let plan = RayPlan {
                target_step: target_bin,
                tail_steps: layout.bins_until(target_bin, (polar.range_mm + reach) as f64),
            };
            let row = polar.angle_bin as usize * layout.total_radial_bins() as usize;

            // Step n samples the middle of radial bin n along the center-to-feature bearing.
            stats.cells_touched += fuse_ray(arena.cells_mut(), plan, |step| {
                if step >= layout.total_radial_bins() {
                    return None;
                }
                let world = if step == target_bin {
                    target
                } else {
                    center + along(rel, polar.range_mm, layout.bin_mid_mm(step))
                };
                Some((row + step as usize, world))
            });
            stats.features_used += 1;
        }

        log::trace!("polar update: {stats:?}");
        stats
    }

    fn recenter(&mut self, pose: RobotPose) {
        let new_center = pose.position();
        let Some(arena) = self.arena.as_mut() else {
            self.info.center = new_center;
            return;
        };
        let layout = self.layout;
        recenter_arena(arena, &mut self.info, new_center, |_, cell| {
            layout.index_of_offset(cell.position - new_center)
        });
    }

    fn reset(&mut self) {
        if let Some(arena) = self.arena.as_mut() {
            arena.reset();
        }
    }

    fn cells(&self) -> &[GridCell] {
        self.arena.as_ref().map(CellArena::cells).unwrap_or(&[])
    }

    fn cell_at_world(&self, world: IVec2) -> Option<&GridCell> {
        let idx = self.layout.index(&self.polar_of(world))?;
        self.arena.as_ref()?.get(idx)
    }

    /// Nothing is written past the maximum sensed range, so the outer bins
    /// only matter once content drifts there through recentering.
    fn half_extent_mm(&self) -> i32 {
        (self.layout.outer_radius_mm() as i32).min(self.config.max_range_mm)
    }

    fn set_camera(&mut self, camera: StereoCamera) {
        self.projector = FeatureProjector::new(camera, self.config.max_range_mm);
    }

    fn restore(&mut self, snapshot: &MapSnapshot) -> Result<(), MapError> {
        snapshot.check_layout(&self.info)?;
        let arena = self
            .arena
            .get_or_insert_with(|| CellArena::new(snapshot.len()));
        for (dst, cell) in arena.cells_mut().iter_mut().zip(snapshot.cells()) {
            *dst = cell;
        }
        self.info.center = snapshot.info.center;
        Ok(())
    }
}
