//! Uniform Cartesian occupancy grid that rolls with the robot.

use glam::{IVec2, UVec2};

use super::fusion::{RayPlan, cap_features, fuse_ray};
use super::recenter::recenter_arena;
use super::{CellArena, GridCell, MapSnapshot, OccupancyMap, UpdateStats};
use crate::camera::StereoCamera;
use crate::config::{CameraConfig, GridConfig};
use crate::ground::Footline;
use crate::iterators::LineSampler;
use crate::projection::FeatureProjector;
use crate::types::{FeatureMatch, MapError, MapInfo, RobotPose};

/// Square grid of `dimension_cells`² cells of `cell_size_mm`, centered on `info.center`.
///
/// Cell boundaries sit on a world-fixed lattice of `cell_size_mm`: with
/// `anchor` the center rounded to the nearest lattice point, cell `(x, y)`
/// covers world `[anchor + (x - dim/2) * size, anchor + (x - dim/2 + 1) * size)`
/// on each axis. Recentering therefore moves cells by whole indices and never
/// merges them. Storage is row-major and allocated on the first update.
#[derive(Debug, Clone)]
pub struct GridMap {
    info: MapInfo,
    config: GridConfig,
    projector: FeatureProjector,
    arena: Option<CellArena>,
}

/// Copyable view of the index geometry, so closures can use it while the arena is borrowed.
#[derive(Debug, Clone, Copy)]
struct Layout {
    dim: i32,
    half: i32,
    cell_size: i32,
    anchor: IVec2,
}

impl Layout {
    fn new(info: &MapInfo) -> Self {
        Self::around(info, info.center)
    }

    /// Layout of `info`'s window once centered on `center`.
    fn around(info: &MapInfo, center: IVec2) -> Self {
        let cell_size = info.cell_size_mm;
        let snap = |v: i32| (v + cell_size / 2).div_euclid(cell_size) * cell_size;
        Self {
            dim: info.width as i32,
            half: info.width as i32 / 2,
            cell_size,
            anchor: IVec2::new(snap(center.x), snap(center.y)),
        }
    }

    /// Cell coordinates of a world position; may lie outside the window.
    #[inline]
    fn coords(&self, world: IVec2) -> IVec2 {
        let rel = world - self.anchor;
        IVec2::new(
            rel.x.div_euclid(self.cell_size) + self.half,
            rel.y.div_euclid(self.cell_size) + self.half,
        )
    }

    #[inline]
    fn coords_of_index(&self, idx: usize) -> IVec2 {
        let dim = self.dim as usize;
        IVec2::new((idx % dim) as i32, (idx / dim) as i32)
    }

    #[inline]
    fn index(&self, coords: IVec2) -> Option<usize> {
        // equivalent to (x >= 0 && x < dim) for signed x
        if (coords.x as u32) >= self.dim as u32 || (coords.y as u32) >= self.dim as u32 {
            return None;
        }
        Some((coords.y as usize) * (self.dim as usize) + (coords.x as usize))
    }

    #[inline]
    fn index_of_world(&self, world: IVec2) -> Option<usize> {
        self.index(self.coords(world))
    }
}

impl GridMap {
    pub fn new(config: GridConfig, camera: &CameraConfig) -> Result<Self, MapError> {
        config.validate()?;
        camera.validate()?;
        let info = MapInfo::square(config.dimension_cells, config.cell_size_mm);
        let projector = FeatureProjector::new(StereoCamera::new(camera), config.max_range_mm);
        Ok(Self {
            info,
            config,
            projector,
            arena: None,
        })
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    pub fn projector(&self) -> &FeatureProjector {
        &self.projector
    }

    /// Cell coordinates covering a world position, if inside the window.
    pub fn cell_coords(&self, world: IVec2) -> Option<UVec2> {
        let layout = Layout::new(&self.info);
        let coords = layout.coords(world);
        layout.index(coords).map(|_| coords.as_uvec2())
    }

    pub fn cell(&self, coords: UVec2) -> Option<&GridCell> {
        let idx = Layout::new(&self.info).index(coords.as_ivec2())?;
        self.arena.as_ref()?.get(idx)
    }

    /// World position (mm) of the lower corner of a cell.
    pub fn cell_origin(&self, coords: UVec2) -> IVec2 {
        let layout = Layout::new(&self.info);
        layout.anchor + (coords.as_ivec2() - IVec2::splat(layout.half)) * layout.cell_size
    }

    fn ensure_allocated(&mut self, robot: IVec2) {
        if self.arena.is_none() {
            log::debug!(
                "allocating {}x{} grid at {:?}",
                self.info.width,
                self.info.height,
                robot
            );
            self.arena = Some(CellArena::new(self.info.len()));
            self.info.center = robot;
        }
    }
}

impl OccupancyMap for GridMap {
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

        let layout = Layout::new(&self.info);
        let start = layout.coords(robot);
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

            let offset = projected.offset;
            let target = layout.coords(robot + offset);
            if layout.index(target).is_none() {
                stats.dropped_out_of_window += 1;
                continue;
            }

            let line = LineSampler::through_cells(robot, offset, target - start);
            let steps = line.steps();
            let mut plan = RayPlan::new(
                &projected,
                steps,
                layout.cell_size,
                self.config.min_range_mm,
            );
            if steps == 0 {
                // no direction to extend along
                plan = plan.without_tail();
            }

            stats.cells_touched += fuse_ray(arena.cells_mut(), plan, |step| {
                let world = line.sample(step);
                layout.index_of_world(world).map(|idx| (idx, world))
            });
            stats.features_used += 1;
        }

        log::trace!("cartesian update: {stats:?}");
        stats
    }

    fn recenter(&mut self, pose: RobotPose) {
        let new_center = pose.position();
        let Some(arena) = self.arena.as_mut() else {
            self.info.center = new_center;
            return;
        };
        let old = Layout::new(&self.info);
        let new = Layout::around(&self.info, new_center);
        let shift = (new.anchor - old.anchor) / old.cell_size;
        recenter_arena(arena, &mut self.info, new_center, |idx, _| {
            new.index(old.coords_of_index(idx) - shift)
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
        let idx = Layout::new(&self.info).index_of_world(world)?;
        self.arena.as_ref()?.get(idx)
    }

    fn half_extent_mm(&self) -> i32 {
        self.config.half_extent_mm()
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CellState;

    fn grid() -> GridMap {
        let config = GridConfig {
            cell_size_mm: 50,
            dimension_cells: 100,
            ..Default::default()
        };
        GridMap::new(config, &CameraConfig::default()).unwrap()
    }

    fn ahead(disparity: f32, pixel_y: f32) -> FeatureMatch {
        FeatureMatch::new(160.0, pixel_y, disparity)
    }

    #[test]
    fn storage_is_lazy() {
        let mut map = grid();
        assert!(!map.is_allocated());
        assert!(map.cell_at_world(IVec2::ZERO).is_none());

        let footline = Footline::uniform(320, 4, 150);
        map.update(&[], &footline, RobotPose::new(500, -200, 0.0));
        assert!(map.is_allocated());
        assert_eq!(map.center(), IVec2::new(500, -200));
        assert_eq!(map.cells().len(), 100 * 100);
    }

    #[test]
    fn coordinates_round_trip_through_cells() {
        let mut map = grid();
        map.update(&[], &Footline::default(), RobotPose::default());

        let coords = map.cell_coords(IVec2::new(120, -30)).unwrap();
        assert_eq!(coords, UVec2::new(52, 49));
        assert_eq!(map.cell_origin(coords), IVec2::new(100, -50));
        assert!(map.cell_coords(IVec2::new(2500, 0)).is_none());
        assert!(map.cell_coords(IVec2::new(-2500, 0)).is_some());
    }

    #[test]
    fn ground_feature_clears_ray() {
        let mut map = grid();
        let footline = Footline::uniform(320, 4, 150);
        // 20 px -> 1284 mm straight ahead
        let stats = map.update(&[ahead(20.0, 200.0)], &footline, RobotPose::default());

        assert_eq!(stats.features_used, 1);
        // 1284 / 50 puts the target 25 rows above the robot's cell
        assert_eq!(stats.cells_touched, 26);
        let target = map.cell_at_world(IVec2::new(0, 1284)).unwrap();
        assert_eq!(target.state(), CellState::Vacant);
        assert_eq!(target.vacancy, 1);
        assert_eq!(target.position, IVec2::new(0, 1284));
        assert!(map.occupied_positions().is_empty());
    }

    #[test]
    fn obstacle_feature_adds_tail() {
        let mut map = grid();
        let footline = Footline::uniform(320, 4, 150);
        // 20 px -> 1284 mm, tail 1284 / 150 = 8 cells
        let stats = map.update(&[ahead(20.0, 100.0)], &footline, RobotPose::default());

        assert_eq!(stats.features_used, 1);
        assert_eq!(map.occupied_positions().len(), 8);
        let robot_cell = map.cell_at_world(IVec2::ZERO).unwrap();
        assert_eq!(robot_cell.vacancy, 10);
    }

    #[test]
    fn out_of_window_features_are_dropped() {
        let config = GridConfig {
            cell_size_mm: 20,
            dimension_cells: 64,
            ..Default::default()
        };
        let mut map = GridMap::new(config, &CameraConfig::default()).unwrap();
        let footline = Footline::uniform(320, 4, 150);
        let stats = map.update(&[ahead(10.0, 100.0)], &footline, RobotPose::default());

        assert_eq!(stats.dropped_out_of_window, 1);
        assert_eq!(stats.cells_touched, 0);
        assert!(map.cells().iter().all(GridCell::is_empty));
    }

    #[test]
    fn reset_keeps_storage() {
        let mut map = grid();
        let footline = Footline::uniform(320, 4, 150);
        map.update(&[ahead(20.0, 100.0)], &footline, RobotPose::default());
        assert!(!map.occupied_positions().is_empty());
        map.reset();
        assert_eq!(map.cells().len(), 100 * 100);
        assert!(map.cells().iter().all(GridCell::is_empty));
    }

    #[test]
    fn update_recenters_after_drift() {
        let mut map = grid();
        let footline = Footline::uniform(320, 4, 150);
        map.update(&[], &footline, RobotPose::default());

        let stats = map.update(&[], &footline, RobotPose::new(50, 0, 0.0));
        assert!(!stats.recentered);
        assert_eq!(map.center(), IVec2::ZERO);

        let stats = map.update(&[], &footline, RobotPose::new(51, 0, 0.0));
        assert!(stats.recentered);
        assert_eq!(map.center(), IVec2::new(51, 0));
    }

    #[test]
    fn lattice_stays_fixed_in_world() {
        let mut map = grid();
        map.update(&[], &Footline::default(), RobotPose::new(74, -26, 0.0));
        // 74 and -26 round to the lattice points 50 and -50
        assert_eq!(map.cell_origin(UVec2::new(50, 50)), IVec2::new(50, -50));
        assert_eq!(map.cell_coords(IVec2::new(99, -1)), Some(UVec2::new(50, 50)));

        map.recenter(RobotPose::new(124, -26, 0.0));
        assert_eq!(map.center(), IVec2::new(124, -26));
        assert_eq!(map.cell_coords(IVec2::new(99, -1)), Some(UVec2::new(49, 50)));
    }
}
