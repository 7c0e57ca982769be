use glam::IVec2;
use image::RgbImage;
use serde::{Deserialize, Serialize};

use super::GridCell;
use crate::camera::StereoCamera;
use crate::ground::Footline;
use crate::projection::Rejection;
use crate::types::{CellState, FeatureMatch, MapError, MapInfo, RobotPose};

/// What one [`OccupancyMap::update`] did with a frame.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct UpdateStats {
    pub features_used: usize,
    /// Matches with non-positive probability.
    pub dropped_invalid: usize,
    /// Matches outside the field of view or usable disparity/range.
    pub dropped_out_of_range: usize,
    /// Matches whose target cell lies outside the map window.
    pub dropped_out_of_window: usize,
    /// Matches beyond the per-frame cap.
    pub truncated: usize,
    pub recentered: bool,
    pub cells_touched: usize,
}

impl UpdateStats {
    pub fn record_rejection(&mut self, rejection: Rejection) {
        match rejection {
            Rejection::Invalid => self.dropped_invalid += 1,
            Rejection::OutOfRange => self.dropped_out_of_range += 1,
        }
    }

    /// Matches looked at this frame (everything but the truncated ones).
    pub fn features_seen(&self) -> usize {
        self.features_used
            + self.dropped_invalid
            + self.dropped_out_of_range
            + self.dropped_out_of_window
    }
}

/// Shared interface of the Cartesian and hyperbolic-polar maps.
///
/// Not internally synchronised: callers serialise `update`, `recenter` and
/// rendering on a given instance.
pub trait OccupancyMap: Send + Sync {
    fn info(&self) -> &MapInfo;

    /// Fuse one frame of matches taken at `pose`, recentering first if the
    /// robot has drifted more than one cell from the map center.
    fn update(
        &mut self,
        features: &[FeatureMatch],
        footline: &Footline,
        pose: RobotPose,
    ) -> UpdateStats;

    /// Move the map center to the robot, keeping the content that still fits.
    fn recenter(&mut self, pose: RobotPose);

    /// Clear every cell. Storage is kept.
    fn reset(&mut self);

    /// Backing storage, empty until the first update.
    fn cells(&self) -> &[GridCell];

    /// Cell covering a world position (mm), if inside the window.
    fn cell_at_world(&self, world: IVec2) -> Option<&GridCell>;

    /// Half edge of the square world region the map can represent (mm).
    fn half_extent_mm(&self) -> i32;

    /// Replace the camera model, e.g. after the image size changed.
    fn set_camera(&mut self, camera: StereoCamera);

    /// Load cells and center from a snapshot of a map with the same layout.
    fn restore(&mut self, snapshot: &MapSnapshot) -> Result<(), MapError>;

    fn center(&self) -> IVec2 {
        self.info().center
    }

    fn is_allocated(&self) -> bool {
        !self.cells().is_empty()
    }

    /// Occupied cells with at least `min_occupancy` occupancy evidence.
    fn occupied_cells(&self, min_occupancy: u8) -> Box<dyn Iterator<Item = &GridCell> + '_> {
        Box::new(
            self.cells()
                .iter()
                .filter(move |c| c.state() == CellState::Occupied && c.occupancy >= min_occupancy),
        )
    }

    /// World positions of cells currently believed occupied.
    fn occupied_positions(&self) -> Vec<IVec2> {
        self.occupied_cells(0).map(|c| c.position).collect()
    }

    /// Render the map into an RGB image; see [`crate::visualization::render`].
    fn show(&self, width: u32, height: u32) -> RgbImage {
        crate::visualization::render(self, width, height)
    }

    fn snapshot(&self) -> MapSnapshot {
        MapSnapshot::capture(self.info(), self.cells())
    }
}

/// Flat, serialisable copy of a map's state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapSnapshot {
    pub info: MapInfo,
    pub x_mm: Vec<i32>,
    pub y_mm: Vec<i32>,
    pub occupancy: Vec<u8>,
    pub vacancy: Vec<u8>,
}

impl MapSnapshot {
    pub fn capture(info: &MapInfo, cells: &[GridCell]) -> Self {
        Self {
            info: *info,
            x_mm: cells.iter().map(|c| c.position.x).collect(),
            y_mm: cells.iter().map(|c| c.position.y).collect(),
            occupancy: cells.iter().map(|c| c.occupancy).collect(),
            vacancy: cells.iter().map(|c| c.vacancy).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.x_mm.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x_mm.is_empty()
    }

    /// Check the snapshot was taken from a map laid out like `info`.
    pub fn check_layout(&self, info: &MapInfo) -> Result<(), MapError> {
        if self.info.width != info.width
            || self.info.height != info.height
            || self.info.cell_size_mm != info.cell_size_mm
        {
            return Err(MapError::InvalidConfig(format!(
                "snapshot is {}x{} @ {} mm, map is {}x{} @ {} mm",
                self.info.width,
                self.info.height,
                self.info.cell_size_mm,
                info.width,
                info.height,
                info.cell_size_mm
            )));
        }
        let expected = info.len();
        for len in [
            self.x_mm.len(),
            self.y_mm.len(),
            self.occupancy.len(),
            self.vacancy.len(),
        ] {
            if len != expected {
                return Err(MapError::BufferSize {
                    expected,
                    actual: len,
                });
            }
        }
        Ok(())
    }

    pub fn cells(&self) -> impl Iterator<Item = GridCell> + '_ {
        self.x_mm
            .iter()
            .zip(&self.y_mm)
            .zip(self.occupancy.iter().zip(&self.vacancy))
            .map(|((&x, &y), (&occupancy, &vacancy))| GridCell {
                position: IVec2::new(x, y),
                occupancy,
                vacancy,
            })
    }
}
