//! Map metadata.

use glam::IVec2;
use serde::{Deserialize, Serialize};

/// Shape and placement of a grid, shared by both map variants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapInfo {
    /// Number of cells along each storage axis (columns, rows).
    pub width: u32,
    pub height: u32,
    /// Edge length of a Cartesian cell, also the recenter threshold (mm).
    pub cell_size_mm: i32,
    /// World position the grid is centered on (mm).
    pub center: IVec2,
}

impl Default for MapInfo {
    fn default() -> Self {
        Self {
            width: 128,
            height: 128,
            cell_size_mm: 40,
            center: IVec2::ZERO,
        }
    }
}

impl MapInfo {
    pub fn square(width: u32, cell_size_mm: i32) -> Self {
        Self {
            width,
            height: width,
            cell_size_mm,
            ..Default::default()
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True when `position` has drifted more than one cell from the center on either axis.
    #[inline]
    pub fn needs_recenter(&self, position: IVec2) -> bool {
        let drift = (position - self.center).abs();
        drift.x > self.cell_size_mm || drift.y > self.cell_size_mm
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recenter_threshold_is_exclusive() {
        let info = MapInfo::square(10, 50);
        assert!(!info.needs_recenter(IVec2::new(50, -50)));
        assert!(info.needs_recenter(IVec2::new(51, 0)));
        assert!(info.needs_recenter(IVec2::new(0, -51)));
    }
}
