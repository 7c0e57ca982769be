//! Re-centering of a map window on the robot.

use glam::IVec2;

use super::{CellArena, GridCell, ReindexStats};
use crate::types::MapInfo;

/// Move the window to `new_center`, re-deriving every populated cell's index.
///
/// `new_index` maps a cell's current index and contents to its index relative
/// to `new_center`, returning `None` if the cell leaves the window.
pub fn recenter_arena<F>(
    arena: &mut CellArena,
    info: &mut MapInfo,
    new_center: IVec2,
    new_index: F,
) -> ReindexStats
where
    F: FnMut(usize, &GridCell) -> Option<usize>,
{
    let stats = arena.reindex(new_index);
    log::debug!(
        "recentered map from {:?} to {:?}: {} moved, {} merged, {} dropped",
        info.center,
        new_center,
        stats.moved,
        stats.merged,
        stats.dropped
    );
    info.center = new_center;
    stats
}
