pub mod arena;
pub mod cartesian;
pub mod cell;
pub mod fusion;
pub mod polar;
pub mod recenter;
pub mod traits;

pub use arena::{CellArena, ReindexStats};
pub use cartesian::GridMap;
pub use cell::GridCell;
pub use polar::{HPolarGridMap, PolarIndex, PolarLayout};
pub use traits::{MapSnapshot, OccupancyMap, UpdateStats};
