pub mod constants;
pub mod error;
pub mod geometry;
pub mod info;

pub use constants::*;
pub use error::MapError;
pub use geometry::{CellState, FeatureMatch, RobotPose};
pub use info::MapInfo;
