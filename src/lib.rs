pub mod camera;
pub mod config;
pub mod grid;
pub mod ground;
pub mod iterators;
pub mod loaders;
pub mod mapper;
pub mod projection;
#[cfg(feature = "rerun")]
pub mod rerun_viz;
pub mod synthetic;
pub mod trig;
pub mod types;
pub mod visualization;

pub use camera::StereoCamera;
pub use config::{CameraConfig, GridConfig, GroundConfig, MapKind, MapperConfig, PolarConfig};
pub use grid::{GridCell, GridMap, HPolarGridMap, MapSnapshot, OccupancyMap, UpdateStats};
pub use ground::{Footline, GroundPlaneEstimator};
pub use loaders::{load_config, parse_config, save_config};
pub use mapper::{StereoFrame, StereoMapper, build_map};
pub use projection::{FeatureProjector, ProjectedFeature, Rejection};
pub use types::{CellState, FeatureMatch, MapError, MapInfo, RobotPose};
