//! Drive a robot down a synthetic corridor and render both map variants to PNG.
//!
//! Usage: `cargo run --example synthetic_corridor [config.yaml] [out_dir]`

use std::error::Error;
use std::path::PathBuf;

use stereogrid::synthetic::SyntheticScene;
use stereogrid::visualization::save_png;
use stereogrid::{MapKind, MapperConfig, RobotPose, StereoMapper, load_config};

const CORRIDOR_LENGTH_MM: i32 = 6000;
const CORRIDOR_HALF_WIDTH_MM: i32 = 700;
const WALL_SPACING_MM: i32 = 25;
const STEP_MM: usize = 50;
const IMAGE_SIZE: u32 = 512;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => load_config(path)?,
        None => MapperConfig::default(),
    };
    let out_dir = PathBuf::from(args.next().unwrap_or_else(|| ".".to_string()));

    let scene = SyntheticScene::corridor(
        config.camera.clone(),
        config.ground.clone(),
        CORRIDOR_LENGTH_MM,
        CORRIDOR_HALF_WIDTH_MM,
        WALL_SPACING_MM,
    );

    for kind in [MapKind::Cartesian, MapKind::Polar] {
        let mut config = config.clone();
        config.grid.kind = kind;
        let mut mapper = StereoMapper::new(config.clone())?;

        let mut used = 0;
        for (i, y) in (0..=CORRIDOR_LENGTH_MM / 2).step_by(STEP_MM).enumerate() {
            // gentle weave so the walls are seen from several headings
            let heading = if i % 8 < 4 { 5.0 } else { -5.0 };
            let frame = scene.frame(RobotPose::new(0, y, heading));
            let stats = mapper.process_frame(&frame.as_stereo_frame(&config.camera));
            used += stats.features_used;
        }

        let path = out_dir.join(format!("corridor_{kind:?}.png").to_lowercase());
        save_png(mapper.map(), IMAGE_SIZE, IMAGE_SIZE, &path)?;
        log::info!(
            "{kind:?}: {} frames, {used} features fused, {} occupied cells, wrote {}",
            mapper.frames_processed(),
            mapper.map().occupied_positions().len(),
            path.display()
        );
    }
    Ok(())
}
