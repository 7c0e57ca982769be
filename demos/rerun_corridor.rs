//! Stream a corridor run to a rerun viewer.
//!
//! Usage: `cargo run --example rerun_corridor --features rerun [polar]`

use std::error::Error;
use std::time::Duration;

use stereogrid::rerun_viz::{log_map, log_occupied, log_robot};
use stereogrid::synthetic::SyntheticScene;
use stereogrid::{MapKind, MapperConfig, RobotPose, StereoMapper};

const Z_MAP: f32 = 0.0;
const Z_OCCUPIED: f32 = 0.05;
const Z_ROBOT: f32 = 0.1;
const TEXTURE_SIZE: u32 = 256;
const DELAY_MS: u64 = 30;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let mut config = MapperConfig::default();
    if std::env::args().nth(1).as_deref() == Some("polar") {
        config.grid.kind = MapKind::Polar;
    }
    let scene = SyntheticScene::corridor(config.camera.clone(), config.ground.clone(), 6000, 700, 25);
    let mut mapper = StereoMapper::new(config.clone())?;

    let rec = rerun::RecordingStreamBuilder::new("stereogrid_corridor").spawn()?;

    for (frame_idx, y) in (0..=3000).step_by(25).enumerate() {
        rec.set_time_sequence("frame", frame_idx as i64);

        let pose = RobotPose::new(0, y, ((frame_idx as f32) * 0.1).sin() * 10.0);
        let frame = scene.frame(pose);
        mapper.process_frame(&frame.as_stereo_frame(&config.camera));

        log_map(&rec, "world/map", mapper.map(), TEXTURE_SIZE, Z_MAP)?;
        log_occupied(&rec, "world/occupied", mapper.map(), Z_OCCUPIED)?;
        log_robot(&rec, "world/robot", &pose, Z_ROBOT)?;

        std::thread::sleep(Duration::from_millis(DELAY_MS));
    }
    Ok(())
}
