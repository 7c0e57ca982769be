pub mod yaml;

pub use yaml::{load_config, parse_config, save_config};
