use std::path::Path;

use crate::config::MapperConfig;
use crate::types::MapError;

/// Parse and validate a mapper configuration from YAML text.
pub fn parse_config(yaml: &str) -> Result<MapperConfig, MapError> {
    let config: MapperConfig = serde_yaml::from_str(yaml)?;
    config.validate()?;
    Ok(config)
}

/// Load and validate a mapper configuration from a YAML file.
pub fn load_config(yaml_path: impl AsRef<Path>) -> Result<MapperConfig, MapError> {
    let yaml_path = yaml_path.as_ref();
    let yaml_str = std::fs::read_to_string(yaml_path)?;
    let config = parse_config(&yaml_str)?;
    log::debug!(
        "loaded {:?} map config from {}",
        config.grid.kind,
        yaml_path.display()
    );
    Ok(config)
}

/// Write a configuration as YAML, e.g. to capture the defaults a run used.
pub fn save_config(config: &MapperConfig, yaml_path: impl AsRef<Path>) -> Result<(), MapError> {
    let yaml_str = serde_yaml::to_string(config)?;
    std::fs::write(yaml_path, yaml_str)?;
    Ok(())
}
