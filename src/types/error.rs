use thiserror::Error;

#[derive(Debug, Error)]
pub enum MapError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("buffer holds {actual} bytes but {expected} are required")]
    BufferSize { expected: usize, actual: usize },
}
