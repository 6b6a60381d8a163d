use thiserror::Error;

#[derive(Error, Debug)]
pub enum FaceSweepError {
    #[error("Model error: {0}")]
    Model(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Expected {expected} landmark points, got {got}")]
    InvalidLandmarks { expected: usize, got: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("ORT error: {0}")]
    Ort(#[from] ort::OrtError),
}

pub type Result<T> = std::result::Result<T, FaceSweepError>;
