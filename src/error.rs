use thiserror::Error;

/// Errors surfaced by a single detection run.
///
/// Every variant is terminal for the run: there are no retries and no partial
/// results.
#[derive(Debug, Error)]
pub enum DetectError {
    /// The input image is empty, has the wrong channel count, or cannot be
    /// resized to the requested model input.
    #[error("invalid image: {0}")]
    InvalidImage(String),

    /// The inference output does not match the expected tensor layout.
    #[error("invalid output shape: {0}")]
    InvalidOutputShape(String),

    /// The inference engine failed to initialise.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// The inference engine failed while running a prepared input.
    #[error("inference failed: {0}")]
    Inference(String),

    /// A configuration value is out of range or could not be read.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

impl DetectError {
    pub fn model_load(err: impl std::fmt::Display) -> Self {
        DetectError::ModelLoad(err.to_string())
    }

    pub fn inference(err: impl std::fmt::Display) -> Self {
        DetectError::Inference(err.to_string())
    }

    pub fn output_shape(shape: &[usize], expected: &str) -> Self {
        DetectError::InvalidOutputShape(format!("got {:?}, expected {}", shape, expected))
    }
}
