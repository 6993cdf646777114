//! Error types for the blob_vision engine.

use thiserror::Error;

/// Result type alias for blob_vision operations.
pub type Result<T> = std::result::Result<T, BlobError>;

#[derive(Error, Debug)]
pub enum BlobError {
    /// Scratch memory for the visited bitmap, work-list or region list could
    /// not be reserved. The whole call fails and no partial blob list escapes.
    #[error("Out of memory reserving {bytes} bytes for the {what}")]
    OutOfMemory { what: &'static str, bytes: usize },

    /// The pixel slice does not hold exactly `width * height` pixels.
    #[error("Pixel buffer holds {actual} pixels, expected {expected}")]
    BufferSizeMismatch { expected: usize, actual: usize },

    /// A configuration value is out of its legal range.
    #[error("Invalid parameter: {parameter} = {value}")]
    InvalidParameter { parameter: String, value: String },

    #[error("Failed to load image: {0}")]
    ImageLoad(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A worker of the parallel pipeline went away before answering.
    #[error("Worker pool error: {0}")]
    WorkerPool(String),
}

impl BlobError {
    pub fn out_of_memory(what: &'static str, bytes: usize) -> Self {
        Self::OutOfMemory { what, bytes }
    }

    pub fn invalid_parameter(parameter: impl Into<String>, value: impl ToString) -> Self {
        Self::InvalidParameter {
            parameter: parameter.into(),
            value: value.to_string(),
        }
    }
}
