//! Custom error types for crackseg.

use std::path::PathBuf;
use thiserror::Error;

/// Boxed error raised by an inference backend.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Main error type for the crackseg library.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to load an image file.
    #[error("failed to load image from {path}: {source}")]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Failed to save an image file.
    #[error("failed to save image to {path}: {source}")]
    ImageSave {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Image cannot enter the pipeline.
    #[error("degenerate input image {width}x{height}: {reason}")]
    DegenerateInput {
        width: u32,
        height: u32,
        reason: String,
    },

    /// No segmentation model is available.
    #[error(
        "segmentation model not found at {path}; place an ONNX model there, \
         or pass --model <PATH> or --model-url <URL>"
    )]
    MissingModel { path: PathBuf },

    /// Failed to download a model.
    #[error("failed to download model {name}: {source}")]
    ModelDownload {
        name: String,
        #[source]
        source: reqwest::Error,
    },

    /// Failed to load an ONNX model.
    #[error("failed to load ONNX model {name}: {source}")]
    ModelLoad {
        name: String,
        #[source]
        source: ort::Error,
    },

    /// Model inference failed.
    #[error("model inference failed during {stage}: {source}")]
    Inference {
        stage: &'static str,
        #[source]
        source: BoxError,
    },

    /// Failed to create cache directory.
    #[error("failed to create cache directory {path}: {source}")]
    CacheDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid parameter value.
    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Shape mismatch in tensor operations.
    #[error("tensor shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: String, actual: String },
}

impl Error {
    /// Wrap a backend failure with the stage it happened in.
    pub fn inference<E>(stage: &'static str, source: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::Inference {
            stage,
            source: source.into(),
        }
    }
}

/// Result type alias for crackseg operations.
pub type Result<T> = std::result::Result<T, Error>;
