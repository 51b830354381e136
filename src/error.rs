//! Error types for the fusion core and for the demo-side configuration layer.

use std::path::PathBuf;
use thiserror::Error;

/// Result alias used throughout the fusion core.
pub type Result<T> = std::result::Result<T, FusionError>;

/// Failures surfaced by the fusion pipeline.
///
/// An empty detection set is never an error; it propagates as an empty
/// `Vec` through every stage.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FusionError {
    /// Expert pool empty, weight/expert count mismatch, bad parameters.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A collaborator reported a box or confidence that violates the contract.
    #[error("malformed detection from {source_name}: {reason}")]
    MalformedDetection { source_name: String, reason: String },

    /// The gating provider returned a negative or non-finite weight.
    #[error("malformed gate weight at index {index}: {value}")]
    MalformedGateWeights { index: usize, value: f32 },

    /// A gating provider or expert failed while running inference.
    #[error("inference failed in {source_name}: {message}")]
    Inference { source_name: String, message: String },
}

impl FusionError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn inference(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Inference {
            source_name: source_name.into(),
            message: message.into(),
        }
    }
}

/// Failures while loading runtime configuration or reading/writing files.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize JSON: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to decode image {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("invalid command line: {0}")]
    Usage(String),

    #[error("invalid input: {0}")]
    Invalid(String),

    #[error(transparent)]
    Fusion(#[from] FusionError),
}
