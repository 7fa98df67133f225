//! Error types for configuration and export.
//!
//! Generation stages themselves are total functions over a well-formed mesh; only
//! configuration loading, validation and file output can fail.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeoError {
    #[error("{name} must be within [0, 1], got {value}")]
    FractionOutOfRange { name: &'static str, value: f64 },

    #[error("plate count must be at least 1")]
    NoPlates,

    #[error(
        "icosphere subdivision level {0} is too large (max {max})",
        max = crate::mesh::MAX_SUBDIVISIONS
    )]
    ResolutionTooLarge(u32),

    #[error("noise amplitude must be finite and non-negative, got {0}")]
    InvalidNoiseAmplitude(f32),

    #[error("fill epsilon must be finite and positive, got {0}")]
    InvalidFillEpsilon(f32),

    #[error("mesh is empty")]
    EmptyMesh,

    #[error("failed to read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write image: {0}")]
    Image(#[from] image::ImageError),

    #[error("failed to write summary: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize summary: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, GeoError>;
