use std::path::PathBuf;

use thiserror::Error;

/// Failure to turn an input file into a [`NameDataset`](crate::data::model::NameDataset).
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported file extension: .{0}")]
    UnsupportedFormat(String),

    #[error("missing required column '{0}'")]
    MissingColumn(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("no usable rows in {} after type coercion", .0.display())]
    Empty(PathBuf),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("HOME environment variable not set")]
    NoHome,

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Rejected filter request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CriteriaError {
    #[error("smoothing window must be at least one year")]
    ZeroWindow,

    #[error("minimum count {min} is greater than maximum count {max}")]
    InvertedBounds { min: u64, max: u64 },
}
