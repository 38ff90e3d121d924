use std::path::PathBuf;
use thiserror::Error;

use crate::format::Format;

#[derive(Debug, Error)]
pub enum RcfigError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Config file {0} does not exist")]
    ConfigPathNotFound(PathBuf),

    #[error("Failed to parse {path} as {format}: {message}")]
    ParseError {
        path: PathBuf,
        format: Format,
        message: String,
    },

    /// Never returned: rendered into a warning when a config file without a
    /// format extension can't be parsed by any parser.
    #[error("Failed to parse config {path} as JSON, INI or YAML; skipping it")]
    ParseAmbiguous { path: PathBuf },

    #[error("Invalid '{cast}:' cast at '{key}': {reason}")]
    TemplateCast {
        key: String,
        cast: String,
        reason: String,
    },

    #[error("Failed to read {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },
}
