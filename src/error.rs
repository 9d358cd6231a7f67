use std::path::PathBuf;

use thiserror::Error;

/// Fatal failures: any of these aborts the rest of a dashboard run.
#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("Dataset file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("Failed to load {}: {message}", path.display())]
    Load { path: PathBuf, message: String },

    #[error("Invalid dashboard configuration: {0}")]
    Config(String),
}

/// Required logical fields absent after column normalization.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Missing required logical fields: {missing:?}")]
pub struct SchemaError {
    /// Canonical names of the missing fields, sorted.
    pub missing: Vec<String>,
    /// Columns the dataset does have, in file order.
    pub available: Vec<String>,
}

/// The current filter selection matched no rows. Not an error: the run stops
/// rendering and recovers once the selection changes.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("No data available for the selected filters.")]
pub struct EmptyResultWarning;

pub type Result<T> = std::result::Result<T, DashboardError>;
