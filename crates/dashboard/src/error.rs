//! Error types for building dashboards

use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;

/// Result type for dashboard operations
pub type Result<T> = std::result::Result<T, DashboardError>;

/// Errors raised while loading components or rendering the dashboard
#[derive(Debug, Error)]
pub enum DashboardError {
    /// A workbook store operation failed
    #[error("failed to {action}: {source}")]
    Store {
        action: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No cell in the search window holds the label
    #[error("no cell found with the value '{label}' on sheet '{sheet}'")]
    AnchorNotFound { label: String, sheet: String },

    #[error("template sheet '{0}' not found")]
    MissingTemplate(String),

    /// Only columns A through Z are addressable
    #[error("column {0} is not supported; columns are only supported up to Z")]
    UnsupportedColumn(u32),

    /// A data source does not have the expected shape
    #[error("invalid {component} input: {reason}")]
    InvalidInput {
        component: &'static str,
        reason: String,
    },

    #[error("CSV error in {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// A component operation was called out of order
    #[error("{component}: cannot {operation} while {stage}")]
    Lifecycle {
        component: &'static str,
        operation: &'static str,
        stage: &'static str,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl DashboardError {
    /// Wrap a store error with the action that failed
    pub fn store<E>(action: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Store {
            action: action.into(),
            source: Box::new(source),
        }
    }

    pub(crate) fn invalid_input(component: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            component,
            reason: reason.into(),
        }
    }
}
