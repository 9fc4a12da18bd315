//! XLSM error types

use thiserror::Error;

/// Result type for package operations
pub type XlsmResult<T> = std::result::Result<T, XlsmError>;

/// Errors that can occur while reading, editing or writing a package
#[derive(Debug, Error)]
pub enum XlsmError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// ZIP error
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// XML error
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Invalid file format
    #[error("Invalid workbook package: {0}")]
    InvalidFormat(String),

    /// Missing required part
    #[error("Missing required part: {0}")]
    MissingPart(String),

    /// Unparseable cell content
    #[error("Parse error: {0}")]
    Parse(String),

    /// `save` called on a book that was never opened from or saved to disk
    #[error("Workbook has no file path; use save_as first")]
    NoPath,

    /// Core model error
    #[error(transparent)]
    Core(#[from] dashboard_core::Error),
}
