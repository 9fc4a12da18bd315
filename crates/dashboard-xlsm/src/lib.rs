//! # dashboard-xlsm
//!
//! Package-preserving XLSX/XLSM store for the dashboard builder.
//!
//! Worksheet cells are parsed into the `dashboard-core` model and regenerated
//! on save. Everything else in the package, including the VBA project, is
//! written back byte for byte.

pub mod book;
pub mod error;

mod package;
mod reader;
mod writer;

pub use book::XlsmBook;
pub use error::{XlsmError, XlsmResult};
