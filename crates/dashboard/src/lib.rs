//! # dashboard
//!
//! Builds a macro dashboard from a workbook template.
//!
//! The source workbook is copied to a timestamped file, its macro sheet is
//! rebuilt from the template sheet, and every [`Component`] writes its rows
//! beneath the cell holding the component's label.
//!
//! ```rust,no_run
//! use std::path::Path;
//! use dashboard::{build, Account, Config};
//!
//! let config = Config::load(Path::new("dashboard.toml"))?;
//! let account = Account::new("Alice Smith", "asmith")?;
//! let output = build(Path::new("dashboard.xlsm"), &config, &account)?;
//! println!("{}", output.display());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod account;
pub mod component;
pub mod config;
pub mod engine;
pub mod error;
pub mod store;

pub use account::{Account, AccountError};
pub use component::{Component, ComponentIter, DataComponent, Row, Stage};
pub use config::{Config, ConfigError};
pub use engine::{build, build_with, column_letter, locate_row, render_sheet, timestamped_path};
pub use error::{DashboardError, Result};
pub use store::WorkbookStore;
