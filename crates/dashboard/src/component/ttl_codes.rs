//! Tera Term macros read from a directory of `.ttl` files

use std::path::Path;

use dashboard_core::CellValue;

use super::{ComponentIter, DataComponent, Dataset, Row};
use crate::account::Account;
use crate::config::Config;
use crate::error::{DashboardError, Result};

const NAME: &str = "ttl_codes";

/// Longest text a single spreadsheet cell can hold
const MAX_CELL_TEXT: usize = 32_767;

/// Rows of `[file stem, macro body]`, sorted by stem
#[derive(Debug, Clone, Default)]
pub struct TtlCodes {
    data: Dataset,
}

impl TtlCodes {
    fn read_rows(dir: &Path, account: &Account) -> Result<Vec<Row>> {
        let io_error = |source: std::io::Error| DashboardError::Io {
            path: dir.to_path_buf(),
            source,
        };

        let mut rows = Vec::new();
        for entry in std::fs::read_dir(dir).map_err(io_error)? {
            let path = entry.map_err(io_error)?.path();
            let is_macro = path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("ttl"));
            if !is_macro || !path.is_file() {
                continue;
            }

            let stem = path
                .file_stem()
                .and_then(|s| s.to_str())
                .ok_or_else(|| {
                    DashboardError::invalid_input(
                        NAME,
                        format!("{} has a non UTF-8 file name", path.display()),
                    )
                })?
                .to_string();

            let bytes = std::fs::read(&path).map_err(|source| DashboardError::Io {
                path: path.clone(),
                source,
            })?;
            let text = String::from_utf8(bytes).map_err(|e| {
                DashboardError::invalid_input(
                    NAME,
                    format!("{} is not valid UTF-8: {}", path.display(), e.utf8_error()),
                )
            })?;

            let body = account.substitute(&text.replace("\r\n", "\n"));
            if body.chars().count() > MAX_CELL_TEXT {
                return Err(DashboardError::invalid_input(
                    NAME,
                    format!(
                        "{} is longer than the {MAX_CELL_TEXT} characters a cell can hold",
                        path.display()
                    ),
                ));
            }

            tracing::debug!("Read macro {}", stem);
            rows.push(vec![CellValue::String(stem), CellValue::String(body)]);
        }
        Ok(rows)
    }
}

impl DataComponent for TtlCodes {
    fn name(&self) -> &'static str {
        NAME
    }

    fn load(&mut self, config: &Config, account: &Account) -> Result<()> {
        let rows = Self::read_rows(&config.ttl_codes.source, account)?;
        tracing::debug!(
            "Read {} macros from {}",
            rows.len(),
            config.ttl_codes.source.display()
        );
        self.data.fill(NAME, rows)
    }

    fn finalize(&mut self) -> Result<()> {
        self.data.freeze(NAME, |rows| {
            rows.sort_by(|a, b| stem_of(a).cmp(stem_of(b)));
        })
    }

    fn len(&self) -> usize {
        self.data.len()
    }

    fn label<'c>(&self, config: &'c Config) -> &'c str {
        &config.ttl_codes.label
    }

    fn rows(&self) -> Result<ComponentIter<'_>> {
        self.data.iter(NAME)
    }
}

fn stem_of(row: &Row) -> &str {
    row.first().and_then(CellValue::as_string).unwrap_or_default()
}
