//! Shell commands listed in a CSV file

use std::path::Path;

use dashboard_core::CellValue;

use super::{ComponentIter, DataComponent, Dataset, Row, MAX_ROW_WIDTH};
use crate::account::Account;
use crate::config::Config;
use crate::error::{DashboardError, Result};

const NAME: &str = "commands";

/// Rows of `name, command[, description...]`, sorted and unique by name
#[derive(Debug, Clone, Default)]
pub struct Commands {
    data: Dataset,
}

impl Commands {
    fn read_rows(path: &Path, account: &Account) -> Result<Vec<Row>> {
        let csv_error = |source: csv::Error| DashboardError::Csv {
            path: path.to_path_buf(),
            source,
        };

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(csv_error)?;

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result.map_err(csv_error)?;
            let line = record.position().map_or(0, |p| p.line());

            if record.len() < 2 {
                return Err(DashboardError::invalid_input(
                    NAME,
                    format!("line {line}: expected at least a name and a command"),
                ));
            }
            if record.len() > MAX_ROW_WIDTH {
                return Err(DashboardError::invalid_input(
                    NAME,
                    format!(
                        "line {line}: {} fields; at most {MAX_ROW_WIDTH} are supported",
                        record.len()
                    ),
                ));
            }
            if record[0].is_empty() {
                return Err(DashboardError::invalid_input(
                    NAME,
                    format!("line {line}: command name is empty"),
                ));
            }

            rows.push(
                record
                    .iter()
                    .map(|field| CellValue::String(account.substitute(field)))
                    .collect(),
            );
        }
        Ok(rows)
    }
}

impl DataComponent for Commands {
    fn name(&self) -> &'static str {
        NAME
    }

    fn load(&mut self, config: &Config, account: &Account) -> Result<()> {
        let rows = Self::read_rows(&config.commands.source, account)?;
        tracing::debug!(
            "Read {} commands from {}",
            rows.len(),
            config.commands.source.display()
        );
        self.data.fill(NAME, rows)
    }

    fn finalize(&mut self) -> Result<()> {
        self.data.freeze(NAME, |rows| {
            let before = rows.len();
            rows.sort_by(|a, b| name_of(a).cmp(name_of(b)));
            rows.dedup_by(|later, kept| name_of(later) == name_of(kept));
            if rows.len() < before {
                tracing::debug!("Dropped {} duplicate commands", before - rows.len());
            }
        })
    }

    fn len(&self) -> usize {
        self.data.len()
    }

    fn label<'c>(&self, config: &'c Config) -> &'c str {
        &config.commands.label
    }

    fn rows(&self) -> Result<ComponentIter<'_>> {
        self.data.iter(NAME)
    }
}

fn name_of(row: &Row) -> &str {
    row.first().and_then(CellValue::as_string).unwrap_or_default()
}
