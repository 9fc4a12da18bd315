//! Data components rendered into the dashboard
//!
//! A component owns a dataset of rows. It moves through three stages:
//! [`Stage::Empty`] until `load` fills it, [`Stage::Loaded`] until `finalize`
//! normalizes it, and [`Stage::Frozen`] from then on, when its rows can be
//! iterated any number of times. Calling an operation out of order is a
//! [`DashboardError::Lifecycle`] error.

mod commands;
mod ttl_codes;

pub use commands::Commands;
pub use ttl_codes::TtlCodes;

use std::fmt;

use dashboard_core::CellValue;

use crate::account::Account;
use crate::config::Config;
use crate::error::{DashboardError, Result};

/// One rendered row; value `i` lands in column `'A' + i`
pub type Row = Vec<CellValue>;

/// Widest row a component may produce (columns A through Z)
pub const MAX_ROW_WIDTH: usize = 26;

/// Lifecycle stage of a component's dataset
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Stage {
    #[default]
    Empty,
    Loaded,
    Frozen,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Empty => "empty",
            Stage::Loaded => "loaded",
            Stage::Frozen => "frozen",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A source of rows for one anchor of the dashboard
pub trait DataComponent {
    /// Short name used in logs and errors
    fn name(&self) -> &'static str;

    /// Populate the dataset from the source named in `config`
    fn load(&mut self, config: &Config, account: &Account) -> Result<()>;

    /// Normalize the loaded dataset; runs once, after `load`
    fn finalize(&mut self) -> Result<()>;

    /// Number of rows in the dataset
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The anchor text this component renders beneath
    fn label<'c>(&self, config: &'c Config) -> &'c str;

    /// A fresh pass over the finalized rows
    fn rows(&self) -> Result<ComponentIter<'_>>;
}

/// Rows held by a component together with its lifecycle stage
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    rows: Vec<Row>,
    stage: Stage,
}

impl Dataset {
    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Accept freshly loaded rows, rejecting any wider than [`MAX_ROW_WIDTH`]
    pub fn fill(&mut self, component: &'static str, rows: Vec<Row>) -> Result<()> {
        self.expect_stage(component, "load", Stage::Empty)?;
        if let Some((index, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() > MAX_ROW_WIDTH)
        {
            return Err(DashboardError::invalid_input(
                component,
                format!(
                    "row {} has {} values; at most {} are supported",
                    index + 1,
                    row.len(),
                    MAX_ROW_WIDTH
                ),
            ));
        }
        self.rows = rows;
        self.stage = Stage::Loaded;
        Ok(())
    }

    /// Run the component's normalization and freeze the rows
    pub fn freeze<F>(&mut self, component: &'static str, normalize: F) -> Result<()>
    where
        F: FnOnce(&mut Vec<Row>),
    {
        self.expect_stage(component, "finalize", Stage::Loaded)?;
        normalize(&mut self.rows);
        self.stage = Stage::Frozen;
        Ok(())
    }

    pub fn iter(&self, component: &'static str) -> Result<ComponentIter<'_>> {
        self.expect_stage(component, "iterate", Stage::Frozen)?;
        Ok(ComponentIter {
            inner: self.rows.iter(),
        })
    }

    fn expect_stage(
        &self,
        component: &'static str,
        operation: &'static str,
        expected: Stage,
    ) -> Result<()> {
        if self.stage == expected {
            return Ok(());
        }
        Err(DashboardError::Lifecycle {
            component,
            operation,
            stage: self.stage.as_str(),
        })
    }
}

/// Finite iterator over a component's rows
#[derive(Debug, Clone)]
pub struct ComponentIter<'a> {
    inner: std::slice::Iter<'a, Row>,
}

impl<'a> Iterator for ComponentIter<'a> {
    type Item = &'a [CellValue];

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(Vec::as_slice)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for ComponentIter<'_> {}

/// The components of a dashboard, in render order
#[derive(Debug, Clone)]
pub enum Component {
    Commands(Commands),
    TtlCodes(TtlCodes),
}

impl Component {
    /// Every component, in the order they are loaded and rendered
    pub fn all() -> [Component; 2] {
        [
            Component::Commands(Commands::default()),
            Component::TtlCodes(TtlCodes::default()),
        ]
    }

    fn inner(&self) -> &dyn DataComponent {
        match self {
            Component::Commands(c) => c,
            Component::TtlCodes(c) => c,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn DataComponent {
        match self {
            Component::Commands(c) => c,
            Component::TtlCodes(c) => c,
        }
    }
}

impl DataComponent for Component {
    fn name(&self) -> &'static str {
        self.inner().name()
    }

    fn load(&mut self, config: &Config, account: &Account) -> Result<()> {
        self.inner_mut().load(config, account)
    }

    fn finalize(&mut self) -> Result<()> {
        self.inner_mut().finalize()
    }

    fn len(&self) -> usize {
        self.inner().len()
    }

    fn label<'c>(&self, config: &'c Config) -> &'c str {
        self.inner().label(config)
    }

    fn rows(&self) -> Result<ComponentIter<'_>> {
        self.inner().rows()
    }
}
