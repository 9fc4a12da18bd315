//! Row types

use std::collections::BTreeMap;

use crate::cell::CellData;

/// Row-level formatting carried alongside the cells
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowProperties {
    /// Custom height in points (None = default)
    pub height: Option<f64>,
    /// Row is hidden
    pub hidden: bool,
    /// Row-level style index (None = no row style)
    pub style_index: Option<u32>,
}

impl RowProperties {
    /// Check if this row has any custom settings
    pub fn has_custom_settings(&self) -> bool {
        self.height.is_some() || self.hidden || self.style_index.is_some()
    }
}

/// A populated row: its properties and its sparse cells keyed by column
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    pub properties: RowProperties,
    pub(crate) cells: BTreeMap<u16, CellData>,
}

impl Row {
    pub fn cell(&self, col: u16) -> Option<&CellData> {
        self.cells.get(&col)
    }

    /// Cells in column order
    pub fn cells(&self) -> impl Iterator<Item = (u16, &CellData)> {
        self.cells.iter().map(|(c, d)| (*c, d))
    }

    /// A row with no cells and no custom settings need not be stored
    pub fn is_blank(&self) -> bool {
        self.cells.is_empty() && !self.properties.has_custom_settings()
    }
}
