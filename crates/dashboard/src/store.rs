//! The workbook operations the engine relies on

use std::path::Path;

use dashboard_core::CellValue;
use dashboard_xlsm::{XlsmBook, XlsmError};

/// A workbook that can be opened, edited sheet by sheet and saved.
///
/// Rows are 1-based and cells are addressed in A1 notation.
pub trait WorkbookStore: Sized {
    type Error: std::error::Error + Send + Sync + 'static;

    fn open(path: &Path) -> Result<Self, Self::Error>;

    /// Write to `path`; later saves go there too
    fn save_as(&mut self, path: &Path) -> Result<(), Self::Error>;

    fn save(&mut self) -> Result<(), Self::Error>;

    /// Append an empty sheet, returning its index
    fn new_sheet(&mut self, name: &str) -> Result<usize, Self::Error>;

    /// Remove a sheet; `false` when there was none by that name
    fn delete_sheet(&mut self, name: &str) -> Result<bool, Self::Error>;

    /// Overwrite sheet `to` with the contents of sheet `from`
    fn copy_sheet(&mut self, from: usize, to: usize) -> Result<(), Self::Error>;

    fn sheet_index(&self, name: &str) -> Option<usize>;

    /// Display text of a cell, empty when blank
    fn cell_value(&self, sheet: &str, address: &str) -> Result<String, Self::Error>;

    fn set_cell_value(
        &mut self,
        sheet: &str,
        address: &str,
        value: &CellValue,
    ) -> Result<(), Self::Error>;

    /// Insert a copy of `row` at `row + 1`, shifting the rows below it down
    fn duplicate_row(&mut self, sheet: &str, row: u32) -> Result<(), Self::Error>;
}

impl WorkbookStore for XlsmBook {
    type Error = XlsmError;

    fn open(path: &Path) -> Result<Self, XlsmError> {
        XlsmBook::open(path)
    }

    fn save_as(&mut self, path: &Path) -> Result<(), XlsmError> {
        XlsmBook::save_as(self, path)
    }

    fn save(&mut self) -> Result<(), XlsmError> {
        XlsmBook::save(self)
    }

    fn new_sheet(&mut self, name: &str) -> Result<usize, XlsmError> {
        XlsmBook::new_sheet(self, name)
    }

    fn delete_sheet(&mut self, name: &str) -> Result<bool, XlsmError> {
        XlsmBook::delete_sheet(self, name)
    }

    fn copy_sheet(&mut self, from: usize, to: usize) -> Result<(), XlsmError> {
        XlsmBook::copy_sheet(self, from, to)
    }

    fn sheet_index(&self, name: &str) -> Option<usize> {
        XlsmBook::sheet_index(self, name)
    }

    fn cell_value(&self, sheet: &str, address: &str) -> Result<String, XlsmError> {
        XlsmBook::cell_value(self, sheet, address)
    }

    fn set_cell_value(
        &mut self,
        sheet: &str,
        address: &str,
        value: &CellValue,
    ) -> Result<(), XlsmError> {
        XlsmBook::set_cell_value(self, sheet, address, value.clone())
    }

    fn duplicate_row(&mut self, sheet: &str, row: u32) -> Result<(), XlsmError> {
        XlsmBook::duplicate_row(self, sheet, row)
    }
}
