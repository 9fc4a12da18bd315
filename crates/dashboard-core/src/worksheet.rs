//! Worksheet type

use std::collections::BTreeMap;

use crate::cell::{CellAddress, CellData, CellRange, CellValue};
use crate::error::{Error, Result};
use crate::row::{Row, RowProperties};
use crate::{MAX_COLS, MAX_ROWS};

/// A worksheet within a workbook
///
/// Cells are stored sparsely, row-major: `BTreeMap<row, Row>` where each row
/// holds a `BTreeMap<col, CellData>`. Ordered maps keep iteration in the
/// order the file format requires.
#[derive(Debug, Clone)]
pub struct Worksheet {
    /// Sheet name
    name: String,
    /// Populated rows, 0-based
    rows: BTreeMap<u32, Row>,
}

impl Worksheet {
    /// Create a new empty worksheet
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            rows: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name<S: Into<String>>(&mut self, name: S) {
        self.name = name.into();
    }

    // ==================== Cell access ====================

    /// Get cell data by A1 address
    pub fn cell(&self, address: &str) -> Result<Option<&CellData>> {
        let addr = CellAddress::parse(address)?;
        Ok(self.cell_at(addr.row, addr.col))
    }

    pub fn cell_at(&self, row: u32, col: u16) -> Option<&CellData> {
        self.rows.get(&row).and_then(|r| r.cells.get(&col))
    }

    /// Get the value at an A1 address (Empty if the cell was never written)
    pub fn get_value(&self, address: &str) -> Result<CellValue> {
        let addr = CellAddress::parse(address)?;
        Ok(self.get_value_at(addr.row, addr.col))
    }

    pub fn get_value_at(&self, row: u32, col: u16) -> CellValue {
        self.cell_at(row, col)
            .map(|c| c.value.clone())
            .unwrap_or_default()
    }

    /// Set a cell value by A1 address, keeping the cell's existing style
    pub fn set_cell_value<V: Into<CellValue>>(&mut self, address: &str, value: V) -> Result<()> {
        let addr = CellAddress::parse(address)?;
        self.set_cell_value_at(addr.row, addr.col, value)
    }

    /// Set a cell value by index, keeping the cell's existing style
    pub fn set_cell_value_at<V: Into<CellValue>>(
        &mut self,
        row: u32,
        col: u16,
        value: V,
    ) -> Result<()> {
        let style_index = self.cell_at(row, col).map_or(0, |c| c.style_index);
        self.set_cell_at(row, col, CellData::with_style(value.into(), style_index))
    }

    /// Replace a cell's value and style
    pub fn set_cell_at(&mut self, row: u32, col: u16, data: CellData) -> Result<()> {
        check_bounds(row, col)?;

        if data.is_empty() {
            self.clear_cell_at(row, col);
            return Ok(());
        }

        self.rows.entry(row).or_default().cells.insert(col, data);
        Ok(())
    }

    /// Remove a cell, dropping its row if nothing else remains
    pub fn clear_cell_at(&mut self, row: u32, col: u16) {
        if let Some(r) = self.rows.get_mut(&row) {
            r.cells.remove(&col);
            if r.is_blank() {
                self.rows.remove(&row);
            }
        }
    }

    // ==================== Rows ====================

    pub fn row(&self, row: u32) -> Option<&Row> {
        self.rows.get(&row)
    }

    pub fn row_properties(&self, row: u32) -> RowProperties {
        self.rows
            .get(&row)
            .map(|r| r.properties.clone())
            .unwrap_or_default()
    }

    pub fn set_row_properties(&mut self, row: u32, properties: RowProperties) -> Result<()> {
        check_bounds(row, 0)?;
        let entry = self.rows.entry(row).or_default();
        entry.properties = properties;
        if entry.is_blank() {
            self.rows.remove(&row);
        }
        Ok(())
    }

    /// Populated rows in ascending order
    pub fn rows(&self) -> impl Iterator<Item = (u32, &Row)> {
        self.rows.iter().map(|(r, data)| (*r, data))
    }

    /// Insert a copy of `row` directly beneath it.
    ///
    /// Every row after `row` moves down by one, so the copy lands at
    /// `row + 1`. Duplicating a row that holds nothing still shifts the rows
    /// below it.
    pub fn duplicate_row(&mut self, row: u32) -> Result<()> {
        check_bounds(row, 0)?;

        let below = self.rows.split_off(&(row + 1));
        if let Some((&last, _)) = below.iter().next_back() {
            if last + 1 >= MAX_ROWS {
                self.rows.extend(below);
                return Err(Error::RowOutOfBounds(last + 1, MAX_ROWS - 1));
            }
        } else if row + 1 >= MAX_ROWS {
            return Err(Error::RowOutOfBounds(row + 1, MAX_ROWS - 1));
        }

        for (r, data) in below {
            self.rows.insert(r + 1, data);
        }
        if let Some(copy) = self.rows.get(&row).cloned() {
            self.rows.insert(row + 1, copy);
        }
        Ok(())
    }

    // ==================== Bulk operations ====================

    /// Replace all rows and cells with a copy of `other`'s; the name is kept
    pub fn copy_contents_from(&mut self, other: &Worksheet) {
        self.rows = other.rows.clone();
    }

    pub fn clear(&mut self) {
        self.rows.clear();
    }

    /// Iterate over all stored cells in row-major order
    pub fn iter_cells(&self) -> impl Iterator<Item = (u32, u16, &CellData)> {
        self.rows
            .iter()
            .flat_map(|(r, row)| row.cells.iter().map(move |(c, d)| (*r, *c, d)))
    }

    pub fn cell_count(&self) -> usize {
        self.rows.values().map(|r| r.cells.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The smallest range containing every stored cell
    pub fn used_range(&self) -> Option<CellRange> {
        let mut populated = self.rows.iter().filter(|(_, r)| !r.cells.is_empty());
        let (&first_row, first) = populated.next()?;
        let mut last_row = first_row;
        let mut first_col = *first.cells.keys().next()?;
        let mut last_col = *first.cells.keys().next_back()?;

        for (&r, row) in populated {
            last_row = r;
            if let Some(&c) = row.cells.keys().next() {
                first_col = first_col.min(c);
            }
            if let Some(&c) = row.cells.keys().next_back() {
                last_col = last_col.max(c);
            }
        }

        Some(CellRange::new(
            CellAddress::new(first_row, first_col),
            CellAddress::new(last_row, last_col),
        ))
    }
}

fn check_bounds(row: u32, col: u16) -> Result<()> {
    if row >= MAX_ROWS {
        return Err(Error::RowOutOfBounds(row, MAX_ROWS - 1));
    }
    if col >= MAX_COLS {
        return Err(Error::ColumnOutOfBounds(col as u32, MAX_COLS - 1));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn column_a(sheet: &Worksheet) -> Vec<String> {
        (0..8)
            .map(|r| sheet.get_value_at(r, 0).to_display_string())
            .collect()
    }

    #[test]
    fn test_set_and_get() {
        let mut sheet = Worksheet::new("Data");
        sheet.set_cell_value("B7", "TOTAL").unwrap();
        sheet.set_cell_value("C2", 42.0).unwrap();

        assert_eq!(sheet.get_value("B7").unwrap().as_string(), Some("TOTAL"));
        assert_eq!(sheet.get_value_at(1, 2).as_number(), Some(42.0));
        assert!(sheet.get_value("Z99").unwrap().is_empty());
        assert_eq!(sheet.cell_count(), 2);
    }

    #[test]
    fn test_set_value_keeps_style() {
        let mut sheet = Worksheet::new("Data");
        sheet
            .set_cell_at(0, 0, CellData::with_style(CellValue::Empty, 5))
            .unwrap();
        sheet.set_cell_value("A1", "styled").unwrap();
        assert_eq!(sheet.cell_at(0, 0).unwrap().style_index, 5);
    }

    #[test]
    fn test_clearing_last_cell_drops_row() {
        let mut sheet = Worksheet::new("Data");
        sheet.set_cell_value("A3", "x").unwrap();
        sheet.set_cell_value("A3", CellValue::Empty).unwrap();
        assert!(sheet.is_empty());
    }

    #[test]
    fn test_duplicate_row_shifts_below() {
        let mut sheet = Worksheet::new("Data");
        for (i, v) in ["a", "b", "c", "d"].iter().enumerate() {
            sheet.set_cell_value_at(i as u32, 0, *v).unwrap();
        }
        sheet
            .set_row_properties(
                1,
                RowProperties {
                    height: Some(30.0),
                    ..Default::default()
                },
            )
            .unwrap();

        sheet.duplicate_row(1).unwrap();

        assert_eq!(column_a(&sheet), vec!["a", "b", "b", "c", "d", "", "", ""]);
        assert_eq!(sheet.row_properties(2).height, Some(30.0));
    }

    #[test]
    fn test_duplicate_empty_row_still_shifts() {
        let mut sheet = Worksheet::new("Data");
        sheet.set_cell_value("A1", "head").unwrap();
        sheet.set_cell_value("A3", "tail").unwrap();

        sheet.duplicate_row(1).unwrap();

        assert_eq!(column_a(&sheet), vec!["head", "", "", "tail", "", "", "", ""]);
    }

    #[test]
    fn test_duplicate_row_at_limit() {
        let mut sheet = Worksheet::new("Data");
        sheet.set_cell_value_at(MAX_ROWS - 1, 0, "last").unwrap();
        assert!(sheet.duplicate_row(0).is_err());
        // A failed shift leaves the sheet as it was
        assert_eq!(sheet.get_value_at(MAX_ROWS - 1, 0).as_string(), Some("last"));
    }

    #[test]
    fn test_used_range() {
        let mut sheet = Worksheet::new("Data");
        assert!(sheet.used_range().is_none());
        sheet.set_cell_value("B2", 1).unwrap();
        sheet.set_cell_value("D5", 2).unwrap();
        assert_eq!(sheet.used_range().unwrap().to_string(), "B2:D5");
    }

    #[test]
    fn test_copy_contents_keeps_name() {
        let mut src = Worksheet::new("Template");
        src.set_cell_value("A1", "DATA").unwrap();
        let mut dst = Worksheet::new("Macro");
        dst.set_cell_value("C9", "stale").unwrap();

        dst.copy_contents_from(&src);

        assert_eq!(dst.name(), "Macro");
        assert_eq!(dst.get_value("A1").unwrap().as_string(), Some("DATA"));
        assert!(dst.get_value("C9").unwrap().is_empty());
    }
}
