//! Workbook type - the ordered collection of worksheets

use crate::error::{Error, Result};
use crate::worksheet::Worksheet;
use crate::MAX_SHEET_NAME_LEN;

/// A workbook (spreadsheet document)
#[derive(Debug, Clone, Default)]
pub struct Workbook {
    /// Worksheets in tab order
    worksheets: Vec<Worksheet>,
}

impl Workbook {
    /// Create an empty workbook with no worksheets
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn sheet_count(&self) -> usize {
        self.worksheets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.worksheets.is_empty()
    }

    pub fn worksheet(&self, index: usize) -> Option<&Worksheet> {
        self.worksheets.get(index)
    }

    pub fn worksheet_mut(&mut self, index: usize) -> Option<&mut Worksheet> {
        self.worksheets.get_mut(index)
    }

    pub fn worksheet_by_name(&self, name: &str) -> Option<&Worksheet> {
        self.worksheets.iter().find(|ws| ws.name() == name)
    }

    pub fn worksheet_by_name_mut(&mut self, name: &str) -> Option<&mut Worksheet> {
        self.worksheets.iter_mut().find(|ws| ws.name() == name)
    }

    /// Get the index of a worksheet by name
    pub fn sheet_index(&self, name: &str) -> Option<usize> {
        self.worksheets.iter().position(|ws| ws.name() == name)
    }

    pub fn worksheets(&self) -> impl Iterator<Item = &Worksheet> {
        self.worksheets.iter()
    }

    /// Append a new worksheet with the given name
    pub fn add_worksheet_with_name(&mut self, name: &str) -> Result<usize> {
        self.validate_sheet_name(name)?;

        let index = self.worksheets.len();
        self.worksheets.push(Worksheet::new(name));
        Ok(index)
    }

    /// Remove a worksheet by index
    pub fn remove_worksheet(&mut self, index: usize) -> Result<Worksheet> {
        if index >= self.worksheets.len() {
            return Err(Error::SheetOutOfBounds(index, self.worksheets.len()));
        }
        Ok(self.worksheets.remove(index))
    }

    /// Overwrite the contents of sheet `to` with those of sheet `from`.
    ///
    /// The destination keeps its name and position.
    pub fn copy_worksheet(&mut self, from: usize, to: usize) -> Result<()> {
        let count = self.worksheets.len();
        if from >= count {
            return Err(Error::SheetOutOfBounds(from, count));
        }
        if to >= count {
            return Err(Error::SheetOutOfBounds(to, count));
        }
        if from == to {
            return Ok(());
        }

        let source = self.worksheets[from].clone();
        self.worksheets[to].copy_contents_from(&source);
        Ok(())
    }

    /// Validate a sheet name the way spreadsheet applications do
    fn validate_sheet_name(&self, name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(Error::InvalidSheetName("Sheet name cannot be empty".into()));
        }
        if name.chars().count() > MAX_SHEET_NAME_LEN {
            return Err(Error::InvalidSheetName(format!(
                "Sheet name too long (max {} characters)",
                MAX_SHEET_NAME_LEN
            )));
        }

        const INVALID_CHARS: &[char] = &[':', '\\', '/', '?', '*', '[', ']'];
        if let Some(c) = name.chars().find(|c| INVALID_CHARS.contains(c)) {
            return Err(Error::InvalidSheetName(format!(
                "Sheet name cannot contain '{}'",
                c
            )));
        }

        // Names are unique ignoring case
        let name_lower = name.to_lowercase();
        if self
            .worksheets
            .iter()
            .any(|ws| ws.name().to_lowercase() == name_lower)
        {
            return Err(Error::DuplicateSheetName(name.into()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_lookup() {
        let mut wb = Workbook::empty();
        assert_eq!(wb.add_worksheet_with_name("Data").unwrap(), 0);
        assert_eq!(wb.add_worksheet_with_name("macro").unwrap(), 1);

        assert_eq!(wb.sheet_index("macro"), Some(1));
        assert_eq!(wb.sheet_index("missing"), None);
        assert!(wb.worksheet_by_name("Data").is_some());
    }

    #[test]
    fn test_duplicate_name_ignores_case() {
        let mut wb = Workbook::empty();
        wb.add_worksheet_with_name("Macro").unwrap();
        assert!(wb.add_worksheet_with_name("MACRO").is_err());
    }

    #[test]
    fn test_invalid_sheet_names() {
        let mut wb = Workbook::empty();
        assert!(wb.add_worksheet_with_name("").is_err());
        assert!(wb.add_worksheet_with_name("a/b").is_err());
        assert!(wb.add_worksheet_with_name("[x]").is_err());
        assert!(wb
            .add_worksheet_with_name(&"A".repeat(MAX_SHEET_NAME_LEN + 1))
            .is_err());
    }

    #[test]
    fn test_remove_and_copy() {
        let mut wb = Workbook::empty();
        wb.add_worksheet_with_name("tmpl").unwrap();
        wb.add_worksheet_with_name("out").unwrap();
        wb.worksheet_mut(0)
            .unwrap()
            .set_cell_value("A1", "DATA")
            .unwrap();

        wb.copy_worksheet(0, 1).unwrap();
        assert_eq!(
            wb.worksheet(1).unwrap().get_value("A1").unwrap().as_string(),
            Some("DATA")
        );
        assert!(wb.copy_worksheet(0, 5).is_err());

        let removed = wb.remove_worksheet(0).unwrap();
        assert_eq!(removed.name(), "tmpl");
        assert_eq!(wb.sheet_index("out"), Some(0));
        assert!(wb.remove_worksheet(3).is_err());
    }
}
