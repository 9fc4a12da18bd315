//! Builds a dashboard workbook from its template sheet

use std::fmt::Write as _;
use std::ops::Range;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};
use dashboard_xlsm::XlsmBook;
use tracing::{debug, info};

use crate::account::Account;
use crate::component::{Component, DataComponent};
use crate::config::{Config, ConfigError};
use crate::error::{DashboardError, Result};
use crate::store::WorkbookStore;

/// Columns searched for anchors: A through D
pub const ANCHOR_COLUMNS: Range<u32> = 1..5;

/// Highest exclusive column bound [`locate_row`] accepts (one past `Z`)
const COLUMN_LIMIT: u32 = 27;

/// Letter of the column `offset` places right of `A`
pub fn column_letter(offset: usize) -> Result<char> {
    match u8::try_from(offset) {
        Ok(n) if n < 26 => Ok(char::from(b'A' + n)),
        _ => Err(DashboardError::UnsupportedColumn(
            u32::try_from(offset).map_or(u32::MAX, |n| n.saturating_add(1)),
        )),
    }
}

/// Find the row of the first cell whose text equals `label`.
///
/// Columns are scanned outer and rows inner, both ascending with exclusive
/// ends. Columns are 1-based (`1` is `A`) and must stay within `A..=Z`.
pub fn locate_row<S: WorkbookStore>(
    store: &S,
    sheet: &str,
    label: &str,
    rows: Range<u32>,
    cols: Range<u32>,
) -> Result<u32> {
    if cols.start == 0 {
        return Err(DashboardError::UnsupportedColumn(0));
    }
    if cols.end > COLUMN_LIMIT {
        return Err(DashboardError::UnsupportedColumn(cols.end - 1));
    }

    for col in cols {
        let letter = column_letter((col - 1) as usize)?;
        for row in rows.start.max(1)..rows.end {
            let address = format!("{letter}{row}");
            let value = store
                .cell_value(sheet, &address)
                .map_err(|e| DashboardError::store(format!("read {sheet}!{address}"), e))?;
            if value == label {
                debug!("Found '{}' at {}!{}", label, sheet, address);
                return Ok(row);
            }
        }
    }

    Err(DashboardError::AnchorNotFound {
        label: label.to_string(),
        sheet: sheet.to_string(),
    })
}

/// Write a component's rows beneath its anchor, one inserted row per data row.
///
/// `inserted_above` is the number of rows earlier components have already
/// inserted into the sheet; the anchor search window grows by that much so
/// anchors pushed down by them are still found. Returns the number of rows
/// written.
pub fn render_sheet<S, C>(
    store: &mut S,
    config: &Config,
    sheet: &str,
    component: &C,
    inserted_above: usize,
) -> Result<usize>
where
    S: WorkbookStore,
    C: DataComponent + ?Sized,
{
    let label = component.label(config);
    let window_end = u32::try_from(component.len().saturating_add(inserted_above))
        .unwrap_or(u32::MAX)
        .saturating_add(config.search_margin);
    let anchor = locate_row(store, sheet, label, 1..window_end, ANCHOR_COLUMNS)?;

    let mut cursor = anchor;
    let mut written = 0;
    for row in component.rows()? {
        cursor += 1;
        store
            .duplicate_row(sheet, cursor)
            .map_err(|e| DashboardError::store(format!("duplicate row {cursor} of {sheet}"), e))?;

        for (offset, value) in row.iter().enumerate() {
            let address = format!("{}{}", column_letter(offset)?, cursor);
            store
                .set_cell_value(sheet, &address, value)
                .map_err(|e| DashboardError::store(format!("write {sheet}!{address}"), e))?;
        }
        written += 1;
    }

    info!(
        "Rendered {} rows of {} below '{}' (row {})",
        written,
        component.name(),
        label,
        anchor
    );
    Ok(written)
}

/// `<dir>/<stem>-<timestamp>.<extension>` next to `path`
pub fn timestamped_path(path: &Path, config: &Config, now: NaiveDateTime) -> Result<PathBuf> {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default();

    let mut stamp = String::new();
    write!(stamp, "{}", now.format(&config.time_format)).map_err(|_| {
        ConfigError::Invalid(format!(
            "time_format '{}' is not a valid strftime pattern",
            config.time_format
        ))
    })?;

    Ok(path.with_file_name(format!("{stem}-{stamp}.{}", config.output_extension)))
}

/// Build a dashboard from the macro-enabled workbook at `path`.
///
/// The source is left untouched; the result is written to a timestamped copy
/// whose path is returned.
pub fn build(path: &Path, config: &Config, account: &Account) -> Result<PathBuf> {
    build_with::<XlsmBook>(path, config, account)
}

/// [`build`] against any [`WorkbookStore`]
pub fn build_with<S: WorkbookStore>(path: &Path, config: &Config, account: &Account) -> Result<PathBuf> {
    let mut book = S::open(path)
        .map_err(|e| DashboardError::store(format!("open {}", path.display()), e))?;
    info!("Opened {}", path.display());

    let mut components = Component::all();
    for component in &mut components {
        component.load(config, account)?;
        component.finalize()?;
        info!("Loaded {} rows for {}", component.len(), component.name());
    }

    let output = timestamped_path(path, config, Local::now().naive_local())?;
    book.save_as(&output)
        .map_err(|e| DashboardError::store(format!("save {}", output.display()), e))?;
    drop(book);

    let mut book = S::open(&output)
        .map_err(|e| DashboardError::store(format!("open {}", output.display()), e))?;

    let sheet = config.macro_sheet.as_str();
    if book
        .delete_sheet(sheet)
        .map_err(|e| DashboardError::store(format!("delete sheet {sheet}"), e))?
    {
        debug!("Deleted previous '{}' sheet", sheet);
    }

    let target = book
        .new_sheet(sheet)
        .map_err(|e| DashboardError::store(format!("create sheet {sheet}"), e))?;
    let template = book
        .sheet_index(&config.macro_template_sheet)
        .ok_or_else(|| DashboardError::MissingTemplate(config.macro_template_sheet.clone()))?;
    book.copy_sheet(template, target).map_err(|e| {
        DashboardError::store(
            format!("copy sheet {} to {sheet}", config.macro_template_sheet),
            e,
        )
    })?;

    let mut inserted = 0;
    for component in &components {
        inserted += render_sheet(&mut book, config, sheet, component, inserted)?;
    }

    book.save()
        .map_err(|e| DashboardError::store(format!("save {}", output.display()), e))?;
    info!("Built {}", output.display());
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{ComponentIter, Dataset, Row};
    use dashboard_core::CellValue;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    /// Rows supplied directly by the test
    struct StaticRows {
        data: Dataset,
    }

    impl StaticRows {
        fn new(rows: Vec<Row>) -> Self {
            let mut data = Dataset::default();
            data.fill("static", rows).unwrap();
            data.freeze("static", |_| {}).unwrap();
            Self { data }
        }
    }

    impl DataComponent for StaticRows {
        fn name(&self) -> &'static str {
            "static"
        }

        fn load(&mut self, _: &Config, _: &Account) -> Result<()> {
            Ok(())
        }

        fn finalize(&mut self) -> Result<()> {
            Ok(())
        }

        fn len(&self) -> usize {
            self.data.len()
        }

        fn label<'c>(&self, config: &'c Config) -> &'c str {
            &config.commands.label
        }

        fn rows(&self) -> Result<ComponentIter<'_>> {
            self.data.iter("static")
        }
    }

    fn sheet_with(cells: &[(&str, &str)]) -> XlsmBook {
        let mut book = XlsmBook::new();
        book.new_sheet("macro").unwrap();
        for (address, value) in cells {
            book.set_cell_value("macro", address, *value).unwrap();
        }
        book
    }

    #[test]
    fn test_locate_row_finds_label() {
        let book = sheet_with(&[("B7", "TOTAL")]);
        assert_eq!(locate_row(&book, "macro", "TOTAL", 1..15, 1..5).unwrap(), 7);
    }

    #[test]
    fn test_locate_row_prefers_earlier_column() {
        let book = sheet_with(&[("B2", "X"), ("A9", "X")]);
        assert_eq!(locate_row(&book, "macro", "X", 1..15, 1..5).unwrap(), 9);
    }

    #[test]
    fn test_locate_row_window_is_exclusive() {
        let book = sheet_with(&[("A15", "TOTAL"), ("E1", "TOTAL")]);
        let err = locate_row(&book, "macro", "TOTAL", 1..15, 1..5).unwrap_err();
        assert!(matches!(
            err,
            DashboardError::AnchorNotFound { ref label, .. } if label == "TOTAL"
        ));
    }

    #[test]
    fn test_locate_row_compares_display_text() {
        let mut book = sheet_with(&[]);
        book.set_cell_value("macro", "C4", 42.0).unwrap();
        assert_eq!(locate_row(&book, "macro", "42", 1..10, 1..5).unwrap(), 4);
    }

    #[test]
    fn test_locate_row_rejects_columns_past_z() {
        let book = sheet_with(&[("A1", "TOTAL")]);
        assert!(matches!(
            locate_row(&book, "macro", "TOTAL", 1..15, 1..28),
            Err(DashboardError::UnsupportedColumn(27))
        ));
        assert!(matches!(
            locate_row(&book, "macro", "TOTAL", 1..15, 0..5),
            Err(DashboardError::UnsupportedColumn(0))
        ));
        assert_eq!(locate_row(&book, "macro", "TOTAL", 1..15, 1..27).unwrap(), 1);
    }

    #[test]
    fn test_locate_row_missing_sheet() {
        let book = sheet_with(&[]);
        assert!(matches!(
            locate_row(&book, "nope", "TOTAL", 1..3, 1..2),
            Err(DashboardError::Store { .. })
        ));
    }

    #[test]
    fn test_column_letter() {
        assert_eq!(column_letter(0).unwrap(), 'A');
        assert_eq!(column_letter(25).unwrap(), 'Z');
        assert!(matches!(column_letter(26), Err(DashboardError::UnsupportedColumn(27))));
    }

    #[test]
    fn test_render_sheet_inserts_rows_below_anchor() {
        let mut book = sheet_with(&[("A3", "Commands"), ("A4", "footer"), ("B6", "end")]);
        let component = StaticRows::new(vec![
            vec![CellValue::from("x"), CellValue::from(1.0)],
            vec![CellValue::from("y"), CellValue::from(2.0)],
        ]);

        let written = render_sheet(&mut book, &Config::default(), "macro", &component, 0).unwrap();
        assert_eq!(written, 2);

        let cell = |address: &str| book.cell_value("macro", address).unwrap();
        assert_eq!(cell("A3"), "Commands");
        assert_eq!((cell("A4"), cell("B4")), ("x".to_string(), "1".to_string()));
        assert_eq!((cell("A5"), cell("B5")), ("y".to_string(), "2".to_string()));
        assert_eq!(cell("A6"), "footer");
        assert_eq!(cell("B8"), "end");
    }

    #[test]
    fn test_render_empty_dataset_leaves_sheet_unchanged() {
        let mut book = sheet_with(&[("A3", "Commands"), ("A4", "footer")]);
        let before = book.worksheet("macro").unwrap().clone();

        let written =
            render_sheet(&mut book, &Config::default(), "macro", &StaticRows::new(Vec::new()), 0)
                .unwrap();

        assert_eq!(written, 0);
        let after = book.worksheet("macro").unwrap();
        assert_eq!(
            after.iter_cells().map(|(r, c, d)| (r, c, d.value.clone())).collect::<Vec<_>>(),
            before.iter_cells().map(|(r, c, d)| (r, c, d.value.clone())).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_render_sheet_without_anchor() {
        let mut book = sheet_with(&[("A3", "Other")]);
        let component = StaticRows::new(vec![vec![CellValue::from("x")]]);
        assert!(matches!(
            render_sheet(&mut book, &Config::default(), "macro", &component, 0),
            Err(DashboardError::AnchorNotFound { .. })
        ));
    }

    #[test]
    fn test_render_window_grows_with_component() {
        let mut config = Config::default();
        config.search_margin = 2;
        let mut book = sheet_with(&[("D4", "Commands")]);

        // window is rows 1..(1 + 2), too short for row 4
        let one = StaticRows::new(vec![vec![CellValue::from("a")]]);
        assert!(render_sheet(&mut book, &config, "macro", &one, 0).is_err());

        let three = StaticRows::new(vec![vec![CellValue::from("a")]; 3]);
        assert_eq!(render_sheet(&mut book, &config, "macro", &three, 0).unwrap(), 3);
        assert_eq!(book.cell_value("macro", "A7").unwrap(), "a");
    }

    #[test]
    fn test_render_window_counts_rows_inserted_above() {
        let mut config = Config::default();
        config.search_margin = 5;
        let mut book = sheet_with(&[("A2", "Commands"), ("A4", "TTL codes")]);

        let commands = StaticRows::new(vec![vec![CellValue::from("cmd")]; 6]);
        let written = render_sheet(&mut book, &config, "macro", &commands, 0).unwrap();
        assert_eq!(book.cell_value("macro", "A10").unwrap(), "TTL codes");

        // StaticRows anchors on the commands label; point it at the pushed-down one
        config.commands.label = "TTL codes".to_string();
        let ttl = StaticRows::new(vec![vec![CellValue::from("macro")]]);
        // a one-row component alone would only search rows 1..6
        assert!(render_sheet(&mut book.clone(), &config, "macro", &ttl, 0).is_err());
        assert_eq!(render_sheet(&mut book, &config, "macro", &ttl, written).unwrap(), 1);
        assert_eq!(book.cell_value("macro", "A11").unwrap(), "macro");
    }

    #[test]
    fn test_timestamped_path() {
        let now = chrono::NaiveDate::from_ymd_opt(2024, 3, 9)
            .and_then(|d| d.and_hms_opt(14, 5, 6))
            .unwrap();
        let path = timestamped_path(Path::new("/data/board.xlsx"), &Config::default(), now).unwrap();
        assert_eq!(path, PathBuf::from("/data/board-20240309140506.xlsm"));

        let mut config = Config::default();
        config.time_format = "%Y-%m-%d".into();
        config.output_extension = "xlsx".into();
        let path = timestamped_path(Path::new("board.xlsm"), &config, now).unwrap();
        assert_eq!(path, PathBuf::from("board-2024-03-09.xlsx"));
    }

    proptest! {
        #[test]
        fn prop_locate_row_finds_single_label(row in 1u32..30, col in 1u32..5, margin in 0u32..20) {
            let mut book = sheet_with(&[]);
            let address = format!("{}{}", column_letter((col - 1) as usize).unwrap(), row);
            book.set_cell_value("macro", &address, "ANCHOR").unwrap();

            let end = 30 + margin;
            prop_assert_eq!(locate_row(&book, "macro", "ANCHOR", 1..end, 1..5).unwrap(), row);
            prop_assert!(locate_row(&book, "macro", "ANCHOR", 1..row, 1..5).is_err());
        }
    }
}
