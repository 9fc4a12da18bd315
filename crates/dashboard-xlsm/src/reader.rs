//! SpreadsheetML parsing: shared strings, the sheet list, worksheet cell data

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use dashboard_core::{CellAddress, CellData, CellValue, RowProperties, Worksheet};

use crate::error::{XlsmError, XlsmResult};
use crate::package::{attr, decode_cell_text, split_element};

/// Markup of a worksheet part surrounding its `<sheetData>` element.
///
/// Column widths, views, merged cells, page setup and drawing references all
/// live here and are written back untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetLayout {
    pub(crate) head: String,
    pub(crate) tail: String,
}

impl SheetLayout {
    /// Layout of a freshly created, empty worksheet
    pub(crate) fn blank() -> Self {
        Self {
            head: concat!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
                "\n",
                r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" "#,
                r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#
            )
            .to_string(),
            tail: "</worksheet>".to_string(),
        }
    }
}

/// A `<sheet>` entry of the workbook part
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SheetRef {
    pub name: String,
    pub sheet_id: u32,
    pub rel_id: String,
    pub state: Option<String>,
}

/// Read the shared string table
pub(crate) fn read_shared_strings(xml: &str) -> XlsmResult<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    let mut strings = Vec::new();
    let mut current = String::new();
    let mut in_si = false;
    let mut in_t = false;
    // Phonetic runs repeat the text and are not part of the value
    let mut in_phonetic = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"si" => {
                    in_si = true;
                    current.clear();
                }
                b"rPh" => in_phonetic = true,
                b"t" if in_si && !in_phonetic => in_t = true,
                _ => {}
            },
            Event::Empty(e) if e.local_name().as_ref() == b"si" => strings.push(String::new()),
            Event::End(e) => match e.local_name().as_ref() {
                b"si" => {
                    strings.push(decode_cell_text(&current));
                    current.clear();
                    in_si = false;
                }
                b"rPh" => in_phonetic = false,
                b"t" => in_t = false,
                _ => {}
            },
            Event::Text(e) if in_t => current.push_str(&e.unescape()?),
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(strings)
}

/// Read the `<sheets>` list of the workbook part, in tab order
pub(crate) fn read_sheet_list(workbook_xml: &str) -> XlsmResult<Vec<SheetRef>> {
    let split = split_element(workbook_xml, "sheets")
        .ok_or_else(|| XlsmError::InvalidFormat("workbook has no <sheets> element".into()))?;

    let mut reader = Reader::from_str(split.inner);
    reader.trim_text(true);
    let mut sheets = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Empty(e) | Event::Start(e) if e.local_name().as_ref() == b"sheet" => {
                let name = attr(&e, b"name")
                    .ok_or_else(|| XlsmError::InvalidFormat("sheet without a name".into()))?;
                let rel_id = relationship_id(&e).ok_or_else(|| {
                    XlsmError::InvalidFormat(format!("sheet '{name}' has no relationship id"))
                })?;
                let sheet_id = attr(&e, b"sheetId")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(sheets.len() as u32 + 1);
                sheets.push(SheetRef {
                    name,
                    sheet_id,
                    rel_id,
                    state: attr(&e, b"state"),
                });
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(sheets)
}

/// The `r:id` attribute, whatever prefix the relationships namespace is bound to
fn relationship_id(e: &BytesStart<'_>) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.prefix().is_some() && a.key.local_name().as_ref() == b"id")
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

/// Cell being assembled while its child elements stream past
struct PendingCell {
    address: CellAddress,
    cell_type: Option<String>,
    style: u32,
    value: Option<String>,
    inline: Option<String>,
    formula: Option<String>,
}

/// Parse a worksheet part into `sheet`, returning the markup around its cells
pub(crate) fn read_worksheet(
    xml: &str,
    sheet: &mut Worksheet,
    shared_strings: &[String],
) -> XlsmResult<SheetLayout> {
    let split = split_element(xml, "sheetData").ok_or_else(|| {
        XlsmError::InvalidFormat(format!("worksheet '{}' has no <sheetData>", sheet.name()))
    })?;

    let mut reader = Reader::from_str(split.inner);
    let mut row: u32 = 0;
    let mut next_row: u32 = 0;
    let mut next_col: u16 = 0;
    let mut cell: Option<PendingCell> = None;
    let mut in_value = false;
    let mut in_formula = false;
    let mut in_inline = false;
    let mut in_inline_text = false;
    let mut in_phonetic = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"row" => {
                    row = start_row(&e, next_row, sheet)?;
                    next_row = row + 1;
                    next_col = 0;
                }
                b"c" => cell = Some(start_cell(&e, row, next_col)?),
                b"v" if cell.is_some() => in_value = true,
                b"f" if cell.is_some() => {
                    in_formula = true;
                    if let Some(c) = cell.as_mut() {
                        c.formula.get_or_insert_with(String::new);
                    }
                }
                b"is" if cell.is_some() => in_inline = true,
                b"rPh" if in_inline => in_phonetic = true,
                b"t" if in_inline && !in_phonetic => in_inline_text = true,
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"row" => {
                    row = start_row(&e, next_row, sheet)?;
                    next_row = row + 1;
                }
                b"c" => {
                    let pending = start_cell(&e, row, next_col)?;
                    next_col = finish_cell(sheet, pending, shared_strings)?;
                }
                // `<f t="shared" si="0"/>` only points at a master formula;
                // the cell keeps its cached value
                _ => {}
            },
            Event::End(e) => match e.local_name().as_ref() {
                b"c" => {
                    if let Some(pending) = cell.take() {
                        next_col = finish_cell(sheet, pending, shared_strings)?;
                    }
                }
                b"v" => in_value = false,
                b"f" => in_formula = false,
                b"is" => in_inline = false,
                b"rPh" => in_phonetic = false,
                b"t" => in_inline_text = false,
                _ => {}
            },
            Event::Text(e) => {
                if let Some(c) = cell.as_mut() {
                    if in_value {
                        c.value.get_or_insert_with(String::new).push_str(&e.unescape()?);
                    } else if in_formula {
                        c.formula.get_or_insert_with(String::new).push_str(&e.unescape()?);
                    } else if in_inline_text {
                        c.inline.get_or_insert_with(String::new).push_str(&e.unescape()?);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(SheetLayout {
        head: split.head.to_string(),
        tail: split.tail.to_string(),
    })
}

fn start_row(e: &BytesStart<'_>, fallback: u32, sheet: &mut Worksheet) -> XlsmResult<u32> {
    let row = match attr(e, b"r") {
        Some(r) => r
            .parse::<u32>()
            .ok()
            .and_then(|r| r.checked_sub(1))
            .ok_or_else(|| XlsmError::Parse(format!("invalid row number '{r}'")))?,
        None => fallback,
    };

    let flag = |key: &[u8]| attr(e, key).is_some_and(|v| v == "1" || v == "true");
    let mut properties = RowProperties::default();
    if flag(b"customHeight") {
        properties.height = attr(e, b"ht").and_then(|v| v.parse().ok());
    }
    properties.hidden = flag(b"hidden");
    if flag(b"customFormat") {
        properties.style_index = attr(e, b"s").and_then(|v| v.parse().ok());
    }
    if properties.has_custom_settings() {
        sheet.set_row_properties(row, properties)?;
    }

    Ok(row)
}

fn start_cell(e: &BytesStart<'_>, row: u32, fallback_col: u16) -> XlsmResult<PendingCell> {
    let address = match attr(e, b"r") {
        Some(r) => CellAddress::parse(&r)?,
        None => CellAddress::new(row, fallback_col),
    };
    Ok(PendingCell {
        address,
        cell_type: attr(e, b"t"),
        style: attr(e, b"s").and_then(|v| v.parse().ok()).unwrap_or(0),
        value: None,
        inline: None,
        formula: None,
    })
}

/// Store the assembled cell and return the column that follows it
fn finish_cell(
    sheet: &mut Worksheet,
    pending: PendingCell,
    shared_strings: &[String],
) -> XlsmResult<u16> {
    let address = pending.address;
    let raw = pending.value.as_deref();
    let value = match (pending.cell_type.as_deref(), raw) {
        (Some("s"), Some(idx)) => {
            let idx: usize = idx
                .trim()
                .parse()
                .map_err(|_| XlsmError::Parse(format!("invalid shared string index '{idx}'")))?;
            let text = shared_strings.get(idx).ok_or_else(|| {
                XlsmError::Parse(format!("shared string {idx} out of range at {address}"))
            })?;
            CellValue::String(text.clone())
        }
        (Some("inlineStr"), _) => {
            CellValue::String(decode_cell_text(pending.inline.as_deref().unwrap_or_default()))
        }
        (Some("str") | Some("d"), Some(v)) => CellValue::String(decode_cell_text(v)),
        (Some("b"), Some(v)) => CellValue::Boolean(v.trim() == "1"),
        (Some("e"), Some(v)) => CellValue::Error(v.to_string()),
        (_, Some(v)) if !v.trim().is_empty() => {
            CellValue::Number(v.trim().parse().map_err(|_| {
                XlsmError::Parse(format!("invalid number '{v}' at {address}"))
            })?)
        }
        _ => CellValue::Empty,
    };

    let value = match pending.formula {
        Some(text) if !text.is_empty() => CellValue::Formula {
            text,
            cached_value: (!value.is_empty()).then(|| Box::new(value)),
        },
        _ => value,
    };

    sheet.set_cell_at(
        address.row,
        address.col,
        CellData::with_style(value, pending.style),
    )?;
    Ok(address.col.saturating_add(1))
}
