//! SpreadsheetML serialization for the parts the store regenerates

use std::fmt::Write as _;

use dashboard_core::{CellAddress, CellData, CellValue, Row, Worksheet};

use crate::error::{XlsmError, XlsmResult};
use crate::package::{encode_cell_text, escape_xml, split_element};
use crate::reader::{SheetLayout, SheetRef};

/// Render a worksheet part: preserved head, regenerated cells, preserved tail
pub(crate) fn write_worksheet(sheet: &Worksheet, layout: &SheetLayout) -> String {
    let mut xml = String::with_capacity(layout.head.len() + layout.tail.len() + 64);
    xml.push_str(&layout.head);

    if sheet.is_empty() {
        xml.push_str("<sheetData/>");
    } else {
        xml.push_str("<sheetData>");
        for (index, row) in sheet.rows() {
            write_row(&mut xml, index, row);
        }
        xml.push_str("</sheetData>");
    }

    xml.push_str(&layout.tail);
    xml
}

fn write_row(xml: &mut String, index: u32, row: &Row) {
    let props = &row.properties;
    let _ = write!(xml, r#"<row r="{}""#, index + 1);
    if let Some(style) = props.style_index {
        let _ = write!(xml, r#" s="{}" customFormat="1""#, style);
    }
    if let Some(height) = props.height {
        let _ = write!(xml, r#" ht="{}" customHeight="1""#, height);
    }
    if props.hidden {
        xml.push_str(r#" hidden="1""#);
    }

    if row.cells().next().is_none() {
        xml.push_str("/>");
        return;
    }

    xml.push('>');
    for (col, cell) in row.cells() {
        write_cell(xml, CellAddress::new(index, col), cell);
    }
    xml.push_str("</row>");
}

fn write_cell(xml: &mut String, address: CellAddress, cell: &CellData) {
    let _ = write!(xml, r#"<c r="{}""#, address);
    if cell.style_index != 0 {
        let _ = write!(xml, r#" s="{}""#, cell.style_index);
    }

    match &cell.value {
        CellValue::Empty => xml.push_str("/>"),
        CellValue::String(s) => {
            let _ = write!(
                xml,
                r#" t="inlineStr"><is><t xml:space="preserve">{}</t></is></c>"#,
                encode_cell_text(s)
            );
        }
        CellValue::Formula { text, cached_value } => {
            let cached = cached_value.as_deref().map(|v| v.effective_value());
            if let Some(kind) = cached.and_then(type_attribute) {
                let _ = write!(xml, r#" t="{}""#, kind);
            }
            let _ = write!(xml, "><f>{}</f>", escape_xml(text));
            if let Some(v) = cached.and_then(raw_value) {
                let _ = write!(xml, "<v>{}</v>", encode_cell_text(&v));
            }
            xml.push_str("</c>");
        }
        value => {
            if let Some(kind) = type_attribute(value) {
                let _ = write!(xml, r#" t="{}""#, kind);
            }
            let _ = write!(
                xml,
                "><v>{}</v></c>",
                encode_cell_text(&raw_value(value).unwrap_or_default())
            );
        }
    }
}

/// The `t` attribute for a plain `<v>` payload (None = number)
fn type_attribute(value: &CellValue) -> Option<&'static str> {
    match value {
        CellValue::Number(n) if n.is_finite() => None,
        CellValue::Number(_) | CellValue::Error(_) => Some("e"),
        CellValue::Boolean(_) => Some("b"),
        CellValue::String(_) => Some("str"),
        CellValue::Empty | CellValue::Formula { .. } => None,
    }
}

fn raw_value(value: &CellValue) -> Option<String> {
    match value {
        CellValue::Number(n) if n.is_finite() => Some(n.to_string()),
        CellValue::Number(_) => Some("#NUM!".to_string()),
        CellValue::Boolean(b) => Some(if *b { "1" } else { "0" }.to_string()),
        CellValue::String(s) | CellValue::Error(s) => Some(s.clone()),
        CellValue::Empty | CellValue::Formula { .. } => None,
    }
}

/// Rewrite the `<sheets>` element of the workbook part, leaving the rest intact
pub(crate) fn write_workbook_xml(original: &str, sheets: &[SheetRef]) -> XlsmResult<String> {
    let split = split_element(original, "sheets")
        .ok_or_else(|| XlsmError::InvalidFormat("workbook has no <sheets> element".into()))?;

    let mut xml = String::with_capacity(original.len() + sheets.len() * 64);
    xml.push_str(split.head);
    xml.push_str("<sheets>");
    for sheet in sheets {
        let _ = write!(
            xml,
            r#"<sheet name="{}" sheetId="{}""#,
            escape_xml(&sheet.name),
            sheet.sheet_id
        );
        if let Some(state) = &sheet.state {
            let _ = write!(xml, r#" state="{}""#, escape_xml(state));
        }
        let _ = write!(xml, r#" r:id="{}"/>"#, escape_xml(&sheet.rel_id));
    }
    xml.push_str("</sheets>");
    xml.push_str(split.tail);
    Ok(xml)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::read_worksheet;
    use dashboard_core::RowProperties;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_write_worksheet_preserves_layout() {
        let layout = SheetLayout {
            head: r#"<worksheet><cols><col min="1" max="1" width="30"/></cols>"#.into(),
            tail: r#"<pageMargins left="0.7"/></worksheet>"#.into(),
        };
        let mut sheet = Worksheet::new("macro");
        sheet.set_cell_value("A1", "a & b").unwrap();
        sheet.set_cell_value("B1", 2.0).unwrap();
        sheet
            .set_row_properties(
                2,
                RowProperties {
                    hidden: true,
                    ..Default::default()
                },
            )
            .unwrap();

        let xml = write_worksheet(&sheet, &layout);
        assert_eq!(
            xml,
            concat!(
                r#"<worksheet><cols><col min="1" max="1" width="30"/></cols><sheetData>"#,
                r#"<row r="1"><c r="A1" t="inlineStr"><is><t xml:space="preserve">a &amp; b</t></is></c>"#,
                r#"<c r="B1"><v>2</v></c></row><row r="3" hidden="1"/></sheetData>"#,
                r#"<pageMargins left="0.7"/></worksheet>"#
            )
        );
    }

    #[test]
    fn test_write_then_read_back() {
        let mut sheet = Worksheet::new("macro");
        sheet.set_cell_value("A1", "label").unwrap();
        sheet.set_cell_value("B2", true).unwrap();
        sheet
            .set_cell_value(
                "C3",
                CellValue::Formula {
                    text: "B2&\"x\"".into(),
                    cached_value: Some(Box::new(CellValue::String("TRUEx".into()))),
                },
            )
            .unwrap();
        sheet
            .set_cell_at(3, 3, CellData::with_style(CellValue::Empty, 4))
            .unwrap();

        let xml = write_worksheet(&sheet, &SheetLayout::blank());
        let mut reread = Worksheet::new("macro");
        read_worksheet(&xml, &mut reread, &[]).unwrap();

        assert_eq!(reread.get_value("A1").unwrap(), sheet.get_value("A1").unwrap());
        assert_eq!(reread.get_value("B2").unwrap(), CellValue::Boolean(true));
        assert_eq!(reread.get_value("C3").unwrap(), sheet.get_value("C3").unwrap());
        assert_eq!(reread.cell("D4").unwrap().unwrap().style_index, 4);
    }

    #[test]
    fn test_control_characters_are_escaped() {
        let mut sheet = Worksheet::new("macro");
        sheet.set_cell_value("A1", "a\u{1b}b\rc").unwrap();
        sheet.set_cell_value("A2", "_x0041_").unwrap();
        sheet
            .set_cell_value(
                "A3",
                CellValue::Formula {
                    text: "CHAR(13)".into(),
                    cached_value: Some(Box::new(CellValue::String("\r".into()))),
                },
            )
            .unwrap();

        let xml = write_worksheet(&sheet, &SheetLayout::blank());
        assert!(xml.contains("a_x001B_b_x000D_c"), "{xml}");
        assert!(!xml.contains('\u{1b}') && !xml.contains('\r'));

        let mut reread = Worksheet::new("macro");
        read_worksheet(&xml, &mut reread, &[]).unwrap();
        for address in ["A1", "A2", "A3"] {
            assert_eq!(reread.get_value(address).unwrap(), sheet.get_value(address).unwrap());
        }
    }

    #[test]
    fn test_write_workbook_xml() {
        let original = r#"<workbook><workbookPr codeName="ThisWorkbook"/><sheets><sheet name="Old" sheetId="1" r:id="rId1"/></sheets><calcPr calcId="0"/></workbook>"#;
        let sheets = vec![
            SheetRef {
                name: "Data".into(),
                sheet_id: 1,
                rel_id: "rId1".into(),
                state: None,
            },
            SheetRef {
                name: "a&b".into(),
                sheet_id: 3,
                rel_id: "rId9".into(),
                state: Some("hidden".into()),
            },
        ];
        assert_eq!(
            write_workbook_xml(original, &sheets).unwrap(),
            concat!(
                r#"<workbook><workbookPr codeName="ThisWorkbook"/><sheets>"#,
                r#"<sheet name="Data" sheetId="1" r:id="rId1"/>"#,
                r#"<sheet name="a&amp;b" sheetId="3" state="hidden" r:id="rId9"/>"#,
                r#"</sheets><calcPr calcId="0"/></workbook>"#
            )
        );
    }
}
