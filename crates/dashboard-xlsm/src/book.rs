//! The editable workbook package

use std::borrow::Cow;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, Write};
use std::path::{Path, PathBuf};

use dashboard_core::{CellValue, Workbook, Worksheet};
use zip::write::SimpleFileOptions;
use zip::CompressionMethod;

use crate::error::{XlsmError, XlsmResult};
use crate::package::{
    part_text, relative_target, rels_path_for, remove_elements, resolve_target, strip_attribute,
    ContentTypes,
    Part, Relationships, CONTENT_TYPES_PART, MACRO_WORKBOOK_CT, OFFICE_DOCUMENT_REL,
    ROOT_RELS_PART, STYLES_CT, STYLES_REL, WORKBOOK_CT, WORKSHEET_CT, WORKSHEET_REL,
};
use crate::reader::{read_shared_strings, read_sheet_list, read_worksheet, SheetLayout, SheetRef};
use crate::writer::{write_workbook_xml, write_worksheet};

/// Worksheet relationship types whose targets cannot be shared between sheets
const SHEET_BOUND_RELS: [&str; 5] = ["drawing", "vmlDrawing", "comments", "threadedComment", "table"];

/// Worksheet elements referencing those relationships
const SHEET_BOUND_ELEMENTS: [&str; 4] = ["drawing", "legacyDrawing", "legacyDrawingHF", "tableParts"];

const BLANK_WORKBOOK_XML: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    "\n",
    r#"<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" "#,
    r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
    r#"<bookViews><workbookView/></bookViews><sheets/></workbook>"#
);

const BLANK_STYLES_XML: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    "\n",
    r#"<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
    r#"<fonts count="1"><font><sz val="11"/><name val="Calibri"/></font></fonts>"#,
    r#"<fills count="2"><fill><patternFill patternType="none"/></fill>"#,
    r#"<fill><patternFill patternType="gray125"/></fill></fills>"#,
    r#"<borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders>"#,
    r#"<cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>"#,
    r#"<cellXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/></cellXfs>"#,
    r#"</styleSheet>"#
);

/// Bookkeeping for one worksheet of the package
#[derive(Debug, Clone)]
struct SheetEntry {
    reference: SheetRef,
    /// Package path of the worksheet part
    part: String,
    layout: SheetLayout,
}

/// A workbook package opened for editing.
///
/// Worksheet cells are parsed into a [`Workbook`]; every other part of the
/// package (VBA project, styles, themes, drawings) is carried as raw bytes
/// and written back unchanged.
///
/// ```rust
/// use dashboard_xlsm::XlsmBook;
///
/// let mut book = XlsmBook::new();
/// book.new_sheet("macro").unwrap();
/// book.set_cell_value("macro", "A1", "DATA").unwrap();
/// assert_eq!(book.cell_value("macro", "A1").unwrap(), "DATA");
/// ```
#[derive(Debug, Clone)]
pub struct XlsmBook {
    path: Option<PathBuf>,
    workbook: Workbook,
    /// Parallel to the workbook's worksheets
    sheets: Vec<SheetEntry>,
    /// Every part of the package in archive order
    parts: Vec<Part>,
    content_types: ContentTypes,
    workbook_part: String,
    workbook_rels: Relationships,
}

impl XlsmBook {
    /// A blank package with no sheets; add one with [`XlsmBook::new_sheet`] before saving
    pub fn new() -> Self {
        let workbook_part = "xl/workbook.xml".to_string();

        let mut root_rels = Relationships::default();
        root_rels.add(OFFICE_DOCUMENT_REL, &workbook_part);
        let mut workbook_rels = Relationships::default();
        workbook_rels.add(STYLES_REL, "styles.xml");

        let mut content_types = ContentTypes::standard();
        content_types.set_override(&workbook_part, WORKBOOK_CT);
        content_types.set_override("xl/styles.xml", STYLES_CT);

        let parts = vec![
            Part {
                name: CONTENT_TYPES_PART.into(),
                data: Vec::new(),
            },
            Part {
                name: ROOT_RELS_PART.into(),
                data: root_rels.to_xml().into_bytes(),
            },
            Part {
                name: workbook_part.clone(),
                data: BLANK_WORKBOOK_XML.as_bytes().to_vec(),
            },
            Part {
                name: rels_path_for(&workbook_part),
                data: Vec::new(),
            },
            Part {
                name: "xl/styles.xml".into(),
                data: BLANK_STYLES_XML.as_bytes().to_vec(),
            },
        ];

        Self {
            path: None,
            workbook: Workbook::empty(),
            sheets: Vec::new(),
            parts,
            content_types,
            workbook_part,
            workbook_rels,
        }
    }

    /// Open a package from disk
    pub fn open<P: AsRef<Path>>(path: P) -> XlsmResult<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let mut book = Self::read(BufReader::new(file))?;
        book.path = Some(path.to_path_buf());
        tracing::debug!(
            "Opened {} ({} sheets, {} parts)",
            path.display(),
            book.sheets.len(),
            book.parts.len()
        );
        Ok(book)
    }

    /// Read a package from any seekable reader
    pub fn read<R: Read + Seek>(reader: R) -> XlsmResult<Self> {
        let mut archive = zip::ZipArchive::new(reader)?;
        let mut parts = Vec::with_capacity(archive.len());

        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            if file.is_dir() {
                continue;
            }
            let mut data = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut data)?;
            parts.push(Part {
                name: file.name().to_string(),
                data,
            });
        }

        Self::from_parts(parts)
    }

    fn from_parts(parts: Vec<Part>) -> XlsmResult<Self> {
        let find = |name: &str| parts.iter().find(|p| p.name.eq_ignore_ascii_case(name));
        let required =
            |name: &str| find(name).ok_or_else(|| XlsmError::MissingPart(name.to_string()));

        let content_types = ContentTypes::parse(part_text(required(CONTENT_TYPES_PART)?)?)?;

        let root_rels = Relationships::parse(part_text(required(ROOT_RELS_PART)?)?)?;
        let workbook_target = root_rels
            .find_type("officeDocument")
            .map(|rel| resolve_target("", &rel.target))
            .ok_or_else(|| XlsmError::InvalidFormat("no officeDocument relationship".into()))?;

        // Part names are matched case-insensitively; keep the spelling stored in the archive
        let workbook_entry = required(&workbook_target)?;
        let workbook_part = workbook_entry.name.clone();
        let workbook_xml = part_text(workbook_entry)?;
        let workbook_rels =
            Relationships::parse(part_text(required(&rels_path_for(&workbook_part))?)?)?;

        let shared_strings = match workbook_rels
            .find_type("sharedStrings")
            .and_then(|rel| find(&resolve_target(&workbook_part, &rel.target)))
        {
            Some(part) => read_shared_strings(part_text(part)?)?,
            None => Vec::new(),
        };

        let mut workbook = Workbook::empty();
        let mut sheets = Vec::new();

        for reference in read_sheet_list(workbook_xml)? {
            let rel = workbook_rels.get(&reference.rel_id).ok_or_else(|| {
                XlsmError::InvalidFormat(format!(
                    "sheet '{}' points at unknown relationship {}",
                    reference.name, reference.rel_id
                ))
            })?;
            if !rel.rel_type.ends_with("/worksheet") {
                return Err(XlsmError::InvalidFormat(format!(
                    "sheet '{}' is not a worksheet ({}); only worksheets are supported",
                    reference.name, rel.rel_type
                )));
            }

            let entry = required(&resolve_target(&workbook_part, &rel.target))?;
            let index = workbook.add_worksheet_with_name(&reference.name)?;
            let sheet = workbook
                .worksheet_mut(index)
                .ok_or_else(|| XlsmError::InvalidFormat(reference.name.clone()))?;
            let layout = read_worksheet(part_text(entry)?, sheet, &shared_strings)?;
            let part = entry.name.clone();

            sheets.push(SheetEntry {
                reference,
                part,
                layout,
            });
        }

        Ok(Self {
            path: None,
            workbook,
            sheets,
            parts,
            content_types,
            workbook_part,
            workbook_rels,
        })
    }

    // ==================== Inspection ====================

    /// The file this book was opened from or last saved to
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn workbook(&self) -> &Workbook {
        &self.workbook
    }

    pub fn worksheet(&self, name: &str) -> Option<&Worksheet> {
        self.workbook.worksheet_by_name(name)
    }

    /// Mutable access to a sheet's cells; sheets themselves are managed by the book
    pub fn worksheet_mut(&mut self, name: &str) -> Option<&mut Worksheet> {
        self.workbook.worksheet_by_name_mut(name)
    }

    pub fn sheet_names(&self) -> impl Iterator<Item = &str> {
        self.workbook.worksheets().map(Worksheet::name)
    }

    pub fn sheet_index(&self, name: &str) -> Option<usize> {
        self.workbook.sheet_index(name)
    }

    /// Raw bytes of a package part as they will be written
    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.find_part(name).map(|p| p.data.as_slice())
    }

    /// Whether the workbook part is declared macro-enabled
    pub fn is_macro_enabled(&self) -> bool {
        self.content_types.override_for(&self.workbook_part) == Some(MACRO_WORKBOOK_CT)
    }

    // ==================== Sheet management ====================

    /// Append an empty worksheet and return its index
    pub fn new_sheet(&mut self, name: &str) -> XlsmResult<usize> {
        let index = self.workbook.add_worksheet_with_name(name)?;

        let part = self.next_worksheet_part();
        let rel_id = self
            .workbook_rels
            .add(WORKSHEET_REL, &relative_target(&self.workbook_part, &part));
        let sheet_id = self
            .sheets
            .iter()
            .map(|s| s.reference.sheet_id)
            .max()
            .unwrap_or(0)
            + 1;

        self.content_types.set_override(&part, WORKSHEET_CT);
        self.parts.push(Part {
            name: part.clone(),
            data: Vec::new(),
        });
        self.sheets.push(SheetEntry {
            reference: SheetRef {
                name: name.to_string(),
                sheet_id,
                rel_id,
                state: None,
            },
            part,
            layout: SheetLayout::blank(),
        });

        tracing::debug!("Created sheet '{}' at index {}", name, index);
        Ok(index)
    }

    /// Remove a worksheet and the parts that belong to it.
    ///
    /// Returns `false` when no sheet has that name. The calculation chain is
    /// dropped because it may reference the removed sheet; the spreadsheet
    /// application rebuilds it on load.
    pub fn delete_sheet(&mut self, name: &str) -> XlsmResult<bool> {
        let Some(index) = self.workbook.sheet_index(name) else {
            return Ok(false);
        };

        self.workbook.remove_worksheet(index)?;
        let entry = self.sheets.remove(index);

        self.workbook_rels.remove(&entry.reference.rel_id);
        self.content_types.remove_override(&entry.part);
        let sheet_rels = rels_path_for(&entry.part);
        self.parts
            .retain(|p| p.name != entry.part && p.name != sheet_rels);

        if let Some(rel) = self.workbook_rels.find_type("calcChain").cloned() {
            let chain = resolve_target(&self.workbook_part, &rel.target);
            self.workbook_rels.remove(&rel.id);
            self.content_types.remove_override(&chain);
            self.parts.retain(|p| p.name != chain);
        }

        tracing::debug!("Deleted sheet '{}'", name);
        Ok(true)
    }

    /// Replace everything in sheet `to` with the contents of sheet `from`.
    ///
    /// Cells, row properties, the markup around the cells and the sheet's own
    /// relationships are copied. The copy does not inherit the source's VBA
    /// code name or its selected-tab flag. Drawings, comments and tables belong
    /// to a single sheet, so they stay with the source and their references are
    /// left out of the copy.
    pub fn copy_sheet(&mut self, from: usize, to: usize) -> XlsmResult<()> {
        self.workbook.copy_worksheet(from, to)?;
        if from == to {
            return Ok(());
        }

        let source = &self.sheets[from];
        let mut head = strip_attribute(&strip_attribute(&source.layout.head, "codeName"), "tabSelected");
        let mut tail = source.layout.tail.clone();
        for tag in SHEET_BOUND_ELEMENTS {
            head = remove_elements(&head, tag);
            tail = remove_elements(&tail, tag);
        }

        let source_rels = match self.find_part(&rels_path_for(&source.part)) {
            Some(part) => {
                let mut rels = Relationships::parse(part_text(part)?)?;
                let dropped = rels.retain(|r| {
                    let kind = r.rel_type.rsplit('/').next().unwrap_or_default();
                    !SHEET_BOUND_RELS.contains(&kind)
                });
                if !dropped.is_empty() {
                    tracing::debug!("Left {} sheet-bound relationships out of the copy", dropped.len());
                }
                (!rels.is_empty()).then(|| rels.to_xml().into_bytes())
            }
            None => None,
        };

        let target_rels = rels_path_for(&self.sheets[to].part);
        self.sheets[to].layout = SheetLayout { head, tail };
        self.parts.retain(|p| p.name != target_rels);
        if let Some(data) = source_rels {
            self.parts.push(Part {
                name: target_rels,
                data,
            });
        }

        tracing::debug!("Copied sheet {} into sheet {}", from, to);
        Ok(())
    }

    // ==================== Cells ====================

    /// Display text of a cell (empty for blank cells)
    pub fn cell_value(&self, sheet: &str, address: &str) -> XlsmResult<String> {
        let ws = self
            .workbook
            .worksheet_by_name(sheet)
            .ok_or_else(|| dashboard_core::Error::SheetNotFound(sheet.to_string()))?;
        Ok(ws.get_value(address)?.to_display_string())
    }

    pub fn set_cell_value<V: Into<CellValue>>(
        &mut self,
        sheet: &str,
        address: &str,
        value: V,
    ) -> XlsmResult<()> {
        self.sheet_mut(sheet)?.set_cell_value(address, value)?;
        Ok(())
    }

    /// Insert a copy of 1-based `row` directly beneath it, shifting later rows down
    pub fn duplicate_row(&mut self, sheet: &str, row: u32) -> XlsmResult<()> {
        let index = row
            .checked_sub(1)
            .ok_or_else(|| dashboard_core::Error::InvalidAddress("row 0".into()))?;
        self.sheet_mut(sheet)?.duplicate_row(index)?;
        Ok(())
    }

    fn sheet_mut(&mut self, sheet: &str) -> XlsmResult<&mut Worksheet> {
        Ok(self
            .workbook
            .worksheet_by_name_mut(sheet)
            .ok_or_else(|| dashboard_core::Error::SheetNotFound(sheet.to_string()))?)
    }

    // ==================== Persistence ====================

    /// Write back to the file the book was opened from or last saved to
    pub fn save(&mut self) -> XlsmResult<()> {
        let path = self.path.clone().ok_or(XlsmError::NoPath)?;
        self.write_file(&path)?;
        tracing::info!("Saved workbook to {}", path.display());
        Ok(())
    }

    /// Write to `path` and make it the book's file.
    ///
    /// The workbook part is declared macro-enabled for `.xlsm` targets and
    /// standard for `.xlsx` targets.
    pub fn save_as<P: AsRef<Path>>(&mut self, path: P) -> XlsmResult<()> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("xlsm") => self
                .content_types
                .set_override(&self.workbook_part, MACRO_WORKBOOK_CT),
            Some("xlsx") => self
                .content_types
                .set_override(&self.workbook_part, WORKBOOK_CT),
            _ => {}
        }

        self.write_file(path)?;
        self.path = Some(path.to_path_buf());
        tracing::info!("Saved workbook as {}", path.display());
        Ok(())
    }

    /// Write through a temporary file in the target directory, then rename over the target
    fn write_file(&self, path: &Path) -> XlsmResult<()> {
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        {
            let mut out = BufWriter::new(tmp.as_file_mut());
            self.write(&mut out)?;
            out.flush()?;
        }
        tmp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }

    /// Serialize the package
    pub fn write<W: Write + Seek>(&self, writer: W) -> XlsmResult<()> {
        let mut zip = zip::ZipWriter::new(writer);
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        let workbook_rels_part = rels_path_for(&self.workbook_part);
        let references: Vec<SheetRef> = self.sheets.iter().map(|s| s.reference.clone()).collect();

        for part in &self.parts {
            let data: Cow<'_, [u8]> = if part.name == CONTENT_TYPES_PART {
                self.content_types.to_xml().into_bytes().into()
            } else if part.name == self.workbook_part {
                write_workbook_xml(part_text(part)?, &references)?
                    .into_bytes()
                    .into()
            } else if part.name == workbook_rels_part {
                self.workbook_rels.to_xml().into_bytes().into()
            } else if let Some(index) = self.sheets.iter().position(|s| s.part == part.name) {
                let sheet = self
                    .workbook
                    .worksheet(index)
                    .ok_or_else(|| XlsmError::InvalidFormat(part.name.clone()))?;
                write_worksheet(sheet, &self.sheets[index].layout)
                    .into_bytes()
                    .into()
            } else {
                Cow::Borrowed(part.data.as_slice())
            };

            zip.start_file(part.name.as_str(), options)?;
            zip.write_all(&data)?;
        }

        zip.finish()?;
        Ok(())
    }

    fn find_part(&self, name: &str) -> Option<&Part> {
        self.parts.iter().find(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// First free `worksheets/sheetN.xml` next to the workbook part
    fn next_worksheet_part(&self) -> String {
        let dir = match self.workbook_part.rfind('/') {
            Some(idx) => &self.workbook_part[..=idx],
            None => "",
        };
        let mut n = self.sheets.len() + 1;
        loop {
            let candidate = format!("{dir}worksheets/sheet{n}.xml");
            if self.find_part(&candidate).is_none() {
                return candidate;
            }
            n += 1;
        }
    }
}

impl Default for XlsmBook {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    fn roundtrip(book: &XlsmBook) -> XlsmBook {
        let mut buf = Vec::new();
        book.write(Cursor::new(&mut buf)).unwrap();
        XlsmBook::read(Cursor::new(&buf)).unwrap()
    }

    #[test]
    fn test_new_sheet_roundtrip() {
        let mut book = XlsmBook::new();
        assert_eq!(book.new_sheet("Data").unwrap(), 0);
        assert_eq!(book.new_sheet("macro").unwrap(), 1);
        book.set_cell_value("macro", "B7", "TOTAL").unwrap();
        book.set_cell_value("Data", "A1", 12.0).unwrap();

        let reread = roundtrip(&book);
        assert_eq!(reread.sheet_names().collect::<Vec<_>>(), vec!["Data", "macro"]);
        assert_eq!(reread.cell_value("macro", "B7").unwrap(), "TOTAL");
        assert_eq!(reread.cell_value("Data", "A1").unwrap(), "12");
        assert_eq!(reread.cell_value("Data", "C3").unwrap(), "");
    }

    #[test]
    fn test_delete_then_recreate_reuses_nothing_stale() {
        let mut book = XlsmBook::new();
        book.new_sheet("tmpl").unwrap();
        book.new_sheet("macro").unwrap();
        book.set_cell_value("macro", "A1", "old").unwrap();

        assert!(book.delete_sheet("macro").unwrap());
        assert!(!book.delete_sheet("macro").unwrap());
        assert!(book.part("xl/worksheets/sheet2.xml").is_none());

        let index = book.new_sheet("macro").unwrap();
        assert_eq!(index, 1);
        let reread = roundtrip(&book);
        assert_eq!(reread.cell_value("macro", "A1").unwrap(), "");
        assert_eq!(reread.sheet_index("macro"), Some(1));
    }

    #[test]
    fn test_copy_sheet_copies_cells_and_layout() {
        let mut book = XlsmBook::new();
        book.new_sheet("tmpl").unwrap();
        book.new_sheet("macro").unwrap();
        book.set_cell_value("tmpl", "A3", "DATA").unwrap();
        book.sheets[0].layout.head.push_str(r#"<sheetPr codeName="Sheet1"/><cols><col min="1" max="1" width="40"/></cols>"#);

        book.copy_sheet(0, 1).unwrap();

        assert_eq!(book.cell_value("macro", "A3").unwrap(), "DATA");
        let head = &book.sheets[1].layout.head;
        assert!(head.contains(r#"width="40""#));
        assert!(!head.contains("codeName"));
        assert!(book.copy_sheet(0, 9).is_err());
    }

    #[test]
    fn test_copy_sheet_leaves_drawings_with_source() {
        let mut book = XlsmBook::new();
        book.new_sheet("tmpl").unwrap();
        book.new_sheet("macro").unwrap();
        book.sheets[0].layout.tail = format!(
            r#"<hyperlinks><hyperlink ref="A1" r:id="rId1"/></hyperlinks><drawing r:id="rId2"/><legacyDrawing r:id="rId3"/>{}"#,
            book.sheets[0].layout.tail
        );
        let source_rels = rels_path_for(&book.sheets[0].part);
        book.parts.push(Part {
            name: source_rels.clone(),
            data: concat!(
                r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
                r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink" Target="https://example.com/" TargetMode="External"/>"#,
                r#"<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/drawing" Target="../drawings/drawing1.xml"/>"#,
                r#"<Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/vmlDrawing" Target="../drawings/vmlDrawing1.vml"/>"#,
                r#"</Relationships>"#
            )
            .as_bytes()
            .to_vec(),
        });

        book.copy_sheet(0, 1).unwrap();

        let tail = &book.sheets[1].layout.tail;
        assert!(tail.contains("<hyperlink "));
        assert!(!tail.contains("<drawing") && !tail.contains("<legacyDrawing"));

        let copied = book.find_part(&rels_path_for(&book.sheets[1].part)).unwrap();
        let rels = Relationships::parse(part_text(copied).unwrap()).unwrap();
        assert!(rels.get("rId1").is_some());
        assert!(rels.find_type("drawing").is_none());
        assert!(rels.find_type("vmlDrawing").is_none());

        // The template keeps its own drawing
        assert!(book.sheets[0].layout.tail.contains("<drawing"));
        let original = Relationships::parse(part_text(book.find_part(&source_rels).unwrap()).unwrap()).unwrap();
        assert!(original.find_type("drawing").is_some());
    }

    #[test]
    fn test_duplicate_row_is_one_based() {
        let mut book = XlsmBook::new();
        book.new_sheet("s").unwrap();
        book.set_cell_value("s", "A1", "a").unwrap();
        book.set_cell_value("s", "A2", "b").unwrap();

        book.duplicate_row("s", 1).unwrap();

        assert_eq!(book.cell_value("s", "A2").unwrap(), "a");
        assert_eq!(book.cell_value("s", "A3").unwrap(), "b");
        assert!(book.duplicate_row("s", 0).is_err());
        assert!(book.duplicate_row("missing", 1).is_err());
    }

    #[test]
    fn test_save_requires_path() {
        let mut book = XlsmBook::new();
        assert!(matches!(book.save(), Err(XlsmError::NoPath)));
    }

    #[test]
    fn test_save_as_sets_macro_content_type() {
        let dir = tempfile::tempdir().unwrap();
        let mut book = XlsmBook::new();
        book.new_sheet("Sheet1").unwrap();
        assert!(!book.is_macro_enabled());

        let path = dir.path().join("out.xlsm");
        book.save_as(&path).unwrap();
        assert!(book.is_macro_enabled());
        assert_eq!(book.path(), Some(path.as_path()));

        let reopened = XlsmBook::open(&path).unwrap();
        assert!(reopened.is_macro_enabled());
    }
}
