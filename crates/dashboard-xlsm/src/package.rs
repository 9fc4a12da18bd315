//! Open Packaging Convention plumbing: parts, relationships, content types

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::{XlsmError, XlsmResult};

pub(crate) const CONTENT_TYPES_PART: &str = "[Content_Types].xml";
pub(crate) const ROOT_RELS_PART: &str = "_rels/.rels";

pub(crate) const OFFICE_DOCUMENT_REL: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
pub(crate) const WORKSHEET_REL: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet";
pub(crate) const STYLES_REL: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";

pub(crate) const WORKSHEET_CT: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml";
pub(crate) const STYLES_CT: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml";
pub(crate) const WORKBOOK_CT: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml";
pub(crate) const MACRO_WORKBOOK_CT: &str = "application/vnd.ms-excel.sheet.macroEnabled.main+xml";

/// A raw file inside the package
#[derive(Debug, Clone)]
pub(crate) struct Part {
    pub name: String,
    pub data: Vec<u8>,
}

/// One `<Relationship>` entry
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Relationship {
    pub id: String,
    pub rel_type: String,
    pub target: String,
    pub target_mode: Option<String>,
}

/// The contents of a `.rels` part
#[derive(Debug, Clone, Default)]
pub(crate) struct Relationships {
    items: Vec<Relationship>,
}

impl Relationships {
    pub fn parse(xml: &str) -> XlsmResult<Self> {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);
        let mut items = Vec::new();

        loop {
            match reader.read_event()? {
                Event::Empty(e) | Event::Start(e) if e.local_name().as_ref() == b"Relationship" => {
                    let id = attr(&e, b"Id");
                    let rel_type = attr(&e, b"Type");
                    let target = attr(&e, b"Target");
                    if let (Some(id), Some(rel_type), Some(target)) = (id, rel_type, target) {
                        items.push(Relationship {
                            id,
                            rel_type,
                            target,
                            target_mode: attr(&e, b"TargetMode"),
                        });
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        Ok(Self { items })
    }

    pub fn get(&self, id: &str) -> Option<&Relationship> {
        self.items.iter().find(|r| r.id == id)
    }

    /// First relationship whose type ends with `/suffix`
    pub fn find_type(&self, suffix: &str) -> Option<&Relationship> {
        self.items
            .iter()
            .find(|r| r.rel_type.rsplit('/').next() == Some(suffix))
    }

    pub fn remove(&mut self, id: &str) -> Option<Relationship> {
        let pos = self.items.iter().position(|r| r.id == id)?;
        Some(self.items.remove(pos))
    }

    /// Keep only the relationships `keep` accepts, returning the ids dropped
    pub fn retain<F: FnMut(&Relationship) -> bool>(&mut self, mut keep: F) -> Vec<String> {
        let mut dropped = Vec::new();
        self.items.retain(|r| {
            let kept = keep(r);
            if !kept {
                dropped.push(r.id.clone());
            }
            kept
        });
        dropped
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Add an internal relationship and return its freshly allocated id
    pub fn add(&mut self, rel_type: &str, target: &str) -> String {
        let next = self
            .items
            .iter()
            .filter_map(|r| r.id.strip_prefix("rId"))
            .filter_map(|n| n.parse::<u32>().ok())
            .max()
            .unwrap_or(0)
            + 1;
        let id = format!("rId{next}");
        self.items.push(Relationship {
            id: id.clone(),
            rel_type: rel_type.to_string(),
            target: target.to_string(),
            target_mode: None,
        });
        id
    }

    pub fn to_xml(&self) -> String {
        let mut xml = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        );
        for rel in &self.items {
            xml.push_str(&format!(
                r#"<Relationship Id="{}" Type="{}" Target="{}""#,
                escape_xml(&rel.id),
                escape_xml(&rel.rel_type),
                escape_xml(&rel.target)
            ));
            if let Some(mode) = &rel.target_mode {
                xml.push_str(&format!(r#" TargetMode="{}""#, escape_xml(mode)));
            }
            xml.push_str("/>");
        }
        xml.push_str("</Relationships>");
        xml
    }
}

/// The contents of `[Content_Types].xml`
#[derive(Debug, Clone, Default)]
pub(crate) struct ContentTypes {
    defaults: Vec<(String, String)>,
    overrides: Vec<(String, String)>,
}

impl ContentTypes {
    pub fn parse(xml: &str) -> XlsmResult<Self> {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);
        let mut types = Self::default();

        loop {
            match reader.read_event()? {
                Event::Empty(e) | Event::Start(e) => match e.local_name().as_ref() {
                    b"Default" => {
                        if let (Some(ext), Some(ct)) = (attr(&e, b"Extension"), attr(&e, b"ContentType")) {
                            types.defaults.push((ext, ct));
                        }
                    }
                    b"Override" => {
                        if let (Some(part), Some(ct)) = (attr(&e, b"PartName"), attr(&e, b"ContentType")) {
                            types.overrides.push((part, ct));
                        }
                    }
                    _ => {}
                },
                Event::Eof => break,
                _ => {}
            }
        }

        Ok(types)
    }

    /// Minimal table for a package built from scratch
    pub fn standard() -> Self {
        Self {
            defaults: vec![
                (
                    "rels".into(),
                    "application/vnd.openxmlformats-package.relationships+xml".into(),
                ),
                ("xml".into(), "application/xml".into()),
            ],
            overrides: Vec::new(),
        }
    }

    /// Override content type of a part (`part` has no leading slash)
    pub fn override_for(&self, part: &str) -> Option<&str> {
        let name = part_name(part);
        self.overrides
            .iter()
            .find(|(p, _)| p.eq_ignore_ascii_case(&name))
            .map(|(_, ct)| ct.as_str())
    }

    pub fn set_override(&mut self, part: &str, content_type: &str) {
        let name = part_name(part);
        match self
            .overrides
            .iter_mut()
            .find(|(p, _)| p.eq_ignore_ascii_case(&name))
        {
            Some(entry) => entry.1 = content_type.to_string(),
            None => self.overrides.push((name, content_type.to_string())),
        }
    }

    pub fn remove_override(&mut self, part: &str) {
        let name = part_name(part);
        self.overrides.retain(|(p, _)| !p.eq_ignore_ascii_case(&name));
    }

    pub fn to_xml(&self) -> String {
        let mut xml = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
        );
        for (ext, ct) in &self.defaults {
            xml.push_str(&format!(
                r#"<Default Extension="{}" ContentType="{}"/>"#,
                escape_xml(ext),
                escape_xml(ct)
            ));
        }
        for (part, ct) in &self.overrides {
            xml.push_str(&format!(
                r#"<Override PartName="{}" ContentType="{}"/>"#,
                escape_xml(part),
                escape_xml(ct)
            ));
        }
        xml.push_str("</Types>");
        xml
    }
}

/// A document split around one element: markup before it, its content, markup after it
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Split<'a> {
    pub head: &'a str,
    pub inner: &'a str,
    pub tail: &'a str,
}

/// Locate the first `<tag ...>...</tag>` (or `<tag/>`) in `xml`.
///
/// Only unprefixed tags are recognized, which is how every mainstream
/// producer writes SpreadsheetML.
pub(crate) fn split_element<'a>(xml: &'a str, tag: &str) -> Option<Split<'a>> {
    let open = format!("<{tag}");
    let mut from = 0;
    let start = loop {
        let idx = from + xml[from..].find(&open)?;
        match xml[idx + open.len()..].chars().next() {
            Some(c) if c == '>' || c == '/' || c.is_whitespace() => break idx,
            _ => from = idx + open.len(),
        }
    };

    let gt = start + xml[start..].find('>')?;
    if xml[..gt].ends_with('/') {
        return Some(Split {
            head: &xml[..start],
            inner: "",
            tail: &xml[gt + 1..],
        });
    }

    let close = format!("</{tag}>");
    let end = gt + 1 + xml[gt + 1..].find(&close)?;
    Some(Split {
        head: &xml[..start],
        inner: &xml[gt + 1..end],
        tail: &xml[end + close.len()..],
    })
}

/// Remove every `<tag>` element (with its content) from a run of markup
pub(crate) fn remove_elements(xml: &str, tag: &str) -> String {
    let mut out = String::with_capacity(xml.len());
    let mut rest = xml;
    while let Some(split) = split_element(rest, tag) {
        out.push_str(split.head);
        rest = split.tail;
    }
    out.push_str(rest);
    out
}

/// Remove every `name="..."` attribute from a run of markup
pub(crate) fn strip_attribute(xml: &str, name: &str) -> String {
    let needle = format!(" {name}=\"");
    let mut out = String::with_capacity(xml.len());
    let mut rest = xml;

    while let Some(idx) = rest.find(&needle) {
        out.push_str(&rest[..idx]);
        let value_start = idx + needle.len();
        match rest[value_start..].find('"') {
            Some(close) => rest = &rest[value_start + close + 1..],
            None => {
                rest = &rest[idx..];
                break;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Resolve a relationship target against the part that owns the relationship
pub(crate) fn resolve_target(source_part: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }

    let mut segments: Vec<&str> = source_part.split('/').collect();
    segments.pop();
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    segments.join("/")
}

/// Express `part` relative to the directory of `source_part`, when it lies beneath it
pub(crate) fn relative_target(source_part: &str, part: &str) -> String {
    let dir = match source_part.rfind('/') {
        Some(idx) => &source_part[..=idx],
        None => "",
    };
    match part.strip_prefix(dir) {
        Some(rel) => rel.to_string(),
        None => format!("/{part}"),
    }
}

/// `xl/worksheets/sheet1.xml` -> `xl/worksheets/_rels/sheet1.xml.rels`
pub(crate) fn rels_path_for(part: &str) -> String {
    match part.rfind('/') {
        Some(idx) => format!("{}/_rels/{}.rels", &part[..idx], &part[idx + 1..]),
        None => format!("_rels/{part}.rels"),
    }
}

pub(crate) fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Whether XML 1.0 can carry `c` as character data.
///
/// `\r` is allowed but normalised to `\n` by parsers, so it is escaped too.
fn is_xml_text_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}')
}

/// The character a `_xHHHH_` sequence at the start of `s` stands for
fn excel_escape_at(s: &str) -> Option<char> {
    let tail = s.strip_prefix("_x")?;
    let digits = tail.get(..4)?;
    if tail.as_bytes().get(4) != Some(&b'_') || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(digits, 16).ok().and_then(char::from_u32)
}

/// Encode cell text for SpreadsheetML.
///
/// Characters XML cannot carry become `_xHHHH_`. An underscore that would
/// otherwise read back as the start of such a sequence is itself written as
/// `_x005F_`.
pub(crate) fn encode_cell_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for (idx, c) in s.char_indices() {
        if !is_xml_text_char(c) {
            out.push_str(&format!("_x{:04X}_", u32::from(c)));
        } else if c == '_' && excel_escape_at(&s[idx..]).is_some() {
            out.push_str("_x005F_");
        } else {
            out.push(c);
        }
    }
    escape_xml(&out)
}

/// Decode `_xHHHH_` sequences in unescaped cell text
pub(crate) fn decode_cell_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(idx) = rest.find("_x") {
        out.push_str(&rest[..idx]);
        rest = &rest[idx..];
        match excel_escape_at(rest) {
            Some(c) => {
                out.push(c);
                rest = &rest[7..];
            }
            None => {
                out.push('_');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

pub(crate) fn part_text(part: &Part) -> XlsmResult<&str> {
    std::str::from_utf8(&part.data)
        .map_err(|_| XlsmError::InvalidFormat(format!("{} is not UTF-8", part.name)))
}

/// Content-type part names carry a leading slash
fn part_name(part: &str) -> String {
    if part.starts_with('/') {
        part.to_string()
    } else {
        format!("/{part}")
    }
}

pub(crate) fn attr(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == key)
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}
