//! In-place filling of a template workbook
//!
//! The template is never re-generated: every part of the archive is copied
//! byte for byte except the target worksheet, whose XML is streamed through
//! and spliced only at the patched cells. Existing cell styles (`s`) are kept,
//! so the template's borders, fonts and number formats survive.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, Write};
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use protocolo_types::{Error, Result, TemplateError};

/// Value written into a patched cell
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
    /// Clears the value, keeping the cell's style
    Blank,
}

/// Set of cell writes for one worksheet, keyed by 1-based (row, column)
#[derive(Debug, Clone, Default)]
pub struct SheetPatch {
    cells: BTreeMap<(u32, u32), CellValue>,
}

impl SheetPatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Later writes to the same cell replace earlier ones
    pub fn set(&mut self, row: u32, col: u32, value: CellValue) {
        self.cells.insert((row, col), value);
    }

    pub fn set_text(&mut self, row: u32, col: u32, text: impl Into<String>) {
        self.set(row, col, CellValue::Text(text.into()));
    }

    pub fn set_number(&mut self, row: u32, col: u32, number: f64) {
        self.set(row, col, CellValue::Number(number));
    }

    pub fn set_blank(&mut self, row: u32, col: u32) {
        self.set(row, col, CellValue::Blank);
    }

    pub fn get(&self, row: u32, col: u32) -> Option<&CellValue> {
        self.cells.get(&(row, col))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    fn by_row(&self) -> BTreeMap<u32, BTreeMap<u32, &CellValue>> {
        let mut rows: BTreeMap<u32, BTreeMap<u32, &CellValue>> = BTreeMap::new();
        for (&(row, col), value) in &self.cells {
            rows.entry(row).or_default().insert(col, value);
        }
        rows
    }
}

/// Column letters for a 1-based column index (1 -> "A", 28 -> "AB")
pub fn column_name(col: u32) -> String {
    let mut name = Vec::new();
    let mut n = col;
    while n > 0 {
        let rem = (n - 1) % 26;
        name.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    name.reverse();
    String::from_utf8(name).unwrap_or_default()
}

/// A1-style reference for a 1-based (row, column)
pub fn cell_name(row: u32, col: u32) -> String {
    format!("{}{}", column_name(col), row)
}

/// Parse an A1-style reference into 1-based (row, column)
pub fn parse_cell_ref(reference: &str) -> Option<(u32, u32)> {
    let reference = reference.trim().replace('$', "");
    let split = reference.find(|c: char| c.is_ascii_digit())?;
    let (letters, digits) = reference.split_at(split);
    if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }

    let mut col: u32 = 0;
    for c in letters.chars() {
        col = col
            .checked_mul(26)?
            .checked_add(c.to_ascii_uppercase() as u32 - 'A' as u32 + 1)?;
    }
    let row: u32 = digits.parse().ok()?;
    if row == 0 {
        return None;
    }
    Some((row, col))
}

/// Copy `template` to `output`, applying `patch` to the sheet named `sheet_name`
pub fn fill_template(
    template: &Path,
    sheet_name: &str,
    patch: &SheetPatch,
    output: &Path,
) -> Result<()> {
    let file = File::open(template).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::Template(TemplateError::NotFound(template.display().to_string()))
        } else {
            Error::Io(e)
        }
    })?;
    let mut archive = ZipArchive::new(BufReader::new(file)).map_err(zip_error)?;

    let sheet_path = locate_sheet(&mut archive, sheet_name)?;
    log::debug!("Sheet '{}' lives at {}", sheet_name, sheet_path);

    let sheet_xml = read_part(&mut archive, &sheet_path)?;
    let patched = patch_sheet_xml(&sheet_xml, patch)?;

    let out = File::create(output)?;
    let mut writer = ZipWriter::new(BufWriter::new(out));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for i in 0..archive.len() {
        let entry = archive.by_index_raw(i).map_err(zip_error)?;
        if entry.name() == sheet_path {
            writer
                .start_file(sheet_path.as_str(), options)
                .map_err(zip_error)?;
            writer.write_all(patched.as_bytes())?;
        } else {
            writer.raw_copy_file(entry).map_err(zip_error)?;
        }
    }

    let mut inner = writer.finish().map_err(zip_error)?;
    inner.flush()?;

    log::info!(
        "Filled {} cells of '{}' into {}",
        patch.len(),
        sheet_name,
        output.display()
    );
    Ok(())
}

fn zip_error(e: zip::result::ZipError) -> Error {
    match e {
        zip::result::ZipError::Io(io) => Error::Io(io),
        other => Error::Template(TemplateError::Zip(other.to_string())),
    }
}

fn xml_error(e: quick_xml::Error) -> Error {
    Error::Template(TemplateError::Xml(e.to_string()))
}

fn read_part<R: Read + Seek>(archive: &mut ZipArchive<R>, name: &str) -> Result<String> {
    let mut part = archive.by_name(name).map_err(|e| match e {
        zip::result::ZipError::FileNotFound => {
            Error::Template(TemplateError::InvalidFormat(format!("missing part {}", name)))
        }
        other => zip_error(other),
    })?;
    let mut content = String::new();
    part.read_to_string(&mut content)?;
    Ok(content)
}

fn attr_value(e: &BytesStart, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == key)
        .and_then(|a| a.unescape_value().ok().map(|v| v.to_string()))
}

/// Resolve a sheet name to its part path via workbook.xml and its rels
fn locate_sheet<R: Read + Seek>(archive: &mut ZipArchive<R>, sheet_name: &str) -> Result<String> {
    let workbook = read_part(archive, "xl/workbook.xml")?;
    let mut reader = Reader::from_str(&workbook);
    let mut rel_id = None;

    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Empty(e) | Event::Start(e) if e.local_name().as_ref() == b"sheet" => {
                let mut name = None;
                let mut id = None;
                for attr in e.attributes().flatten() {
                    if attr.key.as_ref() == b"name" {
                        name = attr.unescape_value().ok().map(|v| v.to_string());
                    } else if attr.key.local_name().as_ref() == b"id" && attr.key.prefix().is_some() {
                        id = attr.unescape_value().ok().map(|v| v.to_string());
                    }
                }
                if name.as_deref() == Some(sheet_name) {
                    rel_id = id;
                    break;
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    let rel_id = rel_id.ok_or_else(|| TemplateError::MissingSheet(sheet_name.to_string()))?;

    let rels = read_part(archive, "xl/_rels/workbook.xml.rels")?;
    let mut reader = Reader::from_str(&rels);
    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Empty(e) | Event::Start(e) if e.local_name().as_ref() == b"Relationship" => {
                if attr_value(&e, b"Id").as_deref() != Some(rel_id.as_str()) {
                    continue;
                }
                let target = attr_value(&e, b"Target").ok_or_else(|| {
                    TemplateError::InvalidFormat(format!("relationship {} has no target", rel_id))
                })?;
                // Targets are relative to xl/ unless absolute
                return Ok(match target.strip_prefix('/') {
                    Some(absolute) => absolute.to_string(),
                    None => format!("xl/{}", target),
                });
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Err(TemplateError::InvalidFormat(format!("no relationship for sheet '{}'", sheet_name)).into())
}

fn name_prefix(qualified: &[u8]) -> String {
    match qualified.iter().position(|b| *b == b':') {
        Some(i) => String::from_utf8_lossy(&qualified[..=i]).into_owned(),
        None => String::new(),
    }
}

fn write_cell(out: &mut String, prefix: &str, row: u32, col: u32, style: Option<&str>, value: &CellValue) {
    let style_attr = style.map(|s| format!(" s=\"{}\"", s)).unwrap_or_default();
    let reference = cell_name(row, col);
    match value {
        CellValue::Text(text) => out.push_str(&format!(
            "<{p}c r=\"{r}\"{s} t=\"inlineStr\"><{p}is><{p}t xml:space=\"preserve\">{v}</{p}t></{p}is></{p}c>",
            p = prefix,
            r = reference,
            s = style_attr,
            v = quick_xml::escape::escape(text.as_str()),
        )),
        CellValue::Number(n) => out.push_str(&format!(
            "<{p}c r=\"{r}\"{s}><{p}v>{v}</{p}v></{p}c>",
            p = prefix,
            r = reference,
            s = style_attr,
            v = n,
        )),
        CellValue::Blank => out.push_str(&format!(
            "<{p}c r=\"{r}\"{s}/>",
            p = prefix,
            r = reference,
            s = style_attr,
        )),
    }
}

fn write_row(out: &mut String, prefix: &str, row: u32, cells: &BTreeMap<u32, &CellValue>) {
    out.push_str(&format!("<{}row r=\"{}\">", prefix, row));
    for (&col, value) in cells {
        write_cell(out, prefix, row, col, None, value);
    }
    out.push_str(&format!("</{}row>", prefix));
}

/// Row currently being streamed, with the patched cells not yet written
struct OpenRow<'a> {
    row: u32,
    last_col: u32,
    pending: BTreeMap<u32, &'a CellValue>,
}

/// Apply `patch` to one worksheet part, copying everything else verbatim
fn patch_sheet_xml(xml: &str, patch: &SheetPatch) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    let mut out = String::with_capacity(xml.len() + patch.len() * 96);
    let mut pending = patch.by_row();
    let mut prefix = String::new();
    let mut in_sheet_data = false;
    let mut saw_sheet_data = false;
    let mut last_row: u32 = 0;
    let mut open_row: Option<OpenRow> = None;
    let mut skipping_cell = false;

    loop {
        let start = reader.buffer_position();
        let event = reader.read_event().map_err(xml_error)?;
        let end = reader.buffer_position();
        let raw = xml
            .get(start..end)
            .ok_or_else(|| TemplateError::InvalidFormat("worksheet is not valid UTF-8".to_string()))?;

        if skipping_cell {
            if let Event::End(e) = &event {
                if e.local_name().as_ref() == b"c" {
                    skipping_cell = false;
                }
            }
            continue;
        }

        match event {
            Event::Eof => break,

            Event::Start(e) if e.local_name().as_ref() == b"sheetData" => {
                prefix = name_prefix(e.name().as_ref());
                in_sheet_data = true;
                saw_sheet_data = true;
                out.push_str(raw);
            }
            Event::Empty(e) if e.local_name().as_ref() == b"sheetData" => {
                prefix = name_prefix(e.name().as_ref());
                saw_sheet_data = true;
                out.push_str(&format!("<{}sheetData>", prefix));
                for (row, cells) in std::mem::take(&mut pending) {
                    write_row(&mut out, &prefix, row, &cells);
                }
                out.push_str(&format!("</{}sheetData>", prefix));
            }
            Event::End(e) if in_sheet_data && e.local_name().as_ref() == b"sheetData" => {
                for (row, cells) in std::mem::take(&mut pending) {
                    write_row(&mut out, &prefix, row, &cells);
                }
                in_sheet_data = false;
                out.push_str(raw);
            }

            Event::Start(e) if in_sheet_data && e.local_name().as_ref() == b"row" => {
                let row = row_number(&e, last_row)?;
                flush_rows_before(&mut out, &prefix, &mut pending, row);
                last_row = row;
                open_row = Some(OpenRow {
                    row,
                    last_col: 0,
                    pending: pending.remove(&row).unwrap_or_default(),
                });
                out.push_str(raw);
            }
            Event::Empty(e) if in_sheet_data && e.local_name().as_ref() == b"row" => {
                let row = row_number(&e, last_row)?;
                flush_rows_before(&mut out, &prefix, &mut pending, row);
                last_row = row;
                match pending.remove(&row) {
                    Some(cells) => {
                        // `<row .../>` becomes `<row ...>cells</row>`
                        let open = raw.trim_end().trim_end_matches("/>").trim_end();
                        out.push_str(open);
                        out.push('>');
                        for (&col, value) in &cells {
                            write_cell(&mut out, &prefix, row, col, None, value);
                        }
                        out.push_str(&format!("</{}row>", prefix));
                    }
                    None => out.push_str(raw),
                }
            }
            Event::End(e) if in_sheet_data && e.local_name().as_ref() == b"row" => {
                if let Some(open) = open_row.take() {
                    for (&col, value) in &open.pending {
                        write_cell(&mut out, &prefix, open.row, col, None, value);
                    }
                }
                out.push_str(raw);
            }

            Event::Start(e) if open_row.is_some() && e.local_name().as_ref() == b"c" => {
                if splice_cell(&mut out, &prefix, open_row.as_mut(), &e)? {
                    skipping_cell = true;
                } else {
                    out.push_str(raw);
                }
            }
            Event::Empty(e) if open_row.is_some() && e.local_name().as_ref() == b"c" => {
                if !splice_cell(&mut out, &prefix, open_row.as_mut(), &e)? {
                    out.push_str(raw);
                }
            }

            _ => out.push_str(raw),
        }
    }

    if !saw_sheet_data && !patch.is_empty() {
        return Err(TemplateError::InvalidFormat("worksheet has no sheetData".to_string()).into());
    }

    Ok(out)
}

fn row_number(e: &BytesStart, last_row: u32) -> Result<u32> {
    match attr_value(e, b"r") {
        Some(r) => r
            .parse()
            .map_err(|_| TemplateError::InvalidFormat(format!("bad row number '{}'", r)).into()),
        None => Ok(last_row + 1),
    }
}

fn flush_rows_before(
    out: &mut String,
    prefix: &str,
    pending: &mut BTreeMap<u32, BTreeMap<u32, &CellValue>>,
    row: u32,
) {
    let later = pending.split_off(&row);
    for (r, cells) in std::mem::replace(pending, later) {
        write_row(out, prefix, r, &cells);
    }
}

/// Write patched cells that sort before this one. Returns true when this
/// cell itself was replaced and its original content must be dropped.
fn splice_cell(
    out: &mut String,
    prefix: &str,
    open_row: Option<&mut OpenRow>,
    e: &BytesStart,
) -> Result<bool> {
    let Some(open) = open_row else {
        return Ok(false);
    };

    let col = match attr_value(e, b"r") {
        Some(reference) => parse_cell_ref(&reference)
            .map(|(_, col)| col)
            .ok_or_else(|| TemplateError::InvalidFormat(format!("bad cell reference '{}'", reference)))?,
        None => open.last_col + 1,
    };
    open.last_col = col;

    let later = open.pending.split_off(&col);
    for (c, value) in std::mem::replace(&mut open.pending, later) {
        write_cell(out, prefix, open.row, c, None, value);
    }

    match open.pending.remove(&col) {
        Some(value) => {
            let style = attr_value(e, b"s");
            write_cell(out, prefix, open.row, col, style.as_deref(), value);
            Ok(true)
        }
        None => Ok(false),
    }
}
