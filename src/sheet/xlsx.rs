//! Native XLSX backend for the spreadsheet access port.
//!
//! A workbook is read as a zip package into an in-memory part map; the
//! worksheet parts are parsed into the shared [`WorkbookModel`], shared
//! strings are resolved at load time and formula text is captured from `<f>`
//! elements. On save the modeled worksheet parts are re-serialized (strings
//! as inline strings) while every other part is copied through untouched,
//! and the package is written to a temporary sibling path and renamed so a
//! failed save leaves the previous file intact.

use std::collections::{BTreeMap, HashMap};
use std::io::{Cursor, Read, Write};
use std::path::Path;

use quick_xml::escape::escape;
use quick_xml::events::Event;
use quick_xml::Reader;
use zip::write::FileOptions;
use zip::ZipArchive;

use super::model::{Cell, CellValue, Sheet, WorkbookModel};
use super::{SheetError, SheetStore, Workbook};

/// Index into the generated cellXfs table carrying the dd/mm/yyyy number
/// format. Only meaningful for packages this tool generated, which is the
/// only place date cells are written.
pub(crate) const DATE_STYLE_XF: u32 = 1;

const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;
const MAIN_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// Opens `.xlsx`/`.xlsm` packages and creates fresh ones.
#[derive(Debug, Default, Clone, Copy)]
pub struct XlsxStore;

impl SheetStore for XlsxStore {
    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn open(&self, path: &Path) -> Result<Box<dyn Workbook>, SheetError> {
        Ok(Box::new(XlsxWorkbook::open(path)?))
    }

    fn create(&self) -> Box<dyn Workbook> {
        Box::new(XlsxWorkbook::new())
    }
}

/// Raw parts of an opened package, kept so unmodeled parts (styles, themes,
/// prints, ...) survive a rewrite byte-identical.
#[derive(Debug, Clone)]
struct Package {
    parts: BTreeMap<String, Vec<u8>>,
    /// sheet name -> part path, e.g. `xl/worksheets/sheet1.xml`.
    sheet_parts: HashMap<String, String>,
}

#[derive(Debug, Default)]
pub struct XlsxWorkbook {
    model: WorkbookModel,
    package: Option<Package>,
    sheets_added: bool,
}

impl XlsxWorkbook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(path: &Path) -> Result<Self, SheetError> {
        let bytes = std::fs::read(path)?;
        // Legacy BIFF (.xls) files and anything else that is not an OPC zip
        // container are rejected up front with a readable error.
        if !bytes.starts_with(b"PK") {
            return Err(SheetError::UnsupportedFormat(path.display().to_string()));
        }

        let mut archive = ZipArchive::new(Cursor::new(bytes))?;
        let mut parts: BTreeMap<String, Vec<u8>> = BTreeMap::new();
        for i in 0..archive.len() {
            let mut entry = archive.by_index(i)?;
            if entry.is_dir() {
                continue;
            }
            let name = entry.name().to_string();
            let mut buf = Vec::with_capacity(entry.size() as usize);
            entry.read_to_end(&mut buf)?;
            parts.insert(name, buf);
        }

        let workbook_part = parts
            .get("xl/workbook.xml")
            .ok_or_else(|| SheetError::MissingPart("xl/workbook.xml".to_string()))?;
        let sheet_entries = parse_workbook_sheets(workbook_part)?;

        let rels = match parts.get("xl/_rels/workbook.xml.rels") {
            Some(bytes) => parse_relationships(bytes)?,
            None => HashMap::new(),
        };

        let shared_strings = match parts.get("xl/sharedStrings.xml") {
            Some(bytes) => parse_shared_strings(bytes)?,
            None => Vec::new(),
        };

        let mut model = WorkbookModel::default();
        let mut sheet_parts = HashMap::new();
        for (name, rel_id) in sheet_entries {
            let Some(target) = rels.get(&rel_id) else {
                return Err(SheetError::MissingPart(format!("relationship {rel_id}")));
            };
            let part_name = resolve_part_name(target);
            let Some(bytes) = parts.get(&part_name) else {
                return Err(SheetError::MissingPart(part_name));
            };
            let sheet = parse_sheet(bytes, &shared_strings, &name)?;
            sheet_parts.insert(name, part_name);
            model.sheets.push(sheet);
        }

        Ok(Self {
            model,
            package: Some(Package { parts, sheet_parts }),
            sheets_added: false,
        })
    }

    /// Direct formula write, used when building fixtures; the consolidation
    /// core itself never creates formulas.
    pub fn set_formula(&mut self, sheet: &str, row: u32, col: u32, formula: &str) {
        self.model.set_formula(sheet, row, col, formula);
    }

    fn package_bytes(&mut self) -> Result<Vec<u8>, SheetError> {
        let patchable = self.package.is_some() && !self.sheets_added;
        let parts = if patchable {
            // Patch: swap in the re-serialized sheets, keep everything else.
            let package = self.package.as_ref().expect("package present");
            let mut parts = package.parts.clone();
            for sheet in &self.model.sheets {
                let Some(part_name) = package.sheet_parts.get(&sheet.name) else {
                    return Err(SheetError::MissingPart(format!("worksheet part for {}", sheet.name)));
                };
                parts.insert(part_name.clone(), sheet_xml(sheet).into_bytes());
            }
            parts
        } else {
            // Fresh workbook, or sheets were added: generate the whole
            // package. Masters are created by this tool, so regeneration
            // never drops foreign content.
            generate_package(&self.model)
        };

        let mut buffer = Cursor::new(Vec::new());
        {
            let mut zip = zip::ZipWriter::new(&mut buffer);
            let options =
                FileOptions::<()>::default().compression_method(zip::CompressionMethod::Deflated);
            for (name, bytes) in &parts {
                zip.start_file(name.clone(), options)?;
                zip.write_all(bytes)?;
            }
            zip.finish()?;
        }

        // Future saves of this instance patch against what was just written.
        let sheet_parts = self
            .model
            .sheets
            .iter()
            .enumerate()
            .map(|(idx, sheet)| {
                let part = if patchable {
                    self.package
                        .as_ref()
                        .and_then(|p| p.sheet_parts.get(&sheet.name).cloned())
                        .unwrap_or_else(|| format!("xl/worksheets/sheet{}.xml", idx + 1))
                } else {
                    format!("xl/worksheets/sheet{}.xml", idx + 1)
                };
                (sheet.name.clone(), part)
            })
            .collect();
        self.package = Some(Package { parts, sheet_parts });
        self.sheets_added = false;

        Ok(buffer.into_inner())
    }
}

impl Workbook for XlsxWorkbook {
    fn sheet_names(&self) -> Vec<String> {
        self.model.sheet_names()
    }

    fn find_sheet(&self, name: &str) -> Option<String> {
        self.model.find_sheet(name)
    }

    fn add_sheet(&mut self, name: &str) {
        if self.model.find_sheet(name).is_none() {
            self.model.add_sheet(name);
            self.sheets_added = true;
        }
    }

    fn last_row(&self, sheet: &str) -> Option<u32> {
        self.model.last_row(sheet)
    }

    fn last_column(&self, sheet: &str) -> Option<u32> {
        self.model.last_column(sheet)
    }

    fn row_is_empty(&self, sheet: &str, row: u32) -> bool {
        self.model.row_is_empty(sheet, row)
    }

    fn cell_text(&self, sheet: &str, row: u32, col: u32) -> Option<String> {
        self.model.cell_text(sheet, row, col)
    }

    fn cell_number(&self, sheet: &str, row: u32, col: u32) -> Option<f64> {
        self.model.cell_number(sheet, row, col)
    }

    fn cell_date(&self, sheet: &str, row: u32, col: u32) -> Option<chrono::NaiveDate> {
        self.model.cell_date(sheet, row, col)
    }

    fn has_formula(&self, sheet: &str, row: u32, col: u32) -> bool {
        self.model.has_formula(sheet, row, col)
    }

    fn formula_text(&self, sheet: &str, row: u32, col: u32) -> Option<String> {
        self.model.formula_text(sheet, row, col)
    }

    fn set_text(&mut self, sheet: &str, row: u32, col: u32, value: &str) {
        self.model.set_text(sheet, row, col, value);
    }

    fn set_number(&mut self, sheet: &str, row: u32, col: u32, value: f64) {
        self.model.set_number(sheet, row, col, value);
    }

    fn set_date(&mut self, sheet: &str, row: u32, col: u32, value: chrono::NaiveDate) {
        self.model.set_date(sheet, row, col, value);
    }

    fn delete_rows(&mut self, sheet: &str, first: u32, last: u32) {
        self.model.delete_rows(sheet, first, last);
    }

    fn save(&mut self, path: &Path) -> Result<(), SheetError> {
        let bytes = self.package_bytes()?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| SheetError::UnsupportedFormat(path.display().to_string()))?;
        let tmp = path.with_file_name(format!(".{file_name}.tmp"));
        std::fs::write(&tmp, bytes)?;
        if let Err(err) = std::fs::rename(&tmp, path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(err.into());
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Parsing

fn parse_workbook_sheets(bytes: &[u8]) -> Result<Vec<(String, String)>, SheetError> {
    let mut reader = Reader::from_reader(bytes);
    let mut buf = Vec::new();
    let mut sheets = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"sheet" => {
                let mut name = None;
                let mut rel_id = None;
                for attr in e.attributes() {
                    let attr = attr?;
                    let key = attr.key.as_ref();
                    if key == b"name" {
                        name = Some(attr.unescape_value()?.into_owned());
                    } else if key == b"r:id" || key == b"id" {
                        rel_id = Some(attr.unescape_value()?.into_owned());
                    }
                }
                if let (Some(name), Some(rel_id)) = (name, rel_id) {
                    sheets.push((name, rel_id));
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(sheets)
}

fn parse_relationships(bytes: &[u8]) -> Result<HashMap<String, String>, SheetError> {
    let mut reader = Reader::from_reader(bytes);
    let mut buf = Vec::new();
    let mut rels = HashMap::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"Relationship" => {
                let mut id = None;
                let mut target = None;
                for attr in e.attributes() {
                    let attr = attr?;
                    match attr.key.as_ref() {
                        b"Id" => id = Some(attr.unescape_value()?.into_owned()),
                        b"Target" => target = Some(attr.unescape_value()?.into_owned()),
                        _ => {}
                    }
                }
                if let (Some(id), Some(target)) = (id, target) {
                    rels.insert(id, target);
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(rels)
}

/// Relationship targets are resolved against `xl/`; absolute targets start
/// from the package root.
fn resolve_part_name(target: &str) -> String {
    if let Some(stripped) = target.strip_prefix('/') {
        stripped.to_string()
    } else {
        format!("xl/{target}")
    }
}

fn parse_shared_strings(bytes: &[u8]) -> Result<Vec<String>, SheetError> {
    let mut reader = Reader::from_reader(bytes);
    let mut buf = Vec::new();
    let mut strings = Vec::new();
    let mut current: Option<String> = None;
    let mut in_t = false;
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.local_name().as_ref() == b"si" => current = Some(String::new()),
            Event::Start(e) if e.local_name().as_ref() == b"t" => in_t = current.is_some(),
            Event::End(e) if e.local_name().as_ref() == b"t" => in_t = false,
            Event::Text(e) if in_t => {
                if let Some(current) = current.as_mut() {
                    current.push_str(&e.unescape()?);
                }
            }
            Event::End(e) if e.local_name().as_ref() == b"si" => {
                strings.push(current.take().unwrap_or_default());
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(strings)
}

/// Accumulated state for the `<c>` element currently being parsed.
#[derive(Default)]
struct PendingCell {
    pos: Option<(u32, u32)>,
    cell_type: Option<String>,
    style: u32,
    value_text: Option<String>,
    formula_text: Option<String>,
    inline_text: Option<String>,
}

fn parse_sheet(bytes: &[u8], shared_strings: &[String], name: &str) -> Result<Sheet, SheetError> {
    let mut reader = Reader::from_reader(bytes);
    let mut buf = Vec::new();

    let mut sheet = Sheet { name: name.to_string(), rows: BTreeMap::new() };

    let mut in_sheet_data = false;
    let mut current_row: u32 = 0;
    let mut next_col: u32 = 1;

    let mut pending: Option<PendingCell> = None;
    let mut in_v = false;
    let mut in_f = false;
    let mut in_is_t = false;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.local_name().as_ref() == b"sheetData" => in_sheet_data = true,
            Event::End(e) if e.local_name().as_ref() == b"sheetData" => in_sheet_data = false,

            Event::Start(e) | Event::Empty(e)
                if in_sheet_data && e.local_name().as_ref() == b"row" =>
            {
                let mut row_attr = None;
                for attr in e.attributes() {
                    let attr = attr?;
                    if attr.key.as_ref() == b"r" {
                        row_attr = attr.unescape_value()?.parse::<u32>().ok();
                    }
                }
                current_row = row_attr.unwrap_or(current_row + 1);
                next_col = 1;
            }

            Event::Start(e) if in_sheet_data && e.local_name().as_ref() == b"c" => {
                pending = Some(read_cell_attrs(&e)?);
            }
            Event::Empty(e) if in_sheet_data && e.local_name().as_ref() == b"c" => {
                let cell = read_cell_attrs(&e)?;
                finish_cell(&mut sheet, cell, shared_strings, current_row, &mut next_col);
            }
            Event::End(e) if e.local_name().as_ref() == b"c" => {
                if let Some(cell) = pending.take() {
                    finish_cell(&mut sheet, cell, shared_strings, current_row, &mut next_col);
                }
                in_v = false;
                in_f = false;
                in_is_t = false;
            }

            Event::Start(e) if pending.is_some() && e.local_name().as_ref() == b"v" => in_v = true,
            Event::End(e) if e.local_name().as_ref() == b"v" => in_v = false,
            Event::Start(e) if pending.is_some() && e.local_name().as_ref() == b"f" => {
                in_f = true;
                if let Some(pending) = pending.as_mut() {
                    pending.formula_text.get_or_insert_with(String::new);
                }
            }
            Event::End(e) if e.local_name().as_ref() == b"f" => in_f = false,
            // A self-closing <f/> still marks the cell as formula-bearing
            // (shared-formula members store their text on the host cell).
            Event::Empty(e) if pending.is_some() && e.local_name().as_ref() == b"f" => {
                if let Some(pending) = pending.as_mut() {
                    pending.formula_text.get_or_insert_with(String::new);
                }
            }
            Event::Start(e) if pending.is_some() && e.local_name().as_ref() == b"t" => {
                in_is_t = true;
                if let Some(pending) = pending.as_mut() {
                    pending.inline_text.get_or_insert_with(String::new);
                }
            }
            Event::End(e) if e.local_name().as_ref() == b"t" && in_is_t => in_is_t = false,

            Event::Text(e) => {
                let text = e.unescape()?;
                if let Some(pending) = pending.as_mut() {
                    if in_f {
                        pending
                            .formula_text
                            .get_or_insert_with(String::new)
                            .push_str(&text);
                    } else if in_v {
                        pending
                            .value_text
                            .get_or_insert_with(String::new)
                            .push_str(&text);
                    } else if in_is_t {
                        pending
                            .inline_text
                            .get_or_insert_with(String::new)
                            .push_str(&text);
                    }
                }
            }

            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(sheet)
}

fn read_cell_attrs(e: &quick_xml::events::BytesStart<'_>) -> Result<PendingCell, SheetError> {
    let mut cell = PendingCell::default();
    for attr in e.attributes() {
        let attr = attr?;
        match attr.key.as_ref() {
            b"r" => {
                let a1 = attr.unescape_value()?.into_owned();
                cell.pos = Some(parse_cell_ref(&a1)?);
            }
            b"t" => cell.cell_type = Some(attr.unescape_value()?.into_owned()),
            b"s" => cell.style = attr.unescape_value()?.parse().unwrap_or(0),
            _ => {}
        }
    }
    Ok(cell)
}

fn finish_cell(
    sheet: &mut Sheet,
    pending: PendingCell,
    shared_strings: &[String],
    current_row: u32,
    next_col: &mut u32,
) {
    let (row, col) = pending.pos.unwrap_or((current_row, *next_col));
    *next_col = col + 1;
    if row == 0 || col == 0 {
        return;
    }

    let value = match pending.cell_type.as_deref() {
        Some("s") => pending
            .value_text
            .as_deref()
            .and_then(|v| v.trim().parse::<usize>().ok())
            .and_then(|idx| shared_strings.get(idx))
            .map(|s| CellValue::Text(s.clone()))
            .unwrap_or(CellValue::Empty),
        Some("str") => pending
            .value_text
            .map(CellValue::Text)
            .unwrap_or(CellValue::Empty),
        Some("inlineStr") => pending
            .inline_text
            .map(CellValue::Text)
            .unwrap_or(CellValue::Empty),
        Some("b") => pending
            .value_text
            .map(|v| CellValue::Bool(v.trim() == "1"))
            .unwrap_or(CellValue::Empty),
        // "e" (error) and unknown types carry nothing we can use.
        Some("e") => CellValue::Empty,
        _ => pending
            .value_text
            .as_deref()
            .and_then(|v| v.trim().parse::<f64>().ok())
            .map(CellValue::Number)
            .unwrap_or(CellValue::Empty),
    };

    let cell = Cell { value, formula: pending.formula_text, style: pending.style };
    if cell.formula.is_some() || !cell.value.is_empty() || cell.style != 0 {
        sheet.rows.entry(row).or_default().insert(col, cell);
    }
}

fn parse_cell_ref(a1: &str) -> Result<(u32, u32), SheetError> {
    let split = a1.find(|c: char| c.is_ascii_digit());
    let Some(split) = split else {
        return Err(SheetError::InvalidCellRef(a1.to_string()));
    };
    let (letters, digits) = a1.split_at(split);
    if letters.is_empty() || !letters.bytes().all(|b| b.is_ascii_alphabetic()) {
        return Err(SheetError::InvalidCellRef(a1.to_string()));
    }
    let col = letters
        .bytes()
        .map(|b| (b.to_ascii_uppercase() - b'A' + 1) as u32)
        .fold(0u32, |acc, d| acc * 26 + d);
    let row: u32 = digits
        .parse()
        .map_err(|_| SheetError::InvalidCellRef(a1.to_string()))?;
    if row == 0 || col == 0 {
        return Err(SheetError::InvalidCellRef(a1.to_string()));
    }
    Ok((row, col))
}

fn col_letters(mut col: u32) -> String {
    let mut letters = String::new();
    while col > 0 {
        let rem = ((col - 1) % 26) as u8;
        letters.insert(0, (b'A' + rem) as char);
        col = (col - 1) / 26;
    }
    letters
}

// ---------------------------------------------------------------------------
// Serialization

fn sheet_xml(sheet: &Sheet) -> String {
    let mut out = String::new();
    out.push_str(XML_DECL);
    out.push('\n');
    out.push_str(&format!(r#"<worksheet xmlns="{MAIN_NS}">"#));
    out.push('\n');
    out.push_str("  <sheetData>\n");
    for (&row, cells) in &sheet.rows {
        if cells.is_empty() {
            continue;
        }
        out.push_str(&format!(r#"    <row r="{row}">"#));
        out.push('\n');
        for (&col, cell) in cells {
            write_cell_xml(&mut out, row, col, cell);
        }
        out.push_str("    </row>\n");
    }
    out.push_str("  </sheetData>\n");
    out.push_str("</worksheet>\n");
    out
}

fn write_cell_xml(out: &mut String, row: u32, col: u32, cell: &Cell) {
    let cell_ref = format!("{}{row}", col_letters(col));
    let style_attr = if cell.style != 0 {
        format!(r#" s="{}""#, cell.style)
    } else {
        String::new()
    };

    if let Some(formula) = &cell.formula {
        let (type_attr, value) = match &cell.value {
            CellValue::Text(s) => (r#" t="str""#.to_string(), Some(escape(s.as_str()).into_owned())),
            CellValue::Number(n) => (String::new(), Some(number_text(*n))),
            CellValue::Bool(b) => (r#" t="b""#.to_string(), Some(if *b { "1" } else { "0" }.to_string())),
            CellValue::Empty => (String::new(), None),
        };
        out.push_str(&format!(
            r#"      <c r="{cell_ref}"{style_attr}{type_attr}><f>{}</f>"#,
            escape(formula.as_str())
        ));
        if let Some(value) = value {
            out.push_str(&format!("<v>{value}</v>"));
        }
        out.push_str("</c>\n");
        return;
    }

    match &cell.value {
        CellValue::Empty => {
            if cell.style != 0 {
                out.push_str(&format!("      <c r=\"{cell_ref}\"{style_attr}/>\n"));
            }
        }
        CellValue::Text(s) => {
            out.push_str(&format!(
                "      <c r=\"{cell_ref}\"{style_attr} t=\"inlineStr\"><is><t xml:space=\"preserve\">{}</t></is></c>\n",
                escape(s.as_str())
            ));
        }
        CellValue::Number(n) => {
            out.push_str(&format!(
                "      <c r=\"{cell_ref}\"{style_attr}><v>{}</v></c>\n",
                number_text(*n)
            ));
        }
        CellValue::Bool(b) => {
            out.push_str(&format!(
                "      <c r=\"{cell_ref}\"{style_attr} t=\"b\"><v>{}</v></c>\n",
                if *b { 1 } else { 0 }
            ));
        }
    }
}

fn number_text(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

fn generate_package(model: &WorkbookModel) -> BTreeMap<String, Vec<u8>> {
    let mut parts = BTreeMap::new();
    parts.insert("[Content_Types].xml".to_string(), content_types_xml(model).into_bytes());
    parts.insert("_rels/.rels".to_string(), root_rels_xml().into_bytes());
    parts.insert("xl/workbook.xml".to_string(), workbook_xml(model).into_bytes());
    parts.insert(
        "xl/_rels/workbook.xml.rels".to_string(),
        workbook_rels_xml(model).into_bytes(),
    );
    parts.insert("xl/styles.xml".to_string(), styles_xml().into_bytes());
    for (idx, sheet) in model.sheets.iter().enumerate() {
        parts.insert(
            format!("xl/worksheets/sheet{}.xml", idx + 1),
            sheet_xml(sheet).into_bytes(),
        );
    }
    parts
}

fn content_types_xml(model: &WorkbookModel) -> String {
    let mut out = String::new();
    out.push_str(XML_DECL);
    out.push('\n');
    out.push_str(r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#);
    out.push('\n');
    out.push_str(r#"  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#);
    out.push('\n');
    out.push_str(r#"  <Default Extension="xml" ContentType="application/xml"/>"#);
    out.push('\n');
    out.push_str(r#"  <Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>"#);
    out.push('\n');
    for idx in 1..=model.sheets.len() {
        out.push_str(&format!(
            r#"  <Override PartName="/xl/worksheets/sheet{idx}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#
        ));
        out.push('\n');
    }
    out.push_str(r#"  <Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>"#);
    out.push('\n');
    out.push_str("</Types>\n");
    out
}

fn root_rels_xml() -> String {
    format!(
        "{XML_DECL}\n<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">\n  <Relationship Id=\"rId1\" Type=\"{REL_NS}/officeDocument\" Target=\"xl/workbook.xml\"/>\n</Relationships>\n"
    )
}

fn workbook_xml(model: &WorkbookModel) -> String {
    let mut out = String::new();
    out.push_str(XML_DECL);
    out.push('\n');
    out.push_str(&format!(
        r#"<workbook xmlns="{MAIN_NS}" xmlns:r="{REL_NS}">"#
    ));
    out.push('\n');
    out.push_str("  <sheets>\n");
    for (idx, sheet) in model.sheets.iter().enumerate() {
        out.push_str(&format!(
            r#"    <sheet name="{}" sheetId="{}" r:id="rId{}"/>"#,
            escape(sheet.name.as_str()),
            idx + 1,
            idx + 1
        ));
        out.push('\n');
    }
    out.push_str("  </sheets>\n");
    out.push_str("</workbook>\n");
    out
}

fn workbook_rels_xml(model: &WorkbookModel) -> String {
    let mut out = String::new();
    out.push_str(XML_DECL);
    out.push('\n');
    out.push_str(r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#);
    out.push('\n');
    for idx in 1..=model.sheets.len() {
        out.push_str(&format!(
            r#"  <Relationship Id="rId{idx}" Type="{REL_NS}/worksheet" Target="worksheets/sheet{idx}.xml"/>"#
        ));
        out.push('\n');
    }
    out.push_str(&format!(
        r#"  <Relationship Id="rId{}" Type="{REL_NS}/styles" Target="styles.xml"/>"#,
        model.sheets.len() + 1
    ));
    out.push('\n');
    out.push_str("</Relationships>\n");
    out
}

/// Minimal stylesheet: xf 0 is the default, xf 1 applies the dd/mm/yyyy
/// date format referenced by [`DATE_STYLE_XF`].
fn styles_xml() -> String {
    let mut out = String::new();
    out.push_str(XML_DECL);
    out.push('\n');
    out.push_str(&format!(r#"<styleSheet xmlns="{MAIN_NS}">"#));
    out.push('\n');
    out.push_str(r#"  <numFmts count="1"><numFmt numFmtId="164" formatCode="dd/mm/yyyy"/></numFmts>"#);
    out.push('\n');
    out.push_str(r#"  <fonts count="1"><font><sz val="11"/><name val="Calibri"/></font></fonts>"#);
    out.push('\n');
    out.push_str(r#"  <fills count="1"><fill><patternFill patternType="none"/></fill></fills>"#);
    out.push('\n');
    out.push_str(r#"  <borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders>"#);
    out.push('\n');
    out.push_str(r#"  <cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>"#);
    out.push('\n');
    out.push_str(r#"  <cellXfs count="2">"#);
    out.push('\n');
    out.push_str(r#"    <xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/>"#);
    out.push('\n');
    out.push_str(r#"    <xf numFmtId="164" fontId="0" fillId="0" borderId="0" xfId="0" applyNumberFormat="1"/>"#);
    out.push('\n');
    out.push_str("  </cellXfs>\n");
    out.push_str(r#"  <cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles>"#);
    out.push('\n');
    out.push_str("</styleSheet>\n");
    out
}
