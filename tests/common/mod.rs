//! Minimal xlsx workbooks assembled in memory for integration tests.

#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Cell content written into a worksheet.
#[derive(Clone, Debug)]
pub enum Fixture {
    Text(&'static str),
    Number(f64),
    Bool(bool),
    /// Excel serial number shown with the built-in date format.
    Date(f64),
    Error(&'static str),
    /// Formula without a cached value.
    Formula(&'static str),
}

/// Sparse worksheet rows; `None` leaves the cell out of the file.
pub type Rows = Vec<Vec<Option<Fixture>>>;

pub fn text(value: &'static str) -> Option<Fixture> {
    Some(Fixture::Text(value))
}

pub fn number(value: f64) -> Option<Fixture> {
    Some(Fixture::Number(value))
}

pub fn date(serial: f64) -> Option<Fixture> {
    Some(Fixture::Date(serial))
}

/// Sales sheet with an absent column B and a headerless column F.
pub fn sales_rows() -> Rows {
    vec![
        vec![text("Region"), None, text("Units"), text("Date"), text("Note"), None],
        vec![text("North"), None, number(10.0), date(45000.0), text("a rather long note"), text("x")],
        vec![text("South"), None, number(12.5), date(45001.0), Some(Fixture::Bool(true)), text("None")],
        vec![text("East"), None, number(7.0), date(45002.0), Some(Fixture::Error("#DIV/0!")), text("z")],
    ]
}

pub fn summary_rows() -> Rows {
    vec![
        vec![text("Total"), text("Formula")],
        vec![number(29.5), Some(Fixture::Formula("SUM(Sales!C2:C4)"))],
    ]
}

/// Writes a workbook with one worksheet per `(name, rows)` entry.
pub fn write_workbook(path: &Path, sheets: &[(&str, Rows)]) {
    let file = File::create(path).unwrap();
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

    let mut put = |name: &str, content: String| {
        zip.start_file(name, options).unwrap();
        zip.write_all(content.as_bytes()).unwrap();
    };

    put("[Content_Types].xml", content_types(sheets.len()));
    put("_rels/.rels", ROOT_RELS.to_owned());
    put("xl/workbook.xml", workbook(sheets));
    put("xl/_rels/workbook.xml.rels", workbook_rels(sheets.len()));
    put("xl/styles.xml", STYLES.to_owned());
    for (index, (_, rows)) in sheets.iter().enumerate() {
        put(&format!("xl/worksheets/sheet{}.xml", index + 1), worksheet(rows));
    }
    zip.finish().unwrap();
}

/// Writes the sales workbook (`Sales` then `Summary`) into `directory`.
pub fn sales_workbook(directory: &Path, name: &str) -> PathBuf {
    let path = directory.join(name);
    write_workbook(&path, &[("Sales", sales_rows()), ("Summary", summary_rows())]);
    path
}

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
</Relationships>"#;

const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
<cellXfs count="2">
<xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/>
<xf numFmtId="14" fontId="0" fillId="0" borderId="0" xfId="0" applyNumberFormat="1"/>
</cellXfs>
</styleSheet>"#;

fn content_types(sheets: usize) -> String {
    let overrides: String = (1..=sheets)
        .map(|index| {
            format!(
                r#"<Override PartName="/xl/worksheets/sheet{index}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#
            )
        })
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
<Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>
{overrides}
</Types>"#
    )
}

fn workbook(sheets: &[(&str, Rows)]) -> String {
    let entries: String = sheets
        .iter()
        .enumerate()
        .map(|(index, (name, _))| {
            format!(r#"<sheet name="{name}" sheetId="{id}" r:id="rId{id}"/>"#, id = index + 1)
        })
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
<sheets>{entries}</sheets>
</workbook>"#
    )
}

fn workbook_rels(sheets: usize) -> String {
    let mut entries: String = (1..=sheets)
        .map(|index| {
            format!(
                r#"<Relationship Id="rId{index}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{index}.xml"/>"#
            )
        })
        .collect();
    entries.push_str(&format!(
        r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>"#,
        sheets + 1
    ));
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{entries}</Relationships>"#
    )
}

fn worksheet(rows: &Rows) -> String {
    let data: String = rows
        .iter()
        .enumerate()
        .map(|(row, cells)| {
            let cells: String = cells
                .iter()
                .enumerate()
                .filter_map(|(column, cell)| {
                    cell.as_ref()
                        .map(|cell| cell_xml(&format!("{}{}", column_letter(column), row + 1), cell))
                })
                .collect();
            format!(r#"<row r="{}">{cells}</row>"#, row + 1)
        })
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
<sheetData>{data}</sheetData>
</worksheet>"#
    )
}

fn cell_xml(reference: &str, cell: &Fixture) -> String {
    match cell {
        Fixture::Text(value) => {
            format!(r#"<c r="{reference}" t="inlineStr"><is><t>{value}</t></is></c>"#)
        }
        Fixture::Number(value) => format!(r#"<c r="{reference}"><v>{value}</v></c>"#),
        Fixture::Bool(value) => {
            format!(r#"<c r="{reference}" t="b"><v>{}</v></c>"#, u8::from(*value))
        }
        Fixture::Date(serial) => format!(r#"<c r="{reference}" s="1"><v>{serial}</v></c>"#),
        Fixture::Error(code) => format!(r#"<c r="{reference}" t="e"><v>{code}</v></c>"#),
        Fixture::Formula(formula) => format!(r#"<c r="{reference}"><f>{formula}</f></c>"#),
    }
}

fn column_letter(column: usize) -> char {
    (b'A' + u8::try_from(column).unwrap()) as char
}
