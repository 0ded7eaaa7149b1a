//! Spreadsheet decoding into a rectangular grid of raw cells.

use std::{fmt, io::Cursor};

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use csv::{ReaderBuilder, Trim};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("unsupported file type '{0}', expected xlsx, xls, ods or csv")]
    UnsupportedExtension(String),

    #[error("could not read workbook: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("workbook has no worksheet")]
    NoWorksheet,

    #[error("could not read csv: {0}")]
    Csv(#[from] csv::Error),
}

/// One spreadsheet cell, before any question semantics are applied.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
}

impl CellValue {
    fn from_text(raw: &str) -> Self {
        if raw.trim().is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(raw.to_string())
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Text form used at the validation boundary, trimmed.
    pub fn normalized(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(s) => s.trim().to_string(),
            CellValue::Number(n) => format_number(*n),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.normalized())
    }
}

impl From<&Data> for CellValue {
    fn from(cell: &Data) -> Self {
        match cell {
            Data::Empty => CellValue::Empty,
            Data::String(s) => CellValue::from_text(s),
            Data::Int(i) => CellValue::Number(*i as f64),
            Data::Float(f) => CellValue::Number(*f),
            other => CellValue::from_text(&other.to_string()),
        }
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// Header row plus data rows. Rows may be ragged; `cell` pads with `Empty`.
#[derive(Debug, Clone, PartialEq)]
pub struct RawGrid {
    rows: Vec<Vec<CellValue>>,
}

static EMPTY_CELL: CellValue = CellValue::Empty;

impl RawGrid {
    pub fn new(rows: Vec<Vec<CellValue>>) -> Self {
        Self { rows }
    }

    pub fn header(&self) -> &[CellValue] {
        self.rows.first().map(Vec::as_slice).unwrap_or_default()
    }

    /// Data rows, paired with their 1-based spreadsheet row number.
    pub fn data_rows(&self) -> impl Iterator<Item = (usize, &[CellValue])> {
        self.rows
            .iter()
            .enumerate()
            .skip(1)
            .map(|(index, row)| (index + 1, row.as_slice()))
    }

    pub fn data_row_count(&self) -> usize {
        self.rows.len().saturating_sub(1)
    }

    pub fn cell<'a>(row: &'a [CellValue], column: usize) -> &'a CellValue {
        row.get(column).unwrap_or(&EMPTY_CELL)
    }
}

/// Decodes `bytes` according to `extension`.
///
/// Returns `Ok(None)` when the first sheet has no data row after the header,
/// which callers report as "nothing to import".
pub fn decode(bytes: &[u8], extension: &str) -> Result<Option<RawGrid>, DecodeError> {
    let extension = extension.trim_start_matches('.').to_ascii_lowercase();
    let mut rows = match extension.as_str() {
        "xlsx" | "xlsm" | "xls" | "ods" => decode_workbook(bytes)?,
        "csv" => decode_csv(bytes)?,
        _ => return Err(DecodeError::UnsupportedExtension(extension)),
    };

    while rows
        .last()
        .is_some_and(|row| row.iter().all(CellValue::is_empty))
    {
        rows.pop();
    }

    debug!(rows = rows.len(), format = %extension, "decoded grid");
    let grid = RawGrid::new(rows);
    if grid.data_row_count() == 0 {
        return Ok(None);
    }
    Ok(Some(grid))
}

fn decode_workbook(bytes: &[u8]) -> Result<Vec<Vec<CellValue>>, DecodeError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(DecodeError::NoWorksheet)??;

    Ok(range
        .rows()
        .map(|row| row.iter().map(CellValue::from).collect())
        .collect())
}

fn decode_csv(bytes: &[u8]) -> Result<Vec<Vec<CellValue>>, DecodeError> {
    let content = decode_text(bytes);
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .delimiter(detect_delimiter(&content))
        .from_reader(content.as_bytes());

    reader
        .records()
        .map(|record| {
            let record = record?;
            Ok(record.iter().map(CellValue::from_text).collect())
        })
        .collect()
}

// Excel on Turkish Windows exports csv as windows-1254
fn decode_text(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => {
            let (text, _, _) = encoding_rs::WINDOWS_1254.decode(bytes);
            text.into_owned()
        }
    }
}

/// Picks the delimiter whose per-line count is highest and most consistent.
fn detect_delimiter(content: &str) -> u8 {
    let sample: Vec<&str> = content.lines().take(10).collect();
    if sample.is_empty() {
        return b',';
    }

    let mut best = (b',', 0.0f32);
    for delimiter in [b',', b';', b'\t', b'|'] {
        let counts: Vec<f32> = sample
            .iter()
            .map(|line| line.bytes().filter(|&b| b == delimiter).count() as f32)
            .collect();
        let avg = counts.iter().sum::<f32>() / counts.len() as f32;
        let variance = counts.iter().map(|c| (c - avg).powi(2)).sum::<f32>() / counts.len() as f32;
        let score = avg / (1.0 + variance.sqrt());
        if score > best.1 {
            best = (delimiter, score);
        }
    }
    best.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    #[test]
    fn csv_with_semicolons_and_ragged_rows() {
        let bytes = "Soru;Cevap\nBaşkent?;Ankara\nEksik\n".as_bytes();
        let grid = decode(bytes, "csv").unwrap().unwrap();

        assert_eq!(grid.header(), &[text("Soru"), text("Cevap")]);
        let rows: Vec<_> = grid.data_rows().collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].0, 2);
        assert_eq!(RawGrid::cell(rows[1].1, 1), &CellValue::Empty);
    }

    #[test]
    fn header_only_is_nothing_to_import() {
        assert!(decode(b"Soru,Cevap\n", "CSV").unwrap().is_none());
        assert!(decode(b"", "csv").unwrap().is_none());
        assert!(decode(b"Soru,Cevap\n,\n ,  \n", "csv").unwrap().is_none());
    }

    #[test]
    fn windows_1254_csv_is_decoded() {
        // "Soru,Cevap\nDoğru mu?,Evet" with 0xF0 for 'ğ'
        let bytes = b"Soru,Cevap\nDo\xF0ru mu?,Evet\n";
        let grid = decode(bytes, "csv").unwrap().unwrap();
        let (_, row) = grid.data_rows().next().unwrap();
        assert_eq!(row[0], text("Doğru mu?"));
    }

    #[test]
    fn bom_is_stripped() {
        let grid = decode("\u{FEFF}Soru,Cevap\na,b\n".as_bytes(), "csv")
            .unwrap()
            .unwrap();
        assert_eq!(grid.header()[0], text("Soru"));
    }

    #[test]
    fn unsupported_extension_is_an_error() {
        assert!(matches!(
            decode(b"whatever", "pdf"),
            Err(DecodeError::UnsupportedExtension(ext)) if ext == "pdf"
        ));
    }

    #[test]
    fn garbage_workbook_is_an_error() {
        assert!(matches!(
            decode(b"not a zip file", "xlsx"),
            Err(DecodeError::Workbook(_))
        ));
    }

    #[test]
    fn workbook_reads_first_sheet_with_typed_cells() {
        let bytes = include_bytes!("../../tests/fixtures/true_false.xlsx");
        let grid = decode(bytes, "xlsx").unwrap().unwrap();

        assert_eq!(
            grid.header(),
            &[text("Soru"), text("Doğru/Yanlış"), text("Puan"), text("Tarih")]
        );
        // the second sheet has three data rows
        assert_eq!(grid.data_row_count(), 2);

        let rows: Vec<_> = grid.data_rows().collect();
        let (_, first) = rows[0];
        assert_eq!(first[0], text("Su 100 derecede kaynar"));
        assert_eq!(first[1], text("true"));
        assert_eq!(first[2], CellValue::Number(5.0));
        assert!(matches!(&first[3], CellValue::Text(date) if !date.is_empty()));

        let (row_number, second) = rows[1];
        assert_eq!(row_number, 3);
        assert_eq!(second[2], CellValue::Number(2.5));
        assert_eq!(RawGrid::cell(second, 3), &CellValue::Empty);
    }

    #[test]
    fn calamine_cells_map_to_cell_values() {
        assert_eq!(CellValue::from(&Data::Int(7)), CellValue::Number(7.0));
        assert_eq!(CellValue::from(&Data::Float(0.5)), CellValue::Number(0.5));
        assert_eq!(CellValue::from(&Data::Bool(false)), text("false"));
        assert_eq!(CellValue::from(&Data::String("  ".into())), CellValue::Empty);
        assert_eq!(CellValue::from(&Data::Empty), CellValue::Empty);
    }

    #[test]
    fn integral_numbers_normalize_without_fraction() {
        assert_eq!(CellValue::Number(1.0).normalized(), "1");
        assert_eq!(CellValue::Number(2.5).normalized(), "2.5");
        assert_eq!(text("  doğru ").normalized(), "doğru");
    }

    #[test]
    fn delimiter_detection() {
        assert_eq!(detect_delimiter("a,b,c\nd,e,f"), b',');
        assert_eq!(detect_delimiter("a;b;c\nd;e;f"), b';');
        assert_eq!(detect_delimiter("a\tb\nc\td"), b'\t');
    }
}
