//! Tabular files: parsing uploads into named columns and writing the
//! spreadsheet-friendly CSV export.

use crate::error::{FrostError, Result};
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use chrono::{NaiveDateTime, Timelike};
use std::io::Cursor;

pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Csv,
    Spreadsheet,
}

impl TableFormat {
    pub fn from_file_name(name: &str) -> Result<Self> {
        let ext = name
            .rsplit_once('.')
            .map(|(_, e)| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "csv" | "txt" => Ok(TableFormat::Csv),
            "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => Ok(TableFormat::Spreadsheet),
            _ => Err(FrostError::FileParse(format!(
                "unsupported file type '{}'; upload .xlsx, .xls or .csv",
                name
            ))),
        }
    }
}

/// Header row plus string cells; every row has one cell per header.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn push_column(&mut self, name: &str, values: Vec<String>) {
        debug_assert_eq!(values.len(), self.rows.len());
        self.headers.push(name.to_string());
        for (row, v) in self.rows.iter_mut().zip(values) {
            row.push(v);
        }
    }
}

pub fn parse(bytes: &[u8], format: TableFormat) -> Result<Table> {
    match format {
        TableFormat::Csv => parse_csv(bytes),
        TableFormat::Spreadsheet => parse_spreadsheet(bytes),
    }
}

pub fn parse_csv(bytes: &[u8]) -> Result<Table> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let mut rdr = csv::ReaderBuilder::new().from_reader(bytes);

    let headers: Vec<String> = rdr
        .headers()
        .map_err(|e| FrostError::FileParse(e.to_string()))?
        .iter()
        .map(str::to_string)
        .collect();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(FrostError::FileParse("file has no header row".into()));
    }

    let mut rows = Vec::new();
    for rec in rdr.records() {
        let rec = rec.map_err(|e| FrostError::FileParse(e.to_string()))?;
        rows.push(rec.iter().map(str::to_string).collect());
    }
    Ok(Table { headers, rows })
}

pub fn parse_spreadsheet(bytes: &[u8]) -> Result<Table> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| FrostError::FileParse(e.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| FrostError::FileParse("workbook has no sheets".into()))?
        .map_err(|e| FrostError::FileParse(e.to_string()))?;

    let mut rows = range
        .rows()
        .filter(|r| r.iter().any(|c| !matches!(c, Data::Empty)))
        .map(|r| r.iter().map(cell_text).collect::<Vec<_>>());

    let headers: Vec<String> = rows
        .next()
        .ok_or_else(|| FrostError::FileParse("sheet is empty".into()))?;
    Ok(Table {
        headers,
        rows: rows.collect(),
    })
}

fn cell_text(c: &Data) -> String {
    match c {
        Data::Empty => String::new(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::DateTime(d) if d.is_duration() => d
            .as_duration()
            .map(|dur| {
                let secs = dur.num_seconds();
                format!("{}:{:02}:{:02}", secs / 3600, (secs / 60) % 60, secs % 60)
            })
            .unwrap_or_else(|| d.as_f64().to_string()),
        Data::DateTime(d) => d
            .as_datetime()
            .map(date_text)
            .unwrap_or_else(|| d.as_f64().to_string()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        other => other.to_string(),
    }
}

// Date-only cells keep the plain date form.
fn date_text(dt: NaiveDateTime) -> String {
    if dt.num_seconds_from_midnight() == 0 {
        dt.format("%Y-%m-%d").to_string()
    } else {
        dt.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

/// UTF-8 with BOM so spreadsheet tools keep CJK text intact.
pub fn to_csv_bytes(table: &Table) -> Result<Vec<u8>> {
    let mut wtr = csv::Writer::from_writer(UTF8_BOM.to_vec());
    let io_err = |e: csv::Error| FrostError::Io(std::io::Error::new(std::io::ErrorKind::Other, e));

    wtr.write_record(&table.headers).map_err(io_err)?;
    for row in &table.rows {
        wtr.write_record(row).map_err(io_err)?;
    }
    wtr.into_inner().map_err(|e| FrostError::Io(e.into_error()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_format_from_name() {
        assert_eq!(TableFormat::from_file_name("obs.XLSX").unwrap(), TableFormat::Spreadsheet);
        assert_eq!(TableFormat::from_file_name("预测结果.csv").unwrap(), TableFormat::Csv);
        let err = TableFormat::from_file_name("notes.pdf").unwrap_err();
        assert_eq!(err.code(), "FILE_PARSE_ERROR");
        assert!(TableFormat::from_file_name("noext").is_err());
    }

    #[test]
    fn test_csv_with_bom() {
        let mut data = UTF8_BOM.to_vec();
        data.extend_from_slice("站点,气温\nXIY,1.5\n\nXIY,-0.5\n".as_bytes());
        let t = parse_csv(&data).unwrap();
        assert_eq!(t.headers, vec!["站点", "气温"]);
        assert_eq!(t.rows, vec![vec!["XIY", "1.5"], vec!["XIY", "-0.5"]]);
    }

    #[test]
    fn test_ragged_csv_rejected() {
        let err = parse_csv(b"a,b\n1,2,3\n").unwrap_err();
        assert_eq!(err.code(), "FILE_PARSE_ERROR");
    }

    fn observation_workbook() -> Vec<u8> {
        use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};

        let mut wb = Workbook::new();
        let day = Format::new().set_num_format("yyyy-mm-dd");
        let stamp = Format::new().set_num_format("yyyy-mm-dd hh:mm:ss");
        let ws = wb.add_worksheet();
        for (c, h) in ["日期", "站点", "气温"].iter().enumerate() {
            ws.write_string(0, c as u16, *h).unwrap();
        }
        let d1 = ExcelDateTime::from_ymd(2023, 12, 1).unwrap();
        ws.write_datetime_with_format(1, 0, &d1, &day).unwrap();
        ws.write_string(1, 1, "ZLXY").unwrap();
        ws.write_number(1, 2, 1.5).unwrap();
        // row 2 left blank
        let d2 = ExcelDateTime::from_ymd(2023, 12, 2).unwrap().and_hms(6, 30, 0).unwrap();
        ws.write_datetime_with_format(3, 0, &d2, &stamp).unwrap();
        ws.write_string(3, 1, "ZLXY").unwrap();
        ws.write_number(3, 2, -2.0).unwrap();
        wb.save_to_buffer().unwrap()
    }

    #[test]
    fn test_spreadsheet_keeps_dates_and_skips_blank_rows() {
        let t = parse_spreadsheet(&observation_workbook()).unwrap();
        assert_eq!(t.headers, vec!["日期", "站点", "气温"]);
        assert_eq!(
            t.rows,
            vec![
                vec!["2023-12-01", "ZLXY", "1.5"],
                vec!["2023-12-02 06:30:00", "ZLXY", "-2"],
            ]
        );
    }

    #[test]
    fn test_garbage_spreadsheet_rejected() {
        let err = parse_spreadsheet(b"definitely not a zip").unwrap_err();
        assert_eq!(err.code(), "FILE_PARSE_ERROR");
    }

    #[test]
    fn test_export_starts_with_bom_and_quotes() {
        let t = Table {
            headers: vec!["备注".into(), "有霜概率".into()],
            rows: vec![vec!["a,b".into(), "0.73".into()]],
        };
        let bytes = to_csv_bytes(&t).unwrap();
        assert!(bytes.starts_with(UTF8_BOM));
        let text = std::str::from_utf8(&bytes[3..]).unwrap();
        assert_eq!(text, "备注,有霜概率\n\"a,b\",0.73\n");
        assert_eq!(parse_csv(&bytes).unwrap(), t);
    }

    #[test]
    fn test_push_column() {
        let mut t = Table {
            headers: vec!["x".into()],
            rows: vec![vec!["1".into()], vec!["2".into()]],
        };
        t.push_column("y", vec!["a".into(), "b".into()]);
        assert_eq!(t.column_index("y"), Some(1));
        assert_eq!(t.rows[1], vec!["2", "b"]);
    }
}
