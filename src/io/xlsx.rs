//! XLSX import/export. Reading uses calamine over an in-memory buffer; the
//! first row of each sheet is taken as the header row and absent cells become
//! empty strings. Writing rebuilds the whole workbook with rust_xlsxwriter.

use std::io::Cursor;

use anyhow::{Context, Result};
use calamine::{Data, Reader, Xlsx};
use rust_xlsxwriter::Workbook as XlsxWorkbook;
use serde_json::Value;

use crate::table::{Sheet, Table};

/// Parse every sheet of an uploaded .xlsx file.
pub fn read_workbook(bytes: &[u8]) -> Result<Vec<Sheet>> {
    let mut workbook: Xlsx<_> =
        Xlsx::new(Cursor::new(bytes)).context("failed to open xlsx data")?;

    let mut sheets = Vec::new();
    for name in workbook.sheet_names().to_vec() {
        let range = workbook
            .worksheet_range(&name)
            .with_context(|| format!("failed to read sheet {name}"))?;

        let mut rows = range.rows();
        let headers: Vec<String> = match rows.next() {
            Some(header_row) => header_row.iter().map(cell_to_header).collect(),
            None => Vec::new(),
        };

        let mut table = Table::new(headers);
        for row in rows {
            let mut values: Vec<Value> = row.iter().map(cell_to_value).collect();
            // dense ranges can be ragged at the trailing edge
            values.resize(table.headers.len(), Value::String(String::new()));
            table.rows.push(values);
        }
        sheets.push(Sheet { name, table });
    }

    Ok(sheets)
}

fn cell_to_header(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.clone(),
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}

fn cell_to_value(cell: &Data) -> Value {
    match cell {
        Data::Empty => Value::String(String::new()),
        Data::String(s) => Value::String(s.clone()),
        Data::Float(n) => number(*n),
        Data::Int(n) => Value::from(*n),
        Data::Bool(b) => Value::from(*b),
        Data::DateTime(dt) => number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Value::String(s.clone()),
        Data::Error(_) => Value::String(String::new()),
    }
}

/// Whole floats collapse to integers so a written `1` reads back as `1`.
fn number(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(String::new()))
    }
}

/// Serialize the loaded sheets back to .xlsx bytes for download.
pub fn write_workbook(sheets: &[Sheet]) -> Result<Vec<u8>> {
    let mut workbook = XlsxWorkbook::new();

    for sheet in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet
            .set_name(&sheet.name)
            .with_context(|| format!("invalid sheet name {}", sheet.name))?;

        for (col, header) in sheet.table.headers.iter().enumerate() {
            worksheet.write_string(0, col as u16, header)?;
        }
        for (row, values) in sheet.table.rows.iter().enumerate() {
            let row = (row + 1) as u32;
            for (col, value) in values.iter().enumerate() {
                let col = col as u16;
                match value {
                    Value::Number(n) => {
                        worksheet.write_number(row, col, n.as_f64().unwrap_or(0.0))?;
                    }
                    Value::Bool(b) => {
                        worksheet.write_boolean(row, col, *b)?;
                    }
                    Value::String(s) => {
                        worksheet.write_string(row, col, s)?;
                    }
                    Value::Null => {
                        worksheet.write_string(row, col, "")?;
                    }
                    other => {
                        worksheet.write_string(row, col, &other.to_string())?;
                    }
                }
            }
        }
    }

    let bytes = workbook.save_to_buffer().context("failed to serialize workbook")?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn roundtrip_preserves_headers_and_cells() {
        let mut table = Table::new(vec!["name".into(), "count".into(), "ok".into()]);
        table
            .push_row(vec![json!("alpha"), json!(3), json!(true)])
            .unwrap();
        table
            .push_row(vec![json!("beta"), json!(2.5), json!(false)])
            .unwrap();
        let sheets = vec![Sheet { name: "Sheet1".into(), table }];

        let bytes = write_workbook(&sheets).unwrap();
        let back = read_workbook(&bytes).unwrap();

        assert_eq!(back.len(), 1);
        assert_eq!(back[0].name, "Sheet1");
        assert_eq!(back[0].table.headers, vec!["name", "count", "ok"]);
        assert_eq!(back[0].table.rows[0], vec![json!("alpha"), json!(3), json!(true)]);
        assert_eq!(back[0].table.rows[1], vec![json!("beta"), json!(2.5), json!(false)]);
    }

    #[test]
    fn empty_sheet_reads_back_empty() {
        let sheets = vec![Sheet { name: "Empty".into(), table: Table::default() }];
        let bytes = write_workbook(&sheets).unwrap();
        let back = read_workbook(&bytes).unwrap();
        assert!(back[0].table.headers.is_empty());
        assert!(back[0].table.rows.is_empty());
    }
}
