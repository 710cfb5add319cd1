//! In-memory table store: ordered named columns, ordered rows, JSON scalar
//! cells. A `Workbook` owns the loaded sheets; request handlers share it
//! behind a lock, the analysis core only ever sees cloned snapshots.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum StoreError {
    #[error("Sheet not found")]
    SheetNotFound,
    #[error("Invalid cell coordinates")]
    BadCoordinates,
    #[error("Row has {got} values, expected {expected}")]
    RowShape { got: usize, expected: usize },
    #[error("Column not found")]
    ColumnNotFound,
}

/// A two-dimensional table. `rows[i].len() == headers.len()` for every row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new(headers: Vec<String>) -> Self {
        Self { headers, rows: Vec::new() }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    pub fn push_row(&mut self, values: Vec<Value>) -> Result<(), StoreError> {
        if values.len() != self.headers.len() {
            return Err(StoreError::RowShape {
                got: values.len(),
                expected: self.headers.len(),
            });
        }
        self.rows.push(values.into_iter().map(normalize).collect());
        Ok(())
    }

    pub fn set_cell(&mut self, row: usize, col: usize, value: Value) -> Result<(), StoreError> {
        if row >= self.rows.len() || col >= self.headers.len() {
            return Err(StoreError::BadCoordinates);
        }
        self.rows[row][col] = normalize(value);
        Ok(())
    }

    pub fn delete_row(&mut self, row: usize) -> Result<(), StoreError> {
        if row >= self.rows.len() {
            return Err(StoreError::BadCoordinates);
        }
        self.rows.remove(row);
        Ok(())
    }

    pub fn add_column(&mut self, name: &str, default_value: Value) {
        let default_value = normalize(default_value);
        self.headers.push(name.to_string());
        for row in &mut self.rows {
            row.push(default_value.clone());
        }
    }

    pub fn delete_column(&mut self, name: &str) -> Result<(), StoreError> {
        let idx = self
            .headers
            .iter()
            .position(|h| h == name)
            .ok_or(StoreError::ColumnNotFound)?;
        self.headers.remove(idx);
        for row in &mut self.rows {
            row.remove(idx);
        }
        Ok(())
    }
}

/// Missing values become empty strings, like the upload path's fillna.
fn normalize(value: Value) -> Value {
    match value {
        Value::Null => Value::String(String::new()),
        other => other,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sheet {
    pub name: String,
    pub table: Table,
}

/// All sheets loaded from one file, in workbook order.
#[derive(Debug, Clone, Default)]
pub struct Workbook {
    pub filename: Option<String>,
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn replace(&mut self, filename: String, sheets: Vec<Sheet>) {
        self.filename = Some(filename);
        self.sheets = sheets;
    }

    pub fn clear(&mut self) {
        self.filename = None;
        self.sheets.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }

    pub fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|s| s.name.clone()).collect()
    }

    pub fn sheet(&self, name: &str) -> Option<&Table> {
        self.sheets.iter().find(|s| s.name == name).map(|s| &s.table)
    }

    pub fn sheet_mut(&mut self, name: &str) -> Result<&mut Table, StoreError> {
        self.sheets
            .iter_mut()
            .find(|s| s.name == name)
            .map(|s| &mut s.table)
            .ok_or(StoreError::SheetNotFound)
    }

    pub fn first(&self) -> Option<&Sheet> {
        self.sheets.first()
    }

    /// Snapshot of at most one table for the analysis pipeline: the named
    /// sheet if the selector matches, otherwise the first loaded sheet.
    pub fn active_tables(&self, selector: Option<&str>) -> Vec<Table> {
        let picked = match selector {
            Some(name) => self.sheet(name).or_else(|| self.first().map(|s| &s.table)),
            None => self.first().map(|s| &s.table),
        };
        picked.cloned().into_iter().collect()
    }
}
