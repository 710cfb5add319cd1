//! Spreadsheet file I/O.

pub mod xlsx;
