//! Request handlers. Responses mirror the frontend's expectations: ad-hoc
//! JSON objects with either the requested data or an error message, never a
//! non-200 status for recoverable conditions.

use axum::{
    extract::{Multipart, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, info, warn};

use crate::io::xlsx;
use crate::pipeline::AnalyzeRequest;
use crate::table::StoreError;

use super::AppState;

const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

pub async fn upload(State(state): State<AppState>, mut multipart: Multipart) -> Json<Value> {
    let mut filename = String::new();
    let mut bytes = Vec::new();

    loop {
        match multipart.next_field().await {
            Ok(Some(field)) if field.name() == Some("file") => {
                filename = field.file_name().unwrap_or_default().to_string();
                match field.bytes().await {
                    Ok(data) => bytes = data.to_vec(),
                    Err(e) => return Json(json!({ "error": e.to_string() })),
                }
                break;
            }
            Ok(Some(_)) => continue,
            Ok(None) => break,
            Err(e) => return Json(json!({ "error": e.to_string() })),
        }
    }

    if !filename.ends_with(".xlsx") {
        return Json(json!({ "error": "Only .xlsx files are supported" }));
    }

    let sheets = match xlsx::read_workbook(&bytes) {
        Ok(sheets) => sheets,
        Err(e) => {
            error!(%filename, error = %e, "upload failed");
            return Json(json!({ "error": e.to_string() }));
        }
    };

    let mut workbook = state.workbook.write().await;
    workbook.replace(filename.clone(), sheets);

    let first = match workbook.first() {
        Some(sheet) => sheet,
        None => return Json(json!({ "error": "Workbook has no sheets" })),
    };
    info!(
        %filename,
        sheets = workbook.sheets.len(),
        rows = first.table.row_count(),
        cols = first.table.column_count(),
        "file loaded"
    );

    Json(json!({
        "filename": filename,
        "sheets": workbook.sheet_names(),
        "currentSheet": first.name,
        "data": first.table.rows,
        "headers": first.table.headers,
    }))
}

#[derive(Debug, Deserialize)]
pub struct SheetQuery {
    pub sheet_name: String,
}

pub async fn get_sheet_data(
    State(state): State<AppState>,
    Json(query): Json<SheetQuery>,
) -> Json<Value> {
    let workbook = state.workbook.read().await;
    match workbook.sheet(&query.sheet_name) {
        Some(table) => Json(json!({ "data": table.rows, "headers": table.headers })),
        None => Json(json!({ "error": "Sheet not found" })),
    }
}

pub async fn analyze(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeRequest>,
) -> Json<Value> {
    // snapshot under the read lock, release before the slow pipeline
    let tables = {
        let workbook = state.workbook.read().await;
        workbook.active_tables(request.sheet_name.as_deref())
    };

    info!(prompt = %request.prompt, tables = tables.len(), "analyze");
    let result = state.analyzer.analyze(&tables, &request).await;
    Json(serde_json::to_value(result).unwrap_or_else(|_| {
        json!({ "status": "error", "response": "failed to encode response" })
    }))
}

pub async fn clear_data(State(state): State<AppState>) -> Json<Value> {
    state.workbook.write().await.clear();
    Json(json!({ "status": "success", "message": "Data cleared successfully" }))
}

pub async fn download_current(State(state): State<AppState>) -> impl IntoResponse {
    let workbook = state.workbook.read().await;
    let filename = match &workbook.filename {
        Some(name) if !workbook.is_empty() => name.clone(),
        _ => {
            return (StatusCode::OK, Json(json!({ "error": "No data available" })))
                .into_response()
        }
    };

    match xlsx::write_workbook(&workbook.sheets) {
        Ok(bytes) => {
            let mut headers = HeaderMap::new();
            headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(XLSX_MIME));
            let disposition = format!("attachment; filename={filename}");
            headers.insert(
                header::CONTENT_DISPOSITION,
                HeaderValue::from_str(&disposition)
                    .unwrap_or_else(|_| HeaderValue::from_static("attachment")),
            );
            (headers, bytes).into_response()
        }
        Err(e) => {
            error!(error = %e, "download failed");
            (StatusCode::OK, Json(json!({ "error": e.to_string() }))).into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateCell {
    pub sheet_name: String,
    pub row: usize,
    pub col: usize,
    pub value: Value,
}

pub async fn update_cell(
    State(state): State<AppState>,
    Json(req): Json<UpdateCell>,
) -> Json<Value> {
    let mut workbook = state.workbook.write().await;
    let outcome = workbook
        .sheet_mut(&req.sheet_name)
        .and_then(|table| table.set_cell(req.row, req.col, req.value.clone()).map(|_| table));
    match outcome {
        Ok(table) => Json(json!({
            "status": "success",
            "message": "Cell updated successfully",
            "data": table.rows,
        })),
        Err(e) => store_error(&req.sheet_name, e),
    }
}

#[derive(Debug, Deserialize)]
pub struct AddRow {
    pub sheet_name: String,
    pub values: Vec<Value>,
}

pub async fn add_row(State(state): State<AppState>, Json(req): Json<AddRow>) -> Json<Value> {
    let mut workbook = state.workbook.write().await;
    let outcome = workbook
        .sheet_mut(&req.sheet_name)
        .and_then(|table| table.push_row(req.values.clone()).map(|_| table));
    match outcome {
        Ok(table) => Json(json!({
            "status": "success",
            "message": "Row added successfully",
            "data": table.rows,
        })),
        Err(e) => store_error(&req.sheet_name, e),
    }
}

#[derive(Debug, Deserialize)]
pub struct DeleteRow {
    pub sheet_name: String,
    pub row: usize,
}

pub async fn delete_row(State(state): State<AppState>, Json(req): Json<DeleteRow>) -> Json<Value> {
    let mut workbook = state.workbook.write().await;
    let outcome = workbook
        .sheet_mut(&req.sheet_name)
        .and_then(|table| table.delete_row(req.row).map(|_| table));
    match outcome {
        Ok(table) => Json(json!({
            "status": "success",
            "message": "Row deleted successfully",
            "data": table.rows,
        })),
        Err(e) => store_error(&req.sheet_name, e),
    }
}

#[derive(Debug, Deserialize)]
pub struct AddColumn {
    pub sheet_name: String,
    pub column_name: String,
    #[serde(default)]
    pub default_value: Value,
}

pub async fn add_column(State(state): State<AppState>, Json(req): Json<AddColumn>) -> Json<Value> {
    let mut workbook = state.workbook.write().await;
    match workbook.sheet_mut(&req.sheet_name) {
        Ok(table) => {
            table.add_column(&req.column_name, req.default_value.clone());
            Json(json!({
                "status": "success",
                "message": "Column added successfully",
                "data": table.rows,
                "headers": table.headers,
            }))
        }
        Err(e) => store_error(&req.sheet_name, e),
    }
}

#[derive(Debug, Deserialize)]
pub struct DeleteColumn {
    pub sheet_name: String,
    pub column_name: String,
}

pub async fn delete_column(
    State(state): State<AppState>,
    Json(req): Json<DeleteColumn>,
) -> Json<Value> {
    let mut workbook = state.workbook.write().await;
    let outcome = workbook
        .sheet_mut(&req.sheet_name)
        .and_then(|table| table.delete_column(&req.column_name).map(|_| table));
    match outcome {
        Ok(table) => Json(json!({
            "status": "success",
            "message": "Column deleted successfully",
            "data": table.rows,
            "headers": table.headers,
        })),
        Err(e) => store_error(&req.sheet_name, e),
    }
}

fn store_error(sheet: &str, err: StoreError) -> Json<Value> {
    warn!(%sheet, error = %err, "table operation rejected");
    Json(json!({ "status": "error", "message": err.to_string() }))
}
