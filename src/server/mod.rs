//! HTTP surface: axum router over the shared workbook store and the analyzer.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tracing::info;

use crate::pipeline::Analyzer;
use crate::table::Workbook;

mod routes;

#[derive(Clone)]
pub struct AppState {
    pub workbook: Arc<RwLock<Workbook>>,
    pub analyzer: Arc<Analyzer>,
    pub allowed_origin: String,
}

impl AppState {
    pub fn new(analyzer: Arc<Analyzer>, allowed_origin: String) -> Self {
        Self {
            workbook: Arc::new(RwLock::new(Workbook::default())),
            analyzer,
            allowed_origin,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/upload", post(routes::upload))
        .route("/get-sheet-data", post(routes::get_sheet_data))
        .route("/analyze", post(routes::analyze))
        .route("/clear-data", post(routes::clear_data))
        .route("/download-current", get(routes::download_current))
        .route("/update-cell", post(routes::update_cell))
        .route("/add-row", post(routes::add_row))
        .route("/delete-row", post(routes::delete_row))
        .route("/add-column", post(routes::add_column))
        .route("/delete-column", post(routes::delete_column))
        .layer(middleware::from_fn_with_state(state.clone(), cors))
        .with_state(state)
}

pub async fn serve(addr: &str, state: AppState) -> anyhow::Result<()> {
    let app = router(state);
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "listening");
    tokio::select! {
        res = axum::serve(listener, app) => res?,
        _ = tokio::signal::ctrl_c() => info!("shutting down"),
    }
    Ok(())
}

/// Single-origin CORS for the browser frontend, preflight included.
async fn cors(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let origin = HeaderValue::from_str(&state.allowed_origin)
        .unwrap_or_else(|_| HeaderValue::from_static("*"));

    if req.method() == Method::OPTIONS {
        let mut res = Response::new(axum::body::Body::empty());
        *res.status_mut() = StatusCode::NO_CONTENT;
        apply_cors(&mut res, origin);
        return res;
    }

    let mut res = next.run(req).await;
    apply_cors(&mut res, origin);
    res
}

fn apply_cors(res: &mut Response, origin: HeaderValue) {
    let headers = res.headers_mut();
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin);
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("content-type, authorization"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
        HeaderValue::from_static("true"),
    );
}
