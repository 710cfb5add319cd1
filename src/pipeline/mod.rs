//! Pipeline orchestration: prompt -> model -> code -> sandbox -> result.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::backend::ModelBackend;
use crate::error::AnalysisError;
use crate::sandbox::CodeRunner;
use crate::table::Table;

pub mod extract;
pub mod prompt;

/// A user question, optionally aimed at a named sheet. The sheet selection is
/// resolved by the store before `analyze` is called.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzeRequest {
    pub prompt: String,
    #[serde(default)]
    pub sheet_name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

/// Terminal outcome of one pipeline invocation. Exactly one meaning: either a
/// success carrying the model narrative plus the computed value, or an error
/// carrying a human-readable message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub status: Status,
    pub response: String,
}

impl AnalyzeResponse {
    fn success(response: String) -> Self {
        Self { status: Status::Success, response }
    }

    fn error(message: String) -> Self {
        Self { status: Status::Error, response: message }
    }
}

pub struct Analyzer {
    backend: Arc<dyn ModelBackend>,
    runner: Arc<dyn CodeRunner>,
}

impl Analyzer {
    pub fn new(backend: Arc<dyn ModelBackend>, runner: Arc<dyn CodeRunner>) -> Self {
        Self { backend, runner }
    }

    /// Single best-effort attempt: no retries, no caching, no partial results.
    pub async fn analyze(&self, tables: &[Table], request: &AnalyzeRequest) -> AnalyzeResponse {
        match self.run(tables, request).await {
            Ok(text) => AnalyzeResponse::success(text),
            Err(err) => {
                warn!(backend = self.backend.name(), error = %err, "analysis failed");
                AnalyzeResponse::error(err.to_string())
            }
        }
    }

    async fn run(&self, tables: &[Table], request: &AnalyzeRequest) -> Result<String, AnalysisError> {
        // no table, no backend call
        let table = tables.first().ok_or(AnalysisError::NoData)?;

        let built = prompt::build(&request.prompt);
        let raw = self.backend.generate(&built).await?;
        debug!(chars = raw.len(), "model reply received");

        let code = extract::extract_python_block(&raw).ok_or(AnalysisError::NoCode)?;
        let outcome = self.runner.execute(code, table).await?;

        Ok(format!(
            "Analysis:\n{raw}\n\nResult:\n{}",
            render_value(&outcome.value)
        ))
    }
}

/// Strings render bare, everything else as compact JSON.
fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
