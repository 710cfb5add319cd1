//! Recoverable pipeline errors. Missing credentials are not here: they are
//! fatal at startup, surfaced as `anyhow` errors from backend construction.

use thiserror::Error;

/// Everything that can go wrong between receiving an analysis request and
/// producing a terminal outcome. All variants map to an `error` response; none
/// crash the orchestrator.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("No data available for analysis")]
    NoData,

    /// Network or API fault while talking to the model backend. No retry.
    #[error("{0}")]
    Backend(String),

    #[error("No executable code found in model response")]
    NoCode,

    /// The generated code raised; carries the fault text from the sandbox.
    #[error("{0}")]
    Execution(String),

    /// The code ran to completion but never assigned the result variable.
    #[error("no result produced")]
    NoResult,
}
