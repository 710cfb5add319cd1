//! Execution sandbox seam. Generated code comes from a remote, untrusted
//! model; whatever runs it must keep faults, mutation, and runaway loops on
//! its own side of this boundary.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::AnalysisError;
use crate::table::Table;

pub mod python;

/// What came back from one execution: the value assigned to the result
/// binding, plus anything the code printed while running.
#[derive(Debug, Clone, Default)]
pub struct ExecutionOutput {
    pub value: Value,
    pub stdout: String,
}

#[async_trait]
pub trait CodeRunner: Send + Sync {
    /// Run `code` against a snapshot of `table`. Faults inside the code come
    /// back as `AnalysisError::Execution`; a run that never assigns the
    /// result binding comes back as `AnalysisError::NoResult`. Neither may
    /// propagate as a panic, and `table` is never mutated.
    async fn execute(&self, code: &str, table: &Table) -> Result<ExecutionOutput, AnalysisError>;
}
