//! Model backends. One capability: turn a built prompt into raw reply text
//! with a single remote call. Concrete adapters are chosen at startup from
//! configuration; a missing credential is fatal there, never per-request.

use std::sync::Arc;

use anyhow::{bail, Result};
use async_trait::async_trait;

use crate::config::Config;
use crate::error::AnalysisError;
use crate::pipeline::prompt::BuiltPrompt;

pub mod openrouter;
pub mod replicate;

/// Code generation is deterministic-ish at low temperature; both adapters pin
/// the same sampling settings.
pub const TEMPERATURE: f32 = 0.1;
pub const MAX_TOKENS: u32 = 4096;

#[async_trait]
pub trait ModelBackend: Send + Sync {
    fn name(&self) -> &'static str;

    /// One outbound call, full reply awaited, no retries.
    async fn generate(&self, prompt: &BuiltPrompt) -> Result<String, AnalysisError>;
}

/// Construct the configured backend. Errors here mean the service cannot
/// start with the given configuration.
pub fn from_config(cfg: &Config) -> Result<Arc<dyn ModelBackend>> {
    let kind = cfg.get("MODEL_BACKEND").unwrap_or_else(|| "openrouter".into());
    match kind.as_str() {
        "openrouter" => Ok(Arc::new(openrouter::OpenRouterBackend::from_config(cfg)?)),
        "replicate" => Ok(Arc::new(replicate::ReplicateBackend::from_config(cfg)?)),
        other => bail!("unknown MODEL_BACKEND: {other}"),
    }
}
