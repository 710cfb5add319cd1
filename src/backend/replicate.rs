//! Replicate adapter: single-prompt prediction with synchronous wait. The
//! instruction and the user question travel in one prompt string, question
//! last under its own delimiter.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;
use serde_json::json;

use crate::config::Config;
use crate::error::AnalysisError;
use crate::pipeline::prompt::BuiltPrompt;

use super::{ModelBackend, MAX_TOKENS, TEMPERATURE};

const PREDICTIONS_URL: &str = "https://api.replicate.com/v1/predictions";

#[derive(Debug)]
pub struct ReplicateBackend {
    http: reqwest::Client,
    api_token: String,
    version: String,
}

impl ReplicateBackend {
    pub fn from_config(cfg: &Config) -> Result<Self> {
        let api_token = cfg
            .get("REPLICATE_API_TOKEN")
            .ok_or_else(|| anyhow!("REPLICATE_API_TOKEN not found in environment"))?;

        // model identifiers look like "owner/name:version-hash"
        let model = cfg.get("REPLICATE_MODEL").unwrap_or_default();
        let version = model
            .rsplit_once(':')
            .map(|(_, v)| v.to_string())
            .ok_or_else(|| anyhow!("REPLICATE_MODEL must be owner/name:version"))?;

        let http = reqwest::Client::builder()
            .timeout(cfg.request_timeout())
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self { http, api_token, version })
    }

    fn headers(&self) -> Result<HeaderMap, AnalysisError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert("Prefer", HeaderValue::from_static("wait"));
        let hv = HeaderValue::from_str(&format!("Bearer {}", self.api_token))
            .map_err(|e| AnalysisError::Backend(e.to_string()))?;
        headers.insert(AUTHORIZATION, hv);
        Ok(headers)
    }
}

#[async_trait]
impl ModelBackend for ReplicateBackend {
    fn name(&self) -> &'static str {
        "replicate"
    }

    async fn generate(&self, prompt: &BuiltPrompt) -> Result<String, AnalysisError> {
        let body = json!({
            "version": self.version,
            "input": {
                "prompt": prompt.as_single_prompt(),
                "max_tokens": MAX_TOKENS,
                "temperature": TEMPERATURE,
            }
        });

        let resp = self
            .http
            .post(PREDICTIONS_URL)
            .headers(self.headers()?)
            .json(&body)
            .send()
            .await
            .map_err(|e| AnalysisError::Backend(format!("prediction request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            return Err(AnalysisError::Backend(format!(
                "model API returned {status}: {detail}"
            )));
        }

        let prediction: Prediction = resp
            .json()
            .await
            .map_err(|e| AnalysisError::Backend(format!("malformed prediction: {e}")))?;

        match prediction.status.as_str() {
            "succeeded" => Ok(join_output(prediction.output)),
            other => Err(AnalysisError::Backend(format!(
                "prediction {other}: {}",
                prediction.error.unwrap_or_default()
            ))),
        }
    }
}

/// Replicate text models emit either a single string or a token array.
fn join_output(output: Option<serde_json::Value>) -> String {
    match output {
        Some(serde_json::Value::String(s)) => s,
        Some(serde_json::Value::Array(parts)) => parts
            .iter()
            .filter_map(|p| p.as_str())
            .collect::<Vec<_>>()
            .join(""),
        _ => String::new(),
    }
}

#[derive(Debug, Deserialize)]
struct Prediction {
    status: String,
    #[serde(default)]
    output: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<String>,
}
