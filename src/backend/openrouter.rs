//! OpenRouter adapter: OpenAI-compatible chat completions, non-streaming.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::AnalysisError;
use crate::pipeline::prompt::BuiltPrompt;

use super::{ModelBackend, MAX_TOKENS, TEMPERATURE};

#[derive(Debug)]
pub struct OpenRouterBackend {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenRouterBackend {
    pub fn from_config(cfg: &Config) -> Result<Self> {
        let api_key = cfg
            .get("OPENROUTER_API_KEY")
            .ok_or_else(|| anyhow!("OPENROUTER_API_KEY not found in environment"))?;

        let mut base_url = cfg
            .get("API_BASE_URL")
            .unwrap_or_else(|| "https://openrouter.ai/api/v1".into());
        let trimmed = base_url.trim_end_matches('/');
        if !trimmed.ends_with("/v1") && !trimmed.contains("/v1/") {
            base_url = format!("{}/v1", trimmed);
        } else {
            base_url = trimmed.to_string();
        }

        let model = cfg
            .get("DEFAULT_MODEL")
            .unwrap_or_else(|| "deepseek/deepseek-r1:free".into());

        let http = reqwest::Client::builder()
            .timeout(cfg.request_timeout())
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self { http, base_url, api_key, model })
    }

    fn headers(&self) -> Result<HeaderMap, AnalysisError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let hv = HeaderValue::from_str(&format!("Bearer {}", self.api_key))
            .map_err(|e| AnalysisError::Backend(e.to_string()))?;
        headers.insert(AUTHORIZATION, hv);
        Ok(headers)
    }
}

#[async_trait]
impl ModelBackend for OpenRouterBackend {
    fn name(&self) -> &'static str {
        "openrouter"
    }

    async fn generate(&self, prompt: &BuiltPrompt) -> Result<String, AnalysisError> {
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let body = ChatRequest {
            model: self.model.clone(),
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
            messages: vec![
                Message { role: "system", content: prompt.instruction.clone() },
                Message { role: "user", content: prompt.question.clone() },
            ],
        };

        let resp = self
            .http
            .post(url)
            .headers(self.headers()?)
            .json(&body)
            .send()
            .await
            .map_err(|e| AnalysisError::Backend(format!("chat request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            return Err(AnalysisError::Backend(format!(
                "model API returned {status}: {}",
                truncate(&detail, 200)
            )));
        }

        let completion: ChatCompletion = resp
            .json()
            .await
            .map_err(|e| AnalysisError::Backend(format!("malformed completion: {e}")))?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| AnalysisError::Backend("completion had no choices".into()))
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    temperature: f32,
    max_tokens: u32,
    messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    content: String,
}
