//! Gemini adapter (topic classification).
//!
//! Calls the `generateContent` endpoint with a JSON response MIME type and
//! hands the raw text back to the core for validation.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::info;

use tgf_core::{
    config::Config,
    domain::ChatRecord,
    errors::Error,
    plan::{build_prompt, PlanLimits},
    ports::Classifier,
    Result,
};

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Clone, Debug)]
pub struct GeminiSettings {
    pub api_key: String,
    pub model: String,
    pub timeout: Duration,
    pub max_response_bytes: usize,
    pub limits: PlanLimits,
}

impl GeminiSettings {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            api_key: cfg.gemini_api_key.clone(),
            model: cfg.gemini_model.clone(),
            timeout: cfg.gemini_timeout,
            max_response_bytes: cfg.classifier_max_response_bytes,
            limits: cfg.plan_limits,
        }
    }
}

#[derive(Clone, Debug)]
pub struct GeminiClassifier {
    settings: GeminiSettings,
    http: reqwest::Client,
}

impl GeminiClassifier {
    pub fn new(settings: GeminiSettings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| Error::Config(format!("reqwest client build: {e}")))?;
        Ok(Self { settings, http })
    }

    fn endpoint(&self) -> String {
        format!("{API_BASE}/models/{}:generateContent", self.settings.model)
    }
}

/// Request body for one classification call.
pub fn request_body(prompt: &str) -> Value {
    json!({
        "contents": [{
            "role": "user",
            "parts": [{ "text": prompt }]
        }],
        "generationConfig": {
            "temperature": 1,
            "topP": 0.95,
            "topK": 40,
            "maxOutputTokens": 15000,
            "responseMimeType": "application/json"
        }
    })
}

/// Pull the first candidate's text out of a `generateContent` response.
pub fn extract_text(v: &Value) -> Result<String> {
    if let Some(reason) = v
        .pointer("/promptFeedback/blockReason")
        .and_then(Value::as_str)
    {
        return Err(Error::Classification(format!(
            "gemini blocked the prompt: {reason}"
        )));
    }

    let text = v
        .pointer("/candidates/0/content/parts/0/text")
        .and_then(Value::as_str)
        .unwrap_or("");

    if text.trim().is_empty() {
        let finish = v
            .pointer("/candidates/0/finishReason")
            .and_then(Value::as_str)
            .unwrap_or("unknown");
        return Err(Error::Classification(format!(
            "gemini returned no text (finish reason: {finish})"
        )));
    }

    Ok(text.to_string())
}

fn check_size(len: usize, max: usize) -> Result<()> {
    if len > max {
        return Err(Error::Classification(format!(
            "gemini response is {len} bytes, limit is {max}"
        )));
    }
    Ok(())
}

fn status_error(status: reqwest::StatusCode, body: &[u8]) -> Error {
    let text = String::from_utf8_lossy(body);
    Error::Classification(format!(
        "gemini request failed: {status} {}",
        text.chars().take(200).collect::<String>()
    ))
}

/// Map the HTTP status and body of a `generateContent` call to its JSON value.
pub fn check_response(status: reqwest::StatusCode, body: &[u8], max: usize) -> Result<Value> {
    if !status.is_success() {
        return Err(status_error(status, body));
    }
    check_size(body.len(), max)?;
    serde_json::from_slice(body)
        .map_err(|e| Error::Classification(format!("gemini json error: {e}")))
}

#[async_trait]
impl Classifier for GeminiClassifier {
    async fn classify(&self, chats: &[ChatRecord]) -> Result<String> {
        let prompt = build_prompt(chats, &self.settings.limits)?;
        info!(chats = chats.len(), model = %self.settings.model, "sending chats to gemini");

        let mut resp = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.settings.api_key)
            .json(&request_body(&prompt))
            .send()
            .await
            .map_err(|e| Error::Classification(format!("gemini request error: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let head = resp.chunk().await.ok().flatten().unwrap_or_default();
            return Err(status_error(status, &head));
        }

        let max = self.settings.max_response_bytes;
        if let Some(declared) = resp.content_length() {
            check_size(declared as usize, max)?;
        }

        let mut body = Vec::new();
        while let Some(chunk) = resp
            .chunk()
            .await
            .map_err(|e| Error::Classification(format!("gemini body error: {e}")))?
        {
            check_size(body.len() + chunk.len(), max)?;
            body.extend_from_slice(&chunk);
        }

        let v = check_response(status, &body, max)?;
        let text = extract_text(&v)?;
        info!(bytes = text.len(), "received classification from gemini");
        Ok(text)
    }
}
