use std::collections::BTreeSet;
use std::time::Duration;

use crate::error::TranslateError;

pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);
const MODEL_LIST_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(serde::Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(serde::Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(serde::Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(serde::Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(serde::Deserialize)]
struct ModelTag {
    name: String,
}

/// Thin client for the Ollama `generate` and `tags` endpoints.
pub struct OllamaClient {
    http: reqwest::Client,
    generate_url: String,
    tags_url: String,
    timeout: Duration,
    temperature: f32,
}

impl OllamaClient {
    pub fn new(base_url: &str, timeout: Duration, temperature: f32) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        let base = base_url.trim_end_matches('/');
        Ok(Self {
            http,
            generate_url: format!("{}/api/generate", base),
            tags_url: format!("{}/api/tags", base),
            timeout,
            temperature,
        })
    }

    /// One non-streaming completion. The returned text is trimmed and never blank.
    pub async fn translate(&self, prompt: &str, model: &str) -> Result<String, TranslateError> {
        let req = GenerateRequest {
            model,
            prompt,
            stream: false,
            options: GenerateOptions { temperature: self.temperature },
        };

        let resp = self
            .http
            .post(&self.generate_url)
            .json(&req)
            .send()
            .await
            .map_err(|e| TranslateError::from_reqwest(e, self.timeout))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(TranslateError::Backend(format!("{} {}", status, text.trim())));
        }

        let parsed: GenerateResponse = resp
            .json()
            .await
            .map_err(|e| TranslateError::from_reqwest(e, self.timeout))?;
        let out = parsed.response.trim();
        if out.is_empty() {
            return Err(TranslateError::EmptyResult);
        }
        Ok(out.to_string())
    }

    /// Installed models, sorted and deduplicated. `current` is always part of the list.
    pub async fn list_models(&self, current: &str) -> Result<Vec<String>, TranslateError> {
        let resp = self
            .http
            .get(&self.tags_url)
            .timeout(MODEL_LIST_TIMEOUT)
            .send()
            .await
            .map_err(|e| TranslateError::from_reqwest(e, MODEL_LIST_TIMEOUT))?;

        if !resp.status().is_success() {
            return Err(TranslateError::Backend(format!("model list: {}", resp.status())));
        }

        let tags: TagsResponse = resp
            .json()
            .await
            .map_err(|e| TranslateError::from_reqwest(e, MODEL_LIST_TIMEOUT))?;
        Ok(merge_models(tags.models.into_iter().map(|m| m.name), current))
    }
}

pub fn merge_models(names: impl IntoIterator<Item = String>, current: &str) -> Vec<String> {
    let mut set: BTreeSet<String> = names.into_iter().filter(|n| !n.trim().is_empty()).collect();
    set.insert(current.to_string());
    set.into_iter().collect()
}
