use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::client;
use crate::coordinator::Settings;
use crate::languages;

pub const DEFAULT_MODEL: &str = "gemma3:1b";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub ollama_url: String,
    pub model: String,
    pub source_lang: String,
    pub target_lang: String,
    pub timeout_secs: u64,
    pub temperature: f32,
    pub debounce_ms: u64,
    pub poll_interval_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ollama_url: client::DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            source_lang: languages::AUTO_DETECT.display_name.to_string(),
            target_lang: languages::ENGLISH.display_name.to_string(),
            timeout_secs: client::DEFAULT_TIMEOUT.as_secs(),
            temperature: 0.3,
            debounce_ms: 100,
            poll_interval_ms: 1000,
        }
    }
}

impl Config {
    pub fn path() -> PathBuf {
        let exe = std::env::current_exe().unwrap_or_else(|_| PathBuf::from("."));
        let dir = exe.parent().unwrap_or(Path::new("."));
        dir.join("config.json")
    }

    pub fn load() -> Self {
        Self::load_from(&Self::path())
    }

    /// Missing or unreadable files give the defaults.
    pub fn load_from(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(s) => serde_json::from_str::<Config>(&s).unwrap_or_else(|e| {
                log::warn!("ignoring invalid {}: {}", path.display(), e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let s = serde_json::to_string_pretty(self)?;
        fs::write(path, s).with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }

    /// Environment overrides, read through `var` so tests don't touch the process env.
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        let get = |name: &str| var(name).filter(|v| !v.trim().is_empty());
        if let Some(v) = get("OLLAMA_HOST") {
            self.ollama_url = normalize_url(&v);
        }
        if let Some(v) = get("TRANSPASTE_MODEL") {
            self.model = v;
        }
        if let Some(v) = get("TRANSPASTE_SOURCE_LANG") {
            self.source_lang = v;
        }
        if let Some(v) = get("TRANSPASTE_TARGET_LANG") {
            self.target_lang = v;
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(50))
    }

    /// Resolves the language names and model into runtime settings.
    pub fn settings(&self) -> Result<Settings> {
        let source_lang = languages::resolve(&self.source_lang)
            .with_context(|| format!("unknown source language {:?}", self.source_lang))?;
        let target_lang = languages::resolve(&self.target_lang)
            .with_context(|| format!("unknown target language {:?}", self.target_lang))?;
        if target_lang.is_auto() {
            anyhow::bail!("{} can only be used as a source language", target_lang.display_name);
        }
        let model = self.model.trim();
        if model.is_empty() {
            anyhow::bail!("model name is empty");
        }
        Ok(Settings { enabled: true, source_lang, target_lang, model: model.to_string() })
    }
}

/// `OLLAMA_HOST` is often just `host:port`.
pub fn normalize_url(raw: &str) -> String {
    let raw = raw.trim().trim_end_matches('/');
    if raw.contains("://") {
        raw.to_string()
    } else {
        format!("http://{}", raw)
    }
}
