#![cfg_attr(target_os = "windows", windows_subsystem = "windows")]

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

mod app;
mod backend;
mod client;
mod clipboard;
mod config;
mod coordinator;
mod error;
mod events;
mod job;
mod languages;
mod logger;
mod notify;
mod prompt;
mod sanitize;
#[cfg(any(windows, target_os = "linux"))]
mod tray;
#[cfg(windows)]
mod win_clipboard;

use app::{EventLoop, Message, Persist, Timing};
use backend::OllamaBackend;
use client::OllamaClient;
use clipboard::SystemClipboard;
use config::Config;
use coordinator::TranslationCoordinator;

/// Local LLM clipboard translator.
#[derive(Parser, Debug)]
#[command(name = "transpaste", version, about)]
struct Cli {
    /// Ollama model to use (default: gemma3:1b)
    #[arg(long)]
    model: Option<String>,
    /// Source language, display name or code (default: Auto Detect)
    #[arg(long)]
    source: Option<String>,
    /// Target language, display name or code (default: English)
    #[arg(long)]
    target: Option<String>,
    /// Ollama base URL (default: http://localhost:11434)
    #[arg(long)]
    ollama_url: Option<String>,
    /// Seconds to wait for a translation
    #[arg(long)]
    timeout: Option<u64>,
    /// Clipboard poll interval when no native change notification is available
    #[arg(long)]
    poll_interval_ms: Option<u64>,
    /// Append logs to this file instead of the platform default
    #[arg(long)]
    log_file: Option<PathBuf>,
    #[arg(long)]
    debug: bool,
}

impl Cli {
    fn apply(&self, cfg: &mut Config) {
        if let Some(v) = &self.model {
            cfg.model = v.clone();
        }
        if let Some(v) = &self.source {
            cfg.source_lang = v.clone();
        }
        if let Some(v) = &self.target {
            cfg.target_lang = v.clone();
        }
        if let Some(v) = &self.ollama_url {
            cfg.ollama_url = config::normalize_url(v);
        }
        if let Some(v) = self.timeout {
            cfg.timeout_secs = v;
        }
        if let Some(v) = self.poll_interval_ms {
            cfg.poll_interval_ms = v;
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let log_file = cli.log_file.clone().or_else(logger::default_log_file);
    logger::init(cli.debug, log_file.as_deref());

    // defaults < config.json < environment < flags
    let config_path = Config::path();
    let file_cfg = Config::load();
    let mut cfg = file_cfg.clone();
    cfg.apply_env(|name| std::env::var(name).ok());
    cli.apply(&mut cfg);
    log::info!("Config loaded from {}", config_path.display());

    let settings = match cfg.settings() {
        Ok(s) => s,
        Err(e) => {
            notify::toast(notify::APP_NAME, &format!("Invalid settings: {:#}", e));
            return Err(e);
        }
    };

    let rt = tokio::runtime::Runtime::new().context("starting tokio runtime")?;
    let client = Arc::new(OllamaClient::new(&cfg.ollama_url, cfg.timeout(), cfg.temperature)?);
    log::info!("Using Ollama at {} (timeout {}s)", cfg.ollama_url, cfg.timeout().as_secs());

    let (inbox_tx, inbox_rx) = crossbeam_channel::unbounded::<Message>();
    let (events_tx, events_rx) = crossbeam_channel::unbounded();

    #[cfg(any(windows, target_os = "linux"))]
    tray::spawn(inbox_tx.clone(), events_rx);
    // tray-icon needs the main thread's run loop on macOS, which the event loop owns
    #[cfg(not(any(windows, target_os = "linux")))]
    std::thread::spawn(move || notify::run_headless(events_rx));

    #[cfg(windows)]
    let native = win_clipboard::spawn_change_listener(inbox_tx.clone());
    #[cfg(not(windows))]
    let native = false;
    if !native {
        log::info!("No native clipboard notifications; polling every {}ms", cfg.poll_interval().as_millis());
    }
    let timing = Timing {
        debounce: cfg.debounce(),
        poll_interval: (!native).then(|| cfg.poll_interval()),
    };

    let clipboard = SystemClipboard::new().context("opening the clipboard")?;
    let backend = OllamaBackend::new(rt.handle().clone(), client, inbox_tx);
    let coordinator = TranslationCoordinator::new(settings, clipboard, backend, events_tx);

    // menu changes are written over the file values, not over env/flag overrides
    let persist = Persist { path: config_path, config: file_cfg };
    EventLoop::new(coordinator, inbox_rx, timing, Some(persist)).run();
    log::info!("Exiting");
    Ok(())
}
