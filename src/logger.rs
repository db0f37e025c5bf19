use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use env_logger::{Builder, Env, Target};

pub const FILTER_ENV: &str = "TRANSPASTE_LOG";

pub fn exe_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|d| d.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Windows builds have no console, so they default to `log.txt` next to the exe.
pub fn default_log_file() -> Option<PathBuf> {
    if cfg!(windows) {
        Some(exe_dir().join("log.txt"))
    } else {
        None
    }
}

/// Sets up `env_logger`. `TRANSPASTE_LOG` overrides the level picked by `debug`.
pub fn init(debug: bool, file: Option<&Path>) {
    let default_level = if debug { "debug" } else { "info" };
    let mut builder = Builder::from_env(Env::default().filter_or(FILTER_ENV, default_level));
    builder.format_timestamp_millis();

    if let Some(path) = file {
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(f) => {
                builder.target(Target::Pipe(Box::new(f)));
            }
            Err(e) => eprintln!("cannot open log file {}: {}", path.display(), e),
        }
    }

    if builder.try_init().is_ok() {
        log::info!("===== TransPaste start =====");
    }
}
