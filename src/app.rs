use std::path::PathBuf;
use std::time::{Duration, Instant};

use crossbeam_channel::{never, select, tick, Receiver};

use crate::backend::Backend;
use crate::clipboard::Clipboard;
use crate::config::Config;
use crate::coordinator::{CommandOutcome, TranslationCoordinator};
use crate::error::TranslateError;
use crate::events::Command;
use crate::job::JobOutcome;

/// Everything that can wake the event loop, besides its own timers.
#[derive(Debug)]
pub enum Message {
    /// Native "clipboard changed" notification; the payload may not be committed yet.
    ClipboardChanged,
    Command(Command),
    JobFinished(JobOutcome),
    ModelsFetched(Result<Vec<String>, TranslateError>),
}

#[derive(Debug, Clone, Copy)]
pub struct Timing {
    pub debounce: Duration,
    /// `None` when a native listener is delivering notifications.
    pub poll_interval: Option<Duration>,
}

/// Writes menu selections back to the config file.
pub struct Persist {
    pub path: PathBuf,
    pub config: Config,
}

/// The single coordination context. All coordinator state is touched only from `run`.
pub struct EventLoop<C, B> {
    coordinator: TranslationCoordinator<C, B>,
    inbox: Receiver<Message>,
    timing: Timing,
    persist: Option<Persist>,
    debounce: Option<Receiver<Instant>>,
}

impl<C: Clipboard, B: Backend> EventLoop<C, B> {
    pub fn new(
        coordinator: TranslationCoordinator<C, B>,
        inbox: Receiver<Message>,
        timing: Timing,
        persist: Option<Persist>,
    ) -> Self {
        Self { coordinator, inbox, timing, persist, debounce: None }
    }

    /// Runs until `Quit` or until every sender is gone. Hands the coordinator back.
    pub fn run(mut self) -> TranslationCoordinator<C, B> {
        self.coordinator.start();
        let inbox = self.inbox.clone();
        let poll = self.timing.poll_interval.map(tick).unwrap_or_else(never);

        loop {
            let debounce = self.debounce.clone().unwrap_or_else(never);
            select! {
                recv(inbox) -> msg => match msg {
                    Ok(msg) => {
                        if !self.handle(msg) {
                            log::info!("Quit requested");
                            break;
                        }
                    }
                    Err(_) => break,
                },
                recv(debounce) -> _ => {
                    self.debounce = None;
                    self.coordinator.check_clipboard();
                }
                recv(poll) -> _ => self.coordinator.check_clipboard(),
            }
        }
        self.coordinator.shutdown();
        self.coordinator
    }

    /// Returns false when the loop should stop.
    fn handle(&mut self, msg: Message) -> bool {
        match msg {
            // a burst of notifications collapses into one check
            Message::ClipboardChanged => {
                self.debounce = Some(crossbeam_channel::after(self.timing.debounce));
            }
            Message::Command(cmd) => match self.coordinator.apply(cmd) {
                CommandOutcome::Quit => return false,
                CommandOutcome::SettingsChanged => self.save_settings(),
                CommandOutcome::Changed | CommandOutcome::Unchanged => {}
            },
            Message::JobFinished(outcome) => self.coordinator.on_job_finished(outcome),
            Message::ModelsFetched(result) => self.coordinator.on_models_fetched(result),
        }
        true
    }

    fn save_settings(&mut self) {
        let Some(persist) = self.persist.as_mut() else {
            return;
        };
        let settings = self.coordinator.settings();
        persist.config.model = settings.model.clone();
        persist.config.source_lang = settings.source_lang.display_name.to_string();
        persist.config.target_lang = settings.target_lang.display_name.to_string();
        if let Err(e) = persist.config.save_to(&persist.path) {
            log::warn!("failed to save settings to {}: {:#}", persist.path.display(), e);
        }
    }
}
