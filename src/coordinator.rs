use crossbeam_channel::Sender;

use crate::backend::Backend;
use crate::clipboard::{Clipboard, ClipboardWatcher, Detection};
use crate::error::TranslateError;
use crate::events::{AppEvent, Command, Status};
use crate::job::{JobOutcome, JobState, TranslationJob, TranslationRequest};
use crate::languages::{self, LanguageEntry};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub enabled: bool,
    pub source_lang: &'static LanguageEntry,
    pub target_lang: &'static LanguageEntry,
    pub model: String,
}

/// What the event loop should do after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Unchanged,
    Changed,
    /// Language or model changed; worth writing back to the config file.
    SettingsChanged,
    Quit,
}

/// Owns the settings, the watcher state and the single active job.
/// Lives on the event loop thread; workers only see their request and token.
pub struct TranslationCoordinator<C, B> {
    settings: Settings,
    models: Vec<String>,
    clipboard: C,
    backend: B,
    watcher: ClipboardWatcher,
    current_id: u64,
    active: Option<TranslationJob>,
    events: Sender<AppEvent>,
}

impl<C: Clipboard, B: Backend> TranslationCoordinator<C, B> {
    pub fn new(settings: Settings, clipboard: C, backend: B, events: Sender<AppEvent>) -> Self {
        let models = vec![settings.model.clone()];
        Self {
            settings,
            models,
            clipboard,
            backend,
            watcher: ClipboardWatcher::new(),
            current_id: 0,
            active: None,
            events,
        }
    }

    /// Startup: ignore whatever is already on the clipboard, announce, fetch models.
    pub fn start(&mut self) {
        let current = self.clipboard.read_text();
        self.watcher.prime(current);
        self.emit(AppEvent::Started(self.status()));
        self.refresh_models();
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn models(&self) -> &[String] {
        &self.models
    }

    #[cfg(test)]
    pub fn active_job(&self) -> Option<&TranslationJob> {
        self.active.as_ref()
    }

    /// Signals the running job, if any; its result will not be applied.
    pub fn shutdown(&mut self) {
        if let Some(job) = self.active.as_mut().filter(|j| j.is_running()) {
            log::info!("cancelling job {} on exit", job.id());
            job.cancel();
        }
    }

    pub fn status(&self) -> Status {
        Status {
            enabled: self.settings.enabled,
            source_lang: self.settings.source_lang.display_name,
            target_lang: self.settings.target_lang.display_name,
            model: self.settings.model.clone(),
            models: self.models().to_vec(),
        }
    }

    /// Reads the clipboard and reacts if it holds a new external copy.
    pub fn check_clipboard(&mut self) {
        let current = self.clipboard.read_text();
        match self.watcher.check(current) {
            Detection::Copied(text) => self.on_text_copied(text),
            Detection::SelfWrite => log::debug!("ignoring our own clipboard write"),
            Detection::Empty | Detection::Duplicate => {}
        }
    }

    pub fn on_text_copied(&mut self, text: String) {
        if !self.settings.enabled {
            log::debug!("translation disabled; ignoring copy");
            return;
        }
        log::info!("Detected copy: {}", preview(&text, 20));

        if let Some(job) = self.active.as_mut().filter(|j| j.is_running()) {
            log::info!("cancelling job {} in favour of a newer copy", job.id());
            job.cancel();
        }

        let Some(request) = TranslationRequest::new(
            text,
            self.settings.source_lang,
            self.settings.target_lang,
            self.settings.model.clone(),
        ) else {
            return;
        };

        self.current_id += 1;
        let mut job = TranslationJob::new(self.current_id, request);
        self.backend.start(&job);
        job.start();
        log::info!(
            "job {} started: {} chars with {} -> {}",
            job.id(),
            job.request().text().chars().count(),
            self.settings.model,
            self.settings.target_lang.display_name
        );
        self.active = Some(job);
    }

    pub fn on_job_finished(&mut self, outcome: JobOutcome) {
        let current_id = self.current_id;
        let job = match self.active.as_mut() {
            Some(job) if job.id() == outcome.id && outcome.id == current_id => job,
            _ => {
                log::debug!("discarding superseded job {}", outcome.id);
                return;
            }
        };
        if job.state() != JobState::Running || job.token().is_cancelled() {
            log::debug!("discarding result of cancelled job {}", outcome.id);
            return;
        }

        match outcome.result {
            Ok(text) => {
                job.complete();
                log::info!("Translation finished: {}", preview(&text, 20));
                let previous = self.watcher.last_seen().to_string();
                self.watcher.record_self_write(&text);
                match self.clipboard.write_text(&text) {
                    Ok(()) => self.emit(AppEvent::Translated(text)),
                    Err(e) => {
                        // the clipboard still holds the source text
                        self.watcher.abandon_self_write(previous);
                        log::error!("{:#}", e);
                        self.emit(AppEvent::Failed(format!("Translated, but {}", e)));
                    }
                }
            }
            Err(TranslateError::Cancelled) => job.cancel(),
            Err(e) => {
                job.fail();
                log::warn!("job {} failed: {}", outcome.id, e);
                if e.is_reportable() {
                    self.emit(AppEvent::Failed(e.to_string()));
                }
            }
        }
    }

    /// Gates new jobs only; a running job still delivers its result.
    pub fn set_enabled(&mut self, enabled: bool) -> bool {
        if self.settings.enabled == enabled {
            return false;
        }
        self.settings.enabled = enabled;
        log::info!("translation {}", if enabled { "enabled" } else { "disabled" });
        self.emit(AppEvent::EnabledChanged(enabled));
        true
    }

    pub fn set_source_lang(&mut self, name: &str) -> bool {
        match languages::by_name(name) {
            Some(lang) if lang != self.settings.source_lang => {
                self.settings.source_lang = lang;
                true
            }
            Some(_) => false,
            None => {
                log::warn!("unknown source language {:?}", name);
                false
            }
        }
    }

    pub fn set_target_lang(&mut self, name: &str) -> bool {
        match languages::by_name(name) {
            Some(lang) if lang.is_auto() => {
                log::warn!("{} is not a valid target language", lang.display_name);
                false
            }
            Some(lang) if lang != self.settings.target_lang => {
                self.settings.target_lang = lang;
                true
            }
            Some(_) => false,
            None => {
                log::warn!("unknown target language {:?}", name);
                false
            }
        }
    }

    pub fn set_model(&mut self, model: &str) -> bool {
        let model = model.trim();
        if model.is_empty() || model == self.settings.model {
            return false;
        }
        log::info!("Model switched to: {}", model);
        self.settings.model = model.to_string();
        if !self.models.iter().any(|m| m == model) {
            self.models = crate::client::merge_models(std::mem::take(&mut self.models), model);
        }
        true
    }

    pub fn refresh_models(&mut self) {
        self.backend.fetch_models(&self.settings.model);
    }

    /// A failed listing keeps the previous set.
    pub fn on_models_fetched(&mut self, result: Result<Vec<String>, TranslateError>) {
        match result {
            Ok(models) => {
                self.models = crate::client::merge_models(models, &self.settings.model);
                log::info!("found {} models", self.models.len());
                self.emit(AppEvent::ModelsRefreshed(self.models.len()));
                self.emit(AppEvent::StateChanged(self.status()));
            }
            Err(e) => log::warn!("Failed to fetch models: {}", e),
        }
    }

    pub fn apply(&mut self, command: Command) -> CommandOutcome {
        let outcome = match command {
            Command::ToggleEnabled => changed(self.set_enabled(!self.settings.enabled)),
            Command::SetSourceLang(name) => persisted(self.set_source_lang(&name)),
            Command::SetTargetLang(name) => persisted(self.set_target_lang(&name)),
            Command::SetModel(name) => persisted(self.set_model(&name)),
            Command::RefreshModels => {
                self.refresh_models();
                CommandOutcome::Unchanged
            }
            Command::Quit => return CommandOutcome::Quit,
        };
        if outcome != CommandOutcome::Unchanged {
            self.emit(AppEvent::StateChanged(self.status()));
        }
        outcome
    }

    fn emit(&self, event: AppEvent) {
        if self.events.send(event).is_err() {
            log::debug!("no UI listening for events");
        }
    }
}

fn changed(yes: bool) -> CommandOutcome {
    if yes {
        CommandOutcome::Changed
    } else {
        CommandOutcome::Unchanged
    }
}

fn persisted(yes: bool) -> CommandOutcome {
    if yes {
        CommandOutcome::SettingsChanged
    } else {
        CommandOutcome::Unchanged
    }
}

pub fn preview(text: &str, max_chars: usize) -> String {
    let mut out: String = text.chars().take(max_chars).collect();
    if text.chars().count() > max_chars {
        out.push_str("...");
    }
    out
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::clipboard::tests::MemoryClipboard;
    use crate::languages::{AUTO_DETECT, ENGLISH};
    use crossbeam_channel::Receiver;
    use std::sync::{Arc, Mutex};

    /// Records what would have been sent to Ollama.
    #[derive(Clone, Default)]
    pub(crate) struct RecordingBackend {
        started: Arc<Mutex<Vec<(u64, TranslationRequest)>>>,
        model_fetches: Arc<Mutex<Vec<String>>>,
    }

    impl RecordingBackend {
        pub fn started(&self) -> Vec<(u64, TranslationRequest)> {
            self.started.lock().unwrap().clone()
        }

        pub fn model_fetches(&self) -> Vec<String> {
            self.model_fetches.lock().unwrap().clone()
        }
    }

    impl Backend for RecordingBackend {
        fn start(&self, job: &TranslationJob) {
            self.started.lock().unwrap().push((job.id(), job.request().clone()));
        }

        fn fetch_models(&self, current: &str) {
            self.model_fetches.lock().unwrap().push(current.to_string());
        }
    }

    pub(crate) fn settings() -> Settings {
        Settings { enabled: true, source_lang: &AUTO_DETECT, target_lang: &ENGLISH, model: "gemma3:1b".into() }
    }

    type Fixture = (
        TranslationCoordinator<MemoryClipboard, RecordingBackend>,
        MemoryClipboard,
        RecordingBackend,
        Receiver<AppEvent>,
    );

    fn fixture() -> Fixture {
        let clipboard = MemoryClipboard::default();
        let backend = RecordingBackend::default();
        let (tx, rx) = crossbeam_channel::unbounded();
        let coordinator = TranslationCoordinator::new(settings(), clipboard.clone(), backend.clone(), tx);
        (coordinator, clipboard, backend, rx)
    }

    fn copy(c: &mut TranslationCoordinator<MemoryClipboard, RecordingBackend>, clip: &MemoryClipboard, text: &str) {
        clip.set(text);
        c.check_clipboard();
    }

    fn ok(id: u64, text: &str) -> JobOutcome {
        JobOutcome { id, result: Ok(text.to_string()) }
    }

    fn drain(rx: &Receiver<AppEvent>) -> Vec<AppEvent> {
        rx.try_iter().collect()
    }

    #[test]
    fn copy_starts_a_job_and_result_is_written() {
        let (mut c, clip, backend, rx) = fixture();
        copy(&mut c, &clip, "hello");

        let started = backend.started();
        assert_eq!(started.len(), 1);
        assert_eq!(started[0].0, 1);
        assert_eq!(started[0].1.text(), "hello");
        assert_eq!(started[0].1.model(), "gemma3:1b");
        assert!(c.active_job().is_some_and(|j| j.is_running()));

        c.on_job_finished(ok(1, "bonjour"));
        assert_eq!(clip.writes(), vec!["bonjour".to_string()]);
        assert_eq!(c.active_job().map(|j| j.state()), Some(JobState::Completed));
        assert_eq!(drain(&rx), vec![AppEvent::Translated("bonjour".into())]);
    }

    #[test]
    fn later_job_supersedes_earlier_regardless_of_completion_order() {
        let (mut c, clip, _backend, _rx) = fixture();
        copy(&mut c, &clip, "first");
        copy(&mut c, &clip, "second");

        // B finishes first, then the stale A result shows up
        c.on_job_finished(ok(2, "deuxième"));
        c.on_job_finished(ok(1, "premier"));
        assert_eq!(clip.writes(), vec!["deuxième".to_string()]);
    }

    #[test]
    fn stale_result_arriving_before_newer_one_is_dropped() {
        let (mut c, clip, _backend, rx) = fixture();
        copy(&mut c, &clip, "first");
        copy(&mut c, &clip, "second");

        c.on_job_finished(ok(1, "premier"));
        assert!(clip.writes().is_empty());
        assert!(drain(&rx).is_empty());

        c.on_job_finished(ok(2, "deuxième"));
        assert_eq!(clip.writes(), vec!["deuxième".to_string()]);
    }

    #[test]
    fn superseded_job_token_is_signalled() {
        let (mut c, clip, _backend, _rx) = fixture();
        copy(&mut c, &clip, "first");
        let first_token = c.active_job().map(|j| j.token().clone()).expect("job");
        copy(&mut c, &clip, "second");
        assert!(first_token.is_cancelled());
        assert_eq!(c.active_job().map(|j| j.id()), Some(2));
    }

    #[test]
    fn failed_newer_job_does_not_let_older_result_through() {
        let (mut c, clip, _backend, rx) = fixture();
        copy(&mut c, &clip, "first");
        copy(&mut c, &clip, "second");

        c.on_job_finished(JobOutcome { id: 2, result: Err(TranslateError::EmptyResult) });
        c.on_job_finished(ok(1, "premier"));
        assert!(clip.writes().is_empty());
        assert_eq!(drain(&rx), vec![AppEvent::Failed("Empty response from Ollama".into())]);
    }

    #[test]
    fn own_write_does_not_trigger_another_job() {
        let (mut c, clip, backend, _rx) = fixture();
        copy(&mut c, &clip, "hello");
        c.on_job_finished(ok(1, "bonjour"));
        assert_eq!(clip.current(), Some("bonjour".to_string()));

        // notification for our own write, then a poll tick
        c.check_clipboard();
        c.check_clipboard();
        assert_eq!(backend.started().len(), 1);
    }

    #[test]
    fn duplicate_checks_start_one_job() {
        let (mut c, clip, backend, _rx) = fixture();
        clip.set("hello");
        c.check_clipboard();
        c.check_clipboard();
        c.check_clipboard();
        assert_eq!(backend.started().len(), 1);
    }

    #[test]
    fn failure_is_reported_and_clipboard_untouched() {
        let (mut c, clip, _backend, rx) = fixture();
        copy(&mut c, &clip, "hello");
        c.on_job_finished(JobOutcome {
            id: 1,
            result: Err(TranslateError::Timeout(std::time::Duration::from_secs(120))),
        });
        assert!(clip.writes().is_empty());
        assert_eq!(c.active_job().map(|j| j.state()), Some(JobState::Failed));
        assert_eq!(
            drain(&rx),
            vec![AppEvent::Failed("Timeout after 120s. The model took too long.".into())]
        );
    }

    #[test]
    fn cancelled_outcome_is_silent() {
        let (mut c, clip, _backend, rx) = fixture();
        copy(&mut c, &clip, "hello");
        c.on_job_finished(JobOutcome { id: 1, result: Err(TranslateError::Cancelled) });
        assert!(drain(&rx).is_empty());
        assert_eq!(c.active_job().map(|j| j.state()), Some(JobState::Cancelled));
    }

    #[test]
    fn failed_clipboard_write_is_reported() {
        let clipboard = MemoryClipboard { fail_writes: true, ..Default::default() };
        let (tx, rx) = crossbeam_channel::unbounded();
        let mut c = TranslationCoordinator::new(settings(), clipboard.clone(), RecordingBackend::default(), tx);
        copy(&mut c, &clipboard, "hello");
        c.on_job_finished(ok(1, "bonjour"));
        match drain(&rx).as_slice() {
            [AppEvent::Failed(msg)] => assert!(msg.contains("clipboard busy"), "{msg}"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn failed_clipboard_write_does_not_retranslate_source() {
        let clipboard = MemoryClipboard { fail_writes: true, ..Default::default() };
        let backend = RecordingBackend::default();
        let (tx, _rx) = crossbeam_channel::unbounded();
        let mut c = TranslationCoordinator::new(settings(), clipboard.clone(), backend.clone(), tx);
        copy(&mut c, &clipboard, "hello");
        c.on_job_finished(ok(1, "bonjour"));
        assert_eq!(clipboard.current(), Some("hello".to_string()));

        // later notification and poll ticks see the unchanged source text
        c.check_clipboard();
        c.check_clipboard();
        assert_eq!(backend.started().len(), 1);

        // a new copy after the failure is still picked up
        copy(&mut c, &clipboard, "bonjour");
        assert_eq!(backend.started().len(), 2);
    }

    #[test]
    fn disabled_ignores_copies_but_keeps_running_job() {
        let (mut c, clip, backend, rx) = fixture();
        copy(&mut c, &clip, "hello");
        assert_eq!(c.apply(Command::ToggleEnabled), CommandOutcome::Changed);
        assert!(!c.settings().enabled);

        copy(&mut c, &clip, "ignored");
        assert_eq!(backend.started().len(), 1);

        c.on_job_finished(ok(1, "bonjour"));
        assert_eq!(clip.writes(), vec!["bonjour".to_string()]);

        let events = drain(&rx);
        assert_eq!(events[0], AppEvent::EnabledChanged(false));
        assert!(matches!(&events[1], AppEvent::StateChanged(s) if !s.enabled));
        assert_eq!(events[2], AppEvent::Translated("bonjour".into()));
    }

    #[test]
    fn text_seen_while_disabled_is_not_translated_later() {
        let (mut c, clip, backend, _rx) = fixture();
        c.set_enabled(false);
        copy(&mut c, &clip, "while off");
        c.set_enabled(true);
        c.check_clipboard();
        assert!(backend.started().is_empty());
    }

    #[test]
    fn new_job_uses_current_settings() {
        let (mut c, clip, backend, _rx) = fixture();
        assert_eq!(c.apply(Command::SetSourceLang("German".into())), CommandOutcome::SettingsChanged);
        assert_eq!(c.apply(Command::SetTargetLang("Japanese".into())), CommandOutcome::SettingsChanged);
        assert_eq!(c.apply(Command::SetModel("qwen2.5:7b".into())), CommandOutcome::SettingsChanged);
        copy(&mut c, &clip, "Guten Tag");

        let started = backend.started();
        let req = &started[0].1;
        assert_eq!(req.source_lang().code, "de");
        assert_eq!(req.target_lang().code, "ja");
        assert_eq!(req.model(), "qwen2.5:7b");
        assert_eq!(c.models(), &["gemma3:1b".to_string(), "qwen2.5:7b".to_string()]);
    }

    #[test]
    fn invalid_language_commands_are_rejected() {
        let (mut c, _clip, _backend, rx) = fixture();
        assert_eq!(c.apply(Command::SetTargetLang("Auto Detect".into())), CommandOutcome::Unchanged);
        assert_eq!(c.apply(Command::SetSourceLang("Klingon".into())), CommandOutcome::Unchanged);
        assert_eq!(c.apply(Command::SetTargetLang("English".into())), CommandOutcome::Unchanged);
        assert_eq!(c.settings().target_lang, &ENGLISH);
        assert!(drain(&rx).is_empty());
    }

    #[test]
    fn start_primes_watcher_and_fetches_models() {
        let (mut c, clip, backend, rx) = fixture();
        clip.set("already there");
        c.start();
        c.check_clipboard();
        assert!(backend.started().is_empty());
        assert_eq!(backend.model_fetches(), vec!["gemma3:1b".to_string()]);
        assert!(matches!(drain(&rx).as_slice(), [AppEvent::Started(_)]));
    }

    #[test]
    fn model_list_failure_keeps_configured_model() {
        let (mut c, _clip, _backend, rx) = fixture();
        c.on_models_fetched(Err(TranslateError::Backend("connection refused".into())));
        assert_eq!(c.models(), &["gemma3:1b".to_string()]);
        assert!(drain(&rx).is_empty());
    }

    #[test]
    fn model_list_success_replaces_set() {
        let (mut c, _clip, backend, rx) = fixture();
        assert_eq!(c.apply(Command::RefreshModels), CommandOutcome::Unchanged);
        assert_eq!(backend.model_fetches().len(), 1);

        c.on_models_fetched(Ok(vec!["llama3:8b".into(), "gemma3:4b".into()]));
        assert_eq!(c.models(), &["gemma3:1b".to_string(), "gemma3:4b".to_string(), "llama3:8b".to_string()]);
        let events = drain(&rx);
        assert_eq!(events[0], AppEvent::ModelsRefreshed(3));
        assert!(matches!(&events[1], AppEvent::StateChanged(s) if s.models.len() == 3));
    }

    #[test]
    fn shutdown_signals_running_job() {
        let (mut c, clip, _backend, _rx) = fixture();
        copy(&mut c, &clip, "hello");
        let token = c.active_job().map(|j| j.token().clone()).expect("job");
        c.shutdown();
        assert!(token.is_cancelled());
        assert_eq!(c.active_job().map(|j| j.state()), Some(JobState::Cancelled));

        c.on_job_finished(ok(1, "bonjour"));
        assert!(clip.writes().is_empty());
    }

    #[test]
    fn quit_is_passed_through() {
        let (mut c, _clip, _backend, _rx) = fixture();
        assert_eq!(c.apply(Command::Quit), CommandOutcome::Quit);
    }

    #[test]
    fn preview_counts_chars() {
        assert_eq!(preview("héllo wörld", 5), "héllo...");
        assert_eq!(preview("short", 20), "short");
    }
}
