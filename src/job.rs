use tokio_util::sync::CancellationToken;

use crate::error::TranslateError;
use crate::languages::LanguageEntry;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationRequest {
    text: String,
    source_lang: &'static LanguageEntry,
    target_lang: &'static LanguageEntry,
    model: String,
}

impl TranslationRequest {
    /// Returns `None` for blank text or an auto-detect target.
    pub fn new(
        text: impl Into<String>,
        source_lang: &'static LanguageEntry,
        target_lang: &'static LanguageEntry,
        model: impl Into<String>,
    ) -> Option<Self> {
        let text = text.into();
        if text.trim().is_empty() || target_lang.is_auto() {
            return None;
        }
        Some(Self { text, source_lang, target_lang, model: model.into() })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn source_lang(&self) -> &'static LanguageEntry {
        self.source_lang
    }

    pub fn target_lang(&self) -> &'static LanguageEntry {
        self.target_lang
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

#[derive(Debug)]
pub struct TranslationJob {
    id: u64,
    request: TranslationRequest,
    token: CancellationToken,
    state: JobState,
}

impl TranslationJob {
    pub fn new(id: u64, request: TranslationRequest) -> Self {
        Self { id, request, token: CancellationToken::new(), state: JobState::Pending }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn request(&self) -> &TranslationRequest {
        &self.request
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == JobState::Running
    }

    pub fn start(&mut self) {
        if self.state == JobState::Pending {
            self.state = JobState::Running;
        }
    }

    /// Signals the token; a finished job keeps its final state.
    pub fn cancel(&mut self) {
        self.token.cancel();
        if matches!(self.state, JobState::Pending | JobState::Running) {
            self.state = JobState::Cancelled;
        }
    }

    pub fn complete(&mut self) {
        self.state = JobState::Completed;
    }

    pub fn fail(&mut self) {
        self.state = JobState::Failed;
    }
}

/// What a worker reports back for a job id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobOutcome {
    pub id: u64,
    pub result: Result<String, TranslateError>,
}
