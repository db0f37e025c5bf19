use std::sync::Arc;

use crossbeam_channel::Sender;
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;

use crate::app::Message;
use crate::client::OllamaClient;
use crate::error::TranslateError;
use crate::job::{JobOutcome, TranslationJob, TranslationRequest};
use crate::prompt::build_prompt;
use crate::sanitize::sanitize;

/// Where the coordinator sends work. Results come back through the event loop inbox.
pub trait Backend {
    fn start(&self, job: &TranslationJob);
    fn fetch_models(&self, current: &str);
}

pub struct OllamaBackend {
    handle: Handle,
    client: Arc<OllamaClient>,
    inbox: Sender<Message>,
}

impl OllamaBackend {
    pub fn new(handle: Handle, client: Arc<OllamaClient>, inbox: Sender<Message>) -> Self {
        Self { handle, client, inbox }
    }
}

impl Backend for OllamaBackend {
    fn start(&self, job: &TranslationJob) {
        let id = job.id();
        let request = job.request().clone();
        let token = job.token().clone();
        let client = Arc::clone(&self.client);
        let inbox = self.inbox.clone();
        self.handle.spawn(async move {
            let result = execute(&client, &request, &token).await;
            log::debug!("job {} finished: {:?}", id, result.as_ref().map(|s| s.len()));
            let _ = inbox.send(Message::JobFinished(JobOutcome { id, result }));
        });
    }

    fn fetch_models(&self, current: &str) {
        let current = current.to_string();
        let client = Arc::clone(&self.client);
        let inbox = self.inbox.clone();
        self.handle.spawn(async move {
            let result = client.list_models(&current).await;
            let _ = inbox.send(Message::ModelsFetched(result));
        });
    }
}

/// Prompt, request and cleanup for one job. Cancelling the token drops the
/// in-flight HTTP call.
pub async fn execute(
    client: &OllamaClient,
    request: &TranslationRequest,
    token: &CancellationToken,
) -> Result<String, TranslateError> {
    let prompt = build_prompt(
        request.source_lang().display_name,
        request.target_lang().display_name,
        request.text(),
    );

    let raw = tokio::select! {
        _ = token.cancelled() => return Err(TranslateError::Cancelled),
        res = client.translate(&prompt, request.model()) => res?,
    };

    let cleaned = sanitize(&raw, request.text());
    if cleaned.is_empty() {
        return Err(TranslateError::EmptyResult);
    }
    Ok(cleaned)
}
