use std::time::Duration;

/// Ways a translation job can end without a result.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TranslateError {
    #[error("Timeout after {}s. The model took too long.", .0.as_secs())]
    Timeout(Duration),
    #[error("Ollama error: {0}")]
    Backend(String),
    #[error("Empty response from Ollama")]
    EmptyResult,
    #[error("Translation cancelled")]
    Cancelled,
}

impl TranslateError {
    /// Whether the user should see a failure notification for this error.
    pub fn is_reportable(&self) -> bool {
        !matches!(self, TranslateError::Cancelled)
    }

    pub(crate) fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            TranslateError::Timeout(timeout)
        } else if err.is_decode() {
            TranslateError::Backend(format!("malformed response: {}", err))
        } else {
            TranslateError::Backend(err.to_string())
        }
    }
}
