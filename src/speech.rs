//! Speech capture/output collaborator seams. One listening turn is a single
//! cancellable operation that resolves to a terminal value, not a stream of
//! recognizer events; the platform adapter owns silence detection and locale.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    #[error("no speech detected")]
    NoSpeech,
    #[error("microphone permission denied")]
    PermissionDenied,
    #[error("recognizer failure: {0}")]
    Recognizer(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    Final(String),
    Error(CaptureError),
    Cancelled,
}

#[async_trait]
pub trait SpeechCapture: Send + Sync {
    /// One single-shot listening turn. Resolves when the recognizer reports
    /// a final transcript, fails, or capture is stopped.
    async fn listen(&self) -> CaptureOutcome;
    fn stop(&self);
}

#[async_trait]
pub trait Speaker: Send + Sync {
    /// Speak and resolve when done, errored, or stopped — never hangs.
    async fn speak(&self, text: &str);
    fn stop(&self);
}
