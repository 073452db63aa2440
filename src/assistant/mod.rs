pub mod session;

pub use session::{AssistantSession, PendingAction, Phase, UiEvent};

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::intent::types::Screen;
use crate::speech::Speaker;

/// Screen-level navigation collaborator. Targets are resolved to the closed
/// screen set before this is called, so there is no invalid-name case.
pub trait Navigator: Send + Sync {
    fn navigate(&self, screen: Screen);
}

#[derive(Debug, Error)]
pub enum OpenError {
    #[error("no handler registered for the url")]
    Unsupported,
    #[error("open failed: {0}")]
    Failed(String),
}

/// Platform URL-opening capability, used for `tel:` hand-off.
#[async_trait]
pub trait UrlOpener: Send + Sync {
    async fn open(&self, url: &str) -> Result<(), OpenError>;
}

/// The platform collaborators an assistant session drives.
#[derive(Clone)]
pub struct Platform {
    pub navigator: Arc<dyn Navigator>,
    pub opener: Arc<dyn UrlOpener>,
    pub speaker: Arc<dyn Speaker>,
}
