pub mod client;

pub use client::{CompletionProvider, LlmClient, LlmConfig, LlmError};
