//! Console-backed collaborator implementations for the driver binary.
//! Speech becomes stdout lines, capture becomes stdin lines.

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;

use crate::assistant::{Navigator, OpenError, UrlOpener};
use crate::intent::types::Screen;
use crate::speech::{CaptureError, CaptureOutcome, Speaker, SpeechCapture};

pub struct ConsoleSpeaker;

#[async_trait]
impl Speaker for ConsoleSpeaker {
    async fn speak(&self, text: &str) {
        println!("🔊 {}", text);
    }

    fn stop(&self) {}
}

pub struct ConsoleNavigator;

impl Navigator for ConsoleNavigator {
    fn navigate(&self, screen: Screen) {
        println!("➡️  {}", screen.title());
    }
}

pub struct ConsoleOpener;

#[async_trait]
impl UrlOpener for ConsoleOpener {
    async fn open(&self, url: &str) -> Result<(), OpenError> {
        println!("🔗 {}", url);
        Ok(())
    }
}

/// Stdin-as-microphone: one line per listening turn, EOF ends the session.
pub struct StdinCapture {
    lines: Mutex<Lines<BufReader<Stdin>>>,
}

impl StdinCapture {
    pub fn new() -> Self {
        Self {
            lines: Mutex::new(BufReader::new(tokio::io::stdin()).lines()),
        }
    }
}

impl Default for StdinCapture {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SpeechCapture for StdinCapture {
    async fn listen(&self) -> CaptureOutcome {
        let mut lines = self.lines.lock().await;
        match lines.next_line().await {
            Ok(Some(line)) => CaptureOutcome::Final(line),
            Ok(None) => CaptureOutcome::Cancelled,
            Err(e) => CaptureOutcome::Error(CaptureError::Recognizer(e.to_string())),
        }
    }

    fn stop(&self) {}
}
