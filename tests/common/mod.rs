#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio_util::sync::CancellationToken;

use baston::assistant::{Navigator, OpenError, UrlOpener};
use baston::intent::types::{DayCode, Screen};
use baston::services::llm::{CompletionProvider, LlmError};
use baston::services::notify::{NotifyError, ReminderScheduler};
use baston::services::store::{
    FamilyMember, HealthStore, Medicine, MedicineId, MemberId, NewMedicine, NewPlan, Plan,
    StoreError, UserId,
};
use baston::speech::{CaptureOutcome, Speaker, SpeechCapture};

// ── Entity fixtures ─────────────────────────────────────────────────────────

pub fn med(name: &str) -> Medicine {
    Medicine {
        id: MedicineId::new(),
        name: name.to_string(),
        dose: "100mg".to_string(),
        days: DayCode::WEEK.to_vec(),
        times: vec!["08:00".to_string()],
        note: String::new(),
        color: None,
        icon: None,
    }
}

pub fn member(name: &str, phone: Option<&str>) -> FamilyMember {
    FamilyMember {
        id: MemberId::new(),
        name: name.to_string(),
        phone: phone.map(str::to_string),
    }
}

// ── Completion provider ─────────────────────────────────────────────────────

/// Replays a fixed list of completions; an `Err` entry simulates a provider
/// failure. Counts every call so tests can assert short-circuits.
#[derive(Default)]
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<Result<String, ()>>>,
    calls: AtomicUsize,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, completion: &str) -> Self {
        self.replies
            .lock()
            .expect("scripted provider lock")
            .push_back(Ok(completion.to_string()));
        self
    }

    pub fn reply_error(self) -> Self {
        self.replies
            .lock()
            .expect("scripted provider lock")
            .push_back(Err(()));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionProvider for ScriptedProvider {
    async fn complete(&self, _system: &str, _user: &str) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.replies.lock().expect("scripted provider lock").pop_front() {
            Some(Ok(text)) => Ok(text),
            _ => Err(LlmError::Empty),
        }
    }
}

// ── Speech fakes ────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSpeaker {
    spoken: Mutex<Vec<String>>,
}

impl RecordingSpeaker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().expect("speaker lock").clone()
    }

    pub fn said_containing(&self, needle: &str) -> bool {
        self.spoken().iter().any(|s| s.contains(needle))
    }
}

#[async_trait]
impl Speaker for RecordingSpeaker {
    async fn speak(&self, text: &str) {
        self.spoken.lock().expect("speaker lock").push(text.to_string());
    }

    fn stop(&self) {}
}

/// Replays capture outcomes; when the script runs out it cancels the linked
/// token (if one was set) and reports `Cancelled`, like a closed recognizer.
pub struct ScriptedCapture {
    outcomes: Mutex<VecDeque<CaptureOutcome>>,
    cancel_when_done: Mutex<Option<CancellationToken>>,
}

impl ScriptedCapture {
    pub fn new(outcomes: Vec<CaptureOutcome>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into()),
            cancel_when_done: Mutex::new(None),
        }
    }

    pub fn cancel_when_done(&self, token: CancellationToken) {
        *self.cancel_when_done.lock().expect("capture lock") = Some(token);
    }
}

#[async_trait]
impl SpeechCapture for ScriptedCapture {
    async fn listen(&self) -> CaptureOutcome {
        match self.outcomes.lock().expect("capture lock").pop_front() {
            Some(outcome) => outcome,
            None => {
                if let Some(token) = self.cancel_when_done.lock().expect("capture lock").as_ref() {
                    token.cancel();
                }
                CaptureOutcome::Cancelled
            }
        }
    }

    fn stop(&self) {}
}

// ── Platform fakes ──────────────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingNavigator {
    visited: Mutex<Vec<Screen>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn visited(&self) -> Vec<Screen> {
        self.visited.lock().expect("navigator lock").clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, screen: Screen) {
        self.visited.lock().expect("navigator lock").push(screen);
    }
}

#[derive(Default)]
pub struct RecordingOpener {
    opened: Mutex<Vec<String>>,
    refuse: bool,
}

impl RecordingOpener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn refusing() -> Self {
        Self { opened: Mutex::new(Vec::new()), refuse: true }
    }

    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().expect("opener lock").clone()
    }
}

#[async_trait]
impl UrlOpener for RecordingOpener {
    async fn open(&self, url: &str) -> Result<(), OpenError> {
        if self.refuse {
            return Err(OpenError::Unsupported);
        }
        self.opened.lock().expect("opener lock").push(url.to_string());
        Ok(())
    }
}

// ── Store / scheduler fakes ─────────────────────────────────────────────────

/// Serves reads from fixed snapshots and fails every write.
pub struct FailingStore {
    pub medicines: Vec<Medicine>,
    pub family: Vec<FamilyMember>,
}

#[async_trait]
impl HealthStore for FailingStore {
    async fn medicines(&self, _user: UserId) -> Result<Vec<Medicine>, StoreError> {
        Ok(self.medicines.clone())
    }

    async fn family_members(&self, _user: UserId) -> Result<Vec<FamilyMember>, StoreError> {
        Ok(self.family.clone())
    }

    async fn upsert_taken(
        &self,
        _user: UserId,
        _medicine: MedicineId,
        _date: NaiveDate,
    ) -> Result<(), StoreError> {
        Err(StoreError::Backend("write refused".to_string()))
    }

    async fn insert_medicine(
        &self,
        _user: UserId,
        _medicine: NewMedicine,
    ) -> Result<Medicine, StoreError> {
        Err(StoreError::Backend("write refused".to_string()))
    }

    async fn insert_plan(&self, _user: UserId, _plan: NewPlan) -> Result<Plan, StoreError> {
        Err(StoreError::Backend("write refused".to_string()))
    }
}

#[derive(Default)]
pub struct CountingScheduler {
    calls: AtomicUsize,
}

impl CountingScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReminderScheduler for CountingScheduler {
    async fn schedule_medicine(&self, _medicine: &Medicine) -> Result<(), NotifyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
