//! Guided medicine-add wizard: five questions, one answer each, one commit.
//!
//! The flow is strictly sequential — a question is never spoken while the
//! previous answer is still being captured or processed. Recognition errors
//! re-ask the current step; closing the wizard at any point resets all
//! session state unconditionally.

use std::collections::HashMap;
use std::sync::Arc;

use rand::seq::SliceRandom;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::intent::remote::VoiceCommandResolver;
use crate::intent::types::Confidence;
use crate::services::notify::ReminderScheduler;
use crate::services::store::{HealthStore, Medicine, NewMedicine, UserId};
use crate::speech::{CaptureError, CaptureOutcome, Speaker, SpeechCapture};
use crate::voice::VoiceGrant;
use crate::wizard::parsers::{parse_days, parse_times};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    Name,
    Dose,
    Days,
    Times,
    Note,
}

pub struct WizardStep {
    pub slot: Slot,
    pub question: &'static str,
}

pub const STEPS: [WizardStep; 5] = [
    WizardStep { slot: Slot::Name, question: "İlacın adı nedir?" },
    WizardStep { slot: Slot::Dose, question: "Dozu nedir? Örneğin beş yüz miligram." },
    WizardStep {
        slot: Slot::Days,
        question: "Hangi günler alacaksınız? Örneğin her gün, ya da Pazartesi Çarşamba Cuma.",
    },
    WizardStep {
        slot: Slot::Times,
        question: "Hangi saatlerde alacaksınız? Örneğin sabah sekiz, akşam sekiz.",
    },
    WizardStep { slot: Slot::Note, question: "Bu ilaç ne için? Geçmek için \"hayır\" deyin." },
];

/// Words that skip the note slot.
const SKIP_WORDS: [&str; 6] = ["hayır", "geç", "yok", "boş", "atlat", "pas"];

const MED_COLORS: [&str; 6] = ["#E07B4F", "#4A9B8E", "#6B5B8E", "#F0A500", "#E05050", "#4361EE"];
const MED_ICONS: [&str; 6] = ["💊", "🔵", "🟡", "🟢", "❤️", "🔶"];

#[derive(Debug, Clone, PartialEq)]
pub enum WizardOutcome {
    Saved(Medicine),
    /// Closed before the commit; all state has been reset.
    Cancelled,
    /// The commit failed; answers are kept so the user can retry.
    Failed,
}

pub struct MedicineWizard {
    user: UserId,
    store: Arc<dyn HealthStore>,
    resolver: VoiceCommandResolver,
    capture: Arc<dyn SpeechCapture>,
    speaker: Arc<dyn Speaker>,
    scheduler: Arc<dyn ReminderScheduler>,
    cancel: CancellationToken,
    grant: Option<VoiceGrant>,
    step: usize,
    answers: HashMap<Slot, String>,
}

impl MedicineWizard {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        user: UserId,
        store: Arc<dyn HealthStore>,
        resolver: VoiceCommandResolver,
        capture: Arc<dyn SpeechCapture>,
        speaker: Arc<dyn Speaker>,
        scheduler: Arc<dyn ReminderScheduler>,
        grant: VoiceGrant,
    ) -> Self {
        Self {
            user,
            store,
            resolver,
            capture,
            speaker,
            scheduler,
            cancel: CancellationToken::new(),
            grant: Some(grant),
            step: 0,
            answers: HashMap::new(),
        }
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn step(&self) -> usize {
        self.step
    }

    pub fn answers(&self) -> &HashMap<Slot, String> {
        &self.answers
    }

    /// Close the wizard: stop capture and speech and wipe every session
    /// field back to its initial value. Idempotent.
    pub fn close(&mut self) {
        self.cancel.cancel();
        self.capture.stop();
        self.speaker.stop();
        self.step = 0;
        self.answers.clear();
        self.grant.take();
    }

    /// Drive the wizard from its current step to the commit. On a fresh
    /// session this greets first; after a failed commit it resumes where it
    /// left off.
    pub async fn run(&mut self) -> WizardOutcome {
        if self.step == 0 && self.answers.is_empty() {
            self.speaker.speak("Merhaba! Size birkaç soru soracağım.").await;
        }

        while self.step < STEPS.len() {
            if self.cancel.is_cancelled() {
                self.reset();
                return WizardOutcome::Cancelled;
            }
            let current = &STEPS[self.step];
            self.speaker.speak(current.question).await;

            let Some(text) = self.listen_once().await else {
                if self.cancel.is_cancelled() {
                    self.reset();
                    return WizardOutcome::Cancelled;
                }
                continue; // re-ask the same step
            };

            let answer = self.process_answer(current.slot, text).await;
            self.answers.insert(current.slot, answer);
            self.step += 1;
        }

        self.save().await
    }

    /// One capture attempt. `None` means the step should be re-asked (or the
    /// wizard was cancelled; the caller checks the token).
    async fn listen_once(&self) -> Option<String> {
        let outcome = tokio::select! {
            _ = self.cancel.cancelled() => CaptureOutcome::Cancelled,
            outcome = self.capture.listen() => outcome,
        };
        match outcome {
            CaptureOutcome::Final(text) => {
                let text = text.trim().to_string();
                if text.is_empty() {
                    self.speaker.speak("Anlaşılamadı, lütfen tekrar deneyin.").await;
                    return None;
                }
                Some(text)
            }
            CaptureOutcome::Error(CaptureError::NoSpeech) => {
                self.speaker.speak("Ses algılanamadı, lütfen tekrar deneyin.").await;
                None
            }
            CaptureOutcome::Error(CaptureError::PermissionDenied) => {
                self.speaker.speak("Mikrofon izni verilmedi.").await;
                self.cancel.cancel();
                None
            }
            CaptureOutcome::Error(CaptureError::Recognizer(e)) => {
                warn!(error = %e, "recognizer failure in wizard");
                self.speaker.speak("Ses algılanamadı, lütfen tekrar deneyin.").await;
                None
            }
            CaptureOutcome::Cancelled => None,
        }
    }

    async fn process_answer(&self, slot: Slot, text: String) -> String {
        let mut answer = text.clone();

        if slot == Slot::Name {
            // Best-effort: the corrector never fails, it falls back to the
            // spoken text, so a provider outage costs nothing here.
            let correction = self.resolver.correct_medicine_name(&text).await;
            if correction.is_valid
                && correction.confidence != Confidence::Low
                && !correction.corrected_name.is_empty()
            {
                if correction.corrected_name != text {
                    self.speaker
                        .speak(&format!("{} olarak kaydettim.", correction.corrected_name))
                        .await;
                }
                answer = correction.corrected_name;
            }
        }

        let lower = text.to_lowercase();
        if slot == Slot::Note && SKIP_WORDS.iter().any(|w| lower.contains(w)) {
            self.speaker.speak("Tamam, not eklenmedi.").await;
            answer = String::new();
        } else {
            self.speaker.speak("Anladım.").await;
        }

        answer
    }

    async fn save(&mut self) -> WizardOutcome {
        self.speaker.speak("İlacınız kaydediliyor.").await;

        let name = self
            .answers
            .get(&Slot::Name)
            .map(String::as_str)
            .filter(|n| !n.is_empty())
            .unwrap_or("İlaç")
            .to_string();
        let record = NewMedicine {
            name: name.clone(),
            dose: self.answers.get(&Slot::Dose).cloned().unwrap_or_default(),
            days: parse_days(self.answers.get(&Slot::Days).map(String::as_str).unwrap_or("")),
            times: parse_times(self.answers.get(&Slot::Times).map(String::as_str).unwrap_or("")),
            note: self.answers.get(&Slot::Note).cloned().unwrap_or_default(),
            color: pick(&MED_COLORS),
            icon: pick(&MED_ICONS),
        };

        match self.store.insert_medicine(self.user, record).await {
            Ok(saved) => {
                if let Err(e) = self.scheduler.schedule_medicine(&saved).await {
                    warn!(error = %e, "reminder scheduling failed after save");
                }
                self.speaker.speak(&format!("{} başarıyla kaydedildi!", name)).await;
                self.reset();
                WizardOutcome::Saved(saved)
            }
            Err(e) => {
                warn!(error = %e, "medicine save failed");
                self.speaker.speak("Kayıt sırasında hata oluştu.").await;
                WizardOutcome::Failed
            }
        }
    }

    fn reset(&mut self) {
        self.step = 0;
        self.answers.clear();
    }
}

fn pick(options: &[&str]) -> Option<String> {
    options.choose(&mut rand::thread_rng()).map(|s| s.to_string())
}
