mod common;

use std::sync::Arc;

use baston::intent::remote::VoiceCommandResolver;
use baston::intent::types::DayCode;
use baston::services::store::{HealthStore, MemoryStore, UserId};
use baston::speech::CaptureOutcome;
use baston::voice::{VoiceArbiter, VoiceModule};
use baston::wizard::{MedicineWizard, WizardOutcome, STEPS};
use common::{CountingScheduler, FailingStore, RecordingSpeaker, ScriptedCapture, ScriptedProvider};

struct WizHarness {
    wizard: MedicineWizard,
    capture: Arc<ScriptedCapture>,
    speaker: Arc<RecordingSpeaker>,
    scheduler: Arc<CountingScheduler>,
    user: UserId,
}

fn build_wizard(
    store: Arc<dyn HealthStore>,
    provider: ScriptedProvider,
    answers: Vec<&str>,
) -> WizHarness {
    let capture = Arc::new(ScriptedCapture::new(
        answers.into_iter().map(|a| CaptureOutcome::Final(a.to_string())).collect(),
    ));
    let speaker = Arc::new(RecordingSpeaker::new());
    let scheduler = Arc::new(CountingScheduler::new());
    let user = UserId::new();
    let arbiter = VoiceArbiter::new();
    let grant = arbiter.try_acquire(VoiceModule::MedicineWizard).expect("voice slot free");
    let wizard = MedicineWizard::new(
        user,
        store,
        VoiceCommandResolver::new(Arc::new(provider)),
        capture.clone(),
        speaker.clone(),
        scheduler.clone(),
        grant,
    );
    WizHarness { wizard, capture, speaker, scheduler, user }
}

fn corrected(name: &str) -> String {
    format!(
        "{{\"isValid\": true, \"correctedName\": \"{}\", \"confidence\": \"high\"}}",
        name
    )
}

#[tokio::test]
async fn full_run_parses_days_times_and_skips_the_note() {
    let store = Arc::new(MemoryStore::new());
    let provider = ScriptedProvider::new().reply(&corrected("Coraspin"));
    let mut h = build_wizard(
        store.clone(),
        provider,
        vec!["Coraspin", "500 mg", "her gün", "sabah akşam", "hayır"],
    );

    let outcome = h.wizard.run().await;

    let WizardOutcome::Saved(saved) = outcome else {
        panic!("expected a saved medicine, got {:?}", outcome);
    };
    assert_eq!(saved.name, "Coraspin");
    assert_eq!(saved.dose, "500 mg");
    assert_eq!(saved.days, DayCode::WEEK.to_vec());
    assert_eq!(saved.times, vec!["08:00".to_string(), "20:00".to_string()]);
    assert_eq!(saved.note, "", "the skip word empties the note slot");
    assert!(saved.color.is_some() && saved.icon.is_some(), "a palette color and icon are assigned");

    assert_eq!(h.scheduler.calls(), 1, "reminders are scheduled exactly once after the commit");
    assert!(h.speaker.said_containing("başarıyla kaydedildi"));
    assert!(
        !h.speaker.said_containing("olarak kaydettim"),
        "an unchanged name needs no correction acknowledgment"
    );
    assert_eq!(h.wizard.step(), 0, "a successful save resets the session");
    assert!(h.wizard.answers().is_empty());
    assert_eq!(store.medicines(h.user).await.expect("medicines").len(), 1);
}

#[tokio::test]
async fn name_correction_replaces_and_acknowledges_when_it_differs() {
    let store = Arc::new(MemoryStore::new());
    let provider = ScriptedProvider::new().reply(&corrected("Coraspin"));
    let mut h = build_wizard(
        store.clone(),
        provider,
        vec!["koraspin", "500 mg", "her gün", "sabah", "hayır"],
    );

    let outcome = h.wizard.run().await;

    let WizardOutcome::Saved(saved) = outcome else {
        panic!("expected a saved medicine, got {:?}", outcome);
    };
    assert_eq!(saved.name, "Coraspin", "the corrected name replaces the transcript");
    assert!(h.speaker.said_containing("Coraspin olarak kaydettim"));
}

#[tokio::test]
async fn name_correction_failure_keeps_the_raw_transcript() {
    let store = Arc::new(MemoryStore::new());
    let provider = ScriptedProvider::new().reply_error();
    let mut h = build_wizard(
        store.clone(),
        provider,
        vec!["koraspin", "500 mg", "her gün", "sabah", "hayır"],
    );

    let outcome = h.wizard.run().await;

    let WizardOutcome::Saved(saved) = outcome else {
        panic!("expected a saved medicine, got {:?}", outcome);
    };
    assert_eq!(saved.name, "koraspin", "correction is best-effort, never blocking");
    assert!(!h.speaker.said_containing("olarak kaydettim"));
}

#[tokio::test]
async fn a_real_note_is_stored_verbatim() {
    let store = Arc::new(MemoryStore::new());
    let provider = ScriptedProvider::new().reply(&corrected("Aspirin"));
    let mut h = build_wizard(
        store,
        provider,
        vec!["Aspirin", "100 mg", "hafta içi", "sabah", "tansiyon için"],
    );

    let outcome = h.wizard.run().await;

    let WizardOutcome::Saved(saved) = outcome else {
        panic!("expected a saved medicine, got {:?}", outcome);
    };
    assert_eq!(saved.note, "tansiyon için");
    assert_eq!(saved.days, DayCode::WEEKDAYS.to_vec());
}

#[tokio::test]
async fn unrecognized_days_and_times_fall_back_to_defaults() {
    let store = Arc::new(MemoryStore::new());
    let provider = ScriptedProvider::new().reply(&corrected("Aspirin"));
    let mut h = build_wizard(
        store,
        provider,
        vec!["Aspirin", "100 mg", "bilmiyorum", "bilmem", "hayır"],
    );

    let outcome = h.wizard.run().await;

    let WizardOutcome::Saved(saved) = outcome else {
        panic!("expected a saved medicine, got {:?}", outcome);
    };
    assert_eq!(saved.days, DayCode::WEEK.to_vec());
    assert_eq!(saved.times, vec!["08:00".to_string()]);
}

#[tokio::test]
async fn an_empty_transcript_re_asks_the_same_step() {
    let store = Arc::new(MemoryStore::new());
    let provider = ScriptedProvider::new().reply(&corrected("Aspirin"));
    let mut h = build_wizard(
        store,
        provider,
        vec!["", "Aspirin", "100 mg", "her gün", "sabah", "hayır"],
    );

    let outcome = h.wizard.run().await;

    assert!(matches!(outcome, WizardOutcome::Saved(_)));
    let name_question = STEPS[0].question;
    let asked = h.speaker.spoken().iter().filter(|s| s.as_str() == name_question).count();
    assert_eq!(asked, 2, "the name question is asked again after an empty answer");
}

#[tokio::test]
async fn failed_save_keeps_the_answers_for_retry() {
    let store = Arc::new(FailingStore { medicines: vec![], family: vec![] });
    let provider = ScriptedProvider::new().reply(&corrected("Aspirin"));
    let mut h = build_wizard(
        store,
        provider,
        vec!["Aspirin", "100 mg", "her gün", "sabah", "hayır"],
    );

    let outcome = h.wizard.run().await;

    assert_eq!(outcome, WizardOutcome::Failed);
    assert_eq!(h.wizard.answers().len(), STEPS.len(), "answers survive a failed commit");
    assert_eq!(h.scheduler.calls(), 0, "no reminders without a successful commit");
    assert!(h.speaker.said_containing("Kayıt sırasında hata oluştu"));
}

#[tokio::test]
async fn closing_mid_run_resets_all_state() {
    let store = Arc::new(MemoryStore::new());
    let provider = ScriptedProvider::new().reply(&corrected("Aspirin"));
    // Two answers, then the recognizer reports the session closed.
    let mut h = build_wizard(store.clone(), provider, vec!["Aspirin", "100 mg"]);
    h.capture.cancel_when_done(h.wizard.cancel_token());

    let outcome = h.wizard.run().await;

    assert_eq!(outcome, WizardOutcome::Cancelled);
    assert_eq!(h.wizard.step(), 0);
    assert!(h.wizard.answers().is_empty(), "no partial state survives a close");
    assert!(store.medicines(h.user).await.expect("medicines").is_empty(), "no partial save");
}

#[tokio::test]
async fn close_is_idempotent() {
    let store = Arc::new(MemoryStore::new());
    let mut h = build_wizard(store, ScriptedProvider::new(), vec![]);

    h.wizard.close();
    h.wizard.close();

    assert_eq!(h.wizard.step(), 0);
    assert!(h.wizard.answers().is_empty());
    assert!(h.wizard.cancel_token().is_cancelled());
}
