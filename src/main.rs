//! Console driver: stdin lines stand in for speech, stdout for the screen
//! and the speaker. Type a command as you would say it; "evet" / "iptal"
//! answer a pending confirmation, "sihirbaz" opens the guided medicine-add
//! wizard, "kapat" exits.

use std::env;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use tokio::sync::mpsc;

use baston::assistant::{AssistantSession, Platform, UiEvent};
use baston::intent::remote::VoiceCommandResolver;
use baston::intent::types::DayCode;
use baston::outputs::console::{ConsoleNavigator, ConsoleOpener, ConsoleSpeaker, StdinCapture};
use baston::services::llm::{LlmClient, LlmConfig};
use baston::services::notify::{LogScheduler, ReminderScheduler};
use baston::services::store::{HealthStore, MemoryStore, NewMedicine, UserId};
use baston::speech::{CaptureOutcome, Speaker, SpeechCapture};
use baston::voice::{VoiceArbiter, VoiceModule};
use baston::wizard::{MedicineWizard, WizardOutcome};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let store = Arc::new(MemoryStore::new());
    let user = UserId::new();
    seed_demo_data(&store, user).await?;

    let defaults = LlmConfig::default();
    let config = LlmConfig {
        base_url: env::var("LLM_BASE_URL").unwrap_or(defaults.base_url),
        api_key: env::var("LLM_API_KEY").unwrap_or_default(),
        model: env::var("LLM_MODEL").unwrap_or(defaults.model),
        ..LlmConfig::default()
    };
    let resolver = VoiceCommandResolver::new(Arc::new(LlmClient::new(config)));

    let speaker: Arc<dyn Speaker> = Arc::new(ConsoleSpeaker);
    let capture: Arc<dyn SpeechCapture> = Arc::new(StdinCapture::new());
    let scheduler: Arc<dyn ReminderScheduler> = Arc::new(LogScheduler);
    let platform = Platform {
        navigator: Arc::new(ConsoleNavigator),
        opener: Arc::new(ConsoleOpener),
        speaker: speaker.clone(),
    };
    let arbiter = VoiceArbiter::new();

    let (ui_tx, mut ui_rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        while let Some(event) = ui_rx.recv().await {
            match event {
                UiEvent::Response(msg) => println!("✅ {}", msg),
                UiEvent::Error(msg) => println!("⚠️  {}", msg),
                UiEvent::ConfirmRequest(msg) => println!("🤔 {} (evet / iptal)", msg),
                UiEvent::AutoClose(_) => {}
            }
        }
    });

    println!("🎙️  Sesli Asistan");
    println!("Örnekler: \"Aspirini aldım\" · \"Ayşe'yi ara\" · \"Yarın saat 3'e doktor randevusu ekle\" · \"İlaçlarıma git\"");
    println!("Komutlar: sihirbaz · evet · iptal · kapat");

    'outer: loop {
        let grant = arbiter
            .try_acquire(VoiceModule::Assistant)
            .ok_or_else(|| anyhow!("ses modülü meşgul"))?;
        let mut session = AssistantSession::start(
            user,
            store.clone(),
            resolver.clone(),
            platform.clone(),
            ui_tx.clone(),
            grant,
        )
        .await?;

        loop {
            match capture.listen().await {
                CaptureOutcome::Final(line) => {
                    let line = line.trim().to_string();
                    if line.is_empty() {
                        continue;
                    }
                    match line.to_lowercase().as_str() {
                        "kapat" | "çık" => {
                            session.close();
                            break 'outer;
                        }
                        "evet" => session.confirm().await,
                        "iptal" | "hayır" => session.cancel_pending().await,
                        "sihirbaz" => {
                            session.close();
                            drop(session);
                            run_wizard(
                                user,
                                store.clone(),
                                resolver.clone(),
                                capture.clone(),
                                speaker.clone(),
                                scheduler.clone(),
                                &arbiter,
                            )
                            .await?;
                            continue 'outer;
                        }
                        _ => session.handle_utterance(&line).await,
                    }
                }
                CaptureOutcome::Cancelled => {
                    session.close();
                    break 'outer;
                }
                CaptureOutcome::Error(e) => {
                    tracing::warn!(error = %e, "stdin capture failed");
                    println!("⚠️  Ses algılanamadı, tekrar deneyin.");
                }
            }
        }
    }

    Ok(())
}

async fn run_wizard(
    user: UserId,
    store: Arc<MemoryStore>,
    resolver: VoiceCommandResolver,
    capture: Arc<dyn SpeechCapture>,
    speaker: Arc<dyn Speaker>,
    scheduler: Arc<dyn ReminderScheduler>,
    arbiter: &VoiceArbiter,
) -> Result<()> {
    let grant = arbiter
        .try_acquire(VoiceModule::MedicineWizard)
        .ok_or_else(|| anyhow!("ses modülü meşgul"))?;
    let mut wizard =
        MedicineWizard::new(user, store, resolver, capture, speaker, scheduler, grant);
    match wizard.run().await {
        WizardOutcome::Saved(medicine) => println!("💊 {} kaydedildi.", medicine.name),
        WizardOutcome::Cancelled => println!("Sihirbaz kapatıldı."),
        WizardOutcome::Failed => println!("⚠️  Kayıt başarısız oldu."),
    }
    wizard.close();
    Ok(())
}

async fn seed_demo_data(store: &MemoryStore, user: UserId) -> Result<()> {
    for (name, dose, times) in [
        ("Aspirin", "100mg", vec!["08:00"]),
        ("Coraspin", "500mg", vec!["08:00", "20:00"]),
    ] {
        store
            .insert_medicine(
                user,
                NewMedicine {
                    name: name.to_string(),
                    dose: dose.to_string(),
                    days: DayCode::WEEK.to_vec(),
                    times: times.into_iter().map(String::from).collect(),
                    note: String::new(),
                    color: None,
                    icon: None,
                },
            )
            .await?;
    }
    store.add_family_member(user, "Ayşe", Some("0532 123 45 67"))?;
    store.add_family_member(user, "Mehmet", None)?;
    Ok(())
}
