//! The voice assistant session: one utterance in, one resolved action out.
//!
//! Resolution order is fixed: local navigation (high confidence only), local
//! medicine-taken, local call, then the remote resolver. Mutating actions
//! stage a pending confirmation instead of committing. Success paths speak,
//! report on screen, and request auto-close; failure paths speak and report
//! but leave the session open for a retry.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveDate};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::assistant::{OpenError, Platform};
use crate::intent::local;
use crate::intent::remote::VoiceCommandResolver;
use crate::intent::types::{Command, CommandKind, Confidence, DayCode, Screen};
use crate::services::store::{
    FamilyMember, HealthStore, Medicine, NewMedicine, NewPlan, StoreError, UserId,
};
use crate::voice::VoiceGrant;

const UNKNOWN_COMMAND_SPEECH: &str = "Komutu anlayamadım. Şu komutları deneyebilirsiniz: \
İlacı aldım, Birini ara, İlaç ekle veya Plan ekle.";

/// What the session tells the screen hosting it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    Response(String),
    Error(String),
    /// A pending action wants an explicit accept or cancel.
    ConfirmRequest(String),
    /// Success terminal state; the host may close the assistant after this.
    AutoClose(Duration),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Resolving,
    Executing,
    AwaitingConfirmation,
}

/// A staged mutating action. Exactly one may be live per session; accepting
/// or cancelling clears it unconditionally.
#[derive(Debug, Clone, PartialEq)]
pub enum PendingAction {
    AddMedicine {
        medicine_name: String,
        dose: Option<String>,
        days: Option<Vec<DayCode>>,
        times: Option<Vec<String>>,
        note: Option<String>,
        message: String,
    },
    AddPlan {
        title: String,
        date: Option<NaiveDate>,
        time: Option<String>,
        note: Option<String>,
        message: String,
    },
}

impl PendingAction {
    pub fn message(&self) -> &str {
        match self {
            PendingAction::AddMedicine { message, .. } => message,
            PendingAction::AddPlan { message, .. } => message,
        }
    }
}

pub struct AssistantSession {
    user: UserId,
    store: Arc<dyn HealthStore>,
    resolver: VoiceCommandResolver,
    platform: Platform,
    ui: mpsc::UnboundedSender<UiEvent>,
    cancel: CancellationToken,
    grant: Option<VoiceGrant>,
    // Known-entity snapshot, fetched once at session start.
    medicines: Vec<Medicine>,
    family: Vec<FamilyMember>,
    pending: Option<PendingAction>,
    phase: Phase,
}

impl AssistantSession {
    /// Open a session: fetch the known-entity snapshot once and go idle.
    pub async fn start(
        user: UserId,
        store: Arc<dyn HealthStore>,
        resolver: VoiceCommandResolver,
        platform: Platform,
        ui: mpsc::UnboundedSender<UiEvent>,
        grant: VoiceGrant,
    ) -> Result<Self, StoreError> {
        let medicines = store.medicines(user).await?;
        let family = store.family_members(user).await?;
        Ok(Self {
            user,
            store,
            resolver,
            platform,
            ui,
            cancel: CancellationToken::new(),
            grant: Some(grant),
            medicines,
            family,
            pending: None,
            phase: Phase::Idle,
        })
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn pending(&self) -> Option<&PendingAction> {
        self.pending.as_ref()
    }

    /// Token the host can watch; cancelled means the session was closed.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Process one final transcript. Not reentrant: while a previous turn is
    /// still resolving, or a confirmation is pending, new utterances are
    /// dropped with a warning.
    pub async fn handle_utterance(&mut self, text: &str) {
        if self.phase != Phase::Idle {
            warn!(phase = ?self.phase, "utterance dropped, session busy");
            return;
        }
        if text.trim().is_empty() {
            self.show_error("Konuşma algılanamadı, tekrar deneyin.");
            return;
        }

        self.phase = Phase::Resolving;
        self.resolve_and_execute(text).await;
        if self.pending.is_some() {
            self.phase = Phase::AwaitingConfirmation;
        } else {
            self.phase = Phase::Idle;
        }
    }

    async fn resolve_and_execute(&mut self, text: &str) {
        let nav_match = local::match_navigation(text);
        if let Some(nav) = nav_match {
            if nav.confidence == Confidence::High {
                self.do_navigate(nav.screen).await;
                return;
            }
        }
        if let Some(m) = local::match_mark_medicine(text, &self.medicines) {
            self.do_mark_medicine(&m.medicine_name).await;
            return;
        }
        if let Some(c) = local::match_call(text, &self.family) {
            self.do_call(&c.member_name, c.phone.as_deref()).await;
            return;
        }

        // Nothing local; ask the resolver, discarding the answer if the
        // session was closed while the request was in flight.
        let command = tokio::select! {
            _ = self.cancel.cancelled() => {
                info!("session closed mid-resolution, result abandoned");
                return;
            }
            command = self.resolver.resolve(text, &self.medicines, &self.family) => command,
        };

        self.dispatch_remote(command, nav_match.map(|n| n.screen)).await;
    }

    async fn dispatch_remote(&mut self, command: Command, local_nav_hint: Option<Screen>) {
        match command.kind {
            CommandKind::Navigate { ref target } if command.confidence != Confidence::Low => {
                // The reported target may be loose; fall back to a
                // medium-confidence local hit before giving up.
                match Screen::resolve(target).or(local_nav_hint) {
                    Some(screen) => self.do_navigate(screen).await,
                    None => self.unknown_command().await,
                }
            }
            CommandKind::MarkMedicine { ref medicine_name } => {
                self.do_mark_medicine(medicine_name).await;
            }
            CommandKind::CallFamily { ref member_name, ref phone } => {
                self.do_call(member_name, phone.as_deref()).await;
            }
            CommandKind::AddMedicine {
                medicine_name,
                dose,
                days,
                times,
                note,
            } if command.confidence != Confidence::Low => {
                let message = command
                    .confirm_message
                    .unwrap_or_else(|| format!("{} ekleyeyim mi?", medicine_name));
                self.stage_pending(PendingAction::AddMedicine {
                    medicine_name,
                    dose,
                    days,
                    times,
                    note,
                    message,
                })
                .await;
            }
            CommandKind::AddPlan { title, date, time, note }
                if command.confidence != Confidence::Low =>
            {
                let message = command
                    .confirm_message
                    .unwrap_or_else(|| format!("{} ekleyeyim mi?", title));
                self.stage_pending(PendingAction::AddPlan { title, date, time, note, message })
                    .await;
            }
            _ => self.unknown_command().await,
        }
    }

    /// Accept the pending action and commit it. No-op without one.
    pub async fn confirm(&mut self) {
        let Some(pending) = self.pending.take() else {
            return;
        };
        self.phase = Phase::Executing;
        match pending {
            PendingAction::AddMedicine {
                medicine_name,
                dose,
                days,
                times,
                note,
                ..
            } => {
                let record = NewMedicine {
                    name: medicine_name.clone(),
                    dose: dose.unwrap_or_default(),
                    days: days.unwrap_or_else(|| DayCode::WEEK.to_vec()),
                    times: times.unwrap_or_else(|| vec!["08:00".to_string()]),
                    note: note.unwrap_or_default(),
                    color: None,
                    icon: None,
                };
                match self.store.insert_medicine(self.user, record).await {
                    Ok(_) => {
                        let msg = format!("{} ilaçlarınıza eklendi.", medicine_name);
                        self.succeed(&msg, &msg, Duration::from_millis(2000)).await;
                    }
                    Err(e) => {
                        warn!(error = %e, "medicine insert failed");
                        self.fail("İlaç eklenirken hata oluştu.").await;
                    }
                }
            }
            PendingAction::AddPlan { title, date, time, note, .. } => {
                let record = NewPlan {
                    title: title.clone(),
                    plan_date: date.unwrap_or_else(today),
                    plan_time: time.unwrap_or_else(|| "09:00".to_string()),
                    note: note.unwrap_or_default(),
                };
                match self.store.insert_plan(self.user, record).await {
                    Ok(_) => {
                        let msg = format!("{} planlarınıza eklendi.", title);
                        self.succeed(&msg, &msg, Duration::from_millis(2000)).await;
                    }
                    Err(e) => {
                        warn!(error = %e, "plan insert failed");
                        self.fail("Plan eklenirken hata oluştu.").await;
                    }
                }
            }
        }
        self.phase = Phase::Idle;
    }

    /// Discard the pending action. No-op without one.
    pub async fn cancel_pending(&mut self) {
        if self.pending.take().is_some() {
            self.succeed("İptal edildi.", "İptal edildi.", Duration::from_millis(1500))
                .await;
        }
        self.phase = Phase::Idle;
    }

    /// Close the session: stop speech, drop pending state, release the voice
    /// grant, and mark the session cancelled so stale async results are
    /// ignored. Safe to call more than once.
    pub fn close(&mut self) {
        self.cancel.cancel();
        self.platform.speaker.stop();
        self.pending = None;
        self.phase = Phase::Idle;
        self.grant.take();
    }

    // ── Executors ───────────────────────────────────────────────────────────

    async fn do_navigate(&mut self, screen: Screen) {
        self.phase = Phase::Executing;
        let msg = format!("{} açılıyor", screen.title());
        self.platform.navigator.navigate(screen);
        self.succeed(&msg, &msg, Duration::from_millis(1500)).await;
    }

    async fn do_mark_medicine(&mut self, medicine_name: &str) {
        self.phase = Phase::Executing;
        let wanted = medicine_name.to_lowercase();
        let med = self
            .medicines
            .iter()
            .find(|m| m.name.to_lowercase() == wanted)
            .or_else(|| self.medicines.iter().find(|m| wanted.contains(&m.name.to_lowercase())))
            .map(|m| (m.id, m.name.clone()));

        let Some((med_id, med_name)) = med else {
            self.fail(&format!("{} ilaçlarınızda bulunamadı.", medicine_name)).await;
            return;
        };

        match self.store.upsert_taken(self.user, med_id, today()).await {
            Ok(()) => {
                let screen_msg = format!("{} alındı olarak işaretlendi ✓", med_name);
                let spoken = format!("{} alındı olarak işaretlendi.", med_name);
                self.succeed(&screen_msg, &spoken, Duration::from_millis(2000)).await;
            }
            Err(e) => {
                warn!(error = %e, "taken upsert failed");
                self.fail("İşaretleme sırasında hata oluştu.").await;
            }
        }
    }

    async fn do_call(&mut self, member_name: &str, phone: Option<&str>) {
        self.phase = Phase::Executing;
        let on_file = self.lookup_member_phone(member_name);
        let phone = phone
            .map(str::to_string)
            .filter(|p| !p.trim().is_empty())
            .or(on_file);

        let Some(phone) = phone else {
            self.fail(&format!("{}'in telefon numarası kayıtlı değil.", member_name)).await;
            return;
        };

        self.show_response(&format!("{} aranıyor...", member_name));
        self.speak(&format!("{} arıyorum.", member_name)).await;

        let uri = format!("tel:{}", phone.split_whitespace().collect::<String>());
        match self.platform.opener.open(&uri).await {
            Ok(()) => self.auto_close(Duration::from_millis(1500)),
            Err(OpenError::Unsupported) => self.show_error("Telefon uygulaması açılamadı."),
            Err(OpenError::Failed(e)) => {
                warn!(error = %e, "tel handoff failed");
                self.show_error("Arama başlatılamadı.");
            }
        }
    }

    async fn stage_pending(&mut self, action: PendingAction) {
        let message = action.message().to_string();
        self.pending = Some(action);
        let _ = self.ui.send(UiEvent::ConfirmRequest(message.clone()));
        self.speak(&format!("{}. Onaylıyor musunuz?", message)).await;
    }

    async fn unknown_command(&mut self) {
        self.show_response("Komutu anlayamadım.");
        self.speak(UNKNOWN_COMMAND_SPEECH).await;
        self.auto_close(Duration::from_millis(3000));
    }

    // ── Feedback plumbing ───────────────────────────────────────────────────

    fn lookup_member_phone(&self, member_name: &str) -> Option<String> {
        let wanted = member_name.to_lowercase();
        self.family
            .iter()
            .find(|m| {
                let name = m.name.to_lowercase();
                name == wanted || wanted.contains(&name)
            })
            .and_then(|m| m.phone.clone())
            .filter(|p| !p.trim().is_empty())
    }

    async fn succeed(&self, screen_msg: &str, spoken: &str, close_after: Duration) {
        self.show_response(screen_msg);
        self.speak(spoken).await;
        self.auto_close(close_after);
    }

    async fn fail(&self, msg: &str) {
        self.show_error(msg);
        self.speak(msg).await;
    }

    async fn speak(&self, text: &str) {
        self.platform.speaker.speak(text).await;
    }

    fn show_response(&self, msg: &str) {
        let _ = self.ui.send(UiEvent::Response(msg.to_string()));
    }

    fn show_error(&self, msg: &str) {
        let _ = self.ui.send(UiEvent::Error(msg.to_string()));
    }

    fn auto_close(&self, after: Duration) {
        let _ = self.ui.send(UiEvent::AutoClose(after));
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}
