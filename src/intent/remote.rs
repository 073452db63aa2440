//! Remote intent resolution: one completion-provider call behind a local
//! pre-filter, with JSON extraction and per-action validation at the parse
//! boundary. Failures on this path degrade to data (`unknown`/`fallback`),
//! they are never raised to the session.

use std::sync::{Arc, OnceLock};

use chrono::{Days, Local, NaiveDate};
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::intent::local;
use crate::intent::types::{Command, CommandKind, Confidence, DayCode, Source};
use crate::services::llm::client::CompletionProvider;
use crate::services::store::{FamilyMember, Medicine};

fn json_block_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // The provider is told to answer with bare JSON but may wrap it in prose;
    // take the first-to-last brace span and let the parser judge it.
    RE.get_or_init(|| Regex::new(r"(?s)\{.*\}").expect("json block regex"))
}

/// Pull the first brace-delimited block out of a raw completion and parse it.
pub fn extract_json(text: &str) -> Option<Value> {
    let block = json_block_re().find(text)?;
    serde_json::from_str(block.as_str()).ok()
}

/// Result of the medicine-name correction variant. Always usable: failures
/// fall back to the spoken text with low confidence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameCorrection {
    pub is_valid: bool,
    pub corrected_name: String,
    pub confidence: Confidence,
}

#[derive(Deserialize)]
struct RawCorrection {
    #[serde(rename = "isValid")]
    is_valid: Option<bool>,
    #[serde(rename = "correctedName")]
    corrected_name: Option<String>,
    confidence: Option<Confidence>,
}

#[derive(Clone)]
pub struct VoiceCommandResolver {
    provider: Arc<dyn CompletionProvider>,
}

impl VoiceCommandResolver {
    pub fn new(provider: Arc<dyn CompletionProvider>) -> Self {
        Self { provider }
    }

    /// Resolve one utterance into a structured command.
    ///
    /// A high-confidence navigation match from the local pre-filter returns
    /// immediately and never reaches the provider. Otherwise exactly one
    /// completion request is made; provider errors and unparseable
    /// completions both yield the fallback command.
    pub async fn resolve(
        &self,
        text: &str,
        medicines: &[Medicine],
        family: &[FamilyMember],
    ) -> Command {
        if let Some(nav) = local::match_navigation(text) {
            if nav.confidence == Confidence::High {
                return Command {
                    kind: CommandKind::Navigate { target: nav.screen.title().to_string() },
                    confidence: Confidence::High,
                    source: Source::Local,
                    confirm_message: None,
                };
            }
        }

        let today = Local::now().date_naive();
        let system = build_command_prompt(medicines, family, today);
        let user_message = format!("Kullanıcı dedi: \"{}\"", text);

        match self.provider.complete(&system, &user_message).await {
            Ok(raw) => match extract_json(&raw) {
                Some(value) => parse_command(&value),
                None => {
                    warn!("voice command completion contained no JSON");
                    Command::fallback()
                }
            },
            Err(e) => {
                warn!(error = %e, "voice command resolution failed");
                Command::fallback()
            }
        }
    }

    /// Best-effort drug-name correction for the wizard's name step.
    /// Never fails: any provider or parse problem keeps the spoken text.
    pub async fn correct_medicine_name(&self, spoken: &str) -> NameCorrection {
        let user_message = format!(
            "\"{}\" — Bu ilaç adını düzelt:\n{{\"isValid\": true, \"correctedName\": \"İlaç İsmi\", \"confidence\": \"high\"}}",
            spoken
        );

        match self.provider.complete(NAME_CORRECTION_PROMPT, &user_message).await {
            Ok(raw) => match extract_json(&raw)
                .and_then(|v| serde_json::from_value::<RawCorrection>(v).ok())
            {
                Some(parsed) => NameCorrection {
                    is_valid: parsed.is_valid.unwrap_or(true),
                    corrected_name: parsed
                        .corrected_name
                        .filter(|n| !n.trim().is_empty())
                        .unwrap_or_else(|| spoken.to_string()),
                    confidence: parsed.confidence.unwrap_or(Confidence::Medium),
                },
                None => NameCorrection {
                    is_valid: true,
                    corrected_name: spoken.to_string(),
                    confidence: Confidence::Medium,
                },
            },
            Err(e) => {
                warn!(error = %e, "medicine name correction failed, keeping spoken text");
                NameCorrection {
                    is_valid: true,
                    corrected_name: spoken.to_string(),
                    confidence: Confidence::Low,
                }
            }
        }
    }
}

const NAME_CORRECTION_PROMPT: &str = "Sen bir Türk eczacısın. Kullanıcının söylediği ilaç adını düzelt.\n\
Türkiye'de yaygın ilaçlar: Metformin, Coraspin, Aspirin, Majezik, Neopril, Diovan, Coversyl, Beloc, Concor, Lipitor, Crestor, Glucophage, Norvasc, Lasix vb.\n\
SADECE JSON döndür, başka hiçbir şey yazma. Markdown kullanma.";

fn build_command_prompt(medicines: &[Medicine], family: &[FamilyMember], today: NaiveDate) -> String {
    let med_list = if medicines.is_empty() {
        "yok".to_string()
    } else {
        medicines.iter().map(|m| m.name.as_str()).collect::<Vec<_>>().join(", ")
    };
    let family_list = if family.is_empty() {
        "yok".to_string()
    } else {
        family
            .iter()
            .map(|m| format!("{} ({})", m.name, m.phone.as_deref().unwrap_or("telefon yok")))
            .collect::<Vec<_>>()
            .join(", ")
    };
    let tomorrow = today.checked_add_days(Days::new(1)).unwrap_or(today);

    format!(
        r#"Sen bir Türkçe sesli komut işleyicisisin. Kullanıcının ne yapmak istediğini analiz et.

Mevcut ilaçlar: {med_list}
Aile üyeleri: {family_list}

Desteklenen aksiyonlar:
- navigate: Ekrana git. target = ekran adı (Ana Sayfa, İlaçlarım, Sağlığım, Ailem, Planlarım, İstatistik, AI Asistan, Profil)
- markMedicine: İlaç alındı işaretle. medicineName = ilaç adı
- callFamily: Aile üyesini ara. memberName = kişi adı, phone = telefon numarası
- addMedicine: Yeni ilaç ekle. medicineName, dose, days (dizi), times (dizi)
- addPlan: Plan/randevu ekle. title, date (YYYY-MM-DD), time (HH:MM), note
- unknown: Anlaşılamadı

Bugünün tarihi: {today}
Yarın: {tomorrow}

SADECE JSON döndür. Markdown kullanma. Örnek:
{{"action": "markMedicine", "medicineName": "Aspirin", "confidence": "high", "confirmMessage": "Aspirin alındı olarak işaretleyeyim mi?"}}
{{"action": "callFamily", "memberName": "Ayşe", "phone": "05321234567", "confidence": "high", "confirmMessage": "Ayşe'yi arıyorum"}}
{{"action": "addPlan", "title": "Doktor Randevusu", "date": "{tomorrow}", "time": "15:00", "note": "", "confidence": "high", "confirmMessage": "Yarın saat 15:00'e Doktor Randevusu ekleyeyim mi?"}}
{{"action": "addMedicine", "medicineName": "Aspirin", "dose": "500mg", "days": ["Pzt","Sal","Çar","Per","Cum","Cmt","Paz"], "times": ["08:00","20:00"], "confidence": "high", "confirmMessage": "Aspirin 500mg, her gün sabah-akşam ekleyeyim mi?"}}"#
    )
}

fn non_empty(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn string_list(value: &Value, key: &str) -> Option<Vec<String>> {
    let items: Vec<String> = value
        .get(key)?
        .as_array()?
        .iter()
        .filter_map(Value::as_str)
        .map(str::to_string)
        .collect();
    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}

/// Map a parsed provider object to a command, validating each action's
/// required fields here so nothing incomplete survives past this boundary.
pub fn parse_command(value: &Value) -> Command {
    let confidence = value
        .get("confidence")
        .and_then(Value::as_str)
        .and_then(Confidence::parse)
        .unwrap_or(Confidence::Low);
    let confirm_message = non_empty(value, "confirmMessage");

    let kind = match value.get("action").and_then(Value::as_str).unwrap_or_default() {
        "navigate" => non_empty(value, "target").map(|target| CommandKind::Navigate { target }),
        "markMedicine" => {
            non_empty(value, "medicineName").map(|medicine_name| CommandKind::MarkMedicine { medicine_name })
        }
        "callFamily" => non_empty(value, "memberName").map(|member_name| CommandKind::CallFamily {
            member_name,
            phone: non_empty(value, "phone"),
        }),
        "addMedicine" => non_empty(value, "medicineName").map(|medicine_name| CommandKind::AddMedicine {
            medicine_name,
            dose: non_empty(value, "dose"),
            days: string_list(value, "days")
                .map(|days| days.iter().filter_map(|d| DayCode::parse(d)).collect::<Vec<_>>())
                .filter(|days: &Vec<DayCode>| !days.is_empty()),
            times: string_list(value, "times"),
            note: non_empty(value, "note"),
        }),
        "addPlan" => non_empty(value, "title").map(|title| CommandKind::AddPlan {
            title,
            date: non_empty(value, "date")
                .and_then(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d").ok()),
            time: non_empty(value, "time"),
            note: non_empty(value, "note"),
        }),
        _ => None,
    };

    Command {
        kind: kind.unwrap_or(CommandKind::Unknown),
        confidence,
        source: Source::Remote,
        confirm_message,
    }
}
