use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Coarse certainty tag on a resolved command.
/// Gates whether the session auto-executes, asks for confirmation, or discards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "high" => Some(Confidence::High),
            "medium" => Some(Confidence::Medium),
            "low" => Some(Confidence::Low),
            _ => None,
        }
    }
}

/// Where a command was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Local,
    Remote,
    Fallback,
}

/// The app's screens. Matching and tie-breaking follow declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Screen {
    Home,
    Medicines,
    Health,
    Family,
    Plans,
    Stats,
    Chat,
    Profile,
}

impl Screen {
    pub const ALL: [Screen; 8] = [
        Screen::Home,
        Screen::Medicines,
        Screen::Health,
        Screen::Family,
        Screen::Plans,
        Screen::Stats,
        Screen::Chat,
        Screen::Profile,
    ];

    /// Display name, as spoken and as passed to the navigation collaborator.
    pub fn title(&self) -> &'static str {
        match self {
            Screen::Home => "Ana Sayfa",
            Screen::Medicines => "İlaçlarım",
            Screen::Health => "Sağlığım",
            Screen::Family => "Ailem",
            Screen::Plans => "Planlarım",
            Screen::Stats => "İstatistik",
            Screen::Chat => "AI Asistan",
            Screen::Profile => "Profil",
        }
    }

    /// Keyword phrases that select this screen in a lower-cased utterance.
    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            Screen::Home => &["ana sayfa", "anasayfa", "ana ekran", "eve git", "eve dön", "başa dön"],
            Screen::Medicines => &["ilaçlarım", "ilaçlarıma", "ilaç sayfası", "ilaç ekranı"],
            Screen::Health => &["sağlığım", "sağlığıma", "sağlık sayfası"],
            Screen::Family => &["ailem", "aileme", "aile sayfası"],
            Screen::Plans => &["planlarım", "planlarıma", "plan sayfası", "takvim"],
            Screen::Stats => &["istatistik", "istatistikler", "grafik", "rapor"],
            Screen::Chat => &["ai asistan", "yapay zeka", "asistan", "sohbet"],
            Screen::Profile => &["profilim", "profilime", "profil sayfası", "ayarlar"],
        }
    }

    /// Resolve a free-text target reported by the remote resolver:
    /// exact title match, or the title contained in the reported target.
    pub fn resolve(target: &str) -> Option<Screen> {
        let target = target.trim();
        if target.is_empty() {
            return None;
        }
        Screen::ALL
            .iter()
            .copied()
            .find(|s| s.title() == target || target.contains(s.title()))
    }
}

/// Weekday codes as stored on medicine records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DayCode {
    #[serde(rename = "Pzt")]
    Pzt,
    #[serde(rename = "Sal")]
    Sal,
    #[serde(rename = "Çar")]
    Car,
    #[serde(rename = "Per")]
    Per,
    #[serde(rename = "Cum")]
    Cum,
    #[serde(rename = "Cmt")]
    Cmt,
    #[serde(rename = "Paz")]
    Paz,
}

impl DayCode {
    pub const WEEK: [DayCode; 7] = [
        DayCode::Pzt,
        DayCode::Sal,
        DayCode::Car,
        DayCode::Per,
        DayCode::Cum,
        DayCode::Cmt,
        DayCode::Paz,
    ];
    pub const WEEKDAYS: [DayCode; 5] = [
        DayCode::Pzt,
        DayCode::Sal,
        DayCode::Car,
        DayCode::Per,
        DayCode::Cum,
    ];
    pub const WEEKEND: [DayCode; 2] = [DayCode::Cmt, DayCode::Paz];

    pub fn as_str(&self) -> &'static str {
        match self {
            DayCode::Pzt => "Pzt",
            DayCode::Sal => "Sal",
            DayCode::Car => "Çar",
            DayCode::Per => "Per",
            DayCode::Cum => "Cum",
            DayCode::Cmt => "Cmt",
            DayCode::Paz => "Paz",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        DayCode::WEEK.iter().copied().find(|d| d.as_str() == s)
    }
}

/// One resolved voice command. Each variant carries exactly the fields the
/// action requires; anything incomplete collapses to `Unknown` at the parse
/// boundary, never deeper in the session.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandKind {
    Navigate {
        target: String,
    },
    MarkMedicine {
        medicine_name: String,
    },
    CallFamily {
        member_name: String,
        phone: Option<String>,
    },
    AddMedicine {
        medicine_name: String,
        dose: Option<String>,
        days: Option<Vec<DayCode>>,
        times: Option<Vec<String>>,
        note: Option<String>,
    },
    AddPlan {
        title: String,
        date: Option<NaiveDate>,
        time: Option<String>,
        note: Option<String>,
    },
    Unknown,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub kind: CommandKind,
    pub confidence: Confidence,
    pub source: Source,
    /// Provider-supplied confirmation text, when it sent one.
    pub confirm_message: Option<String>,
}

impl Command {
    /// The result every failed resolution degrades to.
    pub fn fallback() -> Self {
        Self {
            kind: CommandKind::Unknown,
            confidence: Confidence::Low,
            source: Source::Fallback,
            confirm_message: None,
        }
    }
}
