//! Local intent matching: pure substring checks against fixed Turkish keyword
//! tables and the session's known-entity snapshot. No I/O, no state — every
//! call is independent and deterministic. A miss is `None`, never an error;
//! the caller decides whether to escalate to the remote resolver.

use crate::intent::types::{Confidence, Screen};
use crate::services::store::{FamilyMember, Medicine};

/// Verbs that signal the user wants to move somewhere in the app.
const NAV_VERBS: [&str; 9] = [
    "git", "aç", "gidelim", "gir", "geç", "göster", "bak", "götür", "dön",
];

/// Trigger words for "I took my medicine".
const TAKEN_TRIGGERS: [&str; 6] = ["aldım", "içtim", "kullandım", "alındı", "tamam", "içildi"];

/// Trigger words for calling a family member.
const CALL_TRIGGERS: [&str; 6] = ["ara", "araa", "arıyorum", "çağır", "telefon et", "bağlan"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavMatch {
    pub screen: Screen,
    pub confidence: Confidence,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkMatch {
    pub medicine_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallMatch {
    pub member_name: String,
    pub phone: Option<String>,
}

/// Screens are checked in `Screen::ALL` order; the first keyword hit wins.
/// A nav-verb anywhere in the text upgrades the match to high confidence.
pub fn match_navigation(text: &str) -> Option<NavMatch> {
    let lower = text.to_lowercase();
    let lower = lower.trim();
    let has_nav_verb = NAV_VERBS.iter().any(|v| lower.contains(v));
    for screen in Screen::ALL {
        if screen.keywords().iter().any(|k| lower.contains(k)) {
            return Some(NavMatch {
                screen,
                confidence: if has_nav_verb { Confidence::High } else { Confidence::Medium },
            });
        }
    }
    None
}

/// A taken-trigger word plus a known medicine name in the utterance.
/// Only "text contains medicine name" is checked, not the reverse.
pub fn match_mark_medicine(text: &str, medicines: &[Medicine]) -> Option<MarkMatch> {
    let lower = text.to_lowercase();
    if !TAKEN_TRIGGERS.iter().any(|t| lower.contains(t)) {
        return None;
    }
    medicines
        .iter()
        .find(|m| lower.contains(&m.name.to_lowercase()))
        .map(|m| MarkMatch { medicine_name: m.name.clone() })
}

/// A call-trigger word plus a known family member name in the utterance.
pub fn match_call(text: &str, family: &[FamilyMember]) -> Option<CallMatch> {
    let lower = text.to_lowercase();
    if !CALL_TRIGGERS.iter().any(|t| lower.contains(t)) {
        return None;
    }
    family
        .iter()
        .find(|m| lower.contains(&m.name.to_lowercase()))
        .map(|m| CallMatch {
            member_name: m.name.clone(),
            phone: m.phone.clone(),
        })
}
