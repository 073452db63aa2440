//! Pure text parsers for the wizard's day and time answers. Both are
//! functions of the answer string alone: same input, same output, no state.

use std::sync::OnceLock;

use regex::Regex;

use crate::intent::types::DayCode;

/// Day-name patterns in match order. Longer names come before their prefixes
/// (pazartesi before pazar, cumartesi before cuma) and each hit consumes its
/// text so "pazartesi" never also counts as "pazar". Unaccented spellings
/// cover common recognizer output.
const DAY_PATTERNS: [(&str, DayCode); 9] = [
    ("pazartesi", DayCode::Pzt),
    ("cumartesi", DayCode::Cmt),
    ("çarşamba", DayCode::Car),
    ("carsamba", DayCode::Car),
    ("perşembe", DayCode::Per),
    ("persembe", DayCode::Per),
    ("pazar", DayCode::Paz),
    ("cuma", DayCode::Cum),
    ("salı", DayCode::Sal),
];

/// Parse a spoken days answer into weekday codes.
/// Unrecognized or empty input defaults to every day of the week.
pub fn parse_days(text: &str) -> Vec<DayCode> {
    let lower = text.to_lowercase();
    let lower = lower.trim();
    if lower.is_empty() {
        return DayCode::WEEK.to_vec();
    }
    if lower.contains("her gün") || lower.contains("hergün") || lower.contains("günlük") {
        return DayCode::WEEK.to_vec();
    }
    if lower.contains("hafta içi") || lower.contains("iş günü") {
        return DayCode::WEEKDAYS.to_vec();
    }
    if lower.contains("hafta sonu") {
        return DayCode::WEEKEND.to_vec();
    }

    let mut rest = lower.to_string();
    let mut found = Vec::new();
    for (pattern, code) in DAY_PATTERNS {
        if rest.contains(pattern) {
            rest = rest.replace(pattern, " ");
            if !found.contains(&code) {
                found.push(code);
            }
        }
    }
    if found.is_empty() {
        DayCode::WEEK.to_vec()
    } else {
        found
    }
}

/// Meal-time words and the clock times they stand for. "öğlen" precedes its
/// prefix "öğle" so consumption leaves no half-matched residue; "ikindi"
/// must be consumed before the hour words so its "iki" doesn't read as 2.
const MEAL_TIMES: [(&str, &str); 6] = [
    ("sabah", "08:00"),
    ("öğlen", "12:00"),
    ("öğle", "12:00"),
    ("ikindi", "15:00"),
    ("akşam", "20:00"),
    ("gece", "22:00"),
];

/// Spelled-out hour words 1–23, compound forms before the words they
/// contain ("on bir" before "on" and "bir") — each hit consumes its text.
const WORD_NUMBERS: [(&str, u32); 23] = [
    ("on bir", 11),
    ("on iki", 12),
    ("on üç", 13),
    ("on dört", 14),
    ("on beş", 15),
    ("on altı", 16),
    ("on yedi", 17),
    ("on sekiz", 18),
    ("on dokuz", 19),
    ("yirmi bir", 21),
    ("yirmi iki", 22),
    ("yirmi üç", 23),
    ("yirmi", 20),
    ("bir", 1),
    ("iki", 2),
    ("üç", 3),
    ("dört", 4),
    ("beş", 5),
    ("altı", 6),
    ("yedi", 7),
    ("sekiz", 8),
    ("dokuz", 9),
    ("on", 10),
];

fn hour_token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b([0-9]{1,2})\b").expect("hour token regex"))
}

/// Parse a spoken times answer into `HH:00` clock times: meal-time keywords,
/// spelled-out hour words, and bare 0–23 integers, deduplicated in the order
/// they are recognized. Nothing recognized defaults to a single 08:00.
pub fn parse_times(text: &str) -> Vec<String> {
    if text.trim().is_empty() {
        return vec!["08:00".to_string()];
    }
    let lower = text.to_lowercase();
    let mut times: Vec<String> = Vec::new();
    fn add(times: &mut Vec<String>, t: String) {
        if !times.contains(&t) {
            times.push(t);
        }
    }

    let mut rest = lower;
    for (word, time) in MEAL_TIMES {
        if rest.contains(word) {
            rest = rest.replace(word, " ");
            add(&mut times, time.to_string());
        }
    }
    for (word, hour) in WORD_NUMBERS {
        if rest.contains(word) {
            rest = rest.replace(word, " ");
            add(&mut times, format!("{:02}:00", hour));
        }
    }
    for capture in hour_token_re().captures_iter(&rest) {
        if let Ok(hour) = capture[1].parse::<u32>() {
            if hour <= 23 {
                add(&mut times, format!("{:02}:00", hour));
            }
        }
    }

    if times.is_empty() {
        vec!["08:00".to_string()]
    } else {
        times
    }
}
