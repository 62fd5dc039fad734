use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Timelike, Utc};
use chrono_english::{parse_date_string, Dialect};

use crate::models::{AppointmentIntent, Language, RawExtraction};

use super::LlmProvider;

/// Placeholder when no self-introduction is found in the utterance.
const FALLBACK_NAME: &str = "Patient";

/// Hour assigned when the extractor returns a bare date.
const DEFAULT_HOUR: u32 = 9;

/// Turns a free-text utterance into an appointment. The generative extractor
/// is the primary path; any call or parse failure degrades silently to the
/// deterministic fallback, so this never errors.
pub async fn extract_appointment(
    llm: &dyn LlmProvider,
    utterance: &str,
    language: Language,
    now: NaiveDateTime,
) -> AppointmentIntent {
    match llm.complete(&instruction(language, now), utterance).await {
        Ok(raw) => {
            if let Some(parsed) = parse_extraction(&raw) {
                if let Some(start) = parse_date_iso(&parsed.date_iso) {
                    let name = parsed.name.trim();
                    return AppointmentIntent {
                        patient_name: if name.is_empty() {
                            FALLBACK_NAME.to_string()
                        } else {
                            name.to_string()
                        },
                        start_time: normalize_start_time(start, now),
                    };
                }
            }
            tracing::warn!("extractor response did not match the expected shape, using fallback");
            fallback_extract(utterance, language, now)
        }
        Err(e) => {
            tracing::warn!(error = %e, "extractor call failed, using fallback");
            fallback_extract(utterance, language, now)
        }
    }
}

fn instruction(language: Language, now: NaiveDateTime) -> String {
    let language_name = match language {
        Language::English => "English",
        Language::French => "French",
        Language::Arabic => "Arabic",
    };
    format!(
        "You extract appointment bookings from transcripts of a clinic's phone line. \
         The caller speaks {language_name}. Current local time: {}. \
         Find the caller's name and the requested date and time. \
         Respond with ONLY this JSON, no markdown and no commentary: \
         {{\"date_iso\": \"YYYY-MM-DDTHH:MM:SS\", \"name\": \"the caller's full name\"}}. \
         Resolve relative dates against the current local time and never pick a past date.",
        now.format("%A %Y-%m-%d %H:%M")
    )
}

/// Strict parse of the model's reply. Markdown fences are tolerated since
/// models add them even when told not to; everything else is a miss.
fn parse_extraction(raw: &str) -> Option<RawExtraction> {
    let cleaned = raw.trim();
    let cleaned = cleaned
        .strip_prefix("```json")
        .or_else(|| cleaned.strip_prefix("```"))
        .unwrap_or(cleaned);
    let cleaned = cleaned.strip_suffix("```").unwrap_or(cleaned).trim();
    serde_json::from_str(cleaned).ok()
}

fn parse_date_iso(value: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_local());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M") {
        return Some(dt);
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(DEFAULT_HOUR, 0, 0))
}

/// Models under-specify the year; a past year is corrected to the current
/// one on the assumption that nobody books an appointment in the past.
/// Seconds are dropped so calendar instants stay minute-aligned.
pub fn normalize_start_time(start: NaiveDateTime, now: NaiveDateTime) -> NaiveDateTime {
    let start = start
        .with_second(0)
        .and_then(|dt| dt.with_nanosecond(0))
        .unwrap_or(start);
    if start.year() < now.year() {
        start
            .with_year(now.year())
            .or_else(|| start.with_day(28).and_then(|d| d.with_year(now.year())))
            .unwrap_or(start)
    } else {
        start
    }
}

/// Deterministic extraction for when the model is unavailable or returns
/// garbage: natural-language date parse where the language supports it, a
/// self-introduction scan for the name, placeholders otherwise.
pub fn fallback_extract(
    utterance: &str,
    language: Language,
    now: NaiveDateTime,
) -> AppointmentIntent {
    let start = if language.supports_date_parsing() {
        parse_spoken_date(utterance, now).unwrap_or_else(|| default_start(now))
    } else {
        default_start(now)
    };

    AppointmentIntent {
        patient_name: extract_name(utterance, language)
            .unwrap_or_else(|| FALLBACK_NAME.to_string()),
        start_time: normalize_start_time(start, now),
    }
}

fn default_start(now: NaiveDateTime) -> NaiveDateTime {
    now + Duration::hours(24)
}

/// Scans word windows of the utterance for a parseable date phrase, longest
/// window first so "tomorrow 3pm" beats a stray "may". Future bias: a
/// time-of-day already past today means tomorrow, a past year means this
/// year.
fn parse_spoken_date(utterance: &str, now: NaiveDateTime) -> Option<NaiveDateTime> {
    let base = chrono::DateTime::<Utc>::from_naive_utc_and_offset(now, Utc);
    let cleaned = utterance.to_lowercase().replace(" at ", " ");
    let words: Vec<&str> = cleaned
        .split(|c: char| c.is_whitespace() || matches!(c, ',' | '.' | '!' | '?' | ';'))
        .filter(|w| !w.is_empty())
        .take(30)
        .collect();

    for len in (1..=5.min(words.len())).rev() {
        for start in 0..=(words.len() - len) {
            let candidate = words[start..start + len].join(" ");
            if let Ok(parsed) = parse_date_string(&candidate, base, Dialect::Us) {
                let mut when = parsed.naive_utc();
                if when < now {
                    when += Duration::days(1);
                }
                if when < now {
                    when = normalize_start_time(when, now);
                }
                return Some(when);
            }
        }
    }
    None
}

fn name_markers(language: Language) -> &'static [&'static str] {
    match language {
        Language::English => &["my name is ", "this is ", "i am ", "i'm "],
        Language::French => &[
            "je m'appelle ",
            "je m\u{2019}appelle ",
            "mon nom est ",
            "je suis ",
        ],
        Language::Arabic => &["اسمي ", "أنا "],
    }
}

fn name_stopwords(language: Language) -> &'static [&'static str] {
    match language {
        Language::English => &["and", "i", "my"],
        Language::French => &["et", "je"],
        Language::Arabic => &["و"],
    }
}

/// Narrow self-introduction match. Deliberately not smarter than this: it is
/// a degraded fallback, and loosening it changes observable behavior.
pub fn extract_name(utterance: &str, language: Language) -> Option<String> {
    let lowered = utterance.to_lowercase();
    for marker in name_markers(language) {
        let Some(pos) = lowered.find(marker) else {
            continue;
        };
        // Lowercasing can shift byte offsets in some scripts; skip cleanly
        // rather than slicing mid-character.
        let Some(rest) = utterance.get(pos + marker.len()..) else {
            continue;
        };
        let clause: String = rest
            .chars()
            .take_while(|c| !matches!(c, ',' | '.' | ';' | '!' | '?' | '\n'))
            .collect();
        let words: Vec<&str> = clause
            .split_whitespace()
            .take_while(|w| {
                !name_stopwords(language)
                    .iter()
                    .any(|s| s.eq_ignore_ascii_case(w))
            })
            .take(3)
            .collect();
        if !words.is_empty() {
            return Some(words.join(" "));
        }
    }
    None
}
