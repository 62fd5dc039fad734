use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Structured appointment derived from a single utterance. Lives for one
/// booking attempt and is not retried across calls.
#[derive(Debug, Clone, PartialEq)]
pub struct AppointmentIntent {
    pub patient_name: String,
    pub start_time: NaiveDateTime,
}

/// The exact JSON shape the extraction model is instructed to return. Parsed
/// strictly; anything that does not fit routes to the deterministic fallback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawExtraction {
    pub date_iso: String,
    pub name: String,
}
