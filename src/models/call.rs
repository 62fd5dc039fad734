/// Phase of a call's dialogue. Carried in the webhook callback URL; the
/// platform echoes it back on the next request, so nothing lives server-side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallStep {
    Start,
    LanguageSelect,
    Collect,
}

impl CallStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallStep::Start => "start",
            CallStep::LanguageSelect => "lang",
            CallStep::Collect => "collect",
        }
    }

    /// Missing or garbled step parameters restart the dialogue.
    pub fn from_query(value: Option<&str>) -> Self {
        match value {
            Some("lang") => CallStep::LanguageSelect,
            Some("collect") => CallStep::Collect,
            _ => CallStep::Start,
        }
    }
}

/// One transcription provider call. Logged, then used only to decide whether
/// the chain falls through to the next provider.
#[derive(Debug)]
pub struct ProviderAttempt {
    pub provider: &'static str,
    pub succeeded: bool,
    pub latency_ms: u128,
}
