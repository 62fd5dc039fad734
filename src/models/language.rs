use chrono::NaiveDateTime;

/// How the caller's speech becomes text for a given language: the platform
/// recognizes it inline, or we record audio and transcribe it ourselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureStrategy {
    NativeSpeech,
    RecordThenTranscribe,
}

/// A localized phrase together with the way the platform can deliver it:
/// synthesized speech, or a hosted recording for locales the TTS engine
/// cannot render.
#[derive(Debug, Clone, PartialEq)]
pub enum Phrase {
    Say(String),
    Play(&'static str),
}

/// The languages the line answers in. Selected once per call and threaded
/// through every subsequent step as a query parameter, never changed after.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    English,
    French,
    Arabic,
}

impl Language {
    pub const ALL: [Language; 3] = [Language::English, Language::French, Language::Arabic];
    pub const PRIMARY: Language = Language::English;

    pub fn code(self) -> &'static str {
        match self {
            Language::English => "en",
            Language::French => "fr",
            Language::Arabic => "ar",
        }
    }

    pub fn locale(self) -> &'static str {
        match self {
            Language::English => "en-US",
            Language::French => "fr-FR",
            Language::Arabic => "ar",
        }
    }

    pub fn digit(self) -> char {
        match self {
            Language::English => '1',
            Language::French => '2',
            Language::Arabic => '3',
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "en" => Some(Language::English),
            "fr" => Some(Language::French),
            "ar" => Some(Language::Arabic),
            _ => None,
        }
    }

    /// The platform recognizes English and French speech inline. Arabic it
    /// can neither recognize nor synthesize, so Arabic turns are recorded and
    /// transcribed offline, and Arabic prompts are pre-recorded assets.
    pub fn capture_strategy(self) -> CaptureStrategy {
        match self {
            Language::English | Language::French => CaptureStrategy::NativeSpeech,
            Language::Arabic => CaptureStrategy::RecordThenTranscribe,
        }
    }

    /// Whether the deterministic fallback parser understands this language.
    /// Languages without reliable parsing default to a placeholder date
    /// instead of guessing.
    pub fn supports_date_parsing(self) -> bool {
        matches!(self, Language::English)
    }

    fn keywords(self) -> &'static [&'static str] {
        match self {
            Language::English => &["english"],
            Language::French => &["french", "français", "francais"],
            Language::Arabic => &["arabic", "arabe", "عربية", "العربية"],
        }
    }

    /// Resolve the caller's menu input: exact DTMF digit first, then a
    /// keyword anywhere in the recognized speech, else the primary language.
    pub fn resolve(digits: Option<&str>, speech: Option<&str>) -> Language {
        if let Some(digits) = digits {
            let digits = digits.trim();
            for language in Language::ALL {
                if digits.len() == 1 && digits.starts_with(language.digit()) {
                    return language;
                }
            }
        }

        if let Some(speech) = speech {
            let lowered = speech.to_lowercase();
            for language in Language::ALL {
                if language.keywords().iter().any(|k| lowered.contains(k)) {
                    return language;
                }
            }
        }

        Language::PRIMARY
    }

    pub fn menu_phrase(self, clinic_name: &str) -> Phrase {
        match self {
            Language::English => Phrase::Say(format!(
                "Welcome to {clinic_name}. For English, press 1 or say English."
            )),
            Language::French => Phrase::Say(
                "Pour le français, appuyez sur le 2 ou dites français.".to_string(),
            ),
            Language::Arabic => Phrase::Play("lang_menu_ar.mp3"),
        }
    }

    pub fn details_prompt(self) -> Phrase {
        match self {
            Language::English => Phrase::Say(
                "Please tell me your full name, and the day and time you would like to come in."
                    .to_string(),
            ),
            Language::French => Phrase::Say(
                "Veuillez indiquer votre nom complet, ainsi que le jour et l'heure souhaités pour votre rendez-vous."
                    .to_string(),
            ),
            Language::Arabic => Phrase::Play("ask_details_ar.mp3"),
        }
    }

    pub fn confirmation(self, patient_name: &str, start: NaiveDateTime) -> Phrase {
        match self {
            Language::English => Phrase::Say(format!(
                "Thank you {patient_name}. Your appointment is booked for {}. Goodbye.",
                start.format("%A %B %-d at %-I:%M %p")
            )),
            Language::French => Phrase::Say(format!(
                "Merci {patient_name}. Votre rendez-vous est confirmé le {} à {}. Au revoir.",
                start.format("%d/%m"),
                start.format("%H:%M")
            )),
            Language::Arabic => Phrase::Play("confirmed_ar.mp3"),
        }
    }

    pub fn not_understood(self) -> Phrase {
        match self {
            Language::English => Phrase::Say(
                "Sorry, I could not understand you. Please call again.".to_string(),
            ),
            Language::French => Phrase::Say(
                "Désolé, je ne vous ai pas compris. Veuillez rappeler.".to_string(),
            ),
            Language::Arabic => Phrase::Play("not_understood_ar.mp3"),
        }
    }

    pub fn booking_failed(self) -> Phrase {
        match self {
            Language::English => Phrase::Say(
                "Sorry, we could not schedule your appointment. Please call again later."
                    .to_string(),
            ),
            Language::French => Phrase::Say(
                "Désolé, nous n'avons pas pu planifier votre rendez-vous. Veuillez rappeler plus tard."
                    .to_string(),
            ),
            Language::Arabic => Phrase::Play("booking_failed_ar.mp3"),
        }
    }

    pub fn generic_error(self) -> Phrase {
        match self {
            Language::English => Phrase::Say(
                "We are sorry, something went wrong. Please call again later.".to_string(),
            ),
            Language::French => Phrase::Say(
                "Désolé, une erreur s'est produite. Veuillez rappeler plus tard.".to_string(),
            ),
            Language::Arabic => Phrase::Play("error_ar.mp3"),
        }
    }
}
