use std::env;

use chrono::{Duration, NaiveDateTime, Utc};

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub public_base_url: String,
    pub clinic_name: String,
    pub clinic_timezone: String,
    pub clinic_utc_offset_minutes: i32,
    pub appointment_minutes: i64,
    pub audio_dir: String,
    pub twilio_account_sid: String,
    pub twilio_auth_token: String,
    pub twilio_app_sid: String,
    pub llm_provider: String,
    pub groq_api_key: String,
    pub groq_model: String,
    pub ollama_url: String,
    pub openai_api_key: String,
    pub deepgram_api_key: String,
    pub hf_api_token: String,
    pub google_client_id: String,
    pub google_client_secret: String,
    pub google_refresh_token: String,
    pub google_calendar_id: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            public_base_url: env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            clinic_name: env::var("CLINIC_NAME").unwrap_or_else(|_| "the clinic".to_string()),
            clinic_timezone: env::var("CLINIC_TIMEZONE").unwrap_or_else(|_| "UTC".to_string()),
            clinic_utc_offset_minutes: env::var("CLINIC_UTC_OFFSET_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(0),
            appointment_minutes: env::var("APPOINTMENT_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
            audio_dir: env::var("AUDIO_DIR").unwrap_or_else(|_| "assets/audio".to_string()),
            twilio_account_sid: env::var("TWILIO_ACCOUNT_SID").unwrap_or_default(),
            twilio_auth_token: env::var("TWILIO_AUTH_TOKEN").unwrap_or_default(),
            twilio_app_sid: env::var("TWILIO_APP_SID").unwrap_or_default(),
            llm_provider: env::var("LLM_PROVIDER").unwrap_or_else(|_| "ollama".to_string()),
            groq_api_key: env::var("GROQ_API_KEY").unwrap_or_default(),
            groq_model: env::var("GROQ_MODEL")
                .unwrap_or_else(|_| "llama-3.3-70b-versatile".to_string()),
            ollama_url: env::var("OLLAMA_URL")
                .unwrap_or_else(|_| "http://localhost:11434".to_string()),
            openai_api_key: env::var("OPENAI_API_KEY").unwrap_or_default(),
            deepgram_api_key: env::var("DEEPGRAM_API_KEY").unwrap_or_default(),
            hf_api_token: env::var("HF_API_TOKEN").unwrap_or_default(),
            google_client_id: env::var("GOOGLE_CLIENT_ID").unwrap_or_default(),
            google_client_secret: env::var("GOOGLE_CLIENT_SECRET").unwrap_or_default(),
            google_refresh_token: env::var("GOOGLE_REFRESH_TOKEN").unwrap_or_default(),
            google_calendar_id: env::var("GOOGLE_CALENDAR_ID")
                .unwrap_or_else(|_| "primary".to_string()),
        }
    }

    /// Current wall-clock time at the clinic. Appointment instants are kept
    /// clinic-local; the IANA zone name only travels to the calendar API.
    pub fn local_now(&self) -> NaiveDateTime {
        (Utc::now() + Duration::minutes(i64::from(self.clinic_utc_offset_minutes))).naive_utc()
    }

    pub fn audio_url(&self, asset: &str) -> String {
        format!("{}/audio/{asset}", self.public_base_url.trim_end_matches('/'))
    }
}
