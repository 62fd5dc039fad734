use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::routing::{get, post};
use axum::Router;
use tower::ServiceExt;

use frontdesk::config::AppConfig;
use frontdesk::handlers;
use frontdesk::services::ai::LlmProvider;
use frontdesk::services::calendar::{CalendarEvent, CalendarProvider};
use frontdesk::services::recording::RecordingFetcher;
use frontdesk::services::transcribe::{SpeechTranscriber, TranscriberChain};
use frontdesk::state::AppState;

// ── Mock Providers ──

struct MockLlm {
    reply: String,
}

#[async_trait]
impl LlmProvider for MockLlm {
    async fn complete(&self, _instruction: &str, _input: &str) -> anyhow::Result<String> {
        Ok(self.reply.clone())
    }
}

struct MockCalendar {
    inserted: Arc<Mutex<Vec<CalendarEvent>>>,
    fail: bool,
}

#[async_trait]
impl CalendarProvider for MockCalendar {
    async fn insert_event(&self, event: &CalendarEvent) -> anyhow::Result<()> {
        if self.fail {
            anyhow::bail!("calendar said no");
        }
        self.inserted.lock().unwrap().push(event.clone());
        Ok(())
    }
}

struct MockFetcher {
    audio: Option<Vec<u8>>,
}

#[async_trait]
impl RecordingFetcher for MockFetcher {
    async fn fetch(&self, _recording_url: &str) -> anyhow::Result<Vec<u8>> {
        match &self.audio {
            Some(bytes) => Ok(bytes.clone()),
            None => anyhow::bail!("recording never appeared"),
        }
    }
}

struct StubTranscriber {
    text: &'static str,
}

#[async_trait]
impl SpeechTranscriber for StubTranscriber {
    fn name(&self) -> &'static str {
        "stub"
    }

    async fn transcribe(&self, _audio: &[u8], _language: &str) -> anyhow::Result<Option<String>> {
        Ok(Some(self.text.to_string()))
    }
}

// ── Helpers ──

const JEAN_JSON: &str = r#"{"date_iso":"2099-08-15T15:00:00","name":"Jean Dupont"}"#;

fn test_config() -> AppConfig {
    AppConfig {
        port: 3000,
        public_base_url: "https://clinic.example.com".to_string(),
        clinic_name: "Test Clinic".to_string(),
        clinic_timezone: "UTC".to_string(),
        clinic_utc_offset_minutes: 0,
        appointment_minutes: 30,
        audio_dir: "assets/audio".to_string(),
        twilio_account_sid: "".to_string(),
        twilio_auth_token: "".to_string(), // empty = skip signature validation
        twilio_app_sid: "".to_string(),
        llm_provider: "groq".to_string(),
        groq_api_key: "".to_string(),
        groq_model: "test".to_string(),
        ollama_url: "http://localhost:11434".to_string(),
        openai_api_key: "".to_string(),
        deepgram_api_key: "".to_string(),
        hf_api_token: "".to_string(),
        google_client_id: "".to_string(),
        google_client_secret: "".to_string(),
        google_refresh_token: "".to_string(),
        google_calendar_id: "primary".to_string(),
    }
}

struct StateBuilder {
    config: AppConfig,
    llm_reply: String,
    calendar_fail: bool,
    recording: Option<Vec<u8>>,
    transcript: Option<&'static str>,
}

impl StateBuilder {
    fn new() -> Self {
        Self {
            config: test_config(),
            llm_reply: JEAN_JSON.to_string(),
            calendar_fail: false,
            recording: None,
            transcript: None,
        }
    }

    fn config(mut self, config: AppConfig) -> Self {
        self.config = config;
        self
    }

    fn calendar_fails(mut self) -> Self {
        self.calendar_fail = true;
        self
    }

    fn recording(mut self, audio: Option<Vec<u8>>) -> Self {
        self.recording = audio;
        self
    }

    fn transcript(mut self, text: &'static str) -> Self {
        self.transcript = Some(text);
        self
    }

    fn build(self) -> (Arc<AppState>, Arc<Mutex<Vec<CalendarEvent>>>) {
        let inserted = Arc::new(Mutex::new(vec![]));
        let providers: Vec<Box<dyn SpeechTranscriber>> = match self.transcript {
            Some(text) => vec![Box::new(StubTranscriber { text })],
            None => vec![],
        };
        let state = Arc::new(AppState {
            config: self.config,
            llm: Box::new(MockLlm {
                reply: self.llm_reply,
            }),
            transcriber: TranscriberChain::new(providers),
            recordings: Box::new(MockFetcher {
                audio: self.recording,
            }),
            calendar: Box::new(MockCalendar {
                inserted: Arc::clone(&inserted),
                fail: self.calendar_fail,
            }),
        });
        (state, inserted)
    }
}

fn test_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/webhook/voice", post(handlers::voice::voice_webhook))
        .route("/audio/:name", get(handlers::audio::serve_prompt))
        .route("/token", post(handlers::token::issue_token))
        .with_state(state)
}

fn voice_request(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_text(res: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

// ── Start step ──

#[tokio::test]
async fn start_step_offers_every_language() {
    let (state, _) = StateBuilder::new().build();
    let app = test_app(state);

    let res = app
        .oneshot(voice_request("/webhook/voice", "CallSid=CA1"))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        res.headers().get("content-type").unwrap(),
        "application/xml"
    );
    let text = body_text(res).await;
    assert!(text.contains("<Gather"));
    assert!(text.contains("press 1"));
    assert!(text.contains("appuyez sur le 2"));
    assert!(text.contains("https://clinic.example.com/audio/lang_menu_ar.mp3"));
    assert!(text.contains("step=lang"));
}

#[tokio::test]
async fn garbled_step_falls_back_to_start() {
    let (state, _) = StateBuilder::new().build();
    let app = test_app(state);

    let res = app
        .oneshot(voice_request("/webhook/voice?step=confirm", "CallSid=CA1"))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let text = body_text(res).await;
    assert!(text.contains("press 1"), "expected start menu, got: {text}");
}

// ── Language selection ──

#[tokio::test]
async fn digit_selects_french_and_prompts_in_french() {
    let (state, _) = StateBuilder::new().build();
    let app = test_app(state);

    let res = app
        .oneshot(voice_request(
            "/webhook/voice?step=lang",
            "CallSid=CA1&Digits=2",
        ))
        .await
        .unwrap();

    let text = body_text(res).await;
    assert!(text.contains(r#"language="fr-FR""#));
    assert!(text.contains("step=collect&amp;lang=fr"));
    assert!(text.contains("votre nom complet"));
}

#[tokio::test]
async fn spoken_keyword_selects_french() {
    let (state, _) = StateBuilder::new().build();
    let app = test_app(state);

    let res = app
        .oneshot(voice_request(
            "/webhook/voice?step=lang",
            "CallSid=CA1&SpeechResult=I+would+like+french+please",
        ))
        .await
        .unwrap();

    let text = body_text(res).await;
    assert!(text.contains("step=collect&amp;lang=fr"));
}

#[tokio::test]
async fn unmatched_selection_defaults_to_english() {
    let (state, _) = StateBuilder::new().build();
    let app = test_app(state);

    let res = app
        .oneshot(voice_request(
            "/webhook/voice?step=lang",
            "CallSid=CA1&Digits=9&SpeechResult=mumble",
        ))
        .await
        .unwrap();

    let text = body_text(res).await;
    assert!(text.contains(r#"language="en-US""#));
    assert!(text.contains("step=collect&amp;lang=en"));
}

#[tokio::test]
async fn arabic_selection_plays_prompt_and_records() {
    let (state, _) = StateBuilder::new().build();
    let app = test_app(state);

    let res = app
        .oneshot(voice_request(
            "/webhook/voice?step=lang",
            "CallSid=CA1&Digits=3",
        ))
        .await
        .unwrap();

    let text = body_text(res).await;
    assert!(text.contains("https://clinic.example.com/audio/ask_details_ar.mp3"));
    assert!(text.contains("<Record"));
    assert!(text.contains("step=collect&amp;lang=ar"));
    assert!(!text.contains("<Gather"));
}

// ── Collect: end-to-end booking ──

#[tokio::test]
async fn french_booking_confirms_with_patient_name() {
    let (state, inserted) = StateBuilder::new().build();
    let app = test_app(state);

    let res = app
        .oneshot(voice_request(
            "/webhook/voice?step=collect&lang=fr",
            "CallSid=CA1&From=%2B15551110000&SpeechResult=Jean+Dupont+le+quinze+a+quinze+heures",
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let text = body_text(res).await;
    assert!(text.contains("Jean Dupont"), "confirmation should name the patient: {text}");
    assert!(text.contains("Merci"));
    assert!(text.contains("<Hangup/>"));

    let events = inserted.lock().unwrap();
    assert_eq!(events.len(), 1);
    let event = &events[0];
    assert!(event.summary.contains("Jean Dupont"));
    assert!(event.description.contains("+15551110000"));
    assert_eq!(event.end - event.start, chrono::Duration::minutes(30));
    assert_eq!(event.start.format("%m-%d %H:%M").to_string(), "08-15 15:00");
}

#[tokio::test]
async fn silence_apologizes_and_books_nothing() {
    let (state, inserted) = StateBuilder::new().build();
    let app = test_app(state);

    let res = app
        .oneshot(voice_request(
            "/webhook/voice?step=collect&lang=en",
            "CallSid=CA1&From=%2B15551110000",
        ))
        .await
        .unwrap();

    let text = body_text(res).await;
    assert!(text.contains("could not understand"));
    assert!(inserted.lock().unwrap().is_empty());
}

#[tokio::test]
async fn calendar_failure_yields_scheduling_apology() {
    let (state, inserted) = StateBuilder::new().calendar_fails().build();
    let app = test_app(state);

    let res = app
        .oneshot(voice_request(
            "/webhook/voice?step=collect&lang=fr",
            "CallSid=CA1&From=%2B15551110000&SpeechResult=Jean+Dupont+demain",
        ))
        .await
        .unwrap();

    let text = body_text(res).await;
    // Distinct from the acquisition apology.
    assert!(text.contains("pas pu planifier"), "got: {text}");
    assert!(!text.contains("pas compris"));
    assert!(inserted.lock().unwrap().is_empty());
}

// ── Collect: record-then-transcribe ──

#[tokio::test]
async fn arabic_recording_is_transcribed_and_booked() {
    let (state, inserted) = StateBuilder::new()
        .recording(Some(vec![0u8; 64]))
        .transcript("اسمي كريم، غدا في الثالثة")
        .build();
    let app = test_app(state);

    let res = app
        .oneshot(voice_request(
            "/webhook/voice?step=collect&lang=ar",
            "CallSid=CA1&From=%2B15551110000&RecordingUrl=https%3A%2F%2Fapi.twilio.com%2Frec%2FRE1",
        ))
        .await
        .unwrap();

    let text = body_text(res).await;
    assert!(text.contains("confirmed_ar.mp3"), "got: {text}");
    assert_eq!(inserted.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn unavailable_recording_apologizes_in_arabic() {
    let (state, inserted) = StateBuilder::new()
        .recording(None)
        .transcript("anything")
        .build();
    let app = test_app(state);

    let res = app
        .oneshot(voice_request(
            "/webhook/voice?step=collect&lang=ar",
            "CallSid=CA1&RecordingUrl=https%3A%2F%2Fapi.twilio.com%2Frec%2FRE1",
        ))
        .await
        .unwrap();

    let text = body_text(res).await;
    assert!(text.contains("not_understood_ar.mp3"));
    assert!(inserted.lock().unwrap().is_empty());
}

// ── Signature validation ──

#[tokio::test]
async fn configured_auth_token_requires_signature() {
    let mut config = test_config();
    config.twilio_auth_token = "secret".to_string();
    let (state, _) = StateBuilder::new().config(config).build();
    let app = test_app(state);

    let res = app
        .oneshot(voice_request("/webhook/voice", "CallSid=CA1"))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

// ── Capability token ──

#[tokio::test]
async fn token_endpoint_signs_outgoing_scope() {
    use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};

    let mut config = test_config();
    config.twilio_account_sid = "AC123".to_string();
    config.twilio_auth_token = "secret".to_string();
    config.twilio_app_sid = "AP456".to_string();
    let (state, _) = StateBuilder::new().config(config).build();
    let app = test_app(state);

    let res = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let json: serde_json::Value =
        serde_json::from_str(&body_text(res).await).unwrap();
    let token = json["token"].as_str().unwrap();

    #[derive(serde::Deserialize)]
    struct Claims {
        scope: String,
        iss: String,
    }

    let decoded = decode::<Claims>(
        token,
        &DecodingKey::from_secret(b"secret"),
        &Validation::new(Algorithm::HS256),
    )
    .unwrap();
    assert_eq!(decoded.claims.iss, "AC123");
    assert!(decoded.claims.scope.contains("appSid=AP456"));
}

#[tokio::test]
async fn token_endpoint_errors_without_credentials() {
    let (state, _) = StateBuilder::new().build();
    let app = test_app(state);

    let res = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

// ── Audio assets ──

#[tokio::test]
async fn audio_endpoint_serves_existing_asset() {
    let dir = std::env::temp_dir().join(format!("frontdesk-audio-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("lang_menu_ar.mp3"), b"mp3bytes").unwrap();

    let mut config = test_config();
    config.audio_dir = dir.to_string_lossy().to_string();
    let (state, _) = StateBuilder::new().config(config).build();
    let app = test_app(state);

    let res = app
        .oneshot(
            Request::builder()
                .uri("/audio/lang_menu_ar.mp3")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers().get("content-type").unwrap(), "audio/mpeg");
    assert_eq!(body_text(res).await, "mp3bytes");
}

#[tokio::test]
async fn missing_audio_asset_is_404() {
    let (state, _) = StateBuilder::new().build();
    let app = test_app(state);

    let res = app
        .oneshot(
            Request::builder()
                .uri("/audio/never_recorded.mp3")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

// ── Health ──

#[tokio::test]
async fn test_health() {
    let (state, _) = StateBuilder::new().build();
    let app = test_app(state);

    let res = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
}
