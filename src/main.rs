use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use frontdesk::config::AppConfig;
use frontdesk::handlers;
use frontdesk::services::ai::groq::GroqProvider;
use frontdesk::services::ai::ollama::OllamaProvider;
use frontdesk::services::ai::LlmProvider;
use frontdesk::services::calendar::GoogleCalendar;
use frontdesk::services::recording::TwilioRecordingFetcher;
use frontdesk::services::transcribe::deepgram::DeepgramTranscriber;
use frontdesk::services::transcribe::hf::HuggingFaceTranscriber;
use frontdesk::services::transcribe::whisper::WhisperTranscriber;
use frontdesk::services::transcribe::{SpeechTranscriber, TranscriberChain};
use frontdesk::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let llm: Box<dyn LlmProvider> = match config.llm_provider.as_str() {
        "groq" => {
            anyhow::ensure!(
                !config.groq_api_key.is_empty(),
                "GROQ_API_KEY must be set when LLM_PROVIDER=groq"
            );
            tracing::info!("using Groq LLM provider (model: {})", config.groq_model);
            Box::new(GroqProvider::new(
                config.groq_api_key.clone(),
                config.groq_model.clone(),
            ))
        }
        _ => {
            tracing::info!("using Ollama LLM provider (url: {})", config.ollama_url);
            Box::new(OllamaProvider::new(
                config.ollama_url.clone(),
                "llama3.2".to_string(),
            ))
        }
    };

    // Fixed priority order; membership depends on which keys are configured.
    let mut providers: Vec<Box<dyn SpeechTranscriber>> = Vec::new();
    if !config.openai_api_key.is_empty() {
        tracing::info!("whisper transcription enabled");
        providers.push(Box::new(WhisperTranscriber::new(
            config.openai_api_key.clone(),
        )));
    }
    if !config.deepgram_api_key.is_empty() {
        tracing::info!("deepgram transcription enabled");
        providers.push(Box::new(DeepgramTranscriber::new(
            config.deepgram_api_key.clone(),
        )));
    }
    if !config.hf_api_token.is_empty() {
        tracing::info!("hugging face transcription enabled");
        providers.push(Box::new(HuggingFaceTranscriber::new(
            config.hf_api_token.clone(),
        )));
    }
    if providers.is_empty() {
        tracing::warn!("no transcription providers configured; recorded languages will fail");
    }

    let state = Arc::new(AppState {
        llm,
        transcriber: TranscriberChain::new(providers),
        recordings: Box::new(TwilioRecordingFetcher::new(
            config.twilio_account_sid.clone(),
            config.twilio_auth_token.clone(),
        )),
        calendar: Box::new(GoogleCalendar::new(
            config.google_client_id.clone(),
            config.google_client_secret.clone(),
            config.google_refresh_token.clone(),
            config.google_calendar_id.clone(),
        )),
        config: config.clone(),
    });

    let app = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/webhook/voice", post(handlers::voice::voice_webhook))
        .route("/audio/:name", get(handlers::audio::serve_prompt))
        .route("/token", post(handlers::token::issue_token))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
