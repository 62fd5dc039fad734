use std::sync::Arc;

use axum::extract::{OriginalUri, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Form;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha1::Sha1;

use crate::models::{CallStep, Language};
use crate::services::dialogue::{self, StepInput};
use crate::state::AppState;

#[derive(Deserialize, Default)]
pub struct StepQuery {
    pub step: Option<String>,
    pub lang: Option<String>,
}

#[derive(Deserialize, Default)]
pub struct VoiceWebhookForm {
    #[serde(rename = "CallSid")]
    pub call_sid: Option<String>,
    #[serde(rename = "From")]
    pub from: Option<String>,
    #[serde(rename = "Digits")]
    pub digits: Option<String>,
    #[serde(rename = "SpeechResult")]
    pub speech_result: Option<String>,
    #[serde(rename = "RecordingUrl")]
    pub recording_url: Option<String>,
}

fn validate_twilio_signature(
    auth_token: &str,
    signature: &str,
    url: &str,
    params: &[(&str, &str)],
) -> bool {
    // Build the data to sign: URL + sorted params concatenated
    let mut data = url.to_string();
    let mut sorted_params = params.to_vec();
    sorted_params.sort_by(|a, b| a.0.cmp(b.0));
    for (key, value) in &sorted_params {
        data.push_str(key);
        data.push_str(value);
    }

    let mut mac = match Hmac::<Sha1>::new_from_slice(auth_token.as_bytes()) {
        Ok(m) => m,
        Err(_) => return false,
    };
    mac.update(data.as_bytes());
    let result = mac.finalize().into_bytes();
    let expected = base64::engine::general_purpose::STANDARD.encode(result);

    expected == signature
}

pub async fn voice_webhook(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StepQuery>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    form: Option<Form<VoiceWebhookForm>>,
) -> Response {
    let Form(form) = form.unwrap_or_default();
    let step = CallStep::from_query(query.step.as_deref());
    let language = query.lang.as_deref().and_then(Language::from_code);

    tracing::info!(
        step = step.as_str(),
        lang = query.lang.as_deref().unwrap_or(""),
        call_sid = form.call_sid.as_deref().unwrap_or(""),
        from = form.from.as_deref().unwrap_or(""),
        "incoming voice webhook"
    );

    // Validate Twilio signature (skip if auth token is empty — dev mode)
    if !state.config.twilio_auth_token.is_empty() {
        let signature = headers
            .get("x-twilio-signature")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");

        if signature.is_empty() {
            tracing::warn!("missing X-Twilio-Signature header");
            return (StatusCode::FORBIDDEN, "Missing signature").into_response();
        }

        // Reconstruct webhook URL — use X-Forwarded-Proto/Host if behind proxy
        let proto = headers
            .get("x-forwarded-proto")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("https");
        let host = headers
            .get("x-forwarded-host")
            .or_else(|| headers.get("host"))
            .and_then(|v| v.to_str().ok())
            .unwrap_or("localhost");
        let path_and_query = uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/webhook/voice");
        let url = format!("{proto}://{host}{path_and_query}");

        let mut params: Vec<(&str, &str)> = Vec::new();
        if let Some(v) = form.call_sid.as_deref() {
            params.push(("CallSid", v));
        }
        if let Some(v) = form.from.as_deref() {
            params.push(("From", v));
        }
        if let Some(v) = form.digits.as_deref() {
            params.push(("Digits", v));
        }
        if let Some(v) = form.speech_result.as_deref() {
            params.push(("SpeechResult", v));
        }
        if let Some(v) = form.recording_url.as_deref() {
            params.push(("RecordingUrl", v));
        }

        if !validate_twilio_signature(&state.config.twilio_auth_token, signature, &url, &params) {
            tracing::warn!("invalid Twilio signature");
            return (StatusCode::FORBIDDEN, "Invalid signature").into_response();
        }
    }

    let input = StepInput {
        digits: form.digits,
        speech: form.speech_result,
        caller: form.from,
        recording_url: form.recording_url,
    };

    // The platform must always get well-formed markup back, whatever went
    // wrong underneath.
    let body = match dialogue::handle_step(&state, step, language, &input).await {
        Ok(twiml) => twiml,
        Err(e) => {
            tracing::error!(error = %e, step = step.as_str(), "step handling failed");
            dialogue::fatal_apology(&state, language)
        }
    };

    twiml_response(body)
}

fn twiml_response(body: String) -> Response {
    ([(header::CONTENT_TYPE, "application/xml")], body).into_response()
}
