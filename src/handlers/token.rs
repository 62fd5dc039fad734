use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::Serialize;

use crate::errors::AppError;
use crate::state::AppState;

const TOKEN_TTL_SECS: i64 = 3600;

#[derive(Serialize)]
struct CapabilityClaims {
    scope: String,
    iss: String,
    exp: i64,
}

/// Short-lived capability token letting a browser client place outbound
/// calls through the telephony platform.
pub async fn issue_token(
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, AppError> {
    let config = &state.config;
    if config.twilio_account_sid.is_empty()
        || config.twilio_auth_token.is_empty()
        || config.twilio_app_sid.is_empty()
    {
        return Err(AppError::Config(
            "telephony credentials are not configured".to_string(),
        ));
    }

    let claims = CapabilityClaims {
        scope: format!("scope:client:outgoing?appSid={}", config.twilio_app_sid),
        iss: config.twilio_account_sid.clone(),
        exp: Utc::now().timestamp() + TOKEN_TTL_SECS,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.twilio_auth_token.as_bytes()),
    )
    .map_err(|e| AppError::Config(format!("failed to sign capability token: {e}")))?;

    Ok(Json(serde_json::json!({ "token": token })))
}
