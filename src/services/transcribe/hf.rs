use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;

use super::SpeechTranscriber;

/// Longest we are willing to wait for a cold model before giving the chain
/// back control.
const MAX_LOADING_WAIT_SECS: f64 = 8.0;

/// Hosted inference endpoint. A cold model answers 503 with an
/// `estimated_time` hint; the single bounded wait-then-retry happens here,
/// inside the provider, before the chain moves on.
pub struct HuggingFaceTranscriber {
    api_token: String,
    model: String,
    client: reqwest::Client,
}

impl HuggingFaceTranscriber {
    pub fn new(api_token: String) -> Self {
        Self {
            api_token,
            model: "openai/whisper-large-v3".to_string(),
            client: reqwest::Client::new(),
        }
    }

    async fn request(&self, audio: &[u8]) -> anyhow::Result<reqwest::Response> {
        self.client
            .post(format!(
                "https://api-inference.huggingface.co/models/{}",
                self.model
            ))
            .bearer_auth(&self.api_token)
            .header("Content-Type", "audio/mpeg")
            .body(audio.to_vec())
            .send()
            .await
            .context("failed to call Hugging Face inference API")
    }
}

#[derive(Deserialize)]
struct LoadingResponse {
    estimated_time: Option<f64>,
}

#[derive(Deserialize)]
struct HfResponse {
    text: String,
}

#[async_trait]
impl SpeechTranscriber for HuggingFaceTranscriber {
    fn name(&self) -> &'static str {
        "huggingface"
    }

    async fn transcribe(&self, audio: &[u8], _language: &str) -> anyhow::Result<Option<String>> {
        let mut resp = self.request(audio).await?;

        if resp.status() == StatusCode::SERVICE_UNAVAILABLE {
            let wait = resp
                .json::<LoadingResponse>()
                .await
                .ok()
                .and_then(|l| l.estimated_time)
                .unwrap_or(MAX_LOADING_WAIT_SECS)
                .min(MAX_LOADING_WAIT_SECS);
            tracing::info!(model = %self.model, wait_secs = wait, "model loading, retrying once");
            tokio::time::sleep(Duration::from_secs_f64(wait)).await;
            resp = self.request(audio).await?;
        }

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Hugging Face API error ({status}): {body}");
        }

        let data: HfResponse = resp
            .json()
            .await
            .context("failed to parse Hugging Face response")?;

        let text = data.text.trim().to_string();
        Ok((!text.is_empty()).then_some(text))
    }
}
