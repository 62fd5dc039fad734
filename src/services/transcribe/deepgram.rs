use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;

use super::SpeechTranscriber;

pub struct DeepgramTranscriber {
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl DeepgramTranscriber {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            model: "nova-2".to_string(),
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Deserialize)]
struct DeepgramResponse {
    results: DeepgramResults,
}

#[derive(Deserialize)]
struct DeepgramResults {
    channels: Vec<DeepgramChannel>,
}

#[derive(Deserialize)]
struct DeepgramChannel {
    alternatives: Vec<DeepgramAlternative>,
}

#[derive(Deserialize)]
struct DeepgramAlternative {
    transcript: String,
}

#[async_trait]
impl SpeechTranscriber for DeepgramTranscriber {
    fn name(&self) -> &'static str {
        "deepgram"
    }

    async fn transcribe(&self, audio: &[u8], language: &str) -> anyhow::Result<Option<String>> {
        let url = format!(
            "https://api.deepgram.com/v1/listen?model={}&language={language}&punctuate=true",
            self.model
        );

        let resp = self
            .client
            .post(&url)
            .header("Authorization", format!("Token {}", self.api_key))
            .header("Content-Type", "audio/mpeg")
            .body(audio.to_vec())
            .send()
            .await
            .context("failed to call Deepgram API")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Deepgram API error ({status}): {body}");
        }

        let data: DeepgramResponse = resp
            .json()
            .await
            .context("failed to parse Deepgram response")?;

        let transcript = data
            .results
            .channels
            .first()
            .and_then(|c| c.alternatives.first())
            .map(|a| a.transcript.trim().to_string())
            .unwrap_or_default();

        Ok((!transcript.is_empty()).then_some(transcript))
    }
}
