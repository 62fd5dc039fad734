use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;

use super::SpeechTranscriber;

pub struct WhisperTranscriber {
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl WhisperTranscriber {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            model: "whisper-1".to_string(),
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Deserialize)]
struct WhisperResponse {
    text: String,
}

#[async_trait]
impl SpeechTranscriber for WhisperTranscriber {
    fn name(&self) -> &'static str {
        "whisper"
    }

    async fn transcribe(&self, audio: &[u8], language: &str) -> anyhow::Result<Option<String>> {
        let file = reqwest::multipart::Part::bytes(audio.to_vec())
            .file_name("recording.mp3")
            .mime_str("audio/mpeg")
            .context("failed to build audio part")?;
        let form = reqwest::multipart::Form::new()
            .part("file", file)
            .text("model", self.model.clone())
            .text("language", language.to_string());

        let resp = self
            .client
            .post("https://api.openai.com/v1/audio/transcriptions")
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .context("failed to call Whisper API")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Whisper API error ({status}): {body}");
        }

        let data: WhisperResponse = resp
            .json()
            .await
            .context("failed to parse Whisper response")?;

        let text = data.text.trim().to_string();
        Ok((!text.is_empty()).then_some(text))
    }
}
