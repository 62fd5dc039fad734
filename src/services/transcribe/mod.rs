pub mod deepgram;
pub mod hf;
pub mod whisper;

use std::time::Instant;

use async_trait::async_trait;

use crate::models::ProviderAttempt;

#[async_trait]
pub trait SpeechTranscriber: Send + Sync {
    fn name(&self) -> &'static str;

    /// `Ok(None)` means the provider ran but heard nothing usable.
    async fn transcribe(&self, audio: &[u8], language: &str) -> anyhow::Result<Option<String>>;
}

/// Ordered fallthrough over the configured speech-to-text backends. Providers
/// run strictly in priority order, one at a time; a provider that failed for
/// this utterance is never re-entered.
pub struct TranscriberChain {
    providers: Vec<Box<dyn SpeechTranscriber>>,
}

impl TranscriberChain {
    pub fn new(providers: Vec<Box<dyn SpeechTranscriber>>) -> Self {
        Self { providers }
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// First non-empty transcript wins. An empty string means every backend
    /// failed; callers treat that as "could not transcribe", not as an error.
    pub async fn transcribe(&self, audio: &[u8], language: &str) -> String {
        for provider in &self.providers {
            let started = Instant::now();
            let outcome = provider.transcribe(audio, language).await;
            let attempt = ProviderAttempt {
                provider: provider.name(),
                succeeded: matches!(&outcome, Ok(Some(t)) if !t.trim().is_empty()),
                latency_ms: started.elapsed().as_millis(),
            };

            match outcome {
                Ok(Some(text)) if attempt.succeeded => {
                    tracing::info!(
                        provider = attempt.provider,
                        latency_ms = attempt.latency_ms as u64,
                        "transcription succeeded"
                    );
                    return text.trim().to_string();
                }
                Ok(_) => {
                    tracing::info!(
                        provider = attempt.provider,
                        latency_ms = attempt.latency_ms as u64,
                        "provider heard nothing, falling through"
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        provider = attempt.provider,
                        latency_ms = attempt.latency_ms as u64,
                        error = %e,
                        "provider failed, falling through"
                    );
                }
            }
        }

        String::new()
    }
}
