pub mod extract;
pub mod groq;
pub mod ollama;

use async_trait::async_trait;

#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Single-turn completion: an extraction instruction plus the caller's
    /// utterance. The dialogue has no history to carry.
    async fn complete(&self, instruction: &str, input: &str) -> anyhow::Result<String>;
}
