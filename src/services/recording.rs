use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;

/// Delays between successive download attempts. The platform finalizes
/// recordings asynchronously, so the first fetch can race the file into
/// existence and see a 404.
pub const DOWNLOAD_BACKOFF_MS: [u64; 5] = [250, 500, 1000, 2000, 4000];

#[async_trait]
pub trait RecordingFetcher: Send + Sync {
    async fn fetch(&self, recording_url: &str) -> anyhow::Result<Vec<u8>>;
}

pub struct TwilioRecordingFetcher {
    account_sid: String,
    auth_token: String,
    client: reqwest::Client,
    backoff_ms: Vec<u64>,
}

impl TwilioRecordingFetcher {
    pub fn new(account_sid: String, auth_token: String) -> Self {
        Self {
            account_sid,
            auth_token,
            client: reqwest::Client::new(),
            backoff_ms: DOWNLOAD_BACKOFF_MS.to_vec(),
        }
    }

    #[cfg(test)]
    fn with_backoff(mut self, backoff_ms: Vec<u64>) -> Self {
        self.backoff_ms = backoff_ms;
        self
    }
}

#[async_trait]
impl RecordingFetcher for TwilioRecordingFetcher {
    /// Downloads the mp3 rendition of a finished recording, retrying on the
    /// fixed schedule and stopping at the first success.
    async fn fetch(&self, recording_url: &str) -> anyhow::Result<Vec<u8>> {
        let url = format!("{recording_url}.mp3");
        let mut last_status = None;

        for attempt in 0..=self.backoff_ms.len() {
            if attempt > 0 {
                tokio::time::sleep(Duration::from_millis(self.backoff_ms[attempt - 1])).await;
            }

            match self
                .client
                .get(&url)
                .basic_auth(&self.account_sid, Some(&self.auth_token))
                .send()
                .await
            {
                Ok(resp) => {
                    let status = resp.status();
                    tracing::info!(%status, attempt, "recording download attempt");
                    if status.is_success() {
                        let bytes = resp
                            .bytes()
                            .await
                            .context("failed to read recording body")?;
                        return Ok(bytes.to_vec());
                    }
                    last_status = Some(status);
                }
                Err(e) => {
                    tracing::warn!(error = %e, attempt, "recording download attempt failed");
                }
            }
        }

        anyhow::bail!(
            "recording not available after {} attempts (last status: {:?})",
            self.backoff_ms.len() + 1,
            last_status
        )
    }
}
