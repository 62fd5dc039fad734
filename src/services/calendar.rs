use anyhow::Context;
use async_trait::async_trait;
use chrono::{Duration, NaiveDateTime};
use serde::Deserialize;
use serde_json::json;

use crate::models::AppointmentIntent;

/// Event payload submitted to the calendar service. Owned by the calendar
/// once inserted; this system never reads it back.
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarEvent {
    pub summary: String,
    pub description: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub time_zone: String,
}

/// Builds the event window for one resolved appointment. The caller's number
/// goes into the description so the clinic can ring back.
pub fn build_event(
    intent: &AppointmentIntent,
    caller: &str,
    clinic_name: &str,
    duration_minutes: i64,
    time_zone: &str,
) -> CalendarEvent {
    CalendarEvent {
        summary: format!("Appointment: {}", intent.patient_name),
        description: format!("Booked by phone for {clinic_name}. Caller: {caller}"),
        start: intent.start_time,
        end: intent.start_time + Duration::minutes(duration_minutes),
        time_zone: time_zone.to_string(),
    }
}

#[async_trait]
pub trait CalendarProvider: Send + Sync {
    /// One insert per webhook, no dedup key: a retry would duplicate the
    /// event, so failures surface instead of being retried.
    async fn insert_event(&self, event: &CalendarEvent) -> anyhow::Result<()>;
}

pub struct GoogleCalendar {
    client_id: String,
    client_secret: String,
    refresh_token: String,
    calendar_id: String,
    client: reqwest::Client,
}

impl GoogleCalendar {
    pub fn new(
        client_id: String,
        client_secret: String,
        refresh_token: String,
        calendar_id: String,
    ) -> Self {
        Self {
            client_id,
            client_secret,
            refresh_token,
            calendar_id,
            client: reqwest::Client::new(),
        }
    }

    async fn access_token(&self) -> anyhow::Result<String> {
        #[derive(Deserialize)]
        struct TokenResponse {
            access_token: String,
        }

        let resp = self
            .client
            .post("https://oauth2.googleapis.com/token")
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("refresh_token", self.refresh_token.as_str()),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await
            .context("failed to call OAuth token endpoint")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("token refresh failed ({status}): {body}");
        }

        let token: TokenResponse = resp
            .json()
            .await
            .context("failed to parse token response")?;
        Ok(token.access_token)
    }
}

#[async_trait]
impl CalendarProvider for GoogleCalendar {
    async fn insert_event(&self, event: &CalendarEvent) -> anyhow::Result<()> {
        let token = self.access_token().await?;

        let url = format!(
            "https://www.googleapis.com/calendar/v3/calendars/{}/events",
            self.calendar_id
        );
        let body = json!({
            "summary": event.summary,
            "description": event.description,
            "start": {
                "dateTime": event.start.format("%Y-%m-%dT%H:%M:%S").to_string(),
                "timeZone": event.time_zone,
            },
            "end": {
                "dateTime": event.end.format("%Y-%m-%dT%H:%M:%S").to_string(),
                "timeZone": event.time_zone,
            },
        });

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&token)
            .json(&body)
            .send()
            .await
            .context("failed to call calendar API")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("calendar insert failed ({status}): {body}");
        }

        tracing::info!(summary = %event.summary, start = %event.start, "event inserted");
        Ok(())
    }
}
