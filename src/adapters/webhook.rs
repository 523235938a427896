use crate::domain::ports::{ReportSink, WebhookPayload};
use crate::utils::error::{Result, ValidatorError};
use async_trait::async_trait;
use reqwest::Client;

/// Discord 相容的 webhook
pub struct DiscordWebhook {
    client: Client,
    url: String,
}

impl DiscordWebhook {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl ReportSink for DiscordWebhook {
    async fn publish(&self, payload: &WebhookPayload) -> Result<()> {
        tracing::debug!(
            "Posting {} embeds to webhook thread '{}'",
            payload.embeds.len(),
            payload.thread_name
        );
        let response = self.client.post(&self.url).json(payload).send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ValidatorError::WebhookStatusError {
                status: status.as_u16(),
                message,
            });
        }

        tracing::info!("Webhook accepted report (HTTP {})", status.as_u16());
        Ok(())
    }
}
