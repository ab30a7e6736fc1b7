use crate::domain::model::EmailMessage;
use crate::domain::ports::Mailer;
use crate::utils::error::{BookingError, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use tokio::sync::Mutex;

const RESEND_API_BASE: &str = "https://api.resend.com";

/// Thin client for the Resend transactional email API.
pub struct ResendMailer {
    client: Client,
    api_key: String,
    from: String,
    base_url: String,
}

impl ResendMailer {
    pub fn new(api_key: impl Into<String>, from: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            from: from.into(),
            base_url: RESEND_API_BASE.to_string(),
        }
    }

    /// Point the client at a different endpoint (tests use a local mock server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        let attachments: Vec<serde_json::Value> = message
            .attachments
            .iter()
            .map(|a| {
                serde_json::json!({
                    "filename": a.filename,
                    "content": a.content,
                    "content_type": a.content_type,
                })
            })
            .collect();

        let payload = serde_json::json!({
            "from": self.from,
            "to": [message.to],
            "subject": message.subject,
            "html": message.html,
            "attachments": attachments,
        });

        tracing::debug!("Sending email to {} via {}", message.to, self.base_url);
        let response = self
            .client
            .post(format!("{}/emails", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            tracing::debug!("Email API accepted message for {}", message.to);
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(BookingError::DeliveryError {
                message: format!("Email API returned {}: {}", status, body),
            })
        }
    }
}

/// Mailer used when no API key is configured. Sends nothing, records the
/// message and reports success so the rest of the flow can be exercised.
#[derive(Clone, Default)]
pub struct DemoMailer {
    sent: Arc<Mutex<Vec<EmailMessage>>>,
}

impl DemoMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn sent_messages(&self) -> Vec<EmailMessage> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl Mailer for DemoMailer {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        tracing::info!(
            "📧 [demo mode] Email would be sent: to={} subject={:?} attachments={}",
            message.to,
            message.subject,
            message.attachments.len()
        );

        // Simulated network delay, as in the real transport
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        self.sent.lock().await.push(message.clone());
        Ok(())
    }
}
