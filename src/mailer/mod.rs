//! Notification gateway: outbound email behind the [`Mailer`] trait.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use tracing::{info, warn};

pub mod sendgrid;
pub mod templates;

pub use templates::{Template, TemplateData};

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("email provider rejected the message with status {0}")]
    Rejected(u16),
    #[error("email transport failed: {0}")]
    Transport(String),
    #[error("failed to send email after {0} attempts")]
    RetriesExhausted(u32),
}

#[derive(Debug, Clone)]
pub struct Recipient {
    pub name: String,
    pub email: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    /// Render `template` with `data` and deliver it. Returns the provider status.
    async fn send(
        &self,
        template: Template,
        to: &Recipient,
        data: &TemplateData,
        sandbox: bool,
    ) -> Result<u16, MailError>;
}

/// Retries an inner mailer with linearly growing pauses (`attempt * base_delay`).
pub struct RetryingMailer {
    inner: Arc<dyn Mailer>,
    max_retries: u32,
    base_delay: Duration,
}

impl RetryingMailer {
    pub fn new(inner: Arc<dyn Mailer>, max_retries: u32, base_delay: Duration) -> Self {
        Self {
            inner,
            max_retries: max_retries.max(1),
            base_delay,
        }
    }
}

#[async_trait]
impl Mailer for RetryingMailer {
    async fn send(
        &self,
        template: Template,
        to: &Recipient,
        data: &TemplateData,
        sandbox: bool,
    ) -> Result<u16, MailError> {
        for attempt in 1..=self.max_retries {
            match self.inner.send(template, to, data, sandbox).await {
                Ok(status) => {
                    info!(status, attempt, template = template.name(), "email sent");
                    return Ok(status);
                }
                Err(e) => {
                    warn!(
                        error = %e,
                        attempt,
                        max = self.max_retries,
                        recipient = %to.email,
                        "email send failed"
                    );
                    if attempt < self.max_retries {
                        tokio::time::sleep(self.base_delay * attempt).await;
                    }
                }
            }
        }
        Err(MailError::RetriesExhausted(self.max_retries))
    }
}

/// Development mailer used when no provider key is configured.
/// Logs the recipient and template only; the rendered body carries secrets.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(
        &self,
        template: Template,
        to: &Recipient,
        _data: &TemplateData,
        sandbox: bool,
    ) -> Result<u16, MailError> {
        info!(template = template.name(), recipient = %to.email, sandbox, "email not sent (no provider configured)");
        Ok(200)
    }
}
