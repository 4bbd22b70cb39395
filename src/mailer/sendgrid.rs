//! SendGrid v3 transport.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::debug;

use super::{MailError, Mailer, Recipient, Template, TemplateData};

const SENDGRID_ENDPOINT: &str = "https://api.sendgrid.com/v3/mail/send";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub struct SendGridMailer {
    client: Client,
    api_key: String,
    from_email: String,
    from_name: String,
}

impl SendGridMailer {
    pub fn new(api_key: &str, from_email: &str, from_name: &str) -> anyhow::Result<Self> {
        anyhow::ensure!(!api_key.is_empty(), "sendgrid api key is required");
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            api_key: api_key.to_string(),
            from_email: from_email.to_string(),
            from_name: from_name.to_string(),
        })
    }
}

#[derive(Serialize)]
struct Address<'a> {
    email: &'a str,
    name: &'a str,
}

#[derive(Serialize)]
struct Personalization<'a> {
    to: [Address<'a>; 1],
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    value: &'a str,
}

#[derive(Serialize)]
struct Toggle {
    enable: bool,
}

#[derive(Serialize)]
struct MailSettings {
    sandbox_mode: Toggle,
}

#[derive(Serialize)]
struct SendRequest<'a> {
    personalizations: [Personalization<'a>; 1],
    from: Address<'a>,
    subject: &'a str,
    content: [Content<'a>; 1],
    mail_settings: MailSettings,
}

#[async_trait]
impl Mailer for SendGridMailer {
    async fn send(
        &self,
        template: Template,
        to: &Recipient,
        data: &TemplateData,
        sandbox: bool,
    ) -> Result<u16, MailError> {
        let rendered = template.render(data);
        let body = SendRequest {
            personalizations: [Personalization {
                to: [Address {
                    email: &to.email,
                    name: &to.name,
                }],
            }],
            from: Address {
                email: &self.from_email,
                name: &self.from_name,
            },
            subject: &rendered.subject,
            content: [Content {
                kind: "text/html",
                value: &rendered.html,
            }],
            mail_settings: MailSettings {
                sandbox_mode: Toggle { enable: sandbox },
            },
        };

        let res = self
            .client
            .post(SENDGRID_ENDPOINT)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;

        let status = res.status();
        debug!(%status, template = template.name(), "sendgrid responded");
        if !status.is_success() {
            return Err(MailError::Rejected(status.as_u16()));
        }
        Ok(status.as_u16())
    }
}
