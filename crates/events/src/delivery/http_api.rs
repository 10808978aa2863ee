//! Email delivery through a JSON HTTP API (Resend-compatible).
//!
//! The request body is `{from, to, subject, html}` with a bearer API key;
//! the provider's `id` field is returned as the message id.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::email::DEFAULT_FROM_ADDRESS;
use super::{EmailError, Mailer, OutboundEmail, SendReceipt};

/// Default provider endpoint.
const DEFAULT_API_URL: &str = "https://api.resend.com/emails";

/// HTTP request timeout for a single send.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Longest provider error body kept in [`EmailError::HttpStatus`].
const MAX_ERROR_BODY_LEN: usize = 512;

// ---------------------------------------------------------------------------
// HttpMailerConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct HttpMailerConfig {
    pub api_url: String,
    pub api_key: String,
    pub from_address: String,
}

impl HttpMailerConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable       | Required | Default                         |
    /// |----------------|----------|---------------------------------|
    /// | `MAIL_API_KEY` | yes      | --                              |
    /// | `MAIL_API_URL` | no       | `https://api.resend.com/emails` |
    /// | `MAIL_FROM`    | no       | value of `SMTP_FROM`, then the built-in sender |
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("MAIL_API_KEY").ok().filter(|k| !k.is_empty())?;
        Some(Self {
            api_url: std::env::var("MAIL_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            api_key,
            from_address: std::env::var("MAIL_FROM")
                .or_else(|_| std::env::var("SMTP_FROM"))
                .unwrap_or_else(|_| DEFAULT_FROM_ADDRESS.to_string()),
        })
    }
}

// ---------------------------------------------------------------------------
// HttpApiMailer
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct ApiSendRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
}

#[derive(Deserialize)]
struct ApiSendResponse {
    #[serde(default)]
    id: Option<String>,
}

pub struct HttpApiMailer {
    client: reqwest::Client,
    config: HttpMailerConfig,
}

impl HttpApiMailer {
    pub fn new(config: HttpMailerConfig) -> Result<Self, EmailError> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl Mailer for HttpApiMailer {
    async fn send(&self, email: &OutboundEmail) -> Result<SendReceipt, EmailError> {
        let request = ApiSendRequest {
            from: self.config.from_address.as_str(),
            to: [email.to.as_str()],
            subject: &email.subject,
            html: &email.html,
        };

        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            truncate_chars(&mut body, MAX_ERROR_BODY_LEN);
            return Err(EmailError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ApiSendResponse = response.json().await?;
        tracing::info!(to = %email.to, message_id = ?parsed.id, "Email sent via HTTP API");

        Ok(SendReceipt {
            message_id: parsed.id,
        })
    }
}

fn truncate_chars(s: &mut String, max: usize) {
    if let Some((idx, _)) = s.char_indices().nth(max) {
        s.truncate(idx);
    }
}
