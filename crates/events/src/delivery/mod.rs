//! External email delivery.
//!
//! The drip scheduler only sees the [`Mailer`] trait. Two backends are
//! provided: [`email::SmtpMailer`] (SMTP via `lettre`) and
//! [`http_api::HttpApiMailer`] (a JSON email API such as Resend).

pub mod email;
pub mod http_api;

use std::sync::Arc;

use async_trait::async_trait;

// ---------------------------------------------------------------------------
// Message types
// ---------------------------------------------------------------------------

/// A rendered email ready to hand to a mailer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Proof of a successful hand-off to the mail provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendReceipt {
    pub message_id: Option<String>,
}

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for email delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    /// SMTP transport-level failure (authentication, connection, etc.).
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    /// The recipient or sender address could not be parsed.
    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// The MIME message could not be assembled.
    #[error("Email build error: {0}")]
    Build(String),

    /// The HTTP request to the mail API failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The mail API answered with a non-2xx status.
    #[error("Mail API returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },
}

// ---------------------------------------------------------------------------
// Mailer
// ---------------------------------------------------------------------------

/// Capability to send a single email.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &OutboundEmail) -> Result<SendReceipt, EmailError>;
}

/// Build the configured mailer, if any.
///
/// The HTTP API backend wins when `MAIL_API_KEY` is set; otherwise SMTP is
/// used when `SMTP_HOST` is set. Returns `Ok(None)` when neither is
/// configured.
pub fn mailer_from_env() -> Result<Option<Arc<dyn Mailer>>, EmailError> {
    if let Some(config) = http_api::HttpMailerConfig::from_env() {
        tracing::info!(api_url = %config.api_url, "Using HTTP API mailer");
        return Ok(Some(Arc::new(http_api::HttpApiMailer::new(config)?)));
    }
    if let Some(config) = email::EmailConfig::from_env() {
        tracing::info!(smtp_host = %config.smtp_host, "Using SMTP mailer");
        return Ok(Some(Arc::new(email::SmtpMailer::new(config)?)));
    }
    Ok(None)
}
