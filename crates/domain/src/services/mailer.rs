//! Notification sender abstraction.

use thiserror::Error;

/// A binary attachment (the invoice PDF).
#[derive(Debug, Clone)]
pub struct EmailAttachment {
    pub filename: String,
    pub content: Vec<u8>,
    pub mime_type: String,
}

/// A templated HTML email ready for delivery.
#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body_html: String,
    pub attachment: Option<EmailAttachment>,
}

/// Errors from the notification sender.
#[derive(Debug, Error)]
pub enum MailError {
    #[error("mailer not configured: {0}")]
    NotConfigured(String),

    #[error("invalid email address: {0}")]
    InvalidAddress(String),

    #[error("failed to send email: {0}")]
    SendFailed(String),
}

/// Delivers templated HTML email with an optional binary attachment.
#[async_trait::async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: EmailMessage) -> Result<(), MailError>;
}
