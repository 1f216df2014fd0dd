//! Email service for registration confirmations and reminders.
//!
//! Supports multiple providers:
//! - `console`: Logs emails instead of sending (development)
//! - `smtp`: Sends via SMTP server
//! - `sendgrid`: Uses SendGrid API

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::{DateTime, Utc};
use lettre::message::{header::ContentType, Attachment, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use std::sync::Arc;
use tracing::{debug, error, info};

use domain::services::{EmailAttachment, EmailMessage, MailError, Mailer};

use crate::config::EmailConfig;

/// Email service implementing the notification sender seam.
#[derive(Clone)]
pub struct EmailService {
    config: Arc<EmailConfig>,
}

impl EmailService {
    /// Creates a new EmailService with the given configuration.
    pub fn new(config: EmailConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Check if email sending is enabled.
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Console provider - logs the email instead of sending it.
    async fn send_console(&self, message: &EmailMessage) -> Result<(), MailError> {
        info!(
            to = %message.to,
            subject = %message.subject,
            from = %self.config.sender_email,
            attachment = ?message.attachment.as_ref().map(|a| &a.filename),
            "Email (console provider)"
        );
        debug!(body_html_length = message.body_html.len(), "Email body (HTML)");
        Ok(())
    }

    /// SMTP provider - sends via the configured SMTP relay.
    async fn send_smtp(&self, message: EmailMessage) -> Result<(), MailError> {
        if self.config.smtp_host.is_empty() {
            return Err(MailError::NotConfigured("smtp_host is empty".to_string()));
        }

        let from = format!("{} <{}>", self.config.sender_name, self.config.sender_email);
        let builder = Message::builder()
            .from(
                from.parse()
                    .map_err(|e| MailError::InvalidAddress(format!("from: {e}")))?,
            )
            .to(message
                .to
                .parse()
                .map_err(|e| MailError::InvalidAddress(format!("to: {e}")))?)
            .subject(&message.subject);

        let html_part = SinglePart::builder()
            .header(ContentType::TEXT_HTML)
            .body(message.body_html);

        let email = match message.attachment {
            Some(attachment) => {
                let content_type = ContentType::parse(&attachment.mime_type)
                    .map_err(|e| MailError::SendFailed(format!("bad attachment type: {e}")))?;
                let attachment_part =
                    Attachment::new(attachment.filename).body(attachment.content, content_type);
                builder
                    .multipart(
                        MultiPart::mixed()
                            .singlepart(html_part)
                            .singlepart(attachment_part),
                    )
                    .map_err(|e| MailError::SendFailed(format!("failed to build email: {e}")))?
            }
            None => builder
                .singlepart(html_part)
                .map_err(|e| MailError::SendFailed(format!("failed to build email: {e}")))?,
        };

        let credentials = Credentials::new(
            self.config.smtp_username.clone(),
            self.config.smtp_password.clone(),
        );
        let transport = SmtpTransport::relay(&self.config.smtp_host)
            .map_err(|e| MailError::NotConfigured(format!("SMTP relay error: {e}")))?
            .port(self.config.smtp_port)
            .credentials(credentials)
            .build();

        let to = message.to.clone();
        tokio::task::spawn_blocking(move || {
            transport
                .send(&email)
                .map_err(|e| MailError::SendFailed(e.to_string()))
        })
        .await
        .map_err(|e| MailError::SendFailed(format!("email task failed: {e}")))??;

        info!(to = %to, "Email sent via SMTP");
        Ok(())
    }

    /// SendGrid provider - sends via the SendGrid JSON API.
    async fn send_sendgrid(&self, message: EmailMessage) -> Result<(), MailError> {
        if self.config.sendgrid_api_key.is_empty() {
            return Err(MailError::NotConfigured(
                "sendgrid_api_key is empty".to_string(),
            ));
        }

        let to = message.to.clone();
        let mut body = serde_json::json!({
            "personalizations": [{
                "to": [{ "email": message.to }]
            }],
            "from": {
                "email": self.config.sender_email,
                "name": self.config.sender_name
            },
            "subject": message.subject,
            "content": [{
                "type": "text/html",
                "value": message.body_html
            }]
        });

        if let Some(attachment) = &message.attachment {
            body["attachments"] = serde_json::json!([{
                "content": BASE64.encode(&attachment.content),
                "filename": attachment.filename,
                "type": attachment.mime_type,
                "disposition": "attachment"
            }]);
        }

        let client = reqwest::Client::new();
        let response = client
            .post("https://api.sendgrid.com/v3/mail/send")
            .bearer_auth(&self.config.sendgrid_api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| MailError::SendFailed(format!("SendGrid request failed: {e}")))?;

        if response.status().is_success() {
            info!(to = %to, "Email sent via SendGrid");
            Ok(())
        } else {
            let status = response.status();
            let error_body = response.text().await.unwrap_or_default();
            error!(%status, error = %error_body, "SendGrid API error");
            Err(MailError::SendFailed(format!(
                "SendGrid returned {status}: {error_body}"
            )))
        }
    }
}

#[async_trait::async_trait]
impl Mailer for EmailService {
    async fn send(&self, message: EmailMessage) -> Result<(), MailError> {
        if !self.config.enabled {
            debug!(
                to = %message.to,
                subject = %message.subject,
                "Email service disabled, skipping send"
            );
            return Ok(());
        }

        match self.config.provider.as_str() {
            "console" => self.send_console(&message).await,
            "smtp" => self.send_smtp(message).await,
            "sendgrid" => self.send_sendgrid(message).await,
            provider => {
                error!(provider = %provider, "Unknown email provider");
                Err(MailError::NotConfigured(format!(
                    "unknown provider: {provider}"
                )))
            }
        }
    }
}

/// Formats a webinar start date for email bodies.
fn format_webinar_date(date: DateTime<Utc>) -> String {
    date.format("%A, %B %-d, %Y at %H:%M UTC").to_string()
}

/// Builds the registration confirmation email. The invoice attachment, when
/// present, is set by the caller.
pub fn confirmation_email(
    company_name: &str,
    to: &str,
    user_name: &str,
    webinar_title: &str,
    webinar_date: DateTime<Utc>,
    meet_link: &str,
    attachment: Option<EmailAttachment>,
) -> EmailMessage {
    let formatted_date = format_webinar_date(webinar_date);
    let invoice_note = if attachment.is_some() {
        "<p>You will find your invoice attached to this email.</p>"
    } else {
        ""
    };

    let body_html = format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <style>
    body {{ font-family: Arial, sans-serif; line-height: 1.6; color: #333; }}
    .container {{ max-width: 600px; margin: 0 auto; padding: 20px; }}
    .header {{ background: #4CAF50; color: white; padding: 20px; text-align: center; }}
    .content {{ padding: 20px; background: #f9f9f9; }}
    .button {{ display: inline-block; padding: 12px 24px; background: #4CAF50; color: white; text-decoration: none; border-radius: 5px; margin: 20px 0; }}
    .info-box {{ background: white; padding: 15px; border-left: 4px solid #4CAF50; margin: 20px 0; }}
  </style>
</head>
<body>
  <div class="container">
    <div class="header">
      <h1>Registration confirmed</h1>
    </div>
    <div class="content">
      <p>Hello {user_name},</p>
      <p>Your registration for the webinar <strong>"{webinar_title}"</strong> has been confirmed.</p>
      <div class="info-box">
        <h3>Webinar details</h3>
        <p><strong>Date:</strong> {formatted_date}</p>
        <p><strong>Title:</strong> {webinar_title}</p>
      </div>
      <div style="text-align: center;">
        <a href="{meet_link}" class="button">Join the webinar</a>
      </div>
      <p><strong>Meeting link:</strong><br>
      <a href="{meet_link}">{meet_link}</a></p>
      <p>You will receive a reminder email 24 hours before the webinar starts.</p>
      {invoice_note}
      <p>See you soon,<br>
      The {company_name} team</p>
    </div>
  </div>
</body>
</html>"#
    );

    EmailMessage {
        to: to.to_string(),
        subject: format!("Registration confirmed - {webinar_title}"),
        body_html,
        attachment,
    }
}

/// Builds the day-before reminder email.
pub fn reminder_email(
    company_name: &str,
    to: &str,
    user_name: &str,
    webinar_title: &str,
    webinar_date: DateTime<Utc>,
    meet_link: &str,
) -> EmailMessage {
    let formatted_date = format_webinar_date(webinar_date);

    let body_html = format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <style>
    body {{ font-family: Arial, sans-serif; line-height: 1.6; color: #333; }}
    .container {{ max-width: 600px; margin: 0 auto; padding: 20px; }}
    .header {{ background: #FF9800; color: white; padding: 20px; text-align: center; }}
    .content {{ padding: 20px; background: #f9f9f9; }}
    .button {{ display: inline-block; padding: 12px 24px; background: #FF9800; color: white; text-decoration: none; border-radius: 5px; margin: 20px 0; }}
    .alert-box {{ background: #FFF3CD; padding: 15px; border-left: 4px solid #FF9800; margin: 20px 0; }}
  </style>
</head>
<body>
  <div class="container">
    <div class="header">
      <h1>Reminder: your webinar starts tomorrow</h1>
    </div>
    <div class="content">
      <p>Hello {user_name},</p>
      <div class="alert-box">
        <p><strong>The webinar "{webinar_title}" starts tomorrow!</strong></p>
        <p><strong>Date:</strong> {formatted_date}</p>
      </div>
      <p>Remember to connect a few minutes early to test your connection.</p>
      <div style="text-align: center;">
        <a href="{meet_link}" class="button">Join the webinar</a>
      </div>
      <p><strong>Meeting link:</strong><br>
      <a href="{meet_link}">{meet_link}</a></p>
      <p>See you tomorrow,<br>
      The {company_name} team</p>
    </div>
  </div>
</body>
</html>"#
    );

    EmailMessage {
        to: to.to_string(),
        subject: format!("Reminder: {webinar_title} - Tomorrow!"),
        body_html,
        attachment: None,
    }
}
