/// Email sending functionality
///
/// This module provides email sending capabilities using lettre with SMTP.
/// Supports both real SMTP sending and mock mode for development/testing.
pub mod smtp;
pub mod templates;

use crate::config::EmailConfig;

/// Email sending result
pub type EmailResult<T> = Result<T, EmailError>;

/// Email errors
#[derive(Debug)]
pub enum EmailError {
    /// SMTP configuration error
    ConfigError(String),
    /// Email building error
    BuildError(lettre::error::Error),
    /// Email sending error
    SendError(lettre::transport::smtp::Error),
}

impl std::fmt::Display for EmailError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmailError::ConfigError(msg) => write!(f, "Email config error: {}", msg),
            EmailError::BuildError(e) => write!(f, "Email build error: {}", e),
            EmailError::SendError(e) => write!(f, "Email send error: {}", e),
        }
    }
}

impl std::error::Error for EmailError {}

impl From<lettre::error::Error> for EmailError {
    fn from(e: lettre::error::Error) -> Self {
        EmailError::BuildError(e)
    }
}

impl From<lettre::transport::smtp::Error> for EmailError {
    fn from(e: lettre::transport::smtp::Error) -> Self {
        EmailError::SendError(e)
    }
}

/// Send an email
pub async fn send_email(
    config: &EmailConfig,
    to: &str,
    subject: &str,
    body_text: &str,
    body_html: Option<&str>,
) -> EmailResult<()> {
    if config.mock {
        // Mock mode: just log the email
        log::info!("MOCK EMAIL:");
        log::info!("  To: {}", to);
        log::info!("  Subject: {}", subject);
        log::info!("  Body: {}", body_text);
        return Ok(());
    }

    smtp::send_email(config, to, subject, body_text, body_html).await
}
