//! SMTP transport built on lettre's async Tokio executor.

use super::{EmailError, EmailResult};
use crate::config::EmailConfig;
use lettre::message::{header::ContentType, Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

pub async fn send_email(
    config: &EmailConfig,
    to: &str,
    subject: &str,
    body_text: &str,
    body_html: Option<&str>,
) -> EmailResult<()> {
    let from: Mailbox = format!("{} <{}>", config.from_name, config.from_email)
        .parse()
        .map_err(|e| EmailError::ConfigError(format!("Invalid from address: {}", e)))?;
    let to: Mailbox = to
        .parse()
        .map_err(|e| EmailError::ConfigError(format!("Invalid recipient address: {}", e)))?;

    let builder = Message::builder().from(from).to(to).subject(subject);

    let message = match body_html {
        Some(html) => builder.multipart(MultiPart::alternative_plain_html(
            body_text.to_owned(),
            html.to_owned(),
        ))?,
        None => builder
            .header(ContentType::TEXT_PLAIN)
            .body(body_text.to_owned())?,
    };

    let transport = if config.use_tls {
        AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
    } else {
        AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.smtp_host)
    };

    let mailer = transport
        .port(config.smtp_port)
        .credentials(Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.clone(),
        ))
        .build();

    mailer.send(message).await?;

    Ok(())
}
