//! Runtime configuration
//!
//! Everything comes from the environment (a `.env` file in development).
//! The secret key signs both JWTs and confirmation codes, so rotating it
//! invalidates every outstanding credential.

use rand::{distributions::Alphanumeric, Rng};
use std::env;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: String,
    pub secret_key: String,
    /// Access token lifetime, minutes.
    pub access_token_minutes: i64,
    /// Refresh token lifetime, days.
    pub refresh_token_days: i64,
    /// Confirmation code lifetime, hours.
    pub confirmation_code_hours: i64,
    pub email: EmailConfig,
}

/// SMTP settings for outgoing mail.
#[derive(Clone, Debug)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
    pub from_email: String,
    pub from_name: String,
    pub use_tls: bool,
    pub mock: bool,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        let secret_key = match env::var("SECRET_KEY") {
            Ok(key) if key.len() >= 32 => key,
            _ => {
                let random_string: String = rand::thread_rng()
                    .sample_iter(&Alphanumeric)
                    .take(64)
                    .map(char::from)
                    .collect();
                log::warn!(
                    "SECRET_KEY missing or shorter than 32 bytes. A random key was generated, \
                     which invalidates all tokens and confirmation codes on every restart. \
                     Need a key? How about:\r\n{}",
                    random_string
                );
                random_string
            }
        };

        Ok(Config {
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
            secret_key,
            access_token_minutes: parse_var("ACCESS_TOKEN_MINUTES", 60)?,
            refresh_token_days: parse_var("REFRESH_TOKEN_DAYS", 30)?,
            confirmation_code_hours: parse_var("CONFIRMATION_CODE_HOURS", 24)?,
            email: EmailConfig::from_env()?,
        })
    }
}

impl EmailConfig {
    /// Load email configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(EmailConfig {
            smtp_host: env::var("SMTP_HOST").unwrap_or_else(|_| "localhost".to_string()),
            smtp_port: env::var("SMTP_PORT")
                .unwrap_or_else(|_| "587".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("Invalid SMTP_PORT"))?,
            smtp_username: env::var("SMTP_USERNAME")
                .unwrap_or_else(|_| "noreply@localhost".to_string()),
            smtp_password: env::var("SMTP_PASSWORD").unwrap_or_else(|_| String::new()),
            from_email: env::var("SMTP_FROM_EMAIL")
                .unwrap_or_else(|_| "noreply@localhost".to_string()),
            from_name: env::var("SMTP_FROM_NAME").unwrap_or_else(|_| "Scorebook".to_string()),
            use_tls: env::var("SMTP_USE_TLS")
                .unwrap_or_else(|_| "true".to_string())
                .parse()
                .unwrap_or(true),
            mock: env::var("SMTP_MOCK")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .unwrap_or(false),
        })
    }
}

fn parse_var(name: &str, default: i64) -> anyhow::Result<i64> {
    match env::var(name) {
        Ok(v) => v
            .parse()
            .map_err(|_| anyhow::anyhow!("Invalid {}: {:?}", name, v)),
        Err(_) => Ok(default),
    }
}
