//! JWT bearer tokens
//!
//! A confirmation code is exchanged for an access/refresh pair; the access
//! token authenticates every other request. HS256 with the shared secret.

use crate::config::Config;
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: i32,
    pub iat: i64,
    pub exp: i64,
    pub token_type: TokenType,
}

#[derive(Clone, Debug, Serialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

pub fn issue_access(config: &Config, user_id: i32) -> Result<String, jsonwebtoken::errors::Error> {
    issue(
        config,
        user_id,
        TokenType::Access,
        Duration::minutes(config.access_token_minutes),
    )
}

pub fn issue_refresh(config: &Config, user_id: i32) -> Result<String, jsonwebtoken::errors::Error> {
    issue(
        config,
        user_id,
        TokenType::Refresh,
        Duration::days(config.refresh_token_days),
    )
}

pub fn issue_pair(config: &Config, user_id: i32) -> Result<TokenPair, jsonwebtoken::errors::Error> {
    Ok(TokenPair {
        access: issue_access(config, user_id)?,
        refresh: issue_refresh(config, user_id)?,
    })
}

fn issue(
    config: &Config,
    user_id: i32,
    token_type: TokenType,
    lifetime: Duration,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id,
        iat: now.timestamp(),
        exp: (now + lifetime).timestamp(),
        token_type,
    };
    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.secret_key.as_bytes()),
    )
}

/// Decode and validate a token, requiring the expected type. A refresh token
/// never passes where an access token is expected, and vice versa.
pub fn verify(
    config: &Config,
    token: &str,
    expected: TokenType,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    let validation = Validation::new(Algorithm::HS256);
    let data = jsonwebtoken::decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret_key.as_bytes()),
        &validation,
    )?;
    if data.claims.token_type != expected {
        return Err(jsonwebtoken::errors::ErrorKind::InvalidToken.into());
    }
    Ok(data.claims)
}
