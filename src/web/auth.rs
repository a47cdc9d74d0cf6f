//! Passwordless authentication endpoints
//!
//! A confirmation code is mailed on request and then exchanged, together
//! with the email address, for a JWT access/refresh pair. No passwords are
//! stored anywhere.

use crate::config::Config;
use crate::orm::users;
use crate::token::{self, TokenType};
use crate::web::error::{validation_error, validation_errors};
use crate::{confirmation, email};
use actix_web::{error, post, web, Error, HttpResponse};
use sea_orm::{entity::*, query::*, DatabaseConnection};
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(request_confirmation_code)
        .service(obtain_token_pair)
        .service(refresh_access_token);
}

#[derive(Deserialize, Validate)]
struct EmailForm {
    #[validate(email)]
    email: String,
}

#[derive(Deserialize)]
struct TokenForm {
    email: String,
    confirmation_code: String,
}

#[derive(Deserialize)]
struct RefreshForm {
    refresh: String,
}

async fn find_user_by_email(
    db: &DatabaseConnection,
    email: &str,
) -> Result<users::Model, Error> {
    users::Entity::find()
        .filter(users::Column::Email.eq(email.trim().to_lowercase()))
        .one(db)
        .await
        .map_err(error::ErrorInternalServerError)?
        .ok_or_else(|| error::ErrorNotFound("No user with this email"))
}

/// POST /v1/auth/email - Send a confirmation code to a registered address
#[post("/v1/auth/email")]
async fn request_confirmation_code(
    config: web::Data<Config>,
    db: web::Data<DatabaseConnection>,
    form: web::Json<EmailForm>,
) -> Result<HttpResponse, Error> {
    form.validate().map_err(|e| validation_errors(&e))?;

    let user = find_user_by_email(db.get_ref(), &form.email).await?;
    let code = confirmation::generate(&config, &user);

    email::templates::send_confirmation_code_email(&config.email, &user.email, &user.username, &code)
        .await
        .map_err(|e| {
            log::error!("Failed to send confirmation code to {}: {}", user.email, e);
            error::ErrorInternalServerError("Failed to send confirmation email")
        })?;

    log::info!("Confirmation code sent for user: {}", user.username);

    Ok(HttpResponse::Ok().json(json!({ "detail": "Confirmation code sent" })))
}

/// POST /v1/auth/token - Exchange email + confirmation code for a token pair
#[post("/v1/auth/token")]
async fn obtain_token_pair(
    config: web::Data<Config>,
    db: web::Data<DatabaseConnection>,
    form: web::Json<TokenForm>,
) -> Result<HttpResponse, Error> {
    let user = find_user_by_email(db.get_ref(), &form.email).await?;

    if !confirmation::check(&config, &user, &form.confirmation_code) {
        return Err(validation_error(
            "confirmation_code",
            "Invalid or expired confirmation code.",
        ));
    }

    let pair = token::issue_pair(&config, user.id).map_err(error::ErrorInternalServerError)?;

    Ok(HttpResponse::Ok().json(pair))
}

/// POST /v1/auth/token/refresh - Exchange a refresh token for a new access token
#[post("/v1/auth/token/refresh")]
async fn refresh_access_token(
    config: web::Data<Config>,
    form: web::Json<RefreshForm>,
) -> Result<HttpResponse, Error> {
    let claims = token::verify(&config, &form.refresh, TokenType::Refresh)
        .map_err(|_| error::ErrorUnauthorized("Invalid or expired refresh token"))?;

    let access = token::issue_access(&config, claims.sub).map_err(error::ErrorInternalServerError)?;

    Ok(HttpResponse::Ok().json(json!({ "access": access })))
}
