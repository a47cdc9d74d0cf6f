//! Per-request client context
//!
//! Resolves the `Authorization: Bearer` header into the requesting user.
//! No header means a guest; a header that does not decode to a live user is
//! rejected outright rather than downgraded to a guest.

use crate::config::Config;
use crate::orm::users::{self, Role};
use crate::token::{self, TokenType};
use actix_web::http::header;
use actix_web::{error, web::Data, Error, FromRequest, HttpRequest};
use futures::future::LocalBoxFuture;
use sea_orm::{DatabaseConnection, EntityTrait};

/// Client context passed to routes.
#[derive(Clone, Debug, Default)]
pub struct ClientCtx {
    /// User data. None is a guest.
    client: Option<users::Model>,
}

impl ClientCtx {
    pub fn guest() -> Self {
        Self::default()
    }

    pub fn for_user(user: users::Model) -> Self {
        Self { client: Some(user) }
    }

    pub fn get_user(&self) -> Option<&users::Model> {
        self.client.as_ref()
    }

    /// Returns either the user's id or None.
    pub fn get_id(&self) -> Option<i32> {
        self.client.as_ref().map(|u| u.id)
    }

    pub fn is_user(&self) -> bool {
        self.client.is_some()
    }

    /// Admins are users with the admin role or the superuser flag.
    pub fn is_admin(&self) -> bool {
        self.client
            .as_ref()
            .map(|u| u.role == Role::Admin || u.is_superuser)
            .unwrap_or(false)
    }

    /// Rank comparison, so an admin passes every moderator check.
    pub fn has_role(&self, role: Role) -> bool {
        if self.is_admin() {
            return true;
        }
        self.client
            .as_ref()
            .map(|u| u.role.rank() >= role.rank())
            .unwrap_or(false)
    }

    /// Require an authenticated user. Returns the user or ErrorUnauthorized.
    pub fn require_login(&self) -> Result<&users::Model, Error> {
        self.client
            .as_ref()
            .ok_or_else(|| error::ErrorUnauthorized("Authentication required"))
    }

    /// Require an admin. Returns the user, ErrorUnauthorized for guests, or
    /// ErrorForbidden for everyone else.
    pub fn require_admin(&self) -> Result<&users::Model, Error> {
        let user = self.require_login()?;
        if !self.is_admin() {
            return Err(error::ErrorForbidden("Admin access required"));
        }
        Ok(user)
    }
}

/// This implementation is what actually provides the `client: ClientCtx` in
/// the parameters of route functions.
impl FromRequest for ClientCtx {
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        let req = req.clone();

        Box::pin(async move {
            let Some(value) = req.headers().get(header::AUTHORIZATION) else {
                return Ok(ClientCtx::guest());
            };

            let bearer = value
                .to_str()
                .ok()
                .and_then(|v| v.strip_prefix("Bearer "))
                .ok_or_else(|| error::ErrorUnauthorized("Invalid Authorization header"))?;

            let config = req
                .app_data::<Data<Config>>()
                .ok_or_else(|| error::ErrorServiceUnavailable("Configuration is not loaded."))?;
            let db = req
                .app_data::<Data<DatabaseConnection>>()
                .ok_or_else(|| error::ErrorServiceUnavailable("Database is not loaded."))?;

            let claims = token::verify(config, bearer, TokenType::Access)
                .map_err(|_| error::ErrorUnauthorized("Invalid or expired token"))?;

            let user = users::Entity::find_by_id(claims.sub)
                .one(db.get_ref())
                .await
                .map_err(error::ErrorInternalServerError)?
                .ok_or_else(|| error::ErrorUnauthorized("Unknown user"))?;

            Ok(ClientCtx::for_user(user))
        })
    }
}
