//! User management endpoints
//!
//! The collection is admin-only and looked up by username; `/users/me` is
//! the self-service pair for any authenticated user. Role changes only
//! happen through the admin surface.

use crate::middleware::ClientCtx;
use crate::orm::users::{self, Role};
use crate::pagination::{Page, PageParams};
use crate::web::error::{validation_error, validation_errors};
use actix_web::{delete, error, get, patch, post, route, web, Error, HttpResponse};
use chrono::Utc;
use sea_orm::{entity::*, query::*, ActiveValue::Set, DatabaseConnection, SqlErr};
use serde::{Deserialize, Serialize};
use validator::Validate;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    // The /me pair must register before the {username} lookups.
    conf.service(get_me)
        .service(update_me)
        .service(list_users)
        .service(create_user)
        .service(get_user)
        .service(update_user)
        .service(destroy_user);
}

#[derive(Serialize)]
struct UserResponse {
    username: String,
    email: String,
    role: Role,
    bio: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
}

impl From<users::Model> for UserResponse {
    fn from(user: users::Model) -> Self {
        UserResponse {
            username: user.username,
            email: user.email,
            role: user.role,
            bio: user.bio,
            first_name: user.first_name,
            last_name: user.last_name,
        }
    }
}

#[derive(Deserialize, Validate)]
struct CreateUserForm {
    #[validate(length(min = 1, max = 150))]
    username: String,
    #[validate(email)]
    email: String,
    role: Option<Role>,
    #[validate(length(max = 300))]
    bio: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
}

#[derive(Deserialize, Validate)]
struct UpdateUserForm {
    #[validate(length(min = 1, max = 150))]
    username: Option<String>,
    #[validate(email)]
    email: Option<String>,
    role: Option<Role>,
    #[validate(length(max = 300))]
    bio: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
}

/// Self-service update; role is deliberately absent.
#[derive(Deserialize, Validate)]
struct UpdateMeForm {
    #[validate(length(min = 1, max = 150))]
    username: Option<String>,
    #[validate(email)]
    email: Option<String>,
    #[validate(length(max = 300))]
    bio: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
}

fn map_unique_violation(e: sea_orm::DbErr) -> Error {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => validation_error(
            "email",
            "A user with this email or username already exists.",
        ),
        _ => error::ErrorInternalServerError(e),
    }
}

async fn find_user_by_username(
    db: &DatabaseConnection,
    username: &str,
) -> Result<users::Model, Error> {
    users::Entity::find()
        .filter(users::Column::Username.eq(username))
        .one(db)
        .await
        .map_err(error::ErrorInternalServerError)?
        .ok_or_else(|| error::ErrorNotFound("User not found"))
}

/// GET /v1/users/me
#[get("/v1/users/me")]
async fn get_me(client: ClientCtx) -> Result<HttpResponse, Error> {
    let user = client.require_login()?;
    Ok(HttpResponse::Ok().json(UserResponse::from(user.clone())))
}

/// PATCH /v1/users/me
#[patch("/v1/users/me")]
async fn update_me(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    form: web::Json<UpdateMeForm>,
) -> Result<HttpResponse, Error> {
    let user = client.require_login()?;
    form.validate().map_err(|e| validation_errors(&e))?;

    let mut active: users::ActiveModel = user.clone().into();
    if let Some(username) = &form.username {
        active.username = Set(username.clone());
    }
    if let Some(email) = &form.email {
        active.email = Set(email.trim().to_lowercase());
    }
    if let Some(bio) = &form.bio {
        active.bio = Set(Some(bio.clone()));
    }
    if let Some(first_name) = &form.first_name {
        active.first_name = Set(Some(first_name.clone()));
    }
    if let Some(last_name) = &form.last_name {
        active.last_name = Set(Some(last_name.clone()));
    }

    let updated = active.update(db.get_ref()).await.map_err(map_unique_violation)?;
    Ok(HttpResponse::Ok().json(UserResponse::from(updated)))
}

/// GET /v1/users
#[get("/v1/users")]
async fn list_users(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    query: web::Query<PageParams>,
) -> Result<HttpResponse, Error> {
    client.require_admin()?;
    let params = query.into_inner();

    let paginator = users::Entity::find()
        .order_by_asc(users::Column::Role)
        .order_by_asc(users::Column::Id)
        .paginate(db.get_ref(), params.page_size());

    let count = paginator
        .num_items()
        .await
        .map_err(error::ErrorInternalServerError)?;
    let results: Vec<UserResponse> = paginator
        .fetch_page(params.page() - 1)
        .await
        .map_err(error::ErrorInternalServerError)?
        .into_iter()
        .map(Into::into)
        .collect();

    Ok(HttpResponse::Ok().json(Page::new(count, &params, results)))
}

/// POST /v1/users
#[post("/v1/users")]
async fn create_user(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    form: web::Json<CreateUserForm>,
) -> Result<HttpResponse, Error> {
    client.require_admin()?;
    form.validate().map_err(|e| validation_errors(&e))?;

    let user = users::ActiveModel {
        username: Set(form.username.clone()),
        email: Set(form.email.trim().to_lowercase()),
        role: Set(form.role.unwrap_or_default()),
        bio: Set(form.bio.clone()),
        first_name: Set(form.first_name.clone()),
        last_name: Set(form.last_name.clone()),
        is_superuser: Set(false),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    };

    let created = user.insert(db.get_ref()).await.map_err(map_unique_violation)?;
    Ok(HttpResponse::Created().json(UserResponse::from(created)))
}

/// GET /v1/users/{username}
#[get("/v1/users/{username}")]
async fn get_user(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<String>,
) -> Result<HttpResponse, Error> {
    client.require_admin()?;
    let user = find_user_by_username(db.get_ref(), &path).await?;
    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}

/// PATCH/PUT /v1/users/{username}
#[route("/v1/users/{username}", method = "PATCH", method = "PUT")]
async fn update_user(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<String>,
    form: web::Json<UpdateUserForm>,
) -> Result<HttpResponse, Error> {
    client.require_admin()?;
    form.validate().map_err(|e| validation_errors(&e))?;

    let user = find_user_by_username(db.get_ref(), &path).await?;

    let mut active: users::ActiveModel = user.into();
    if let Some(username) = &form.username {
        active.username = Set(username.clone());
    }
    if let Some(email) = &form.email {
        active.email = Set(email.trim().to_lowercase());
    }
    if let Some(role) = form.role {
        active.role = Set(role);
    }
    if let Some(bio) = &form.bio {
        active.bio = Set(Some(bio.clone()));
    }
    if let Some(first_name) = &form.first_name {
        active.first_name = Set(Some(first_name.clone()));
    }
    if let Some(last_name) = &form.last_name {
        active.last_name = Set(Some(last_name.clone()));
    }

    let updated = active.update(db.get_ref()).await.map_err(map_unique_violation)?;
    Ok(HttpResponse::Ok().json(UserResponse::from(updated)))
}

/// DELETE /v1/users/{username}
#[delete("/v1/users/{username}")]
async fn destroy_user(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<String>,
) -> Result<HttpResponse, Error> {
    client.require_admin()?;
    let user = find_user_by_username(db.get_ref(), &path).await?;
    user.delete(db.get_ref())
        .await
        .map_err(error::ErrorInternalServerError)?;
    Ok(HttpResponse::NoContent().finish())
}
