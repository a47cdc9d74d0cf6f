//! Genre endpoints: list, create, destroy
//!
//! Mirror of the category surface; genres attach to titles through the
//! join table, so deleting a genre only drops the links.

use crate::middleware::ClientCtx;
use crate::orm::genres;
use crate::pagination::{Page, PageParams};
use crate::web::error::{validation_error, validation_errors};
use actix_web::{delete, error, get, post, web, Error, HttpResponse};
use sea_orm::sea_query::{extension::postgres::PgExpr, Expr};
use sea_orm::{entity::*, query::*, ActiveValue::Set, DatabaseConnection, SqlErr};
use serde::{Deserialize, Serialize};
use validator::Validate;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(list_genres)
        .service(create_genre)
        .service(destroy_genre);
}

#[derive(Deserialize)]
struct ListQuery {
    search: Option<String>,
    page: Option<u64>,
    page_size: Option<u64>,
}

impl ListQuery {
    fn page_params(&self) -> PageParams {
        PageParams {
            page: self.page,
            page_size: self.page_size,
        }
    }
}

#[derive(Serialize)]
struct GenreResponse {
    name: String,
    slug: String,
}

impl From<genres::Model> for GenreResponse {
    fn from(genre: genres::Model) -> Self {
        GenreResponse {
            name: genre.name,
            slug: genre.slug,
        }
    }
}

#[derive(Deserialize, Validate)]
struct GenreForm {
    #[validate(length(min = 1, max = 200))]
    name: String,
    #[validate(length(min = 1, max = 100), custom = "crate::web::validate_slug")]
    slug: String,
}

/// GET /v1/genres
#[get("/v1/genres")]
async fn list_genres(
    db: web::Data<DatabaseConnection>,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse, Error> {
    let mut select = genres::Entity::find().order_by_desc(genres::Column::Id);
    if let Some(search) = query.search.as_deref().filter(|s| !s.is_empty()) {
        select = select.filter(
            Expr::col((genres::Entity, genres::Column::Name)).ilike(format!("%{}%", search)),
        );
    }

    let params = query.page_params();
    let paginator = select.paginate(db.get_ref(), params.page_size());
    let count = paginator
        .num_items()
        .await
        .map_err(error::ErrorInternalServerError)?;
    let results: Vec<GenreResponse> = paginator
        .fetch_page(params.page() - 1)
        .await
        .map_err(error::ErrorInternalServerError)?
        .into_iter()
        .map(Into::into)
        .collect();

    Ok(HttpResponse::Ok().json(Page::new(count, &params, results)))
}

/// POST /v1/genres
#[post("/v1/genres")]
async fn create_genre(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    form: web::Json<GenreForm>,
) -> Result<HttpResponse, Error> {
    client.require_admin()?;
    form.validate().map_err(|e| validation_errors(&e))?;

    let genre = genres::ActiveModel {
        name: Set(form.name.clone()),
        slug: Set(form.slug.clone()),
        ..Default::default()
    };

    let created = genre.insert(db.get_ref()).await.map_err(|e| {
        match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                validation_error("slug", "A genre with this slug already exists.")
            }
            _ => error::ErrorInternalServerError(e),
        }
    })?;

    Ok(HttpResponse::Created().json(GenreResponse::from(created)))
}

/// DELETE /v1/genres/{slug}
#[delete("/v1/genres/{slug}")]
async fn destroy_genre(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<String>,
) -> Result<HttpResponse, Error> {
    client.require_admin()?;

    let genre = genres::Entity::find()
        .filter(genres::Column::Slug.eq(path.as_str()))
        .one(db.get_ref())
        .await
        .map_err(error::ErrorInternalServerError)?
        .ok_or_else(|| error::ErrorNotFound("Genre not found"))?;

    genre
        .delete(db.get_ref())
        .await
        .map_err(error::ErrorInternalServerError)?;

    Ok(HttpResponse::NoContent().finish())
}
