//! Title endpoints
//!
//! Reads embed category, genres and the query-time average rating; writes
//! are admin-only and reference category/genres by slug.

use crate::middleware::ClientCtx;
use crate::orm::{categories, genres, title_genres, titles};
use crate::pagination::{Page, PageParams};
use crate::title::{self, TitleRelations, TitleWithRating};
use crate::web::error::{validation_error, validation_errors};
use actix_web::{delete, error, get, post, route, web, Error, HttpResponse};
use chrono::{Datelike, Utc};
use sea_orm::sea_query::{extension::postgres::PgExpr, Expr};
use sea_orm::{entity::*, query::*, ActiveValue::Set, DatabaseConnection, TransactionTrait};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use validator::Validate;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(list_titles)
        .service(create_title)
        .service(get_title)
        .service(update_title)
        .service(destroy_title);
}

#[derive(Deserialize)]
struct TitleFilterQuery {
    category: Option<String>,
    genre: Option<String>,
    name: Option<String>,
    year: Option<i32>,
    page: Option<u64>,
    page_size: Option<u64>,
}

impl TitleFilterQuery {
    fn page_params(&self) -> PageParams {
        PageParams {
            page: self.page,
            page_size: self.page_size,
        }
    }
}

#[derive(Serialize)]
struct NamedSlug {
    name: String,
    slug: String,
}

#[derive(Serialize)]
struct TitleResponse {
    id: i32,
    name: String,
    year: i32,
    rating: Option<f64>,
    description: String,
    category: Option<NamedSlug>,
    genre: Vec<NamedSlug>,
}

fn to_response(row: TitleWithRating, relations: &TitleRelations) -> TitleResponse {
    let category = relations.category_for(&row).map(|c| NamedSlug {
        name: c.name.clone(),
        slug: c.slug.clone(),
    });
    let genre = relations
        .genres_for(row.id)
        .iter()
        .map(|g| NamedSlug {
            name: g.name.clone(),
            slug: g.slug.clone(),
        })
        .collect();
    TitleResponse {
        id: row.id,
        name: row.name,
        year: row.year,
        rating: row.rating,
        description: row.description,
        category,
        genre,
    }
}

#[derive(Deserialize, Validate)]
struct CreateTitleForm {
    #[validate(length(min = 1, max = 200))]
    name: String,
    year: i32,
    #[validate(length(max = 250))]
    description: String,
    /// Category slug.
    category: Option<String>,
    /// Genre slugs.
    genre: Option<Vec<String>>,
}

#[derive(Deserialize, Validate)]
struct UpdateTitleForm {
    #[validate(length(min = 1, max = 200))]
    name: Option<String>,
    year: Option<i32>,
    #[validate(length(max = 250))]
    description: Option<String>,
    category: Option<String>,
    genre: Option<Vec<String>>,
}

fn check_year(year: i32) -> Result<(), Error> {
    if year > Utc::now().year() {
        return Err(validation_error(
            "year",
            "Release year cannot be in the future.",
        ));
    }
    Ok(())
}

async fn resolve_category(
    db: &DatabaseConnection,
    slug: &str,
) -> Result<categories::Model, Error> {
    categories::Entity::find()
        .filter(categories::Column::Slug.eq(slug))
        .one(db)
        .await
        .map_err(error::ErrorInternalServerError)?
        .ok_or_else(|| validation_error("category", "Unknown category slug."))
}

async fn resolve_genres(
    db: &DatabaseConnection,
    slugs: &[String],
) -> Result<Vec<genres::Model>, Error> {
    let unique: BTreeSet<&str> = slugs.iter().map(String::as_str).collect();
    if unique.is_empty() {
        return Ok(Vec::new());
    }

    let found = genres::Entity::find()
        .filter(genres::Column::Slug.is_in(unique.iter().copied()))
        .all(db)
        .await
        .map_err(error::ErrorInternalServerError)?;

    if found.len() != unique.len() {
        return Err(validation_error("genre", "Unknown genre slug."));
    }
    Ok(found)
}

/// Single-title read with rating and relations, shared by the detail and
/// write responses.
async fn read_title_response(
    db: &DatabaseConnection,
    title_id: i32,
) -> Result<TitleResponse, Error> {
    let row = title::find_with_rating_by_id(db, title_id)
        .await
        .map_err(error::ErrorInternalServerError)?
        .ok_or_else(|| error::ErrorNotFound("Title not found"))?;
    let relations = title::load_relations(db, std::slice::from_ref(&row))
        .await
        .map_err(error::ErrorInternalServerError)?;
    Ok(to_response(row, &relations))
}

/// GET /v1/titles
#[get("/v1/titles")]
async fn list_titles(
    db: web::Data<DatabaseConnection>,
    query: web::Query<TitleFilterQuery>,
) -> Result<HttpResponse, Error> {
    let mut select = title::with_rating().order_by_desc(titles::Column::Id);

    if let Some(name) = query.name.as_deref().filter(|s| !s.is_empty()) {
        select = select
            .filter(Expr::col((titles::Entity, titles::Column::Name)).ilike(format!("%{}%", name)));
    }
    if let Some(year) = query.year {
        select = select.filter(titles::Column::Year.eq(year));
    }
    if let Some(category) = query.category.as_deref().filter(|s| !s.is_empty()) {
        select = select
            .join(JoinType::LeftJoin, titles::Relation::Category.def())
            .filter(
                Expr::col((categories::Entity, categories::Column::Slug))
                    .ilike(format!("%{}%", category)),
            );
    }
    if let Some(genre) = query.genre.as_deref().filter(|s| !s.is_empty()) {
        // A title can match through several genres; collapse the join rows.
        select = select
            .join(JoinType::LeftJoin, titles::Relation::TitleGenres.def())
            .join(JoinType::LeftJoin, title_genres::Relation::Genre.def())
            .filter(
                Expr::col((genres::Entity, genres::Column::Slug)).ilike(format!("%{}%", genre)),
            )
            .distinct();
    }

    let params = query.page_params();
    let paginator = select
        .into_model::<TitleWithRating>()
        .paginate(db.get_ref(), params.page_size());
    let count = paginator
        .num_items()
        .await
        .map_err(error::ErrorInternalServerError)?;
    let rows = paginator
        .fetch_page(params.page() - 1)
        .await
        .map_err(error::ErrorInternalServerError)?;

    let relations = title::load_relations(db.get_ref(), &rows)
        .await
        .map_err(error::ErrorInternalServerError)?;
    let results: Vec<TitleResponse> = rows
        .into_iter()
        .map(|row| to_response(row, &relations))
        .collect();

    Ok(HttpResponse::Ok().json(Page::new(count, &params, results)))
}

/// POST /v1/titles
#[post("/v1/titles")]
async fn create_title(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    form: web::Json<CreateTitleForm>,
) -> Result<HttpResponse, Error> {
    client.require_admin()?;
    form.validate().map_err(|e| validation_errors(&e))?;
    check_year(form.year)?;

    let category = match form.category.as_deref() {
        Some(slug) => Some(resolve_category(db.get_ref(), slug).await?),
        None => None,
    };
    let genre_rows = match form.genre.as_deref() {
        Some(slugs) => resolve_genres(db.get_ref(), slugs).await?,
        None => Vec::new(),
    };

    let txn = db
        .begin()
        .await
        .map_err(error::ErrorInternalServerError)?;

    let created = titles::ActiveModel {
        name: Set(form.name.clone()),
        year: Set(form.year),
        description: Set(form.description.clone()),
        category_id: Set(category.map(|c| c.id)),
        ..Default::default()
    }
    .insert(&txn)
    .await
    .map_err(error::ErrorInternalServerError)?;

    for genre in &genre_rows {
        title_genres::ActiveModel {
            title_id: Set(created.id),
            genre_id: Set(genre.id),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(error::ErrorInternalServerError)?;
    }

    txn.commit().await.map_err(error::ErrorInternalServerError)?;

    let response = read_title_response(db.get_ref(), created.id).await?;
    Ok(HttpResponse::Created().json(response))
}

/// GET /v1/titles/{title_id}
#[get("/v1/titles/{title_id}")]
async fn get_title(
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> Result<HttpResponse, Error> {
    let response = read_title_response(db.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(response))
}

/// PATCH/PUT /v1/titles/{title_id}
#[route("/v1/titles/{title_id}", method = "PATCH", method = "PUT")]
async fn update_title(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
    form: web::Json<UpdateTitleForm>,
) -> Result<HttpResponse, Error> {
    client.require_admin()?;
    form.validate().map_err(|e| validation_errors(&e))?;

    let title = titles::Entity::find_by_id(path.into_inner())
        .one(db.get_ref())
        .await
        .map_err(error::ErrorInternalServerError)?
        .ok_or_else(|| error::ErrorNotFound("Title not found"))?;
    let title_id = title.id;

    let category = match form.category.as_deref() {
        Some(slug) => Some(resolve_category(db.get_ref(), slug).await?),
        None => None,
    };
    let genre_rows = match form.genre.as_deref() {
        Some(slugs) => Some(resolve_genres(db.get_ref(), slugs).await?),
        None => None,
    };

    let mut active: titles::ActiveModel = title.into();
    let mut dirty = false;
    if let Some(name) = &form.name {
        active.name = Set(name.clone());
        dirty = true;
    }
    if let Some(year) = form.year {
        check_year(year)?;
        active.year = Set(year);
        dirty = true;
    }
    if let Some(description) = &form.description {
        active.description = Set(description.clone());
        dirty = true;
    }
    if let Some(category) = category {
        active.category_id = Set(Some(category.id));
        dirty = true;
    }

    let txn = db
        .begin()
        .await
        .map_err(error::ErrorInternalServerError)?;

    if dirty {
        active
            .update(&txn)
            .await
            .map_err(error::ErrorInternalServerError)?;
    }

    if let Some(genre_rows) = genre_rows {
        title_genres::Entity::delete_many()
            .filter(title_genres::Column::TitleId.eq(title_id))
            .exec(&txn)
            .await
            .map_err(error::ErrorInternalServerError)?;
        for genre in &genre_rows {
            title_genres::ActiveModel {
                title_id: Set(title_id),
                genre_id: Set(genre.id),
                ..Default::default()
            }
            .insert(&txn)
            .await
            .map_err(error::ErrorInternalServerError)?;
        }
    }

    txn.commit().await.map_err(error::ErrorInternalServerError)?;

    let response = read_title_response(db.get_ref(), title_id).await?;
    Ok(HttpResponse::Ok().json(response))
}

/// DELETE /v1/titles/{title_id}
#[delete("/v1/titles/{title_id}")]
async fn destroy_title(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> Result<HttpResponse, Error> {
    client.require_admin()?;

    let title = titles::Entity::find_by_id(path.into_inner())
        .one(db.get_ref())
        .await
        .map_err(error::ErrorInternalServerError)?
        .ok_or_else(|| error::ErrorNotFound("Title not found"))?;

    // Reviews and comments go with it, per the schema's cascade rules.
    title
        .delete(db.get_ref())
        .await
        .map_err(error::ErrorInternalServerError)?;

    Ok(HttpResponse::NoContent().finish())
}
