//! Category endpoints: list, create, destroy
//!
//! Slug-based lookup; writes are admin-only. Deleting a category leaves its
//! titles in place with the reference cleared.

use crate::middleware::ClientCtx;
use crate::orm::categories;
use crate::pagination::{Page, PageParams};
use crate::web::error::{validation_error, validation_errors};
use actix_web::{delete, error, get, post, web, Error, HttpResponse};
use sea_orm::sea_query::{extension::postgres::PgExpr, Expr};
use sea_orm::{entity::*, query::*, ActiveValue::Set, DatabaseConnection, SqlErr};
use serde::{Deserialize, Serialize};
use validator::Validate;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(list_categories)
        .service(create_category)
        .service(destroy_category);
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
struct CategoryResponse {
    name: String,
    slug: String,
}

impl From<categories::Model> for CategoryResponse {
    fn from(category: categories::Model) -> Self {
        CategoryResponse {
            name: category.name,
            slug: category.slug,
        }
    }
}

#[derive(Deserialize, Validate)]
struct CategoryForm {
    #[validate(length(min = 1, max = 200))]
    name: String,
    #[validate(length(min = 1, max = 100), custom = "crate::web::validate_slug")]
    slug: String,
}

/// GET /v1/categories
#[get("/v1/categories")]
async fn list_categories(
    db: web::Data<DatabaseConnection>,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse, Error> {
    let mut select = categories::Entity::find().order_by_desc(categories::Column::Id);
    if let Some(search) = query.search.as_deref().filter(|s| !s.is_empty()) {
        select = select.filter(
            Expr::col((categories::Entity, categories::Column::Name))
                .ilike(format!("%{}%", search)),
        );
    }

    let params = query.page_params();
    let paginator = select.paginate(db.get_ref(), params.page_size());
    let count = paginator
        .num_items()
        .await
        .map_err(error::ErrorInternalServerError)?;
    let results: Vec<CategoryResponse> = paginator
        .fetch_page(params.page() - 1)
        .await
        .map_err(error::ErrorInternalServerError)?
        .into_iter()
        .map(Into::into)
        .collect();

    Ok(HttpResponse::Ok().json(Page::new(count, &params, results)))
}

/// POST /v1/categories
#[post("/v1/categories")]
async fn create_category(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    form: web::Json<CategoryForm>,
) -> Result<HttpResponse, Error> {
    client.require_admin()?;
    form.validate().map_err(|e| validation_errors(&e))?;

    let category = categories::ActiveModel {
        name: Set(form.name.clone()),
        slug: Set(form.slug.clone()),
        ..Default::default()
    };

    let created = category.insert(db.get_ref()).await.map_err(|e| {
        match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                validation_error("slug", "A category with this slug already exists.")
            }
            _ => error::ErrorInternalServerError(e),
        }
    })?;

    Ok(HttpResponse::Created().json(CategoryResponse::from(created)))
}

/// DELETE /v1/categories/{slug}
#[delete("/v1/categories/{slug}")]
async fn destroy_category(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<String>,
) -> Result<HttpResponse, Error> {
    client.require_admin()?;

    let category = categories::Entity::find()
        .filter(categories::Column::Slug.eq(path.as_str()))
        .one(db.get_ref())
        .await
        .map_err(error::ErrorInternalServerError)?
        .ok_or_else(|| error::ErrorNotFound("Category not found"))?;

    category
        .delete(db.get_ref())
        .await
        .map_err(error::ErrorInternalServerError)?;

    Ok(HttpResponse::NoContent().finish())
}
