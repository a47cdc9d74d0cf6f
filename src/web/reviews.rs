//! Review endpoints, nested under titles
//!
//! Creation is open to any authenticated user but limited to one review per
//! (author, title) by the storage-level unique index; mutation is gated by
//! the combined admin/author/moderator predicate.

use crate::middleware::ClientCtx;
use crate::orm::{reviews, titles, users};
use crate::pagination::{Page, PageParams};
use crate::permission;
use crate::web::error::{validation_error, validation_errors};
use actix_web::{delete, error, get, post, route, web, Error, HttpRequest, HttpResponse};
use chrono::Utc;
use sea_orm::{entity::*, query::*, ActiveValue::Set, DatabaseConnection, SqlErr};
use serde::{Deserialize, Serialize};
use validator::Validate;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(list_reviews)
        .service(create_review)
        .service(get_review)
        .service(update_review)
        .service(destroy_review);
}

#[derive(Serialize)]
struct ReviewResponse {
    id: i32,
    text: String,
    author: String,
    score: i32,
    pub_date: chrono::NaiveDateTime,
}

impl ReviewResponse {
    fn new(review: reviews::Model, author: String) -> Self {
        ReviewResponse {
            id: review.id,
            text: review.text,
            author,
            score: review.score,
            pub_date: review.created_at,
        }
    }
}

#[derive(Deserialize, Validate)]
struct CreateReviewForm {
    #[validate(length(min = 1))]
    text: String,
    #[validate(range(min = 1, max = 10, message = "Score must be between 1 and 10."))]
    score: i32,
}

#[derive(Deserialize, Validate)]
struct UpdateReviewForm {
    #[validate(length(min = 1))]
    text: Option<String>,
    #[validate(range(min = 1, max = 10, message = "Score must be between 1 and 10."))]
    score: Option<i32>,
}

pub(super) async fn get_current_title(
    db: &DatabaseConnection,
    title_id: i32,
) -> Result<titles::Model, Error> {
    titles::Entity::find_by_id(title_id)
        .one(db)
        .await
        .map_err(error::ErrorInternalServerError)?
        .ok_or_else(|| error::ErrorNotFound("Title not found"))
}

/// The review must belong to the title in the path, else the nested route
/// does not exist.
pub(super) async fn get_current_review(
    db: &DatabaseConnection,
    title_id: i32,
    review_id: i32,
) -> Result<reviews::Model, Error> {
    reviews::Entity::find_by_id(review_id)
        .filter(reviews::Column::TitleId.eq(title_id))
        .one(db)
        .await
        .map_err(error::ErrorInternalServerError)?
        .ok_or_else(|| error::ErrorNotFound("Review not found"))
}

async fn author_username(db: &DatabaseConnection, author_id: i32) -> Result<String, Error> {
    Ok(users::Entity::find_by_id(author_id)
        .one(db)
        .await
        .map_err(error::ErrorInternalServerError)?
        .map(|u| u.username)
        .unwrap_or_default())
}

/// GET /v1/titles/{title_id}/reviews
#[get("/v1/titles/{title_id}/reviews")]
async fn list_reviews(
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
    query: web::Query<PageParams>,
) -> Result<HttpResponse, Error> {
    let title = get_current_title(db.get_ref(), path.into_inner()).await?;
    let params = query.into_inner();

    let paginator = reviews::Entity::find()
        .filter(reviews::Column::TitleId.eq(title.id))
        .order_by_desc(reviews::Column::CreatedAt)
        .find_also_related(users::Entity)
        .paginate(db.get_ref(), params.page_size());

    let count = paginator
        .num_items()
        .await
        .map_err(error::ErrorInternalServerError)?;
    let results: Vec<ReviewResponse> = paginator
        .fetch_page(params.page() - 1)
        .await
        .map_err(error::ErrorInternalServerError)?
        .into_iter()
        .map(|(review, author)| {
            let author = author.map(|u| u.username).unwrap_or_default();
            ReviewResponse::new(review, author)
        })
        .collect();

    Ok(HttpResponse::Ok().json(Page::new(count, &params, results)))
}

/// POST /v1/titles/{title_id}/reviews
#[post("/v1/titles/{title_id}/reviews")]
async fn create_review(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
    form: web::Json<CreateReviewForm>,
) -> Result<HttpResponse, Error> {
    let author = client.require_login()?.clone();
    form.validate().map_err(|e| validation_errors(&e))?;

    let title = get_current_title(db.get_ref(), path.into_inner()).await?;

    // The author is always the requester; the unique index turns a second
    // attempt into a validation error instead of racing a pre-check.
    let review = reviews::ActiveModel {
        title_id: Set(title.id),
        author_id: Set(author.id),
        text: Set(form.text.clone()),
        score: Set(form.score),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    };

    let created = review.insert(db.get_ref()).await.map_err(|e| {
        match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                validation_error("detail", "You have already reviewed this title.")
            }
            _ => error::ErrorInternalServerError(e),
        }
    })?;

    Ok(HttpResponse::Created().json(ReviewResponse::new(created, author.username)))
}

/// GET /v1/titles/{title_id}/reviews/{review_id}
#[get("/v1/titles/{title_id}/reviews/{review_id}")]
async fn get_review(
    db: web::Data<DatabaseConnection>,
    path: web::Path<(i32, i32)>,
) -> Result<HttpResponse, Error> {
    let (title_id, review_id) = path.into_inner();
    let review = get_current_review(db.get_ref(), title_id, review_id).await?;
    let author = author_username(db.get_ref(), review.author_id).await?;
    Ok(HttpResponse::Ok().json(ReviewResponse::new(review, author)))
}

/// PATCH/PUT /v1/titles/{title_id}/reviews/{review_id}
#[route(
    "/v1/titles/{title_id}/reviews/{review_id}",
    method = "PATCH",
    method = "PUT"
)]
async fn update_review(
    req: HttpRequest,
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<(i32, i32)>,
    form: web::Json<UpdateReviewForm>,
) -> Result<HttpResponse, Error> {
    let (title_id, review_id) = path.into_inner();
    form.validate().map_err(|e| validation_errors(&e))?;

    let review = get_current_review(db.get_ref(), title_id, review_id).await?;
    permission::require_content_permission(&client, req.method(), review.author_id)?;

    let author = author_username(db.get_ref(), review.author_id).await?;
    let mut active: reviews::ActiveModel = review.into();
    let mut dirty = false;
    if let Some(text) = &form.text {
        active.text = Set(text.clone());
        dirty = true;
    }
    if let Some(score) = form.score {
        active.score = Set(score);
        dirty = true;
    }

    let updated = if dirty {
        active
            .update(db.get_ref())
            .await
            .map_err(error::ErrorInternalServerError)?
    } else {
        get_current_review(db.get_ref(), title_id, review_id).await?
    };

    Ok(HttpResponse::Ok().json(ReviewResponse::new(updated, author)))
}

/// DELETE /v1/titles/{title_id}/reviews/{review_id}
#[delete("/v1/titles/{title_id}/reviews/{review_id}")]
async fn destroy_review(
    req: HttpRequest,
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<(i32, i32)>,
) -> Result<HttpResponse, Error> {
    let (title_id, review_id) = path.into_inner();

    let review = get_current_review(db.get_ref(), title_id, review_id).await?;
    permission::require_content_permission(&client, req.method(), review.author_id)?;

    review
        .delete(db.get_ref())
        .await
        .map_err(error::ErrorInternalServerError)?;

    Ok(HttpResponse::NoContent().finish())
}
