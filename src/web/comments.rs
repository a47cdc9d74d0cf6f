//! Comment endpoints, nested under a title's review
//!
//! Same permission composition as reviews; the nested path only exists when
//! the review belongs to the title.

use crate::middleware::ClientCtx;
use crate::orm::{comments, users};
use crate::pagination::{Page, PageParams};
use crate::permission;
use crate::web::error::validation_errors;
use crate::web::reviews::{get_current_review, get_current_title};
use actix_web::{delete, error, get, post, route, web, Error, HttpRequest, HttpResponse};
use chrono::Utc;
use sea_orm::{entity::*, query::*, ActiveValue::Set, DatabaseConnection};
use serde::{Deserialize, Serialize};
use validator::Validate;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(list_comments)
        .service(create_comment)
        .service(get_comment)
        .service(update_comment)
        .service(destroy_comment);
}

#[derive(Serialize)]
struct CommentResponse {
    id: i32,
    text: String,
    author: String,
    pub_date: chrono::NaiveDateTime,
}

impl CommentResponse {
    fn new(comment: comments::Model, author: String) -> Self {
        CommentResponse {
            id: comment.id,
            text: comment.text,
            author,
            pub_date: comment.created_at,
        }
    }
}

#[derive(Deserialize, Validate)]
struct CreateCommentForm {
    #[validate(length(min = 1))]
    text: String,
}

#[derive(Deserialize, Validate)]
struct UpdateCommentForm {
    #[validate(length(min = 1))]
    text: Option<String>,
}

async fn get_current_comment(
    db: &DatabaseConnection,
    review_id: i32,
    comment_id: i32,
) -> Result<comments::Model, Error> {
    comments::Entity::find_by_id(comment_id)
        .filter(comments::Column::ReviewId.eq(review_id))
        .one(db)
        .await
        .map_err(error::ErrorInternalServerError)?
        .ok_or_else(|| error::ErrorNotFound("Comment not found"))
}

async fn author_username(db: &DatabaseConnection, author_id: i32) -> Result<String, Error> {
    Ok(users::Entity::find_by_id(author_id)
        .one(db)
        .await
        .map_err(error::ErrorInternalServerError)?
        .map(|u| u.username)
        .unwrap_or_default())
}

/// GET /v1/titles/{title_id}/reviews/{review_id}/comments
#[get("/v1/titles/{title_id}/reviews/{review_id}/comments")]
async fn list_comments(
    db: web::Data<DatabaseConnection>,
    path: web::Path<(i32, i32)>,
    query: web::Query<PageParams>,
) -> Result<HttpResponse, Error> {
    let (title_id, review_id) = path.into_inner();
    let title = get_current_title(db.get_ref(), title_id).await?;
    let review = get_current_review(db.get_ref(), title.id, review_id).await?;
    let params = query.into_inner();

    let paginator = comments::Entity::find()
        .filter(comments::Column::ReviewId.eq(review.id))
        .order_by_desc(comments::Column::CreatedAt)
        .find_also_related(users::Entity)
        .paginate(db.get_ref(), params.page_size());

    let count = paginator
        .num_items()
        .await
        .map_err(error::ErrorInternalServerError)?;
    let results: Vec<CommentResponse> = paginator
        .fetch_page(params.page() - 1)
        .await
        .map_err(error::ErrorInternalServerError)?
        .into_iter()
        .map(|(comment, author)| {
            let author = author.map(|u| u.username).unwrap_or_default();
            CommentResponse::new(comment, author)
        })
        .collect();

    Ok(HttpResponse::Ok().json(Page::new(count, &params, results)))
}

/// POST /v1/titles/{title_id}/reviews/{review_id}/comments
#[post("/v1/titles/{title_id}/reviews/{review_id}/comments")]
async fn create_comment(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<(i32, i32)>,
    form: web::Json<CreateCommentForm>,
) -> Result<HttpResponse, Error> {
    let author = client.require_login()?.clone();
    form.validate().map_err(|e| validation_errors(&e))?;

    let (title_id, review_id) = path.into_inner();
    let title = get_current_title(db.get_ref(), title_id).await?;
    let review = get_current_review(db.get_ref(), title.id, review_id).await?;

    let comment = comments::ActiveModel {
        title_id: Set(title.id),
        review_id: Set(review.id),
        author_id: Set(author.id),
        text: Set(form.text.clone()),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    };

    let created = comment
        .insert(db.get_ref())
        .await
        .map_err(error::ErrorInternalServerError)?;

    Ok(HttpResponse::Created().json(CommentResponse::new(created, author.username)))
}

/// GET /v1/titles/{title_id}/reviews/{review_id}/comments/{comment_id}
#[get("/v1/titles/{title_id}/reviews/{review_id}/comments/{comment_id}")]
async fn get_comment(
    db: web::Data<DatabaseConnection>,
    path: web::Path<(i32, i32, i32)>,
) -> Result<HttpResponse, Error> {
    let (title_id, review_id, comment_id) = path.into_inner();
    let review = get_current_review(db.get_ref(), title_id, review_id).await?;
    let comment = get_current_comment(db.get_ref(), review.id, comment_id).await?;
    let author = author_username(db.get_ref(), comment.author_id).await?;
    Ok(HttpResponse::Ok().json(CommentResponse::new(comment, author)))
}

/// PATCH/PUT /v1/titles/{title_id}/reviews/{review_id}/comments/{comment_id}
#[route(
    "/v1/titles/{title_id}/reviews/{review_id}/comments/{comment_id}",
    method = "PATCH",
    method = "PUT"
)]
async fn update_comment(
    req: HttpRequest,
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<(i32, i32, i32)>,
    form: web::Json<UpdateCommentForm>,
) -> Result<HttpResponse, Error> {
    let (title_id, review_id, comment_id) = path.into_inner();
    form.validate().map_err(|e| validation_errors(&e))?;

    let review = get_current_review(db.get_ref(), title_id, review_id).await?;
    let comment = get_current_comment(db.get_ref(), review.id, comment_id).await?;
    permission::require_content_permission(&client, req.method(), comment.author_id)?;

    let author = author_username(db.get_ref(), comment.author_id).await?;
    let mut active: comments::ActiveModel = comment.into();
    let updated = match &form.text {
        Some(text) => {
            active.text = Set(text.clone());
            active
                .update(db.get_ref())
                .await
                .map_err(error::ErrorInternalServerError)?
        }
        None => get_current_comment(db.get_ref(), review.id, comment_id).await?,
    };

    Ok(HttpResponse::Ok().json(CommentResponse::new(updated, author)))
}

/// DELETE /v1/titles/{title_id}/reviews/{review_id}/comments/{comment_id}
#[delete("/v1/titles/{title_id}/reviews/{review_id}/comments/{comment_id}")]
async fn destroy_comment(
    req: HttpRequest,
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<(i32, i32, i32)>,
) -> Result<HttpResponse, Error> {
    let (title_id, review_id, comment_id) = path.into_inner();

    let review = get_current_review(db.get_ref(), title_id, review_id).await?;
    let comment = get_current_comment(db.get_ref(), review.id, comment_id).await?;
    permission::require_content_permission(&client, req.method(), comment.author_id)?;

    comment
        .delete(db.get_ref())
        .await
        .map_err(error::ErrorInternalServerError)?;

    Ok(HttpResponse::NoContent().finish())
}
