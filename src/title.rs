//! Read-side title queries.
//!
//! Listing embeds the average review score computed in SQL, so a page of
//! titles costs one query plus two batch lookups for categories and genres.

use crate::orm::{categories, genres, title_genres, titles};
use sea_orm::sea_query::Expr;
use sea_orm::{entity::*, query::*, DatabaseConnection, FromQueryResult};
use std::collections::HashMap;

/// A title row with its aggregated rating, NULL when it has no reviews.
#[derive(Clone, Debug, FromQueryResult)]
pub struct TitleWithRating {
    pub id: i32,
    pub name: String,
    pub year: i32,
    pub description: String,
    pub category_id: Option<i32>,
    pub rating: Option<f64>,
}

/// Base select for title reads.
pub fn with_rating() -> Select<titles::Entity> {
    titles::Entity::find().column_as(
        Expr::cust(
            "(SELECT AVG(reviews.score)::float8 FROM reviews WHERE reviews.title_id = titles.id)",
        ),
        "rating",
    )
}

pub async fn find_with_rating_by_id(
    db: &DatabaseConnection,
    id: i32,
) -> Result<Option<TitleWithRating>, sea_orm::DbErr> {
    with_rating()
        .filter(titles::Column::Id.eq(id))
        .into_model::<TitleWithRating>()
        .one(db)
        .await
}

/// Category and genre rows for a page of titles.
#[derive(Debug, Default)]
pub struct TitleRelations {
    categories: HashMap<i32, categories::Model>,
    genres_by_title: HashMap<i32, Vec<genres::Model>>,
}

impl TitleRelations {
    pub fn category_for(&self, title: &TitleWithRating) -> Option<&categories::Model> {
        title.category_id.and_then(|id| self.categories.get(&id))
    }

    pub fn genres_for(&self, title_id: i32) -> &[genres::Model] {
        self.genres_by_title
            .get(&title_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }
}

pub async fn load_relations(
    db: &DatabaseConnection,
    rows: &[TitleWithRating],
) -> Result<TitleRelations, sea_orm::DbErr> {
    let title_ids: Vec<i32> = rows.iter().map(|t| t.id).collect();
    let category_ids: Vec<i32> = rows.iter().filter_map(|t| t.category_id).collect();

    let mut relations = TitleRelations::default();

    if !category_ids.is_empty() {
        for category in categories::Entity::find()
            .filter(categories::Column::Id.is_in(category_ids))
            .all(db)
            .await?
        {
            relations.categories.insert(category.id, category);
        }
    }

    if !title_ids.is_empty() {
        for (link, genre) in title_genres::Entity::find()
            .filter(title_genres::Column::TitleId.is_in(title_ids))
            .find_also_related(genres::Entity)
            .all(db)
            .await?
        {
            if let Some(genre) = genre {
                relations
                    .genres_by_title
                    .entry(link.title_id)
                    .or_default()
                    .push(genre);
            }
        }
    }

    Ok(relations)
}
