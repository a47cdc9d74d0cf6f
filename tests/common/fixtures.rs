//! Test fixtures for creating test data
#![allow(dead_code)]

use chrono::Utc;
use scorebook::config::{Config, EmailConfig};
use scorebook::orm::users::Role;
use scorebook::orm::{categories, comments, genres, reviews, titles, users};
use scorebook::token;
use sea_orm::{entity::*, ActiveValue::Set, DatabaseConnection, DbErr};

/// Config for tests: fixed secret, mock email transport.
pub fn test_config() -> Config {
    Config {
        database_url: String::new(),
        bind_addr: String::new(),
        secret_key: "integration-test-secret-key-0123456789".to_string(),
        access_token_minutes: 60,
        refresh_token_days: 30,
        confirmation_code_hours: 24,
        email: EmailConfig {
            smtp_host: "localhost".to_string(),
            smtp_port: 587,
            smtp_username: String::new(),
            smtp_password: String::new(),
            from_email: "noreply@localhost".to_string(),
            from_name: "Scorebook".to_string(),
            use_tls: false,
            mock: true,
        },
    }
}

/// Authorization header value for a user.
pub fn bearer(config: &Config, user_id: i32) -> String {
    let access = token::issue_access(config, user_id).expect("Failed to issue access token");
    format!("Bearer {}", access)
}

/// Create a test user with the given role.
pub async fn create_test_user(
    db: &DatabaseConnection,
    username: &str,
    role: Role,
) -> Result<users::Model, DbErr> {
    users::ActiveModel {
        username: Set(username.to_string()),
        email: Set(format!("{}@test.com", username)),
        role: Set(role),
        is_superuser: Set(false),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await
}

/// Create a test user with the superuser flag and a plain role.
pub async fn create_test_superuser(
    db: &DatabaseConnection,
    username: &str,
) -> Result<users::Model, DbErr> {
    users::ActiveModel {
        username: Set(username.to_string()),
        email: Set(format!("{}@test.com", username)),
        role: Set(Role::User),
        is_superuser: Set(true),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await
}

pub async fn create_test_category(
    db: &DatabaseConnection,
    name: &str,
    slug: &str,
) -> Result<categories::Model, DbErr> {
    categories::ActiveModel {
        name: Set(name.to_string()),
        slug: Set(slug.to_string()),
        ..Default::default()
    }
    .insert(db)
    .await
}

pub async fn create_test_genre(
    db: &DatabaseConnection,
    name: &str,
    slug: &str,
) -> Result<genres::Model, DbErr> {
    genres::ActiveModel {
        name: Set(name.to_string()),
        slug: Set(slug.to_string()),
        ..Default::default()
    }
    .insert(db)
    .await
}

pub async fn create_test_title(
    db: &DatabaseConnection,
    name: &str,
    year: i32,
    category_id: Option<i32>,
) -> Result<titles::Model, DbErr> {
    titles::ActiveModel {
        name: Set(name.to_string()),
        year: Set(year),
        description: Set("A test title".to_string()),
        category_id: Set(category_id),
        ..Default::default()
    }
    .insert(db)
    .await
}

pub async fn create_test_review(
    db: &DatabaseConnection,
    title_id: i32,
    author_id: i32,
    score: i32,
) -> Result<reviews::Model, DbErr> {
    reviews::ActiveModel {
        title_id: Set(title_id),
        author_id: Set(author_id),
        text: Set("A test review".to_string()),
        score: Set(score),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await
}

pub async fn create_test_comment(
    db: &DatabaseConnection,
    title_id: i32,
    review_id: i32,
    author_id: i32,
) -> Result<comments::Model, DbErr> {
    comments::ActiveModel {
        title_id: Set(title_id),
        review_id: Set(review_id),
        author_id: Set(author_id),
        text: Set("A test comment".to_string()),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await
}
