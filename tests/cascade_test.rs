//! Integration tests for deletion semantics: category deletion clears the
//! reference on titles, title deletion cascades to reviews and comments.
mod common;
use serial_test::serial;

use common::database::*;
use common::fixtures::*;
use scorebook::orm::users::Role;
use scorebook::orm::{comments, reviews, titles};
use sea_orm::{entity::*, query::*, PaginatorTrait};

#[actix_rt::test]
#[serial]
async fn test_category_deletion_clears_title_reference() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let category = create_test_category(&db, "Books", "books")
        .await
        .expect("Failed to create category");
    let title = create_test_title(&db, "Dune", 1965, Some(category.id))
        .await
        .expect("Failed to create title");

    category.delete(&db).await.expect("Failed to delete category");

    let reloaded = titles::Entity::find_by_id(title.id)
        .one(&db)
        .await
        .expect("Query failed")
        .expect("Title should survive category deletion");
    assert!(
        reloaded.category_id.is_none(),
        "Category reference should be cleared, not cascaded"
    );

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn test_title_deletion_cascades_to_reviews_and_comments() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let author = create_test_user(&db, "reader", Role::User)
        .await
        .expect("Failed to create user");
    let title = create_test_title(&db, "Dune", 1965, None)
        .await
        .expect("Failed to create title");
    let review = create_test_review(&db, title.id, author.id, 8)
        .await
        .expect("Failed to create review");
    create_test_comment(&db, title.id, review.id, author.id)
        .await
        .expect("Failed to create comment");

    title.delete(&db).await.expect("Failed to delete title");

    let remaining_reviews = reviews::Entity::find()
        .count(&db)
        .await
        .expect("Count failed");
    assert_eq!(remaining_reviews, 0, "Reviews should cascade with the title");

    let remaining_comments = comments::Entity::find()
        .count(&db)
        .await
        .expect("Count failed");
    assert_eq!(remaining_comments, 0, "Comments should cascade with the title");

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn test_review_deletion_cascades_to_comments() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let author = create_test_user(&db, "reader", Role::User)
        .await
        .expect("Failed to create user");
    let title = create_test_title(&db, "Dune", 1965, None)
        .await
        .expect("Failed to create title");
    let review = create_test_review(&db, title.id, author.id, 8)
        .await
        .expect("Failed to create review");
    create_test_comment(&db, title.id, review.id, author.id)
        .await
        .expect("Failed to create comment");

    review.delete(&db).await.expect("Failed to delete review");

    let remaining = comments::Entity::find()
        .count(&db)
        .await
        .expect("Count failed");
    assert_eq!(remaining, 0, "Comments should cascade with the review");

    // The title itself is untouched.
    let still_there = titles::Entity::find_by_id(title.id)
        .one(&db)
        .await
        .expect("Query failed");
    assert!(still_there.is_some());

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}
