//! Integration tests for comments nested under a title's review.
mod common;
use serial_test::serial;

use actix_web::{test, web::Data, App};
use common::database::*;
use common::fixtures::*;
use scorebook::orm::users::Role;
use serde_json::json;

#[actix_rt::test]
#[serial]
async fn test_comment_attribution_and_nesting() {
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
    let other_title = create_test_title(&db, "Hyperion", 1989, None)
        .await
        .expect("Failed to create title");
    let review = create_test_review(&db, title.id, author.id, 8)
        .await
        .expect("Failed to create review");

    let config = test_config();
    let app = test::init_service(
        App::new()
            .app_data(Data::new(db.clone()))
            .app_data(Data::new(config.clone()))
            .configure(scorebook::web::configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri(&format!(
            "/v1/titles/{}/reviews/{}/comments",
            title.id, review.id
        ))
        .insert_header(("Authorization", bearer(&config, author.id)))
        .set_json(json!({ "text": "Agreed" }))
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["author"], "reader");
    assert_eq!(body["text"], "Agreed");

    // The review does not belong to that title, so the nested path is a 404.
    let req = test::TestRequest::post()
        .uri(&format!(
            "/v1/titles/{}/reviews/{}/comments",
            other_title.id, review.id
        ))
        .insert_header(("Authorization", bearer(&config, author.id)))
        .set_json(json!({ "text": "Lost" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);

    // Guests cannot comment.
    let req = test::TestRequest::post()
        .uri(&format!(
            "/v1/titles/{}/reviews/{}/comments",
            title.id, review.id
        ))
        .set_json(json!({ "text": "Anonymous" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn test_comment_moderation_rules() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let author = create_test_user(&db, "reader", Role::User)
        .await
        .expect("Failed to create user");
    let moderator = create_test_user(&db, "janitor", Role::Moderator)
        .await
        .expect("Failed to create moderator");
    let stranger = create_test_user(&db, "stranger", Role::User)
        .await
        .expect("Failed to create user");
    let title = create_test_title(&db, "Dune", 1965, None)
        .await
        .expect("Failed to create title");
    let review = create_test_review(&db, title.id, author.id, 8)
        .await
        .expect("Failed to create review");
    let comment = create_test_comment(&db, title.id, review.id, author.id)
        .await
        .expect("Failed to create comment");

    let config = test_config();
    let app = test::init_service(
        App::new()
            .app_data(Data::new(db.clone()))
            .app_data(Data::new(config.clone()))
            .configure(scorebook::web::configure),
    )
    .await;

    let uri = format!(
        "/v1/titles/{}/reviews/{}/comments/{}",
        title.id, review.id, comment.id
    );

    let req = test::TestRequest::patch()
        .uri(&uri)
        .insert_header(("Authorization", bearer(&config, stranger.id)))
        .set_json(json!({ "text": "Hijacked" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 403);

    let req = test::TestRequest::patch()
        .uri(&uri)
        .insert_header(("Authorization", bearer(&config, moderator.id)))
        .set_json(json!({ "text": "Cleaned up" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let req = test::TestRequest::delete()
        .uri(&uri)
        .insert_header(("Authorization", bearer(&config, moderator.id)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 204);

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}
