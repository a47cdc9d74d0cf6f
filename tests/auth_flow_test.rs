//! Integration tests for the passwordless authentication flow: request a
//! confirmation code by email, exchange it for a token pair, refresh.
mod common;
use serial_test::serial;

use actix_web::{test, web::Data, App};
use common::database::*;
use common::fixtures::*;
use scorebook::confirmation;
use scorebook::orm::users::Role;
use serde_json::json;

#[actix_rt::test]
#[serial]
async fn test_confirmation_code_request_with_mock_transport() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    create_test_user(&db, "reader", Role::User)
        .await
        .expect("Failed to create user");

    let config = test_config();
    let app = test::init_service(
        App::new()
            .app_data(Data::new(db.clone()))
            .app_data(Data::new(config.clone()))
            .configure(scorebook::web::configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/v1/auth/email")
        .set_json(json!({ "email": "reader@test.com" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    // Unknown address is a 404, not a silent success.
    let req = test::TestRequest::post()
        .uri("/v1/auth/email")
        .set_json(json!({ "email": "nobody@test.com" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);

    // A malformed address is a field-level validation error.
    let req = test::TestRequest::post()
        .uri("/v1/auth/email")
        .set_json(json!({ "email": "not-an-email" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn test_token_exchange_with_valid_and_invalid_codes() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let user = create_test_user(&db, "reader", Role::User)
        .await
        .expect("Failed to create user");

    let config = test_config();
    let app = test::init_service(
        App::new()
            .app_data(Data::new(db.clone()))
            .app_data(Data::new(config.clone()))
            .configure(scorebook::web::configure),
    )
    .await;

    let code = confirmation::generate(&config, &user);

    let req = test::TestRequest::post()
        .uri("/v1/auth/token")
        .set_json(json!({ "email": user.email, "confirmation_code": code }))
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    let access = body["access"].as_str().expect("Missing access token");
    assert!(body["refresh"].as_str().is_some(), "Missing refresh token");

    // The pair works against an authenticated endpoint.
    let req = test::TestRequest::get()
        .uri("/v1/users/me")
        .insert_header(("Authorization", format!("Bearer {}", access)))
        .to_request();
    let me: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(me["username"], "reader");

    // A wrong code is a validation error.
    let req = test::TestRequest::post()
        .uri("/v1/auth/token")
        .set_json(json!({ "email": user.email, "confirmation_code": "0-deadbeef" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    // An unknown email is a 404.
    let req = test::TestRequest::post()
        .uri("/v1/auth/token")
        .set_json(json!({ "email": "nobody@test.com", "confirmation_code": "0-deadbeef" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn test_refresh_endpoint_accepts_only_refresh_tokens() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let user = create_test_user(&db, "reader", Role::User)
        .await
        .expect("Failed to create user");

    let config = test_config();
    let app = test::init_service(
        App::new()
            .app_data(Data::new(db.clone()))
            .app_data(Data::new(config.clone()))
            .configure(scorebook::web::configure),
    )
    .await;

    let pair = scorebook::token::issue_pair(&config, user.id).expect("Failed to issue pair");

    let req = test::TestRequest::post()
        .uri("/v1/auth/token/refresh")
        .set_json(json!({ "refresh": pair.refresh }))
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    let access = body["access"].as_str().expect("Missing refreshed access token");

    let req = test::TestRequest::get()
        .uri("/v1/users/me")
        .insert_header(("Authorization", format!("Bearer {}", access)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    // An access token cannot be used as a refresh token.
    let req = test::TestRequest::post()
        .uri("/v1/auth/token/refresh")
        .set_json(json!({ "refresh": pair.access }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);

    // And a refresh token is not an access token.
    let req = test::TestRequest::get()
        .uri("/v1/users/me")
        .insert_header(("Authorization", format!("Bearer {}", pair.refresh)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn test_code_is_invalidated_by_role_change() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let user = create_test_user(&db, "reader", Role::User)
        .await
        .expect("Failed to create user");

    let config = test_config();
    let code = confirmation::generate(&config, &user);

    // Promote the user; the outstanding code no longer matches their state.
    use sea_orm::{ActiveModelTrait, ActiveValue::Set};
    let mut active: scorebook::orm::users::ActiveModel = user.into();
    active.role = Set(Role::Moderator);
    let promoted = active.update(&db).await.expect("Failed to update role");

    let app = test::init_service(
        App::new()
            .app_data(Data::new(db.clone()))
            .app_data(Data::new(config.clone()))
            .configure(scorebook::web::configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/v1/auth/token")
        .set_json(json!({ "email": promoted.email, "confirmation_code": code }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}
