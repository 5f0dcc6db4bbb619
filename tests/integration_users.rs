mod common;

use axum::http::StatusCode;
use greenlight::greenlight_core::permissions::MOVIES_READ;
use greenlight::greenlight_models::TokenScope;
use greenlight::modules::tokens::service::TokenService;
use serde_json::json;
use common::{
    create_test_user, create_test_user_with_password, generate_unique_email, json_request,
    setup_test_app, token_from_email, wait_for_mail,
};

#[tokio::test]
async fn test_register_activate_and_use_account() {
    let app = setup_test_app();
    let email = generate_unique_email();

    let response = app
        .send(json_request(
            "POST",
            "/v1/users",
            json!({ "name": "Alice Smith", "email": email, "password": "pa55word1234" }),
            None,
        ))
        .await;
    assert_eq!(response.status, StatusCode::ACCEPTED);
    assert_eq!(response.body["user"]["email"], email);
    assert_eq!(response.body["user"]["activated"], false);
    assert!(response.body["user"].get("password_hash").is_none());
    let user_id = response.body["user"]["id"].as_i64().unwrap();

    let permissions = app.state.models.permissions.get_all_for_user(user_id).await.unwrap();
    assert!(permissions.includes(MOVIES_READ));

    let mail = wait_for_mail(&app.mailer, 1).await;
    assert_eq!(mail[0].to, email);
    assert_eq!(mail[0].subject, "Welcome to Greenlight!");
    let activation_token = token_from_email(&mail[0]);

    let response = app
        .send(json_request(
            "PUT",
            "/v1/users/activated",
            json!({ "token": activation_token }),
            None,
        ))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["user"]["activated"], true);

    // Activation tokens are single use.
    let response = app
        .send(json_request(
            "PUT",
            "/v1/users/activated",
            json!({ "token": activation_token }),
            None,
        ))
        .await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response.body["error"]["fields"]["token"].is_string());

    let response = app
        .send(json_request(
            "POST",
            "/v1/tokens/authentication",
            json!({ "email": email, "password": "pa55word1234" }),
            None,
        ))
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
    let token = response.body["authentication_token"]["token"].as_str().unwrap();

    let response = app.send(common::get_with_token("/v1/movies", token)).await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_register_duplicate_email() {
    let app = setup_test_app();
    let existing = create_test_user(&app.state, true, &[]).await;

    let response = app
        .send(json_request(
            "POST",
            "/v1/users",
            json!({ "name": "Bob", "email": existing.email.to_uppercase(), "password": "pa55word1234" }),
            None,
        ))
        .await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response.body["error"]["fields"]["email"].is_string());
}

#[tokio::test]
async fn test_register_validation_and_unknown_fields() {
    let app = setup_test_app();

    let response = app
        .send(json_request(
            "POST",
            "/v1/users",
            json!({ "name": "", "email": "not-an-email", "password": "short" }),
            None,
        ))
        .await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    let fields = &response.body["error"]["fields"];
    assert!(fields["name"].is_string());
    assert!(fields["email"].is_string());
    assert!(fields["password"].is_string());

    let response = app
        .send(json_request(
            "POST",
            "/v1/users",
            json!({ "name": "Eve", "email": generate_unique_email(), "password": "pa55word1234", "admin": true }),
            None,
        ))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_resend_activation_token() {
    let app = setup_test_app();
    let user = create_test_user(&app.state, false, &[]).await;

    let response = app
        .send(json_request(
            "POST",
            "/v1/tokens/activation",
            json!({ "email": user.email }),
            None,
        ))
        .await;
    assert_eq!(response.status, StatusCode::ACCEPTED);

    let mail = wait_for_mail(&app.mailer, 1).await;
    let token = token_from_email(&mail[0]);
    let owner = TokenService::get_for_token(&app.state.models, TokenScope::Activation, &token)
        .await
        .unwrap();
    assert_eq!(owner.id, user.id);

    let activated = create_test_user(&app.state, true, &[]).await;
    let response = app
        .send(json_request(
            "POST",
            "/v1/tokens/activation",
            json!({ "email": activated.email }),
            None,
        ))
        .await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);

    let response = app
        .send(json_request(
            "POST",
            "/v1/tokens/activation",
            json!({ "email": "missing@example.com" }),
            None,
        ))
        .await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response.body["error"]["fields"]["email"].is_string());
}

#[tokio::test]
async fn test_password_reset_flow() {
    let app = setup_test_app();
    let user = create_test_user_with_password(&app.state, "old-pa55word", true).await;

    let response = app
        .send(json_request(
            "POST",
            "/v1/tokens/password-reset",
            json!({ "email": user.email }),
            None,
        ))
        .await;
    assert_eq!(response.status, StatusCode::ACCEPTED);

    let mail = wait_for_mail(&app.mailer, 1).await;
    assert_eq!(mail[0].subject, "Reset your Greenlight password");
    let reset_token = token_from_email(&mail[0]);

    let response = app
        .send(json_request(
            "PUT",
            "/v1/users/password",
            json!({ "password": "new-pa55word", "token": reset_token }),
            None,
        ))
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let response = app
        .send(json_request(
            "POST",
            "/v1/tokens/authentication",
            json!({ "email": user.email, "password": "old-pa55word" }),
            None,
        ))
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let response = app
        .send(json_request(
            "POST",
            "/v1/tokens/authentication",
            json!({ "email": user.email, "password": "new-pa55word" }),
            None,
        ))
        .await;
    assert_eq!(response.status, StatusCode::CREATED);

    // The reset token was revoked on use.
    let response = app
        .send(json_request(
            "PUT",
            "/v1/users/password",
            json!({ "password": "third-pa55word", "token": reset_token }),
            None,
        ))
        .await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_password_reset_requires_activated_account() {
    let app = setup_test_app();
    let user = create_test_user(&app.state, false, &[]).await;

    let response = app
        .send(json_request(
            "POST",
            "/v1/tokens/password-reset",
            json!({ "email": user.email }),
            None,
        ))
        .await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(app.mailer.sent().is_empty());
}
