//! Password lifecycle: change, forgot and reset against live PostgreSQL.

mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use serde_json::json;

#[tokio::test]
#[ignore = "requires a running PostgreSQL"]
async fn forgot_password_stores_a_short_lived_token() {
    let app = common::spawn().await;
    let email = common::unique_email("reset");
    common::register_user(&app, &email, "Reset").await;

    let (status, body) = common::send(
        &app.router,
        "POST",
        "/auth/forgot-password",
        None,
        Some(json!({ "email": email })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let user = app.db.find_user_by_email(&email).await.unwrap().unwrap();
    let token = user.reset_token.expect("reset token not stored");
    assert_eq!(token.len(), 64);

    let expires_at = user.reset_token_expires_at.expect("expiry not stored");
    let remaining = expires_at - Utc::now();
    assert!(remaining > Duration::minutes(14));
    assert!(remaining <= Duration::minutes(15));

    // Unknown email: same status, byte-identical message.
    let ghost = common::unique_email("ghost");
    let (ghost_status, ghost_body) = common::send(
        &app.router,
        "POST",
        "/auth/forgot-password",
        None,
        Some(json!({ "email": ghost })),
    )
    .await;
    assert_eq!(ghost_status, StatusCode::OK);
    assert_eq!(ghost_body["message"], body["message"]);
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL"]
async fn reset_token_is_consumable_exactly_once() {
    let app = common::spawn().await;
    let email = common::unique_email("consume");
    common::register_user(&app, &email, "Consume").await;

    common::send(
        &app.router,
        "POST",
        "/auth/forgot-password",
        None,
        Some(json!({ "email": email })),
    )
    .await;

    let user = app.db.find_user_by_email(&email).await.unwrap().unwrap();
    let token = user.reset_token.unwrap();

    let new_password = "NewSecret#1pass";
    let (status, _) = common::send(
        &app.router,
        "POST",
        "/auth/reset-password",
        None,
        Some(json!({ "token": token, "new_password": new_password })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Token and expiry were cleared together.
    let user = app.db.find_user_by_email(&email).await.unwrap().unwrap();
    assert!(user.reset_token.is_none());
    assert!(user.reset_token_expires_at.is_none());

    // Old password is dead, new one works.
    let (status, _) = common::login_user(&app, &email, common::TEST_PASSWORD).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = common::login_user(&app, &email, new_password).await;
    assert_eq!(status, StatusCode::OK);

    // Replaying the consumed token fails.
    let (status, body) = common::send(
        &app.router,
        "POST",
        "/auth/reset-password",
        None,
        Some(json!({ "token": token, "new_password": "AnotherSecret#1" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid or expired reset token");
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL"]
async fn expired_reset_token_is_rejected() {
    let app = common::spawn().await;
    let email = common::unique_email("expired");
    common::register_user(&app, &email, "Expired").await;

    common::send(
        &app.router,
        "POST",
        "/auth/forgot-password",
        None,
        Some(json!({ "email": email })),
    )
    .await;

    // Force the deadline into the past.
    sqlx::query("UPDATE users SET reset_token_expires_at = now() - interval '1 minute' WHERE email = $1")
        .bind(&email)
        .execute(app.db.pool())
        .await
        .unwrap();

    let user = app.db.find_user_by_email(&email).await.unwrap().unwrap();
    let token = user.reset_token.unwrap();

    let (status, body) = common::send(
        &app.router,
        "POST",
        "/auth/reset-password",
        None,
        Some(json!({ "token": token, "new_password": "AnotherSecret#1" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid or expired reset token");
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL"]
async fn newer_reset_request_supersedes_older_token() {
    let app = common::spawn().await;
    let email = common::unique_email("super");
    common::register_user(&app, &email, "Super").await;

    common::send(
        &app.router,
        "POST",
        "/auth/forgot-password",
        None,
        Some(json!({ "email": email })),
    )
    .await;
    let first = app
        .db
        .find_user_by_email(&email)
        .await
        .unwrap()
        .unwrap()
        .reset_token
        .unwrap();

    common::send(
        &app.router,
        "POST",
        "/auth/forgot-password",
        None,
        Some(json!({ "email": email })),
    )
    .await;

    // Last writer wins; the first token is now unknown to the store.
    let (status, _) = common::send(
        &app.router,
        "POST",
        "/auth/reset-password",
        None,
        Some(json!({ "token": first, "new_password": "AnotherSecret#1" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL"]
async fn change_password_requires_the_current_one() {
    let app = common::spawn().await;
    let email = common::unique_email("change");
    let body = common::register_user(&app, &email, "Change").await;
    let access_token = body["tokens"]["access_token"].as_str().unwrap();

    // Wrong current password.
    let (status, body) = common::send(
        &app.router,
        "PUT",
        "/auth/change-password",
        Some(access_token),
        Some(json!({ "current_password": "Nope#12345", "new_password": "Changed#1pass" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Current password is incorrect");

    // Correct current password.
    let (status, _) = common::send(
        &app.router,
        "PUT",
        "/auth/change-password",
        Some(access_token),
        Some(json!({ "current_password": common::TEST_PASSWORD, "new_password": "Changed#1pass" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = common::login_user(&app, &email, common::TEST_PASSWORD).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = common::login_user(&app, &email, "Changed#1pass").await;
    assert_eq!(status, StatusCode::OK);
}
