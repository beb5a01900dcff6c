//! Refresh token behavior against live PostgreSQL.

mod common;

use axum::http::StatusCode;
use serde_json::json;

#[tokio::test]
#[ignore = "requires a running PostgreSQL"]
async fn refresh_issues_a_brand_new_pair() {
    let app = common::spawn().await;
    let email = common::unique_email("fresh");
    let body = common::register_user(&app, &email, "Fresh").await;
    let refresh_token = body["tokens"]["refresh_token"].as_str().unwrap();

    let (status, refreshed) = common::send(
        &app.router,
        "POST",
        "/auth/refresh",
        None,
        Some(json!({ "refresh_token": refresh_token })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let access = refreshed["access_token"].as_str().unwrap();
    let claims = app.state.jwt.validate_access_token(access).unwrap();
    assert_eq!(claims.email, email.as_str());
    assert!(refreshed["refresh_token"].as_str().is_some());

    // No rotation chain: the original refresh token remains independently
    // valid until its own expiry.
    let (status, _) = common::send(
        &app.router,
        "POST",
        "/auth/refresh",
        None,
        Some(json!({ "refresh_token": refresh_token })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL"]
async fn refresh_reflects_the_current_role() {
    let app = common::spawn().await;
    let email = common::unique_email("promoted");
    let body = common::register_user(&app, &email, "Promoted").await;
    let refresh_token = body["tokens"]["refresh_token"].as_str().unwrap();

    // Promote the user behind the session's back.
    let admin_role_id: uuid::Uuid =
        sqlx::query_scalar("SELECT id FROM roles WHERE name = 'admin'")
            .fetch_one(app.db.pool())
            .await
            .unwrap();
    sqlx::query("UPDATE users SET role_id = $2 WHERE email = $1")
        .bind(&email)
        .bind(admin_role_id)
        .execute(app.db.pool())
        .await
        .unwrap();

    let (status, refreshed) = common::send(
        &app.router,
        "POST",
        "/auth/refresh",
        None,
        Some(json!({ "refresh_token": refresh_token })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Claims come from the store as it is now, not as it was at login.
    let access = refreshed["access_token"].as_str().unwrap();
    let claims = app.state.jwt.validate_access_token(access).unwrap();
    assert_eq!(claims.role, "admin");
    assert_eq!(
        claims.permissions,
        common::role_permission_keys(&app, admin_role_id).await
    );
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL"]
async fn refresh_rejects_foreign_and_suspended_subjects() {
    let app = common::spawn().await;
    let email = common::unique_email("revoked");
    let body = common::register_user(&app, &email, "Revoked").await;
    let access_token = body["tokens"]["access_token"].as_str().unwrap();
    let refresh_token = body["tokens"]["refresh_token"].as_str().unwrap();

    // Garbage is rejected.
    let (status, body_err) = common::send(
        &app.router,
        "POST",
        "/auth/refresh",
        None,
        Some(json!({ "refresh_token": "not-a-token" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body_err["error"], "Invalid refresh token");

    // An access token is not a refresh token, even though it is validly signed.
    let (status, _) = common::send(
        &app.router,
        "POST",
        "/auth/refresh",
        None,
        Some(json!({ "refresh_token": access_token })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // A suspended subject cannot refresh.
    sqlx::query("UPDATE users SET status = 'SUSPENDED' WHERE email = $1")
        .bind(&email)
        .execute(app.db.pool())
        .await
        .unwrap();

    let (status, body_err) = common::send(
        &app.router,
        "POST",
        "/auth/refresh",
        None,
        Some(json!({ "refresh_token": refresh_token })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body_err["error"], "Invalid refresh token");
}
