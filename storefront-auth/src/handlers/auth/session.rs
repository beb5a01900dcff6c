use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::{
    dtos::auth::{LoginRequest, RefreshRequest},
    error::AppError,
    middleware::AuthUser,
    models::ClientContext,
    utils::ValidatedJson,
    AppState,
};

/// Login with email and password
pub async fn login(
    State(state): State<AppState>,
    ctx: ClientContext,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let res = state.auth_service.login(req, ctx).await?;
    Ok((StatusCode::OK, Json(res)))
}

/// Exchange a refresh token for a fresh token pair
pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> Result<impl IntoResponse, AppError> {
    let res = state.auth_service.refresh_token(&req.refresh_token).await?;
    Ok((StatusCode::OK, Json(res)))
}

/// Logout the authenticated user. Best-effort by design; always succeeds.
pub async fn logout(
    State(state): State<AppState>,
    ctx: ClientContext,
    user: AuthUser,
) -> impl IntoResponse {
    let res = state.auth_service.logout(user.0.sub, ctx).await;
    (StatusCode::OK, Json(res))
}

/// Current user, loaded fresh from the store
pub async fn me(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let claims = user.0;

    let user = state
        .db
        .find_user_with_access_by_id(claims.sub)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("User not found")))?;

    Ok(Json(user.sanitized()))
}
