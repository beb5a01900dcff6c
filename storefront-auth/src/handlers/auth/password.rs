use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::{
    dtos::auth::{ChangePasswordRequest, ForgotPasswordRequest, ResetPasswordRequest},
    error::AppError,
    middleware::AuthUser,
    models::ClientContext,
    utils::ValidatedJson,
    AppState,
};

/// Change the authenticated user's password
pub async fn change_password(
    State(state): State<AppState>,
    ctx: ClientContext,
    user: AuthUser,
    ValidatedJson(req): ValidatedJson<ChangePasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    let res = state
        .auth_service
        .change_password(user.0.sub, &req.current_password, &req.new_password, ctx)
        .await?;
    Ok((StatusCode::OK, Json(res)))
}

/// Start a password reset. The response is identical whether or not the
/// email is registered.
pub async fn forgot_password(
    State(state): State<AppState>,
    ctx: ClientContext,
    ValidatedJson(req): ValidatedJson<ForgotPasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    let res = state.auth_service.forgot_password(&req.email, ctx).await?;
    Ok((StatusCode::OK, Json(res)))
}

/// Complete a password reset with a previously issued token
pub async fn reset_password(
    State(state): State<AppState>,
    ctx: ClientContext,
    ValidatedJson(req): ValidatedJson<ResetPasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    let res = state
        .auth_service
        .reset_password(&req.token, &req.new_password, ctx)
        .await?;
    Ok((StatusCode::OK, Json(res)))
}
