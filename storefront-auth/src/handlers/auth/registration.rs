use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::{
    dtos::auth::RegisterRequest, error::AppError, models::ClientContext, utils::ValidatedJson,
    AppState,
};

/// Register a new account and issue its first token pair.
pub async fn register(
    State(state): State<AppState>,
    ctx: ClientContext,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let res = state.auth_service.register(req, ctx).await?;
    Ok((StatusCode::CREATED, Json(res)))
}
