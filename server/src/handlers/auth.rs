use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::Response;
use axum::Json;

use super::json_body;
use crate::auth::{Identity, LoginRequest, RefreshRequest, RegisterRequest};
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::{created, success};

pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let session = state.issuer.register(json_body(payload)?).await?;
    Ok(created(session, "Registration successful"))
}

pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let session = state.issuer.login(json_body(payload)?).await?;
    Ok(success(session, "Login successful"))
}

pub async fn refresh(
    State(state): State<AppState>,
    payload: Result<Json<RefreshRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let request = json_body(payload)?;
    let session = state.refresher.refresh(&request.refresh_token).await?;
    Ok(success(session, "Access token refreshed"))
}

pub async fn current_user(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Response, AppError> {
    let organizer = state
        .organizers
        .find_organizer(identity.organizer_id)
        .await?
        .ok_or(AppError::SubjectGone)?;
    Ok(success(organizer, "Current user"))
}
