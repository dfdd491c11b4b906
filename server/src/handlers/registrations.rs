use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::response::Response;
use axum::Json;
use tracing::info;

use super::{json_body, path_param};
use crate::admission::RegistrationRequest;
use crate::state::AppState;
use crate::store::StoreError;
use crate::utils::error::AppError;
use crate::utils::response::{created, success};

/// Responds with the registration only; whether the companion ticket was
/// issued is logged, not returned.
pub async fn create_registration(
    State(state): State<AppState>,
    payload: Result<Json<RegistrationRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let admission = state.admission.admit(json_body(payload)?).await?;
    Ok(created(admission.registration, "Registration created"))
}

/// Unconstrained field update. This is the only way into `no-show`.
pub async fn update_registration(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<RegistrationRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let id = path_param(id)?;
    let (event_id, participant_id, status) = json_body(payload)?.validate()?;

    let registration = state
        .registrations
        .update_registration(id, event_id, participant_id, status)
        .await
        .map_err(|err| match err {
            StoreError::UniqueViolation(_) => AppError::DuplicateRegistration,
            other => AppError::Store(other),
        })?
        .ok_or_else(|| AppError::NotFound(format!("Event registration {id} was not found")))?;

    info!(registration_id = id, status = %registration.status, "Registration updated");
    Ok(success(registration, "Registration updated"))
}
