use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::response::Response;
use axum::Json;
use serde::Deserialize;

use super::{json_body, path_param};
use crate::auth::issuer::validate_email;
use crate::auth::{ensure_role, Identity};
use crate::models::participant::NewParticipant;
use crate::models::Role;
use crate::state::AppState;
use crate::store::StoreError;
use crate::utils::error::AppError;
use crate::utils::response::{created, success};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CreateParticipantRequest {
    pub full_name: String,
    pub email: String,
    pub phone: String,
}

pub async fn create_participant(
    State(state): State<AppState>,
    identity: Identity,
    payload: Result<Json<CreateParticipantRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    ensure_role(&identity, Role::ALL)?;
    let request = json_body(payload)?;

    let full_name = request.full_name.trim().to_string();
    let phone = request.phone.trim().to_string();
    if full_name.is_empty() || phone.is_empty() {
        return Err(AppError::ValidationError(
            "full_name and phone are required".to_string(),
        ));
    }
    validate_email(&request.email)?;

    let participant = state
        .participants
        .create_participant(NewParticipant {
            full_name,
            email: request.email,
            phone,
        })
        .await
        .map_err(|err| match err {
            StoreError::UniqueViolation(_) => AppError::DuplicateEmail,
            other => AppError::Store(other),
        })?;

    Ok(created(participant, "Participant created"))
}

pub async fn get_participant(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Response, AppError> {
    let id = path_param(id)?;
    let participant = state
        .participants
        .find_participant(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Participant {id} was not found")))?;
    Ok(success(participant, "Participant found"))
}
