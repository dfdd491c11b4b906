use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::response::Response;
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use super::{json_body, path_param};
use crate::auth::issuer::validate_email;
use crate::auth::{ensure_role, Identity};
use crate::models::organizer::OrganizerChanges;
use crate::models::Role;
use crate::state::AppState;
use crate::store::StoreError;
use crate::utils::error::AppError;
use crate::utils::response::success;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateOrganizerRequest {
    pub name: String,
    pub email: String,
    pub role: String,
}

/// Admin-only. Changing `role` invalidates the organizer's outstanding access tokens.
pub async fn update_organizer(
    State(state): State<AppState>,
    identity: Identity,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<UpdateOrganizerRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    ensure_role(&identity, &[Role::Admin])?;
    let id = path_param(id)?;
    let request = json_body(payload)?;

    let name = request.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::ValidationError("Name is required".to_string()));
    }
    validate_email(&request.email)?;
    let role: Role = request.role.parse().map_err(|_| {
        AppError::ValidationError("Role must be either 'admin' or 'organizer'".to_string())
    })?;

    let organizer = state
        .organizers
        .update_organizer(
            id,
            OrganizerChanges {
                name,
                email: request.email,
                role,
            },
        )
        .await
        .map_err(|err| match err {
            StoreError::UniqueViolation(_) => AppError::DuplicateEmail,
            other => AppError::Store(other),
        })?
        .ok_or_else(|| AppError::NotFound(format!("Organizer {id} was not found")))?;

    info!(
        organizer_id = organizer.id,
        role = %organizer.role,
        updated_by = identity.organizer_id,
        "Organizer updated"
    );
    Ok(success(organizer, "Organizer updated"))
}

/// Admin-only. Tokens already issued to the organizer stop working on their next use.
pub async fn delete_organizer(
    State(state): State<AppState>,
    identity: Identity,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Response, AppError> {
    ensure_role(&identity, &[Role::Admin])?;
    let id = path_param(id)?;

    if !state.organizers.delete_organizer(id).await? {
        return Err(AppError::NotFound(format!("Organizer {id} was not found")));
    }

    info!(organizer_id = id, deleted_by = identity.organizer_id, "Organizer deleted");
    Ok(success(json!({ "id": id }), "Organizer deleted"))
}
