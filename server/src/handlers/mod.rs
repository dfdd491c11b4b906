use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::Path;
use axum::response::Response;
use axum::Json;
use serde::Serialize;

use crate::utils::error::AppError;
use crate::utils::response::success;

pub mod auth;
pub mod organizers;
pub mod participants;
pub mod registrations;
pub mod tickets;

#[derive(Serialize)]
struct HealthPayload {
    status: &'static str,
    service: &'static str,
}

pub async fn health_check() -> Response {
    let payload = HealthPayload {
        status: "ok",
        service: "eventflow-api",
    };

    success(payload, "Health check successful")
}

/// Turns axum's JSON rejection into a `ValidationError` so malformed bodies
/// get the same envelope as every other failure.
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| AppError::ValidationError(rejection.body_text()))
}

/// Same treatment for path parameters, so `/tickets/abc` is a `ValidationError`.
pub(crate) fn path_param<T>(param: Result<Path<T>, PathRejection>) -> Result<T, AppError> {
    param
        .map(|Path(value)| value)
        .map_err(|rejection| AppError::ValidationError(rejection.body_text()))
}
