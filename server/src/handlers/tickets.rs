use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::response::Response;
use axum::Json;
use serde::Deserialize;
use tracing::info;

use super::{json_body, path_param};
use crate::admission::generate_redemption_token;
use crate::auth::{ensure_role, Identity};
use crate::models::ticket::NewTicket;
use crate::models::{Role, TicketStatus, TicketType};
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::{created, success};

#[derive(Debug, Default, Deserialize)]
pub struct CreateTicketRequest {
    pub event_id: Option<i64>,
    pub participant_id: Option<i64>,
    #[serde(default)]
    pub ticket_type: String,
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateTicketRequest {
    pub ticket_type: String,
    pub status: String,
}

fn parse_kind(ticket_type: &str, status: &str) -> Result<(TicketType, TicketStatus), AppError> {
    let ticket_type = ticket_type.parse().map_err(|_| {
        AppError::ValidationError("Ticket type must be either 'free' or 'paid'".to_string())
    })?;
    let status = status.parse().map_err(|_| {
        AppError::ValidationError("Status must be either 'active' or 'canceled'".to_string())
    })?;
    Ok((ticket_type, status))
}

pub async fn create_ticket(
    State(state): State<AppState>,
    identity: Identity,
    payload: Result<Json<CreateTicketRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    ensure_role(&identity, Role::ALL)?;
    let request = json_body(payload)?;

    let (Some(event_id), Some(participant_id)) = (request.event_id, request.participant_id) else {
        return Err(AppError::ValidationError(
            "event_id and participant_id are required".to_string(),
        ));
    };
    let (ticket_type, status) = parse_kind(&request.ticket_type, &request.status)?;

    let ticket = state
        .tickets
        .create_ticket(NewTicket {
            event_id,
            participant_id,
            ticket_type,
            status,
            redemption_token: generate_redemption_token(),
        })
        .await?;

    info!(ticket_id = ticket.id, event_id, participant_id, "Ticket created");
    Ok(created(ticket, "Ticket created"))
}

/// The only path that cancels (or reactivates) a ticket.
pub async fn update_ticket(
    State(state): State<AppState>,
    identity: Identity,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<UpdateTicketRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    ensure_role(&identity, Role::ALL)?;
    let id = path_param(id)?;
    let request = json_body(payload)?;
    let (ticket_type, status) = parse_kind(&request.ticket_type, &request.status)?;

    let ticket = state
        .tickets
        .update_ticket(id, ticket_type, status)
        .await?
        .ok_or(AppError::TicketNotFound)?;

    info!(ticket_id = id, status = %ticket.status, "Ticket updated");
    Ok(success(ticket, "Ticket updated"))
}

pub async fn get_ticket(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Response, AppError> {
    let id = path_param(id)?;
    let ticket = state
        .tickets
        .find_ticket(id)
        .await?
        .ok_or(AppError::TicketNotFound)?;
    Ok(success(ticket, "Ticket found"))
}

pub async fn get_ticket_by_token(
    State(state): State<AppState>,
    token: Result<Path<String>, PathRejection>,
) -> Result<Response, AppError> {
    let token = path_param(token)?;
    let ticket = state.redemption.lookup(&token).await?;
    Ok(success(ticket, "Ticket found"))
}

pub async fn redeem_ticket(
    State(state): State<AppState>,
    token: Result<Path<String>, PathRejection>,
) -> Result<Response, AppError> {
    let token = path_param(token)?;
    let redemption = state.redemption.redeem(&token).await?;
    Ok(success(
        redemption,
        "Ticket successfully used. Attendance recorded.",
    ))
}
