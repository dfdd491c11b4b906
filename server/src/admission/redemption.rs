use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::models::{RegistrationStatus, Ticket, TicketStatus};
use crate::store::{RegistrationStore, TicketStore};
use crate::utils::error::AppError;

#[derive(Debug, Clone, Serialize)]
pub struct Redemption {
    pub ticket: Ticket,
    pub attendance_marked: bool,
}

/// Marks attendance by redemption token. The ticket itself is never modified,
/// so redeeming the same token again re-applies the same outcome.
pub struct RedemptionHandler {
    registrations: Arc<dyn RegistrationStore>,
    tickets: Arc<dyn TicketStore>,
}

impl RedemptionHandler {
    pub fn new(registrations: Arc<dyn RegistrationStore>, tickets: Arc<dyn TicketStore>) -> Self {
        Self {
            registrations,
            tickets,
        }
    }

    pub async fn lookup(&self, token: &str) -> Result<Ticket, AppError> {
        if token.trim().is_empty() {
            return Err(AppError::ValidationError(
                "Redemption token is required".to_string(),
            ));
        }
        self.tickets
            .find_ticket_by_redemption_token(token)
            .await?
            .ok_or(AppError::TicketNotFound)
    }

    pub async fn redeem(&self, token: &str) -> Result<Redemption, AppError> {
        let ticket = self.lookup(token).await?;
        if ticket.status == TicketStatus::Canceled {
            return Err(AppError::TicketCanceled);
        }

        // Registration and ticket are linked only by the (event, participant) pair.
        let registration = self
            .registrations
            .find_registration_by_pair(ticket.event_id, ticket.participant_id)
            .await?;

        let attendance_marked = match registration {
            Some(registration) => self
                .registrations
                .set_registration_status(registration.id, RegistrationStatus::Attended)
                .await?
                .is_some(),
            None => false,
        };

        info!(
            ticket_id = ticket.id,
            event_id = ticket.event_id,
            participant_id = ticket.participant_id,
            attendance_marked,
            "Ticket redeemed"
        );

        Ok(Redemption {
            ticket,
            attendance_marked,
        })
    }
}
