use std::sync::Arc;

use chrono::Utc;
use rand_core::{OsRng, RngCore};
use serde::Deserialize;
use tracing::{info, warn};

use crate::models::registration::NewRegistration;
use crate::models::ticket::NewTicket;
use crate::models::{EventRegistration, RegistrationStatus, Ticket, TicketStatus, TicketType};
use crate::store::{RegistrationStore, StoreError, TicketStore};
use crate::utils::error::AppError;

const REDEMPTION_TOKEN_BYTES: usize = 16;

#[derive(Debug, Default, Deserialize)]
pub struct RegistrationRequest {
    pub event_id: Option<i64>,
    pub participant_id: Option<i64>,
    pub status: Option<String>,
}

impl RegistrationRequest {
    /// All three fields are required; the status is taken as given.
    pub(crate) fn validate(&self) -> Result<(i64, i64, RegistrationStatus), AppError> {
        let event_id = self
            .event_id
            .ok_or_else(|| AppError::ValidationError("event_id is required".to_string()))?;
        let participant_id = self
            .participant_id
            .ok_or_else(|| AppError::ValidationError("participant_id is required".to_string()))?;
        let status = self
            .status
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| AppError::ValidationError("status is required".to_string()))?
            .parse::<RegistrationStatus>()
            .map_err(|err| AppError::ValidationError(err.to_string()))?;
        Ok((event_id, participant_id, status))
    }
}

/// What happened to the companion ticket. Issuance never fails the admission.
#[derive(Debug, Clone)]
pub enum TicketIssuance {
    Issued(Ticket),
    Failed(String),
}

impl TicketIssuance {
    pub fn ticket(&self) -> Option<&Ticket> {
        match self {
            TicketIssuance::Issued(ticket) => Some(ticket),
            TicketIssuance::Failed(_) => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Admission {
    pub registration: EventRegistration,
    pub ticket: TicketIssuance,
}

pub struct AdmissionManager {
    registrations: Arc<dyn RegistrationStore>,
    tickets: Arc<dyn TicketStore>,
}

impl AdmissionManager {
    pub fn new(registrations: Arc<dyn RegistrationStore>, tickets: Arc<dyn TicketStore>) -> Self {
        Self {
            registrations,
            tickets,
        }
    }

    /// Creates the registration, then tries to mint a free, active ticket for
    /// the same pair. The two writes are not transactional.
    pub async fn admit(&self, request: RegistrationRequest) -> Result<Admission, AppError> {
        let (event_id, participant_id, status) = request.validate()?;

        let registration = self
            .registrations
            .create_registration(NewRegistration {
                event_id,
                participant_id,
                status,
                registered_at: Utc::now(),
            })
            .await
            .map_err(|err| match err {
                StoreError::UniqueViolation(_) => AppError::DuplicateRegistration,
                other => AppError::Store(other),
            })?;

        info!(
            registration_id = registration.id,
            event_id,
            participant_id,
            status = %registration.status,
            "Participant admitted"
        );

        let ticket = self.issue_companion_ticket(event_id, participant_id).await;
        Ok(Admission {
            registration,
            ticket,
        })
    }

    async fn issue_companion_ticket(&self, event_id: i64, participant_id: i64) -> TicketIssuance {
        let result = self
            .tickets
            .create_ticket(NewTicket {
                event_id,
                participant_id,
                ticket_type: TicketType::Free,
                status: TicketStatus::Active,
                redemption_token: generate_redemption_token(),
            })
            .await;

        match result {
            Ok(ticket) => {
                info!(ticket_id = ticket.id, event_id, participant_id, "Ticket issued");
                TicketIssuance::Issued(ticket)
            }
            Err(err) => {
                warn!(error = %err, event_id, participant_id, "Automatic ticket issuance failed");
                TicketIssuance::Failed(err.to_string())
            }
        }
    }
}

/// 128 random bits from the OS generator, hex-encoded.
pub fn generate_redemption_token() -> String {
    let mut bytes = [0u8; REDEMPTION_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn manager(store: &MemoryStore) -> AdmissionManager {
        AdmissionManager::new(Arc::new(store.clone()), Arc::new(store.clone()))
    }

    fn request(event_id: i64, participant_id: i64, status: &str) -> RegistrationRequest {
        RegistrationRequest {
            event_id: Some(event_id),
            participant_id: Some(participant_id),
            status: Some(status.to_string()),
        }
    }

    #[tokio::test]
    async fn admission_issues_a_free_active_ticket() {
        let store = MemoryStore::new();
        let admission = manager(&store).admit(request(1, 1, "registered")).await.unwrap();

        assert_eq!(admission.registration.status, RegistrationStatus::Registered);
        let ticket = admission.ticket.ticket().expect("ticket issued");
        assert_eq!(ticket.ticket_type, TicketType::Free);
        assert_eq!(ticket.status, TicketStatus::Active);
        assert_eq!((ticket.event_id, ticket.participant_id), (1, 1));
        assert_eq!(ticket.redemption_token.len(), 32);
    }

    #[tokio::test]
    async fn caller_supplied_status_is_kept() {
        let store = MemoryStore::new();
        let admission = manager(&store).admit(request(2, 3, "attended")).await.unwrap();
        assert_eq!(admission.registration.status, RegistrationStatus::Attended);
    }

    #[tokio::test]
    async fn missing_fields_are_rejected() {
        let store = MemoryStore::new();
        let mut req = request(1, 1, "registered");
        req.participant_id = None;
        assert!(matches!(
            manager(&store).admit(req).await,
            Err(AppError::ValidationError(_))
        ));

        let mut req = request(1, 1, "registered");
        req.status = None;
        assert!(matches!(
            manager(&store).admit(req).await,
            Err(AppError::ValidationError(_))
        ));

        assert!(matches!(
            manager(&store).admit(request(1, 1, "pending")).await,
            Err(AppError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn ticket_failure_does_not_fail_admission() {
        let store = MemoryStore::new();
        store.reject_ticket_inserts(true);

        let admission = manager(&store).admit(request(1, 1, "registered")).await.unwrap();
        assert!(matches!(admission.ticket, TicketIssuance::Failed(_)));
        assert!(store.tickets_for_pair(1, 1).await.is_empty());
        assert!(store.find_registration_by_pair(1, 1).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn second_registration_for_pair_conflicts() {
        let store = MemoryStore::new();
        let manager = manager(&store);
        manager.admit(request(1, 1, "registered")).await.unwrap();

        let err = manager.admit(request(1, 1, "registered")).await.unwrap_err();
        assert!(matches!(err, AppError::DuplicateRegistration));
        assert_eq!(store.tickets_for_pair(1, 1).await.len(), 1);
    }

    #[test]
    fn redemption_tokens_are_hex_and_distinct() {
        let a = generate_redemption_token();
        let b = generate_redemption_token();
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }
}
