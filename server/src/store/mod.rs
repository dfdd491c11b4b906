//! Persistence seams. Every operation the core needs from the relational store
//! is expressed as an async trait so the flows can run against Postgres in
//! production and against [`MemoryStore`] in tests.

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::organizer::{NewOrganizer, OrganizerChanges};
use crate::models::participant::NewParticipant;
use crate::models::registration::NewRegistration;
use crate::models::ticket::NewTicket;
use crate::models::{
    EventRegistration, Organizer, Participant, RegistrationStatus, Ticket, TicketStatus,
    TicketType,
};

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique constraint rejected the write; carries the constraint or field name.
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait OrganizerStore: Send + Sync {
    async fn create_organizer(&self, organizer: NewOrganizer) -> StoreResult<Organizer>;
    async fn find_organizer(&self, id: i64) -> StoreResult<Option<Organizer>>;
    async fn find_organizer_by_email(&self, email: &str) -> StoreResult<Option<Organizer>>;
    /// Overwrites the single refresh-token slot.
    async fn set_refresh_token(&self, id: i64, token: &str) -> StoreResult<()>;
    async fn update_organizer(
        &self,
        id: i64,
        changes: OrganizerChanges,
    ) -> StoreResult<Option<Organizer>>;
    /// Returns whether a row was removed.
    async fn delete_organizer(&self, id: i64) -> StoreResult<bool>;
}

#[async_trait]
pub trait ParticipantStore: Send + Sync {
    async fn create_participant(&self, participant: NewParticipant) -> StoreResult<Participant>;
    async fn find_participant(&self, id: i64) -> StoreResult<Option<Participant>>;
}

#[async_trait]
pub trait RegistrationStore: Send + Sync {
    async fn create_registration(
        &self,
        registration: NewRegistration,
    ) -> StoreResult<EventRegistration>;
    async fn find_registration_by_pair(
        &self,
        event_id: i64,
        participant_id: i64,
    ) -> StoreResult<Option<EventRegistration>>;
    async fn set_registration_status(
        &self,
        id: i64,
        status: RegistrationStatus,
    ) -> StoreResult<Option<EventRegistration>>;
    async fn update_registration(
        &self,
        id: i64,
        event_id: i64,
        participant_id: i64,
        status: RegistrationStatus,
    ) -> StoreResult<Option<EventRegistration>>;
}

#[async_trait]
pub trait TicketStore: Send + Sync {
    async fn create_ticket(&self, ticket: NewTicket) -> StoreResult<Ticket>;
    async fn find_ticket(&self, id: i64) -> StoreResult<Option<Ticket>>;
    async fn find_ticket_by_redemption_token(&self, token: &str) -> StoreResult<Option<Ticket>>;
    async fn update_ticket(
        &self,
        id: i64,
        ticket_type: TicketType,
        status: TicketStatus,
    ) -> StoreResult<Option<Ticket>>;
}

/// Convenience bound for a backend that serves every entity.
pub trait Store: OrganizerStore + ParticipantStore + RegistrationStore + TicketStore {}

impl<T> Store for T where T: OrganizerStore + ParticipantStore + RegistrationStore + TicketStore {}
