use async_trait::async_trait;
use sqlx::PgPool;

use super::{
    OrganizerStore, ParticipantStore, RegistrationStore, StoreError, StoreResult, TicketStore,
};
use crate::models::organizer::{NewOrganizer, OrganizerChanges};
use crate::models::participant::NewParticipant;
use crate::models::registration::NewRegistration;
use crate::models::ticket::NewTicket;
use crate::models::{
    EventRegistration, Organizer, Participant, RegistrationStatus, Ticket, TicketStatus,
    TicketType,
};

const ORGANIZER_COLUMNS: &str =
    "id, name, email, password_hash, role, refresh_token, created_at, updated_at";
const PARTICIPANT_COLUMNS: &str = "id, full_name, email, phone, created_at, updated_at";
const REGISTRATION_COLUMNS: &str =
    "id, event_id, participant_id, status, registered_at, created_at, updated_at";
const TICKET_COLUMNS: &str =
    "id, event_id, participant_id, ticket_type, status, redemption_token, created_at, updated_at";

/// Postgres-backed store sharing one connection pool across all entities.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_write_error(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            StoreError::UniqueViolation(db.constraint().unwrap_or("unique").to_string())
        }
        _ => StoreError::Database(err),
    }
}

#[async_trait]
impl OrganizerStore for PgStore {
    async fn create_organizer(&self, organizer: NewOrganizer) -> StoreResult<Organizer> {
        sqlx::query_as::<_, Organizer>(&format!(
            "INSERT INTO organizers (name, email, password_hash, role)
             VALUES ($1, $2, $3, $4)
             RETURNING {ORGANIZER_COLUMNS}"
        ))
        .bind(organizer.name)
        .bind(organizer.email)
        .bind(organizer.password_hash)
        .bind(organizer.role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)
    }

    async fn find_organizer(&self, id: i64) -> StoreResult<Option<Organizer>> {
        let row = sqlx::query_as::<_, Organizer>(&format!(
            "SELECT {ORGANIZER_COLUMNS} FROM organizers WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn find_organizer_by_email(&self, email: &str) -> StoreResult<Option<Organizer>> {
        let row = sqlx::query_as::<_, Organizer>(&format!(
            "SELECT {ORGANIZER_COLUMNS} FROM organizers WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn set_refresh_token(&self, id: i64, token: &str) -> StoreResult<()> {
        sqlx::query("UPDATE organizers SET refresh_token = $1, updated_at = NOW() WHERE id = $2")
            .bind(token)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn update_organizer(
        &self,
        id: i64,
        changes: OrganizerChanges,
    ) -> StoreResult<Option<Organizer>> {
        sqlx::query_as::<_, Organizer>(&format!(
            "UPDATE organizers SET name = $1, email = $2, role = $3, updated_at = NOW()
             WHERE id = $4
             RETURNING {ORGANIZER_COLUMNS}"
        ))
        .bind(changes.name)
        .bind(changes.email)
        .bind(changes.role.as_str())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_write_error)
    }

    async fn delete_organizer(&self, id: i64) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM organizers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl ParticipantStore for PgStore {
    async fn create_participant(&self, participant: NewParticipant) -> StoreResult<Participant> {
        sqlx::query_as::<_, Participant>(&format!(
            "INSERT INTO participants (full_name, email, phone)
             VALUES ($1, $2, $3)
             RETURNING {PARTICIPANT_COLUMNS}"
        ))
        .bind(participant.full_name)
        .bind(participant.email)
        .bind(participant.phone)
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)
    }

    async fn find_participant(&self, id: i64) -> StoreResult<Option<Participant>> {
        let row = sqlx::query_as::<_, Participant>(&format!(
            "SELECT {PARTICIPANT_COLUMNS} FROM participants WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }
}

#[async_trait]
impl RegistrationStore for PgStore {
    async fn create_registration(
        &self,
        registration: NewRegistration,
    ) -> StoreResult<EventRegistration> {
        sqlx::query_as::<_, EventRegistration>(&format!(
            "INSERT INTO event_registrations (event_id, participant_id, status, registered_at)
             VALUES ($1, $2, $3, $4)
             RETURNING {REGISTRATION_COLUMNS}"
        ))
        .bind(registration.event_id)
        .bind(registration.participant_id)
        .bind(registration.status.as_str())
        .bind(registration.registered_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)
    }

    async fn find_registration_by_pair(
        &self,
        event_id: i64,
        participant_id: i64,
    ) -> StoreResult<Option<EventRegistration>> {
        let row = sqlx::query_as::<_, EventRegistration>(&format!(
            "SELECT {REGISTRATION_COLUMNS} FROM event_registrations
             WHERE event_id = $1 AND participant_id = $2
             ORDER BY id
             LIMIT 1"
        ))
        .bind(event_id)
        .bind(participant_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn set_registration_status(
        &self,
        id: i64,
        status: RegistrationStatus,
    ) -> StoreResult<Option<EventRegistration>> {
        let row = sqlx::query_as::<_, EventRegistration>(&format!(
            "UPDATE event_registrations SET status = $1, updated_at = NOW()
             WHERE id = $2
             RETURNING {REGISTRATION_COLUMNS}"
        ))
        .bind(status.as_str())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn update_registration(
        &self,
        id: i64,
        event_id: i64,
        participant_id: i64,
        status: RegistrationStatus,
    ) -> StoreResult<Option<EventRegistration>> {
        sqlx::query_as::<_, EventRegistration>(&format!(
            "UPDATE event_registrations
             SET event_id = $1, participant_id = $2, status = $3, updated_at = NOW()
             WHERE id = $4
             RETURNING {REGISTRATION_COLUMNS}"
        ))
        .bind(event_id)
        .bind(participant_id)
        .bind(status.as_str())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_write_error)
    }
}

#[async_trait]
impl TicketStore for PgStore {
    async fn create_ticket(&self, ticket: NewTicket) -> StoreResult<Ticket> {
        sqlx::query_as::<_, Ticket>(&format!(
            "INSERT INTO tickets (event_id, participant_id, ticket_type, status, redemption_token)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {TICKET_COLUMNS}"
        ))
        .bind(ticket.event_id)
        .bind(ticket.participant_id)
        .bind(ticket.ticket_type.as_str())
        .bind(ticket.status.as_str())
        .bind(ticket.redemption_token)
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)
    }

    async fn find_ticket(&self, id: i64) -> StoreResult<Option<Ticket>> {
        let row = sqlx::query_as::<_, Ticket>(&format!(
            "SELECT {TICKET_COLUMNS} FROM tickets WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn find_ticket_by_redemption_token(&self, token: &str) -> StoreResult<Option<Ticket>> {
        let row = sqlx::query_as::<_, Ticket>(&format!(
            "SELECT {TICKET_COLUMNS} FROM tickets WHERE redemption_token = $1"
        ))
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn update_ticket(
        &self,
        id: i64,
        ticket_type: TicketType,
        status: TicketStatus,
    ) -> StoreResult<Option<Ticket>> {
        let row = sqlx::query_as::<_, Ticket>(&format!(
            "UPDATE tickets SET ticket_type = $1, status = $2, updated_at = NOW()
             WHERE id = $3
             RETURNING {TICKET_COLUMNS}"
        ))
        .bind(ticket_type.as_str())
        .bind(status.as_str())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }
}
