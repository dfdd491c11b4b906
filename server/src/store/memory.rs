use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

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

#[derive(Default)]
struct Tables {
    next_id: i64,
    organizers: BTreeMap<i64, Organizer>,
    participants: BTreeMap<i64, Participant>,
    registrations: BTreeMap<i64, EventRegistration>,
    tickets: BTreeMap<i64, Ticket>,
}

impl Tables {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// In-process store enforcing the same unique constraints as the Postgres schema.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Tables>>,
    reject_tickets: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent ticket insert fail, for exercising best-effort issuance.
    pub fn reject_ticket_inserts(&self, reject: bool) {
        self.reject_tickets.store(reject, Ordering::SeqCst);
    }

    pub async fn tickets_for_pair(&self, event_id: i64, participant_id: i64) -> Vec<Ticket> {
        let guard = self.inner.lock().await;
        guard
            .tickets
            .values()
            .filter(|t| t.event_id == event_id && t.participant_id == participant_id)
            .cloned()
            .collect()
    }

    pub async fn organizer_count(&self) -> usize {
        self.inner.lock().await.organizers.len()
    }
}

#[async_trait]
impl OrganizerStore for MemoryStore {
    async fn create_organizer(&self, organizer: NewOrganizer) -> StoreResult<Organizer> {
        let mut guard = self.inner.lock().await;
        if guard.organizers.values().any(|o| o.email == organizer.email) {
            return Err(StoreError::UniqueViolation("organizers_email_key".to_string()));
        }

        let now = Utc::now();
        let id = guard.allocate_id();
        let row = Organizer {
            id,
            name: organizer.name,
            email: organizer.email,
            password_hash: organizer.password_hash,
            role: organizer.role,
            refresh_token: None,
            created_at: now,
            updated_at: now,
        };
        guard.organizers.insert(id, row.clone());
        Ok(row)
    }

    async fn find_organizer(&self, id: i64) -> StoreResult<Option<Organizer>> {
        Ok(self.inner.lock().await.organizers.get(&id).cloned())
    }

    async fn find_organizer_by_email(&self, email: &str) -> StoreResult<Option<Organizer>> {
        let guard = self.inner.lock().await;
        Ok(guard.organizers.values().find(|o| o.email == email).cloned())
    }

    async fn set_refresh_token(&self, id: i64, token: &str) -> StoreResult<()> {
        let mut guard = self.inner.lock().await;
        if let Some(row) = guard.organizers.get_mut(&id) {
            row.refresh_token = Some(token.to_string());
            row.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn update_organizer(
        &self,
        id: i64,
        changes: OrganizerChanges,
    ) -> StoreResult<Option<Organizer>> {
        let mut guard = self.inner.lock().await;
        if guard
            .organizers
            .values()
            .any(|o| o.id != id && o.email == changes.email)
        {
            return Err(StoreError::UniqueViolation("organizers_email_key".to_string()));
        }

        Ok(guard.organizers.get_mut(&id).map(|row| {
            row.name = changes.name;
            row.email = changes.email;
            row.role = changes.role;
            row.updated_at = Utc::now();
            row.clone()
        }))
    }

    async fn delete_organizer(&self, id: i64) -> StoreResult<bool> {
        Ok(self.inner.lock().await.organizers.remove(&id).is_some())
    }
}

#[async_trait]
impl ParticipantStore for MemoryStore {
    async fn create_participant(&self, participant: NewParticipant) -> StoreResult<Participant> {
        let mut guard = self.inner.lock().await;
        if guard
            .participants
            .values()
            .any(|p| p.email == participant.email)
        {
            return Err(StoreError::UniqueViolation("participants_email_key".to_string()));
        }

        let now = Utc::now();
        let id = guard.allocate_id();
        let row = Participant {
            id,
            full_name: participant.full_name,
            email: participant.email,
            phone: participant.phone,
            created_at: now,
            updated_at: now,
        };
        guard.participants.insert(id, row.clone());
        Ok(row)
    }

    async fn find_participant(&self, id: i64) -> StoreResult<Option<Participant>> {
        Ok(self.inner.lock().await.participants.get(&id).cloned())
    }
}

#[async_trait]
impl RegistrationStore for MemoryStore {
    async fn create_registration(
        &self,
        registration: NewRegistration,
    ) -> StoreResult<EventRegistration> {
        let mut guard = self.inner.lock().await;
        if guard.registrations.values().any(|r| {
            r.event_id == registration.event_id && r.participant_id == registration.participant_id
        }) {
            return Err(StoreError::UniqueViolation(
                "event_registrations_event_participant_key".to_string(),
            ));
        }

        let now = Utc::now();
        let id = guard.allocate_id();
        let row = EventRegistration {
            id,
            event_id: registration.event_id,
            participant_id: registration.participant_id,
            status: registration.status,
            registered_at: registration.registered_at,
            created_at: now,
            updated_at: now,
        };
        guard.registrations.insert(id, row.clone());
        Ok(row)
    }

    async fn find_registration_by_pair(
        &self,
        event_id: i64,
        participant_id: i64,
    ) -> StoreResult<Option<EventRegistration>> {
        let guard = self.inner.lock().await;
        Ok(guard
            .registrations
            .values()
            .find(|r| r.event_id == event_id && r.participant_id == participant_id)
            .cloned())
    }

    async fn set_registration_status(
        &self,
        id: i64,
        status: RegistrationStatus,
    ) -> StoreResult<Option<EventRegistration>> {
        let mut guard = self.inner.lock().await;
        Ok(guard.registrations.get_mut(&id).map(|row| {
            row.status = status;
            row.updated_at = Utc::now();
            row.clone()
        }))
    }

    async fn update_registration(
        &self,
        id: i64,
        event_id: i64,
        participant_id: i64,
        status: RegistrationStatus,
    ) -> StoreResult<Option<EventRegistration>> {
        let mut guard = self.inner.lock().await;
        if guard
            .registrations
            .values()
            .any(|r| r.id != id && r.event_id == event_id && r.participant_id == participant_id)
        {
            return Err(StoreError::UniqueViolation(
                "event_registrations_event_participant_key".to_string(),
            ));
        }

        Ok(guard.registrations.get_mut(&id).map(|row| {
            row.event_id = event_id;
            row.participant_id = participant_id;
            row.status = status;
            row.updated_at = Utc::now();
            row.clone()
        }))
    }
}

#[async_trait]
impl TicketStore for MemoryStore {
    async fn create_ticket(&self, ticket: NewTicket) -> StoreResult<Ticket> {
        if self.reject_tickets.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("ticket inserts disabled".to_string()));
        }

        let mut guard = self.inner.lock().await;
        if guard
            .tickets
            .values()
            .any(|t| t.redemption_token == ticket.redemption_token)
        {
            return Err(StoreError::UniqueViolation(
                "tickets_redemption_token_key".to_string(),
            ));
        }

        let now = Utc::now();
        let id = guard.allocate_id();
        let row = Ticket {
            id,
            event_id: ticket.event_id,
            participant_id: ticket.participant_id,
            ticket_type: ticket.ticket_type,
            status: ticket.status,
            redemption_token: ticket.redemption_token,
            created_at: now,
            updated_at: now,
        };
        guard.tickets.insert(id, row.clone());
        Ok(row)
    }

    async fn find_ticket(&self, id: i64) -> StoreResult<Option<Ticket>> {
        Ok(self.inner.lock().await.tickets.get(&id).cloned())
    }

    async fn find_ticket_by_redemption_token(&self, token: &str) -> StoreResult<Option<Ticket>> {
        let guard = self.inner.lock().await;
        Ok(guard
            .tickets
            .values()
            .find(|t| t.redemption_token == token)
            .cloned())
    }

    async fn update_ticket(
        &self,
        id: i64,
        ticket_type: TicketType,
        status: TicketStatus,
    ) -> StoreResult<Option<Ticket>> {
        let mut guard = self.inner.lock().await;
        Ok(guard.tickets.get_mut(&id).map(|row| {
            row.ticket_type = ticket_type;
            row.status = status;
            row.updated_at = Utc::now();
            row.clone()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn organizer(email: &str) -> NewOrganizer {
        NewOrganizer {
            name: "Test".to_string(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
            role: crate::models::Role::Organizer,
        }
    }

    #[tokio::test]
    async fn organizer_email_is_unique() {
        let store = MemoryStore::new();
        store.create_organizer(organizer("a@x.com")).await.unwrap();
        let err = store
            .create_organizer(organizer("a@x.com"))
            .await
            .expect_err("duplicate email must be rejected");
        assert!(matches!(err, StoreError::UniqueViolation(_)));
        assert_eq!(store.organizer_count().await, 1);
    }

    #[tokio::test]
    async fn deleted_organizer_is_gone_and_email_reusable() {
        let store = MemoryStore::new();
        let created = store.create_organizer(organizer("a@x.com")).await.unwrap();

        assert!(store.delete_organizer(created.id).await.unwrap());
        assert!(!store.delete_organizer(created.id).await.unwrap());
        assert!(store.find_organizer(created.id).await.unwrap().is_none());
        store.create_organizer(organizer("a@x.com")).await.unwrap();
    }

    #[tokio::test]
    async fn registration_pair_is_unique() {
        let store = MemoryStore::new();
        let new = NewRegistration {
            event_id: 1,
            participant_id: 1,
            status: RegistrationStatus::Registered,
            registered_at: Utc::now(),
        };
        store.create_registration(new.clone()).await.unwrap();
        let err = store.create_registration(new).await.unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation(_)));
    }
}
