pub mod organizer;
pub mod participant;
pub mod registration;
pub mod ticket;

pub use organizer::{Organizer, Role};
pub use participant::Participant;
pub use registration::{EventRegistration, RegistrationStatus};
pub use ticket::{Ticket, TicketStatus, TicketType};

use thiserror::Error;

/// Raised when a stored or submitted string is not one of an enum's values.
#[derive(Debug, Error)]
#[error("'{value}' is not a valid {kind}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseEnumError {
    pub(crate) fn new(kind: &'static str, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }
}
