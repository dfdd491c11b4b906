use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::ParseEnumError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketType {
    Free,
    Paid,
}

impl TicketType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketType::Free => "free",
            TicketType::Paid => "paid",
        }
    }
}

impl FromStr for TicketType {
    type Err = ParseEnumError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "free" => Ok(TicketType::Free),
            "paid" => Ok(TicketType::Paid),
            other => Err(ParseEnumError::new("ticket type", other)),
        }
    }
}

impl TryFrom<String> for TicketType {
    type Error = ParseEnumError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    Active,
    Canceled,
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Active => "active",
            TicketStatus::Canceled => "canceled",
        }
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TicketStatus {
    type Err = ParseEnumError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "active" => Ok(TicketStatus::Active),
            "canceled" => Ok(TicketStatus::Canceled),
            other => Err(ParseEnumError::new("ticket status", other)),
        }
    }
}

impl TryFrom<String> for TicketStatus {
    type Error = ParseEnumError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A ticket is tied to its registration only through the shared
/// `(event_id, participant_id)` pair; there is no foreign key between them.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Ticket {
    pub id: i64,
    pub event_id: i64,
    pub participant_id: i64,
    #[sqlx(try_from = "String")]
    pub ticket_type: TicketType,
    #[sqlx(try_from = "String")]
    pub status: TicketStatus,
    #[serde(rename = "qr_code")]
    pub redemption_token: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewTicket {
    pub event_id: i64,
    pub participant_id: i64,
    pub ticket_type: TicketType,
    pub status: TicketStatus,
    pub redemption_token: String,
}
