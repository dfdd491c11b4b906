use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::ParseEnumError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RegistrationStatus {
    Registered,
    Attended,
    NoShow,
}

impl RegistrationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegistrationStatus::Registered => "registered",
            RegistrationStatus::Attended => "attended",
            RegistrationStatus::NoShow => "no-show",
        }
    }
}

impl fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RegistrationStatus {
    type Err = ParseEnumError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "registered" => Ok(RegistrationStatus::Registered),
            "attended" => Ok(RegistrationStatus::Attended),
            "no-show" => Ok(RegistrationStatus::NoShow),
            other => Err(ParseEnumError::new("registration status", other)),
        }
    }
}

impl TryFrom<String> for RegistrationStatus {
    type Error = ParseEnumError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Binds a participant to an event. At most one row exists per
/// `(event_id, participant_id)` pair.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct EventRegistration {
    pub id: i64,
    pub event_id: i64,
    pub participant_id: i64,
    #[sqlx(try_from = "String")]
    pub status: RegistrationStatus,
    pub registered_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewRegistration {
    pub event_id: i64,
    pub participant_id: i64,
    pub status: RegistrationStatus,
    pub registered_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_show_uses_hyphenated_wire_name() {
        assert_eq!(
            "no-show".parse::<RegistrationStatus>().unwrap(),
            RegistrationStatus::NoShow
        );
        assert_eq!(
            serde_json::to_value(RegistrationStatus::NoShow).unwrap(),
            "no-show"
        );
        assert!("no_show".parse::<RegistrationStatus>().is_err());
    }
}
