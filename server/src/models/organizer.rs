use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::ParseEnumError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Organizer,
}

impl Role {
    pub const ALL: &'static [Role] = &[Role::Admin, Role::Organizer];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Organizer => "organizer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ParseEnumError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "admin" => Ok(Role::Admin),
            "organizer" => Ok(Role::Organizer),
            other => Err(ParseEnumError::new("role", other)),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = ParseEnumError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// An account that can sign in. Secrets never leave the server: the password
/// hash and the stored refresh token are skipped on serialization.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Organizer {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[sqlx(try_from = "String")]
    pub role: Role,
    #[serde(skip_serializing)]
    pub refresh_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewOrganizer {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

/// Profile fields an administrator may change.
#[derive(Debug, Clone)]
pub struct OrganizerChanges {
    pub name: String,
    pub email: String,
    pub role: Role,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parses_known_values_only() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("organizer".parse::<Role>().unwrap(), Role::Organizer);
        assert!("Admin".parse::<Role>().is_err());
        assert!("manager".parse::<Role>().is_err());
    }

    #[test]
    fn serialized_organizer_hides_secrets() {
        let now = Utc::now();
        let organizer = Organizer {
            id: 7,
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            role: Role::Organizer,
            refresh_token: Some("refresh".to_string()),
            created_at: now,
            updated_at: now,
        };

        let json = serde_json::to_value(&organizer).unwrap();
        assert_eq!(json["role"], "organizer");
        assert!(json.get("password_hash").is_none());
        assert!(json.get("refresh_token").is_none());
    }
}
