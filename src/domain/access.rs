//! Roles, capabilities and access-key records.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::Type;
use time::OffsetDateTime;
use uuid::Uuid;

use super::error::DomainError;

/// Role carried by an access key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "access_role", rename_all = "snake_case")]
pub enum Role {
    Viewer,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Viewer => "viewer",
            Self::Admin => "admin",
        }
    }

    /// Whether holders of this role may perform operations gated by `capability`.
    pub fn grants(self, capability: Capability) -> bool {
        match capability {
            Capability::ViewerOnly => true,
            Capability::AdminOnly => self == Self::Admin,
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "viewer" => Ok(Self::Viewer),
            "admin" => Ok(Self::Admin),
            other => Err(DomainError::validation(format!(
                "unknown role `{other}` (expected viewer or admin)"
            ))),
        }
    }
}

/// Authorization level required by a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Any authenticated user.
    ViewerOnly,
    /// Administrators only.
    AdminOnly,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AccessKeyRecord {
    pub id: Uuid,
    pub name: String,
    pub prefix: String,
    pub hashed_secret: Vec<u8>,
    pub role: Role,
    pub revoked_at: Option<OffsetDateTime>,
    pub last_used_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
}

impl AccessKeyRecord {
    pub fn is_revoked_at(&self, now: OffsetDateTime) -> bool {
        self.revoked_at.is_some_and(|revoked_at| revoked_at <= now)
    }
}
