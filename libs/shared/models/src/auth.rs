use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[serde(alias = "DOCTOR")]
    Doctor,
    #[serde(alias = "PATIENT")]
    Patient,
    #[serde(alias = "ADMIN")]
    Admin,
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserRole::Doctor => write!(f, "doctor"),
            UserRole::Patient => write!(f, "patient"),
            UserRole::Admin => write!(f, "admin"),
        }
    }
}

/// The signed-in account as reported by `/auth/me`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    #[serde(alias = "userId", alias = "user_id")]
    pub id: i64,
    pub role: UserRole,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, alias = "first_name")]
    pub first_name: Option<String>,
    #[serde(default, alias = "last_name")]
    pub last_name: Option<String>,
}

impl CurrentUser {
    pub fn new(id: i64, role: UserRole) -> Self {
        Self {
            id,
            role,
            email: None,
            first_name: None,
            last_name: None,
        }
    }

    pub fn is_doctor(&self) -> bool {
        self.role == UserRole::Doctor
    }

    pub fn display_name(&self) -> String {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => format!("{} {}", first, last),
            (Some(first), None) => first.clone(),
            _ => self.email.clone().unwrap_or_else(|| format!("User {}", self.id)),
        }
    }
}
