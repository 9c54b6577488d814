//! Authenticated principal and role gating
//!
//! Credential storage and verification live in an external collaborator; the
//! engine only trusts the role flag it is handed.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Role attached to an authenticated principal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Teacher,
}

/// Authenticated caller identity, supplied by the authentication collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Principal {
    pub username: String,
    pub role: Role,
}

impl Principal {
    pub fn new(username: impl Into<String>, role: Role) -> Self {
        Self {
            username: username.into(),
            role,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Gate for administrative operations (cycle management, course assignment)
    pub fn require_admin(&self) -> Result<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(Error::Forbidden(format!(
                "user '{}' is not an administrator",
                self.username
            )))
        }
    }
}
