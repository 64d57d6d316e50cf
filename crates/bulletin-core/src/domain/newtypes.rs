//! Domain newtypes with validation
//!
//! Strongly-typed wrappers for the identifiers the sync layer passes
//! around. Each newtype ensures data validity at construction time.

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

use super::errors::DomainError;

/// Name of an institution (`etablissement`), the scope of most entities
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Institution(String);

impl Institution {
    /// Creates an institution name, rejecting blank values
    pub fn new(name: impl Into<String>) -> Result<Self, DomainError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::ValidationFailed(
                "institution name must not be empty".to_string(),
            ));
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Institution {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Institution {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Login identifier of an account (`User.identifiant`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Login(String);

impl Login {
    pub fn new(login: impl Into<String>) -> Result<Self, DomainError> {
        let login = login.into();
        if login.trim().is_empty() {
            return Err(DomainError::ValidationFailed(
                "login must not be empty".to_string(),
            ));
        }
        Ok(Self(login))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Login {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
