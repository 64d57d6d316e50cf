//! Login session handed over by the authentication flow
//!
//! The sync layer does not authenticate anyone. It receives the identity
//! that the (external) login flow accepted and uses the role to decide how
//! much data the bootstrap sync loads.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::DomainError;
use super::newtypes::Login;

/// Role of the authenticated user (`User.titre`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Administrative account; uses a separate application, gets no
    /// institution data
    Admin,
    /// Built-in bootstrap account; has no institution
    Creator,
    /// Any institution-bound role (director, teacher, secretary, ...)
    Staff(String),
}

impl Role {
    /// Whether the bootstrap sync should load institution data for this role
    pub fn loads_institution_data(&self) -> bool {
        matches!(self, Role::Staff(_))
    }

    /// The value stored in `User.titre`
    pub fn as_str(&self) -> &str {
        match self {
            Role::Admin => "admin",
            Role::Creator => "creator",
            Role::Staff(title) => title,
        }
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed {
            "" => Err(DomainError::InvalidRole("role must not be empty".into())),
            r if r.eq_ignore_ascii_case("admin") => Ok(Role::Admin),
            r if r.eq_ignore_ascii_case("creator") => Ok(Role::Creator),
            other => Ok(Role::Staff(other.to_string())),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity accepted by the authentication flow
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginSession {
    pub login: Login,
    pub role: Role,
}

impl LoginSession {
    pub fn new(login: Login, role: Role) -> Self {
        Self { login, role }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_roles() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("Creator".parse::<Role>().unwrap(), Role::Creator);
        assert_eq!(
            "Directeur".parse::<Role>().unwrap(),
            Role::Staff("Directeur".to_string())
        );
        assert!("   ".parse::<Role>().is_err());
    }

    #[test]
    fn only_staff_loads_institution_data() {
        assert!(!Role::Admin.loads_institution_data());
        assert!(!Role::Creator.loads_institution_data());
        assert!(Role::Staff("Enseignant".into()).loads_institution_data());
    }

    #[test]
    fn staff_role_keeps_stored_title() {
        let role: Role = "Secretaire".parse().unwrap();
        assert_eq!(role.as_str(), "Secretaire");
    }
}
