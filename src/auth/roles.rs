// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User roles for authorization.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Account roles.
///
/// The set is closed: tokens or store records carrying any other value are
/// rejected rather than mapped to a default.
///
/// - `Individual` - Personal shopper account
/// - `Corporate` - Business purchasing account
/// - `Institution` - Public institution account (schools, hospitals)
/// - `Admin` - Full access, bypasses ownership checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Individual,
    Corporate,
    Institution,
    Admin,
}

impl Role {
    /// Every role, in declaration order.
    pub const ALL: [Role; 4] = [
        Role::Individual,
        Role::Corporate,
        Role::Institution,
        Role::Admin,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Individual => "individual",
            Role::Corporate => "corporate",
            Role::Institution => "institution",
            Role::Admin => "admin",
        }
    }

    /// Admins may act on resources they do not own.
    pub fn overrides_ownership(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

/// Error returned when a role string is outside the closed set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    /// Case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "individual" => Ok(Role::Individual),
            "corporate" => Ok(Role::Corporate),
            "institution" => Ok(Role::Institution),
            "admin" => Ok(Role::Admin),
            _ => Err(UnknownRole(s.to_string())),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_str_parses_correctly() {
        assert_eq!("admin".parse::<Role>(), Ok(Role::Admin));
        assert_eq!("ADMIN".parse::<Role>(), Ok(Role::Admin));
        assert_eq!("Corporate".parse::<Role>(), Ok(Role::Corporate));
        assert_eq!("institution".parse::<Role>(), Ok(Role::Institution));
        assert!("client".parse::<Role>().is_err());
    }

    #[test]
    fn display_round_trips_through_from_str() {
        for role in Role::ALL {
            assert_eq!(role.to_string().parse::<Role>(), Ok(role));
        }
    }

    #[test]
    fn only_admin_overrides_ownership() {
        assert!(Role::Admin.overrides_ownership());
        assert!(!Role::Individual.overrides_ownership());
        assert!(!Role::Corporate.overrides_ownership());
        assert!(!Role::Institution.overrides_ownership());
    }

    #[test]
    fn serializes_lowercase() {
        let json = serde_json::to_string(&Role::Institution).unwrap();
        assert_eq!(json, r#""institution""#);
    }
}
