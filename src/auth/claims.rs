// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token claims and the authenticated user representation.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::roles::Role;
use crate::models::UserRecord;

/// Signed token payload.
///
/// Field order is part of the signed bytes: it is the serialization order
/// below and must not be rearranged without rotating every issued token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Email at issuance time
    pub email: String,
    /// Role at issuance time
    pub role: Role,
    /// Issued at (seconds since epoch)
    pub iat: i64,
    /// Expiration (seconds since epoch)
    pub exp: i64,
}

impl Claims {
    pub fn for_user(user: &AuthenticatedUser, issued_at: i64, ttl_secs: i64) -> Self {
        Self {
            sub: user.user_id.clone(),
            email: user.email.clone(),
            role: user.role,
            iat: issued_at,
            exp: issued_at.saturating_add(ttl_secs),
        }
    }

    pub fn is_expired_at(&self, now: i64) -> bool {
        now > self.exp
    }
}

/// Authenticated user attached to the request by the auth middleware.
///
/// Built from the user store record loaded during authentication, not from
/// the token, so role and email reflect the store at request time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AuthenticatedUser {
    /// Canonical user ID
    pub user_id: String,
    pub email: String,
    pub role: Role,
}

impl AuthenticatedUser {
    /// Check if the user holds any of the given roles.
    pub fn has_any_role(&self, roles: &[Role]) -> bool {
        roles.contains(&self.role)
    }

    /// Check if this user is an admin.
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl From<UserRecord> for AuthenticatedUser {
    fn from(record: UserRecord) -> Self {
        Self {
            user_id: record.id,
            email: record.email,
            role: record.role,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> AuthenticatedUser {
        sample_record().into()
    }

    fn sample_record() -> UserRecord {
        UserRecord {
            id: "user_123".to_string(),
            email: "ada@example.com".to_string(),
            role: Role::Corporate,
            is_active: true,
        }
    }

    #[test]
    fn for_user_copies_identity_and_sets_expiry() {
        let claims = Claims::for_user(&sample_user(), 1_700_000_000, 3_600);
        assert_eq!(claims.sub, "user_123");
        assert_eq!(claims.email, "ada@example.com");
        assert_eq!(claims.role, Role::Corporate);
        assert_eq!(claims.exp, 1_700_003_600);
    }

    #[test]
    fn expiry_is_exclusive_of_exp_second() {
        let claims = Claims::for_user(&sample_user(), 100, 10);
        assert!(!claims.is_expired_at(110));
        assert!(claims.is_expired_at(111));
    }

    #[test]
    fn claims_serialize_in_signed_order() {
        let claims = Claims::for_user(&sample_user(), 1, 2);
        let json = serde_json::to_string(&claims).unwrap();
        assert_eq!(
            json,
            r#"{"sub":"user_123","email":"ada@example.com","role":"corporate","iat":1,"exp":3}"#
        );
    }

    #[test]
    fn authenticated_user_from_record() {
        let user = AuthenticatedUser::from(sample_record());
        assert_eq!(user.user_id, "user_123");
        assert!(user.has_any_role(&[Role::Corporate, Role::Institution]));
        assert!(!user.is_admin());
    }
}
