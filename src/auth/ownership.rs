// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Ownership enforcement.
//!
//! Resources that belong to a user implement [`OwnedResource`]; every access
//! to them goes through [`OwnershipEnforcer`], which lets the owner and
//! admins through and denies everyone else.

use super::{AuthError, AuthenticatedUser};

/// Trait for resources that have an owner.
pub trait OwnedResource {
    /// Get the owner's user ID.
    fn owner_id(&self) -> &str;
}

/// Allow the owner of `owner_id`, or an admin.
pub fn check_owner(user: &AuthenticatedUser, owner_id: &str) -> Result<(), AuthError> {
    if user.role.overrides_ownership() || user.user_id == owner_id {
        Ok(())
    } else {
        Err(AuthError::OwnershipDenied)
    }
}

/// Trait for enforcing ownership on loaded resources.
pub trait OwnershipEnforcer {
    /// Verify that the user owns this resource or is an admin.
    ///
    /// # Errors
    /// Returns `AuthError::OwnershipDenied` otherwise.
    fn verify_ownership(&self, user: &AuthenticatedUser) -> Result<(), AuthError>;
}

impl<T: OwnedResource> OwnershipEnforcer for T {
    fn verify_ownership(&self, user: &AuthenticatedUser) -> Result<(), AuthError> {
        check_owner(user, self.owner_id())
    }
}

/// Extension trait for checking ownership on a lookup result.
pub trait OwnershipCheck<T> {
    /// Verify ownership and return the resource if authorized.
    ///
    /// A missing resource is `ResourceNotFound`; it is reported before the
    /// ownership decision.
    fn verify_owner(self, user: &AuthenticatedUser) -> Result<T, AuthError>;
}

impl<T: OwnedResource> OwnershipCheck<T> for Option<T> {
    fn verify_owner(self, user: &AuthenticatedUser) -> Result<T, AuthError> {
        let resource = self.ok_or(AuthError::ResourceNotFound)?;
        resource.verify_ownership(user)?;
        Ok(resource)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;

    struct TestResource {
        owner: String,
    }

    impl OwnedResource for TestResource {
        fn owner_id(&self) -> &str {
            &self.owner
        }
    }

    fn make_user(user_id: &str, role: Role) -> AuthenticatedUser {
        AuthenticatedUser {
            user_id: user_id.to_string(),
            email: format!("{user_id}@example.com"),
            role,
        }
    }

    fn resource(owner: &str) -> TestResource {
        TestResource {
            owner: owner.to_string(),
        }
    }

    #[test]
    fn ownership_verification_passes_for_owner() {
        let user = make_user("user_123", Role::Individual);
        assert!(resource("user_123").verify_ownership(&user).is_ok());
    }

    #[test]
    fn ownership_verification_fails_for_non_owner() {
        for role in [Role::Individual, Role::Corporate, Role::Institution] {
            let user = make_user("user_456", role);
            assert_eq!(
                resource("user_123").verify_ownership(&user),
                Err(AuthError::OwnershipDenied)
            );
        }
    }

    #[test]
    fn admin_bypasses_ownership() {
        let admin = make_user("admin_1", Role::Admin);
        assert!(resource("user_123").verify_ownership(&admin).is_ok());
    }

    #[test]
    fn ownership_check_on_option_some() {
        let user = make_user("user_123", Role::Individual);
        let found = Some(resource("user_123")).verify_owner(&user).unwrap();
        assert_eq!(found.owner, "user_123");
    }

    #[test]
    fn ownership_check_on_option_none() {
        let user = make_user("user_123", Role::Individual);
        let missing: Option<TestResource> = None;
        assert!(matches!(
            missing.verify_owner(&user),
            Err(AuthError::ResourceNotFound)
        ));
    }
}
