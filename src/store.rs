// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Store capabilities consumed by the auth pipeline, and an in-memory
//! implementation for development and tests.
//!
//! The pipeline only ever sees the traits:
//!
//! - [`UserStore`] - load a user by id (secret-free projection)
//! - [`CredentialVerifier`] - check an email/password pair
//! - [`ResourceStore`] - load an owned resource by id
//!
//! Production deployments inject their own database-backed implementations.

use std::collections::HashMap;

use async_trait::async_trait;
use base64ct::{Base64, Encoding};
use chrono::Utc;
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::auth::Role;
use crate::models::{Order, Product, UserRecord};

/// Failure talking to a backing store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Loads user records by id.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Returns `None` when no such user exists. Never exposes secret fields.
    async fn find_by_id(&self, id: &str) -> Result<Option<UserRecord>, StoreError>;
}

/// Checks login credentials.
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    /// Returns the matching user when the password is correct, `None` for an
    /// unknown email or wrong password (indistinguishable to the caller).
    async fn verify_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<UserRecord>, StoreError>;
}

/// Loads an owned resource by id.
#[async_trait]
pub trait ResourceStore<R>: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<R>, StoreError>;
}

struct StoredUser {
    record: UserRecord,
    password_hash: String,
}

/// Development store. Password hashes are unsalted SHA-256 and are not
/// suitable for production credentials.
#[derive(Default)]
pub struct InMemoryStore {
    users: RwLock<HashMap<String, StoredUser>>,
    orders: RwLock<HashMap<String, Order>>,
}

fn password_digest(password: &str) -> String {
    Base64::encode_string(&Sha256::digest(password.as_bytes()))
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a user with a generated id.
    pub async fn create_user(&self, email: &str, password: &str, role: Role) -> UserRecord {
        let id = Uuid::new_v4().to_string();
        self.insert_user(&id, email, password, role).await
    }

    /// Insert (or replace) a user with a known id.
    pub async fn insert_user(
        &self,
        id: &str,
        email: &str,
        password: &str,
        role: Role,
    ) -> UserRecord {
        let record = UserRecord {
            id: id.to_string(),
            email: email.to_ascii_lowercase(),
            role,
            is_active: true,
        };
        let stored = StoredUser {
            record: record.clone(),
            password_hash: password_digest(password),
        };
        self.users.write().await.insert(id.to_string(), stored);
        record
    }

    /// Activate or deactivate a user. Returns the updated record.
    pub async fn set_active(&self, id: &str, is_active: bool) -> Option<UserRecord> {
        let mut users = self.users.write().await;
        let stored = users.get_mut(id)?;
        stored.record.is_active = is_active;
        Some(stored.record.clone())
    }

    /// Change a user's role. Returns the updated record.
    pub async fn set_role(&self, id: &str, role: Role) -> Option<UserRecord> {
        let mut users = self.users.write().await;
        let stored = users.get_mut(id)?;
        stored.record.role = role;
        Some(stored.record.clone())
    }

    pub async fn list_users(&self) -> Vec<UserRecord> {
        let mut users: Vec<UserRecord> = self
            .users
            .read()
            .await
            .values()
            .map(|stored| stored.record.clone())
            .collect();
        users.sort_by(|a, b| a.email.cmp(&b.email));
        users
    }

    /// Insert an order with a known id.
    pub async fn insert_order(&self, id: &str, owner_id: &str, total_cents: u64) -> Order {
        let order = Order {
            id: id.to_string(),
            owner_id: owner_id.to_string(),
            total_cents,
            currency_code: "USD".to_string(),
            placed_at: Utc::now(),
        };
        self.orders
            .write()
            .await
            .insert(id.to_string(), order.clone());
        order
    }

    /// Public catalog.
    pub fn products(&self) -> Vec<Product> {
        [
            ("prd_notebook", "A5 Dotted Notebook", 1_250),
            ("prd_pen", "Fountain Pen", 4_900),
            ("prd_ink", "Ink Cartridges (12)", 800),
        ]
        .into_iter()
        .map(|(id, name, price_cents)| Product {
            id: id.to_string(),
            name: name.to_string(),
            price_cents,
        })
        .collect()
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn find_by_id(&self, id: &str) -> Result<Option<UserRecord>, StoreError> {
        Ok(self
            .users
            .read()
            .await
            .get(id)
            .map(|stored| stored.record.clone()))
    }
}

#[async_trait]
impl CredentialVerifier for InMemoryStore {
    async fn verify_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<UserRecord>, StoreError> {
        let email = email.to_ascii_lowercase();
        let digest = password_digest(password);
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|stored| stored.record.email == email && stored.password_hash == digest)
            .map(|stored| stored.record.clone()))
    }
}

#[async_trait]
impl ResourceStore<Order> for InMemoryStore {
    async fn find_by_id(&self, id: &str) -> Result<Option<Order>, StoreError> {
        Ok(self.orders.read().await.get(id).cloned())
    }
}
