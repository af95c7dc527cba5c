// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response types for the HTTP surface, plus the user record
//! projection the auth pipeline consumes from the user store.
//!
//! ## Model Categories
//!
//! - **Users**: the secret-free [`UserRecord`] projection
//! - **Auth**: login and token responses
//! - **Orders**: owned resources guarded by ownership validation
//! - **Catalog**: public products, optionally personalized

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::{AuthenticatedUser, OwnedResource, Role};

// =============================================================================
// Users
// =============================================================================

/// User record as returned by the user store.
///
/// This is a projection: the password hash never leaves the store.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct UserRecord {
    /// Unique user identifier.
    pub id: String,
    /// Login email.
    pub email: String,
    /// Account role.
    pub role: Role,
    /// Inactive accounts are never authenticated.
    pub is_active: bool,
}

// =============================================================================
// Auth
// =============================================================================

/// Credentials for `POST /v1/auth/login`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Issued bearer token plus the identity it was issued for.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    /// Bearer token for the `Authorization` header.
    pub token: String,
    /// Always `Bearer`.
    pub token_type: String,
    /// Token lifetime in seconds.
    pub expires_in: u64,
    pub user: AuthenticatedUser,
}

// =============================================================================
// Orders
// =============================================================================

/// A placed order. Only its owner (or an admin) may read it.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct Order {
    /// Unique order identifier.
    pub id: String,
    /// User who placed the order.
    pub owner_id: String,
    /// Order total in minor currency units.
    pub total_cents: u64,
    /// ISO 4217 currency code.
    pub currency_code: String,
    /// When the order was placed.
    pub placed_at: DateTime<Utc>,
}

impl OwnedResource for Order {
    fn owner_id(&self) -> &str {
        &self.owner_id
    }
}

// =============================================================================
// Catalog
// =============================================================================

/// A catalog product.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct Product {
    pub id: String,
    pub name: String,
    /// Retail price in minor currency units.
    pub price_cents: u64,
}

/// Catalog listing. Signed-in callers are identified in `viewer`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CatalogResponse {
    /// Caller's user ID when a valid token was presented.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub viewer: Option<String>,
    pub products: Vec<Product>,
}
