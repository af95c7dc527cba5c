// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Request authentication and authorization for the storefront API.
//!
//! ## Pipeline
//!
//! 1. [`rate_limit`] - fixed-window limiter, authentication routes only
//! 2. [`middleware`] - bearer token → [`TokenService`] → user store →
//!    [`AuthOutcome`] in the request extensions
//! 3. [`policy`] - role and ownership gates, first denial wins
//! 4. Handler, reading identity through [`Auth`], [`OptionalAuth`] or
//!    [`Owned`]
//!
//! ## Security
//!
//! - Tokens are HMAC-SHA256 signed; the signature is checked before any
//!   claim is trusted
//! - Role and active status come from the user store at request time, not
//!   from the token
//! - Deactivated accounts are rejected even with an unexpired token
//! - Response bodies never carry internal error detail

pub mod claims;
pub mod error;
pub mod extractor;
pub mod middleware;
pub mod ownership;
pub mod policy;
pub mod rate_limit;
pub mod roles;
pub mod token;

pub use claims::{AuthenticatedUser, Claims};
pub use error::AuthError;
pub use extractor::{Auth, OptionalAuth, Owned};
pub use middleware::{AuthOutcome, Authenticator};
pub use ownership::OwnedResource;
pub use policy::{Gate, OwnershipGate, OwnershipValidator, Policy, RoleGate};
pub use rate_limit::{RateLimitConfig, RateLimiter};
pub use roles::Role;
pub use token::TokenService;
