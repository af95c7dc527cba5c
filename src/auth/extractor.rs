// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractors over the identity attached by the auth middleware.
//!
//! ```rust,ignore
//! async fn me(Auth(user): Auth) -> Json<AuthenticatedUser> {
//!     Json(user)
//! }
//!
//! async fn get_order(Owned(order): Owned<Order>) -> Json<Order> {
//!     Json(order)
//! }
//! ```
//!
//! The extractors never verify tokens themselves. A handler using [`Auth`]
//! on a route without [`require_auth`](super::middleware::require_auth) gets
//! a 401 for every request.

use axum::{extract::FromRequestParts, http::request::Parts};

use super::middleware::AuthOutcome;
use super::policy::Loaded;
use super::{AuthError, AuthenticatedUser};

/// Extractor for authenticated users.
pub struct Auth(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for Auth
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthOutcome>()
            .and_then(AuthOutcome::user)
            .cloned()
            .map(Auth)
            .ok_or(AuthError::MissingToken)
    }
}

/// Optional authentication extractor.
///
/// `None` for anonymous callers; never rejects.
pub struct OptionalAuth(pub Option<AuthenticatedUser>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts
            .extensions
            .get::<AuthOutcome>()
            .and_then(AuthOutcome::user)
            .cloned();
        Ok(OptionalAuth(user))
    }
}

/// Resource loaded and ownership-checked by
/// [`validate_ownership`](super::policy::validate_ownership).
pub struct Owned<R>(pub R);

impl<S, R> FromRequestParts<S> for Owned<R>
where
    S: Send + Sync,
    R: Clone + Send + Sync + 'static,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.remove::<Loaded<R>>() {
            Some(Loaded(resource)) => Ok(Owned(resource)),
            None => {
                let err = AuthError::internal(
                    "handler expects a validated resource but none was attached",
                );
                err.log("owned_extractor");
                Err(err)
            }
        }
    }
}
