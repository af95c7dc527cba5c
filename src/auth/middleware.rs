// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication middleware for Axum.
//!
//! Each request walks `Start → TokenExtracted → Verified → UserLoaded` and
//! ends either authenticated or rejected. Three variants are provided:
//!
//! - [`require_auth`] - strict: any failure ends the request with the error
//! - [`optional_auth`] - any failure degrades to an anonymous caller
//! - [`refresh_identity`] - re-loads the already-authenticated user from the
//!   store right before gates, for sensitive mutating routes
//!
//! On success an [`AuthOutcome`] is placed in the request extensions. It
//! carries the user record loaded from the store, never the raw token, so
//! downstream gates do not re-verify anything.
//!
//! ```rust,ignore
//! let app = Router::new()
//!     .route("/v1/users/me", get(me))
//!     .route_layer(axum::middleware::from_fn_with_state(
//!         authenticator.clone(),
//!         require_auth,
//!     ));
//! ```

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::{AuthError, AuthenticatedUser, TokenService};
use crate::models::UserRecord;
use crate::store::UserStore;

/// Default upper bound on a single user-store lookup.
pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);

/// Result of identity resolution, attached to the request extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    Anonymous,
    Authenticated(AuthenticatedUser),
    /// Terminal. Never attached to a request that reaches a handler.
    Rejected(AuthError),
}

impl AuthOutcome {
    pub fn user(&self) -> Option<&AuthenticatedUser> {
        match self {
            AuthOutcome::Authenticated(user) => Some(user),
            _ => None,
        }
    }
}

impl From<Result<AuthenticatedUser, AuthError>> for AuthOutcome {
    fn from(result: Result<AuthenticatedUser, AuthError>) -> Self {
        match result {
            Ok(user) => AuthOutcome::Authenticated(user),
            Err(err) => AuthOutcome::Rejected(err),
        }
    }
}

/// Resolves bearer tokens into authenticated users.
#[derive(Clone)]
pub struct Authenticator {
    tokens: Arc<TokenService>,
    users: Arc<dyn UserStore>,
    lookup_timeout: Duration,
}

impl Authenticator {
    pub fn new(tokens: Arc<TokenService>, users: Arc<dyn UserStore>) -> Self {
        Self {
            tokens,
            users,
            lookup_timeout: DEFAULT_LOOKUP_TIMEOUT,
        }
    }

    /// Set the upper bound on a single user lookup.
    pub fn with_lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout = timeout;
        self
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Run the full strict resolution against request headers.
    pub async fn resolve(&self, headers: &HeaderMap) -> AuthOutcome {
        self.authenticate(headers).await.into()
    }

    async fn authenticate(&self, headers: &HeaderMap) -> Result<AuthenticatedUser, AuthError> {
        let token = bearer_token(headers).ok_or(AuthError::MissingToken)?;
        let claims = self.tokens.verify(token)?;
        self.load_user(&claims.sub).await
    }

    /// Like [`resolve`](Self::resolve), but every failure is anonymous.
    pub async fn resolve_optional(&self, headers: &HeaderMap) -> AuthOutcome {
        match self.resolve(headers).await {
            AuthOutcome::Rejected(err) => {
                if err.is_operational() {
                    err.log("optional_auth");
                }
                AuthOutcome::Anonymous
            }
            outcome => outcome,
        }
    }

    /// Load a user by id and require the account to be active.
    pub async fn load_user(&self, user_id: &str) -> Result<AuthenticatedUser, AuthError> {
        let record = self.fetch(user_id).await?.ok_or(AuthError::UserNotFound)?;
        if !record.is_active {
            return Err(AuthError::AccountDeactivated);
        }
        Ok(record.into())
    }

    async fn fetch(&self, user_id: &str) -> Result<Option<UserRecord>, AuthError> {
        match tokio::time::timeout(self.lookup_timeout, self.users.find_by_id(user_id)).await {
            Ok(Ok(record)) => Ok(record),
            Ok(Err(e)) => Err(AuthError::internal(format!("user lookup failed: {e}"))),
            Err(_) => Err(AuthError::internal(format!(
                "user lookup timed out after {}ms",
                self.lookup_timeout.as_millis()
            ))),
        }
    }
}

/// Extract the token from `Authorization: Bearer <token>`.
///
/// Any other scheme, or an empty token, counts as no token.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Strict authentication: rejected requests never reach the handler.
pub async fn require_auth(
    State(auth): State<Authenticator>,
    mut request: Request,
    next: Next,
) -> Response {
    match auth.resolve(request.headers()).await {
        AuthOutcome::Rejected(err) => {
            err.log("require_auth");
            err.into_response()
        }
        outcome => {
            request.extensions_mut().insert(outcome);
            next.run(request).await
        }
    }
}

/// Optional authentication: the request always proceeds, anonymous on any
/// failure.
pub async fn optional_auth(
    State(auth): State<Authenticator>,
    mut request: Request,
    next: Next,
) -> Response {
    let outcome = auth.resolve_optional(request.headers()).await;
    request.extensions_mut().insert(outcome);
    next.run(request).await
}

/// Re-load the authenticated user from the store so role and active status
/// are current. Must run after [`require_auth`] or [`optional_auth`];
/// anonymous requests pass through unchanged.
pub async fn refresh_identity(
    State(auth): State<Authenticator>,
    mut request: Request,
    next: Next,
) -> Response {
    let user_id = match request.extensions().get::<AuthOutcome>() {
        Some(AuthOutcome::Authenticated(user)) => user.user_id.clone(),
        _ => return next.run(request).await,
    };

    match auth.load_user(&user_id).await {
        Ok(user) => {
            request
                .extensions_mut()
                .insert(AuthOutcome::Authenticated(user));
            next.run(request).await
        }
        Err(err) => {
            err.log("refresh_identity");
            err.into_response()
        }
    }
}
