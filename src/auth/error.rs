// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication and authorization errors.

use std::time::Duration;

use axum::{
    http::{header::RETRY_AFTER, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Every reason a request can be turned away by the auth pipeline.
///
/// `Display` carries internal detail for logs. Response bodies only ever use
/// [`AuthError::public_message`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// No bearer token on a route that requires one
    #[error("no bearer token presented")]
    MissingToken,
    /// Token could not be parsed into header, claims and signature
    #[error("token is malformed")]
    TokenMalformed,
    /// Token signature does not match its contents
    #[error("token signature is invalid")]
    TokenInvalidSignature,
    /// Token is past its `exp` claim
    #[error("token has expired")]
    TokenExpired,
    /// Token subject does not exist in the user store
    #[error("user not found")]
    UserNotFound,
    /// Token subject exists but the account is inactive
    #[error("account is deactivated")]
    AccountDeactivated,
    /// Role gate denial
    #[error("insufficient role for this operation")]
    InsufficientRole,
    /// Ownership gate denial
    #[error("caller does not own this resource")]
    OwnershipDenied,
    /// Resource to validate ownership against does not exist
    #[error("resource not found")]
    ResourceNotFound,
    /// Too many requests from this client in the current window
    #[error("rate limit exceeded, retry after {}s", retry_after_secs(*.retry_after))]
    RateLimited { retry_after: Duration },
    /// Operational failure: misconfiguration, store outage, lookup timeout
    #[error("internal verification failure: {0}")]
    InternalVerificationFailure(String),
}

#[derive(Serialize)]
struct AuthErrorBody {
    error: &'static str,
}

/// Whole seconds, rounded up, never zero.
fn retry_after_secs(retry_after: Duration) -> u64 {
    let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
    secs.max(1)
}

impl AuthError {
    pub fn internal(detail: impl Into<String>) -> Self {
        AuthError::InternalVerificationFailure(detail.into())
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingToken
            | AuthError::TokenMalformed
            | AuthError::TokenInvalidSignature
            | AuthError::TokenExpired
            | AuthError::UserNotFound
            | AuthError::AccountDeactivated => StatusCode::UNAUTHORIZED,
            AuthError::InsufficientRole | AuthError::OwnershipDenied => StatusCode::FORBIDDEN,
            AuthError::ResourceNotFound => StatusCode::NOT_FOUND,
            AuthError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            AuthError::InternalVerificationFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to send to the caller.
    pub fn public_message(&self) -> &'static str {
        match self.status_code() {
            StatusCode::UNAUTHORIZED => "Authentication required",
            StatusCode::FORBIDDEN => "You do not have access to this resource",
            StatusCode::NOT_FOUND => "Resource not found",
            StatusCode::TOO_MANY_REQUESTS => "Too many requests, please try again later",
            _ => "Internal server error",
        }
    }

    /// True for failures caused by the service rather than the caller.
    pub fn is_operational(&self) -> bool {
        matches!(self, AuthError::InternalVerificationFailure(_))
    }

    /// Retry hint in whole seconds, for rate-limit rejections only.
    pub fn retry_after_secs(&self) -> Option<u64> {
        match self {
            AuthError::RateLimited { retry_after } => Some(retry_after_secs(*retry_after)),
            _ => None,
        }
    }

    /// Log the rejection at a level that separates operational defects from
    /// expected client traffic.
    pub fn log(&self, stage: &'static str) {
        if self.is_operational() {
            tracing::error!(stage, error = %self, "auth pipeline failure");
        } else {
            tracing::debug!(stage, reason = %self, "request rejected");
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(AuthErrorBody {
            error: self.public_message(),
        });
        let mut response = (status, body).into_response();
        if let Some(secs) = self.retry_after_secs() {
            response
                .headers_mut()
                .insert(RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}
