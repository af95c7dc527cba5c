// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token endpoints: login and refresh.
//!
//! Both routes sit behind the rate limiter. Refresh additionally requires a
//! valid token and re-issues one for the identity loaded from the store.

use axum::{extract::State, Json};
use tracing::info;

use crate::{
    auth::{Auth, AuthError, AuthenticatedUser},
    error::ApiError,
    models::{LoginRequest, TokenResponse},
    state::AppState,
};

const INVALID_CREDENTIALS: &str = "Invalid email or password";

fn token_response(state: &AppState, user: AuthenticatedUser) -> Result<TokenResponse, ApiError> {
    let tokens = state.authenticator.tokens();
    Ok(TokenResponse {
        token: tokens.issue(&user)?,
        token_type: "Bearer".to_string(),
        expires_in: tokens.ttl().as_secs(),
        user,
    })
}

/// Exchange email and password for a bearer token.
#[utoipa::path(
    post,
    path = "/v1/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 401, description = "Invalid credentials or deactivated account"),
        (status = 429, description = "Too many attempts from this client"),
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let check = state
        .credentials
        .verify_credentials(&request.email, &request.password);
    let user = tokio::time::timeout(state.settings.lookup_timeout, check)
        .await
        .map_err(|_| AuthError::internal("credential check timed out"))?
        .map_err(|e| AuthError::internal(format!("credential check failed: {e}")))?
        .ok_or_else(|| ApiError::unauthorized(INVALID_CREDENTIALS))?;

    if !user.is_active {
        return Err(AuthError::AccountDeactivated.into());
    }

    let response = token_response(&state, user.into())?;
    info!(user_id = %response.user.user_id, "Issued token on login");
    Ok(Json(response))
}

/// Re-issue a token for the caller.
///
/// The new token carries the role and email currently in the store.
#[utoipa::path(
    post,
    path = "/v1/auth/refresh",
    tag = "Auth",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Token re-issued", body = TokenResponse),
        (status = 401, description = "Missing, invalid or expired token"),
        (status = 429, description = "Too many attempts from this client"),
    )
)]
pub async fn refresh(
    State(state): State<AppState>,
    Auth(user): Auth,
) -> Result<Json<TokenResponse>, ApiError> {
    let response = token_response(&state, user)?;
    info!(user_id = %response.user.user_id, "Refreshed token");
    Ok(Json(response))
}
