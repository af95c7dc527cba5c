// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User endpoints.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    auth::{Auth, AuthError, AuthenticatedUser, Role},
    error::ApiError,
    state::AppState,
    store::UserStore,
};

/// Response for GET /v1/users/me
#[derive(Debug, Serialize, ToSchema)]
pub struct UserMeResponse {
    /// User's unique ID
    pub user_id: String,
    pub email: String,
    /// User's role
    pub role: Role,
}

impl From<AuthenticatedUser> for UserMeResponse {
    fn from(user: AuthenticatedUser) -> Self {
        Self {
            user_id: user.user_id,
            email: user.email,
            role: user.role,
        }
    }
}

/// Profile as seen by its owner (or an admin).
#[derive(Debug, Serialize, ToSchema)]
pub struct UserProfileResponse {
    pub user_id: String,
    pub email: String,
    pub role: Role,
    pub is_active: bool,
}

/// Get the current authenticated user's information.
///
/// Identity comes from the user store at request time, not from the token.
#[utoipa::path(
    get,
    path = "/v1/users/me",
    tag = "Users",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "User information", body = UserMeResponse),
        (status = 401, description = "Unauthorized - invalid or missing token"),
    )
)]
pub async fn get_current_user(Auth(user): Auth) -> Json<UserMeResponse> {
    Json(user.into())
}

/// Get a user's profile. Owner or admin only.
#[utoipa::path(
    get,
    path = "/v1/users/{user_id}/profile",
    tag = "Users",
    security(("bearer" = [])),
    params(("user_id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "User profile", body = UserProfileResponse),
        (status = 401, description = "Unauthorized - invalid or missing token"),
        (status = 403, description = "Caller does not own this profile"),
        (status = 404, description = "User not found"),
    )
)]
pub async fn get_profile(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<UserProfileResponse>, ApiError> {
    let record = UserStore::find_by_id(state.store.as_ref(), &user_id)
        .await
        .map_err(|e| AuthError::internal(format!("profile lookup failed: {e}")))?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(Json(UserProfileResponse {
        user_id: record.id,
        email: record.email,
        role: record.role,
        is_active: record.is_active,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_me_response_from_authenticated_user() {
        let user = AuthenticatedUser {
            user_id: "user_123".to_string(),
            email: "ada@example.com".to_string(),
            role: Role::Corporate,
        };

        let response: UserMeResponse = user.into();
        assert_eq!(response.user_id, "user_123");
        assert_eq!(response.email, "ada@example.com");
        assert_eq!(response.role, Role::Corporate);
    }
}
