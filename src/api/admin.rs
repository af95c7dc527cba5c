// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Admin-only API endpoints.
//!
//! Both routes sit behind an admin role gate. Deactivation also re-loads the
//! caller from the store first, so a just-demoted admin cannot use a token
//! issued before the demotion.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use tracing::info;
use utoipa::ToSchema;

use crate::{auth::Auth, error::ApiError, models::UserRecord, state::AppState};

/// Response for admin user list.
#[derive(Debug, Serialize, ToSchema)]
pub struct AdminUserListResponse {
    pub users: Vec<UserRecord>,
    /// Total users.
    pub total: usize,
}

/// List all users.
#[utoipa::path(
    get,
    path = "/v1/admin/users",
    tag = "Admin",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "All users", body = AdminUserListResponse),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not authorized (admin required)")
    )
)]
pub async fn list_users(State(state): State<AppState>) -> Json<AdminUserListResponse> {
    let users = state.store.list_users().await;
    let total = users.len();
    Json(AdminUserListResponse { users, total })
}

/// Deactivate a user account.
///
/// Takes effect on the user's next request: tokens already issued are
/// rejected once the store shows the account inactive.
#[utoipa::path(
    post,
    path = "/v1/admin/users/{user_id}/deactivate",
    tag = "Admin",
    security(("bearer" = [])),
    params(("user_id" = String, Path, description = "User to deactivate")),
    responses(
        (status = 200, description = "Updated user", body = UserRecord),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not authorized (admin required)"),
        (status = 404, description = "User not found")
    )
)]
pub async fn deactivate_user(
    Auth(admin): Auth,
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<UserRecord>, ApiError> {
    let updated = state
        .store
        .set_active(&user_id, false)
        .await
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    info!(admin_id = %admin.user_id, user_id = %updated.id, "Deactivated user");
    Ok(Json(updated))
}
