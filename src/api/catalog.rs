// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Public catalog. Signed-in callers are recognized but never required.

use axum::{extract::State, Json};

use crate::{auth::OptionalAuth, models::CatalogResponse, state::AppState};

/// List products.
///
/// A bad or expired token is treated as no token.
#[utoipa::path(
    get,
    path = "/v1/products",
    tag = "Catalog",
    security((), ("bearer" = [])),
    responses(
        (status = 200, description = "Product listing", body = CatalogResponse),
    )
)]
pub async fn list_products(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
) -> Json<CatalogResponse> {
    Json(CatalogResponse {
        viewer: user.map(|u| u.user_id),
        products: state.store.products(),
    })
}
