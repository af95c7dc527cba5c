// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Order endpoints.
//!
//! The order is loaded and ownership-checked by the route's validator
//! before the handler runs; the handler only renders it.

use axum::Json;

use crate::{auth::Owned, models::Order};

/// Get an order. Owner or admin only.
#[utoipa::path(
    get,
    path = "/v1/orders/{order_id}",
    tag = "Orders",
    security(("bearer" = [])),
    params(("order_id" = String, Path, description = "Order ID")),
    responses(
        (status = 200, description = "The order", body = Order),
        (status = 401, description = "Unauthorized - invalid or missing token"),
        (status = 403, description = "Caller does not own this order"),
        (status = 404, description = "Order not found"),
    )
)]
pub async fn get_order(Owned(order): Owned<Order>) -> Json<Order> {
    Json(order)
}
