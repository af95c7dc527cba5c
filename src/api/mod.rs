// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! HTTP surface and per-route auth pipelines.
//!
//! | Route | Pipeline |
//! |-------|----------|
//! | `POST /v1/auth/login` | rate limit |
//! | `POST /v1/auth/refresh` | rate limit → strict auth |
//! | `GET /v1/users/me` | strict auth |
//! | `GET /v1/users/{user_id}/profile` | strict auth → ownership gate |
//! | `GET /v1/orders/{order_id}` | strict auth → order ownership validator |
//! | `GET /v1/products` | optional auth |
//! | `GET /v1/admin/users` | strict auth → admin gate |
//! | `POST /v1/admin/users/{user_id}/deactivate` | strict auth → identity refresh → admin gate |
//!
//! `route_layer` wraps the routes already added, so the last layer applied
//! to a group runs first.

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

use crate::{
    auth::{
        middleware::{optional_auth, refresh_identity, require_auth},
        policy::{enforce_policy, validate_ownership},
        rate_limit::rate_limit,
        AuthenticatedUser, OwnershipGate, Policy, Role, RoleGate,
    },
    models::{CatalogResponse, LoginRequest, Order, Product, TokenResponse, UserRecord},
    state::AppState,
};

pub mod admin;
pub mod auth;
pub mod catalog;
pub mod orders;
pub mod users;

pub fn router(state: AppState) -> Router {
    let authenticator = state.authenticator.clone();
    let admin_only = Policy::new().with(RoleGate::new([Role::Admin]));

    let refresh = Router::new()
        .route("/auth/refresh", post(auth::refresh))
        .route_layer(from_fn_with_state(authenticator.clone(), require_auth));
    let token_routes = Router::new()
        .route("/auth/login", post(auth::login))
        .merge(refresh)
        .route_layer(from_fn_with_state(state.limiter.clone(), rate_limit));

    let profile = Router::new()
        .route("/users/{user_id}/profile", get(users::get_profile))
        .route_layer(from_fn_with_state(
            Policy::new().with(OwnershipGate::path_param("user_id")),
            enforce_policy,
        ));
    let order = Router::new()
        .route("/orders/{order_id}", get(orders::get_order))
        .route_layer(from_fn_with_state(
            state.orders.clone(),
            validate_ownership::<Order>,
        ));
    let list_users = Router::new()
        .route("/admin/users", get(admin::list_users))
        .route_layer(from_fn_with_state(admin_only.clone(), enforce_policy));
    let deactivate = Router::new()
        .route(
            "/admin/users/{user_id}/deactivate",
            post(admin::deactivate_user),
        )
        .route_layer(from_fn_with_state(admin_only, enforce_policy))
        .route_layer(from_fn_with_state(authenticator.clone(), refresh_identity));
    let authenticated = Router::new()
        .route("/users/me", get(users::get_current_user))
        .merge(profile)
        .merge(order)
        .merge(list_users)
        .merge(deactivate)
        .route_layer(from_fn_with_state(authenticator.clone(), require_auth));

    let public = Router::new()
        .route("/products", get(catalog::list_products))
        .route_layer(from_fn_with_state(authenticator, optional_auth));

    let v1_routes = Router::new()
        .merge(token_routes)
        .merge(authenticated)
        .merge(public)
        .with_state(state);

    Router::new()
        .nest("/v1", v1_routes)
        .route("/api-doc/openapi.json", get(openapi_json))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(CorsLayer::permissive())
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

struct BearerSecurity;

impl Modify for BearerSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::login,
        auth::refresh,
        users::get_current_user,
        users::get_profile,
        orders::get_order,
        catalog::list_products,
        admin::list_users,
        admin::deactivate_user
    ),
    components(
        schemas(
            AuthenticatedUser,
            CatalogResponse,
            LoginRequest,
            Order,
            Product,
            Role,
            TokenResponse,
            UserRecord,
            users::UserMeResponse,
            users::UserProfileResponse,
            admin::AdminUserListResponse
        )
    ),
    modifiers(&BearerSecurity),
    tags(
        (name = "Auth", description = "Token issuance"),
        (name = "Users", description = "Caller identity and profiles"),
        (name = "Orders", description = "Owner-only order access"),
        (name = "Catalog", description = "Public product listing"),
        (name = "Admin", description = "Account administration")
    )
)]
struct ApiDoc;
