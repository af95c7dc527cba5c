// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Storefront Auth - request authentication and authorization core
//!
//! Signed bearer tokens, a fixed-window limiter for credential endpoints,
//! per-route authentication middleware and composable role and ownership
//! gates, served over Axum.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers and route pipelines (Axum)
//! - `auth` - Token service, rate limiter, middleware and policy gates
//! - `config` - Environment-driven settings
//! - `store` - User, credential and resource store capabilities

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod state;
pub mod store;
