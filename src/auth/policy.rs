// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authorization gates.
//!
//! A [`Policy`] is an ordered list of [`Gate`]s evaluated after the auth
//! middleware. Every gate must allow; the first denial decides the response
//! and the remaining gates are skipped.
//!
//! ```rust,ignore
//! let admin_only = Policy::new().with(RoleGate::new([Role::Admin]));
//! let own_profile = Policy::new().with(OwnershipGate::path_param("user_id"));
//!
//! Router::new()
//!     .route("/v1/users/{user_id}/profile", get(profile))
//!     .route_layer(from_fn_with_state(own_profile, enforce_policy))
//!     .route_layer(from_fn_with_state(authenticator, require_auth));
//! ```
//!
//! Resources that must be loaded before their owner is known go through
//! [`OwnershipValidator`] and the [`validate_ownership`] middleware instead.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{FromRequestParts, RawPathParams, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::middleware::{AuthOutcome, DEFAULT_LOOKUP_TIMEOUT};
use super::ownership::{check_owner, OwnedResource, OwnershipCheck};
use super::{AuthError, AuthenticatedUser, Role};
use crate::store::ResourceStore;

/// What a gate can see about the request.
#[derive(Debug, Clone, Copy)]
pub struct GateContext<'a> {
    /// `None` for anonymous callers.
    pub identity: Option<&'a AuthenticatedUser>,
    /// Matched route parameters, in route order.
    pub path_params: &'a [(String, String)],
}

impl<'a> GateContext<'a> {
    pub fn new(
        identity: Option<&'a AuthenticatedUser>,
        path_params: &'a [(String, String)],
    ) -> Self {
        Self {
            identity,
            path_params,
        }
    }

    pub fn path_param(&self, name: &str) -> Option<&'a str> {
        self.path_params
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Gate verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(AuthError),
}

impl From<Result<(), AuthError>> for Decision {
    fn from(result: Result<(), AuthError>) -> Self {
        match result {
            Ok(()) => Decision::Allow,
            Err(err) => Decision::Deny(err),
        }
    }
}

/// A single synchronous pass/fail check.
pub trait Gate: Send + Sync {
    fn evaluate(&self, ctx: &GateContext<'_>) -> Decision;
}

/// Allows callers whose role is in the allowed set.
#[derive(Debug, Clone)]
pub struct RoleGate {
    allowed: Vec<Role>,
}

impl RoleGate {
    pub fn new(allowed: impl IntoIterator<Item = Role>) -> Self {
        Self {
            allowed: allowed.into_iter().collect(),
        }
    }

    pub fn allowed(&self) -> &[Role] {
        &self.allowed
    }
}

impl Gate for RoleGate {
    fn evaluate(&self, ctx: &GateContext<'_>) -> Decision {
        match ctx.identity {
            Some(user) if user.has_any_role(&self.allowed) => Decision::Allow,
            _ => Decision::Deny(AuthError::InsufficientRole),
        }
    }
}

/// Where an [`OwnershipGate`] finds the resource owner's id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OwnerSource {
    /// Owner id known when the route is built.
    Explicit(String),
    /// Owner id is the value of this path parameter.
    PathParam(&'static str),
}

/// Allows the resource owner and admins.
#[derive(Debug, Clone)]
pub struct OwnershipGate {
    source: OwnerSource,
}

impl OwnershipGate {
    pub fn owner(owner_id: impl Into<String>) -> Self {
        Self {
            source: OwnerSource::Explicit(owner_id.into()),
        }
    }

    pub fn path_param(name: &'static str) -> Self {
        Self {
            source: OwnerSource::PathParam(name),
        }
    }
}

impl Gate for OwnershipGate {
    fn evaluate(&self, ctx: &GateContext<'_>) -> Decision {
        let Some(user) = ctx.identity else {
            return Decision::Deny(AuthError::OwnershipDenied);
        };
        let owner_id = match &self.source {
            OwnerSource::Explicit(owner_id) => owner_id.as_str(),
            OwnerSource::PathParam(name) => match ctx.path_param(name) {
                Some(value) => value,
                None => {
                    return Decision::Deny(AuthError::internal(format!(
                        "route has no path parameter `{name}`"
                    )))
                }
            },
        };
        check_owner(user, owner_id).into()
    }
}

/// Conjunction of gates, evaluated in order with short-circuit.
#[derive(Clone, Default)]
pub struct Policy {
    gates: Vec<Arc<dyn Gate>>,
}

impl Policy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a gate. Gates run in the order they are added.
    pub fn with(mut self, gate: impl Gate + 'static) -> Self {
        self.gates.push(Arc::new(gate));
        self
    }

    pub fn len(&self) -> usize {
        self.gates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gates.is_empty()
    }

    /// First denial wins; an empty policy allows.
    pub fn evaluate(&self, ctx: &GateContext<'_>) -> Result<(), AuthError> {
        for gate in &self.gates {
            if let Decision::Deny(err) = gate.evaluate(ctx) {
                return Err(err);
            }
        }
        Ok(())
    }
}

async fn path_params(parts: &mut Parts) -> Vec<(String, String)> {
    RawPathParams::from_request_parts(parts, &())
        .await
        .map(|params| {
            params
                .iter()
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect()
        })
        .unwrap_or_default()
}

fn identity(parts: &Parts) -> Option<&AuthenticatedUser> {
    parts
        .extensions
        .get::<AuthOutcome>()
        .and_then(AuthOutcome::user)
}

/// Evaluate a [`Policy`] against the request. Must run after the auth
/// middleware.
pub async fn enforce_policy(
    State(policy): State<Policy>,
    request: Request,
    next: Next,
) -> Response {
    let (mut parts, body) = request.into_parts();
    let params = path_params(&mut parts).await;

    let verdict = policy.evaluate(&GateContext::new(identity(&parts), &params));
    if let Err(err) = verdict {
        err.log("policy");
        return err.into_response();
    }

    next.run(Request::from_parts(parts, body)).await
}

/// A resource that passed ownership validation, stored in request extensions.
#[derive(Debug, Clone)]
pub struct Loaded<R>(pub R);

/// Loads a resource by a path parameter and checks the caller owns it.
pub struct OwnershipValidator<R> {
    store: Arc<dyn ResourceStore<R>>,
    param: &'static str,
    lookup_timeout: Duration,
}

impl<R> Clone for OwnershipValidator<R> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            param: self.param,
            lookup_timeout: self.lookup_timeout,
        }
    }
}

impl<R> OwnershipValidator<R>
where
    R: OwnedResource + Send + Sync + 'static,
{
    /// `param` names the path parameter carrying the resource id.
    pub fn new(store: Arc<dyn ResourceStore<R>>, param: &'static str) -> Self {
        Self {
            store,
            param,
            lookup_timeout: DEFAULT_LOOKUP_TIMEOUT,
        }
    }

    pub fn with_lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout = timeout;
        self
    }

    pub fn param(&self) -> &'static str {
        self.param
    }

    /// Load `resource_id` and apply the ownership gate to it.
    ///
    /// Anonymous callers are denied without touching the store.
    pub async fn authorize(
        &self,
        identity: Option<&AuthenticatedUser>,
        resource_id: &str,
    ) -> Result<R, AuthError> {
        let user = identity.ok_or(AuthError::OwnershipDenied)?;

        let loaded =
            match tokio::time::timeout(self.lookup_timeout, self.store.find_by_id(resource_id))
                .await
            {
                Ok(Ok(loaded)) => loaded,
                Ok(Err(e)) => {
                    return Err(AuthError::internal(format!("resource lookup failed: {e}")))
                }
                Err(_) => {
                    return Err(AuthError::internal(format!(
                        "resource lookup timed out after {}ms",
                        self.lookup_timeout.as_millis()
                    )))
                }
            };

        loaded.verify_owner(user)
    }
}

/// Validate ownership of the resource named by the validator's path
/// parameter, and attach it as [`Loaded<R>`] for the handler.
pub async fn validate_ownership<R>(
    State(validator): State<OwnershipValidator<R>>,
    request: Request,
    next: Next,
) -> Response
where
    R: OwnedResource + Clone + Send + Sync + 'static,
{
    let (mut parts, body) = request.into_parts();
    let params = path_params(&mut parts).await;
    let ctx = GateContext::new(None, &params);

    let Some(resource_id) = ctx.path_param(validator.param()) else {
        let err = AuthError::internal(format!(
            "route has no path parameter `{}`",
            validator.param()
        ));
        err.log("validate_ownership");
        return err.into_response();
    };

    let caller = identity(&parts).cloned();
    match validator.authorize(caller.as_ref(), resource_id).await {
        Ok(resource) => {
            parts.extensions.insert(Loaded(resource));
            next.run(Request::from_parts(parts, body)).await
        }
        Err(err) => {
            err.log("validate_ownership");
            err.into_response()
        }
    }
}
