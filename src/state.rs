// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::{AuthError, Authenticator, OwnershipValidator, RateLimiter, TokenService};
use crate::config::AuthSettings;
use crate::models::Order;
use crate::store::{CredentialVerifier, InMemoryStore};

/// Path parameter carrying the order id on order routes.
pub const ORDER_ID_PARAM: &str = "order_id";

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<AuthSettings>,
    /// Concrete store, for admin operations the auth traits do not cover.
    pub store: Arc<InMemoryStore>,
    pub credentials: Arc<dyn CredentialVerifier>,
    pub authenticator: Authenticator,
    pub limiter: Arc<RateLimiter>,
    pub orders: OwnershipValidator<Order>,
}

impl AppState {
    /// Wire the auth pipeline over a store.
    ///
    /// Fails only if the signing configuration is unusable.
    pub fn new(settings: AuthSettings, store: Arc<InMemoryStore>) -> Result<Self, AuthError> {
        let tokens = Arc::new(TokenService::new(
            settings.jwt_secret.as_bytes(),
            settings.token_ttl,
        )?);
        let authenticator = Authenticator::new(tokens, store.clone())
            .with_lookup_timeout(settings.lookup_timeout);
        let orders = OwnershipValidator::<Order>::new(store.clone(), ORDER_ID_PARAM)
            .with_lookup_timeout(settings.lookup_timeout);
        let limiter = Arc::new(RateLimiter::new(settings.rate_limit));

        Ok(Self {
            settings: Arc::new(settings),
            credentials: store.clone(),
            store,
            authenticator,
            limiter,
            orders,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn new_wires_settings_through() {
        let mut settings = AuthSettings::with_secret("state-test-secret-of-32-bytes-ok");
        settings.token_ttl = Duration::from_secs(60);
        settings.rate_limit.max_requests = 3;

        let state = AppState::new(settings, Arc::new(InMemoryStore::new())).unwrap();
        assert_eq!(state.authenticator.tokens().ttl(), Duration::from_secs(60));
        assert_eq!(state.limiter.config().max_requests, 3);
        assert_eq!(state.orders.param(), ORDER_ID_PARAM);
    }

    #[test]
    fn empty_secret_is_rejected() {
        let result = AppState::new(AuthSettings::with_secret(""), Arc::new(InMemoryStore::new()));
        assert!(result.is_err());
    }
}
