// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::{env, net::SocketAddr, process::ExitCode, sync::Arc, time::Duration};

use tokio::{net::TcpListener, signal};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use storefront_auth::{
    api::router,
    auth::Role,
    config::{
        AuthSettings, DEFAULT_LOG_FILTER, LOG_FORMAT_ENV, SEED_ADMIN_EMAIL_ENV,
        SEED_ADMIN_PASSWORD_ENV,
    },
    state::AppState,
    store::InMemoryStore,
};

/// How often expired rate-limit buckets are dropped.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);

    match env::var(LOG_FORMAT_ENV).as_deref() {
        Ok("json") => builder.json().init(),
        _ => builder.init(),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let settings = match AuthSettings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };
    info!(?settings, "Configuration loaded");

    let store = Arc::new(InMemoryStore::new());
    if let (Ok(email), Ok(password)) = (
        env::var(SEED_ADMIN_EMAIL_ENV),
        env::var(SEED_ADMIN_PASSWORD_ENV),
    ) {
        let admin = store.create_user(&email, &password, Role::Admin).await;
        info!(user_id = %admin.id, "Seeded admin account");
    }

    let bind_addr = settings.bind_addr;
    let state = match AppState::new(settings, store) {
        Ok(state) => state,
        Err(e) => {
            error!(error = %e, "Failed to initialize auth pipeline");
            return ExitCode::FAILURE;
        }
    };

    let shutdown = CancellationToken::new();
    let sweeper = state
        .limiter
        .clone()
        .spawn_sweeper(SWEEP_INTERVAL, shutdown.clone());

    let app = router(state);
    let listener = match TcpListener::bind(bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(addr = %bind_addr, error = %e, "Failed to bind");
            return ExitCode::FAILURE;
        }
    };
    info!(addr = %bind_addr, "Storefront auth listening (OpenAPI at /api-doc/openapi.json)");

    let served = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
    .await;

    shutdown.cancel();
    if let Err(e) = sweeper.await {
        warn!(error = %e, "Rate limit sweeper ended abnormally");
    }

    match served {
        Ok(()) => {
            info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Server failed");
            ExitCode::FAILURE
        }
    }
}

/// Resolve on Ctrl+C or SIGTERM, cancelling background tasks.
async fn shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => warn!("Received Ctrl+C, initiating shutdown"),
        _ = terminate => warn!("Received SIGTERM, initiating shutdown"),
        _ = shutdown.cancelled() => {}
    }
    shutdown.cancel();
}
