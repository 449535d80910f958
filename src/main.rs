// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Enclave Keystore Contributors

mod api;
mod config;
mod error;
mod state;
mod storage;

#[cfg(not(test))]
use std::{env, net::SocketAddr, sync::Arc};

#[cfg(not(test))]
use api::router;
#[cfg(not(test))]
use state::AppState;
#[cfg(not(test))]
use storage::StoreRegistry;
#[cfg(not(test))]
use tracing_subscriber::EnvFilter;

#[cfg(not(test))]
#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Open the wallet databases; the service cannot run without them
    let registry = Arc::new(StoreRegistry::new());
    let data_dir = config::data_dir();
    registry
        .initialize(&data_dir)
        .expect("Failed to initialize wallet databases");

    let state = AppState::new(registry);
    let app = router(state);

    // Parse bind address
    let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = env::var("PORT")
        .unwrap_or_else(|_| "1028".to_string())
        .parse()
        .unwrap_or(1028);

    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .expect("Failed to parse bind address");

    tracing::info!(%addr, "enclave keystore listening (docs at /docs)");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listen address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("HTTP server failed");
}

#[cfg(not(test))]
async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::info!("received exit signal, shutting down");
    }
}
