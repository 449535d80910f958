// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Enclave Keystore Contributors

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::state::AppState;

pub mod csr;
pub mod health;

pub fn router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route("/csr/unsigned", get(csr::list_unsigned))
        .route("/csr/{hash}/sign", post(csr::sign_by_hash));

    Router::new()
        .nest("/v1", v1_routes)
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        csr::list_unsigned,
        csr::sign_by_hash,
        health::health,
        health::liveness
    ),
    components(schemas(
        csr::SignByHashRequest,
        csr::SignByHashResponse,
        health::HealthResponse,
        health::ReadyResponse,
        health::HealthChecks
    )),
    tags(
        (name = "CSR", description = "Certificate signing request approval workflow"),
        (name = "Health", description = "Service health probes")
    )
)]
struct ApiDoc;
