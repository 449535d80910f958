// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Enclave Keystore Contributors

//! CSR approval endpoints.
//!
//! Transport, TLS, and client authentication are owned by the layer in
//! front of this service; handlers receive already-decoded arguments and
//! return plain values.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::state::AppState;
use crate::storage::CsrStatus;

#[derive(Debug, Deserialize, ToSchema)]
pub struct SignByHashRequest {
    /// Disposition code: 0 = approved, 2 = rejected.
    pub status: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SignByHashResponse {
    pub hash: String,
    /// The disposition code that was recorded.
    pub status: i64,
}

#[utoipa::path(
    get,
    path = "/v1/csr/unsigned",
    tag = "CSR",
    responses((status = 200, description = "Hashes of all pending CSRs", body = Vec<String>))
)]
pub async fn list_unsigned(
    State(state): State<AppState>,
) -> Result<Json<Vec<String>>, ApiError> {
    let hashes = state.csr.list_unsigned()?;
    Ok(Json(hashes))
}

#[utoipa::path(
    post,
    path = "/v1/csr/{hash}/sign",
    request_body = SignByHashRequest,
    params(("hash" = String, Path, description = "Content hash of the CSR")),
    tag = "CSR",
    responses(
        (status = 200, description = "Disposition recorded", body = SignByHashResponse),
        (status = 400, description = "Unrecognized status code"),
        (status = 404, description = "No CSR with this hash")
    )
)]
pub async fn sign_by_hash(
    State(state): State<AppState>,
    Path(hash): Path<String>,
    Json(request): Json<SignByHashRequest>,
) -> Result<Json<SignByHashResponse>, ApiError> {
    let status = CsrStatus::try_from(request.status)?;
    state.csr.record_status(&hash, status)?;

    Ok(Json(SignByHashResponse {
        hash,
        status: status.code(),
    }))
}
