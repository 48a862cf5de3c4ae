// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types and handling for the server.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// API error types.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid override payload: {0}")]
    InvalidOverrides(String),

    #[error("Not configured: {0}")]
    NotConfigured(&'static str),

    #[error("Calculation service error: {0}")]
    Upstream(String),

    #[error("Asset error: {0}")]
    Asset(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Join error")]
    Join(#[from] tokio::task::JoinError),
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::InvalidOverrides(_) => (StatusCode::BAD_REQUEST, "INVALID_OVERRIDES"),
            ApiError::NotConfigured(_) => (StatusCode::CONFLICT, "NOT_CONFIGURED"),
            ApiError::Upstream(_) => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR"),
            ApiError::Asset(_) => (StatusCode::INTERNAL_SERVER_ERROR, "ASSET_ERROR"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            ApiError::Join(_) => (StatusCode::INTERNAL_SERVER_ERROR, "TASK_ERROR"),
        };

        let body = ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<solarplan_core::Error> for ApiError {
    fn from(err: solarplan_core::Error) -> Self {
        match err {
            solarplan_core::Error::OverridePayload(_) | solarplan_core::Error::UnknownOverrideShape => {
                ApiError::InvalidOverrides(err.to_string())
            }
            other => ApiError::Asset(other.to_string()),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Upstream(err.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Internal(format!("JSON error: {}", err))
    }
}
