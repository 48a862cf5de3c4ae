// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Override endpoints.

use crate::error::ApiError;
use crate::services::refresh_overrides;
use crate::AppState;
use axum::{extract::State, Json};
use serde::Serialize;
use solarplan_core::OverrideSet;
use std::time::Instant;

/// Summary of the override list now in effect.
#[derive(Debug, Serialize)]
pub struct OverridesResponse {
    pub count: usize,
    pub total_kwp: f64,
    /// Panels placed after applying the overrides.
    pub panels: usize,
}

/// PUT /api/v1/overrides - Replace the override list.
///
/// Accepts a calculation response, a persisted result or a bare array.
pub async fn put_overrides(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<OverridesResponse>, ApiError> {
    let overrides = OverrideSet::from_json_value(&body)?;
    let count = overrides.len();
    let total_kwp = overrides.total_kwp();

    let mut composer = state.composer();
    composer.set_overrides(overrides, Instant::now());
    let panels = composer.layout().len();
    drop(composer);

    tracing::info!(count, panels, "Overrides replaced");
    Ok(Json(OverridesResponse {
        count,
        total_kwp,
        panels,
    }))
}

/// POST /api/v1/overrides/refresh - Re-fetch from the calculation service.
pub async fn refresh(State(state): State<AppState>) -> Result<Json<OverridesResponse>, ApiError> {
    let url = state
        .config
        .overrides_url
        .clone()
        .ok_or(ApiError::NotConfigured("OVERRIDES_URL is not set"))?;

    let overrides = refresh_overrides(&state, &url).await;
    let panels = state.composer().layout().len();

    Ok(Json(OverridesResponse {
        count: overrides.len(),
        total_kwp: overrides.total_kwp(),
        panels,
    }))
}
