// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Override sources: the calculation service and persisted result files.

use crate::error::ApiError;
use crate::AppState;
use solarplan_core::OverrideSet;
use std::path::Path;
use std::time::Instant;

/// GET the calculation service and decode its response.
pub async fn fetch_overrides(http: &reqwest::Client, url: &str) -> Result<OverrideSet, ApiError> {
    let resp = http.get(url).send().await?;

    if !resp.status().is_success() {
        return Err(ApiError::Upstream(format!(
            "Override request failed with status {}",
            resp.status()
        )));
    }

    let body: serde_json::Value = resp.json().await?;
    Ok(OverrideSet::from_json_value(&body)?)
}

/// Read a persisted result (or calculation response) from disk.
pub async fn read_overrides_file(path: &Path) -> Result<OverrideSet, ApiError> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ApiError::Internal(format!("Reading {}: {e}", path.display())))?;
    Ok(OverrideSet::from_json_str(&text)?)
}

/// Re-fetch overrides from the configured URL into the composer.
///
/// Fetch failures are logged and replaced by an empty list, so the layout
/// falls back to flat, north-facing panels.
pub async fn refresh_overrides(state: &AppState, url: &str) -> OverrideSet {
    let ticket = state.composer().begin_overrides_load(Instant::now());

    let overrides = match fetch_overrides(&state.http, url).await {
        Ok(set) => {
            tracing::info!(count = set.len(), total_kwp = set.total_kwp(), "Fetched overrides");
            set
        }
        Err(e) => {
            tracing::warn!(url, error = %e, "Override fetch failed, using defaults");
            OverrideSet::empty()
        }
    };

    let accepted = state
        .composer()
        .complete_overrides(ticket, overrides.clone(), Instant::now());
    if !accepted {
        tracing::debug!("Discarded superseded override fetch");
    }
    overrides
}
