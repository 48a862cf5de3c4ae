// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Layout endpoint.

use crate::AppState;
use axum::{extract::State, Json};
use serde::Serialize;
use solarplan_processing::LayoutResult;
use std::time::Instant;

/// Identity of a loaded asset.
#[derive(Debug, Serialize)]
pub struct AssetInfo {
    pub id: String,
    pub nodes: usize,
}

/// Current scene as seen by a renderer.
#[derive(Debug, Serialize)]
pub struct LayoutResponse {
    /// True while an asset or override load is outstanding.
    pub loading: bool,
    pub building: Option<AssetInfo>,
    pub panel: Option<AssetInfo>,
    pub layout: LayoutResult,
}

/// GET /api/v1/layout - Current panel instances.
pub async fn get_layout(State(state): State<AppState>) -> Json<LayoutResponse> {
    let mut composer = state.composer();
    let loading = composer.poll(Instant::now());
    let scene = composer.scene();
    drop(composer);

    let info = |asset: &solarplan_core::SceneAsset| AssetInfo {
        id: asset.id.to_string(),
        nodes: asset.nodes.len(),
    };

    Json(LayoutResponse {
        loading,
        building: scene.building.as_deref().map(info),
        panel: scene.panel.as_deref().map(info),
        layout: LayoutResult::clone(&scene.layout),
    })
}
