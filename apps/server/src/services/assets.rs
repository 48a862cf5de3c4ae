// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Background glTF loading into the composer.

use crate::error::ApiError;
use crate::AppState;
use solarplan_core::{load_scene, SceneAsset};
use solarplan_processing::Slot;
use std::path::PathBuf;
use std::time::Instant;

/// Decode a glTF file off the async runtime.
pub async fn load_asset(path: PathBuf) -> Result<SceneAsset, ApiError> {
    let asset = tokio::task::spawn_blocking(move || load_scene(&path)).await??;
    Ok(asset)
}

/// Start loading `path` into `slot`. The composer drops the result if a newer
/// load for the same slot starts in the meantime.
pub fn spawn_asset_load(state: &AppState, slot: Slot, path: PathBuf) {
    let ticket = state.composer().begin_load(slot, Instant::now());
    let state = state.clone();

    tokio::spawn(async move {
        let start = Instant::now();
        let asset = match load_asset(path.clone()).await {
            Ok(asset) => {
                tracing::info!(
                    ?slot,
                    path = %path.display(),
                    id = %asset.id,
                    nodes = asset.nodes.len(),
                    load_time_ms = start.elapsed().as_millis(),
                    "Asset loaded"
                );
                Some(asset)
            }
            Err(e) => {
                tracing::warn!(?slot, path = %path.display(), error = %e, "Asset failed to load");
                None
            }
        };

        let mut composer = state.composer();
        let accepted = match slot {
            Slot::Building => composer.complete_building(ticket, asset, Instant::now()),
            Slot::Panel => composer.complete_panel(ticket, asset, Instant::now()),
            Slot::Overrides => false,
        };
        if !accepted {
            tracing::debug!(?slot, path = %path.display(), "Discarded superseded asset load");
        }
    });
}
