// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Footprint cache keyed by asset identity.
//!
//! Panel assets are measured once. Assets without a mesh are cached as
//! `None` so they are not re-scanned either. Changing the extraction
//! settings drops every entry.

use rustc_hash::FxHashMap;
use solarplan_core::{AssetId, SceneAsset};
use solarplan_geometry::{extract_footprint, FootprintConfig, PanelFootprint};

#[derive(Debug, Default)]
pub struct FootprintCache {
    entries: FxHashMap<AssetId, Option<PanelFootprint>>,
    config: Option<FootprintConfig>,
    hits: u64,
    misses: u64,
}

impl FootprintCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached footprint of `panel`, measuring it on first use
    pub fn get_or_extract(
        &mut self,
        panel: &SceneAsset,
        config: &FootprintConfig,
    ) -> Option<PanelFootprint> {
        if self.config.as_ref() != Some(config) {
            if !self.entries.is_empty() {
                tracing::debug!(entries = self.entries.len(), "Footprint settings changed, clearing cache");
            }
            self.entries.clear();
            self.config = Some(config.clone());
        }

        if let Some(cached) = self.entries.get(&panel.id) {
            self.hits += 1;
            return *cached;
        }

        self.misses += 1;
        let footprint = extract_footprint(panel, config);
        match &footprint {
            Some(fp) => tracing::debug!(
                asset = %panel.id,
                width_x = fp.width_x,
                depth_z = fp.depth_z,
                thickness = fp.thickness,
                normalization = fp.normalization_factor,
                "Measured panel footprint"
            ),
            None => tracing::warn!(asset = %panel.id, "Panel asset has no mesh"),
        }
        self.entries.insert(panel.id.clone(), footprint);
        footprint
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(hits, misses)` since creation
    pub fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
