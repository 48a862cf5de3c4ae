// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Pipeline configuration

use serde::{Deserialize, Serialize};
use solarplan_geometry::{FootprintConfig, LayoutConfig, Result, RoofDetectorConfig};
use std::time::Duration;

/// Default time after which an unfinished load stops counting as loading
pub const DEFAULT_LOADING_TIMEOUT_MS: u64 = 10_000;

/// Every tunable of the placement pipeline in one place
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub roof: RoofDetectorConfig,
    pub footprint: FootprintConfig,
    pub layout: LayoutConfig,
    /// Milliseconds before the loading signal clears itself
    pub loading_timeout_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            roof: RoofDetectorConfig::default(),
            footprint: FootprintConfig::default(),
            layout: LayoutConfig::default(),
            loading_timeout_ms: DEFAULT_LOADING_TIMEOUT_MS,
        }
    }
}

impl PipelineConfig {
    pub fn loading_timeout(&self) -> Duration {
        Duration::from_millis(self.loading_timeout_ms)
    }

    /// Validate every nested section
    pub fn validate(&self) -> Result<()> {
        self.roof.validate()?;
        self.footprint.validate()?;
        self.layout.validate()
    }
}
