// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Server configuration loaded from environment variables.

use solarplan_processing::PipelineConfig;
use std::path::PathBuf;
use std::str::FromStr;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port to listen on.
    pub port: u16,
    /// Building glTF loaded at startup.
    pub building_asset: Option<PathBuf>,
    /// Panel glTF loaded at startup.
    pub panel_asset: Option<PathBuf>,
    /// Preferred node or mesh name inside the panel asset.
    pub panel_mesh_name: Option<String>,
    /// Calculation service endpoint returning `{ "solarPanels": [...] }`.
    pub overrides_url: Option<String>,
    /// Persisted result file read at startup when no URL is configured.
    pub overrides_file: Option<PathBuf>,
    /// Request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Seconds before an unfinished load stops counting as loading.
    pub loading_timeout_secs: u64,
    /// Panels across the long side of the roof.
    pub target_across: u32,
    /// Hard cap on placed panels.
    pub max_panels: usize,
    pub roof_margin_x: f64,
    pub roof_margin_z: f64,
    /// Allowed CORS origins (comma-separated, or "*" for all).
    pub cors_origins: Vec<String>,
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    match env_opt(key) {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "Ignoring unparsable environment value");
            default
        }),
        None => default,
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let layout = PipelineConfig::default().layout;
        Self {
            port: env_or("PORT", 8080),
            building_asset: env_opt("BUILDING_ASSET").map(PathBuf::from),
            panel_asset: env_opt("PANEL_ASSET").map(PathBuf::from),
            panel_mesh_name: env_opt("PANEL_MESH_NAME"),
            overrides_url: env_opt("OVERRIDES_URL"),
            overrides_file: env_opt("OVERRIDES_FILE").map(PathBuf::from),
            request_timeout_secs: env_or("REQUEST_TIMEOUT_SECS", 30),
            loading_timeout_secs: env_or("LOADING_TIMEOUT_SECS", 10),
            target_across: env_or("TARGET_ACROSS", layout.target_across),
            max_panels: env_or("MAX_PANELS", layout.max_panels),
            roof_margin_x: env_or("ROOF_MARGIN_X", layout.margin_x),
            roof_margin_z: env_or("ROOF_MARGIN_Z", layout.margin_z),
            cors_origins: env_opt("CORS_ORIGINS")
                .unwrap_or_else(|| {
                    // Default: allow common development origins
                    "http://localhost:3000,http://localhost:5173,http://127.0.0.1:3000,http://127.0.0.1:5173".into()
                })
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }

    /// Pipeline settings derived from the environment.
    pub fn pipeline(&self) -> PipelineConfig {
        let mut pipeline = PipelineConfig::default();
        pipeline.footprint.mesh_name = self.panel_mesh_name.clone();
        pipeline.layout.target_across = self.target_across;
        pipeline.layout.max_panels = self.max_panels;
        pipeline.layout.margin_x = self.roof_margin_x;
        pipeline.layout.margin_z = self.roof_margin_z;
        pipeline.loading_timeout_ms = self.loading_timeout_secs.saturating_mul(1000);
        pipeline
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
