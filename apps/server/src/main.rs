// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! SolarPlan Server - rooftop solar panel layouts over HTTP.
//!
//! Loads a building and a panel model at startup, fetches per-panel
//! azimuth/slope overrides and serves the resulting panel instances.
//!
//! # Endpoints
//!
//! - `GET /api/v1/health` - Health check
//! - `GET /api/v1/layout` - Current layout and loading state
//! - `PUT /api/v1/overrides` - Replace overrides
//! - `POST /api/v1/overrides/refresh` - Re-fetch overrides from the calculation service

use anyhow::Context;
use axum::{
    http::HeaderValue,
    routing::{get, post, put},
    Router,
};
use solarplan_processing::{SceneComposer, Slot};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

mod config;
mod error;
mod routes;
mod services;

use config::Config;

/// How often the loading signal is re-checked against its timeout.
const LOADING_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub composer: Arc<Mutex<SceneComposer>>,
    pub config: Arc<Config>,
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(config: Config, composer: SceneComposer) -> Self {
        Self {
            composer: Arc::new(Mutex::new(composer)),
            config: Arc::new(config),
            http: reqwest::Client::new(),
        }
    }

    /// Lock the composer. A panic while holding the lock leaves it usable.
    pub fn composer(&self) -> MutexGuard<'_, SceneComposer> {
        self.composer.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any)
}

/// Build the router.
pub fn app(state: AppState) -> Router {
    let timeout = Duration::from_secs(state.config.request_timeout_secs);
    let cors = cors_layer(&state.config.cors_origins);

    Router::new()
        // Root endpoint - API information
        .route("/", get(routes::health::info))
        // Health check
        .route("/api/v1/health", get(routes::health::check))
        // Layout
        .route("/api/v1/layout", get(routes::layout::get_layout))
        // Overrides
        .route("/api/v1/overrides", put(routes::overrides::put_overrides))
        .route("/api/v1/overrides/refresh", post(routes::overrides::refresh))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::new(timeout))
                .layer(cors),
        )
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,tower_http=debug,solarplan_server=debug".into()),
        )
        .pretty()
        .init();

    let config = Config::from_env();
    let pipeline = config.pipeline();

    tracing::info!(
        port = config.port,
        building = ?config.building_asset,
        panel = ?config.panel_asset,
        overrides_url = ?config.overrides_url,
        target_across = pipeline.layout.target_across,
        max_panels = pipeline.layout.max_panels,
        "Starting SolarPlan Server"
    );

    let mut composer = SceneComposer::new(pipeline).context("Invalid layout configuration")?;
    composer.on_loading_change(|loading| {
        tracing::info!(loading, "Scene loading state changed");
    });
    let state = AppState::new(config.clone(), composer);

    if let Some(path) = config.building_asset.clone() {
        services::spawn_asset_load(&state, Slot::Building, path);
    }
    if let Some(path) = config.panel_asset.clone() {
        services::spawn_asset_load(&state, Slot::Panel, path);
    }

    match (&config.overrides_url, &config.overrides_file) {
        (Some(url), _) => {
            let state = state.clone();
            let url = url.clone();
            tokio::spawn(async move {
                services::refresh_overrides(&state, &url).await;
            });
        }
        (None, Some(path)) => match services::read_overrides_file(path).await {
            Ok(overrides) => {
                tracing::info!(count = overrides.len(), path = %path.display(), "Loaded overrides file");
                state.composer().set_overrides(overrides, Instant::now());
            }
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "Ignoring overrides file"),
        },
        (None, None) => {}
    }

    // Let the loading signal time out even when nobody asks for the layout
    let ticker = state.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(LOADING_POLL_INTERVAL);
        loop {
            interval.tick().await;
            ticker.composer().poll(Instant::now());
        }
    });

    let app = app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
