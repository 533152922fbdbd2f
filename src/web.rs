use std::time::Duration;

use anyhow::{Context, Result};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;

use crate::api::{self, AppState};
use crate::config::DashboardConfig;
use crate::open_meteo::Collaborators;

/// The full application router, `/api` routes included
pub fn app(config: &DashboardConfig, collaborators: Collaborators) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let state = AppState::new(collaborators, config.defaults.forecast_days);
    Router::new()
        .nest("/api", api::router(state))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_seconds,
        )))
        .layer(cors)
}

pub async fn run(config: &DashboardConfig, collaborators: Collaborators, port: u16) -> Result<()> {
    let app = app(config, collaborators);

    let addr = format!("{}:{}", config.server.host, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Web server running at http://{}", addr);
    axum::serve(listener, app).await.context("Web server stopped")?;
    Ok(())
}
