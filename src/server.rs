use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    Router,
    extract::{Request, State},
    response::Response,
};
use log::info;
use reqwest::Client;

use crate::{config::Config, handler};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub client: Client,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
            client: Client::new(),
        }
    }
}

async fn dispatch(State(state): State<AppState>, request: Request) -> Response {
    handler::handle_request(&state, request).await
}

/// Every method and path is routed to [`handler::handle_request`].
pub fn router(state: AppState) -> Router {
    Router::new().fallback(dispatch).with_state(state)
}

pub async fn serve(config: Config) -> Result<()> {
    let addr = config.bind_addr;
    let app = router(AppState::new(config));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("ics-filter-proxy listening on http://{}", addr);

    axum::serve(listener, app)
        .await
        .context("Server terminated unexpectedly")?;

    Ok(())
}
