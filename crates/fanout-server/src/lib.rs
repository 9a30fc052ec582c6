//! Fanout SFU Server Library
//!
//! This module exposes the server components for testing and embedding.

pub mod api;
pub mod error;
pub mod sfu;
pub mod state;

use anyhow::Result;
use std::sync::Arc;

/// Create the SFU and the signaling router that serves it
pub async fn create_app(config: state::Config) -> Result<(axum::Router, Arc<sfu::SfuServer>)> {
    let sfu = Arc::new(sfu::SfuServer::new(&config).await?);
    let app_state = state::AppState::new(config, sfu.clone());
    let router = api::create_router(app_state);
    Ok((router, sfu))
}
