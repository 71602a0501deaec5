// rest/mod.rs — Public REST API server.
//
// Endpoints:
//   GET   /health
//   GET   /roadmaps
//   POST  /roadmaps
//   GET   /roadmaps/{id}
//   PATCH /roadmaps/{id}
//   PUT   /roadmaps/{id}

use anyhow::Result;
use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::roadmap::handlers;
use crate::AppContext;

pub async fn start_rest_server(ctx: Arc<AppContext>) -> Result<()> {
    let bind = format!("{}:{}", ctx.config.bind_address, ctx.config.port);
    let addr: SocketAddr = bind.parse()?;

    let router = build_router(ctx);

    info!("REST API listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;
    Ok(())
}

pub fn build_router(ctx: Arc<AppContext>) -> Router {
    Router::new()
        // Health (no auth)
        .route("/health", get(health))
        // Roadmaps
        .route(
            "/roadmaps",
            get(handlers::list_roadmaps).post(handlers::create_roadmap),
        )
        .route(
            "/roadmaps/{id}",
            get(handlers::get_roadmap)
                .patch(handlers::patch_section)
                .put(handlers::submit_edit),
        )
        // The consumer is a browser front end on another origin.
        .layer(CorsLayer::permissive())
        .with_state(ctx)
}

async fn health(State(ctx): State<Arc<AppContext>>) -> Json<Value> {
    let uptime = ctx.started_at.elapsed().as_secs();
    Json(json!({
        "status": "ok",
        "uptime_secs": uptime,
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
