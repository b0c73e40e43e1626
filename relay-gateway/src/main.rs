//! Entry point for the `relay-gateway` HTTP server.

use std::sync::Arc;

use relay_gateway::{routes::create_router, store::NoteStore};
use tracing::info;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let addr = std::env::var("RELAY_LISTEN_ADDR")
        .unwrap_or_else(|_| "127.0.0.1:3000".to_owned());
    let token = std::env::var("RELAY_GATEWAY_TOKEN")
        .unwrap_or_else(|_| "letmein".to_owned());

    let store = Arc::new(NoteStore::new());
    let app = create_router(store, &token);

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!(addr = %addr, error = %e, "failed to bind");
            std::process::exit(1);
        }
    };

    info!(addr = %addr, "relay-gateway listening");

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(error = %e, "server error");
        std::process::exit(1);
    }
}
