//! Pong Service
//!
//! Answers pings from other mesh services.

use axum::{routing::get, Router};

/// Routes mounted at the root prefix
pub fn router() -> Router {
    Router::new().route("/", get(pong))
}

async fn pong() -> &'static str {
    "Pong!"
}
