//! Ping Service
//!
//! `GET /` answers locally; `GET /send-ping` calls pong-service through the
//! mesh dispatcher and relays what it got back.

use std::sync::Arc;

use axum::{
    extract::State,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use pingpong_mesh::{Dispatcher, Envelope, ServiceName};
use tracing::{info, warn};

pub const PONG_SERVICE: &str = "pong-service";
pub const PONG_TARGET: &str = "pong-service:[GET]/";

#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub service_name: ServiceName,
}

impl AppState {
    pub fn new(dispatcher: Arc<Dispatcher>, service_name: ServiceName) -> Self {
        Self {
            dispatcher,
            service_name,
        }
    }
}

/// Routes mounted at the root prefix
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(ping))
        .route("/send-ping", get(send_ping))
        .with_state(state)
}

async fn ping() -> &'static str {
    "Ping!"
}

async fn send_ping(State(state): State<AppState>) -> Response {
    let envelope = match Envelope::new(
        PONG_TARGET,
        state.service_name.as_str(),
        serde_json::json!({}),
    ) {
        Ok(envelope) => envelope,
        Err(e) => return pingpong_mesh::DispatchError::from(e).into_response(),
    };
    let mid = envelope.mid();

    match state.dispatcher.send(envelope).await {
        Ok(remote) if remote.is_success_200() => {
            info!(mid = %mid, "pong-service answered");
            match remote.body {
                serde_json::Value::String(text) => text.into_response(),
                other => Json(other).into_response(),
            }
        }
        Ok(remote) => {
            warn!(mid = %mid, status = remote.status_code, "pong-service answered with non-200");
            Json(remote).into_response()
        }
        Err(e) => e.into_response(),
    }
}
