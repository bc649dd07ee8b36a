//! Service Host
//!
//! Startup collaborator for a mesh service: takes the config and a route
//! table `{prefix: Router}`, adds `/health` and the HTTP layers, and serves.

use std::future::Future;

use anyhow::{Context, Result};
use axum::{routing::get, Json, Router};
use serde::Serialize;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::MeshConfig;

#[derive(Debug, Clone, Serialize)]
struct HealthReport {
    status: &'static str,
    service: String,
    version: &'static str,
}

pub struct ServiceHost {
    config: MeshConfig,
    version: &'static str,
    routes: Vec<(String, Router)>,
}

impl ServiceHost {
    pub fn new(config: MeshConfig) -> Self {
        Self {
            config,
            version: env!("CARGO_PKG_VERSION"),
            routes: Vec::new(),
        }
    }

    /// Version reported by `/health`
    pub fn with_version(mut self, version: &'static str) -> Self {
        self.version = version;
        self
    }

    pub fn config(&self) -> &MeshConfig {
        &self.config
    }

    /// Mount routers by prefix. `""` and `"/"` mount at the root.
    pub fn register_routes<I, P>(mut self, table: I) -> Self
    where
        I: IntoIterator<Item = (P, Router)>,
        P: Into<String>,
    {
        for (prefix, router) in table {
            let prefix = normalize_prefix(&prefix.into());
            let mount = if prefix.is_empty() { "/" } else { prefix.as_str() };
            info!(service = %self.config.service.name, prefix = mount, "Registered routes");
            self.routes.push((prefix, router));
        }
        self
    }

    /// Final application router
    pub fn router(&self) -> Router {
        let report = HealthReport {
            status: "healthy",
            service: self.config.service.name.to_string(),
            version: self.version,
        };

        let mut app = Router::new().route(
            "/health",
            get(move || {
                let report = report.clone();
                async move { Json(report) }
            }),
        );

        for (prefix, router) in &self.routes {
            app = if prefix.is_empty() {
                app.merge(router.clone())
            } else {
                app.nest(prefix, router.clone())
            };
        }

        app.layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
    }

    /// Bind the configured address and serve until Ctrl-C
    pub async fn serve(self) -> Result<()> {
        let addr = self.config.bind_addr();
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {}", addr))?;

        self.serve_on(listener, shutdown_signal()).await
    }

    pub async fn serve_on<F>(self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        info!(
            service = %self.config.service.name,
            environment = %self.config.environment,
            "{} listening on {}",
            self.config.service.name,
            addr
        );

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
            .context("Server error")?;

        info!(service = %self.config.service.name, "Shut down");
        Ok(())
    }
}

fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{}", trimmed)
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
