//! Inter-service Dispatcher
//!
//! Resolves an envelope's target through [`Discovery`] and forwards it as a
//! single HTTP call. No retries: every `send` makes at most one outbound
//! request, and the whole exchange is bounded by the dispatch timeout.

use std::sync::Arc;
use std::time::Duration;

use axum::http::{header, Method};
use tracing::{debug, warn};

use crate::config::MeshConfig;
use crate::discovery::{Discovery, StaticDiscovery};
use crate::envelope::{Envelope, RemoteResponse};
use crate::error::DispatchError;

pub const FROM_HEADER: &str = "x-mesh-from";
pub const MID_HEADER: &str = "x-mesh-mid";

/// Resolves service names and forwards envelopes over HTTP
pub struct Dispatcher {
    http_client: reqwest::Client,
    discovery: Arc<dyn Discovery>,
    timeout: Duration,
}

impl Dispatcher {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    pub fn new(discovery: Arc<dyn Discovery>, timeout: Duration) -> Result<Self, DispatchError> {
        Ok(Self {
            http_client: reqwest::Client::builder().build()?,
            discovery,
            timeout,
        })
    }

    /// Dispatcher over the static discovery map in `config`
    pub fn from_config(config: &MeshConfig) -> Result<Self, DispatchError> {
        let discovery = StaticDiscovery::from_map(&config.discovery.services);
        Self::new(Arc::new(discovery), config.dispatch_timeout())
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Send an envelope and wait for the remote response.
    ///
    /// Any status the remote returns is a successful dispatch; callers decide
    /// what a non-200 means. Dropping the returned future cancels the call.
    pub async fn send(&self, envelope: Envelope) -> Result<RemoteResponse, DispatchError> {
        let result = match tokio::time::timeout(self.timeout, self.dispatch(&envelope)).await {
            Ok(result) => result,
            Err(_) => Err(DispatchError::Timeout(self.timeout)),
        };

        if let Err(e) = &result {
            warn!(
                mid = %envelope.mid(),
                to = envelope.to(),
                from = %envelope.from(),
                error = %e,
                "Dispatch failed"
            );
        }
        result
    }

    async fn dispatch(&self, envelope: &Envelope) -> Result<RemoteResponse, DispatchError> {
        let target = envelope.target();

        let instance = match self.discovery.resolve(&target.service).await {
            Ok(Some(instance)) => instance,
            Ok(None) => return Err(DispatchError::Unresolvable(target.service.clone())),
            Err(e) => return Err(DispatchError::Discovery(e.to_string())),
        };

        let url = instance.url_for(&target.path);
        debug!(
            mid = %envelope.mid(),
            to = envelope.to(),
            from = %envelope.from(),
            url = %url,
            "Dispatching envelope"
        );

        let mut request = self
            .http_client
            .request(target.method.clone(), &url)
            .header(FROM_HEADER, envelope.from().as_str())
            .header(MID_HEADER, envelope.mid().to_string());

        if carries_body(&target.method) && !envelope.body().is_null() {
            request = request.json(envelope.body());
        }

        let response = request.send().await?;
        let status_code = response.status().as_u16();
        let is_json = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.contains("json"))
            .unwrap_or(false);

        let bytes = response.bytes().await?;

        Ok(RemoteResponse {
            status_code,
            body: decode_body(&bytes, is_json)?,
        })
    }
}

fn carries_body(method: &Method) -> bool {
    !matches!(*method, Method::GET | Method::HEAD)
}

/// JSON bodies are parsed; anything else becomes a JSON string
fn decode_body(bytes: &[u8], is_json: bool) -> Result<serde_json::Value, DispatchError> {
    if is_json {
        if bytes.is_empty() {
            return Ok(serde_json::Value::Null);
        }
        return serde_json::from_slice(bytes).map_err(|e| DispatchError::Decode(e.to_string()));
    }

    String::from_utf8(bytes.to_vec())
        .map(serde_json::Value::String)
        .map_err(|e| DispatchError::Decode(e.to_string()))
}
