//! Service configuration
//!
//! Loaded from a JSON file (camelCase keys), then adjusted by environment
//! overrides. Example:
//!
//! ```json
//! {
//!   "environment": "development",
//!   "service": { "name": "ping-service", "ip": "0.0.0.0", "port": 5000 },
//!   "discovery": { "services": { "pong-service": "http://127.0.0.1:5001" } },
//!   "dispatch": { "timeoutMs": 30000 }
//! }
//! ```

use std::collections::{BTreeSet, HashMap};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::envelope::ServiceName;
use crate::error::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeshConfig {
    #[serde(default = "default_environment")]
    pub environment: String,
    pub service: ServiceSettings,
    #[serde(default)]
    pub discovery: DiscoverySettings,
    #[serde(default)]
    pub dispatch: DispatchSettings,
}

/// Identity and bind address of this service
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceSettings {
    pub name: ServiceName,
    #[serde(default = "default_ip")]
    pub ip: IpAddr,
    pub port: u16,
    #[serde(rename = "type", default)]
    pub service_type: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Known peers: service name -> base URL
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoverySettings {
    #[serde(default)]
    pub services: HashMap<ServiceName, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchSettings {
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
        }
    }
}

fn default_environment() -> String {
    "development".to_string()
}

fn default_ip() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_timeout_ms() -> u64 {
    30_000
}

impl MeshConfig {
    /// Read and validate a config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config = Self::from_json(&raw)?;
        info!(
            path = ?path,
            service = %config.service.name,
            environment = %config.environment,
            "Loaded service config"
        );
        Ok(config)
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dispatch.timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "dispatch.timeoutMs must be greater than zero".to_string(),
            ));
        }

        for (name, url) in &self.discovery.services {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::Invalid(format!(
                    "discovery url for {} must be http(s): {:?}",
                    name, url
                )));
            }
        }
        Ok(())
    }

    /// Apply `<NAME>_URL` environment overrides for every known service and `peers`
    pub fn apply_env_overrides(&mut self, peers: &[ServiceName]) -> Result<(), ConfigError> {
        self.apply_overrides(peers, |key| std::env::var(key).ok())
    }

    /// Overridden addresses are validated like file values
    pub fn apply_overrides<F>(&mut self, peers: &[ServiceName], lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let names: BTreeSet<ServiceName> = self
            .discovery
            .services
            .keys()
            .chain(peers)
            .cloned()
            .collect();

        for name in names {
            if let Some(url) = lookup(&name.env_key()) {
                info!(service = %name, url = %url, "Discovery address overridden from environment");
                self.discovery.services.insert(name, url);
            }
        }
        self.validate()
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.service.port = port;
        self
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.service.ip, self.service.port)
    }

    pub fn dispatch_timeout(&self) -> Duration {
        Duration::from_millis(self.dispatch.timeout_ms)
    }
}
