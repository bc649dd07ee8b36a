//! Service Discovery
//!
//! Trait-based lookup from a logical service name to a reachable instance.
//! `StaticDiscovery` is backed by the configuration file and environment
//! overrides; other backends implement [`Discovery`].

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::info;

use crate::envelope::ServiceName;

/// Reachable instance of a service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceInstance {
    pub service: ServiceName,
    /// Base URL without trailing slash (e.g. "http://127.0.0.1:5001")
    pub base_url: String,
}

impl ServiceInstance {
    pub fn new(service: ServiceName, base_url: &str) -> Self {
        Self {
            service,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Absolute URL for a path on this instance
    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Trait for discovery backends
#[async_trait]
pub trait Discovery: Send + Sync {
    /// `Ok(None)` means the service is unknown; `Err` means the backend failed.
    async fn resolve(&self, service: &ServiceName) -> Result<Option<ServiceInstance>>;
}

/// In-memory discovery populated from configuration
#[derive(Debug, Default)]
pub struct StaticDiscovery {
    instances: RwLock<HashMap<ServiceName, ServiceInstance>>,
}

impl StaticDiscovery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(services: &HashMap<ServiceName, String>) -> Self {
        let instances = services
            .iter()
            .map(|(name, url)| (name.clone(), ServiceInstance::new(name.clone(), url)))
            .collect();

        Self {
            instances: RwLock::new(instances),
        }
    }

    /// Add or replace the instance for a service
    pub async fn register(&self, service: ServiceName, base_url: &str) {
        let instance = ServiceInstance::new(service.clone(), base_url);
        info!(service = %service, url = %instance.base_url, "Registered service instance");
        self.instances.write().await.insert(service, instance);
    }

    /// Remove a service; returns the instance that was registered, if any
    pub async fn deregister(&self, service: &ServiceName) -> Option<ServiceInstance> {
        let removed = self.instances.write().await.remove(service);
        if removed.is_some() {
            info!(service = %service, "Deregistered service instance");
        }
        removed
    }

    /// Known service names, sorted
    pub async fn services(&self) -> Vec<ServiceName> {
        let mut names: Vec<_> = self.instances.read().await.keys().cloned().collect();
        names.sort();
        names
    }
}

#[async_trait]
impl Discovery for StaticDiscovery {
    async fn resolve(&self, service: &ServiceName) -> Result<Option<ServiceInstance>> {
        Ok(self.instances.read().await.get(service).cloned())
    }
}
