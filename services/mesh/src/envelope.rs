//! Message envelope for inter-service calls
//!
//! An envelope addresses a logical service rather than a host:
//!
//! ```text
//! pong-service:[GET]/
//! └─ service ─┘└verb┘└ path
//! ```
//!
//! The method is optional and defaults to `GET`.

use std::fmt;
use std::str::FromStr;

use axum::http::Method;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::EnvelopeError;

/// Logical service identifier (e.g. "pong-service")
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ServiceName(String);

impl ServiceName {
    pub fn parse(name: impl Into<String>) -> Result<Self, EnvelopeError> {
        let name = name.into();
        let reserved = |c: char| c.is_whitespace() || matches!(c, ':' | '[' | ']' | '/');

        if name.is_empty() || name.chars().any(reserved) {
            return Err(EnvelopeError::InvalidServiceName(name));
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Environment variable that overrides this service's address,
    /// e.g. `pong-service` -> `PONG_SERVICE_URL`
    pub fn env_key(&self) -> String {
        format!("{}_URL", self.0.to_uppercase().replace(|c: char| c == '-' || c == '.', "_"))
    }
}

impl fmt::Display for ServiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ServiceName {
    type Err = EnvelopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ServiceName {
    type Error = EnvelopeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<ServiceName> for String {
    fn from(name: ServiceName) -> Self {
        name.0
    }
}

impl AsRef<str> for ServiceName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Parsed form of an envelope's `to` field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub service: ServiceName,
    pub method: Method,
    pub path: String,
}

impl Target {
    pub fn parse(to: &str) -> Result<Self, EnvelopeError> {
        let invalid = |reason: &str| EnvelopeError::InvalidTarget {
            target: to.to_string(),
            reason: reason.to_string(),
        };

        let (service, rest) = to
            .split_once(':')
            .ok_or_else(|| invalid("missing ':' after service name"))?;
        let service = ServiceName::parse(service).map_err(|_| invalid("bad service name"))?;

        let (method, path) = match rest.strip_prefix('[') {
            Some(bracketed) => {
                let (verb, path) = bracketed
                    .split_once(']')
                    .ok_or_else(|| invalid("unterminated method"))?;
                (parse_method(verb).ok_or_else(|| invalid("unsupported method"))?, path)
            }
            None => (Method::GET, rest),
        };

        let path = if path.is_empty() { "/" } else { path };
        if !path.starts_with('/') {
            return Err(invalid("path must start with '/'"));
        }

        Ok(Self {
            service,
            method,
            path: path.to_string(),
        })
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:[{}]{}", self.service, self.method, self.path)
    }
}

fn parse_method(verb: &str) -> Option<Method> {
    match verb.to_ascii_uppercase().as_str() {
        "GET" => Some(Method::GET),
        "POST" => Some(Method::POST),
        "PUT" => Some(Method::PUT),
        "PATCH" => Some(Method::PATCH),
        "DELETE" => Some(Method::DELETE),
        "HEAD" => Some(Method::HEAD),
        "OPTIONS" => Some(Method::OPTIONS),
        _ => None,
    }
}

/// Outgoing inter-service message.
///
/// Built once per call and consumed by [`crate::Dispatcher::send`].
#[derive(Debug, Clone, Serialize)]
pub struct Envelope {
    mid: Uuid,
    timestamp: DateTime<Utc>,
    to: String,
    from: ServiceName,
    body: serde_json::Value,
    #[serde(skip)]
    target: Target,
}

impl Envelope {
    pub fn new(to: &str, from: &str, body: serde_json::Value) -> Result<Self, EnvelopeError> {
        let target = Target::parse(to)?;
        let from = ServiceName::parse(from)?;

        Ok(Self {
            mid: Uuid::new_v4(),
            timestamp: Utc::now(),
            to: to.to_string(),
            from,
            body,
            target,
        })
    }

    pub fn mid(&self) -> Uuid {
        self.mid
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn to(&self) -> &str {
        &self.to
    }

    pub fn from(&self) -> &ServiceName {
        &self.from
    }

    pub fn body(&self) -> &serde_json::Value {
        &self.body
    }

    pub fn target(&self) -> &Target {
        &self.target
    }
}

/// Response returned by the remote service, forwarded as-is
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteResponse {
    pub status_code: u16,
    pub body: serde_json::Value,
}

impl RemoteResponse {
    /// Only an exact 200 counts as success; other 2xx are forwarded whole
    pub fn is_success_200(&self) -> bool {
        self.status_code == 200
    }
}
