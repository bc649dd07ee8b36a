//! Pingpong Mesh
//!
//! Service hosting, discovery and inter-service dispatch shared by the
//! ping and pong services.
//!
//! ## Architecture
//!
//! - **Envelope**: `{to, from, body}` message addressed by logical service name
//! - **Discovery**: trait-based lookup from service name to instance URL
//! - **Dispatcher**: resolves the target and forwards one HTTP call under a deadline
//! - **ServiceHost**: mounts a route table, adds `/health`, serves until Ctrl-C

pub mod config;
pub mod discovery;
pub mod dispatcher;
pub mod envelope;
pub mod error;
pub mod host;
pub mod telemetry;

pub use config::{MeshConfig, ServiceSettings};
pub use discovery::{Discovery, ServiceInstance, StaticDiscovery};
pub use dispatcher::Dispatcher;
pub use envelope::{Envelope, RemoteResponse, ServiceName, Target};
pub use error::{ConfigError, DispatchError, EnvelopeError};
pub use host::ServiceHost;
