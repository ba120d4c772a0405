// proxy module - validating gateway in front of the school backend

pub mod config;
pub mod engine;
pub mod routes;
pub mod server;

pub mod common; // Schema engine and request schemas
pub mod handlers; // Local (non-forwarding) handlers
pub mod middleware; // Axum middleware
pub mod upstream; // Backend and blob storage clients

pub use config::{ProxyConfig, UpstreamProxyConfig};
pub use server::{build_router, AppState, AxumServer};
