// hapresence-api: Async Rust client for the Home Assistant REST API.

pub mod client;
pub mod error;
pub mod transport;
pub mod types;

pub use client::HaClient;
pub use error::Error;
pub use transport::TransportConfig;
pub use types::{ApiStatus, EntityState};
