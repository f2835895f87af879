//! pubsift-common — Shared error type and HTTP client used across all pubsift crates.

pub mod error;
pub mod sandbox;

pub use error::{PubsiftError, Result};
pub use sandbox::SandboxClient;
