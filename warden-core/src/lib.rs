//! Warden Core - shared data structures and trait definitions
//!
//! Domain types, the policy model and its storage adapter, and the ambient
//! error/logging/configuration layers used by the web crate.

pub mod config;
pub mod error;
pub mod logging;
pub mod policy;
pub mod traits;
pub mod types;

pub use config::*;
pub use error::*;
pub use logging::*;
pub use policy::*;
pub use traits::*;
pub use types::*;

// Re-export commonly used external types
pub use async_trait::async_trait;
pub use tracing;
