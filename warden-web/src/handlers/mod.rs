//! HTTP request handlers for the Warden admin API
//!
//! This module contains all the HTTP request handlers organized by functionality.

pub mod access;
pub mod health;
pub mod policies;
pub mod types;

pub use access::*;
pub use health::*;
pub use policies::*;

pub use types::*;
