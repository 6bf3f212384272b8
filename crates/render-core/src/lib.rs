//! render-core: Core abstractions and configuration for render-server
//!
//! This crate provides the configuration model, error taxonomy, shared types
//! and the collaborator traits (transports and workers) the supervisor is
//! written against.

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use error::ServerError;
pub use types::SessionId;
