//! Modelrelay core — shared types, error taxonomy, configuration, and helpers.
//!
//! - [`types`]: chat/code requests, model listings, provider wire envelopes
//! - [`error`]: `TransportError` and `RelayError`
//! - [`config`]: JSON schema, loader, env overrides
//! - [`utils`]: paths, timestamps, string helpers

pub mod config;
pub mod error;
pub mod types;
pub mod utils;

pub use error::{RelayError, TransportError};
