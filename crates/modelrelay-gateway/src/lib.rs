//! modelrelay-gateway — HTTP surface for the router
//!
//! Serves `/chat` and `/code-generate` through the router, plus model
//! listing, health, and the operator toggles that simulate provider outages.

pub mod handlers;
pub mod server;

pub use server::{GatewayServer, GatewayState};
