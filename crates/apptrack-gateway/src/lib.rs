//! # AppTrack Gateway
//!
//! HTTP surface for external cron services: a token-protected trigger that
//! runs both reminder jobs on demand, plus health and history endpoints.

pub mod routes;
pub mod server;

pub use server::{AppState, build_router, start_server};
