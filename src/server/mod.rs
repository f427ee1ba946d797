//! Axum-based HTTP server for the textbook backend.
//!
//! Exposes question answering, translation, cache administration and
//! account endpoints to the textbook frontend.
//!
//! # Components
//!
//! - `handlers`: Implementation of individual API endpoints.
//! - `middleware`: Request ID tracking, CORS and request metrics.
//! - `routes`: The router and the shared `AppState`.
//!
//! Author: kelexine (<https://github.com/kelexine>)

mod handlers;
mod middleware;
mod routes;

pub use routes::{create_router, AppState};
