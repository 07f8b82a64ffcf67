//! Axum HTTP server, routing, and middleware.
//!
//! # Responsibilities
//! - Define the Axum router with the item and health routes and shared middleware.
//! - Map HTTP requests to [`crate::store::RecordStore`] calls and results back to JSON.
//! - Inject shared application state (`AppState`) into handlers.

pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;
