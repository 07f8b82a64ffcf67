//! Shared application state injected into every Axum handler.

use std::sync::Arc;

use crate::store::RecordStore;

/// Application state shared across all request handlers.
///
/// All fields are cheaply cloneable (`Arc`-wrapped or already `Arc`-backed) so
/// that Axum can clone the state for each request without copying expensive data.
#[derive(Clone)]
pub struct AppState {
    /// Encrypted record store.
    pub store: RecordStore,
    /// Bearer token required on item routes; `None` disables the check.
    pub auth_token: Option<Arc<str>>,
}

impl AppState {
    /// Create a new [`AppState`].
    pub fn new(store: RecordStore, auth_token: Option<&str>) -> Self {
        Self {
            store,
            auth_token: auth_token.map(Arc::from),
        }
    }
}
