//! Axum router construction.

use axum::{middleware::from_fn_with_state, routing::get, Router};
use tower_http::{compression::CompressionLayer, timeout::TimeoutLayer, trace::TraceLayer};

use super::{handlers, middleware, state::AppState};

/// Build the application [`Router`] with all routes and middleware attached.
///
/// The CORS layer is outermost so preflight requests never reach authorisation.
///
/// The bearer check is a route layer on `/items`, so it runs before the method
/// fallback: with a token configured, an unsupported method sent without a
/// valid token gets 401, and only an authorised one gets 405.
pub fn build(state: AppState) -> Router {
    let items = Router::new()
        .route(
            "/items",
            get(handlers::list)
                .post(handlers::create)
                .put(handlers::update)
                .delete(handlers::delete)
                .fallback(handlers::method_not_allowed),
        )
        .route_layer(from_fn_with_state(state.clone(), middleware::require_bearer));

    Router::new()
        .merge(items)
        .route("/health", get(handlers::health))
        .fallback(handlers::not_found)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(middleware::REQUEST_TIMEOUT))
        .layer(CompressionLayer::new())
        .layer(middleware::cors())
        .with_state(state)
}
