//! Axum request handlers for all service endpoints.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use common::protocol::{
    CreateItemRequest, CreateItemResponse, DeleteItemResponse, ErrorResponse, HealthResponse,
    ItemIdQuery, ListItemsQuery, UpdateItemRequest, UpdateItemResponse,
};
use common::ServiceError;
use tracing::debug;

use super::state::AppState;

/// Render a [`ServiceError`] as a JSON error body with the matching status.
pub fn error_response(err: ServiceError) -> Response {
    let status =
        StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(ErrorResponse::from(&err))).into_response()
}

fn bad_json(rejection: JsonRejection) -> Response {
    debug!(error = %rejection.body_text(), "rejected request body");
    error_response(ServiceError::BadRequest(
        "request body must be a JSON object with valid field types".into(),
    ))
}

fn bad_query(rejection: QueryRejection) -> Response {
    debug!(error = %rejection.body_text(), "rejected query string");
    error_response(ServiceError::BadRequest("invalid query string".into()))
}

/// Extract a non-blank `id` query parameter.
fn require_id(query: Result<Query<ItemIdQuery>, QueryRejection>) -> Result<String, Response> {
    let Query(query) = query.map_err(bad_query)?;
    query
        .id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| error_response(ServiceError::BadRequest("missing id query parameter".into())))
}

/// `POST /items`: create a record.
///
/// `name`, `stock` and `price` must all be present; zero values are valid.
pub async fn create(
    State(state): State<AppState>,
    body: Result<Json<CreateItemRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match body {
        Ok(b) => b,
        Err(rejection) => return bad_json(rejection),
    };

    match state.store.create(req).await {
        Ok(item) => {
            let body = CreateItemResponse {
                message: "Item created successfully".into(),
                item,
            };
            (StatusCode::CREATED, Json(body)).into_response()
        }
        Err(e) => error_response(e.into()),
    }
}

/// `GET /items[?name=...]`: list records, optionally filtered by name substring.
///
/// Rows that cannot be decrypted are included as stored.
pub async fn list(
    State(state): State<AppState>,
    query: Result<Query<ListItemsQuery>, QueryRejection>,
) -> Response {
    let Query(query) = match query {
        Ok(q) => q,
        Err(rejection) => return bad_query(rejection),
    };

    match state.store.list(query.name.as_deref()).await {
        Ok(items) => (StatusCode::OK, Json(items)).into_response(),
        Err(e) => error_response(e.into()),
    }
}

/// `PUT /items?id=...`: update any subset of `name`, `stock`, `price`.
pub async fn update(
    State(state): State<AppState>,
    query: Result<Query<ItemIdQuery>, QueryRejection>,
    body: Result<Json<UpdateItemRequest>, JsonRejection>,
) -> Response {
    let id = match require_id(query) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let Json(req) = match body {
        Ok(b) => b,
        Err(rejection) => return bad_json(rejection),
    };

    match state.store.update(&id, req.into()).await {
        Ok(item) => {
            let body = UpdateItemResponse {
                message: "Item updated successfully".into(),
                item,
            };
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => error_response(e.into()),
    }
}

/// `DELETE /items?id=...`: delete a record and return its last state.
pub async fn delete(
    State(state): State<AppState>,
    query: Result<Query<ItemIdQuery>, QueryRejection>,
) -> Response {
    let id = match require_id(query) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match state.store.delete(&id).await {
        Ok(deleted_item) => {
            let body = DeleteItemResponse {
                message: "Item deleted successfully".into(),
                deleted_item,
            };
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => error_response(e.into()),
    }
}

/// `GET /health`: liveness check.
pub async fn health() -> Response {
    let body = HealthResponse {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").into(),
    };
    (StatusCode::OK, Json(body)).into_response()
}

/// Fallback for unsupported methods on `/items`.
pub async fn method_not_allowed(method: Method) -> Response {
    error_response(ServiceError::MethodNotAllowed(format!(
        "method {method} is not supported"
    )))
}

/// Catch-all 404 handler.
pub async fn not_found() -> impl IntoResponse {
    let err = ErrorResponse::new("not_found", "the requested resource does not exist");
    (StatusCode::NOT_FOUND, Json(err))
}
