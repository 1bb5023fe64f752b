//! API Middleware
//!
//! Per-request operation context and request logging.

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::domain::{Cancellation, OperationContext};

pub const CORRELATION_ID_HEADER: &str = "x-correlation-id";

fn correlation_id_from(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get(CORRELATION_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| Uuid::parse_str(s).ok())
}

// =========================================================================
// Operation context
// =========================================================================

/// Attach an `OperationContext` to the request and echo its correlation id.
///
/// Every context shares the server's shutdown `Cancellation`. Once shutdown
/// starts, in-flight units of work that have not committed roll back and the
/// request answers 503.
pub async fn context_middleware(
    State(shutdown): State<Cancellation>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let correlation_id = correlation_id_from(request.headers()).unwrap_or_else(Uuid::new_v4);
    let context = OperationContext::new()
        .with_correlation_id(correlation_id)
        .with_cancellation(shutdown);

    request.extensions_mut().insert(context);

    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(&correlation_id.to_string()) {
        response.headers_mut().insert(CORRELATION_ID_HEADER, value);
    }

    response
}

// =========================================================================
// Request logging
// =========================================================================

/// Request logging middleware
pub async fn logging_middleware(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();

    let correlation_id = request
        .extensions()
        .get::<OperationContext>()
        .and_then(|ctx| ctx.correlation_id);

    let start = std::time::Instant::now();

    tracing::info!(
        method = %method,
        uri = %uri,
        correlation_id = ?correlation_id,
        "Incoming request"
    );

    let response = next.run(request).await;

    tracing::info!(
        method = %method,
        uri = %uri,
        status = %response.status(),
        duration_ms = %start.elapsed().as_millis(),
        correlation_id = ?correlation_id,
        "Request completed"
    );

    response
}
