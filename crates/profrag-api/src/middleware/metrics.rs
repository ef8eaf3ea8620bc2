//! Request counting middleware
//!
//! Feeds the counters reported by `/metrics`.

use crate::state::AppState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use std::time::Instant;

/// Count every request, and every request answered with an error status
pub async fn metrics_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let path = request.uri().path().to_string();
    state.increment_requests();

    let response = next.run(request).await;

    let status = response.status();
    if is_failure(status.as_u16()) {
        state.record_failure();
    }
    tracing::debug!(
        path = %path,
        status = status.as_u16(),
        latency_us = start.elapsed().as_micros() as u64,
        "Request handled"
    );

    response
}

/// Client and server errors both count as failed requests
fn is_failure(status: u16) -> bool {
    status >= 400
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_failure() {
        assert!(!is_failure(200));
        assert!(!is_failure(304));
        assert!(is_failure(400));
        assert!(is_failure(502));
    }
}
