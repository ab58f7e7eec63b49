use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderValue, Method, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::debug;

use super::identity::actor_from_headers;
use super::state::ApiState;

const REMAINING_HEADER: &str = "x-ratelimit-remaining";

/// Throttle writes per caller and path. Reads pass through untouched.
pub async fn write_rate_limit(
    State(state): State<ApiState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if matches!(*request.method(), Method::GET | Method::HEAD | Method::OPTIONS) {
        return next.run(request).await;
    }

    let key = match actor_from_headers(request.headers()) {
        Ok(Some(actor)) => actor.id.to_string(),
        Ok(None) => "anonymous".to_string(),
        Err(err) => return err.into_response(),
    };
    let path = request.uri().path().to_string();

    let decision = state.rate_limiter.allow(&key, &path);
    if !decision.allowed {
        debug!(
            target = "dojo::api::ratelimit",
            caller = %key,
            path = %path,
            limit = state.rate_limiter.limit(),
            "write rejected by rate limiter"
        );
        return super::error::ApiError::rate_limited(state.rate_limiter.retry_after_secs());
    }

    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&decision.remaining.to_string()) {
        response.headers_mut().insert(REMAINING_HEADER, value);
    }
    response
}
