use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::application::error::ErrorReport;
use crate::infra::http::api::models::HealthReport;
use crate::infra::http::api::state::ApiState;

const SOURCE: &str = "infra::http::api::health";

/// Store and cache reachability. Only the store decides the status code; a
/// cache outage reports `degraded`.
pub async fn health(State(state): State<ApiState>) -> Response {
    let database = state.health.ping().await;
    let cache = state.cache.ping().await;

    let status = if database.is_ok() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let report = HealthReport {
        status: if database.is_ok() && cache.is_ok() {
            "ok"
        } else if database.is_ok() {
            "degraded"
        } else {
            "unavailable"
        },
        database: if database.is_ok() { "up" } else { "down" },
        cache: if cache.is_ok() { "up" } else { "down" },
    };

    let mut response = (status, Json(report)).into_response();
    if let Err(err) = database {
        ErrorReport::from_error(SOURCE, status, &err).attach(&mut response);
    }
    response
}
