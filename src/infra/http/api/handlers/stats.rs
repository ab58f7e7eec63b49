use axum::Json;
use axum::extract::State;
use axum::response::IntoResponse;

use super::stats_to_api;
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::identity::Viewer;
use crate::infra::http::api::models::DataEnvelope;
use crate::infra::http::api::state::ApiState;

pub async fn dashboard(
    State(state): State<ApiState>,
    viewer: Viewer,
) -> Result<impl IntoResponse, ApiError> {
    let dashboard = state
        .stats
        .dashboard(viewer.user_id())
        .await
        .map_err(stats_to_api)?;

    Ok(Json(DataEnvelope::ok(dashboard)))
}
