//! Per-user history handlers

use axum::Json;
use axum::extract::{Query, State};
use axum::response::IntoResponse;

use crate::application::feed::SolvedHistoryQuery;

use super::{SolvedParams, feed_to_api, parse_flag, parse_number};
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::identity::RequireActor;
use crate::infra::http::api::models::*;
use crate::infra::http::api::state::ApiState;

pub async fn list_solved(
    State(state): State<ApiState>,
    RequireActor(actor): RequireActor,
    Query(params): Query<SolvedParams>,
) -> Result<impl IntoResponse, ApiError> {
    let query = SolvedHistoryQuery::parse(
        parse_number(params.page.as_deref()),
        parse_number(params.limit.as_deref()),
        params.topic.as_deref(),
        parse_flag(params.accepted.as_deref()),
    );

    let page = state
        .feed
        .list_solved(actor.id, &query)
        .await
        .map_err(feed_to_api)?;

    Ok(Json(PageEnvelope::from(page)))
}
