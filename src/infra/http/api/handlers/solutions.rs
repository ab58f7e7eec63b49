//! Solution handlers

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use uuid::Uuid;

use crate::application::feed::SolutionFeedQuery;
use crate::application::pagination::PageRequest;
use crate::application::solutions::SubmitSolutionCommand;

use super::{
    SolutionFeedParams, feed_to_api, interaction_to_api, json_body, parse_flag, parse_number,
    path_id, solution_to_api,
};
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::identity::{RequireActor, Viewer};
use crate::infra::http::api::models::*;
use crate::infra::http::api::state::ApiState;

pub async fn list_solutions(
    State(state): State<ApiState>,
    viewer: Viewer,
    path: Result<Path<Uuid>, PathRejection>,
    Query(params): Query<SolutionFeedParams>,
) -> Result<impl IntoResponse, ApiError> {
    let problem_id = path_id(path)?;
    let query = SolutionFeedQuery {
        page: PageRequest::new(
            parse_number(params.page.as_deref()),
            parse_number(params.limit.as_deref()),
        ),
        accepted: parse_flag(params.accepted.as_deref()),
        submitted_by_me: parse_flag(params.submitted_by_me.as_deref()).unwrap_or(false),
    };

    let page = state
        .feed
        .list_solutions(viewer.user_id(), problem_id, &query)
        .await
        .map_err(feed_to_api)?;

    Ok(Json(PageEnvelope::from(page)))
}

pub async fn submit_solution(
    State(state): State<ApiState>,
    RequireActor(actor): RequireActor,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<SubmitSolutionCommand>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let problem_id = path_id(path)?;
    let command = json_body(payload)?;
    let id = state
        .solutions
        .submit(actor, problem_id, command)
        .await
        .map_err(solution_to_api)?;

    Ok((
        StatusCode::CREATED,
        Json(MessageEnvelope::ok(
            "Solution submitted successfully",
            Created { id },
        )),
    ))
}

pub async fn get_solution(
    State(state): State<ApiState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let id = path_id(path)?;
    let detail = state.solutions.detail(id).await.map_err(solution_to_api)?;
    Ok(Json(DataEnvelope::ok(detail)))
}

pub async fn toggle_accept(
    State(state): State<ApiState>,
    RequireActor(actor): RequireActor,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let id = path_id(path)?;
    let accepted = state
        .interactions
        .toggle_accepted(id, actor.id)
        .await
        .map_err(interaction_to_api)?;

    let message = if accepted {
        "Solution accepted"
    } else {
        "Solution acceptance withdrawn"
    };
    Ok(Json(MessageEnvelope::ok(message, AcceptData { accepted })))
}

pub async fn toggle_like(
    State(state): State<ApiState>,
    RequireActor(actor): RequireActor,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let id = path_id(path)?;
    let outcome = state
        .interactions
        .toggle_like(id, actor.id)
        .await
        .map_err(interaction_to_api)?;

    let message = if outcome.active {
        "Solution liked"
    } else {
        "Like removed"
    };
    Ok(Json(MessageEnvelope::ok(
        message,
        LikeData {
            likes_count: outcome.count,
            liked: outcome.active,
        },
    )))
}

pub async fn toggle_report(
    State(state): State<ApiState>,
    RequireActor(actor): RequireActor,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let id = path_id(path)?;
    let outcome = state
        .interactions
        .toggle_report(id, actor.id)
        .await
        .map_err(interaction_to_api)?;

    let message = if outcome.active {
        "Solution reported"
    } else {
        "Report withdrawn"
    };
    Ok(Json(MessageEnvelope::ok(
        message,
        SolutionReportData {
            report_count: outcome.count,
            reported: outcome.active,
        },
    )))
}

pub async fn delete_solution(
    State(state): State<ApiState>,
    RequireActor(actor): RequireActor,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let id = path_id(path)?;
    state
        .solutions
        .delete(id, actor)
        .await
        .map_err(solution_to_api)?;

    Ok(Json(MessageEnvelope::ok(
        "Solution deleted successfully",
        Created { id },
    )))
}
