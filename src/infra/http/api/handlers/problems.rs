//! Problem handlers

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use uuid::Uuid;

use crate::application::feed::ProblemFeedQuery;
use crate::application::problems::UploadProblemCommand;

use super::{
    ProblemFeedParams, UploadedParams, feed_to_api, interaction_to_api, json_body, parse_number,
    path_id, problem_to_api,
};
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::identity::{RequireActor, Viewer};
use crate::infra::http::api::models::*;
use crate::infra::http::api::state::ApiState;

pub async fn list_problems(
    State(state): State<ApiState>,
    viewer: Viewer,
    Query(params): Query<ProblemFeedParams>,
) -> Result<impl IntoResponse, ApiError> {
    let query = ProblemFeedQuery::parse(
        parse_number(params.page.as_deref()),
        parse_number(params.limit.as_deref()),
        params.search.as_deref(),
        params.topic.as_deref(),
        params.status.as_deref(),
    )
    .map_err(feed_to_api)?;

    let page = state
        .feed
        .list_problems(viewer.user_id(), &query)
        .await
        .map_err(feed_to_api)?;

    Ok(Json(PageEnvelope::from(page)))
}

pub async fn list_topics(State(state): State<ApiState>) -> Result<impl IntoResponse, ApiError> {
    let topics = state.problems.topics().await.map_err(problem_to_api)?;
    Ok(Json(DataEnvelope::ok(topics)))
}

pub async fn list_my_problems(
    State(state): State<ApiState>,
    RequireActor(actor): RequireActor,
    Query(params): Query<UploadedParams>,
) -> Result<impl IntoResponse, ApiError> {
    let problems = state
        .problems
        .uploaded_by(actor, params.topic.as_deref())
        .await
        .map_err(problem_to_api)?;

    Ok(Json(DataEnvelope::ok(problems)))
}

pub async fn upload_problem(
    State(state): State<ApiState>,
    RequireActor(actor): RequireActor,
    payload: Result<Json<UploadProblemCommand>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let command = json_body(payload)?;
    let id = state
        .problems
        .upload(actor, command)
        .await
        .map_err(problem_to_api)?;

    Ok((
        StatusCode::CREATED,
        Json(MessageEnvelope::ok(
            "Problem uploaded successfully",
            Created { id },
        )),
    ))
}

pub async fn get_problem(
    State(state): State<ApiState>,
    viewer: Viewer,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let id = path_id(path)?;
    let detail = state
        .problems
        .detail(id, viewer.user_id())
        .await
        .map_err(problem_to_api)?;

    Ok(Json(DataEnvelope::ok(detail)))
}

pub async fn toggle_problem_report(
    State(state): State<ApiState>,
    RequireActor(actor): RequireActor,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let id = path_id(path)?;
    let report = state
        .interactions
        .toggle_problem_report(id, actor.id)
        .await
        .map_err(interaction_to_api)?;

    let message = if report.is_reported {
        "Problem reported"
    } else {
        "Problem report withdrawn"
    };
    Ok(Json(MessageEnvelope::ok(
        message,
        ProblemReportData {
            report_count: report.report_count,
            is_reported: report.is_reported,
        },
    )))
}

pub async fn delete_problem(
    State(state): State<ApiState>,
    RequireActor(actor): RequireActor,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let id = path_id(path)?;
    state
        .problems
        .delete(id, actor)
        .await
        .map_err(problem_to_api)?;

    Ok(Json(MessageEnvelope::ok(
        "Problem deleted successfully",
        Created { id },
    )))
}
