use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use uuid::Uuid;

use crate::application::replies::SubmitReplyCommand;

use super::{json_body, path_id, reply_to_api};
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::identity::RequireActor;
use crate::infra::http::api::models::*;
use crate::infra::http::api::state::ApiState;

pub async fn list_replies(
    State(state): State<ApiState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let solution_id = path_id(path)?;
    let replies = state
        .replies
        .list(solution_id)
        .await
        .map_err(reply_to_api)?;

    Ok(Json(DataEnvelope::ok(replies)))
}

pub async fn submit_reply(
    State(state): State<ApiState>,
    RequireActor(actor): RequireActor,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<SubmitReplyCommand>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let solution_id = path_id(path)?;
    let command = json_body(payload)?;
    let reply = state
        .replies
        .submit(actor, solution_id, command)
        .await
        .map_err(reply_to_api)?;

    Ok((
        StatusCode::CREATED,
        Json(MessageEnvelope::ok("Reply added successfully", reply)),
    ))
}
