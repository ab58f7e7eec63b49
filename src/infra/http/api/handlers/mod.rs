//! API handlers organized by resource type.
//!
//! Helper functions for error conversion and request parsing are defined here
//! and shared across modules.

mod health;
mod history;
mod problems;
mod replies;
mod solutions;
mod stats;

pub use health::*;
pub use history::*;
pub use problems::*;
pub use replies::*;
pub use solutions::*;
pub use stats::*;

// ----- Shared query structs -----

use axum::Json;
use axum::extract::Path;
use axum::extract::rejection::{JsonRejection, PathRejection};
use serde::Deserialize;
use uuid::Uuid;

/// Raw problem feed parameters. Numbers stay strings so malformed values
/// fall back to defaults instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct ProblemFeedParams {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub search: Option<String>,
    pub topic: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SolutionFeedParams {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub accepted: Option<String>,
    #[serde(rename = "submittedByMe")]
    pub submitted_by_me: Option<String>,
}

/// `accepted` is `true`/`false`; anything else (including `all`) means no filter.
#[derive(Debug, Default, Deserialize)]
pub struct SolvedParams {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub topic: Option<String>,
    pub accepted: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UploadedParams {
    pub topic: Option<String>,
}

pub(crate) fn parse_number(raw: Option<&str>) -> Option<u32> {
    raw.and_then(|value| value.trim().parse::<u32>().ok())
}

/// `true`/`false` in any case; anything else means "not given".
pub(crate) fn parse_flag(raw: Option<&str>) -> Option<bool> {
    match raw.map(|value| value.trim().to_ascii_lowercase()) {
        Some(value) if value == "true" => Some(true),
        Some(value) if value == "false" => Some(false),
        _ => None,
    }
}

pub(crate) fn path_id(path: Result<Path<Uuid>, PathRejection>) -> Result<Uuid, ApiError> {
    path.map(|Path(id)| id)
        .map_err(|rejection| ApiError::bad_request("Invalid identifier", Some(rejection.body_text())))
}

pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| {
            ApiError::bad_request("Malformed request body", Some(rejection.body_text()))
        })
}

// ----- Shared error conversions -----

use axum::http::StatusCode;

use crate::application::feed::FeedError;
use crate::application::interactions::InteractionError;
use crate::application::problems::ProblemError;
use crate::application::replies::ReplyError;
use crate::application::repos::RepoError;
use crate::application::solutions::SolutionError;
use crate::application::stats::StatsError;
use crate::domain::error::DomainError;

use super::error::{ApiError, codes};

pub(crate) fn repo_to_api(err: RepoError) -> ApiError {
    match err {
        RepoError::Duplicate { constraint } => ApiError::new(
            StatusCode::CONFLICT,
            codes::DUPLICATE,
            "Duplicate record",
            Some(constraint),
        ),
        RepoError::NotFound => ApiError::not_found("resource not found"),
        RepoError::InvalidInput { message } => ApiError::new(
            StatusCode::BAD_REQUEST,
            codes::INVALID_INPUT,
            "Invalid input",
            Some(message),
        ),
        RepoError::Integrity { message } => ApiError::new(
            StatusCode::CONFLICT,
            codes::INTEGRITY,
            "Integrity constraint violated",
            Some(message),
        ),
        RepoError::Timeout => ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            codes::DB_TIMEOUT,
            "Database timeout",
            None,
        ),
        RepoError::Persistence(msg) => ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            codes::REPO,
            "Persistence error",
            Some(msg),
        ),
    }
}

pub(crate) fn domain_to_api(err: DomainError) -> ApiError {
    match err {
        DomainError::NotFound { .. } => ApiError::not_found("resource not found"),
        other => ApiError::validation(other.to_string()),
    }
}

pub(crate) fn feed_to_api(err: FeedError) -> ApiError {
    match err {
        FeedError::InvalidFilter(message) => ApiError::bad_request("Invalid filter", Some(message)),
        FeedError::Unauthenticated(_) => ApiError::unauthorized(Some(err.to_string())),
        FeedError::Repo(repo) => repo_to_api(repo),
    }
}

pub(crate) fn problem_to_api(err: ProblemError) -> ApiError {
    match err {
        ProblemError::Invalid(domain) => domain_to_api(domain),
        ProblemError::DuplicateTitle(_) => ApiError::new(
            StatusCode::CONFLICT,
            codes::DUPLICATE,
            "Problem already exists",
            Some(err.to_string()),
        ),
        ProblemError::NotFound => ApiError::not_found("problem not found"),
        ProblemError::Forbidden => ApiError::forbidden(err.to_string()),
        ProblemError::Repo(repo) => repo_to_api(repo),
    }
}

pub(crate) fn solution_to_api(err: SolutionError) -> ApiError {
    match err {
        SolutionError::Invalid(domain) => domain_to_api(domain),
        SolutionError::ProblemNotFound => ApiError::not_found("problem not found"),
        SolutionError::NotFound => ApiError::not_found("solution not found"),
        SolutionError::NearDuplicate => {
            ApiError::conflict("Duplicate solution", err.to_string())
        }
        SolutionError::Forbidden => ApiError::forbidden(err.to_string()),
        SolutionError::Repo(repo) => repo_to_api(repo),
    }
}

pub(crate) fn reply_to_api(err: ReplyError) -> ApiError {
    match err {
        ReplyError::Invalid(domain) => domain_to_api(domain),
        ReplyError::SolutionNotFound => ApiError::not_found("solution not found"),
        ReplyError::Repo(repo) => repo_to_api(repo),
    }
}

pub(crate) fn interaction_to_api(err: InteractionError) -> ApiError {
    match err {
        InteractionError::SolutionNotFound => ApiError::not_found("solution not found"),
        InteractionError::ProblemNotFound => ApiError::not_found("problem not found"),
        InteractionError::Conflict { .. } => {
            ApiError::conflict("Conflicting interaction", err.to_string())
        }
        InteractionError::NotProblemOwner => ApiError::forbidden(err.to_string()),
        InteractionError::Repo(repo) => repo_to_api(repo),
    }
}

pub(crate) fn stats_to_api(err: StatsError) -> ApiError {
    match err {
        StatsError::Repo(repo) => repo_to_api(repo),
    }
}
