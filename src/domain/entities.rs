//! Domain entities mirrored from persistent storage.
//!
//! Every record carries a single canonical `id`; storage adapters normalise
//! identity before values reach this layer.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    pub input: String,
    pub output: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemRecord {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub topics: Vec<String>,
    pub test_cases: Vec<TestCase>,
    pub uploader_id: Uuid,
    pub uploader_name: Option<String>,
    pub reports: Vec<Uuid>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Trimmed problem projection used by the feed and stored in the feed cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemSummary {
    pub id: Uuid,
    pub title: String,
    pub topics: Vec<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// One problem a user has submitted to, with `accepted` true when any of
/// their solutions for it is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SolvedProblem {
    pub id: Uuid,
    pub title: String,
    pub topics: Vec<String>,
    pub accepted: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SolutionRecord {
    pub id: Uuid,
    pub problem_id: Uuid,
    pub uploader_id: Uuid,
    pub uploader_name: Option<String>,
    pub code: String,
    pub language: String,
    pub explanation: String,
    pub accepted: bool,
    pub likes: Vec<Uuid>,
    pub reports: Vec<Uuid>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Trimmed solution projection used by the feed and stored in the feed cache.
///
/// Keeps the raw like/report sets so a single cached page can be merged for
/// any caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolutionSummary {
    pub id: Uuid,
    pub problem_id: Uuid,
    pub uploader_id: Option<Uuid>,
    pub uploader_name: String,
    pub explanation: String,
    pub language: String,
    pub accepted: bool,
    pub reply_count: u64,
    pub likes: Vec<Uuid>,
    pub reports: Vec<Uuid>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// The minimal facts about one of a user's solutions needed to fold a status map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolutionOutcome {
    pub problem_id: Uuid,
    pub accepted: bool,
}

/// A prior submission compared against new ones for near-duplicate detection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedText {
    pub code: String,
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyRecord {
    pub id: Uuid,
    pub problem_id: Uuid,
    pub solution_id: Uuid,
    pub replier_id: Uuid,
    pub replier_name: Option<String>,
    pub reply: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// A problem owned by the caller, with the number of solutions it received.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedProblem {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub topics: Vec<String>,
    pub solution_count: u64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}
