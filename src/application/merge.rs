//! Status merger.
//!
//! Combines a user-independent feed page with the viewer's state. Pure: no
//! I/O, no mutation of the inputs.

use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::entities::{ProblemSummary, SolutionSummary};
use crate::domain::status_map::StatusMap;
use crate::domain::types::SolveStatus;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemFeedItem {
    pub id: Uuid,
    pub title: String,
    pub topics: Vec<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// The viewer has at least one solution for this problem.
    pub replied: bool,
    /// One of the viewer's solutions is accepted.
    pub accepted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SolutionFeedItem {
    pub id: Uuid,
    pub problem_id: Uuid,
    pub uploader: String,
    pub uploader_id: Option<Uuid>,
    pub explanation: String,
    pub language: String,
    pub accepted: bool,
    pub reply_count: u64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub liked: bool,
    pub likes_count: u64,
    pub reported: bool,
    pub report_count: u64,
}

/// Decorate problems with the viewer's solve status. `None` yields all-false flags.
pub fn merge_problems(
    items: Vec<ProblemSummary>,
    status_map: Option<&StatusMap>,
) -> Vec<ProblemFeedItem> {
    items
        .into_iter()
        .map(|summary| {
            let status = status_map.and_then(|map| map.get(&summary.id));
            ProblemFeedItem {
                id: summary.id,
                title: summary.title,
                topics: summary.topics,
                created_at: summary.created_at,
                replied: status.is_some(),
                accepted: status == Some(SolveStatus::Accepted),
            }
        })
        .collect()
}

/// Decorate solutions with the viewer's reactions and the reaction counts.
pub fn merge_solutions(items: Vec<SolutionSummary>, viewer: Option<Uuid>) -> Vec<SolutionFeedItem> {
    items
        .into_iter()
        .map(|summary| {
            let liked = viewer.is_some_and(|user| summary.likes.contains(&user));
            let reported = viewer.is_some_and(|user| summary.reports.contains(&user));
            SolutionFeedItem {
                id: summary.id,
                problem_id: summary.problem_id,
                uploader: summary.uploader_name,
                uploader_id: summary.uploader_id,
                explanation: summary.explanation,
                language: summary.language,
                accepted: summary.accepted,
                reply_count: summary.reply_count,
                created_at: summary.created_at,
                liked,
                likes_count: summary.likes.len() as u64,
                reported,
                report_count: summary.reports.len() as u64,
            }
        })
        .collect()
}
