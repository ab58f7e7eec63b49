//! Response envelopes shared by every handler.

use serde::Serialize;
use uuid::Uuid;

use crate::application::pagination::{PageMeta, Paginated};

#[derive(Debug, Serialize)]
pub struct DataEnvelope<T> {
    pub success: bool,
    pub data: T,
}

impl<T> DataEnvelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PageEnvelope<T> {
    pub success: bool,
    pub data: Vec<T>,
    pub pagination: PageMeta,
}

impl<T> From<Paginated<T>> for PageEnvelope<T> {
    fn from(page: Paginated<T>) -> Self {
        Self {
            success: true,
            data: page.items,
            pagination: page.pagination,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageEnvelope<T> {
    pub success: bool,
    pub message: &'static str,
    pub data: T,
}

impl<T> MessageEnvelope<T> {
    pub fn ok(message: &'static str, data: T) -> Self {
        Self {
            success: true,
            message,
            data,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Created {
    pub id: Uuid,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeData {
    pub likes_count: u64,
    pub liked: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SolutionReportData {
    pub report_count: u64,
    pub reported: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemReportData {
    pub report_count: u64,
    pub is_reported: bool,
}

#[derive(Debug, Serialize)]
pub struct AcceptData {
    pub accepted: bool,
}

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub database: &'static str,
    pub cache: &'static str,
}
