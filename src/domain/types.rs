//! Shared domain enumerations.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Per-user solve state of a single problem.
///
/// Ordering matters: `Accepted` compares greater than `Attempted`, so folding
/// with `max` applies the domination rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolveStatus {
    Attempted,
    Accepted,
}

impl SolveStatus {
    pub fn from_accepted(accepted: bool) -> Self {
        if accepted {
            SolveStatus::Accepted
        } else {
            SolveStatus::Attempted
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SolveStatus::Attempted => "attempted",
            SolveStatus::Accepted => "accepted",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "attempted" => Some(SolveStatus::Attempted),
            "accepted" => Some(SolveStatus::Accepted),
            _ => None,
        }
    }

    /// Combine two observations of the same problem; `Accepted` wins.
    pub fn dominate(self, other: SolveStatus) -> SolveStatus {
        self.max(other)
    }
}

/// Status-relative filter on the problem feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFilter {
    /// Problems with at least one accepted solution by the caller.
    Solved,
    /// Problems the caller never submitted to.
    Unsolved,
    /// Problems with submissions by the caller, none accepted.
    AttemptedNotSolved,
}

impl StatusFilter {
    /// Parse a query value. `all` and empty input mean "no filter".
    pub fn parse(value: &str) -> Result<Option<Self>, String> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "all" => Ok(None),
            "solved" | "accepted" => Ok(Some(StatusFilter::Solved)),
            "unsolved" | "not-replied" | "not replied" => Ok(Some(StatusFilter::Unsolved)),
            "attempted" | "attempted-not-solved" | "replied" => {
                Ok(Some(StatusFilter::AttemptedNotSolved))
            }
            other => Err(format!("unknown status filter `{other}`")),
        }
    }
}

/// Social reaction a user can toggle on a solution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Interaction {
    Like,
    Report,
}

impl Interaction {
    pub fn as_str(self) -> &'static str {
        match self {
            Interaction::Like => "like",
            Interaction::Report => "report",
        }
    }

    /// The reaction that cannot be held at the same time as this one.
    pub fn opposite(self) -> Interaction {
        match self {
            Interaction::Like => Interaction::Report,
            Interaction::Report => Interaction::Like,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    #[default]
    Member,
    Admin,
}

impl UserRole {
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("admin") {
            UserRole::Admin
        } else {
            UserRole::Member
        }
    }
}

/// An authenticated caller as asserted by the upstream gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: Uuid,
    pub role: UserRole,
}

impl Actor {
    pub fn member(id: Uuid) -> Self {
        Self {
            id,
            role: UserRole::Member,
        }
    }

    /// Owners and admins may remove content.
    pub fn may_delete(&self, owner_id: Uuid) -> bool {
        self.id == owner_id || self.role == UserRole::Admin
    }
}
