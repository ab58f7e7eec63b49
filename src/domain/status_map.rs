//! Per-user solve status, derived from solution records.
//!
//! A `StatusMap` is a pure function of the user's solutions: folding the same
//! outcomes in any order yields the same map.

use std::collections::BTreeMap;

use uuid::Uuid;

use crate::domain::entities::SolutionOutcome;
use crate::domain::types::{SolveStatus, StatusFilter};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusMap {
    entries: BTreeMap<Uuid, SolveStatus>,
}

impl StatusMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold solution outcomes per problem, `accepted` dominating `attempted`.
    pub fn fold<I>(outcomes: I) -> Self
    where
        I: IntoIterator<Item = SolutionOutcome>,
    {
        let mut map = Self::new();
        for outcome in outcomes {
            map.observe(outcome.problem_id, SolveStatus::from_accepted(outcome.accepted));
        }
        map
    }

    /// Merge an observation without ever downgrading an entry.
    pub fn observe(&mut self, problem_id: Uuid, status: SolveStatus) {
        self.entries
            .entry(problem_id)
            .and_modify(|current| *current = current.dominate(status))
            .or_insert(status);
    }

    pub fn get(&self, problem_id: &Uuid) -> Option<SolveStatus> {
        self.entries.get(problem_id).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Uuid, &SolveStatus)> {
        self.entries.iter()
    }

    pub fn problem_ids(&self) -> Vec<Uuid> {
        self.entries.keys().copied().collect()
    }

    pub fn ids_with(&self, status: SolveStatus) -> Vec<Uuid> {
        self.entries
            .iter()
            .filter(|(_, value)| **value == status)
            .map(|(id, _)| *id)
            .collect()
    }

    /// Translate a status filter into a problem id constraint.
    pub fn id_filter(&self, filter: StatusFilter) -> IdFilter {
        match filter {
            StatusFilter::Solved => IdFilter::Include(self.ids_with(SolveStatus::Accepted)),
            StatusFilter::AttemptedNotSolved => {
                IdFilter::Include(self.ids_with(SolveStatus::Attempted))
            }
            StatusFilter::Unsolved => IdFilter::Exclude(self.problem_ids()),
        }
    }
}

impl FromIterator<(Uuid, SolveStatus)> for StatusMap {
    fn from_iter<T: IntoIterator<Item = (Uuid, SolveStatus)>>(iter: T) -> Self {
        let mut map = Self::new();
        for (problem_id, status) in iter {
            map.observe(problem_id, status);
        }
        map
    }
}

/// Problem id constraint derived from a status filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdFilter {
    Include(Vec<Uuid>),
    Exclude(Vec<Uuid>),
}

impl IdFilter {
    pub fn admits(&self, id: &Uuid) -> bool {
        match self {
            IdFilter::Include(ids) => ids.contains(id),
            IdFilter::Exclude(ids) => !ids.contains(id),
        }
    }
}
