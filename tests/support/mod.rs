//! In-memory store and cache doubles shared by the integration tests.

#![allow(dead_code)]

use std::collections::{BTreeSet, HashMap};
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use dojo::application::repos::{
    AcceptanceToggle, GlobalTotals, HealthRepo, InteractionToggle, LeaderboardEntry,
    LeaderboardMetric, MembershipToggle, ProblemQueryFilter, ProblemsRepo, ProblemsWriteRepo,
    RepliesRepo, RepoError, SolutionQueryFilter, SolutionsRepo, SolutionsWriteRepo,
    SolvedProblemFilter, StatsRepo, UserContributionStats,
};
use dojo::cache::{CacheConfig, CacheError, MemoryCache, VolatileCache};
use dojo::domain::entities::{
    ProblemRecord, ProblemSummary, ReplyRecord, SolutionOutcome, SolutionRecord, SolutionSummary,
    SolvedProblem, SubmittedText, TestCase, UploadedProblem,
};
use dojo::domain::submissions::{NewProblem, NewSolution};
use dojo::domain::types::Interaction;
use dojo::infra::http::{ApiRateLimiter, ApiState};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, String>,
    problems: Vec<ProblemRecord>,
    solutions: Vec<SolutionRecord>,
    replies: Vec<ReplyRecord>,
    tick: i64,
}

impl Tables {
    /// Strictly increasing timestamps keep orderings deterministic.
    fn now(&mut self) -> OffsetDateTime {
        self.tick += 1;
        OffsetDateTime::UNIX_EPOCH + time::Duration::seconds(1_700_000_000 + self.tick)
    }

    fn name_of(&self, id: Uuid) -> Option<String> {
        self.users.get(&id).cloned()
    }

    fn problem_matches(&self, problem: &ProblemRecord, filter: &ProblemQueryFilter) -> bool {
        if let Some(search) = &filter.search
            && !problem
                .title
                .to_lowercase()
                .contains(&search.to_lowercase())
        {
            return false;
        }
        if let Some(topic) = &filter.topic
            && !problem.topics.iter().any(|t| t == topic)
        {
            return false;
        }
        if let Some(ids) = &filter.ids
            && !ids.admits(&problem.id)
        {
            return false;
        }
        true
    }

    /// One row per problem the user submitted to, ordered by title.
    fn solved_problems(&self, user_id: Uuid, filter: &SolvedProblemFilter) -> Vec<SolvedProblem> {
        let mut rows: Vec<SolvedProblem> = Vec::new();
        for solution in self.solutions.iter().filter(|s| s.uploader_id == user_id) {
            let Some(problem) = self.problems.iter().find(|p| p.id == solution.problem_id) else {
                continue;
            };
            if let Some(topic) = &filter.topic
                && !problem.topics.iter().any(|t| t == topic)
            {
                continue;
            }
            match rows.iter_mut().find(|row| row.id == problem.id) {
                Some(row) => row.accepted |= solution.accepted,
                None => rows.push(SolvedProblem {
                    id: problem.id,
                    title: problem.title.clone(),
                    topics: problem.topics.clone(),
                    accepted: solution.accepted,
                }),
            }
        }
        rows.retain(|row| filter.accepted.is_none_or(|flag| row.accepted == flag));
        rows.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));
        rows
    }

    fn solution_matches(
        solution: &SolutionRecord,
        problem_id: Uuid,
        filter: &SolutionQueryFilter,
    ) -> bool {
        solution.problem_id == problem_id
            && filter.accepted.is_none_or(|flag| solution.accepted == flag)
            && filter
                .uploader
                .is_none_or(|uploader| solution.uploader_id == uploader)
    }
}

/// Repository double honouring the same ordering and atomicity rules as the
/// Postgres adapter.
#[derive(Default)]
pub struct MemoryRepositories {
    tables: Mutex<Tables>,
    pub problem_list_calls: AtomicUsize,
    pub solution_list_calls: AtomicUsize,
    pub outcome_calls: AtomicUsize,
    pub stats_calls: AtomicUsize,
    pub store_down: AtomicBool,
}

impl MemoryRepositories {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn add_user(&self, username: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.tables
            .lock()
            .unwrap()
            .users
            .insert(id, username.to_string());
        id
    }

    /// Insert a problem directly, bypassing services and cache maintenance.
    pub fn seed_problem(&self, uploader_id: Uuid, title: &str, topics: &[&str]) -> Uuid {
        let mut tables = self.tables.lock().unwrap();
        let now = tables.now();
        let id = Uuid::new_v4();
        tables.problems.push(ProblemRecord {
            id,
            title: title.to_string(),
            description: format!("Seeded description for {title}"),
            topics: topics.iter().map(|t| t.to_string()).collect(),
            test_cases: vec![TestCase {
                input: "1".into(),
                output: "1".into(),
            }],
            uploader_id,
            uploader_name: None,
            reports: Vec::new(),
            created_at: now,
            updated_at: now,
        });
        id
    }

    pub fn seed_solution(&self, problem_id: Uuid, uploader_id: Uuid, accepted: bool) -> Uuid {
        let mut tables = self.tables.lock().unwrap();
        let now = tables.now();
        let id = Uuid::new_v4();
        tables.solutions.push(SolutionRecord {
            id,
            problem_id,
            uploader_id,
            uploader_name: None,
            code: format!("solution {id}"),
            language: "rust".into(),
            explanation: format!("explanation for {id}"),
            accepted,
            likes: Vec::new(),
            reports: Vec::new(),
            created_at: now,
            updated_at: now,
        });
        id
    }

    pub fn problem_count(&self) -> usize {
        self.tables.lock().unwrap().problems.len()
    }

    pub fn solution(&self, id: Uuid) -> Option<SolutionRecord> {
        self.tables
            .lock()
            .unwrap()
            .solutions
            .iter()
            .find(|s| s.id == id)
            .cloned()
    }

    pub fn set_store_down(&self, down: bool) {
        self.store_down.store(down, Ordering::SeqCst);
    }

    fn check_up(&self) -> Result<(), RepoError> {
        if self.store_down.load(Ordering::SeqCst) {
            Err(RepoError::Timeout)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ProblemsRepo for MemoryRepositories {
    async fn list_problem_summaries(
        &self,
        filter: &ProblemQueryFilter,
        skip: u64,
        limit: u32,
    ) -> Result<Vec<ProblemSummary>, RepoError> {
        self.check_up()?;
        self.problem_list_calls.fetch_add(1, Ordering::SeqCst);
        let tables = self.tables.lock().unwrap();
        let mut matching: Vec<&ProblemRecord> = tables
            .problems
            .iter()
            .filter(|p| tables.problem_matches(p, filter))
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(matching
            .into_iter()
            .skip(skip as usize)
            .take(limit as usize)
            .map(|p| ProblemSummary {
                id: p.id,
                title: p.title.clone(),
                topics: p.topics.clone(),
                created_at: p.created_at,
            })
            .collect())
    }

    async fn count_problems(&self, filter: &ProblemQueryFilter) -> Result<u64, RepoError> {
        self.check_up()?;
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .problems
            .iter()
            .filter(|p| tables.problem_matches(p, filter))
            .count() as u64)
    }

    async fn find_problem(&self, id: Uuid) -> Result<Option<ProblemRecord>, RepoError> {
        self.check_up()?;
        let tables = self.tables.lock().unwrap();
        Ok(tables.problems.iter().find(|p| p.id == id).map(|p| {
            let mut record = p.clone();
            record.uploader_name = tables.name_of(p.uploader_id);
            record
        }))
    }

    async fn problem_exists(&self, id: Uuid) -> Result<bool, RepoError> {
        self.check_up()?;
        Ok(self
            .tables
            .lock()
            .unwrap()
            .problems
            .iter()
            .any(|p| p.id == id))
    }

    async fn list_topics(&self) -> Result<Vec<String>, RepoError> {
        self.check_up()?;
        let topics: BTreeSet<String> = self
            .tables
            .lock()
            .unwrap()
            .problems
            .iter()
            .flat_map(|p| p.topics.iter().cloned())
            .collect();
        Ok(topics.into_iter().collect())
    }

    async fn list_uploaded_problems(
        &self,
        uploader_id: Uuid,
        topic: Option<&str>,
    ) -> Result<Vec<UploadedProblem>, RepoError> {
        self.check_up()?;
        let tables = self.tables.lock().unwrap();
        let mut uploaded: Vec<UploadedProblem> = tables
            .problems
            .iter()
            .filter(|p| p.uploader_id == uploader_id)
            .filter(|p| topic.is_none_or(|t| p.topics.iter().any(|own| own == t)))
            .map(|p| UploadedProblem {
                id: p.id,
                title: p.title.clone(),
                description: p.description.clone(),
                topics: p.topics.clone(),
                solution_count: tables
                    .solutions
                    .iter()
                    .filter(|s| s.problem_id == p.id)
                    .count() as u64,
                created_at: p.created_at,
            })
            .collect();
        uploaded.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(uploaded)
    }
}

#[async_trait]
impl ProblemsWriteRepo for MemoryRepositories {
    async fn create_problem(
        &self,
        uploader_id: Uuid,
        problem: NewProblem,
    ) -> Result<ProblemRecord, RepoError> {
        self.check_up()?;
        let mut tables = self.tables.lock().unwrap();
        if tables.problems.iter().any(|p| p.title == problem.title) {
            return Err(RepoError::Duplicate {
                constraint: "problems_title_key".into(),
            });
        }
        let now = tables.now();
        let record = ProblemRecord {
            id: Uuid::new_v4(),
            title: problem.title,
            description: problem.description,
            topics: problem.topics,
            test_cases: problem.test_cases,
            uploader_id,
            uploader_name: tables.name_of(uploader_id),
            reports: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        tables.problems.push(record.clone());
        Ok(record)
    }

    async fn delete_problem(&self, id: Uuid) -> Result<(), RepoError> {
        self.check_up()?;
        let mut tables = self.tables.lock().unwrap();
        let before = tables.problems.len();
        tables.problems.retain(|p| p.id != id);
        if tables.problems.len() == before {
            return Err(RepoError::NotFound);
        }
        tables.solutions.retain(|s| s.problem_id != id);
        tables.replies.retain(|r| r.problem_id != id);
        Ok(())
    }

    async fn toggle_problem_report(
        &self,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<MembershipToggle>, RepoError> {
        self.check_up()?;
        let mut tables = self.tables.lock().unwrap();
        let Some(problem) = tables.problems.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        let active = flip_membership(&mut problem.reports, user_id);
        Ok(Some(MembershipToggle {
            active,
            count: problem.reports.len() as u64,
        }))
    }
}

#[async_trait]
impl SolutionsRepo for MemoryRepositories {
    async fn list_solution_summaries(
        &self,
        problem_id: Uuid,
        filter: &SolutionQueryFilter,
        skip: u64,
        limit: u32,
    ) -> Result<Vec<SolutionSummary>, RepoError> {
        self.check_up()?;
        self.solution_list_calls.fetch_add(1, Ordering::SeqCst);
        let tables = self.tables.lock().unwrap();
        let mut matching: Vec<&SolutionRecord> = tables
            .solutions
            .iter()
            .filter(|s| Tables::solution_matches(s, problem_id, filter))
            .collect();
        matching.sort_by(|a, b| {
            b.accepted
                .cmp(&a.accepted)
                .then(b.created_at.cmp(&a.created_at))
                .then(b.id.cmp(&a.id))
        });
        Ok(matching
            .into_iter()
            .skip(skip as usize)
            .take(limit as usize)
            .map(|s| SolutionSummary {
                id: s.id,
                problem_id: s.problem_id,
                uploader_id: Some(s.uploader_id),
                uploader_name: tables
                    .name_of(s.uploader_id)
                    .unwrap_or_else(|| "Unknown".to_string()),
                explanation: s.explanation.clone(),
                language: s.language.clone(),
                accepted: s.accepted,
                reply_count: tables
                    .replies
                    .iter()
                    .filter(|r| r.solution_id == s.id)
                    .count() as u64,
                likes: s.likes.clone(),
                reports: s.reports.clone(),
                created_at: s.created_at,
            })
            .collect())
    }

    async fn count_solutions(
        &self,
        problem_id: Uuid,
        filter: &SolutionQueryFilter,
    ) -> Result<u64, RepoError> {
        self.check_up()?;
        Ok(self
            .tables
            .lock()
            .unwrap()
            .solutions
            .iter()
            .filter(|s| Tables::solution_matches(s, problem_id, filter))
            .count() as u64)
    }

    async fn find_solution(&self, id: Uuid) -> Result<Option<SolutionRecord>, RepoError> {
        self.check_up()?;
        let tables = self.tables.lock().unwrap();
        Ok(tables.solutions.iter().find(|s| s.id == id).map(|s| {
            let mut record = s.clone();
            record.uploader_name = tables.name_of(s.uploader_id);
            record
        }))
    }

    async fn list_outcomes_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<SolutionOutcome>, RepoError> {
        self.check_up()?;
        self.outcome_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .tables
            .lock()
            .unwrap()
            .solutions
            .iter()
            .filter(|s| s.uploader_id == user_id)
            .map(|s| SolutionOutcome {
                problem_id: s.problem_id,
                accepted: s.accepted,
            })
            .collect())
    }

    async fn list_submitted_texts(
        &self,
        problem_id: Uuid,
        user_id: Uuid,
    ) -> Result<Vec<SubmittedText>, RepoError> {
        self.check_up()?;
        Ok(self
            .tables
            .lock()
            .unwrap()
            .solutions
            .iter()
            .filter(|s| s.problem_id == problem_id && s.uploader_id == user_id)
            .map(|s| SubmittedText {
                code: s.code.clone(),
                explanation: s.explanation.clone(),
            })
            .collect())
    }

    async fn has_accepted_solution(
        &self,
        problem_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, RepoError> {
        self.check_up()?;
        Ok(self
            .tables
            .lock()
            .unwrap()
            .solutions
            .iter()
            .any(|s| s.problem_id == problem_id && s.uploader_id == user_id && s.accepted))
    }

    async fn list_solved_problems(
        &self,
        user_id: Uuid,
        filter: &SolvedProblemFilter,
        skip: u64,
        limit: u32,
    ) -> Result<Vec<SolvedProblem>, RepoError> {
        self.check_up()?;
        Ok(self
            .tables
            .lock()
            .unwrap()
            .solved_problems(user_id, filter)
            .into_iter()
            .skip(skip as usize)
            .take(limit as usize)
            .collect())
    }

    async fn count_solved_problems(
        &self,
        user_id: Uuid,
        filter: &SolvedProblemFilter,
    ) -> Result<u64, RepoError> {
        self.check_up()?;
        Ok(self.tables.lock().unwrap().solved_problems(user_id, filter).len() as u64)
    }
}

#[async_trait]
impl SolutionsWriteRepo for MemoryRepositories {
    async fn create_solution(
        &self,
        problem_id: Uuid,
        uploader_id: Uuid,
        solution: NewSolution,
    ) -> Result<SolutionRecord, RepoError> {
        self.check_up()?;
        let mut tables = self.tables.lock().unwrap();
        if !tables.problems.iter().any(|p| p.id == problem_id) {
            return Err(RepoError::Integrity {
                message: "problem does not exist".into(),
            });
        }
        let now = tables.now();
        let record = SolutionRecord {
            id: Uuid::new_v4(),
            problem_id,
            uploader_id,
            uploader_name: tables.name_of(uploader_id),
            code: solution.code,
            language: solution.language,
            explanation: solution.explanation,
            accepted: false,
            likes: Vec::new(),
            reports: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        tables.solutions.push(record.clone());
        Ok(record)
    }

    async fn toggle_accepted(&self, id: Uuid) -> Result<Option<AcceptanceToggle>, RepoError> {
        self.check_up()?;
        let mut tables = self.tables.lock().unwrap();
        let Some(solution) = tables.solutions.iter_mut().find(|s| s.id == id) else {
            return Ok(None);
        };
        solution.accepted = !solution.accepted;
        Ok(Some(AcceptanceToggle {
            problem_id: solution.problem_id,
            uploader_id: solution.uploader_id,
            accepted: solution.accepted,
        }))
    }

    async fn toggle_interaction(
        &self,
        id: Uuid,
        user_id: Uuid,
        interaction: Interaction,
    ) -> Result<InteractionToggle, RepoError> {
        self.check_up()?;
        let mut tables = self.tables.lock().unwrap();
        let Some(solution) = tables.solutions.iter_mut().find(|s| s.id == id) else {
            return Ok(InteractionToggle::NotFound);
        };
        let (target, opposite) = match interaction {
            Interaction::Like => (&mut solution.likes, &solution.reports),
            Interaction::Report => (&mut solution.reports, &solution.likes),
        };
        if opposite.contains(&user_id) {
            return Ok(InteractionToggle::Conflict);
        }
        let active = flip_membership(target, user_id);
        Ok(InteractionToggle::Toggled {
            problem_id: solution.problem_id,
            state: MembershipToggle {
                active,
                count: target.len() as u64,
            },
        })
    }

    async fn delete_solution(&self, id: Uuid) -> Result<(), RepoError> {
        self.check_up()?;
        let mut tables = self.tables.lock().unwrap();
        let before = tables.solutions.len();
        tables.solutions.retain(|s| s.id != id);
        if tables.solutions.len() == before {
            return Err(RepoError::NotFound);
        }
        tables.replies.retain(|r| r.solution_id != id);
        Ok(())
    }
}

#[async_trait]
impl RepliesRepo for MemoryRepositories {
    async fn list_replies(&self, solution_id: Uuid) -> Result<Vec<ReplyRecord>, RepoError> {
        self.check_up()?;
        let tables = self.tables.lock().unwrap();
        let mut replies: Vec<ReplyRecord> = tables
            .replies
            .iter()
            .filter(|r| r.solution_id == solution_id)
            .cloned()
            .collect();
        replies.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(replies)
    }

    async fn create_reply(
        &self,
        problem_id: Uuid,
        solution_id: Uuid,
        replier_id: Uuid,
        text: String,
    ) -> Result<ReplyRecord, RepoError> {
        self.check_up()?;
        let mut tables = self.tables.lock().unwrap();
        let now = tables.now();
        let record = ReplyRecord {
            id: Uuid::new_v4(),
            problem_id,
            solution_id,
            replier_id,
            replier_name: tables.name_of(replier_id),
            reply: text,
            created_at: now,
        };
        tables.replies.push(record.clone());
        Ok(record)
    }
}

#[async_trait]
impl StatsRepo for MemoryRepositories {
    async fn global_totals(&self) -> Result<GlobalTotals, RepoError> {
        self.check_up()?;
        self.stats_calls.fetch_add(1, Ordering::SeqCst);
        let tables = self.tables.lock().unwrap();
        Ok(GlobalTotals {
            user_count: tables.users.len() as u64,
            problem_count: tables.problems.len() as u64,
            solution_count: tables.solutions.len() as u64,
        })
    }

    async fn leaderboard(
        &self,
        metric: LeaderboardMetric,
        limit: u32,
    ) -> Result<Vec<LeaderboardEntry>, RepoError> {
        self.check_up()?;
        let tables = self.tables.lock().unwrap();
        let mut entries: Vec<LeaderboardEntry> = tables
            .users
            .iter()
            .map(|(id, username)| {
                let score = match metric {
                    LeaderboardMetric::ProblemsUploaded => tables
                        .problems
                        .iter()
                        .filter(|p| p.uploader_id == *id)
                        .count(),
                    LeaderboardMetric::SolutionsGiven => tables
                        .solutions
                        .iter()
                        .filter(|s| s.uploader_id == *id)
                        .count(),
                    LeaderboardMetric::AcceptedSolutions => tables
                        .solutions
                        .iter()
                        .filter(|s| s.uploader_id == *id && s.accepted)
                        .count(),
                };
                LeaderboardEntry {
                    id: *id,
                    username: username.clone(),
                    score: score as u64,
                }
            })
            .filter(|entry| entry.score > 0)
            .collect();
        entries.sort_by(|a, b| b.score.cmp(&a.score).then(a.username.cmp(&b.username)));
        entries.truncate(limit as usize);
        Ok(entries)
    }

    async fn user_contributions(
        &self,
        user_id: Uuid,
    ) -> Result<Option<UserContributionStats>, RepoError> {
        self.check_up()?;
        let tables = self.tables.lock().unwrap();
        let Some(username) = tables.name_of(user_id) else {
            return Ok(None);
        };
        let mine = tables.solutions.iter().filter(|s| s.uploader_id == user_id);
        Ok(Some(UserContributionStats {
            id: user_id,
            username,
            total_problems_posted: tables
                .problems
                .iter()
                .filter(|p| p.uploader_id == user_id)
                .count() as u64,
            total_solutions_given: mine.clone().count() as u64,
            total_accepted_solutions: mine.filter(|s| s.accepted).count() as u64,
        }))
    }
}

#[async_trait]
impl HealthRepo for MemoryRepositories {
    async fn ping(&self) -> Result<(), RepoError> {
        self.check_up()
    }
}

fn flip_membership(set: &mut Vec<Uuid>, user_id: Uuid) -> bool {
    if let Some(position) = set.iter().position(|id| *id == user_id) {
        set.remove(position);
        false
    } else {
        set.push(user_id);
        true
    }
}

/// Cache whose every operation fails, standing in for an unreachable backend.
#[derive(Debug, Default)]
pub struct FailingCache;

#[async_trait]
impl VolatileCache for FailingCache {
    async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
        Err(CacheError::backend("connection refused"))
    }

    async fn set_ex(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<(), CacheError> {
        Err(CacheError::backend("connection refused"))
    }

    async fn delete(&self, _keys: &[String]) -> Result<u64, CacheError> {
        Err(CacheError::backend("connection refused"))
    }

    async fn scan_prefix(&self, _prefix: &str) -> Result<Vec<String>, CacheError> {
        Err(CacheError::backend("connection refused"))
    }

    async fn exists(&self, _key: &str) -> Result<bool, CacheError> {
        Err(CacheError::backend("connection refused"))
    }

    async fn hash_get_all(&self, _key: &str) -> Result<HashMap<String, String>, CacheError> {
        Err(CacheError::backend("connection refused"))
    }

    async fn hash_set(&self, _key: &str, _fields: &[(String, String)]) -> Result<(), CacheError> {
        Err(CacheError::backend("connection refused"))
    }

    async fn hash_set_if_absent(
        &self,
        _key: &str,
        _field: &str,
        _value: &str,
    ) -> Result<bool, CacheError> {
        Err(CacheError::backend("connection refused"))
    }

    async fn expire(&self, _key: &str, _ttl: Duration) -> Result<bool, CacheError> {
        Err(CacheError::backend("connection refused"))
    }

    async fn ping(&self) -> Result<(), CacheError> {
        Err(CacheError::backend("connection refused"))
    }
}

pub struct Harness {
    pub repos: Arc<MemoryRepositories>,
    pub cache: Arc<MemoryCache>,
    pub state: ApiState,
}

/// Fully wired services over the in-memory store and cache.
pub fn harness() -> Harness {
    harness_with_limit(1_000)
}

pub fn harness_with_limit(max_writes: u32) -> Harness {
    build_harness(max_writes, MemoryCache::new())
}

/// Services over an in-process cache that holds at most `capacity` keys.
pub fn harness_with_cache_capacity(capacity: usize) -> Harness {
    let capacity = NonZeroUsize::new(capacity).expect("capacity must be non-zero");
    build_harness(1_000, MemoryCache::with_capacity(capacity))
}

fn build_harness(max_writes: u32, cache: MemoryCache) -> Harness {
    let repos = MemoryRepositories::new();
    let cache = Arc::new(cache);
    let state = ApiState::build(
        repos.clone(),
        cache.clone(),
        CacheConfig::default(),
        ApiRateLimiter::new(Duration::from_secs(60), max_writes),
    );
    Harness {
        repos,
        cache,
        state,
    }
}

/// Services whose cache backend is down.
pub fn harness_without_cache() -> (Arc<MemoryRepositories>, ApiState) {
    let repos = MemoryRepositories::new();
    let state = ApiState::build(
        repos.clone(),
        Arc::new(FailingCache),
        CacheConfig::default(),
        ApiRateLimiter::new(Duration::from_secs(60), 1_000),
    );
    (repos, state)
}
