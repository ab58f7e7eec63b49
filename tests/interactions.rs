mod support;

use std::sync::atomic::Ordering;

use dojo::application::feed::SolutionFeedQuery;
use dojo::application::interactions::InteractionError;
use dojo::application::solutions::{SolutionError, SubmitSolutionCommand};
use dojo::cache::{CacheKeys, FeedScope, VolatileCache};
use dojo::domain::types::{Actor, Interaction, SolveStatus, UserRole};
use support::harness;

fn command(code: &str, explanation: &str) -> SubmitSolutionCommand {
    SubmitSolutionCommand {
        code: code.to_string(),
        language: None,
        explanation: explanation.to_string(),
    }
}

#[tokio::test]
async fn submit_then_accept_moves_status_to_accepted() {
    let h = harness();
    let owner = h.repos.add_user("owner");
    let solver = h.repos.add_user("solver");
    let problem = h.repos.seed_problem(owner, "Constant answer", &["math"]);

    // Warm the map so the incremental updates are exercised.
    assert!(h.state.feed.list_problems(Some(solver), &Default::default()).await.is_ok());

    let solution = h
        .state
        .solutions
        .submit(
            Actor::member(solver),
            problem,
            command("return 1;", "trivial"),
        )
        .await
        .unwrap();

    let key = CacheKeys::default().status_map(solver);
    let fields = h.cache.hash_get_all(&key).await.unwrap();
    assert_eq!(
        fields.get(&problem.to_string()).map(String::as_str),
        Some(SolveStatus::Attempted.as_str())
    );

    let accepted = h
        .state
        .interactions
        .toggle_accepted(solution, owner)
        .await
        .unwrap();
    assert!(accepted);

    let fields = h.cache.hash_get_all(&key).await.unwrap();
    assert_eq!(
        fields.get(&problem.to_string()).map(String::as_str),
        Some(SolveStatus::Accepted.as_str())
    );

    let feed = h
        .state
        .feed
        .list_problems(Some(solver), &Default::default())
        .await
        .unwrap();
    assert!(feed.items[0].replied && feed.items[0].accepted);
    assert_eq!(h.repos.outcome_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn unaccept_keeps_accepted_when_another_solution_is_accepted() {
    let h = harness();
    let owner = h.repos.add_user("owner");
    let solver = h.repos.add_user("solver");
    let problem = h.repos.seed_problem(owner, "Two accepted", &["math"]);
    let first = h.repos.seed_solution(problem, solver, true);
    h.repos.seed_solution(problem, solver, true);

    h.state.feed.list_problems(Some(solver), &Default::default()).await.unwrap();
    let accepted = h
        .state
        .interactions
        .toggle_accepted(first, owner)
        .await
        .unwrap();
    assert!(!accepted);

    let fields = h
        .cache
        .hash_get_all(&CacheKeys::default().status_map(solver))
        .await
        .unwrap();
    assert_eq!(
        fields.get(&problem.to_string()).map(String::as_str),
        Some("accepted")
    );
}

#[tokio::test]
async fn unaccept_of_last_accepted_solution_reverts_to_attempted() {
    let h = harness();
    let owner = h.repos.add_user("owner");
    let solver = h.repos.add_user("solver");
    let problem = h.repos.seed_problem(owner, "Single accepted", &["math"]);
    let only = h.repos.seed_solution(problem, solver, true);

    h.state.feed.list_problems(Some(solver), &Default::default()).await.unwrap();
    h.state
        .interactions
        .toggle_accepted(only, owner)
        .await
        .unwrap();

    let feed = h
        .state
        .feed
        .list_problems(Some(solver), &Default::default())
        .await
        .unwrap();
    assert!(feed.items[0].replied);
    assert!(!feed.items[0].accepted);
}

#[tokio::test]
async fn only_the_problem_uploader_may_accept() {
    let h = harness();
    let owner = h.repos.add_user("owner");
    let solver = h.repos.add_user("solver");
    let problem = h.repos.seed_problem(owner, "Ownership check", &["math"]);
    let solution = h.repos.seed_solution(problem, solver, false);

    let err = h
        .state
        .interactions
        .toggle_accepted(solution, solver)
        .await
        .unwrap_err();
    assert!(matches!(err, InteractionError::NotProblemOwner));
    assert!(!h.repos.solution(solution).unwrap().accepted);
}

#[tokio::test]
async fn like_then_report_is_rejected_without_change() {
    let h = harness();
    let owner = h.repos.add_user("owner");
    let user_a = h.repos.add_user("a");
    let problem = h.repos.seed_problem(owner, "Reaction rules", &["math"]);
    let solution = h.repos.seed_solution(problem, owner, false);

    let liked = h
        .state
        .interactions
        .toggle_like(solution, user_a)
        .await
        .unwrap();
    assert!(liked.active);
    assert_eq!(liked.count, 1);

    let err = h
        .state
        .interactions
        .toggle_report(solution, user_a)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        InteractionError::Conflict {
            attempted: Interaction::Report,
            held: Interaction::Like,
        }
    ));

    let record = h.repos.solution(solution).unwrap();
    assert_eq!(record.likes, vec![user_a]);
    assert!(record.reports.is_empty());

    let feed = h
        .state
        .feed
        .list_solutions(Some(user_a), problem, &SolutionFeedQuery::default())
        .await
        .unwrap();
    let item = &feed.items[0];
    assert!(item.liked);
    assert_eq!(item.likes_count, 1);
    assert!(!item.reported);
    assert_eq!(item.report_count, 0);
}

#[tokio::test]
async fn toggling_twice_restores_the_original_state() {
    let h = harness();
    let owner = h.repos.add_user("owner");
    let user = h.repos.add_user("user");
    let problem = h.repos.seed_problem(owner, "Double click", &["math"]);
    let solution = h.repos.seed_solution(problem, owner, false);

    let reported = h
        .state
        .interactions
        .toggle_report(solution, user)
        .await
        .unwrap();
    assert!(reported.active);
    let cleared = h
        .state
        .interactions
        .toggle_report(solution, user)
        .await
        .unwrap();
    assert!(!cleared.active);
    assert_eq!(cleared.count, 0);

    // With the report withdrawn a like is allowed again.
    let liked = h
        .state
        .interactions
        .toggle_like(solution, user)
        .await
        .unwrap();
    assert!(liked.active);
}

#[tokio::test]
async fn toggles_clear_the_cached_solution_feed() {
    let h = harness();
    let owner = h.repos.add_user("owner");
    let user = h.repos.add_user("user");
    let problem = h.repos.seed_problem(owner, "Cached reactions", &["math"]);
    let solution = h.repos.seed_solution(problem, owner, false);

    let query = SolutionFeedQuery::default();
    let before = h
        .state
        .feed
        .list_solutions(Some(user), problem, &query)
        .await
        .unwrap();
    assert_eq!(before.items[0].likes_count, 0);

    h.state
        .interactions
        .toggle_like(solution, user)
        .await
        .unwrap();

    let prefix = CacheKeys::default().scope_prefix(FeedScope::Solutions { problem_id: problem });
    assert!(h.cache.scan_prefix(&prefix).await.unwrap().is_empty());

    let after = h
        .state
        .feed
        .list_solutions(Some(user), problem, &query)
        .await
        .unwrap();
    assert!(after.items[0].liked);
    assert_eq!(after.items[0].likes_count, 1);
}

#[tokio::test]
async fn toggles_on_missing_solution_report_not_found() {
    let h = harness();
    let user = h.repos.add_user("user");
    let missing = uuid::Uuid::new_v4();

    assert!(matches!(
        h.state.interactions.toggle_like(missing, user).await,
        Err(InteractionError::SolutionNotFound)
    ));
    assert!(matches!(
        h.state.interactions.toggle_accepted(missing, user).await,
        Err(InteractionError::SolutionNotFound)
    ));
    assert!(matches!(
        h.state.interactions.toggle_problem_report(missing, user).await,
        Err(InteractionError::ProblemNotFound)
    ));
}

#[tokio::test]
async fn problem_reports_toggle_membership() {
    let h = harness();
    let owner = h.repos.add_user("owner");
    let user = h.repos.add_user("user");
    let problem = h.repos.seed_problem(owner, "Reported problem", &["math"]);

    let on = h
        .state
        .interactions
        .toggle_problem_report(problem, user)
        .await
        .unwrap();
    assert!(on.is_reported);
    assert_eq!(on.report_count, 1);

    let detail = h.state.problems.detail(problem, Some(user)).await.unwrap();
    assert!(detail.is_reported);
    assert_eq!(detail.report_count, 1);

    let off = h
        .state
        .interactions
        .toggle_problem_report(problem, user)
        .await
        .unwrap();
    assert!(!off.is_reported);
    assert_eq!(off.report_count, 0);
}

#[tokio::test]
async fn near_duplicate_submission_is_rejected_before_writing() {
    let h = harness();
    let owner = h.repos.add_user("owner");
    let solver = h.repos.add_user("solver");
    let problem = h.repos.seed_problem(owner, "Duplicate guard", &["math"]);
    let actor = Actor::member(solver);

    h.state
        .solutions
        .submit(actor, problem, command("return a + b;", "adds the two inputs"))
        .await
        .unwrap();
    let err = h
        .state
        .solutions
        .submit(actor, problem, command("return a + b; ", "adds the two inputs!"))
        .await
        .unwrap_err();
    assert!(matches!(err, SolutionError::NearDuplicate));

    // A different user may submit the same text.
    let other = Actor::member(h.repos.add_user("other"));
    assert!(
        h.state
            .solutions
            .submit(other, problem, command("return a + b;", "adds the two inputs"))
            .await
            .is_ok()
    );
}

#[tokio::test]
async fn deleting_a_solution_evicts_the_uploaders_map() {
    let h = harness();
    let owner = h.repos.add_user("owner");
    let solver = h.repos.add_user("solver");
    let problem = h.repos.seed_problem(owner, "Deleted attempt", &["math"]);
    let solution = h.repos.seed_solution(problem, solver, false);

    h.state.feed.list_problems(Some(solver), &Default::default()).await.unwrap();
    let key = CacheKeys::default().status_map(solver);
    assert!(h.cache.exists(&key).await.unwrap());

    let err = h
        .state
        .solutions
        .delete(solution, Actor::member(owner))
        .await
        .unwrap_err();
    assert!(matches!(err, SolutionError::Forbidden));

    h.state
        .solutions
        .delete(solution, Actor::member(solver))
        .await
        .unwrap();
    assert!(!h.cache.exists(&key).await.unwrap());

    let feed = h
        .state
        .feed
        .list_problems(Some(solver), &Default::default())
        .await
        .unwrap();
    assert!(!feed.items[0].replied);
}

#[tokio::test]
async fn admins_may_delete_any_problem() {
    let h = harness();
    let owner = h.repos.add_user("owner");
    let problem = h.repos.seed_problem(owner, "Moderated problem", &["math"]);
    h.repos.seed_solution(problem, owner, false);

    let admin = Actor {
        id: h.repos.add_user("admin"),
        role: UserRole::Admin,
    };
    h.state.problems.delete(problem, admin).await.unwrap();
    assert_eq!(h.repos.problem_count(), 0);
}

async fn warm_feeds(h: &support::Harness, problem: uuid::Uuid) -> (String, String) {
    let keys = CacheKeys::default();
    let problems_prefix = keys.scope_prefix(FeedScope::Problems);
    let solutions_prefix = keys.scope_prefix(FeedScope::Solutions { problem_id: problem });

    h.state.feed.list_problems(None, &Default::default()).await.unwrap();
    h.state
        .feed
        .list_solutions(None, problem, &SolutionFeedQuery::default())
        .await
        .unwrap();
    assert_eq!(h.cache.scan_prefix(&problems_prefix).await.unwrap().len(), 1);
    assert_eq!(h.cache.scan_prefix(&solutions_prefix).await.unwrap().len(), 1);

    (problems_prefix, solutions_prefix)
}

#[tokio::test]
async fn deleting_a_problem_clears_both_feed_scopes() {
    let h = harness();
    let owner = h.repos.add_user("owner");
    let problem = h.repos.seed_problem(owner, "Short lived", &["math"]);
    let other = h.repos.seed_problem(owner, "Still listed", &["math"]);
    h.repos.seed_solution(problem, owner, false);
    h.repos.seed_solution(other, owner, false);

    let (problems_prefix, solutions_prefix) = warm_feeds(&h, problem).await;
    h.state
        .feed
        .list_solutions(None, other, &SolutionFeedQuery::default())
        .await
        .unwrap();

    h.state
        .problems
        .delete(problem, Actor::member(owner))
        .await
        .unwrap();

    assert!(h.cache.scan_prefix(&problems_prefix).await.unwrap().is_empty());
    assert!(h.cache.scan_prefix(&solutions_prefix).await.unwrap().is_empty());
    let other_prefix =
        CacheKeys::default().scope_prefix(FeedScope::Solutions { problem_id: other });
    assert_eq!(h.cache.scan_prefix(&other_prefix).await.unwrap().len(), 1);

    let feed = h
        .state
        .feed
        .list_problems(None, &Default::default())
        .await
        .unwrap();
    assert_eq!(feed.pagination.total, 1);
    assert_eq!(feed.items[0].id, other);
}

#[tokio::test]
async fn deleting_a_solution_clears_its_solution_feed() {
    let h = harness();
    let owner = h.repos.add_user("owner");
    let solver = h.repos.add_user("solver");
    let problem = h.repos.seed_problem(owner, "Withdrawn answer", &["math"]);
    let solution = h.repos.seed_solution(problem, solver, false);

    let (problems_prefix, solutions_prefix) = warm_feeds(&h, problem).await;

    h.state
        .solutions
        .delete(solution, Actor::member(solver))
        .await
        .unwrap();

    assert!(h.cache.scan_prefix(&solutions_prefix).await.unwrap().is_empty());
    assert_eq!(h.cache.scan_prefix(&problems_prefix).await.unwrap().len(), 1);

    let feed = h
        .state
        .feed
        .list_solutions(None, problem, &SolutionFeedQuery::default())
        .await
        .unwrap();
    assert!(feed.items.is_empty());
}

#[tokio::test]
async fn accept_toggle_clears_the_solution_feed() {
    let h = harness();
    let owner = h.repos.add_user("owner");
    let solver = h.repos.add_user("solver");
    let problem = h.repos.seed_problem(owner, "Accepted later", &["math"]);
    let solution = h.repos.seed_solution(problem, solver, false);

    let (problems_prefix, solutions_prefix) = warm_feeds(&h, problem).await;

    assert!(
        h.state
            .interactions
            .toggle_accepted(solution, owner)
            .await
            .unwrap()
    );

    assert!(h.cache.scan_prefix(&solutions_prefix).await.unwrap().is_empty());
    assert_eq!(h.cache.scan_prefix(&problems_prefix).await.unwrap().len(), 1);

    let feed = h
        .state
        .feed
        .list_solutions(None, problem, &SolutionFeedQuery::default())
        .await
        .unwrap();
    assert!(feed.items[0].accepted);
}
