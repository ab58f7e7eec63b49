mod support;

use std::sync::atomic::Ordering;

use dojo::application::feed::{ProblemFeedQuery, SolutionFeedQuery};
use dojo::application::merge::ProblemFeedItem;
use dojo::application::pagination::PageRequest;
use dojo::application::problems::UploadProblemCommand;
use dojo::application::solutions::SubmitSolutionCommand;
use dojo::cache::{CacheKeys, FeedScope, VolatileCache};
use dojo::domain::entities::TestCase;
use dojo::domain::types::{Actor, StatusFilter};
use support::{harness, harness_with_cache_capacity, harness_without_cache};
use uuid::Uuid;

fn page(page: u32) -> ProblemFeedQuery {
    ProblemFeedQuery {
        page: PageRequest::new(Some(page), Some(10)),
        ..Default::default()
    }
}

fn upload(title: &str) -> UploadProblemCommand {
    UploadProblemCommand {
        title: title.to_string(),
        description: "Return the answer for every listed input case.".to_string(),
        topics: vec!["arrays".to_string()],
        test_cases: vec![TestCase {
            input: "[1,2]".to_string(),
            output: "3".to_string(),
        }],
    }
}

#[tokio::test]
async fn upload_invalidates_every_cached_problem_page() {
    let h = harness();
    let author = h.repos.add_user("author");
    for index in 0..25 {
        h.repos
            .seed_problem(author, &format!("Seeded problem {index:02}"), &["arrays"]);
    }

    let first = h.state.feed.list_problems(None, &page(1)).await.unwrap();
    let second = h.state.feed.list_problems(None, &page(2)).await.unwrap();
    assert_eq!(first.items.len(), 10);
    assert_eq!(second.items.len(), 10);
    assert_eq!(first.pagination.total, 25);
    assert_eq!(first.pagination.total_pages, 3);
    assert!(first.pagination.has_next_page);
    assert_eq!(h.repos.problem_list_calls.load(Ordering::SeqCst), 2);

    let keys = CacheKeys::default();
    let prefix = keys.scope_prefix(FeedScope::Problems);
    assert_eq!(h.cache.scan_prefix(&prefix).await.unwrap().len(), 2);

    // Served from cache.
    h.state.feed.list_problems(None, &page(1)).await.unwrap();
    h.state.feed.list_problems(None, &page(2)).await.unwrap();
    assert_eq!(h.repos.problem_list_calls.load(Ordering::SeqCst), 2);

    let new_id = h
        .state
        .problems
        .upload(Actor::member(author), upload("Freshly uploaded problem"))
        .await
        .unwrap();
    assert!(h.cache.scan_prefix(&prefix).await.unwrap().is_empty());

    let refreshed = h.state.feed.list_problems(None, &page(1)).await.unwrap();
    assert_eq!(refreshed.pagination.total, 26);
    assert_eq!(refreshed.items[0].id, new_id);
    assert_eq!(h.repos.problem_list_calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn problem_feed_is_newest_first() {
    let h = harness();
    let author = h.repos.add_user("author");
    let older = h.repos.seed_problem(author, "Older problem", &["math"]);
    let newer = h.repos.seed_problem(author, "Newer problem", &["math"]);

    let feed = h.state.feed.list_problems(None, &page(1)).await.unwrap();
    let ids: Vec<_> = feed.items.iter().map(|item| item.id).collect();
    assert_eq!(ids, vec![newer, older]);
}

#[tokio::test]
async fn filtered_requests_bypass_the_cache() {
    let h = harness();
    let author = h.repos.add_user("author");
    h.repos.seed_problem(author, "Graph coloring", &["graphs"]);
    h.repos.seed_problem(author, "Array rotation", &["arrays"]);

    let query = ProblemFeedQuery::parse(None, None, Some("graph"), None, None).unwrap();
    let first = h.state.feed.list_problems(None, &query).await.unwrap();
    let second = h.state.feed.list_problems(None, &query).await.unwrap();
    assert_eq!(first.items.len(), 1);
    assert_eq!(first, second);
    assert_eq!(h.repos.problem_list_calls.load(Ordering::SeqCst), 2);

    let prefix = CacheKeys::default().scope_prefix(FeedScope::Problems);
    assert!(h.cache.scan_prefix(&prefix).await.unwrap().is_empty());

    let topic = ProblemFeedQuery::parse(None, None, None, Some("arrays"), None).unwrap();
    let by_topic = h.state.feed.list_problems(None, &topic).await.unwrap();
    assert_eq!(by_topic.items.len(), 1);
    assert_eq!(by_topic.items[0].title, "Array rotation");
}

#[tokio::test]
async fn cached_page_is_shared_but_flags_are_per_viewer() {
    let h = harness();
    let author = h.repos.add_user("author");
    let alice = h.repos.add_user("alice");
    let bob = h.repos.add_user("bob");
    let solved = h.repos.seed_problem(author, "Solved by alice", &["dp"]);
    let tried = h.repos.seed_problem(author, "Tried by alice", &["dp"]);
    h.repos.seed_solution(solved, alice, true);
    h.repos.seed_solution(tried, alice, false);

    let for_alice = h.state.feed.list_problems(Some(alice), &page(1)).await.unwrap();
    let for_bob = h.state.feed.list_problems(Some(bob), &page(1)).await.unwrap();
    let anonymous = h.state.feed.list_problems(None, &page(1)).await.unwrap();
    assert_eq!(h.repos.problem_list_calls.load(Ordering::SeqCst), 1);

    let flags = |items: &[ProblemFeedItem], id: Uuid| {
        let item = items.iter().find(|item| item.id == id).unwrap();
        (item.replied, item.accepted)
    };
    assert_eq!(flags(&for_alice.items, solved), (true, true));
    assert_eq!(flags(&for_alice.items, tried), (true, false));
    assert_eq!(flags(&for_bob.items, solved), (false, false));
    assert!(anonymous.items.iter().all(|item| !item.replied && !item.accepted));
}

#[tokio::test]
async fn status_filters_use_the_viewers_map() {
    let h = harness();
    let author = h.repos.add_user("author");
    let solver = h.repos.add_user("solver");
    let solved = h.repos.seed_problem(author, "Solved one", &["dp"]);
    let tried = h.repos.seed_problem(author, "Tried one", &["dp"]);
    let untouched = h.repos.seed_problem(author, "Untouched one", &["dp"]);
    h.repos.seed_solution(solved, solver, true);
    h.repos.seed_solution(tried, solver, false);

    let ids_for = |status| ProblemFeedQuery {
        status: Some(status),
        ..Default::default()
    };

    let only_solved = h
        .state
        .feed
        .list_problems(Some(solver), &ids_for(StatusFilter::Solved))
        .await
        .unwrap();
    assert_eq!(
        only_solved.items.iter().map(|i| i.id).collect::<Vec<_>>(),
        vec![solved]
    );

    let attempted = h
        .state
        .feed
        .list_problems(Some(solver), &ids_for(StatusFilter::AttemptedNotSolved))
        .await
        .unwrap();
    assert_eq!(
        attempted.items.iter().map(|i| i.id).collect::<Vec<_>>(),
        vec![tried]
    );

    let unsolved = h
        .state
        .feed
        .list_problems(Some(solver), &ids_for(StatusFilter::Unsolved))
        .await
        .unwrap();
    assert_eq!(
        unsolved.items.iter().map(|i| i.id).collect::<Vec<_>>(),
        vec![untouched]
    );
    assert_eq!(unsolved.pagination.total, 1);
}

#[tokio::test]
async fn solution_feed_is_cached_per_problem_and_cleared_on_submit() {
    let h = harness();
    let author = h.repos.add_user("author");
    let solver = h.repos.add_user("solver");
    let first = h.repos.seed_problem(author, "First problem", &["math"]);
    let second = h.repos.seed_problem(author, "Second problem", &["math"]);
    h.repos.seed_solution(first, author, false);
    h.repos.seed_solution(second, author, false);

    let query = SolutionFeedQuery::default();
    h.state.feed.list_solutions(None, first, &query).await.unwrap();
    h.state.feed.list_solutions(None, second, &query).await.unwrap();
    h.state.feed.list_solutions(None, first, &query).await.unwrap();
    assert_eq!(h.repos.solution_list_calls.load(Ordering::SeqCst), 2);

    h.state
        .solutions
        .submit(
            Actor::member(solver),
            first,
            SubmitSolutionCommand {
                code: "fn answer() -> u32 { 42 }".to_string(),
                language: Some("rust".to_string()),
                explanation: "returns the constant answer".to_string(),
            },
        )
        .await
        .unwrap();

    let keys = CacheKeys::default();
    let first_prefix = keys.scope_prefix(FeedScope::Solutions { problem_id: first });
    let second_prefix = keys.scope_prefix(FeedScope::Solutions { problem_id: second });
    assert!(h.cache.scan_prefix(&first_prefix).await.unwrap().is_empty());
    assert_eq!(h.cache.scan_prefix(&second_prefix).await.unwrap().len(), 1);

    let refreshed = h.state.feed.list_solutions(None, first, &query).await.unwrap();
    assert_eq!(refreshed.pagination.total, 2);
    assert_eq!(refreshed.items[0].uploader, "solver");
}

#[tokio::test]
async fn distinct_page_reads_stay_within_cache_capacity() {
    let h = harness_with_cache_capacity(64);
    let author = h.repos.add_user("author");
    let problem = h.repos.seed_problem(author, "Deep pagination", &["math"]);

    for page in 1..=500 {
        let query = SolutionFeedQuery {
            page: PageRequest::new(Some(page), Some(10)),
            ..Default::default()
        };
        let listed = h.state.feed.list_solutions(None, problem, &query).await.unwrap();
        assert!(listed.items.is_empty());
    }

    assert!(h.cache.len() <= 64, "cache grew to {} keys", h.cache.len());

    // The newest page is still served from the cache.
    let calls = h.repos.solution_list_calls.load(Ordering::SeqCst);
    let last = SolutionFeedQuery {
        page: PageRequest::new(Some(500), Some(10)),
        ..Default::default()
    };
    h.state.feed.list_solutions(None, problem, &last).await.unwrap();
    assert_eq!(h.repos.solution_list_calls.load(Ordering::SeqCst), calls);
}

#[tokio::test]
async fn accepted_solutions_lead_the_solution_feed() {
    let h = harness();
    let author = h.repos.add_user("author");
    let problem = h.repos.seed_problem(author, "Ordering problem", &["math"]);
    let accepted = h.repos.seed_solution(problem, author, true);
    let newest = h.repos.seed_solution(problem, author, false);

    let feed = h
        .state
        .feed
        .list_solutions(None, problem, &SolutionFeedQuery::default())
        .await
        .unwrap();
    let ids: Vec<_> = feed.items.iter().map(|item| item.id).collect();
    assert_eq!(ids, vec![accepted, newest]);
}

#[tokio::test]
async fn submitted_by_me_requires_a_viewer() {
    let h = harness();
    let author = h.repos.add_user("author");
    let problem = h.repos.seed_problem(author, "Mine filter", &["math"]);
    h.repos.seed_solution(problem, author, false);
    h.repos.seed_solution(problem, h.repos.add_user("other"), false);

    let query = SolutionFeedQuery {
        submitted_by_me: true,
        ..Default::default()
    };
    assert!(h.state.feed.list_solutions(None, problem, &query).await.is_err());

    let mine = h
        .state
        .feed
        .list_solutions(Some(author), problem, &query)
        .await
        .unwrap();
    assert_eq!(mine.items.len(), 1);
    assert_eq!(mine.items[0].uploader_id, Some(author));
}

#[tokio::test]
async fn feeds_survive_an_unreachable_cache() {
    let (repos, state) = harness_without_cache();
    let author = repos.add_user("author");
    let solver = repos.add_user("solver");
    let problem = repos.seed_problem(author, "Resilient problem", &["math"]);
    repos.seed_solution(problem, solver, true);

    let feed = state.feed.list_problems(Some(solver), &page(1)).await.unwrap();
    assert_eq!(feed.items.len(), 1);
    assert!(feed.items[0].accepted);

    let id = state
        .problems
        .upload(Actor::member(author), upload("Uploaded while cache is down"))
        .await
        .unwrap();
    assert_eq!(repos.problem_count(), 2);
    assert!(state.problems.detail(id, None).await.is_ok());
}
