pub mod error;
pub mod handlers;
pub mod identity;
pub mod middleware;
pub mod models;
pub mod rate_limit;
pub mod state;

pub use state::ApiState;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, patch},
};

use crate::infra::http::middleware::log_responses;

pub fn build_api_router(state: ApiState) -> Router {
    let rate_state = state.clone();

    Router::new()
        .route(
            "/api/v1/problems",
            get(handlers::list_problems).post(handlers::upload_problem),
        )
        .route("/api/v1/problems/topics", get(handlers::list_topics))
        .route("/api/v1/problems/mine", get(handlers::list_my_problems))
        .route(
            "/api/v1/problems/{id}",
            get(handlers::get_problem).delete(handlers::delete_problem),
        )
        .route(
            "/api/v1/problems/{id}/report",
            patch(handlers::toggle_problem_report),
        )
        .route(
            "/api/v1/problems/{id}/solutions",
            get(handlers::list_solutions).post(handlers::submit_solution),
        )
        .route(
            "/api/v1/solutions/{id}",
            get(handlers::get_solution).delete(handlers::delete_solution),
        )
        .route("/api/v1/solutions/{id}/accept", patch(handlers::toggle_accept))
        .route("/api/v1/solutions/{id}/like", patch(handlers::toggle_like))
        .route("/api/v1/solutions/{id}/report", patch(handlers::toggle_report))
        .route(
            "/api/v1/solutions/{id}/replies",
            get(handlers::list_replies).post(handlers::submit_reply),
        )
        .route("/api/v1/users/me/solved", get(handlers::list_solved))
        .route("/api/v1/stats", get(handlers::dashboard))
        .route("/health", get(handlers::health))
        .with_state(state)
        .layer(axum_middleware::from_fn_with_state(
            rate_state,
            middleware::write_rate_limit,
        ))
        .layer(axum_middleware::from_fn(log_responses))
}
