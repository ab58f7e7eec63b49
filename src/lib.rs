//! Feed caching and social-interaction consistency for a coding-practice platform.
//!
//! Persistent records live in Postgres; a volatile cache holds per-user
//! status maps and paginated feed pages. Writes go to the store first and
//! then invalidate the affected cache entries.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
