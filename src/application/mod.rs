//! Application services orchestrating domain logic, persistence and cache.

pub mod error;
pub mod feed;
pub mod interactions;
pub mod merge;
pub mod pagination;
pub mod problems;
pub mod replies;
pub mod repos;
pub mod solutions;
pub mod stats;
