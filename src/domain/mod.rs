//! Domain layer types and invariants.

pub mod entities;
pub mod error;
pub mod similarity;
pub mod status_map;
pub mod submissions;
pub mod types;
