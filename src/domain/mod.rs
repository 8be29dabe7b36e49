//! Pure aggregation logic: request validation and the merge pipeline.

pub mod merge;
pub mod query;
pub mod types;
