// Library root: re-exports all modules so integration tests and the binary
// can reach the pipeline's public API.

pub mod boxscore;
pub mod config;
pub mod export;
pub mod ingest;
pub mod metrics;
pub mod normalize;
pub mod pipeline;
pub mod position;
pub mod profile;
pub mod query;
pub mod scoring;
pub mod tier;
