//! Document scoring rule engine.
//!
//! Scoring profiles hold weighted criteria, criteria combine typed filters with ALL/SOME
//! semantics, and the profile store keeps the whole set persisted behind a key-value
//! collaborator. The `scoring` module carries the engine; `config`, `telemetry` and `error`
//! carry the service plumbing shared with the API binary.

pub mod config;
pub mod error;
pub mod scoring;
pub mod telemetry;
