//! DEALSCAN: structured-output deal selection.
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod types;
pub mod sources;
pub mod llm;
pub mod engine;
