//! rerereric library crate — re-exports for integration tests.
//!
//! The primary interface is the `rerereric` binary. This lib.rs exposes the
//! internal modules so that integration tests can exercise the parser, the
//! matcher, and the engine directly without going through the CLI.

pub mod apply;
pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod parse;
pub mod ranker;
pub mod repo;
pub mod similarity;
pub mod snapshot;
pub mod telemetry;
