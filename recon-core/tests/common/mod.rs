//! Test infrastructure for the Recon parser and writer
//!
//! Provides fixture loading, stochastic chunking, and value generators.

#![allow(dead_code)]

mod generators;
mod harness;
mod loader;

pub use generators::Gen;
pub use harness::{run_chunked, run_test, TestResult};
pub use loader::{load_fixtures_by_name, TestCase};
