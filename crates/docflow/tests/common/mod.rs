//! Shared test utilities for docflow integration tests.
//!
//! This module provides:
//! - `TestHarness` for isolated runs with temp directories and an in-memory store
//! - Scripted capability fakes and a scripted decision oracle
//! - Builders for seeding documents in a given state

pub mod builders;
pub mod harness;

pub use builders::*;
pub use harness::*;
