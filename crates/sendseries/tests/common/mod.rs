//! Shared test utilities for sendseries integration tests.
//!
//! This module provides:
//! - `TestRepo`, a throwaway git repository with helper scripts
//! - constructors for controllers backed by an in-memory database

pub mod harness;

pub use harness::*;
