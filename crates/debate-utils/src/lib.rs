//! Shared utilities for debate-rs
//!
//! This crate provides common functionality used across the debate-rs workspace,
//! currently the tracing subscriber setup shared by binaries.

pub mod logging;

pub use logging::{LogFormat, init_tracing};
