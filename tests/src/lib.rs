//! # Message Gate Test Suite
//!
//! Workspace-level suites that need a multi-threaded runtime or large
//! workloads. Per-module unit tests live beside the code in `message-gate`.
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── src/integration/
//! │   ├── concurrency.rs    # Parallel callers against one gate
//! │   └── resource_bounds.rs# Limiter and audit log memory bounds
//! └── benches/
//!     └── gate_benchmarks.rs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p gate-tests
//! cargo test -p gate-tests integration::concurrency
//!
//! # Benchmarks
//! cargo bench -p gate-tests
//! ```

#![allow(dead_code)]

#[cfg(test)]
mod integration;
