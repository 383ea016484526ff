//! Test utilities for holdfast development.
//!
//! Provides drop-tracking fixtures ([`DropLog`], [`Tracked`]) for
//! asserting that resources are dropped exactly once, and
//! [`init_logging`] for seeing control block transitions in test output.
//!
//! Enabling this crate turns on the `diagnostics` feature of
//! `holdfast-core`, so tests can also check
//! [`live_blocks`](holdfast_core::diagnostics::live_blocks).

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

pub use fixtures::{DropLog, Tracked};
pub use holdfast_core::diagnostics::live_blocks;

/// Install an `env_logger` for tests. Safe to call from every test.
///
/// Set `RUST_LOG=holdfast=trace` to see block allocation, resource
/// release and block free records.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
