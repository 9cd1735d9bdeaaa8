//! Core types and the reconciliation engine for the Stocktake catalog
//! tracker.
//!
//! This crate is deliberately free of HTTP and database dependencies. The
//! diff engine, history ledger, and summary reporter are pure transforms
//! over in-memory snapshots; I/O happens behind the [`source::CatalogSource`]
//! and [`store::CatalogStore`] seams implemented by the sibling crates.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod diff;
pub mod ledger;
pub mod model;
pub mod report;
pub mod source;
pub mod store;
