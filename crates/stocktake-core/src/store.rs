//! The `CatalogStore` trait — persistence seam for snapshots and history.
//!
//! The trait is implemented by storage backends (e.g.
//! `stocktake-store-sqlite`). The orchestrator depends on this
//! abstraction, not on any concrete backend.

use std::future::Future;

use crate::{
  ledger::{Ledger, LedgerEntry},
  model::{Collection, Product, Snapshot},
};

/// Abstraction over a Stocktake persistence backend.
///
/// The store exclusively owns the "current" snapshot of each kind: a run
/// reads it once at the start and replaces it wholesale at the end, and a
/// failed save must leave the previous snapshot as the source of truth.
/// Ledger writes are strictly append-only; prior entries are never
/// rewritten.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes.
pub trait CatalogStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Snapshots ─────────────────────────────────────────────────────────

  /// The previously persisted product snapshot, or `None` on a first run.
  fn load_product_snapshot(
    &self,
  ) -> impl Future<Output = Result<Option<Snapshot<Product>>, Self::Error>>
  + Send
  + '_;

  /// The previously persisted collection snapshot, or `None` on a first
  /// run.
  fn load_collection_snapshot(
    &self,
  ) -> impl Future<Output = Result<Option<Snapshot<Collection>>, Self::Error>>
  + Send
  + '_;

  /// Replace the current product snapshot wholesale.
  fn save_product_snapshot<'a>(
    &'a self,
    snapshot: &'a Snapshot<Product>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Replace the current collection snapshot wholesale.
  fn save_collection_snapshot<'a>(
    &'a self,
    snapshot: &'a Snapshot<Collection>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  // ── History ledger ────────────────────────────────────────────────────

  /// Append one run's entry to the history ledger.
  fn append_ledger<'a>(
    &'a self,
    entry: &'a LedgerEntry,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// The full history ledger, oldest entry first. Empty by default.
  fn load_ledger(
    &self,
  ) -> impl Future<Output = Result<Ledger, Self::Error>> + Send + '_;
}
