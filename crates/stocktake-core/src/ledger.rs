//! History ledger — at most one append-only entry per run.
//!
//! The ledger records *events*, not heartbeats: a run that detected no
//! change leaves it untouched, so re-running against an unchanged catalog
//! never grows the history. Prior entries are never rewritten.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::diff::{
  CollectionChanges, ProductChanges, ProductCountChange, ProductSummary,
  ProductUpdate,
};

// ─── Entry shape ─────────────────────────────────────────────────────────────

/// Entity totals observed in the run that produced an entry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RunTotals {
  pub products:    usize,
  pub collections: usize,
}

/// The product side of a ledger entry: counts plus the full itemised
/// lists. Nothing here is ever truncated; caps are a reporter concern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductLedger {
  pub added_count:   usize,
  pub removed_count: usize,
  pub updated_count: usize,
  pub added:         Vec<ProductSummary>,
  pub removed:       Vec<ProductSummary>,
  pub updated:       Vec<ProductUpdate>,
}

/// The collection side of a ledger entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionLedger {
  pub added_count:           usize,
  pub removed_count:         usize,
  pub product_count_changes: Vec<ProductCountChange>,
}

/// One run's record in the history ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
  pub run_id:      Uuid,
  pub recorded_at: DateTime<Utc>,
  pub totals:      RunTotals,
  pub products:    ProductLedger,
  pub collections: CollectionLedger,
  /// Set to `"Initial data fetch"` on a product first run, absent
  /// otherwise. A collection-only first run does not set it.
  pub note:        Option<String>,
}

// ─── Ledger ──────────────────────────────────────────────────────────────────

/// The full run-over-run history, oldest entry first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ledger {
  pub entries: Vec<LedgerEntry>,
}

impl Ledger {
  /// Append an entry for this run iff it detected any change.
  ///
  /// Returns the appended entry, or `None` when the run was a no-op. The
  /// decision is a pure function of the two change records, so calling
  /// this twice with identical no-change inputs never grows the ledger.
  pub fn append_if_changed(
    &mut self,
    products: &ProductChanges,
    collections: &CollectionChanges,
    totals: RunTotals,
    now: DateTime<Utc>,
  ) -> Option<&LedgerEntry> {
    if !has_changes(products, collections) {
      return None;
    }

    let note =
      products.first_run.then(|| "Initial data fetch".to_string());

    self.entries.push(LedgerEntry {
      run_id: Uuid::new_v4(),
      recorded_at: now,
      totals,
      products: ProductLedger {
        added_count:   products.added.len(),
        removed_count: products.removed.len(),
        updated_count: products.updated.len(),
        added:         products.added.clone(),
        removed:       products.removed.clone(),
        updated:       products.updated.clone(),
      },
      collections: CollectionLedger {
        added_count:           collections.added.len(),
        removed_count:         collections.removed.len(),
        product_count_changes: collections.product_count_changes.clone(),
      },
      note,
    });
    self.entries.last()
  }
}

/// A run is worth recording when either kind saw its first run or any of
/// the six change buckets is non-empty.
fn has_changes(
  products: &ProductChanges,
  collections: &CollectionChanges,
) -> bool {
  products.first_run
    || collections.first_run
    || !products.added.is_empty()
    || !products.removed.is_empty()
    || !products.updated.is_empty()
    || !collections.added.is_empty()
    || !collections.removed.is_empty()
    || !collections.product_count_changes.is_empty()
}

// ─── Tests ───────────────────────────────────────────────────────────────────
