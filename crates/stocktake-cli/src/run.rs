//! Run orchestration: fetch, diff, persist, report.

use anyhow::{Context as _, Result};
use chrono::{DateTime, Utc};
use stocktake_core::{
  diff::{CollectionChanges, ProductChanges, diff_collections, diff_products},
  ledger::{LedgerEntry, RunTotals},
  model::Snapshot,
  report,
  source::CatalogSource,
  store::CatalogStore,
};

/// Everything a completed run produced.
#[derive(Debug)]
pub struct RunOutcome {
  pub report:             String,
  pub product_changes:    ProductChanges,
  pub collection_changes: CollectionChanges,
  pub product_total:      usize,
  pub collection_total:   usize,
  /// The history ledger entry this run appended, if it detected change.
  pub ledger_entry:       Option<LedgerEntry>,
}

/// Execute one reconciliation run against `source` and `store`.
///
/// Both fetches complete before anything is persisted, so a fetch failure
/// can never leave a partial snapshot behind. Snapshots are written before
/// the ledger entry: if the ledger append then fails, the advanced
/// snapshot remains the source of truth and the next run diffs against
/// it (the missed entry is not reconstructed).
pub async fn execute<S, C>(
  source: &S,
  store: &C,
  now: DateTime<Utc>,
) -> Result<RunOutcome>
where
  S: CatalogSource,
  C: CatalogStore,
{
  let products = source
    .fetch_all_products()
    .await
    .context("fetching products")?;
  let collections = source
    .fetch_all_collections()
    .await
    .context("fetching collections")?;

  let previous_products = store
    .load_product_snapshot()
    .await
    .context("loading previous product snapshot")?;
  let previous_collections = store
    .load_collection_snapshot()
    .await
    .context("loading previous collection snapshot")?;

  let product_changes = diff_products(previous_products.as_ref(), &products);
  let collection_changes =
    diff_collections(previous_collections.as_ref(), &collections);

  let product_snapshot = Snapshot::new(now, products);
  let collection_snapshot = Snapshot::new(now, collections);
  store
    .save_product_snapshot(&product_snapshot)
    .await
    .context("saving product snapshot")?;
  store
    .save_collection_snapshot(&collection_snapshot)
    .await
    .context("saving collection snapshot")?;

  let totals = RunTotals {
    products:    product_snapshot.count,
    collections: collection_snapshot.count,
  };

  let mut ledger = store.load_ledger().await.context("loading ledger")?;
  let entry = ledger
    .append_if_changed(&product_changes, &collection_changes, totals, now)
    .cloned();

  if let Some(entry) = &entry {
    store
      .append_ledger(entry)
      .await
      .context("appending ledger entry")?;
    tracing::info!(
      run_id = %entry.run_id,
      products_added = entry.products.added_count,
      products_removed = entry.products.removed_count,
      products_updated = entry.products.updated_count,
      "recorded history ledger entry"
    );
  } else {
    tracing::info!("no catalog changes detected");
  }

  let report = report::render(
    &product_changes,
    &collection_changes,
    totals.products,
    totals.collections,
    now,
  );

  Ok(RunOutcome {
    report,
    product_changes,
    collection_changes,
    product_total: totals.products,
    collection_total: totals.collections,
    ledger_entry: entry,
  })
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use chrono::TimeZone;
  use stocktake_core::model::{Collection, Product};
  use stocktake_store_sqlite::SqliteStore;

  use super::*;

  /// In-memory catalog source returning fixed data.
  struct StubSource {
    products:    Vec<Product>,
    collections: Vec<Collection>,
  }

  impl CatalogSource for StubSource {
    type Error = std::convert::Infallible;

    async fn fetch_all_products(&self) -> Result<Vec<Product>, Self::Error> {
      Ok(self.products.clone())
    }

    async fn fetch_all_collections(
      &self,
    ) -> Result<Vec<Collection>, Self::Error> {
      Ok(self.collections.clone())
    }
  }

  fn product(id: u64, title: &str, updated_at: &str) -> Product {
    Product {
      id,
      handle:             format!("handle-{id}"),
      title:              title.to_string(),
      body_html:          String::new(),
      vendor:             "Acme".to_string(),
      product_type:       "Widget".to_string(),
      tags:               vec![],
      price:              Some("4.00".to_string()),
      compare_at_price:   None,
      available:          true,
      sku:                None,
      image_url:          None,
      shopify_created_at: None,
      shopify_updated_at: Some(updated_at.to_string()),
    }
  }

  fn collection(id: u64, title: &str, products_count: i64) -> Collection {
    Collection {
      id,
      handle:             format!("handle-{id}"),
      title:              title.to_string(),
      description:        String::new(),
      products_count,
      image_url:          None,
      shopify_updated_at: None,
    }
  }

  fn run_time(n: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + n * 86_400, 0).unwrap()
  }

  #[tokio::test]
  async fn first_run_captures_baseline_and_logs_initial_entry() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let source = StubSource {
      products:    vec![product(1, "Widget", "t1"), product(2, "Gadget", "t1")],
      collections: vec![collection(9, "Summer", 2)],
    };

    let outcome = execute(&source, &store, run_time(0)).await.unwrap();

    assert!(outcome.product_changes.first_run);
    assert!(outcome.collection_changes.first_run);
    assert_eq!(outcome.product_total, 2);
    assert_eq!(outcome.collection_total, 1);
    assert!(outcome.report.contains("Initial capture"));

    let entry = outcome.ledger_entry.expect("first run must be recorded");
    assert_eq!(entry.note.as_deref(), Some("Initial data fetch"));

    // Snapshot persisted: the next load sees it.
    let snapshot = store.load_product_snapshot().await.unwrap().unwrap();
    assert_eq!(snapshot.count, 2);
    assert_eq!(store.load_ledger().await.unwrap().entries.len(), 1);
  }

  #[tokio::test]
  async fn unchanged_run_appends_no_ledger_entry() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let source = StubSource {
      products:    vec![product(1, "Widget", "t1")],
      collections: vec![collection(9, "Summer", 1)],
    };

    execute(&source, &store, run_time(0)).await.unwrap();
    let outcome = execute(&source, &store, run_time(1)).await.unwrap();

    assert!(!outcome.product_changes.first_run);
    assert!(outcome.product_changes.added.is_empty());
    assert!(outcome.product_changes.removed.is_empty());
    assert!(outcome.product_changes.updated.is_empty());
    assert!(outcome.ledger_entry.is_none());

    // Idempotent: the ledger still holds only the initial entry.
    assert_eq!(store.load_ledger().await.unwrap().entries.len(), 1);
  }

  #[tokio::test]
  async fn changed_run_classifies_and_records() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let first = StubSource {
      products:    vec![product(1, "Widget", "t1"), product(2, "Gadget", "t1")],
      collections: vec![collection(9, "Summer", 2)],
    };
    execute(&first, &store, run_time(0)).await.unwrap();

    // Product 2 vanishes, product 3 appears, product 1 is renamed, and
    // the collection loses a member.
    let second = StubSource {
      products:    vec![
        product(1, "Widget Mk2", "t2"),
        product(3, "Doohickey", "t1"),
      ],
      collections: vec![collection(9, "Summer", 1)],
    };
    let outcome = execute(&second, &store, run_time(1)).await.unwrap();

    assert_eq!(outcome.product_changes.added.len(), 1);
    assert_eq!(outcome.product_changes.added[0].id, 3);
    assert_eq!(outcome.product_changes.removed.len(), 1);
    assert_eq!(outcome.product_changes.removed[0].id, 2);
    assert_eq!(outcome.product_changes.updated.len(), 1);
    assert_eq!(
      outcome.product_changes.updated[0].changes,
      vec!["title: 'Widget' -> 'Widget Mk2'"]
    );
    assert_eq!(outcome.collection_changes.product_count_changes.len(), 1);
    assert_eq!(
      outcome.collection_changes.product_count_changes[0].change,
      -1
    );

    let ledger = store.load_ledger().await.unwrap();
    assert_eq!(ledger.entries.len(), 2);
    let entry = ledger.entries.last().unwrap();
    assert_eq!(entry.products.added_count, 1);
    assert_eq!(entry.products.removed_count, 1);
    assert_eq!(entry.products.updated_count, 1);
    assert!(entry.note.is_none());

    // The update and the removal both left provenance rows.
    assert_eq!(store.product_history(1).await.unwrap().len(), 1);
    assert_eq!(
      store.product_history(2).await.unwrap()[0].change,
      "marked inactive"
    );

    // The report itemises what happened.
    assert!(outcome.report.contains("- Doohickey"));
    assert!(outcome.report.contains("title: 'Widget' -> 'Widget Mk2'"));
    assert!(outcome.report.contains("- Summer: 2 -> 1 (-1)"));
  }

  #[tokio::test]
  async fn removed_then_returning_product_shows_as_added_again() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let with_product = StubSource {
      products:    vec![product(1, "Widget", "t1")],
      collections: vec![],
    };
    let without_product =
      StubSource { products: vec![], collections: vec![] };

    execute(&with_product, &store, run_time(0)).await.unwrap();
    let gone = execute(&without_product, &store, run_time(1)).await.unwrap();
    assert_eq!(gone.product_changes.removed.len(), 1);

    let back = execute(&with_product, &store, run_time(2)).await.unwrap();
    assert_eq!(back.product_changes.added.len(), 1);
    assert_eq!(back.product_changes.added[0].id, 1);
    assert!(back.product_changes.removed.is_empty());
  }
}
