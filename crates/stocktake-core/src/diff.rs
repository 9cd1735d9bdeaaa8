//! Snapshot diff engine: previous snapshot + fresh fetch → change record.
//!
//! Classifies every entity as added, removed, or updated by id, with
//! field-level change descriptions for products and member-count deltas
//! for collections. Pure and synchronous; raises no errors on well-formed
//! input (malformed records are rejected at the wire boundary).

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::model::{Collection, Product, Snapshot};

/// Currency glyph prefixed to prices in rendered change messages.
pub(crate) const CURRENCY: &str = "£";

// ─── Change records ──────────────────────────────────────────────────────────

/// Stable summary projection of a newly observed or vanished product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductSummary {
  pub id:           u64,
  pub title:        String,
  pub handle:       String,
  pub vendor:       String,
  pub product_type: String,
  pub price:        Option<String>,
}

/// A product whose source timestamp moved between snapshots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductUpdate {
  pub id:      u64,
  pub title:   String,
  pub handle:  String,
  /// Human-readable per-field change descriptions, e.g.
  /// `title: 'A' -> 'B'`. Never empty: when no tracked field differs the
  /// single entry `metadata updated` stands in.
  pub changes: Vec<String>,
}

/// What the diff engine found for products, for one run.
///
/// `added` and `removed` are disjoint by construction; `updated` only
/// holds ids present in both snapshots. When `first_run` is set the three
/// lists are empty regardless of what was observed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductChanges {
  pub added:     Vec<ProductSummary>,
  pub removed:   Vec<ProductSummary>,
  pub updated:   Vec<ProductUpdate>,
  pub first_run: bool,
}

/// Stable summary projection of a newly observed or vanished collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionSummary {
  pub id:    u64,
  pub title: String,
}

/// A collection whose reported member count moved between snapshots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductCountChange {
  pub id:        u64,
  pub title:     String,
  pub old_count: i64,
  pub new_count: i64,
  /// Signed delta, `new_count - old_count`.
  pub change:    i64,
}

/// What the diff engine found for collections, for one run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollectionChanges {
  pub added:                 Vec<CollectionSummary>,
  pub removed:               Vec<CollectionSummary>,
  pub product_count_changes: Vec<ProductCountChange>,
  pub first_run:             bool,
}

// ─── Product diff ────────────────────────────────────────────────────────────

/// Diff the previous product snapshot against a fresh fetch.
///
/// With no previous snapshot the result is empty with `first_run` set: the
/// first observation of the universe is not a change. Output order follows
/// input sequence order, but callers must not rely on it; compare by id.
pub fn diff_products(
  old: Option<&Snapshot<Product>>,
  new: &[Product],
) -> ProductChanges {
  let Some(old) = old else {
    return ProductChanges { first_run: true, ..Default::default() };
  };

  let old_by_id = index_by_id(&old.entities, |p: &Product| p.id);
  let new_by_id = index_by_id(new, |p: &Product| p.id);

  let mut changes = ProductChanges::default();

  // Walk the fresh fetch in sequence order, each id once. The map lookup
  // means a duplicated id resolves to its later occurrence.
  let mut seen = HashSet::new();
  for product in new {
    if !seen.insert(product.id) {
      continue;
    }
    let product = new_by_id[&product.id];
    match old_by_id.get(&product.id) {
      None => changes.added.push(product_summary(product)),
      Some(previous) => {
        // The source's updated-at signal gates update detection entirely:
        // an unchanged timestamp means unchanged, whatever the fields say.
        if previous.shopify_updated_at != product.shopify_updated_at {
          changes.updated.push(ProductUpdate {
            id:      product.id,
            title:   product.title.clone(),
            handle:  product.handle.clone(),
            changes: describe_product_changes(previous, product),
          });
        }
      }
    }
  }

  // Removed products no longer exist in the fetch, so the projection is
  // sourced from the old record.
  let mut seen = HashSet::new();
  for product in &old.entities {
    if !seen.insert(product.id) {
      continue;
    }
    if !new_by_id.contains_key(&product.id) {
      changes.removed.push(product_summary(old_by_id[&product.id]));
    }
  }

  changes
}

fn product_summary(product: &Product) -> ProductSummary {
  ProductSummary {
    id:           product.id,
    title:        product.title.clone(),
    handle:       product.handle.clone(),
    vendor:       product.vendor.clone(),
    product_type: product.product_type.clone(),
    price:        product.price.clone(),
  }
}

/// Human-readable change list for a product whose source timestamp moved.
///
/// Only title, first-variant price, and availability are itemised. When
/// the timestamp differs but none of the three do, the source's signal is
/// trusted over our field coverage and a single generic entry is emitted.
fn describe_product_changes(old: &Product, new: &Product) -> Vec<String> {
  let mut changes = Vec::new();

  if old.title != new.title {
    changes.push(format!("title: '{}' -> '{}'", old.title, new.title));
  }
  if old.price != new.price {
    changes.push(format!(
      "price: {} -> {}",
      display_price(&old.price),
      display_price(&new.price),
    ));
  }
  if old.available != new.available {
    changes.push(format!(
      "availability: {} -> {}",
      display_availability(old.available),
      display_availability(new.available),
    ));
  }

  if changes.is_empty() {
    changes.push("metadata updated".to_string());
  }
  changes
}

pub(crate) fn display_price(price: &Option<String>) -> String {
  match price {
    Some(p) => format!("{CURRENCY}{p}"),
    None => "none".to_string(),
  }
}

pub(crate) fn display_availability(available: bool) -> &'static str {
  if available { "in stock" } else { "sold out" }
}

// ─── Collection diff ─────────────────────────────────────────────────────────

/// Diff the previous collection snapshot against a fresh fetch.
///
/// Collections carry no useful updated-at signal, so every common id is
/// checked directly for a `products_count` change.
pub fn diff_collections(
  old: Option<&Snapshot<Collection>>,
  new: &[Collection],
) -> CollectionChanges {
  let Some(old) = old else {
    return CollectionChanges { first_run: true, ..Default::default() };
  };

  let old_by_id = index_by_id(&old.entities, |c: &Collection| c.id);
  let new_by_id = index_by_id(new, |c: &Collection| c.id);

  let mut changes = CollectionChanges::default();

  let mut seen = HashSet::new();
  for collection in new {
    if !seen.insert(collection.id) {
      continue;
    }
    let collection = new_by_id[&collection.id];
    match old_by_id.get(&collection.id) {
      None => changes.added.push(CollectionSummary {
        id:    collection.id,
        title: collection.title.clone(),
      }),
      Some(previous) => {
        if previous.products_count != collection.products_count {
          changes.product_count_changes.push(ProductCountChange {
            id:        collection.id,
            title:     collection.title.clone(),
            old_count: previous.products_count,
            new_count: collection.products_count,
            change:    collection.products_count - previous.products_count,
          });
        }
      }
    }
  }

  let mut seen = HashSet::new();
  for collection in &old.entities {
    if !seen.insert(collection.id) {
      continue;
    }
    if !new_by_id.contains_key(&collection.id) {
      let collection = old_by_id[&collection.id];
      changes.removed.push(CollectionSummary {
        id:    collection.id,
        title: collection.title.clone(),
      });
    }
  }

  changes
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Index a sequence by id. A duplicated id within one snapshot is not
/// expected; if present, the later occurrence silently overwrites the
/// earlier one.
fn index_by_id<E>(entities: &[E], id: impl Fn(&E) -> u64) -> HashMap<u64, &E> {
  let mut map = HashMap::with_capacity(entities.len());
  for entity in entities {
    map.insert(id(entity), entity);
  }
  map
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use chrono::{TimeZone, Utc};

  use super::*;

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
      shopify_created_at: Some("2024-01-01T00:00:00Z".to_string()),
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

  fn snapshot<E>(entities: Vec<E>) -> Snapshot<E> {
    Snapshot::new(Utc.timestamp_opt(1_000_000, 0).unwrap(), entities)
  }

  fn added_ids(changes: &ProductChanges) -> HashSet<u64> {
    changes.added.iter().map(|p| p.id).collect()
  }

  fn removed_ids(changes: &ProductChanges) -> HashSet<u64> {
    changes.removed.iter().map(|p| p.id).collect()
  }

  // ── First run ─────────────────────────────────────────────────────────────

  #[test]
  fn absent_snapshot_is_first_run_with_empty_buckets() {
    let new = vec![product(1, "A", "t1"), product(2, "B", "t1")];
    let changes = diff_products(None, &new);

    assert!(changes.first_run);
    assert!(changes.added.is_empty());
    assert!(changes.removed.is_empty());
    assert!(changes.updated.is_empty());
  }

  #[test]
  fn absent_collection_snapshot_is_first_run() {
    let new = vec![collection(1, "Summer", 10)];
    let changes = diff_collections(None, &new);

    assert!(changes.first_run);
    assert!(changes.added.is_empty());
    assert!(changes.removed.is_empty());
    assert!(changes.product_count_changes.is_empty());
  }

  // ── Partition ─────────────────────────────────────────────────────────────

  #[test]
  fn added_and_removed_partition_the_id_difference() {
    let old = snapshot(vec![product(1, "A", "t1"), product(2, "B", "t1")]);
    let new = vec![product(2, "B", "t1"), product(3, "C", "t1")];

    let changes = diff_products(Some(&old), &new);

    assert_eq!(added_ids(&changes), HashSet::from([3]));
    assert_eq!(removed_ids(&changes), HashSet::from([1]));
    assert!(changes.updated.is_empty());
    assert!(!changes.first_run);
    assert!(added_ids(&changes).is_disjoint(&removed_ids(&changes)));
  }

  #[test]
  fn removed_projection_comes_from_the_old_record() {
    let old = snapshot(vec![product(1, "Discontinued", "t1")]);
    let changes = diff_products(Some(&old), &[]);

    assert_eq!(changes.removed.len(), 1);
    assert_eq!(changes.removed[0].id, 1);
    assert_eq!(changes.removed[0].title, "Discontinued");
    assert_eq!(changes.removed[0].vendor, "Acme");
  }

  // ── Update gating ─────────────────────────────────────────────────────────

  #[test]
  fn unchanged_timestamp_suppresses_update_even_when_fields_differ() {
    let old = snapshot(vec![product(1, "A", "t1")]);
    let mut changed = product(1, "Renamed", "t1");
    changed.price = Some("99.00".to_string());

    let changes = diff_products(Some(&old), &[changed]);
    assert!(changes.updated.is_empty());
  }

  #[test]
  fn timestamp_absent_on_one_side_counts_as_changed() {
    let old = snapshot(vec![product(1, "A", "t1")]);
    let mut new = product(1, "A", "t1");
    new.shopify_updated_at = None;

    let changes = diff_products(Some(&old), &[new]);
    assert_eq!(changes.updated.len(), 1);
  }

  #[test]
  fn title_change_is_described() {
    let old = snapshot(vec![product(1, "A", "t1")]);
    let new = vec![product(1, "B", "t2")];

    let changes = diff_products(Some(&old), &new);
    assert_eq!(changes.updated.len(), 1);
    assert_eq!(changes.updated[0].id, 1);
    assert_eq!(changes.updated[0].title, "B");
    assert_eq!(changes.updated[0].changes, vec!["title: 'A' -> 'B'"]);
  }

  #[test]
  fn price_change_is_described_with_currency_glyph() {
    let old = snapshot(vec![product(1, "A", "t1")]);
    let mut new = product(1, "A", "t2");
    new.price = Some("5.00".to_string());

    let changes = diff_products(Some(&old), &[new]);
    assert_eq!(
      changes.updated[0].changes,
      vec!["price: £4.00 -> £5.00"]
    );
  }

  #[test]
  fn availability_change_is_described() {
    let old = snapshot(vec![product(1, "A", "t1")]);
    let mut new = product(1, "A", "t2");
    new.available = false;

    let changes = diff_products(Some(&old), &[new]);
    assert_eq!(
      changes.updated[0].changes,
      vec!["availability: in stock -> sold out"]
    );
  }

  #[test]
  fn untracked_field_change_falls_back_to_metadata_updated() {
    let old = snapshot(vec![product(1, "A", "t1")]);
    let mut new = product(1, "A", "t2");
    new.body_html = "<p>rewritten copy</p>".to_string();

    let changes = diff_products(Some(&old), &[new]);
    assert_eq!(changes.updated.len(), 1);
    assert_eq!(changes.updated[0].changes, vec!["metadata updated"]);
  }

  #[test]
  fn multiple_field_changes_are_all_described() {
    let old = snapshot(vec![product(1, "A", "t1")]);
    let mut new = product(1, "B", "t2");
    new.price = None;
    new.available = false;

    let changes = diff_products(Some(&old), &[new]);
    let described = &changes.updated[0].changes;
    assert_eq!(described.len(), 3);
    assert_eq!(described[0], "title: 'A' -> 'B'");
    assert_eq!(described[1], "price: £4.00 -> none");
    assert_eq!(described[2], "availability: in stock -> sold out");
  }

  // ── Duplicate ids ─────────────────────────────────────────────────────────

  #[test]
  fn duplicate_id_in_fetch_resolves_to_later_occurrence() {
    let old = snapshot(vec![product(1, "A", "t1")]);
    let new = vec![product(1, "Earlier", "t2"), product(1, "Later", "t2")];

    let changes = diff_products(Some(&old), &new);
    assert_eq!(changes.updated.len(), 1);
    assert_eq!(changes.updated[0].title, "Later");
  }

  // ── Collections ───────────────────────────────────────────────────────────

  #[test]
  fn collection_count_change_carries_signed_delta() {
    let old = snapshot(vec![collection(1, "Summer", 10)]);
    let new = vec![collection(1, "Summer", 7)];

    let changes = diff_collections(Some(&old), &new);
    assert_eq!(changes.product_count_changes.len(), 1);
    let change = &changes.product_count_changes[0];
    assert_eq!(change.old_count, 10);
    assert_eq!(change.new_count, 7);
    assert_eq!(change.change, -3);
  }

  #[test]
  fn collection_with_same_count_is_not_reported() {
    let old = snapshot(vec![collection(1, "Summer", 10)]);
    let new = vec![collection(1, "Renamed", 10)];

    let changes = diff_collections(Some(&old), &new);
    assert!(changes.product_count_changes.is_empty());
    assert!(changes.added.is_empty());
    assert!(changes.removed.is_empty());
  }

  #[test]
  fn collection_partition_by_id() {
    let old = snapshot(vec![
      collection(1, "Summer", 10),
      collection(2, "Winter", 5),
    ]);
    let new = vec![collection(2, "Winter", 5), collection(3, "Spring", 2)];

    let changes = diff_collections(Some(&old), &new);
    let added: HashSet<u64> = changes.added.iter().map(|c| c.id).collect();
    let removed: HashSet<u64> = changes.removed.iter().map(|c| c.id).collect();
    assert_eq!(added, HashSet::from([3]));
    assert_eq!(removed, HashSet::from([1]));
  }
}
