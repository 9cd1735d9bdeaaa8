//! Entity model — the canonical shape of a product and a collection, and
//! the subset of fields tracked for change detection.
//!
//! Absence (a missing first variant, a missing image) is an explicit
//! `Option`, never an empty-string default, so data-quality gaps in the
//! source stay visible run over run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ─── Product ─────────────────────────────────────────────────────────────────

/// A storefront product as observed in one fetch.
///
/// `id` is assigned by the catalog source and is the sole identity key
/// across runs. Price, availability, and SKU are taken from the product's
/// first variant; a product with no variants has no price and counts as
/// unavailable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
  pub id:                 u64,
  pub handle:             String,
  pub title:              String,
  pub body_html:          String,
  pub vendor:             String,
  pub product_type:       String,
  pub tags:               Vec<String>,
  /// Decimal-as-string monetary value, e.g. `"12.00"`. Compared exactly,
  /// never parsed.
  pub price:              Option<String>,
  pub compare_at_price:   Option<String>,
  pub available:          bool,
  pub sku:                Option<String>,
  pub image_url:          Option<String>,
  /// Source-provided timestamps. Opaque strings: compared for equality
  /// only, never parsed or ordered.
  pub shopify_created_at: Option<String>,
  pub shopify_updated_at: Option<String>,
}

// ─── Collection ──────────────────────────────────────────────────────────────

/// A storefront collection as observed in one fetch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collection {
  pub id:                 u64,
  pub handle:             String,
  pub title:              String,
  pub description:        String,
  /// Member-product count as reported by the source at fetch time. Trusted
  /// as-is; never cross-checked against the fetched product set.
  pub products_count:     i64,
  pub image_url:          Option<String>,
  pub shopify_updated_at: Option<String>,
}

// ─── Snapshot ────────────────────────────────────────────────────────────────

/// The complete set of one entity kind as observed at one point in time.
///
/// Two snapshots exist within a run: the previously persisted one (absent
/// on the first run) and the freshly fetched one, which replaces it
/// wholesale once the run's diff has been taken.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot<E> {
  pub fetched_at: DateTime<Utc>,
  pub count:      usize,
  pub entities:   Vec<E>,
}

impl<E> Snapshot<E> {
  pub fn new(fetched_at: DateTime<Utc>, entities: Vec<E>) -> Self {
    Self { fetched_at, count: entities.len(), entities }
  }
}
