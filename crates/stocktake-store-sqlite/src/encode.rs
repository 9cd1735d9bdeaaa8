//! Encoding and decoding helpers between the domain types and the
//! plain-text representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings, UUIDs as hyphenated
//! lowercase strings, tags and ledger detail as compact JSON. Entity ids
//! are source-assigned unsigned integers stored in SQLite's signed
//! INTEGER columns.

use chrono::{DateTime, Utc};
use stocktake_core::{
  ledger::{CollectionLedger, LedgerEntry, ProductLedger, RunTotals},
  model::{Collection, Product},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_tags(tags: &[String]) -> Result<String> {
  Ok(serde_json::to_string(tags)?)
}

pub fn decode_tags(s: &str) -> Result<Vec<String>> {
  Ok(serde_json::from_str(s)?)
}

// ─── Product rows ────────────────────────────────────────────────────────────

/// Column values for one `products` row, in both directions.
pub struct ProductRow {
  pub id:                 i64,
  pub handle:             String,
  pub title:              String,
  pub body_html:          String,
  pub vendor:             String,
  pub product_type:       String,
  pub tags:               String,
  pub price:              Option<String>,
  pub compare_at_price:   Option<String>,
  pub available:          bool,
  pub sku:                Option<String>,
  pub image_url:          Option<String>,
  pub shopify_created_at: Option<String>,
  pub shopify_updated_at: Option<String>,
}

impl ProductRow {
  pub fn from_product(product: &Product) -> Result<Self> {
    Ok(Self {
      id:                 product.id as i64,
      handle:             product.handle.clone(),
      title:              product.title.clone(),
      body_html:          product.body_html.clone(),
      vendor:             product.vendor.clone(),
      product_type:       product.product_type.clone(),
      tags:               encode_tags(&product.tags)?,
      price:              product.price.clone(),
      compare_at_price:   product.compare_at_price.clone(),
      available:          product.available,
      sku:                product.sku.clone(),
      image_url:          product.image_url.clone(),
      shopify_created_at: product.shopify_created_at.clone(),
      shopify_updated_at: product.shopify_updated_at.clone(),
    })
  }

  pub fn into_product(self) -> Result<Product> {
    Ok(Product {
      id:                 self.id as u64,
      handle:             self.handle,
      title:              self.title,
      body_html:          self.body_html,
      vendor:             self.vendor,
      product_type:       self.product_type,
      tags:               decode_tags(&self.tags)?,
      price:              self.price,
      compare_at_price:   self.compare_at_price,
      available:          self.available,
      sku:                self.sku,
      image_url:          self.image_url,
      shopify_created_at: self.shopify_created_at,
      shopify_updated_at: self.shopify_updated_at,
    })
  }
}

// ─── Collection rows ─────────────────────────────────────────────────────────

/// Column values for one `collections` row, in both directions.
pub struct CollectionRow {
  pub id:                 i64,
  pub handle:             String,
  pub title:              String,
  pub description:        String,
  pub products_count:     i64,
  pub image_url:          Option<String>,
  pub shopify_updated_at: Option<String>,
}

impl CollectionRow {
  pub fn from_collection(collection: &Collection) -> Self {
    Self {
      id:                 collection.id as i64,
      handle:             collection.handle.clone(),
      title:              collection.title.clone(),
      description:        collection.description.clone(),
      products_count:     collection.products_count,
      image_url:          collection.image_url.clone(),
      shopify_updated_at: collection.shopify_updated_at.clone(),
    }
  }

  pub fn into_collection(self) -> Collection {
    Collection {
      id:                 self.id as u64,
      handle:             self.handle,
      title:              self.title,
      description:        self.description,
      products_count:     self.products_count,
      image_url:          self.image_url,
      shopify_updated_at: self.shopify_updated_at,
    }
  }
}

// ─── Ledger rows ─────────────────────────────────────────────────────────────

/// Raw strings read from (or bound into) a `run_log` row.
pub struct RunLogRow {
  pub run_id:            String,
  pub recorded_at:       String,
  pub products_total:    i64,
  pub collections_total: i64,
  pub products_json:     String,
  pub collections_json:  String,
  pub note:              Option<String>,
}

impl RunLogRow {
  pub fn from_entry(entry: &LedgerEntry) -> Result<Self> {
    Ok(Self {
      run_id:            encode_uuid(entry.run_id),
      recorded_at:       encode_dt(entry.recorded_at),
      products_total:    entry.totals.products as i64,
      collections_total: entry.totals.collections as i64,
      products_json:     serde_json::to_string(&entry.products)?,
      collections_json:  serde_json::to_string(&entry.collections)?,
      note:              entry.note.clone(),
    })
  }

  pub fn into_entry(self) -> Result<LedgerEntry> {
    let products: ProductLedger = serde_json::from_str(&self.products_json)?;
    let collections: CollectionLedger =
      serde_json::from_str(&self.collections_json)?;

    Ok(LedgerEntry {
      run_id: decode_uuid(&self.run_id)?,
      recorded_at: decode_dt(&self.recorded_at)?,
      totals: RunTotals {
        products:    self.products_total as usize,
        collections: self.collections_total as usize,
      },
      products,
      collections,
      note: self.note,
    })
  }
}
