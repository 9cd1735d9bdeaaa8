//! Wire types for the storefront JSON endpoints and their normalisation
//! into the entity model.
//!
//! `id`, `handle`, and `title` are mandatory here: a record without them
//! is a contract violation and fails deserialisation rather than being
//! papered over with defaults. Everything else defaults to an explicit
//! "no value".

use serde::Deserialize;
use stocktake_core::model::{Collection, Product};

// ─── Products ────────────────────────────────────────────────────────────────

/// One page of `/products.json`.
#[derive(Debug, Deserialize)]
pub struct ProductsPage {
  #[serde(default)]
  pub products: Vec<WireProduct>,
}

#[derive(Debug, Deserialize)]
pub struct WireProduct {
  pub id:           u64,
  pub handle:       String,
  pub title:        String,
  #[serde(default)]
  pub body_html:    Option<String>,
  #[serde(default)]
  pub vendor:       Option<String>,
  #[serde(default)]
  pub product_type: Option<String>,
  #[serde(default)]
  pub tags:         Vec<String>,
  #[serde(default)]
  pub created_at:   Option<String>,
  #[serde(default)]
  pub updated_at:   Option<String>,
  #[serde(default)]
  pub variants:     Vec<WireVariant>,
  #[serde(default)]
  pub images:       Vec<WireImage>,
}

#[derive(Debug, Deserialize)]
pub struct WireVariant {
  #[serde(default)]
  pub price:            Option<String>,
  #[serde(default)]
  pub compare_at_price: Option<String>,
  #[serde(default)]
  pub available:        Option<bool>,
  #[serde(default)]
  pub sku:              Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WireImage {
  #[serde(default)]
  pub src: Option<String>,
}

impl WireProduct {
  /// Normalise into the entity model: price, availability, and SKU come
  /// from the first variant, the image URL from the first image. A
  /// product with no variants has no price and counts as unavailable.
  pub fn into_product(self) -> Product {
    let variant = self.variants.into_iter().next();
    let image = self.images.into_iter().next();

    let (price, compare_at_price, available, sku) = match variant {
      Some(v) => (v.price, v.compare_at_price, v.available.unwrap_or(false), v.sku),
      None => (None, None, false, None),
    };

    Product {
      id: self.id,
      handle: self.handle,
      title: self.title,
      body_html: self.body_html.unwrap_or_default(),
      vendor: self.vendor.unwrap_or_default(),
      product_type: self.product_type.unwrap_or_default(),
      tags: self.tags,
      price,
      compare_at_price,
      available,
      sku,
      image_url: image.and_then(|i| i.src),
      shopify_created_at: self.created_at,
      shopify_updated_at: self.updated_at,
    }
  }
}

// ─── Collections ─────────────────────────────────────────────────────────────

/// One page of `/collections.json`.
#[derive(Debug, Deserialize)]
pub struct CollectionsPage {
  #[serde(default)]
  pub collections: Vec<WireCollection>,
}

#[derive(Debug, Deserialize)]
pub struct WireCollection {
  pub id:             u64,
  pub handle:         String,
  pub title:          String,
  #[serde(default)]
  pub description:    Option<String>,
  #[serde(default)]
  pub products_count: Option<i64>,
  #[serde(default)]
  pub updated_at:     Option<String>,
  #[serde(default)]
  pub image:          Option<WireImage>,
}

impl WireCollection {
  pub fn into_collection(self) -> Collection {
    Collection {
      id: self.id,
      handle: self.handle,
      title: self.title,
      description: self.description.unwrap_or_default(),
      products_count: self.products_count.unwrap_or(0),
      image_url: self.image.and_then(|i| i.src),
      shopify_updated_at: self.updated_at,
    }
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
