//! Paginated HTTP client for the storefront catalog endpoints.

use std::time::Duration;

use serde::de::DeserializeOwned;
use stocktake_core::{
  model::{Collection, Product},
  source::CatalogSource,
};

use crate::{
  Error, Result,
  wire::{CollectionsPage, ProductsPage},
};

/// Page size for `/products.json`; the largest the endpoint accepts.
const PRODUCTS_PAGE_LIMIT: u32 = 250;

/// Async client for a single storefront's public catalog endpoints.
///
/// Cheap to clone — the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct CatalogClient {
  client:   reqwest::Client,
  base_url: String,
}

impl CatalogClient {
  /// Build a client for the storefront at `base_url`
  /// (e.g. `https://shop.example.com`).
  pub fn new(base_url: impl Into<String>) -> Result<Self> {
    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(30))
      .build()?;
    Ok(Self {
      client,
      base_url: base_url.into().trim_end_matches('/').to_string(),
    })
  }

  async fn fetch_page<P: DeserializeOwned>(&self, url: &str) -> Result<P> {
    let resp = self.client.get(url).send().await?;
    if !resp.status().is_success() {
      return Err(Error::UnexpectedStatus {
        status: resp.status(),
        url:    url.to_string(),
      });
    }
    Ok(resp.json().await?)
  }
}

impl CatalogSource for CatalogClient {
  type Error = Error;

  async fn fetch_all_products(&self) -> Result<Vec<Product>> {
    let mut all = Vec::new();
    let mut page = 1u32;

    // Page numbers run until the endpoint returns an empty list.
    loop {
      let url = format!(
        "{}/products.json?limit={PRODUCTS_PAGE_LIMIT}&page={page}",
        self.base_url
      );
      tracing::debug!(page, "fetching products page");

      let body: ProductsPage = self.fetch_page(&url).await?;
      if body.products.is_empty() {
        break;
      }
      all.extend(body.products.into_iter().map(|p| p.into_product()));
      page += 1;
    }

    tracing::info!(total = all.len(), "fetched products");
    Ok(all)
  }

  async fn fetch_all_collections(&self) -> Result<Vec<Collection>> {
    let mut all = Vec::new();
    let mut page = 1u32;

    loop {
      let url = format!("{}/collections.json?page={page}", self.base_url);
      tracing::debug!(page, "fetching collections page");

      let body: CollectionsPage = self.fetch_page(&url).await?;
      if body.collections.is_empty() {
        break;
      }
      all.extend(body.collections.into_iter().map(|c| c.into_collection()));
      page += 1;
    }

    tracing::info!(total = all.len(), "fetched collections");
    Ok(all)
  }
}
