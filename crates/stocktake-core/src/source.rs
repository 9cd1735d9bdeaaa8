//! The `CatalogSource` trait — the seam to the external catalog API.

use std::future::Future;

use crate::model::{Collection, Product};

/// Abstraction over the storefront catalog API.
///
/// Implementations must return the full current set of each entity kind
/// (pagination fully drained) or fail the whole fetch; the reconciliation
/// engine never sees a partial set. Retries, timeouts, and transport
/// concerns live behind this seam.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes.
pub trait CatalogSource: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Fetch every product currently in the catalog.
  fn fetch_all_products(
    &self,
  ) -> impl Future<Output = Result<Vec<Product>, Self::Error>> + Send + '_;

  /// Fetch every collection currently in the catalog.
  fn fetch_all_collections(
    &self,
  ) -> impl Future<Output = Result<Vec<Collection>, Self::Error>> + Send + '_;
}
