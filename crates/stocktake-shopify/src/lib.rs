//! Shopify storefront catalog source for Stocktake.
//!
//! Wraps the public `/products.json` and `/collections.json` endpoints:
//! drains their page-number pagination and normalises the wire payloads
//! into the core entity model. Transport and pagination failures abort
//! the whole fetch — the reconciliation engine never sees a partial set.

mod client;
mod wire;

pub mod error;

pub use client::CatalogClient;
pub use error::{Error, Result};
