//! SQLite backend for the Stocktake catalog store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated
//! thread without blocking the async runtime. Entities live in current-
//! state tables with lifecycle columns (never deleted, only marked
//! inactive); the run ledger and per-product history are append-only.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::{HistoryRecord, SqliteStore};
