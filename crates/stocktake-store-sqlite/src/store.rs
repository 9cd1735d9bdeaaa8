//! [`SqliteStore`] — the SQLite implementation of [`CatalogStore`].

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension as _;
use stocktake_core::{
  ledger::{Ledger, LedgerEntry},
  model::{Collection, Product, Snapshot},
  store::CatalogStore,
};

use crate::{
  Error, Result,
  encode::{CollectionRow, ProductRow, RunLogRow, decode_dt, encode_dt},
  schema::SCHEMA,
};

/// One `product_history` row: a change description recorded for a product
/// in some past run.
#[derive(Debug, Clone)]
pub struct HistoryRecord {
  pub product_id:  u64,
  pub change:      String,
  pub recorded_at: DateTime<Utc>,
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Stocktake catalog store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// All recorded change descriptions for one product, oldest first.
  pub async fn product_history(
    &self,
    product_id: u64,
  ) -> Result<Vec<HistoryRecord>> {
    let id = product_id as i64;

    let raws: Vec<(i64, String, String)> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT product_id, change, recorded_at
           FROM product_history
           WHERE product_id = ?1
           ORDER BY history_id",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![id], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(|(product_id, change, recorded_at)| {
        Ok(HistoryRecord {
          product_id: product_id as u64,
          change,
          recorded_at: decode_dt(&recorded_at)?,
        })
      })
      .collect()
  }

  /// The `snapshot_state` marker for one entity kind, if it exists.
  async fn load_snapshot_state(
    &self,
    kind: &'static str,
  ) -> Result<Option<DateTime<Utc>>> {
    let fetched_at: Option<String> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT fetched_at FROM snapshot_state WHERE kind = ?1",
              rusqlite::params![kind],
              |row| row.get(0),
            )
            .optional()?,
        )
      })
      .await?;

    fetched_at.as_deref().map(decode_dt).transpose()
  }
}

// ─── CatalogStore impl ───────────────────────────────────────────────────────

impl CatalogStore for SqliteStore {
  type Error = Error;

  // ── Snapshots ─────────────────────────────────────────────────────────────

  async fn load_product_snapshot(&self) -> Result<Option<Snapshot<Product>>> {
    let Some(fetched_at) = self.load_snapshot_state("products").await? else {
      return Ok(None);
    };

    let raws: Vec<ProductRow> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT id, handle, title, body_html, vendor, product_type, tags,
                  price, compare_at_price, available, sku, image_url,
                  shopify_created_at, shopify_updated_at
           FROM products
           WHERE is_active = 1
           ORDER BY id",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(ProductRow {
              id:                 row.get(0)?,
              handle:             row.get(1)?,
              title:              row.get(2)?,
              body_html:          row.get(3)?,
              vendor:             row.get(4)?,
              product_type:       row.get(5)?,
              tags:               row.get(6)?,
              price:              row.get(7)?,
              compare_at_price:   row.get(8)?,
              available:          row.get(9)?,
              sku:                row.get(10)?,
              image_url:          row.get(11)?,
              shopify_created_at: row.get(12)?,
              shopify_updated_at: row.get(13)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let entities = raws
      .into_iter()
      .map(ProductRow::into_product)
      .collect::<Result<Vec<_>>>()?;

    Ok(Some(Snapshot::new(fetched_at, entities)))
  }

  async fn load_collection_snapshot(
    &self,
  ) -> Result<Option<Snapshot<Collection>>> {
    let Some(fetched_at) = self.load_snapshot_state("collections").await?
    else {
      return Ok(None);
    };

    let raws: Vec<CollectionRow> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT id, handle, title, description, products_count, image_url,
                  shopify_updated_at
           FROM collections
           WHERE is_active = 1
           ORDER BY id",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(CollectionRow {
              id:                 row.get(0)?,
              handle:             row.get(1)?,
              title:              row.get(2)?,
              description:        row.get(3)?,
              products_count:     row.get(4)?,
              image_url:          row.get(5)?,
              shopify_updated_at: row.get(6)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let entities =
      raws.into_iter().map(CollectionRow::into_collection).collect();

    Ok(Some(Snapshot::new(fetched_at, entities)))
  }

  async fn save_product_snapshot(
    &self,
    snapshot: &Snapshot<Product>,
  ) -> Result<()> {
    let seen_at = encode_dt(snapshot.fetched_at);
    let count = snapshot.count as i64;
    let rows = snapshot
      .entities
      .iter()
      .map(ProductRow::from_product)
      .collect::<Result<Vec<_>>>()?;

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        // Blanket-deactivate, then re-activate via upsert: anything the
        // fetch no longer contains stays inactive with its last_seen_at
        // frozen at this run.
        tx.execute(
          "UPDATE products SET is_active = 0, last_seen_at = ?1
           WHERE is_active = 1",
          rusqlite::params![seen_at],
        )?;

        for row in &rows {
          tx.execute(
            "INSERT INTO products (
               id, handle, title, body_html, vendor, product_type, tags,
               price, compare_at_price, available, sku, image_url,
               shopify_created_at, shopify_updated_at,
               first_seen_at, last_seen_at, is_active
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12,
                       ?13, ?14, ?15, ?15, 1)
             ON CONFLICT(id) DO UPDATE SET
               handle             = excluded.handle,
               title              = excluded.title,
               body_html          = excluded.body_html,
               vendor             = excluded.vendor,
               product_type       = excluded.product_type,
               tags               = excluded.tags,
               price              = excluded.price,
               compare_at_price   = excluded.compare_at_price,
               available          = excluded.available,
               sku                = excluded.sku,
               image_url          = excluded.image_url,
               shopify_created_at = excluded.shopify_created_at,
               shopify_updated_at = excluded.shopify_updated_at,
               last_seen_at       = excluded.last_seen_at,
               is_active          = 1",
            rusqlite::params![
              row.id,
              row.handle,
              row.title,
              row.body_html,
              row.vendor,
              row.product_type,
              row.tags,
              row.price,
              row.compare_at_price,
              row.available,
              row.sku,
              row.image_url,
              row.shopify_created_at,
              row.shopify_updated_at,
              seen_at,
            ],
          )?;
        }

        tx.execute(
          "INSERT INTO snapshot_state (kind, fetched_at, count)
           VALUES ('products', ?1, ?2)
           ON CONFLICT(kind) DO UPDATE SET
             fetched_at = excluded.fetched_at,
             count      = excluded.count",
          rusqlite::params![seen_at, count],
        )?;

        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn save_collection_snapshot(
    &self,
    snapshot: &Snapshot<Collection>,
  ) -> Result<()> {
    let seen_at = encode_dt(snapshot.fetched_at);
    let count = snapshot.count as i64;
    let rows: Vec<CollectionRow> = snapshot
      .entities
      .iter()
      .map(CollectionRow::from_collection)
      .collect();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        tx.execute(
          "UPDATE collections SET is_active = 0, last_seen_at = ?1
           WHERE is_active = 1",
          rusqlite::params![seen_at],
        )?;

        for row in &rows {
          tx.execute(
            "INSERT INTO collections (
               id, handle, title, description, products_count, image_url,
               shopify_updated_at, first_seen_at, last_seen_at, is_active
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8, 1)
             ON CONFLICT(id) DO UPDATE SET
               handle             = excluded.handle,
               title              = excluded.title,
               description        = excluded.description,
               products_count     = excluded.products_count,
               image_url          = excluded.image_url,
               shopify_updated_at = excluded.shopify_updated_at,
               last_seen_at       = excluded.last_seen_at,
               is_active          = 1",
            rusqlite::params![
              row.id,
              row.handle,
              row.title,
              row.description,
              row.products_count,
              row.image_url,
              row.shopify_updated_at,
              seen_at,
            ],
          )?;
        }

        tx.execute(
          "INSERT INTO snapshot_state (kind, fetched_at, count)
           VALUES ('collections', ?1, ?2)
           ON CONFLICT(kind) DO UPDATE SET
             fetched_at = excluded.fetched_at,
             count      = excluded.count",
          rusqlite::params![seen_at, count],
        )?;

        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── History ledger ────────────────────────────────────────────────────────

  async fn append_ledger(&self, entry: &LedgerEntry) -> Result<()> {
    let row = RunLogRow::from_entry(entry)?;

    // Per-product provenance rows: every change description of every
    // updated product, plus a deactivation marker for removed ones.
    let mut history: Vec<(i64, String)> = Vec::new();
    for update in &entry.products.updated {
      for change in &update.changes {
        history.push((update.id as i64, change.clone()));
      }
    }
    for removed in &entry.products.removed {
      history.push((removed.id as i64, "marked inactive".to_string()));
    }

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        tx.execute(
          "INSERT INTO run_log (
             run_id, recorded_at, products_total, collections_total,
             products_json, collections_json, note
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![
            row.run_id,
            row.recorded_at,
            row.products_total,
            row.collections_total,
            row.products_json,
            row.collections_json,
            row.note,
          ],
        )?;

        for (product_id, change) in &history {
          tx.execute(
            "INSERT INTO product_history (product_id, change, recorded_at)
             VALUES (?1, ?2, ?3)",
            rusqlite::params![product_id, change, row.recorded_at],
          )?;
        }

        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn load_ledger(&self) -> Result<Ledger> {
    let raws: Vec<RunLogRow> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT run_id, recorded_at, products_total, collections_total,
                  products_json, collections_json, note
           FROM run_log
           ORDER BY recorded_at, run_id",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RunLogRow {
              run_id:            row.get(0)?,
              recorded_at:       row.get(1)?,
              products_total:    row.get(2)?,
              collections_total: row.get(3)?,
              products_json:     row.get(4)?,
              collections_json:  row.get(5)?,
              note:              row.get(6)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let entries = raws
      .into_iter()
      .map(RunLogRow::into_entry)
      .collect::<Result<Vec<_>>>()?;

    Ok(Ledger { entries })
  }
}
