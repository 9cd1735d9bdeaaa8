//! SQL schema for the Stocktake SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated
//! on the `PRAGMA user_version` number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- Current product state. Rows are never deleted: a product that drops out
-- of a fetch is marked inactive and keeps its lifecycle timestamps.
CREATE TABLE IF NOT EXISTS products (
    id                 INTEGER PRIMARY KEY,  -- source-assigned identity
    handle             TEXT NOT NULL,
    title              TEXT NOT NULL,
    body_html          TEXT NOT NULL DEFAULT '',
    vendor             TEXT NOT NULL DEFAULT '',
    product_type       TEXT NOT NULL DEFAULT '',
    tags               TEXT NOT NULL DEFAULT '[]',  -- JSON array of strings
    price              TEXT,                 -- first-variant, decimal string
    compare_at_price   TEXT,
    available          INTEGER NOT NULL DEFAULT 0,
    sku                TEXT,
    image_url          TEXT,
    shopify_created_at TEXT,
    shopify_updated_at TEXT,
    first_seen_at      TEXT NOT NULL,
    last_seen_at       TEXT NOT NULL,
    is_active          INTEGER NOT NULL DEFAULT 1
);

-- Current collection state; same lifecycle treatment as products.
CREATE TABLE IF NOT EXISTS collections (
    id                 INTEGER PRIMARY KEY,
    handle             TEXT NOT NULL,
    title              TEXT NOT NULL,
    description        TEXT NOT NULL DEFAULT '',
    products_count     INTEGER NOT NULL DEFAULT 0,
    image_url          TEXT,
    shopify_updated_at TEXT,
    first_seen_at      TEXT NOT NULL,
    last_seen_at       TEXT NOT NULL,
    is_active          INTEGER NOT NULL DEFAULT 1
);

-- One marker row per entity kind, replaced wholesale on every save.
-- An absent row means the kind has never been snapshotted (first run).
CREATE TABLE IF NOT EXISTS snapshot_state (
    kind       TEXT PRIMARY KEY,    -- 'products' | 'collections'
    fetched_at TEXT NOT NULL,       -- ISO 8601 UTC
    count      INTEGER NOT NULL
);

-- Per-product change descriptions are strictly append-only.
-- No UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS product_history (
    history_id  INTEGER PRIMARY KEY AUTOINCREMENT,
    product_id  INTEGER NOT NULL,
    change      TEXT NOT NULL,
    recorded_at TEXT NOT NULL
);

-- One row per run that detected change; strictly append-only.
CREATE TABLE IF NOT EXISTS run_log (
    run_id            TEXT PRIMARY KEY,
    recorded_at       TEXT NOT NULL,
    products_total    INTEGER NOT NULL,
    collections_total INTEGER NOT NULL,
    products_json     TEXT NOT NULL,  -- JSON ProductLedger
    collections_json  TEXT NOT NULL,  -- JSON CollectionLedger
    note              TEXT
);

CREATE INDEX IF NOT EXISTS products_active_idx    ON products(is_active);
CREATE INDEX IF NOT EXISTS products_vendor_idx    ON products(vendor);
CREATE INDEX IF NOT EXISTS collections_active_idx ON collections(is_active);
CREATE INDEX IF NOT EXISTS history_product_idx    ON product_history(product_id);
CREATE INDEX IF NOT EXISTS history_recorded_idx   ON product_history(recorded_at);
CREATE INDEX IF NOT EXISTS run_log_recorded_idx   ON run_log(recorded_at);

PRAGMA user_version = 1;
";
