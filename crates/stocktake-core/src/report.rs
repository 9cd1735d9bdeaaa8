//! Summary reporter — renders one run's change records as plain text.
//!
//! Deterministic given its inputs: the generation timestamp is a
//! parameter, there is no hidden clock or randomness. Caps and
//! truncation here are presentation only; the underlying change records
//! are never trimmed.

use chrono::{DateTime, Utc};

use crate::diff::{CollectionChanges, ProductChanges, display_price};

const SEPARATOR: &str =
  "============================================================";

/// Most entries itemised per bucket; the rest collapse to a trailer line.
const MAX_ITEMISED: usize = 10;

/// Most field-level change descriptions shown per updated product.
const MAX_CHANGES_SHOWN: usize = 2;

/// Render the run summary.
pub fn render(
  products: &ProductChanges,
  collections: &CollectionChanges,
  product_total: usize,
  collection_total: usize,
  generated_at: DateTime<Utc>,
) -> String {
  let mut lines = vec![
    SEPARATOR.to_string(),
    format!(
      "CATALOG SNAPSHOT - {}",
      generated_at.format("%Y-%m-%d %H:%M UTC")
    ),
    SEPARATOR.to_string(),
    String::new(),
    format!("Total products:    {product_total}"),
    format!("Total collections: {collection_total}"),
    String::new(),
  ];

  if products.first_run || collections.first_run {
    lines.push(
      "Initial capture: change tracking begins with the next run."
        .to_string(),
    );
    lines.push(String::new());
    lines.push(SEPARATOR.to_string());
    return lines.join("\n");
  }

  lines.push("CHANGES:".to_string());
  lines.push(format!("   New products:        {}", products.added.len()));
  lines.push(format!("   Removed products:    {}", products.removed.len()));
  lines.push(format!("   Updated products:    {}", products.updated.len()));
  lines.push(format!("   New collections:     {}", collections.added.len()));
  lines.push(format!(
    "   Removed collections: {}",
    collections.removed.len()
  ));

  if !products.added.is_empty() {
    lines.push(String::new());
    lines.push("   NEW PRODUCTS:".to_string());
    for p in products.added.iter().take(MAX_ITEMISED) {
      lines.push(format!(
        "      - {} ({}) - {}",
        p.title,
        display_price(&p.price),
        p.vendor
      ));
    }
    push_overflow(&mut lines, products.added.len());
  }

  if !products.removed.is_empty() {
    lines.push(String::new());
    lines.push("   REMOVED PRODUCTS:".to_string());
    for p in products.removed.iter().take(MAX_ITEMISED) {
      lines.push(format!("      - {} - {}", p.title, p.vendor));
    }
    push_overflow(&mut lines, products.removed.len());
  }

  if !products.updated.is_empty() {
    lines.push(String::new());
    lines.push("   UPDATED PRODUCTS:".to_string());
    for p in products.updated.iter().take(MAX_ITEMISED) {
      let shown = p
        .changes
        .iter()
        .take(MAX_CHANGES_SHOWN)
        .cloned()
        .collect::<Vec<_>>()
        .join(", ");
      lines.push(format!("      - {}: {shown}", p.title));
    }
    push_overflow(&mut lines, products.updated.len());
  }

  if !collections.added.is_empty() {
    lines.push(String::new());
    lines.push("   NEW COLLECTIONS:".to_string());
    for c in collections.added.iter().take(MAX_ITEMISED) {
      lines.push(format!("      - {}", c.title));
    }
    push_overflow(&mut lines, collections.added.len());
  }

  if !collections.removed.is_empty() {
    lines.push(String::new());
    lines.push("   REMOVED COLLECTIONS:".to_string());
    for c in collections.removed.iter().take(MAX_ITEMISED) {
      lines.push(format!("      - {}", c.title));
    }
    push_overflow(&mut lines, collections.removed.len());
  }

  if !collections.product_count_changes.is_empty() {
    lines.push(String::new());
    lines.push("   COLLECTION CHANGES:".to_string());
    for c in collections.product_count_changes.iter().take(MAX_ITEMISED) {
      let delta = if c.change > 0 {
        format!("+{}", c.change)
      } else {
        c.change.to_string()
      };
      lines.push(format!(
        "      - {}: {} -> {} ({delta})",
        c.title, c.old_count, c.new_count
      ));
    }
    push_overflow(&mut lines, collections.product_count_changes.len());
  }

  lines.push(String::new());
  lines.push(SEPARATOR.to_string());
  lines.join("\n")
}

fn push_overflow(lines: &mut Vec<String>, total: usize) {
  if total > MAX_ITEMISED {
    lines.push(format!("      ... and {} more", total - MAX_ITEMISED));
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;
  use crate::diff::{
    CollectionSummary, ProductCountChange, ProductSummary, ProductUpdate,
  };

  fn generated_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 30, 0).unwrap()
  }

  fn summary(id: u64, title: &str) -> ProductSummary {
    ProductSummary {
      id,
      title:        title.to_string(),
      handle:       format!("handle-{id}"),
      vendor:       "Acme".to_string(),
      product_type: "Widget".to_string(),
      price:        Some("4.00".to_string()),
    }
  }

  #[test]
  fn identical_inputs_render_identical_output() {
    let products = ProductChanges {
      added: vec![summary(1, "Widget")],
      ..Default::default()
    };
    let collections = CollectionChanges::default();

    let first = render(&products, &collections, 10, 2, generated_at());
    let second = render(&products, &collections, 10, 2, generated_at());
    assert_eq!(first, second);
  }

  #[test]
  fn first_run_prints_notice_and_no_change_sections() {
    let products = ProductChanges { first_run: true, ..Default::default() };
    let collections =
      CollectionChanges { first_run: true, ..Default::default() };

    let report = render(&products, &collections, 42, 7, generated_at());

    assert!(report.contains("Initial capture"));
    assert!(report.contains("Total products:    42"));
    assert!(report.contains("Total collections: 7"));
    assert!(!report.contains("CHANGES:"));
    assert!(!report.contains("NEW PRODUCTS:"));
  }

  #[test]
  fn counts_and_items_are_rendered() {
    let products = ProductChanges {
      added:   vec![summary(1, "Widget")],
      removed: vec![summary(2, "Gone")],
      updated: vec![ProductUpdate {
        id:      3,
        title:   "Gadget".to_string(),
        handle:  "gadget".to_string(),
        changes: vec!["title: 'Old' -> 'Gadget'".to_string()],
      }],
      first_run: false,
    };
    let collections = CollectionChanges {
      added:                 vec![CollectionSummary {
        id:    9,
        title: "Spring".to_string(),
      }],
      removed:               vec![],
      product_count_changes: vec![ProductCountChange {
        id:        4,
        title:     "Summer".to_string(),
        old_count: 10,
        new_count: 7,
        change:    -3,
      }],
      first_run:             false,
    };

    let report = render(&products, &collections, 10, 2, generated_at());

    assert!(report.contains("New products:        1"));
    assert!(report.contains("Removed products:    1"));
    assert!(report.contains("Updated products:    1"));
    assert!(report.contains("- Widget (£4.00) - Acme"));
    assert!(report.contains("- Gone - Acme"));
    assert!(report.contains("- Gadget: title: 'Old' -> 'Gadget'"));
    assert!(report.contains("- Spring"));
    assert!(report.contains("- Summer: 10 -> 7 (-3)"));
  }

  #[test]
  fn positive_count_delta_is_plus_prefixed() {
    let collections = CollectionChanges {
      product_count_changes: vec![ProductCountChange {
        id:        4,
        title:     "Summer".to_string(),
        old_count: 7,
        new_count: 10,
        change:    3,
      }],
      ..Default::default()
    };

    let report = render(
      &ProductChanges::default(),
      &collections,
      10,
      2,
      generated_at(),
    );
    assert!(report.contains("- Summer: 7 -> 10 (+3)"));
  }

  #[test]
  fn buckets_cap_at_ten_with_overflow_trailer() {
    let products = ProductChanges {
      added: (0..13).map(|i| summary(i, &format!("P{i}"))).collect(),
      ..Default::default()
    };

    let report = render(
      &products,
      &CollectionChanges::default(),
      13,
      0,
      generated_at(),
    );

    assert!(report.contains("- P9 "));
    assert!(!report.contains("- P10 "));
    assert!(report.contains("... and 3 more"));
  }

  #[test]
  fn update_lines_show_at_most_two_changes() {
    let products = ProductChanges {
      updated: vec![ProductUpdate {
        id:      1,
        title:   "Widget".to_string(),
        handle:  "widget".to_string(),
        changes: vec![
          "title: 'A' -> 'B'".to_string(),
          "price: £4.00 -> £5.00".to_string(),
          "availability: in stock -> sold out".to_string(),
        ],
      }],
      ..Default::default()
    };

    let report = render(
      &products,
      &CollectionChanges::default(),
      1,
      0,
      generated_at(),
    );

    assert!(
      report.contains("- Widget: title: 'A' -> 'B', price: £4.00 -> £5.00")
    );
    assert!(!report.contains("availability"));
  }

  #[test]
  fn embedded_timestamp_reflects_the_parameter() {
    let report = render(
      &ProductChanges::default(),
      &CollectionChanges::default(),
      0,
      0,
      generated_at(),
    );
    assert!(report.contains("2024-06-01 12:30 UTC"));
  }
}
