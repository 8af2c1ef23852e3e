//! Stock change events and low-stock report aggregation.
//!
//! Pure logic. The caller builds a [`StockChangeEvent`] after a product
//! mutation commits; report builders receive already-fetched rows.

use serde::{Deserialize, Serialize};

use crate::types::DbId;

// ---------------------------------------------------------------------------
// StockChangeEvent
// ---------------------------------------------------------------------------

/// Fact emitted after a product mutation was accepted by storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockChangeEvent {
    pub product_id: DbId,
    pub sku: String,
    pub name: String,
    /// Stock level after the mutation.
    pub stock: i32,
    pub threshold: i32,
    /// Derived: `stock < threshold`.
    pub below_threshold: bool,
}

impl StockChangeEvent {
    /// Build an event, deriving `below_threshold` from the stock values.
    pub fn new(
        product_id: DbId,
        sku: impl Into<String>,
        name: impl Into<String>,
        stock: i32,
        threshold: i32,
    ) -> Self {
        Self {
            product_id,
            sku: sku.into(),
            name: name.into(),
            stock,
            threshold,
            below_threshold: is_below_threshold(stock, threshold),
        }
    }

    /// View this event as a low-stock report line.
    pub fn as_item(&self) -> LowStockItem {
        LowStockItem {
            id: self.product_id,
            name: self.name.clone(),
            sku: self.sku.clone(),
            stock: self.stock,
            threshold: self.threshold,
        }
    }
}

/// The sole alerting trigger.
pub fn is_below_threshold(stock: i32, threshold: i32) -> bool {
    stock < threshold
}

// ---------------------------------------------------------------------------
// Severity
// ---------------------------------------------------------------------------

/// How bad a low-stock condition is. Shared by reports and single alerts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StockSeverity {
    /// Out of stock (`stock == 0`), whatever the threshold.
    Critical,
    /// `0 < stock < threshold`.
    Low,
}

impl StockSeverity {
    /// Classify a stock level. Returns `None` for stock at or above threshold
    /// and for negative stock.
    pub fn classify(stock: i32, threshold: i32) -> Option<Self> {
        if stock == 0 {
            Some(StockSeverity::Critical)
        } else if stock > 0 && stock < threshold {
            Some(StockSeverity::Low)
        } else {
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Global report
// ---------------------------------------------------------------------------

/// A product row as it appears in low-stock reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LowStockItem {
    pub id: DbId,
    pub name: String,
    pub sku: String,
    pub stock: i32,
    pub threshold: i32,
}

/// Low-stock items split by severity, original order kept in each bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GlobalReport {
    /// Number of items handed to [`build_global_report`], including any
    /// that landed in neither bucket.
    pub total_items: usize,
    pub critical: Vec<LowStockItem>,
    pub low_stock: Vec<LowStockItem>,
}

impl GlobalReport {
    pub fn has_critical(&self) -> bool {
        !self.critical.is_empty()
    }
}

/// Partition report items into `critical` (`stock == 0`) and `low_stock`
/// (`0 < stock < threshold`).
///
/// Items at or above their threshold appear in neither bucket; they should
/// have been filtered upstream.
pub fn build_global_report(items: &[LowStockItem]) -> GlobalReport {
    let mut report = GlobalReport {
        total_items: items.len(),
        ..GlobalReport::default()
    };

    for item in items {
        match StockSeverity::classify(item.stock, item.threshold) {
            Some(StockSeverity::Critical) => report.critical.push(item.clone()),
            Some(StockSeverity::Low) => report.low_stock.push(item.clone()),
            None => {}
        }
    }

    report
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: DbId, stock: i32, threshold: i32) -> LowStockItem {
        LowStockItem {
            id,
            name: format!("Product {id}"),
            sku: format!("SKU-{id:03}"),
            stock,
            threshold,
        }
    }

    #[test]
    fn event_derives_below_threshold() {
        assert!(StockChangeEvent::new(5, "A", "a", 0, 10).below_threshold);
        assert!(StockChangeEvent::new(6, "B", "b", 3, 10).below_threshold);
        assert!(!StockChangeEvent::new(7, "C", "c", 10, 10).below_threshold);
        assert!(!StockChangeEvent::new(8, "D", "d", 0, 0).below_threshold);
    }

    #[test]
    fn severity_classification() {
        assert_eq!(StockSeverity::classify(0, 10), Some(StockSeverity::Critical));
        assert_eq!(StockSeverity::classify(3, 10), Some(StockSeverity::Low));
        assert_eq!(StockSeverity::classify(10, 10), None);
        // Out of stock is critical even with a zero threshold, matching
        // the report partition.
        assert_eq!(StockSeverity::classify(0, 0), Some(StockSeverity::Critical));
        assert_eq!(StockSeverity::classify(-1, 10), None);
    }

    #[test]
    fn report_buckets_agree_with_severity() {
        let items = vec![item(1, 0, 0), item(2, 0, 10), item(3, 5, 10), item(4, 10, 10)];
        let report = build_global_report(&items);

        for it in &items {
            let expected = StockSeverity::classify(it.stock, it.threshold);
            let in_critical = report.critical.iter().any(|c| c.id == it.id);
            let in_low = report.low_stock.iter().any(|l| l.id == it.id);
            assert_eq!(in_critical, expected == Some(StockSeverity::Critical));
            assert_eq!(in_low, expected == Some(StockSeverity::Low));
        }
    }

    #[test]
    fn report_partitions_by_stock() {
        let items = vec![item(1, 0, 10), item(2, 4, 10), item(3, 0, 5), item(4, 9, 10)];
        let report = build_global_report(&items);

        let critical: Vec<DbId> = report.critical.iter().map(|i| i.id).collect();
        let low: Vec<DbId> = report.low_stock.iter().map(|i| i.id).collect();
        assert_eq!(critical, vec![1, 3]);
        assert_eq!(low, vec![2, 4]);
        assert_eq!(report.total_items, 4);
        assert!(report.has_critical());
    }

    #[test]
    fn report_excludes_items_at_or_above_threshold() {
        let items = vec![item(1, 10, 10), item(2, 12, 10), item(3, 2, 10)];
        let report = build_global_report(&items);

        assert!(report.critical.is_empty());
        assert_eq!(report.low_stock.len(), 1);
        assert_eq!(report.low_stock[0].id, 3);
        assert_eq!(report.total_items, 3);
    }

    #[test]
    fn every_alerting_item_lands_in_exactly_one_bucket() {
        let items: Vec<LowStockItem> = (0..40)
            .map(|i| item(i, (i % 7) as i32, (i % 5) as i32 + 3))
            .collect();
        let report = build_global_report(&items);

        for it in &items {
            let in_critical = report.critical.iter().any(|c| c.id == it.id);
            let in_low = report.low_stock.iter().any(|l| l.id == it.id);
            assert!(!(in_critical && in_low), "item {} in both buckets", it.id);
            assert_eq!(in_critical, it.stock == 0);
            assert_eq!(in_low, it.stock > 0 && it.stock < it.threshold);
        }
    }

    #[test]
    fn empty_input_yields_empty_report() {
        let report = build_global_report(&[]);
        assert_eq!(report, GlobalReport::default());
        assert!(!report.has_critical());
    }
}
