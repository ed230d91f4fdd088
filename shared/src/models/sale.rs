//! Sale Model
//!
//! A committed sale as handed to the printing core. All money values are
//! integer minor units (cents); conversion to a decimal display form
//! happens at render time only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One line of a sale
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItem {
    pub name: String,
    pub quantity: u32,
    /// Unit price at the time of sale, minor units
    pub price_at_sale: i64,
    /// Line discount, minor units. Carried for completeness; not rendered.
    #[serde(default)]
    pub discount: i64,
}

/// A completed, already-persisted sale
///
/// `total_amount` is computed upstream and trusted as-is — the printing
/// core never recomputes it from the items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sale {
    pub receipt_number: String,
    /// Falls back to "now" at render time when absent
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Grand total, minor units
    pub total_amount: i64,
    /// Displayed uppercased on the receipt
    pub payment_method: String,
    #[serde(default)]
    pub customer_name: Option<String>,
    pub items: Vec<LineItem>,
}

impl LineItem {
    /// Line total (quantity × unit price), minor units.
    ///
    /// Display-only helper; the receipt total always comes from
    /// `Sale::total_amount`.
    pub fn line_total(&self) -> i64 {
        self.price_at_sale * i64::from(self.quantity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_total() {
        let item = LineItem {
            name: "Vodka 750ml".to_string(),
            quantity: 2,
            price_at_sale: 800,
            discount: 0,
        };
        assert_eq!(item.line_total(), 1600);
    }

    #[test]
    fn test_sale_deserializes_without_optional_fields() {
        let sale: Sale = serde_json::from_str(
            r#"{
                "receipt_number": "REC-1001",
                "total_amount": 1599,
                "payment_method": "cash",
                "items": [{"name": "Vodka 750ml", "quantity": 2, "price_at_sale": 800}]
            }"#,
        )
        .unwrap();
        assert!(sale.created_at.is_none());
        assert!(sale.customer_name.is_none());
        assert_eq!(sale.items[0].discount, 0);
    }
}
