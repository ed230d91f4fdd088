//! Settings Model
//!
//! Read-only snapshot of the persisted store settings row. Owned and
//! mutated by the settings service; the printing core only reads it.

use serde::{Deserialize, Serialize};

/// Receipt paper width
///
/// Single source of truth for every width-dependent layout decision:
/// the character grid for raw text and the pixel width for HTML both
/// derive from this field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PaperWidth {
    #[default]
    #[serde(rename = "80mm")]
    Mm80,
    #[serde(rename = "58mm")]
    Mm58,
}

/// Which print strategy the dispatcher should use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrinterType {
    /// Raw ESC/POS over a USB bulk endpoint
    #[default]
    Usb,
    /// OS-registered printer through the print spooler
    System,
}

/// Store settings snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub store_name: String,
    pub store_address: String,
    pub store_phone: String,
    pub receipt_footer: String,
    pub currency_symbol: String,
    /// Percentage, e.g. 8.5. Zero suppresses the tax line entirely.
    pub tax_percentage: f64,
    pub printer_type: PrinterType,
    /// For `Usb`: contains a `VID:<hex> PID:<hex>` pair.
    /// For `System`: an OS printer name.
    /// Empty means auto-detect / OS default.
    pub printer_device_name: String,
    pub printer_paper_width: PaperWidth,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            store_name: "My Store".to_string(),
            store_address: String::new(),
            store_phone: String::new(),
            receipt_footer: "Thank you for your purchase!".to_string(),
            currency_symbol: "$".to_string(),
            tax_percentage: 0.0,
            printer_type: PrinterType::Usb,
            printer_device_name: String::new(),
            printer_paper_width: PaperWidth::Mm80,
        }
    }
}
