//! Printer Descriptor Model
//!
//! Transient descriptors produced by device discovery and shown in the
//! settings UI. Never persisted; the selected descriptor's `identifier`
//! is copied into `Settings::printer_device_name`, so the USB encoding
//! must round-trip losslessly through that string.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A selectable printer, from either the USB or the OS universe
///
/// The two universes are disjoint by construction: USB identifiers always
/// contain `VID:`, OS printer names never do.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrinterDescriptor {
    /// Stable identifier, round-trips through settings
    pub identifier: String,
    pub display_name: String,
    pub description: String,
    /// True for OS spooler printers, false for raw USB devices
    pub is_system_managed: bool,
}

/// USB vendor/product id pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsbId {
    pub vendor_id: u16,
    pub product_id: u16,
}

/// Failure to find a `VID:`/`PID:` pair in a device-name string
#[derive(Debug, Error, PartialEq, Eq)]
#[error("no VID:/PID: pair in {0:?}")]
pub struct UsbIdParseError(pub String);

impl UsbId {
    pub fn new(vendor_id: u16, product_id: u16) -> Self {
        Self {
            vendor_id,
            product_id,
        }
    }

    /// Scan a device-name string for an embedded `VID:<hex> PID:<hex>` pair.
    ///
    /// Tolerates arbitrary surrounding text (display names embed the pair
    /// inside a human-readable label) and any hex case.
    pub fn parse(s: &str) -> Result<Self, UsbIdParseError> {
        let vendor_id = hex_after(s, "VID:");
        let product_id = hex_after(s, "PID:");
        match (vendor_id, product_id) {
            (Some(vendor_id), Some(product_id)) => Ok(Self {
                vendor_id,
                product_id,
            }),
            _ => Err(UsbIdParseError(s.to_string())),
        }
    }
}

impl fmt::Display for UsbId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VID:{:04X} PID:{:04X}", self.vendor_id, self.product_id)
    }
}

/// Parse the hex token immediately following `marker`, if any.
fn hex_after(s: &str, marker: &str) -> Option<u16> {
    let rest = &s[s.find(marker)? + marker.len()..];
    let token: String = rest
        .chars()
        .take_while(|c| c.is_ascii_hexdigit())
        .take(4)
        .collect();
    if token.is_empty() {
        return None;
    }
    u16::from_str_radix(&token, 16).ok()
}
